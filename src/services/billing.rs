// src/services/billing.rs
//
// Cobrança: abre pedidos de checkout e processa o webhook da Razorpay.
// A transição de assinatura SÓ acontece aqui, dentro de uma transação
// que ativa a conta e marca o pagamento juntos.

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{AccountRepository, PaymentRepository},
    models::payments::OrderResponse,
    services::subscription,
    vendor::razorpay::{RazorpayClient, WebhookEvent},
};

/// Plano mensal padrão quando o payload não traz valor: ₹999, em paise.
pub const DEFAULT_PLAN_AMOUNT: i64 = 99_900;
pub const CURRENCY: &str = "INR";

#[derive(Clone)]
pub struct BillingService {
    pool: PgPool,
    account_repo: AccountRepository,
    payment_repo: PaymentRepository,
    razorpay: RazorpayClient,
}

impl BillingService {
    pub fn new(
        pool: PgPool,
        account_repo: AccountRepository,
        payment_repo: PaymentRepository,
        razorpay: RazorpayClient,
    ) -> Self {
        Self {
            pool,
            account_repo,
            payment_repo,
            razorpay,
        }
    }

    /// Abre um pedido no gateway e registra o pagamento como `pending`.
    /// A ativação fica por conta do webhook; nada muda na conta aqui.
    pub async fn open_order(
        &self,
        account_id: uuid::Uuid,
        amount: Option<i64>,
    ) -> Result<OrderResponse, AppError> {
        let amount = amount.unwrap_or(DEFAULT_PLAN_AMOUNT);
        let receipt = format!("acc_{}", account_id.simple());

        let order = self
            .razorpay
            .create_order(amount, CURRENCY, &receipt)
            .await?;

        self.payment_repo
            .create_pending(account_id, &order.id, order.amount, &order.currency)
            .await?;

        tracing::info!(
            account = %account_id,
            order = %order.id,
            amount,
            "✅ Pedido de checkout aberto"
        );

        Ok(OrderResponse {
            order_id: order.id,
            amount: order.amount,
            currency: order.currency,
            key_id: self.razorpay.key_id().to_string(),
        })
    }

    /// Processa o webhook: verifica a assinatura sobre o corpo BRUTO,
    /// depois desserializa. Assinatura inválida -> 400. Assinatura válida
    /// com evento desconhecido ou pedido inexistente -> Ok (200), para o
    /// gateway não ficar reenviando.
    pub async fn handle_webhook(
        &self,
        raw_body: &[u8],
        signature: &str,
    ) -> Result<(), AppError> {
        if !self.razorpay.verify_webhook_signature(raw_body, signature) {
            tracing::warn!("Webhook com assinatura inválida rejeitado");
            return Err(AppError::InvalidWebhookSignature);
        }

        // Assinatura válida com corpo que não conseguimos ler: reconhecemos
        // mesmo assim, como nos demais ramos sem ação. Um 4xx aqui só faria
        // o gateway reenviar o mesmo corpo.
        let Some(event) = parse_event(raw_body) else {
            return Ok(());
        };

        let Some(order_id) = captured_order_id(&event) else {
            // Evento que não ativa nada (ou captured sem order_id).
            tracing::debug!(event = %event.event, "Webhook ignorado");
            return Ok(());
        };

        let Some(payment) = self.payment_repo.find_pending_by_order_id(order_id).await? else {
            // Pedido que não conhecemos (ou já processado): reconhecemos o
            // webhook mesmo assim.
            tracing::warn!(order = %order_id, "Webhook para pedido desconhecido ou já quitado");
            return Ok(());
        };

        let account = self
            .account_repo
            .find_by_id(payment.account_id)
            .await?
            .ok_or(AppError::AccountNotFound)?;

        let now = chrono::Utc::now();
        let (period_start, period_end) =
            subscription::next_paid_period(account.subscription_expires_at, now);

        // Ativação e quitação são atômicas: ou a conta vira `active` com o
        // pagamento `success`, ou nada muda.
        let mut tx = self.pool.begin().await?;
        self.account_repo
            .activate_subscription(&mut *tx, account.id, period_end)
            .await?;
        self.payment_repo
            .mark_success(&mut *tx, payment.id, period_start, period_end)
            .await?;
        tx.commit().await?;

        tracing::info!(
            account = %account.id,
            order = %order_id,
            until = %period_end,
            "🚀 Assinatura ativada via webhook"
        );

        Ok(())
    }
}

/// Desserializa o corpo do webhook; corpo ilegível vira `None` com log.
pub fn parse_event(raw_body: &[u8]) -> Option<WebhookEvent> {
    match serde_json::from_slice(raw_body) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!("Webhook com corpo ilegível reconhecido sem ação: {}", e);
            None
        }
    }
}

/// O extrator do order_id, separado para testes sem rede nem banco.
pub fn captured_order_id(event: &WebhookEvent) -> Option<&str> {
    if event.event != "payment.captured" {
        return None;
    }
    event
        .payload
        .payment
        .as_ref()
        .and_then(|p| p.entity.order_id.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: &str, order_id: Option<&str>) -> WebhookEvent {
        serde_json::from_value(serde_json::json!({
            "event": kind,
            "payload": {
                "payment": {
                    "entity": {
                        "id": "pay_1",
                        "order_id": order_id,
                        "amount": 99900,
                        "status": "captured"
                    }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn so_payment_captured_ativa() {
        assert_eq!(
            captured_order_id(&event("payment.captured", Some("order_9"))),
            Some("order_9")
        );
        assert_eq!(captured_order_id(&event("payment.failed", Some("order_9"))), None);
        assert_eq!(captured_order_id(&event("order.paid", Some("order_9"))), None);
    }

    #[test]
    fn captured_sem_order_id_e_ignorado() {
        assert_eq!(captured_order_id(&event("payment.captured", None)), None);
    }

    #[test]
    fn corpo_ilegivel_nao_e_erro() {
        assert!(parse_event(b"nao-e-json").is_none());
        assert!(parse_event(br#"{"payload":{}}"#).is_none());

        let event = parse_event(br#"{"event":"payment.captured","payload":{}}"#);
        assert_eq!(event.unwrap().event, "payment.captured");
    }
}
