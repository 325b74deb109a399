// src/services/subscription.rs
//
// A máquina de estados de trial/assinatura: inactive -> trial -> expired,
// <qualquer> -> active (webhook), active -> expired. Tudo aqui é função
// pura sobre (conta, agora); quem chama decide persistir quando
// `changed` for true. Isso separa decisão de efeito colateral e deixa as
// transições testáveis sem banco.

use chrono::{DateTime, Duration, Utc};

use crate::models::account::{Account, SubscriptionStatus, SubscriptionSummary};

pub const TRIAL_DAYS: i64 = 7;
pub const PAID_PERIOD_DAYS: i64 = 30;

/// Resultado da avaliação preguiçosa de expiração.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCheck {
    pub status: SubscriptionStatus,
    pub changed: bool,
}

/// Decide o status que a conta DEVERIA ter agora. Chamada pelo
/// access-gate em toda requisição protegida e por jobs em lote.
pub fn evaluate_status(account: &Account, now: DateTime<Utc>) -> StatusCheck {
    let current = account.subscription_status;

    let expired = match current {
        SubscriptionStatus::Active => account
            .subscription_expires_at
            .is_none_or(|end| now > end),
        SubscriptionStatus::Trial => account.trial_expires_at.is_none_or(|end| now > end),
        _ => false,
    };

    if expired {
        StatusCheck {
            status: SubscriptionStatus::Expired,
            changed: true,
        }
    } else {
        StatusCheck {
            status: current,
            changed: false,
        }
    }
}

/// O invariante de acesso: trial vigente OU período pago vigente.
pub fn has_access(account: &Account, now: DateTime<Utc>) -> bool {
    let trial_ok = account.trial_expires_at.is_some_and(|end| now < end);
    let paid_ok = account.subscription_status == SubscriptionStatus::Active
        && account.subscription_expires_at.is_some_and(|end| now < end);
    trial_ok || paid_ok
}

/// Semântica de extensão do período pago: se ainda há período vigente, o
/// novo começa onde o atual termina; senão começa agora. Sempre dura
/// PAID_PERIOD_DAYS a partir do início calculado.
pub fn next_paid_period(
    current_end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = match current_end {
        Some(end) if end > now => end,
        _ => now,
    };
    (start, start + Duration::days(PAID_PERIOD_DAYS))
}

/// Janela de trial concedida na primeira configuração da chave.
pub fn trial_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    (now, now + Duration::days(TRIAL_DAYS))
}

/// Dias restantes da janela vigente, nunca negativo.
pub fn days_remaining(account: &Account, now: DateTime<Utc>) -> i64 {
    let end = match account.subscription_status {
        SubscriptionStatus::Active => account.subscription_expires_at,
        _ => account.trial_expires_at,
    };
    end.map(|end| (end - now).num_days().max(0)).unwrap_or(0)
}

pub fn summarize(account: &Account, now: DateTime<Utc>) -> SubscriptionSummary {
    SubscriptionSummary {
        status: account.subscription_status,
        trial_expires_at: account.trial_expires_at,
        subscription_expires_at: account.subscription_expires_at,
        days_remaining: days_remaining(account, now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn account(
        status: SubscriptionStatus,
        trial_expires_at: Option<DateTime<Utc>>,
        subscription_expires_at: Option<DateTime<Utc>>,
    ) -> Account {
        let now = Utc::now();
        Account {
            id: Uuid::new_v4(),
            email: "dona@hotel.com".to_string(),
            password_hash: "x".to_string(),
            hotel_name: None,
            bolna_api_key_enc: None,
            subscription_status: status,
            subscription_expires_at,
            trial_started_at: trial_expires_at.map(|e| e - Duration::days(TRIAL_DAYS)),
            trial_expires_at,
            ingestion_lease_until: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn trial_vencido_vira_expired() {
        let now = Utc::now();
        let acc = account(
            SubscriptionStatus::Trial,
            Some(now - Duration::milliseconds(1)),
            None,
        );

        let check = evaluate_status(&acc, now);
        assert_eq!(check.status, SubscriptionStatus::Expired);
        assert!(check.changed);
        assert!(!has_access(&acc, now));
    }

    #[test]
    fn trial_vigente_nao_muda() {
        let now = Utc::now();
        let acc = account(
            SubscriptionStatus::Trial,
            Some(now + Duration::days(3)),
            None,
        );

        let check = evaluate_status(&acc, now);
        assert_eq!(check.status, SubscriptionStatus::Trial);
        assert!(!check.changed);
        assert!(has_access(&acc, now));
    }

    #[test]
    fn periodo_pago_vencido_vira_expired() {
        let now = Utc::now();
        let acc = account(
            SubscriptionStatus::Active,
            None,
            Some(now - Duration::seconds(1)),
        );

        let check = evaluate_status(&acc, now);
        assert_eq!(check.status, SubscriptionStatus::Expired);
        assert!(check.changed);
    }

    #[test]
    fn inactive_e_expired_sao_estaveis() {
        let now = Utc::now();
        for status in [SubscriptionStatus::Inactive, SubscriptionStatus::Expired] {
            let check = evaluate_status(&account(status, None, None), now);
            assert_eq!(check.status, status);
            assert!(!check.changed);
        }
    }

    #[test]
    fn trial_vigente_da_acesso_mesmo_sem_assinatura() {
        // O invariante é OR: trial vivo basta, qualquer que seja o status.
        let now = Utc::now();
        let acc = account(
            SubscriptionStatus::Inactive,
            Some(now + Duration::days(1)),
            None,
        );
        assert!(has_access(&acc, now));
    }

    #[test]
    fn pagamento_apos_vencimento_comeca_agora() {
        // currentPeriodEnd = now - 1s => novo período começa AGORA,
        // não estende a partir do passado.
        let now = Utc::now();
        let (start, end) = next_paid_period(Some(now - Duration::seconds(1)), now);
        assert_eq!(start, now);
        assert_eq!(end, now + Duration::days(PAID_PERIOD_DAYS));
    }

    #[test]
    fn pagamento_com_periodo_vigente_estende() {
        // currentPeriodEnd = now + 10d => novo período começa no fim do
        // atual e dura exatamente 30 dias a partir dali.
        let now = Utc::now();
        let current_end = now + Duration::days(10);
        let (start, end) = next_paid_period(Some(current_end), now);
        assert_eq!(start, current_end);
        assert_eq!(end, current_end + Duration::days(PAID_PERIOD_DAYS));
    }

    #[test]
    fn primeiro_pagamento_comeca_agora() {
        let now = Utc::now();
        let (start, end) = next_paid_period(None, now);
        assert_eq!(start, now);
        assert_eq!(end, now + Duration::days(PAID_PERIOD_DAYS));
    }

    #[test]
    fn dias_restantes_nunca_negativos() {
        let now = Utc::now();
        let acc = account(
            SubscriptionStatus::Trial,
            Some(now - Duration::days(5)),
            None,
        );
        assert_eq!(days_remaining(&acc, now), 0);

        let acc = account(
            SubscriptionStatus::Active,
            None,
            Some(now + Duration::days(29) + Duration::hours(12)),
        );
        assert_eq!(days_remaining(&acc, now), 29);
    }

    #[test]
    fn janela_de_trial() {
        let now = Utc::now();
        let (start, end) = trial_window(now);
        assert_eq!(start, now);
        assert_eq!(end - start, Duration::days(TRIAL_DAYS));
    }
}
