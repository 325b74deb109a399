// src/services/crm_sync.rs
//
// Propaga os vereditos das chamadas classificadas para o CRM: o status
// do contato segue a ÚLTIMA chamada, e cada chamada anexa um resumo ao
// histórico. Chamada sem número de telefone não vira contato, mas é
// marcada como sincronizada para não ser revisitada a cada tick.

use serde_json::{json, Value};

use crate::{
    common::error::AppError,
    db::{CallRepository, CrmRepository},
    models::{
        account::Account,
        calls::CallRecord,
        crm::{normalize_phone, CustomerStatus},
    },
};

#[derive(Clone)]
pub struct CrmSyncService {
    call_repo: CallRepository,
    crm_repo: CrmRepository,
}

impl CrmSyncService {
    pub fn new(call_repo: CallRepository, crm_repo: CrmRepository) -> Self {
        Self { call_repo, crm_repo }
    }

    /// Sincroniza todas as chamadas classificadas ainda pendentes da
    /// conta. Falha em UMA chamada loga e segue; a chamada fica pendente
    /// para o próximo tick.
    pub async fn sync_account(&self, account: &Account) -> Result<u32, AppError> {
        let pending = self.call_repo.list_unsynced_classified(account.id).await?;
        let mut synced = 0u32;

        for call in pending {
            match self.sync_call(account, &call).await {
                Ok(()) => synced += 1,
                Err(e) => {
                    tracing::warn!(
                        account = %account.id,
                        call = %call.id,
                        "Falha ao sincronizar chamada com o CRM: {}",
                        e
                    );
                }
            }
        }

        if synced > 0 {
            tracing::info!(account = %account.id, synced, "🔗 CRM sincronizado");
        }

        Ok(synced)
    }

    async fn sync_call(&self, account: &Account, call: &CallRecord) -> Result<(), AppError> {
        let Some(analysis) = call.llm_analysis.as_ref() else {
            // list_unsynced_classified só devolve classificadas; se chegou
            // aqui sem veredito, só marcamos para sair da fila.
            return self.call_repo.mark_crm_synced(call.id).await;
        };

        match call.caller_number.as_deref() {
            Some(raw_phone) => {
                let phone = normalize_phone(raw_phone);
                let status = CustomerStatus::from(analysis.0.intent);
                let entry = history_entry(call);

                self.crm_repo
                    .upsert_from_call(
                        account.id,
                        &phone,
                        analysis.0.contact_name.as_deref(),
                        status,
                        &entry,
                    )
                    .await?;
            }
            None => {
                tracing::debug!(call = %call.id, "Chamada sem número, sem contato no CRM");
            }
        }

        self.call_repo.mark_crm_synced(call.id).await
    }
}

/// O registro que a chamada anexa ao histórico do contato.
fn history_entry(call: &CallRecord) -> Value {
    let analysis = call.llm_analysis.as_ref();
    json!({
        "callId": call.vendor_call_id,
        "at": call.started_at,
        "direction": call.direction,
        "intent": analysis.map(|a| a.0.intent),
        "summary": analysis.map(|a| a.0.summary.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::calls::{BookingInfo, CallAnalysis, CallIntent};
    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    fn classified_call(intent: CallIntent) -> CallRecord {
        CallRecord {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            vendor_call_id: "exec_1".to_string(),
            agent_id: Some("agent_1".to_string()),
            caller_number: Some("+919876543210".to_string()),
            direction: "inbound".to_string(),
            duration_secs: Some(42),
            started_at: Some(Utc::now()),
            transcript: Some("...".to_string()),
            recording_url: None,
            cost_breakdown: None,
            llm_analysis: Some(Json(CallAnalysis {
                summary: "Guest booked a double room.".to_string(),
                intent,
                booking: BookingInfo {
                    is_booked: intent == CallIntent::Booked,
                    date: Some("2026-09-01".to_string()),
                    time: None,
                    raw_datetime_string: None,
                },
                contact_name: Some("Asha".to_string()),
                call_direction: "inbound".to_string(),
            })),
            raw_llm_output: None,
            processed: true,
            crm_synced: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn entrada_de_historico_carrega_o_veredito() {
        let call = classified_call(CallIntent::Booked);
        let entry = history_entry(&call);

        assert_eq!(entry["callId"], "exec_1");
        assert_eq!(entry["intent"], "booked");
        assert_eq!(entry["summary"], "Guest booked a double room.");
        assert_eq!(entry["direction"], "inbound");
    }
}
