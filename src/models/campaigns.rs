// src/models/campaigns.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Um batch de ligações de saída criado no fornecedor a partir da
// lista de contatos do CRM.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub account_id: Uuid,
    pub name: String,
    pub agent_id: String,
    // Identificador do batch no fornecedor.
    pub batch_id: String,
    pub from_phone_number: String,
    pub status: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    #[validate(length(min = 1, message = "O agente é obrigatório."))]
    pub agent_id: String,
    #[validate(length(min = 1, message = "O número de origem é obrigatório."))]
    pub from_phone_number: String,
    // Quando presente, o batch é agendado; caso contrário fica criado
    // aguardando agendamento manual.
    pub scheduled_at: Option<DateTime<Utc>>,
}
