// src/models/crm.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::calls::CallIntent;

// Etiqueta de status do contato no CRM. Espelha o tipo Postgres
// `customer_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "customer_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CustomerStatus {
    New,
    Contacted,
    Queries,
    Interested,
    NotInterested,
    FollowUp,
    Booked,
}

impl From<CallIntent> for CustomerStatus {
    // O veredito da última chamada classifica o contato.
    fn from(intent: CallIntent) -> Self {
        match intent {
            CallIntent::Queries => Self::Queries,
            CallIntent::Booked => Self::Booked,
            CallIntent::Interested => Self::Interested,
            CallIntent::NotInterested => Self::NotInterested,
            CallIntent::FollowUp => Self::FollowUp,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub account_id: Uuid,
    pub full_name: String,
    // E.164, único por conta.
    pub phone: String,
    pub status: CustomerStatus,

    // Histórico de resumos das conversas anteriores (array JSON).
    #[schema(value_type = Vec<Object>)]
    pub conversation_history: Json<Vec<Value>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub full_name: String,
    // Aceitamos com ou sem '+'; normalizamos antes de gravar.
    #[validate(length(min = 8, message = "Telefone inválido."))]
    pub phone: String,
}

/// Normaliza um telefone para E.164 "melhor esforço": remove separadores
/// e garante o prefixo '+'.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("+{}", digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizacao_de_telefone() {
        assert_eq!(normalize_phone("+91 98765-43210"), "+919876543210");
        assert_eq!(normalize_phone("(11) 99999 0000"), "+11999990000");
        assert_eq!(normalize_phone("919876543210"), "+919876543210");
    }

    #[test]
    fn intent_vira_status_do_contato() {
        assert_eq!(CustomerStatus::from(CallIntent::Booked), CustomerStatus::Booked);
        assert_eq!(
            CustomerStatus::from(CallIntent::NotInterested),
            CustomerStatus::NotInterested
        );
        assert_eq!(CustomerStatus::from(CallIntent::Queries), CustomerStatus::Queries);
    }
}
