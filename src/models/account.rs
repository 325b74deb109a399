// src/models/account.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Estado de acesso da conta. O enum existe também no Postgres
// (tipo `subscription_status`), daí o derive de sqlx::Type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "subscription_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Inactive,
    Trial,
    Active,
    Expired,
}

// A conta do operador do hotel: identidade + chave do fornecedor
// criptografada + janelas de trial/assinatura.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password_hash: String,

    pub hotel_name: Option<String>,

    // Token `hex(nonce):hex(ct)` — nunca sai da API em claro.
    #[serde(skip_serializing)]
    pub bolna_api_key_enc: Option<String>,

    pub subscription_status: SubscriptionStatus,
    pub subscription_expires_at: Option<DateTime<Utc>>,
    pub trial_started_at: Option<DateTime<Utc>>,
    pub trial_expires_at: Option<DateTime<Utc>>,

    // Lease de exclusão mútua do scheduler (ver scheduler.rs).
    #[serde(skip_serializing)]
    pub ingestion_lease_until: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn has_vendor_key(&self) -> bool {
        self.bolna_api_key_enc.is_some()
    }
}

// Resumo de assinatura devolvido em /settings, /dashboard e /setup-api.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSummary {
    pub status: SubscriptionStatus,
    pub trial_expires_at: Option<DateTime<Utc>>,
    pub subscription_expires_at: Option<DateTime<Utc>>,
    // Dias restantes da janela vigente (trial ou paga), nunca negativo.
    pub days_remaining: i64,
}
