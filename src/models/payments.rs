// src/models/payments.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

// Um pedido de pagamento. Criado `pending` quando o checkout abre;
// vira `success` apenas via webhook assinado — que é também o único
// escritor de period_start/period_end.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub account_id: Uuid,
    pub vendor_order_id: String,
    pub amount: i64, // em paise (menor unidade da moeda)
    pub currency: String,
    pub status: PaymentStatus,
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrderPayload {
    // Valor em paise; o plano padrão quando omitido fica no handler.
    #[validate(range(min = 100, message = "O valor mínimo é 100 paise."))]
    pub amount: Option<i64>,
}

// Resposta para o frontend abrir o widget de checkout.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub key_id: String,
}
