// src/models/dashboard.rs

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use super::account::SubscriptionSummary;
use super::campaigns::Campaign;
use super::payments::PaymentRecord;

// O agregado que alimenta a home do dashboard.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub customer_status_counts: Vec<StatusCount>,
    pub recent_campaigns: Vec<Campaign>,
    pub subscription: SubscriptionSummary,
    pub vendor_key_masked: Option<String>,
    pub last_payment: Option<PaymentRecord>,
    pub total_calls: i64,
    pub booked_calls: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}
