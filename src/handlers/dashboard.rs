// src/handlers/dashboard.rs

use axum::{extract::State, Json};
use chrono::Utc;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedAccount,
    models::{dashboard::DashboardSummary, settings::mask_key},
    services::subscription,
};

const RECENT_CAMPAIGNS: i64 = 5;

// GET /api/dashboard
#[utoipa::path(
    get,
    path = "/api/dashboard",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Resumo operacional da conta", body = DashboardSummary),
        (status = 401, description = "Não autorizado"),
        (status = 403, description = "Assinatura expirada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_summary(
    State(app_state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
) -> Result<Json<DashboardSummary>, AppError> {
    let customer_status_counts = app_state.crm_repo.count_by_status(account.id).await?;
    let recent_campaigns = app_state
        .campaign_repo
        .list_recent(account.id, RECENT_CAMPAIGNS)
        .await?;
    let last_payment = app_state.payment_repo.last_success(account.id).await?;
    let total_calls = app_state.call_repo.count_total(account.id).await?;
    let booked_calls = app_state.call_repo.count_booked(account.id).await?;

    let vendor_key_masked = match account.bolna_api_key_enc.as_deref() {
        Some(token) => Some(mask_key(&app_state.cipher.decrypt(token)?)),
        None => None,
    };

    Ok(Json(DashboardSummary {
        customer_status_counts,
        recent_campaigns,
        subscription: subscription::summarize(&account, Utc::now()),
        vendor_key_masked,
        last_payment,
        total_calls,
        booked_calls,
    }))
}
