// src/handlers/setup.rs
//
// Onboarding da chave do fornecedor. O POST valida a chave NO fornecedor
// antes de gravar; a primeira chave válida concede o trial (uma única
// vez por conta, mesmo que a chave seja trocada depois).

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedAccount,
    models::settings::{SetupStatusResponse, UpdateVendorKeyPayload},
    services::subscription,
    vendor::BolnaClient,
};

// GET /api/setup-api
#[utoipa::path(
    get,
    path = "/api/setup-api",
    tag = "Setup",
    responses(
        (status = 200, description = "Se a conta já tem chave configurada", body = SetupStatusResponse),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_setup_status(
    AuthenticatedAccount(account): AuthenticatedAccount,
) -> Json<SetupStatusResponse> {
    Json(SetupStatusResponse {
        configured: account.has_vendor_key(),
        subscription: subscription::summarize(&account, Utc::now()),
    })
}

// POST /api/setup-api
#[utoipa::path(
    post,
    path = "/api/setup-api",
    tag = "Setup",
    request_body = UpdateVendorKeyPayload,
    responses(
        (status = 200, description = "Chave validada e gravada; trial concedido se for a primeira"),
        (status = 400, description = "Chave rejeitada pelo fornecedor"),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn configure_vendor_key(
    State(app_state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    Json(payload): Json<UpdateVendorKeyPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    // A chave só entra no banco depois de o fornecedor aceitá-la.
    let client = BolnaClient::new(payload.api_key.clone());
    if !client.validate_key().await? {
        return Err(AppError::InvalidVendorKey);
    }

    let key_enc = app_state.cipher.encrypt(&payload.api_key)?;
    app_state
        .account_repo
        .save_vendor_key(account.id, &key_enc)
        .await?;

    let (started_at, expires_at) = subscription::trial_window(Utc::now());
    let trial_granted = app_state
        .account_repo
        .grant_trial_if_first(account.id, started_at, expires_at)
        .await?;

    if trial_granted {
        tracing::info!(account = %account.id, "✅ Chave configurada, trial de 7 dias concedido");
    } else {
        tracing::info!(account = %account.id, "Chave do fornecedor atualizada via setup");
    }

    Ok((
        StatusCode::OK,
        Json(json!({
            "configured": true,
            "trialGranted": trial_granted,
        })),
    ))
}
