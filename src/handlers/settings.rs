// src/handlers/settings.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{Duration, Utc};
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedAccount,
    models::settings::{mask_key, SettingsResponse, UpdateVendorKeyPayload},
    services::subscription,
    vendor::BolnaClient,
};

/// Intervalo mínimo entre trocas de chave da mesma conta.
const KEY_UPDATE_MIN_INTERVAL_SECS: i64 = 60;

// GET /api/settings
#[utoipa::path(
    get,
    path = "/api/settings",
    tag = "Settings",
    responses(
        (status = 200, description = "Configurações da conta, chave mascarada", body = SettingsResponse),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_settings(
    State(app_state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
) -> Result<Json<SettingsResponse>, AppError> {
    // A chave NUNCA sai em claro: descriptografa só para mascarar.
    let masked = match account.bolna_api_key_enc.as_deref() {
        Some(token) => Some(mask_key(&app_state.cipher.decrypt(token)?)),
        None => None,
    };

    Ok(Json(SettingsResponse {
        bolna_api_key_masked: masked,
        subscription: subscription::summarize(&account, Utc::now()),
    }))
}

// PUT /api/settings/bolna-api
#[utoipa::path(
    put,
    path = "/api/settings/bolna-api",
    tag = "Settings",
    request_body = UpdateVendorKeyPayload,
    responses(
        (status = 200, description = "Chave validada e trocada"),
        (status = 400, description = "Chave rejeitada pelo fornecedor"),
        (status = 429, description = "Troca de chave muito frequente")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_vendor_key(
    State(app_state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    Json(payload): Json<UpdateVendorKeyPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let now = Utc::now();

    // Rate-limit por conta, em memória. O fornecedor valida a chave com
    // uma chamada real; sem este freio, um frontend em loop viraria
    // tempestade de requisições contra ele.
    {
        let guard = app_state.key_update_guard.read().await;
        if let Some(last) = guard.get(&account.id) {
            if now - *last < Duration::seconds(KEY_UPDATE_MIN_INTERVAL_SECS) {
                return Err(AppError::RateLimited);
            }
        }
    }

    let client = BolnaClient::new(payload.api_key.clone());
    if !client.validate_key().await? {
        return Err(AppError::InvalidVendorKey);
    }

    let key_enc = app_state.cipher.encrypt(&payload.api_key)?;
    app_state
        .account_repo
        .save_vendor_key(account.id, &key_enc)
        .await?;

    app_state
        .key_update_guard
        .write()
        .await
        .insert(account.id, now);

    tracing::info!(account = %account.id, "Chave do fornecedor trocada");

    Ok((
        StatusCode::OK,
        Json(json!({ "updated": true, "bolnaApiKeyMasked": mask_key(&payload.api_key) })),
    ))
}
