// src/handlers/billing.rs
//
// Checkout e webhook. O webhook é rota PÚBLICA (o gateway não tem JWT) e
// lê o corpo como bytes brutos: a assinatura HMAC é sobre os bytes que
// chegaram, não sobre o JSON reserializado.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedAccount,
    models::payments::{CreateOrderPayload, OrderResponse},
};

// POST /api/billing/orders
#[utoipa::path(
    post,
    path = "/api/billing/orders",
    tag = "Billing",
    request_body = CreateOrderPayload,
    responses(
        (status = 200, description = "Pedido aberto no gateway", body = OrderResponse),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    Json(payload): Json<CreateOrderPayload>,
) -> Result<Json<OrderResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let order = app_state
        .billing_service
        .open_order(account.id, payload.amount)
        .await?;

    Ok(Json(order))
}

// POST /webhooks/razorpay
#[utoipa::path(
    post,
    path = "/webhooks/razorpay",
    tag = "Billing",
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Webhook reconhecido"),
        (status = 400, description = "Assinatura inválida")
    )
)]
pub async fn razorpay_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let signature = headers
        .get("x-razorpay-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::InvalidWebhookSignature)?;

    app_state
        .billing_service
        .handle_webhook(&body, signature)
        .await?;

    Ok((StatusCode::OK, Json(json!({ "received": true }))))
}
