// src/handlers/crm.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedAccount,
    models::crm::{normalize_phone, CreateCustomerPayload, Customer},
};

// GET /api/customers
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "CRM",
    responses(
        (status = 200, description = "Contatos da conta, mais recentes primeiro", body = Vec<Customer>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
) -> Result<Json<Vec<Customer>>, AppError> {
    let customers = app_state.crm_repo.list(account.id).await?;
    Ok(Json(customers))
}

// POST /api/customers
#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "CRM",
    request_body = CreateCustomerPayload,
    responses(
        (status = 201, description = "Contato criado", body = Customer),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Telefone já cadastrado para a conta")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    Json(payload): Json<CreateCustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let phone = normalize_phone(&payload.phone);
    let customer = app_state
        .crm_repo
        .create(account.id, &payload.full_name, &phone)
        .await?;

    Ok((StatusCode::CREATED, Json(customer)))
}
