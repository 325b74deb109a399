// src/handlers/calls.rs
//
// Rotas de chamadas, todas atrás do auth_guard + subscription_gate.
// As listagens são visões filtradas da mesma tabela: bookings são as
// chamadas com intent `booked`, queries as com intent `queries`.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedAccount,
    models::calls::{
        CallIntent, CallListFilter, CallRecord, CallStatusResponse, ProcessCallsResponse,
    },
};

// POST /api/internal/process-calls
#[utoipa::path(
    post,
    path = "/api/internal/process-calls",
    tag = "Calls",
    responses(
        (status = 200, description = "Rodada de ingestão sob demanda", body = ProcessCallsResponse),
        (status = 400, description = "Conta sem chave do fornecedor"),
        (status = 403, description = "Assinatura expirada")
    ),
    security(("api_jwt" = []))
)]
pub async fn process_calls(
    State(app_state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
) -> Result<Json<ProcessCallsResponse>, AppError> {
    let report = app_state.ingestion_service.run_for_account(&account).await?;

    // O CRM acompanha na mesma rodada; falha aqui não invalida a ingestão.
    if let Err(e) = app_state.crm_sync_service.sync_account(&account).await {
        tracing::warn!(account = %account.id, "CRM-sync pós-ingestão falhou: {}", e);
    }

    Ok(Json(report.into()))
}

// GET /api/call-bookings
#[utoipa::path(
    get,
    path = "/api/call-bookings",
    tag = "Calls",
    params(("direction" = Option<String>, Query, description = "inbound | outbound")),
    responses(
        (status = 200, description = "Chamadas com reserva confirmada", body = Vec<CallRecord>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_bookings(
    State(app_state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    Query(filter): Query<CallListFilter>,
) -> Result<Json<Vec<CallRecord>>, AppError> {
    let calls = app_state
        .call_repo
        .list(account.id, Some(CallIntent::Booked), filter.direction.as_deref())
        .await?;
    Ok(Json(calls))
}

// GET /api/call-bookings/{id}
#[utoipa::path(
    get,
    path = "/api/call-bookings/{id}",
    tag = "Calls",
    params(("id" = Uuid, Path, description = "ID interno da chamada")),
    responses(
        (status = 200, description = "A chamada com reserva", body = CallRecord),
        (status = 404, description = "Chamada não encontrada ou sem reserva")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_booking(
    State(app_state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    Path(id): Path<Uuid>,
) -> Result<Json<CallRecord>, AppError> {
    let call = app_state
        .call_repo
        .find_by_id(account.id, id)
        .await?
        // A rota é a visão de reservas: chamada de outro intent é 404 aqui.
        .filter(|c| c.intent() == Some(CallIntent::Booked))
        .ok_or(AppError::NotFound("Booking"))?;
    Ok(Json(call))
}

// GET /api/queries-calls
#[utoipa::path(
    get,
    path = "/api/queries-calls",
    tag = "Calls",
    params(("direction" = Option<String>, Query, description = "inbound | outbound")),
    responses(
        (status = 200, description = "Chamadas classificadas como dúvidas", body = Vec<CallRecord>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_queries(
    State(app_state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    Query(filter): Query<CallListFilter>,
) -> Result<Json<Vec<CallRecord>>, AppError> {
    let calls = app_state
        .call_repo
        .list(account.id, Some(CallIntent::Queries), filter.direction.as_deref())
        .await?;
    Ok(Json(calls))
}

// GET /api/processed-calls
#[utoipa::path(
    get,
    path = "/api/processed-calls",
    tag = "Calls",
    params(
        ("direction" = Option<String>, Query, description = "inbound | outbound"),
        ("intent" = Option<String>, Query, description = "queries | booked | interested | not_interested | follow_up")
    ),
    responses(
        (status = 200, description = "Todas as chamadas processadas", body = Vec<CallRecord>),
        (status = 400, description = "Filtro de intent desconhecido")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_processed(
    State(app_state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    Query(filter): Query<CallListFilter>,
) -> Result<Json<Vec<CallRecord>>, AppError> {
    let intent = parse_intent_filter(filter.intent.as_deref())?;
    let calls = app_state
        .call_repo
        .list(account.id, intent, filter.direction.as_deref())
        .await?;
    Ok(Json(calls))
}

// GET /api/processed-calls/{id}
#[utoipa::path(
    get,
    path = "/api/processed-calls/{id}",
    tag = "Calls",
    params(("id" = Uuid, Path, description = "ID interno da chamada")),
    responses(
        (status = 200, description = "A chamada", body = CallRecord),
        (status = 404, description = "Chamada não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_call(
    State(app_state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    Path(id): Path<Uuid>,
) -> Result<Json<CallRecord>, AppError> {
    let call = app_state
        .call_repo
        .find_by_id(account.id, id)
        .await?
        .ok_or(AppError::NotFound("Call"))?;
    Ok(Json(call))
}

// GET /api/internal/call-status/{vendor_call_id}
#[utoipa::path(
    get,
    path = "/api/internal/call-status/{vendor_call_id}",
    tag = "Calls",
    params(("vendor_call_id" = String, Path, description = "ID da execução no fornecedor")),
    responses(
        (status = 200, description = "Status de ingestão da chamada", body = CallStatusResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_call_status(
    State(app_state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    Path(vendor_call_id): Path<String>,
) -> Result<Json<CallStatusResponse>, AppError> {
    let call = app_state
        .call_repo
        .find_by_vendor_id(account.id, &vendor_call_id)
        .await?;

    // Chamada desconhecida responde 200 com exists=false: o consumidor
    // usa esta rota para poll, e 404 aqui só gera ruído de retry.
    let response = match call {
        Some(call) => CallStatusResponse {
            exists: true,
            processed: call.processed,
            intent: call.intent(),
            is_booked: call
                .llm_analysis
                .as_ref()
                .is_some_and(|a| a.0.booking.is_booked),
            call_direction: Some(call.direction),
        },
        None => CallStatusResponse {
            exists: false,
            processed: false,
            intent: None,
            is_booked: false,
            call_direction: None,
        },
    };

    Ok(Json(response))
}

/// Traduz o parâmetro `?intent=` para o enum; valor desconhecido é 400.
fn parse_intent_filter(raw: Option<&str>) -> Result<Option<CallIntent>, AppError> {
    match raw {
        None => Ok(None),
        Some(s) => match CallIntent::from_str(s) {
            Some(intent) => Ok(Some(intent)),
            None => {
                let mut errors = ValidationErrors::new();
                let mut error = ValidationError::new("intent");
                error.message = Some("Unknown intent filter.".into());
                errors.add("intent", error);
                Err(AppError::ValidationError(errors))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filtro_de_intent() {
        assert_eq!(parse_intent_filter(None).unwrap(), None);
        assert_eq!(
            parse_intent_filter(Some("booked")).unwrap(),
            Some(CallIntent::Booked)
        );
        assert!(parse_intent_filter(Some("maybe")).is_err());
    }
}
