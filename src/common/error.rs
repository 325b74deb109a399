use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::common::crypto::CryptoError;
use crate::llm::LlmError;
use crate::vendor::VendorError;

// Nosso tipo de erro central, com `thiserror` para melhor ergonomia.
// Cada variante sabe virar uma resposta HTTP em `into_response`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    // Telefone é único por conta no CRM.
    #[error("Telefone já cadastrado")]
    PhoneAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Conta não encontrada")]
    AccountNotFound,

    #[error("Recurso não encontrado: {0}")]
    NotFound(&'static str),

    // A conta ainda não configurou a chave da Bolna.
    #[error("Chave de API do fornecedor ausente")]
    MissingVendorKey,

    // O fornecedor respondeu 401 na validação da chave.
    #[error("Chave de API do fornecedor inválida")]
    InvalidVendorKey,

    // Trial ou período pago vencidos. O corpo carrega a dica de ação
    // que o frontend usa para redirecionar ao checkout.
    #[error("Assinatura expirada")]
    SubscriptionExpired,

    #[error("Muitas tentativas, aguarde antes de tentar novamente")]
    RateLimited,

    #[error("Assinatura do webhook inválida")]
    InvalidWebhookSignature,

    // Erros de transporte/resposta do fornecedor de voz.
    // Quando temos status+corpo do fornecedor, repassamos como diagnóstico.
    #[error(transparent)]
    Vendor(#[from] VendorError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "One or more fields are invalid.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            // O contrato do access-gate: 403 + dica de assinatura.
            AppError::SubscriptionExpired => {
                let body = Json(json!({
                    "error": "Your trial or subscription has expired.",
                    "action": "subscribe",
                    "redirectTo": "/billing",
                }));
                return (StatusCode::FORBIDDEN, body).into_response();
            }

            AppError::MissingVendorKey => {
                let body = Json(json!({
                    "error": "No Bolna API key configured for this account.",
                    "action": "setup",
                    "redirectTo": "/setup-api",
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            // Repassa o diagnóstico do fornecedor quando ele existe.
            AppError::Vendor(VendorError::Api { status, body }) => {
                let http_status =
                    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                let payload = Json(json!({
                    "error": "Vendor API request failed.",
                    "vendorStatus": status,
                    "vendorBody": body,
                }));
                return (http_status, payload).into_response();
            }
            AppError::Vendor(ref e) => {
                tracing::error!("🔥 Erro de transporte com o fornecedor: {}", e);
                (StatusCode::BAD_GATEWAY, "Could not reach the voice vendor.")
            }

            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "This e-mail is already in use."),
            AppError::PhoneAlreadyExists => (
                StatusCode::CONFLICT,
                "This phone number is already registered for this account.",
            ),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid e-mail or password."),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Missing or invalid authentication token.",
            ),
            AppError::AccountNotFound => (StatusCode::NOT_FOUND, "Account not found."),
            AppError::NotFound(what) => {
                let body = Json(json!({ "error": format!("{} not found.", what) }));
                return (StatusCode::NOT_FOUND, body).into_response();
            }
            AppError::InvalidVendorKey => (
                StatusCode::BAD_REQUEST,
                "The provided Bolna API key was rejected by the vendor.",
            ),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many key updates. Try again in a minute.",
            ),
            AppError::InvalidWebhookSignature => {
                (StatusCode::BAD_REQUEST, "Invalid webhook signature.")
            }

            // Todos os outros erros (DatabaseError, Crypto, Llm, ...) viram 500.
            // O `tracing` loga a mensagem detalhada; o cliente vê algo genérico.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "An unexpected error occurred.")
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflitos_de_unicidade_sao_409() {
        assert_eq!(
            AppError::EmailAlreadyExists.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::PhoneAlreadyExists.into_response().status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn gate_de_assinatura_e_403() {
        assert_eq!(
            AppError::SubscriptionExpired.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
