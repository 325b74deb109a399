// src/middleware/access_gate.rs
//
// Roda DEPOIS do auth_guard nas rotas de dados. Avalia o status que a
// conta deveria ter agora (expiração preguiçosa), persiste a transição
// quando houver e barra quem não tem trial nem período pago vigente.

use axum::{extract::State, middleware::Next, response::Response};

use crate::{
    common::error::AppError,
    config::AppState,
    models::account::Account,
    services::subscription,
};

pub async fn subscription_gate(
    State(app_state): State<AppState>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let mut account = request
        .extensions()
        .get::<Account>()
        .cloned()
        .ok_or(AppError::InvalidToken)?;

    let now = chrono::Utc::now();
    let check = subscription::evaluate_status(&account, now);

    if check.changed {
        // A transição para `expired` é persistida na hora em que foi
        // observada; jobs em lote não são necessários.
        app_state
            .account_repo
            .update_status(account.id, check.status)
            .await?;
        account.subscription_status = check.status;
        tracing::info!(account = %account.id, "Assinatura marcada como expirada");
    }

    if !subscription::has_access(&account, now) {
        return Err(AppError::SubscriptionExpired);
    }

    // Reinsere a conta possivelmente atualizada para os handlers.
    request.extensions_mut().insert(account);
    Ok(next.run(request).await)
}
