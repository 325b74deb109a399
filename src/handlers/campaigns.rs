// src/handlers/campaigns.rs
//
// Campanhas de ligações de saída: o POST monta um CSV com os contatos do
// CRM, cria o batch no fornecedor e (opcionalmente) o agenda. O registro
// local guarda o batch_id para o stop e para o dashboard.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedAccount,
    models::{
        account::Account,
        campaigns::{Campaign, CreateCampaignPayload},
        crm::Customer,
    },
    vendor::{
        bolna::{BolnaAgent, BolnaExecution, BolnaPhoneNumber},
        BolnaClient,
    },
};

// GET /api/campaigns/{id} — registro local + execuções do batch.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignDetail {
    pub campaign: Campaign,
    pub executions: Vec<BolnaExecution>,
}

/// Cliente do fornecedor com a chave da conta, ou 400 se não há chave.
fn vendor_client(app_state: &AppState, account: &Account) -> Result<BolnaClient, AppError> {
    let key_enc = account
        .bolna_api_key_enc
        .as_deref()
        .ok_or(AppError::MissingVendorKey)?;
    let api_key = app_state.cipher.decrypt(key_enc)?;
    Ok(BolnaClient::new(api_key))
}

// GET /api/agents
#[utoipa::path(
    get,
    path = "/api/agents",
    tag = "Campaigns",
    responses(
        (status = 200, description = "Agentes de voz da conta no fornecedor", body = Vec<BolnaAgent>),
        (status = 400, description = "Sem chave do fornecedor")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_agents(
    State(app_state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
) -> Result<Json<Vec<BolnaAgent>>, AppError> {
    let client = vendor_client(&app_state, &account)?;
    Ok(Json(client.list_agents().await?))
}

// GET /api/phone-numbers
#[utoipa::path(
    get,
    path = "/api/phone-numbers",
    tag = "Campaigns",
    responses(
        (status = 200, description = "Números de origem disponíveis", body = Vec<BolnaPhoneNumber>),
        (status = 400, description = "Sem chave do fornecedor")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_phone_numbers(
    State(app_state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
) -> Result<Json<Vec<BolnaPhoneNumber>>, AppError> {
    let client = vendor_client(&app_state, &account)?;
    Ok(Json(client.list_phone_numbers().await?))
}

// GET /api/campaigns
#[utoipa::path(
    get,
    path = "/api/campaigns",
    tag = "Campaigns",
    responses(
        (status = 200, description = "Campanhas da conta", body = Vec<Campaign>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_campaigns(
    State(app_state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
) -> Result<Json<Vec<Campaign>>, AppError> {
    let campaigns = app_state.campaign_repo.list(account.id).await?;
    Ok(Json(campaigns))
}

// POST /api/campaigns
#[utoipa::path(
    post,
    path = "/api/campaigns",
    tag = "Campaigns",
    request_body = CreateCampaignPayload,
    responses(
        (status = 201, description = "Batch criado no fornecedor", body = Campaign),
        (status = 400, description = "Sem chave do fornecedor ou sem contatos"),
        (status = 403, description = "Assinatura expirada")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_campaign(
    State(app_state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    Json(payload): Json<CreateCampaignPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let client = vendor_client(&app_state, &account)?;

    let customers = app_state.crm_repo.list(account.id).await?;
    if customers.is_empty() {
        return Err(AppError::NotFound("Contacts for the campaign"));
    }
    let csv = contacts_csv(&customers);

    let batch = client
        .create_batch(&payload.agent_id, &payload.from_phone_number, csv)
        .await?;

    let status = match payload.scheduled_at {
        Some(scheduled_at) => {
            client.schedule_batch(&batch.batch_id, scheduled_at).await?;
            "scheduled"
        }
        None => "created",
    };

    let campaign = app_state
        .campaign_repo
        .create(
            account.id,
            &payload.name,
            &payload.agent_id,
            &batch.batch_id,
            &payload.from_phone_number,
            status,
            payload.scheduled_at,
        )
        .await?;

    tracing::info!(
        account = %account.id,
        batch = %campaign.batch_id,
        contacts = customers.len(),
        "🚀 Campanha criada"
    );

    Ok((StatusCode::CREATED, Json(campaign)))
}

// GET /api/campaigns/{id}
#[utoipa::path(
    get,
    path = "/api/campaigns/{id}",
    tag = "Campaigns",
    params(("id" = Uuid, Path, description = "ID da campanha")),
    responses(
        (status = 200, description = "Campanha com as execuções do batch", body = CampaignDetail),
        (status = 404, description = "Campanha não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_campaign(
    State(app_state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    Path(id): Path<Uuid>,
) -> Result<Json<CampaignDetail>, AppError> {
    let campaign = app_state
        .campaign_repo
        .find_by_id(account.id, id)
        .await?
        .ok_or(AppError::NotFound("Campaign"))?;

    let client = vendor_client(&app_state, &account)?;
    let executions = client.batch_executions(&campaign.batch_id).await?;

    Ok(Json(CampaignDetail {
        campaign,
        executions,
    }))
}

// POST /api/campaigns/{id}/stop
#[utoipa::path(
    post,
    path = "/api/campaigns/{id}/stop",
    tag = "Campaigns",
    params(("id" = Uuid, Path, description = "ID da campanha")),
    responses(
        (status = 200, description = "Batch interrompido no fornecedor", body = Campaign),
        (status = 404, description = "Campanha não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn stop_campaign(
    State(app_state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    Path(id): Path<Uuid>,
) -> Result<Json<Campaign>, AppError> {
    let campaign = app_state
        .campaign_repo
        .find_by_id(account.id, id)
        .await?
        .ok_or(AppError::NotFound("Campaign"))?;

    let client = vendor_client(&app_state, &account)?;
    client.stop_batch(&campaign.batch_id).await?;
    app_state
        .campaign_repo
        .update_status(campaign.id, "stopped")
        .await?;

    let stopped = app_state
        .campaign_repo
        .find_by_id(account.id, id)
        .await?
        .ok_or(AppError::NotFound("Campaign"))?;

    Ok(Json(stopped))
}

/// CSV no formato que o endpoint de batch do fornecedor espera.
fn contacts_csv(customers: &[Customer]) -> String {
    let mut csv = String::from("contact_number,first_name\n");
    for customer in customers {
        csv.push_str(&format!(
            "{},{}\n",
            customer.phone,
            csv_escape(&customer.full_name)
        ));
    }
    csv
}

/// Nomes podem conter vírgula ou aspas; o telefone normalizado nunca.
fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::crm::CustomerStatus;
    use chrono::Utc;
    use sqlx::types::Json as SqlxJson;

    fn customer(name: &str, phone: &str) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            full_name: name.to_string(),
            phone: phone.to_string(),
            status: CustomerStatus::New,
            conversation_history: SqlxJson(vec![]),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn csv_de_contatos() {
        let csv = contacts_csv(&[
            customer("Asha", "+919876543210"),
            customer("Singh, Ravi", "+919876543211"),
        ]);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("contact_number,first_name"));
        assert_eq!(lines.next(), Some("+919876543210,Asha"));
        assert_eq!(lines.next(), Some("+919876543211,\"Singh, Ravi\""));
    }

    #[test]
    fn escape_de_aspas() {
        assert_eq!(csv_escape(r#"O "Grande" Hotel"#), r#""O ""Grande"" Hotel""#);
        assert_eq!(csv_escape("simples"), "simples");
    }
}
