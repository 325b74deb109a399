// src/config.rs

use std::{collections::HashMap, env, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::crypto::KeyCipher,
    db::{
        AccountRepository, CallRepository, CampaignRepository, CrmRepository, PaymentRepository,
    },
    llm::{CallClassifier, LlmConfig, LlmProvider},
    services::{
        auth::AuthService, billing::BillingService, crm_sync::CrmSyncService,
        ingestion::IngestionService,
    },
    vendor::razorpay::RazorpayClient,
};

/// Intervalo padrão do scheduler de ingestão, em segundos.
const DEFAULT_SCHEDULER_INTERVAL_SECS: u64 = 300;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_secret: String,
    pub cipher: KeyCipher,

    // Repositórios
    pub account_repo: AccountRepository,
    pub call_repo: CallRepository,
    pub payment_repo: PaymentRepository,
    pub crm_repo: CrmRepository,
    pub campaign_repo: CampaignRepository,

    // Serviços
    pub auth_service: AuthService,
    pub billing_service: BillingService,
    pub ingestion_service: IngestionService,
    pub crm_sync_service: CrmSyncService,

    pub scheduler_interval: Duration,

    // Última atualização de chave por conta, para o rate-limit do
    // PUT /settings/bolna-api. Em memória: reiniciar o processo zera.
    pub key_update_guard: Arc<RwLock<HashMap<Uuid, DateTime<Utc>>>>,
}

impl AppState {
    // A assinatura retorna um Result: se a configuração falhar, o main
    // decide abortar.
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = required_var("DATABASE_URL")?;
        let jwt_secret = required_var("JWT_SECRET")?;
        let encryption_key = required_var("ENCRYPTION_KEY")?;
        let razorpay_key_id = required_var("RAZORPAY_KEY_ID")?;
        let razorpay_key_secret = required_var("RAZORPAY_KEY_SECRET")?;
        let razorpay_webhook_secret = required_var("RAZORPAY_WEBHOOK_SECRET")?;
        let llm_api_key = required_var("LLM_API_KEY")?;

        // Provedor explícito vence; sem ele, o prefixo da chave decide.
        let llm_provider = match env::var("LLM_PROVIDER") {
            Ok(name) => Some(
                LlmProvider::from_name(&name)
                    .ok_or_else(|| anyhow::anyhow!("LLM_PROVIDER desconhecido: '{}'", name))?,
            ),
            Err(_) => None,
        };

        let scheduler_interval = env::var("SCHEDULER_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_SCHEDULER_INTERVAL_SECS));

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let cipher = KeyCipher::from_hex(&encryption_key)?;
        let razorpay = RazorpayClient::new(
            razorpay_key_id,
            razorpay_key_secret,
            razorpay_webhook_secret,
        );
        let classifier = CallClassifier::new(LlmConfig {
            api_key: llm_api_key,
            provider: llm_provider,
        });

        // --- Monta o gráfico de dependências ---
        let account_repo = AccountRepository::new(db_pool.clone());
        let call_repo = CallRepository::new(db_pool.clone());
        let payment_repo = PaymentRepository::new(db_pool.clone());
        let crm_repo = CrmRepository::new(db_pool.clone());
        let campaign_repo = CampaignRepository::new(db_pool.clone());

        let auth_service = AuthService::new(account_repo.clone(), jwt_secret.clone());
        let billing_service = BillingService::new(
            db_pool.clone(),
            account_repo.clone(),
            payment_repo.clone(),
            razorpay,
        );
        let ingestion_service =
            IngestionService::new(call_repo.clone(), classifier, cipher.clone());
        let crm_sync_service = CrmSyncService::new(call_repo.clone(), crm_repo.clone());

        Ok(Self {
            db_pool,
            jwt_secret,
            cipher,
            account_repo,
            call_repo,
            payment_repo,
            crm_repo,
            campaign_repo,
            auth_service,
            billing_service,
            ingestion_service,
            crm_sync_service,
            scheduler_interval,
            key_update_guard: Arc::new(RwLock::new(HashMap::new())),
        })
    }
}

fn required_var(name: &'static str) -> anyhow::Result<String> {
    env::var(name).map_err(|_| anyhow::anyhow!("{} deve ser definida", name))
}
