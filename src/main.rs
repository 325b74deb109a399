//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod llm;
mod middleware;
mod models;
mod scheduler;
mod services;
mod vendor;

use crate::config::AppState;
use crate::middleware::{access_gate::subscription_gate, auth::auth_guard};

#[tokio::main]
async fn main() {
    // Inicializa o logger, respeitando RUST_LOG quando definido.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .compact()
        .init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Loop de fundo: ingestão + CRM-sync periódicos.
    scheduler::spawn(app_state.clone());

    // Rotas públicas de autenticação
    let auth_public_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Rotas que exigem só o JWT (sem gate de assinatura): o operador
    // precisa conseguir configurar a chave e pagar mesmo expirado.
    let account_routes = Router::new()
        .route("/auth/me", get(handlers::auth::get_me))
        .route(
            "/setup-api",
            get(handlers::setup::get_setup_status).post(handlers::setup::configure_vendor_key),
        )
        .route("/settings", get(handlers::settings::get_settings))
        .route(
            "/settings/bolna-api",
            put(handlers::settings::update_vendor_key),
        )
        .route("/billing/orders", post(handlers::billing::create_order))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Rotas de dados: JWT + trial/assinatura vigente.
    let gated_routes = Router::new()
        .route("/internal/process-calls", post(handlers::calls::process_calls))
        .route(
            "/internal/call-status/{vendor_call_id}",
            get(handlers::calls::get_call_status),
        )
        .route("/call-bookings", get(handlers::calls::list_bookings))
        .route("/call-bookings/{id}", get(handlers::calls::get_booking))
        .route("/queries-calls", get(handlers::calls::list_queries))
        .route("/processed-calls", get(handlers::calls::list_processed))
        .route("/processed-calls/{id}", get(handlers::calls::get_call))
        .route("/dashboard", get(handlers::dashboard::get_summary))
        .route(
            "/customers",
            get(handlers::crm::list_customers).post(handlers::crm::create_customer),
        )
        .route("/agents", get(handlers::campaigns::list_agents))
        .route("/phone-numbers", get(handlers::campaigns::list_phone_numbers))
        .route(
            "/campaigns",
            get(handlers::campaigns::list_campaigns).post(handlers::campaigns::create_campaign),
        )
        .route("/campaigns/{id}", get(handlers::campaigns::get_campaign))
        .route(
            "/campaigns/{id}/stop",
            post(handlers::campaigns::stop_campaign),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            subscription_gate,
        ))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
        )
        .route("/api/health", get(|| async { "OK" }))
        // Webhook público: o gateway autentica por assinatura HMAC, não por JWT.
        .route("/webhooks/razorpay", post(handlers::billing::razorpay_webhook))
        .nest("/api/auth", auth_public_routes)
        .nest("/api", account_routes)
        .nest("/api", gated_routes)
        .with_state(app_state);

    // Inicia o servidor
    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.expect("Erro no servidor Axum");
}
