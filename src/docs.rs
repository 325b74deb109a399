// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Setup ---
        handlers::setup::get_setup_status,
        handlers::setup::configure_vendor_key,

        // --- Settings ---
        handlers::settings::get_settings,
        handlers::settings::update_vendor_key,

        // --- Billing ---
        handlers::billing::create_order,
        handlers::billing::razorpay_webhook,

        // --- Calls ---
        handlers::calls::process_calls,
        handlers::calls::list_bookings,
        handlers::calls::get_booking,
        handlers::calls::list_queries,
        handlers::calls::list_processed,
        handlers::calls::get_call,
        handlers::calls::get_call_status,

        // --- Dashboard ---
        handlers::dashboard::get_summary,

        // --- CRM ---
        handlers::crm::list_customers,
        handlers::crm::create_customer,

        // --- Campaigns ---
        handlers::campaigns::list_agents,
        handlers::campaigns::list_phone_numbers,
        handlers::campaigns::list_campaigns,
        handlers::campaigns::create_campaign,
        handlers::campaigns::get_campaign,
        handlers::campaigns::stop_campaign,
    ),
    components(
        schemas(
            // --- Auth ---
            models::account::Account,
            models::account::SubscriptionStatus,
            models::account::SubscriptionSummary,
            models::auth::RegisterPayload,
            models::auth::LoginPayload,
            models::auth::AuthResponse,

            // --- Setup / Settings ---
            models::settings::SettingsResponse,
            models::settings::UpdateVendorKeyPayload,
            models::settings::SetupStatusResponse,

            // --- Billing ---
            models::payments::PaymentStatus,
            models::payments::PaymentRecord,
            models::payments::CreateOrderPayload,
            models::payments::OrderResponse,

            // --- Calls ---
            models::calls::CallIntent,
            models::calls::BookingInfo,
            models::calls::CallAnalysis,
            models::calls::CallRecord,
            models::calls::CallListFilter,
            models::calls::CallStatusResponse,
            models::calls::ProcessCallsResponse,

            // --- Dashboard ---
            models::dashboard::DashboardSummary,
            models::dashboard::StatusCount,

            // --- CRM ---
            models::crm::CustomerStatus,
            models::crm::Customer,
            models::crm::CreateCustomerPayload,

            // --- Campaigns ---
            models::campaigns::Campaign,
            models::campaigns::CreateCampaignPayload,
            handlers::campaigns::CampaignDetail,
            crate::vendor::bolna::BolnaAgent,
            crate::vendor::bolna::BolnaPhoneNumber,
            crate::vendor::bolna::BolnaExecution,
            crate::vendor::bolna::TelephonyData,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Setup", description = "Onboarding da chave do fornecedor"),
        (name = "Settings", description = "Configurações da Conta"),
        (name = "Billing", description = "Checkout e Webhook de Pagamento"),
        (name = "Calls", description = "Ingestão e Consulta de Chamadas"),
        (name = "Dashboard", description = "Indicadores da Conta"),
        (name = "CRM", description = "Contatos e Histórico"),
        (name = "Campaigns", description = "Campanhas de Ligações de Saída")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
