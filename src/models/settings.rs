// src/models/settings.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::account::SubscriptionSummary;

// GET /api/settings — a chave nunca volta em claro, só mascarada.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    #[schema(example = "••••••••3f2a")]
    pub bolna_api_key_masked: Option<String>,
    pub subscription: SubscriptionSummary,
}

// PUT /api/settings/bolna-api e POST /api/setup-api
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVendorKeyPayload {
    #[validate(length(min = 8, message = "A chave de API parece curta demais."))]
    pub api_key: String,
}

// GET /api/setup-api
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetupStatusResponse {
    pub configured: bool,
    pub subscription: SubscriptionSummary,
}

/// Mascara uma chave para exibição: só os 4 últimos caracteres visíveis.
pub fn mask_key(key: &str) -> String {
    let visible: String = key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("••••••••{}", visible)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mascara_mostra_so_o_final() {
        assert_eq!(mask_key("bn-1a2b3c4d5e6f"), "••••••••5e6f");
        assert!(!mask_key("bn-1a2b3c4d5e6f").contains("1a2b"));
    }

    #[test]
    fn chave_curta_nao_quebra() {
        assert_eq!(mask_key("ab"), "••••••••ab");
    }
}
