// src/models/calls.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Veredito categórico do classificador sobre um transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CallIntent {
    Queries,
    Booked,
    Interested,
    NotInterested,
    FollowUp,
}

impl CallIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queries => "queries",
            Self::Booked => "booked",
            Self::Interested => "interested",
            Self::NotInterested => "not_interested",
            Self::FollowUp => "follow_up",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "queries" => Some(Self::Queries),
            "booked" => Some(Self::Booked),
            "interested" => Some(Self::Interested),
            "not_interested" => Some(Self::NotInterested),
            "follow_up" => Some(Self::FollowUp),
            _ => None,
        }
    }
}

// Sub-registro de reserva dentro do veredito.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingInfo {
    pub is_booked: bool,
    pub date: Option<String>,
    pub time: Option<String>,
    pub raw_datetime_string: Option<String>,
}

// O shape fixo que o LLM deve devolver. Campos extras são ignorados;
// campos faltando ou intent desconhecido derrubam o parse (analysis = null).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CallAnalysis {
    pub summary: String,
    pub intent: CallIntent,
    pub booking: BookingInfo,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub call_direction: String,
}

// Um registro de chamada ingerida. Criado uma única vez por
// (conta, vendor_call_id); só o passo de classificação o atualiza.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub account_id: Uuid,
    pub vendor_call_id: String,
    pub agent_id: Option<String>,
    pub caller_number: Option<String>,
    pub direction: String,
    pub duration_secs: Option<i32>,
    pub started_at: Option<DateTime<Utc>>,
    pub transcript: Option<String>,
    pub recording_url: Option<String>,

    #[schema(value_type = Option<Object>)]
    pub cost_breakdown: Option<Json<Value>>,

    #[schema(value_type = Option<CallAnalysis>)]
    pub llm_analysis: Option<Json<CallAnalysis>>,

    // Guardado sempre que a classificação falha, para triagem manual.
    pub raw_llm_output: Option<String>,

    pub processed: bool,
    #[serde(skip_serializing)]
    pub crm_synced: bool,
    pub created_at: DateTime<Utc>,
}

impl CallRecord {
    pub fn intent(&self) -> Option<CallIntent> {
        self.llm_analysis.as_ref().map(|a| a.0.intent)
    }
}

// Filtros de listagem (?direction=&intent=)
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CallListFilter {
    pub direction: Option<String>,
    pub intent: Option<String>,
}

// GET /internal/call-status/{vendor_call_id}
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallStatusResponse {
    pub exists: bool,
    pub processed: bool,
    pub intent: Option<CallIntent>,
    pub is_booked: bool,
    pub call_direction: Option<String>,
}

// Contadores agregados de uma rodada de ingestão.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct IngestionReport {
    // Chamadas NOVAS vistas nesta rodada (já ingeridas não contam).
    pub total: u32,
    // Classificadas com sucesso.
    pub processed: u32,
    // Persistidas sem veredito (falha de parse ou do provedor).
    pub failed: u32,
}

// POST /internal/process-calls
#[derive(Debug, Serialize, ToSchema)]
pub struct ProcessCallsResponse {
    pub success: bool,
    pub total: u32,
    pub processed: u32,
    pub failed: u32,
}

impl From<IngestionReport> for ProcessCallsResponse {
    fn from(report: IngestionReport) -> Self {
        Self {
            success: true,
            total: report.total,
            processed: report.processed,
            failed: report.failed,
        }
    }
}
