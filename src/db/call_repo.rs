// src/db/call_repo.rs

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::calls::{CallAnalysis, CallIntent, CallRecord},
};

// Dados de uma chamada nova vinda do fornecedor, prontos para inserir.
#[derive(Debug)]
pub struct NewCallRecord<'a> {
    pub vendor_call_id: &'a str,
    pub agent_id: Option<&'a str>,
    pub caller_number: Option<&'a str>,
    pub direction: &'a str,
    pub duration_secs: Option<i32>,
    pub started_at: Option<DateTime<Utc>>,
    pub transcript: Option<&'a str>,
    pub recording_url: Option<&'a str>,
    pub cost_breakdown: Option<&'a Value>,
    pub llm_analysis: Option<&'a CallAnalysis>,
    pub raw_llm_output: Option<&'a str>,
}

#[derive(Clone)]
pub struct CallRepository {
    pool: PgPool,
}

impl CallRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Checagem barata de idempotência, usada ANTES de pagar pela
    /// classificação. A garantia real de unicidade é o índice único
    /// (account_id, vendor_call_id) + insert_if_new.
    pub async fn exists(&self, account_id: Uuid, vendor_call_id: &str) -> Result<bool, AppError> {
        let found: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM calls WHERE account_id = $1 AND vendor_call_id = $2",
        )
        .bind(account_id)
        .bind(vendor_call_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    /// Insere com `ON CONFLICT DO NOTHING`: duas ingestões concorrentes da
    /// mesma chamada não geram duplicata nem erro — a segunda recebe None.
    /// `processed` é sempre true: chamada ingerida fica registrada mesmo
    /// quando o classificador falhou (analysis nula + raw preservado).
    pub async fn insert_if_new(
        &self,
        account_id: Uuid,
        call: NewCallRecord<'_>,
    ) -> Result<Option<CallRecord>, AppError> {
        let record = sqlx::query_as::<_, CallRecord>(
            r#"
            INSERT INTO calls (
                account_id, vendor_call_id, agent_id, caller_number, direction,
                duration_secs, started_at, transcript, recording_url,
                cost_breakdown, llm_analysis, raw_llm_output, processed
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, true)
            ON CONFLICT (account_id, vendor_call_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(account_id)
        .bind(call.vendor_call_id)
        .bind(call.agent_id)
        .bind(call.caller_number)
        .bind(call.direction)
        .bind(call.duration_secs)
        .bind(call.started_at)
        .bind(call.transcript)
        .bind(call.recording_url)
        .bind(call.cost_breakdown.map(Json))
        .bind(call.llm_analysis.map(Json))
        .bind(call.raw_llm_output)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Listagem com filtros opcionais de intent e direção, mais recente
    /// primeiro. O intent mora dentro do JSONB do veredito.
    pub async fn list(
        &self,
        account_id: Uuid,
        intent: Option<CallIntent>,
        direction: Option<&str>,
    ) -> Result<Vec<CallRecord>, AppError> {
        let calls = sqlx::query_as::<_, CallRecord>(
            r#"
            SELECT * FROM calls
            WHERE account_id = $1
              AND processed = true
              AND ($2::text IS NULL OR llm_analysis->>'intent' = $2)
              AND ($3::text IS NULL OR direction = $3)
            ORDER BY started_at DESC NULLS LAST, created_at DESC
            "#,
        )
        .bind(account_id)
        .bind(intent.map(|i| i.as_str()))
        .bind(direction)
        .fetch_all(&self.pool)
        .await?;

        Ok(calls)
    }

    pub async fn find_by_id(
        &self,
        account_id: Uuid,
        id: Uuid,
    ) -> Result<Option<CallRecord>, AppError> {
        let call = sqlx::query_as::<_, CallRecord>(
            "SELECT * FROM calls WHERE account_id = $1 AND id = $2",
        )
        .bind(account_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(call)
    }

    pub async fn find_by_vendor_id(
        &self,
        account_id: Uuid,
        vendor_call_id: &str,
    ) -> Result<Option<CallRecord>, AppError> {
        let call = sqlx::query_as::<_, CallRecord>(
            "SELECT * FROM calls WHERE account_id = $1 AND vendor_call_id = $2",
        )
        .bind(account_id)
        .bind(vendor_call_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(call)
    }

    /// Chamadas classificadas que o passo de CRM-sync ainda não viu.
    pub async fn list_unsynced_classified(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<CallRecord>, AppError> {
        let calls = sqlx::query_as::<_, CallRecord>(
            r#"
            SELECT * FROM calls
            WHERE account_id = $1
              AND crm_synced = false
              AND llm_analysis IS NOT NULL
            ORDER BY started_at ASC NULLS LAST
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(calls)
    }

    pub async fn mark_crm_synced(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE calls SET crm_synced = true WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn count_total(&self, account_id: Uuid) -> Result<i64, AppError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM calls WHERE account_id = $1")
                .bind(account_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    pub async fn count_booked(&self, account_id: Uuid) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM calls WHERE account_id = $1 AND llm_analysis->>'intent' = 'booked'",
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
