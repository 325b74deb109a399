// src/db/crm_repo.rs

use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        crm::{Customer, CustomerStatus},
        dashboard::StatusCount,
    },
};

#[derive(Clone)]
pub struct CrmRepository {
    pool: PgPool,
}

impl CrmRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        account_id: Uuid,
        full_name: &str,
        phone: &str,
    ) -> Result<Customer, AppError> {
        sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (account_id, full_name, phone)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(account_id)
        .bind(full_name)
        .bind(phone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    // Telefone é único por conta.
                    return AppError::PhoneAlreadyExists;
                }
            }
            e.into()
        })
    }

    pub async fn list(&self, account_id: Uuid) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE account_id = $1 ORDER BY updated_at DESC",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    pub async fn find_by_phone(
        &self,
        account_id: Uuid,
        phone: &str,
    ) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE account_id = $1 AND phone = $2",
        )
        .bind(account_id)
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;
        Ok(customer)
    }

    /// Passo de CRM-sync: atualiza o status do contato pelo veredito da
    /// última chamada e anexa o resumo ao histórico. Cria o contato se o
    /// telefone ainda não existe (upsert por (account_id, phone)).
    pub async fn upsert_from_call(
        &self,
        account_id: Uuid,
        phone: &str,
        contact_name: Option<&str>,
        status: CustomerStatus,
        history_entry: &Value,
    ) -> Result<Customer, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (account_id, full_name, phone, status, conversation_history)
            VALUES ($1, COALESCE($3, 'Unknown'), $2, $4, jsonb_build_array($5::jsonb))
            ON CONFLICT (account_id, phone)
            DO UPDATE SET
                status = EXCLUDED.status,
                full_name = CASE
                    WHEN customers.full_name = 'Unknown' THEN EXCLUDED.full_name
                    ELSE customers.full_name
                END,
                conversation_history = customers.conversation_history || $5::jsonb,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(account_id)
        .bind(phone)
        .bind(contact_name)
        .bind(status)
        .bind(history_entry)
        .fetch_one(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Contagem por status para os cards do dashboard.
    pub async fn count_by_status(&self, account_id: Uuid) -> Result<Vec<StatusCount>, AppError> {
        let counts = sqlx::query_as::<_, StatusCount>(
            r#"
            SELECT status::text AS status, COUNT(*) AS count
            FROM customers
            WHERE account_id = $1
            GROUP BY status
            ORDER BY count DESC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }
}
