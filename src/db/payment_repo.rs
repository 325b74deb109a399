// src/db/payment_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::payments::PaymentRecord};

#[derive(Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Criado quando o checkout abre; fica `pending` até o webhook.
    pub async fn create_pending(
        &self,
        account_id: Uuid,
        vendor_order_id: &str,
        amount: i64,
        currency: &str,
    ) -> Result<PaymentRecord, AppError> {
        let payment = sqlx::query_as::<_, PaymentRecord>(
            r#"
            INSERT INTO payments (account_id, vendor_order_id, amount, currency)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(account_id)
        .bind(vendor_order_id)
        .bind(amount)
        .bind(currency)
        .fetch_one(&self.pool)
        .await?;
        Ok(payment)
    }

    pub async fn find_pending_by_order_id(
        &self,
        vendor_order_id: &str,
    ) -> Result<Option<PaymentRecord>, AppError> {
        let payment = sqlx::query_as::<_, PaymentRecord>(
            "SELECT * FROM payments WHERE vendor_order_id = $1 AND status = 'pending'",
        )
        .bind(vendor_order_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(payment)
    }

    /// O único escritor das datas de período. Participa da transação do
    /// webhook junto com a ativação da assinatura.
    pub async fn mark_success<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE payments
            SET status = 'success',
                period_start = $2,
                period_end = $3,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(period_start)
        .bind(period_end)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Último pagamento confirmado (para o dashboard).
    pub async fn last_success(
        &self,
        account_id: Uuid,
    ) -> Result<Option<PaymentRecord>, AppError> {
        let payment = sqlx::query_as::<_, PaymentRecord>(
            r#"
            SELECT * FROM payments
            WHERE account_id = $1 AND status = 'success'
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(payment)
    }
}
