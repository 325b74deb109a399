// src/db/account_repo.rs

use chrono::{DateTime, Duration, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::account::{Account, SubscriptionStatus},
};

// O repositório de contas, responsável por todas as interações com a
// tabela 'accounts'.
#[derive(Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
        hotel_name: Option<&str>,
    ) -> Result<Account, AppError> {
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (email, password_hash, hotel_name)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(hotel_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Converte erro de violação de chave única em um erro mais amigável
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::EmailAlreadyExists;
                }
            }
            e.into()
        })
    }

    /// Grava a chave do fornecedor já criptografada.
    pub async fn save_vendor_key(&self, id: Uuid, key_enc: &str) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE accounts SET bolna_api_key_enc = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(key_enc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Concede o trial APENAS se nunca houve um (trial_started_at nulo).
    /// Devolve true quando o trial foi concedido agora.
    pub async fn grant_trial_if_first(
        &self,
        id: Uuid,
        started_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET subscription_status = 'trial',
                trial_started_at = $2,
                trial_expires_at = $3,
                updated_at = NOW()
            WHERE id = $1 AND trial_started_at IS NULL
            "#,
        )
        .bind(id)
        .bind(started_at)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Persiste a decisão do access-gate (expiração preguiçosa).
    pub async fn update_status(
        &self,
        id: Uuid,
        status: SubscriptionStatus,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE accounts SET subscription_status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Transição `<qualquer> -> active` do webhook. Participa da mesma
    /// transação que marca o pagamento, por isso recebe o executor.
    pub async fn activate_subscription<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        period_end: DateTime<Utc>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE accounts
            SET subscription_status = 'active',
                subscription_expires_at = $2,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(period_end)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Elegibilidade do scheduler: tem chave E (ativa OU em trial vigente).
    /// O filtro repete a regra do access-gate para não sincronizar conta
    /// cujo trial já venceu mas ainda não foi marcada como expirada.
    pub async fn list_eligible_for_sync(&self) -> Result<Vec<Account>, AppError> {
        let accounts = sqlx::query_as::<_, Account>(
            r#"
            SELECT * FROM accounts
            WHERE bolna_api_key_enc IS NOT NULL
              AND (
                    (subscription_status = 'active' AND subscription_expires_at > NOW())
                 OR (subscription_status = 'trial' AND trial_expires_at > NOW())
                 OR trial_expires_at > NOW()
              )
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(accounts)
    }

    /// Lease de exclusão mútua da ingestão: um UPDATE condicional atômico.
    /// Se outro processo (ou um tick anterior ainda em andamento) detém o
    /// lease, devolve false e o chamador pula a conta.
    pub async fn try_acquire_ingestion_lease(
        &self,
        id: Uuid,
        ttl: Duration,
    ) -> Result<bool, AppError> {
        let until = Utc::now() + ttl;
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET ingestion_lease_until = $2
            WHERE id = $1
              AND (ingestion_lease_until IS NULL OR ingestion_lease_until < NOW())
            "#,
        )
        .bind(id)
        .bind(until)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn release_ingestion_lease(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE accounts SET ingestion_lease_until = NULL WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
