// src/db/campaign_repo.rs

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::campaigns::Campaign};

#[derive(Clone)]
pub struct CampaignRepository {
    pool: PgPool,
}

impl CampaignRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        account_id: Uuid,
        name: &str,
        agent_id: &str,
        batch_id: &str,
        from_phone_number: &str,
        status: &str,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Result<Campaign, AppError> {
        let campaign = sqlx::query_as::<_, Campaign>(
            r#"
            INSERT INTO campaigns (
                account_id, name, agent_id, batch_id, from_phone_number, status, scheduled_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(account_id)
        .bind(name)
        .bind(agent_id)
        .bind(batch_id)
        .bind(from_phone_number)
        .bind(status)
        .bind(scheduled_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(campaign)
    }

    pub async fn list(&self, account_id: Uuid) -> Result<Vec<Campaign>, AppError> {
        let campaigns = sqlx::query_as::<_, Campaign>(
            "SELECT * FROM campaigns WHERE account_id = $1 ORDER BY created_at DESC",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(campaigns)
    }

    pub async fn list_recent(
        &self,
        account_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Campaign>, AppError> {
        let campaigns = sqlx::query_as::<_, Campaign>(
            "SELECT * FROM campaigns WHERE account_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(account_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(campaigns)
    }

    pub async fn find_by_id(
        &self,
        account_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Campaign>, AppError> {
        let campaign = sqlx::query_as::<_, Campaign>(
            "SELECT * FROM campaigns WHERE account_id = $1 AND id = $2",
        )
        .bind(account_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(campaign)
    }

    pub async fn update_status(&self, id: Uuid, status: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE campaigns SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
