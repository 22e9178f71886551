//! Micro-deposit persistence

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

use super::models::{MicroDeposit, MicroDepositRow};
use crate::depository::DepositoryId;

/// Result of an atomic set insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// Non-deleted rows already existed; nothing was written
    AlreadyExists,
}

#[async_trait]
pub trait MicroDepositRepository: Send + Sync {
    /// Any non-deleted rows for the pair
    async fn has_deposits(&self, id: &DepositoryId, user_id: &str) -> Result<bool, sqlx::Error>;

    /// Insert every deposit in one transaction, re-checking for existing rows inside it
    async fn insert_set(
        &self,
        id: &DepositoryId,
        user_id: &str,
        deposits: &[MicroDeposit],
    ) -> Result<InsertOutcome, sqlx::Error>;

    /// Non-deleted rows for the pair
    async fn list_for_user(
        &self,
        id: &DepositoryId,
        user_id: &str,
    ) -> Result<Vec<MicroDepositRow>, sqlx::Error>;

    /// Every row for a depository regardless of owner, soft-deleted included
    async fn list_for_depository(&self, id: &DepositoryId)
    -> Result<Vec<MicroDepositRow>, sqlx::Error>;

    /// Unmerged, non-deleted rows created strictly after `after`, oldest first
    async fn list_unmerged_after(
        &self,
        after: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<MicroDepositRow>, sqlx::Error>;

    /// Set `merged_filename` if still unset; returns rows affected
    async fn mark_merged(
        &self,
        filename: &str,
        id: &DepositoryId,
        file_id: &str,
        amount: &str,
    ) -> Result<u64, sqlx::Error>;
}

/// PostgreSQL-backed micro-deposit repository
pub struct PgMicroDepositRepository {
    pool: PgPool,
}

impl PgMicroDepositRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_deposit(row: &PgRow) -> Result<MicroDepositRow, sqlx::Error> {
        Ok(MicroDepositRow {
            depository_id: DepositoryId::new(row.try_get::<String, _>("depository_id")?),
            user_id: row.try_get("user_id")?,
            amount: row.try_get("amount")?,
            file_id: row.try_get("file_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl MicroDepositRepository for PgMicroDepositRepository {
    async fn has_deposits(&self, id: &DepositoryId, user_id: &str) -> Result<bool, sqlx::Error> {
        let row = sqlx::query(
            r#"SELECT 1 FROM micro_deposits
               WHERE depository_id = $1 AND user_id = $2 AND deleted_at IS NULL
               LIMIT 1"#,
        )
        .bind(id.as_str())
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    async fn insert_set(
        &self,
        id: &DepositoryId,
        user_id: &str,
        deposits: &[MicroDeposit],
    ) -> Result<InsertOutcome, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // Serialize initiations for the same depository on its row lock
        sqlx::query(
            "SELECT 1 FROM depositories WHERE depository_id = $1 AND user_id = $2 FOR UPDATE",
        )
            .bind(id.as_str())
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;

        let existing = sqlx::query(
            r#"SELECT 1 FROM micro_deposits
               WHERE depository_id = $1 AND user_id = $2 AND deleted_at IS NULL
               LIMIT 1"#,
        )
        .bind(id.as_str())
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        if existing.is_some() {
            return Ok(InsertOutcome::AlreadyExists);
        }

        // distinct timestamps keep the cursor's strict watermark from skipping rows
        let now = Utc::now();
        for (i, deposit) in deposits.iter().enumerate() {
            sqlx::query(
                r#"INSERT INTO micro_deposits (depository_id, user_id, amount, file_id, created_at)
                   VALUES ($1, $2, $3, $4, $5)"#,
            )
            .bind(id.as_str())
            .bind(user_id)
            .bind(deposit.amount.to_string())
            .bind(&deposit.file_id)
            .bind(now + Duration::microseconds(i as i64))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(InsertOutcome::Inserted)
    }

    async fn list_for_user(
        &self,
        id: &DepositoryId,
        user_id: &str,
    ) -> Result<Vec<MicroDepositRow>, sqlx::Error> {
        let rows = sqlx::query(
            r#"SELECT depository_id, user_id, amount, file_id, created_at FROM micro_deposits
               WHERE depository_id = $1 AND user_id = $2 AND deleted_at IS NULL"#,
        )
        .bind(id.as_str())
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_deposit).collect()
    }

    async fn list_for_depository(
        &self,
        id: &DepositoryId,
    ) -> Result<Vec<MicroDepositRow>, sqlx::Error> {
        let rows = sqlx::query(
            r#"SELECT depository_id, user_id, amount, file_id, created_at FROM micro_deposits
               WHERE depository_id = $1"#,
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_deposit).collect()
    }

    async fn list_unmerged_after(
        &self,
        after: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<MicroDepositRow>, sqlx::Error> {
        let rows = sqlx::query(
            r#"SELECT depository_id, user_id, amount, file_id, created_at FROM micro_deposits
               WHERE deleted_at IS NULL AND merged_filename IS NULL AND created_at > $1
               ORDER BY created_at ASC
               LIMIT $2"#,
        )
        .bind(after)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_deposit).collect()
    }

    async fn mark_merged(
        &self,
        filename: &str,
        id: &DepositoryId,
        file_id: &str,
        amount: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE micro_deposits SET merged_filename = $1
               WHERE depository_id = $2 AND file_id = $3 AND amount = $4
                 AND (merged_filename IS NULL OR merged_filename = '')
                 AND deleted_at IS NULL"#,
        )
        .bind(filename)
        .bind(id.as_str())
        .bind(file_id)
        .bind(amount)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
