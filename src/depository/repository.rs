//! Depository persistence

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use super::models::{Depository, DepositoryId, DepositoryStatus};

/// Read/update access to depositories needed by verification
#[async_trait]
pub trait DepositoryRepository: Send + Sync {
    /// Fetch a depository only if it belongs to `user_id`
    async fn get_user_depository(
        &self,
        id: &DepositoryId,
        user_id: &str,
    ) -> Result<Option<Depository>, sqlx::Error>;

    async fn update_status(
        &self,
        id: &DepositoryId,
        user_id: &str,
        status: DepositoryStatus,
    ) -> Result<(), sqlx::Error>;
}

/// PostgreSQL-backed depository repository
pub struct PgDepositoryRepository {
    pool: PgPool,
}

impl PgDepositoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_depository(row: &PgRow) -> Result<Depository, sqlx::Error> {
        let decode = |e: String| sqlx::Error::Decode(e.into());
        Ok(Depository {
            id: DepositoryId::new(row.try_get::<String, _>("depository_id")?),
            user_id: row.try_get("user_id")?,
            bank_name: row.try_get("bank_name")?,
            holder: row.try_get("holder")?,
            holder_type: row.try_get::<String, _>("holder_type")?.parse().map_err(decode)?,
            account_type: row.try_get::<String, _>("type")?.parse().map_err(decode)?,
            routing_number: row.try_get("routing_number")?,
            account_number: row.try_get("account_number")?,
            status: row.try_get::<String, _>("status")?.parse().map_err(decode)?,
        })
    }
}

#[async_trait]
impl DepositoryRepository for PgDepositoryRepository {
    async fn get_user_depository(
        &self,
        id: &DepositoryId,
        user_id: &str,
    ) -> Result<Option<Depository>, sqlx::Error> {
        let row = sqlx::query(
            r#"SELECT depository_id, user_id, bank_name, holder, holder_type, type,
                      routing_number, account_number, status
               FROM depositories
               WHERE depository_id = $1 AND user_id = $2 AND deleted_at IS NULL"#,
        )
        .bind(id.as_str())
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_depository).transpose()
    }

    async fn update_status(
        &self,
        id: &DepositoryId,
        user_id: &str,
        status: DepositoryStatus,
    ) -> Result<(), sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE depositories SET status = $1, last_updated_at = NOW()
               WHERE depository_id = $2 AND user_id = $3 AND deleted_at IS NULL"#,
        )
        .bind(status.as_str())
        .bind(id.as_str())
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }
}
