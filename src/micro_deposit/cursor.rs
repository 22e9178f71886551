//! Watermark cursor over unmerged deposits
//!
//! The watermark lives in memory only. A fresh cursor restarts at the start
//! of the current UTC day and may hand back rows an earlier cursor already
//! delivered; the conditional merge-mark is what keeps that safe.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::warn;

use super::error::MicroDepositError;
use super::models::UploadableMicroDeposit;
use super::repository::MicroDepositRepository;
use crate::money::ParsedAmount;

pub struct MicroDepositCursor {
    repo: Arc<dyn MicroDepositRepository>,
    batch_size: usize,
    newer_than: DateTime<Utc>,
}

impl MicroDepositCursor {
    pub fn new(repo: Arc<dyn MicroDepositRepository>, batch_size: usize) -> Self {
        Self::starting_at(repo, batch_size, start_of_day(Utc::now()))
    }

    pub fn starting_at(
        repo: Arc<dyn MicroDepositRepository>,
        batch_size: usize,
        newer_than: DateTime<Utc>,
    ) -> Self {
        Self {
            repo,
            batch_size,
            newer_than,
        }
    }

    pub fn watermark(&self) -> DateTime<Utc> {
        self.newer_than
    }

    /// Next batch in ascending `created_at` order.
    ///
    /// The watermark moves to the newest row seen, including rows whose
    /// stored amount no longer parses (those are logged and skipped).
    pub async fn next(&mut self) -> Result<Vec<UploadableMicroDeposit>, MicroDepositError> {
        let rows = self
            .repo
            .list_unmerged_after(self.newer_than, self.batch_size)
            .await
            .map_err(|e| MicroDepositError::persistence("reading micro-deposit batch", e))?;

        let mut max = self.newer_than;
        let mut batch = Vec::with_capacity(rows.len());
        for row in rows {
            if row.created_at > max {
                max = row.created_at;
            }
            match ParsedAmount::parse(&row.amount) {
                ParsedAmount::Valid(amount) => batch.push(UploadableMicroDeposit {
                    depository_id: row.depository_id,
                    user_id: row.user_id,
                    amount,
                    file_id: row.file_id,
                    created_at: row.created_at,
                }),
                ParsedAmount::Malformed { raw, reason } => {
                    warn!(
                        depository_id = %row.depository_id,
                        file_id = %row.file_id,
                        raw = %raw,
                        "skipping unparseable micro-deposit: {}",
                        reason
                    );
                }
            }
        }
        self.newer_than = max;
        Ok(batch)
    }
}

fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depository::DepositoryId;
    use crate::micro_deposit::models::MicroDepositRow;
    use crate::micro_deposit::repository::mock::MockMicroDepositRepository;
    use chrono::{Duration, TimeZone, Timelike};
    use std::collections::HashSet;

    fn row(n: i64, created_at: DateTime<Utc>) -> MicroDepositRow {
        MicroDepositRow {
            depository_id: DepositoryId::new(format!("dep-{}", n)),
            user_id: "user".to_string(),
            amount: format!("USD 0.{:02}", n + 1),
            file_id: format!("file-{}", n),
            created_at,
        }
    }

    #[test]
    fn test_start_of_day_is_utc_midnight() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 15, 42, 7).unwrap();
        let start = start_of_day(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap());
        assert_eq!(start.hour(), 0);
    }

    #[tokio::test]
    async fn test_batches_cover_each_row_once() {
        let repo = Arc::new(MockMicroDepositRepository::new());
        let day = Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap();
        for n in 0..5 {
            repo.push_row(row(n, day + Duration::minutes(n + 1)));
        }
        let mut cursor = MicroDepositCursor::starting_at(repo.clone(), 2, day);

        let mut sizes = Vec::new();
        let mut seen = Vec::new();
        for _ in 0..4 {
            let batch = cursor.next().await.unwrap();
            sizes.push(batch.len());
            seen.extend(batch.into_iter().map(|d| d.created_at));
        }

        assert_eq!(sizes, vec![2, 2, 1, 0]);
        assert_eq!(seen.len(), 5);
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(seen.iter().collect::<HashSet<_>>().len(), 5);
        assert_eq!(cursor.watermark(), day + Duration::minutes(5));
    }

    #[tokio::test]
    async fn test_empty_batch_keeps_watermark() {
        let repo = Arc::new(MockMicroDepositRepository::new());
        let day = Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap();
        let mut cursor = MicroDepositCursor::starting_at(repo, 10, day);
        assert!(cursor.next().await.unwrap().is_empty());
        assert_eq!(cursor.watermark(), day);
    }

    #[tokio::test]
    async fn test_rows_before_day_start_ignored() {
        let repo = Arc::new(MockMicroDepositRepository::new());
        let day = Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap();
        repo.push_row(row(0, day - Duration::seconds(1)));
        repo.push_row(row(1, day));
        repo.push_row(row(2, day + Duration::seconds(1)));

        let mut cursor = MicroDepositCursor::starting_at(repo, 10, day);
        let batch = cursor.next().await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].file_id, "file-2");
    }

    #[tokio::test]
    async fn test_malformed_row_skipped_but_passed() {
        let repo = Arc::new(MockMicroDepositRepository::new());
        let day = Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap();
        let mut bad = row(0, day + Duration::minutes(1));
        bad.amount = "not money".to_string();
        repo.push_row(bad);
        repo.push_row(row(1, day + Duration::minutes(2)));

        let mut cursor = MicroDepositCursor::starting_at(repo, 1, day);
        assert!(cursor.next().await.unwrap().is_empty());
        assert_eq!(cursor.watermark(), day + Duration::minutes(1));
        let batch = cursor.next().await.unwrap();
        assert_eq!(batch[0].file_id, "file-1");
    }
}
