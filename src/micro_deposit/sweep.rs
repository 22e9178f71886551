//! Merge sweep - periodic merge-and-mark loop over unmerged deposits
//!
//! Each pass drains a fresh [`MicroDepositCursor`], merges every deposit's
//! file through a [`FileMerger`] and records the merged filename. Several
//! sweeps may run at once; the conditional merge-mark is the only guard.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, sleep};
use tracing::{debug, error, info, warn};

use super::error::MicroDepositError;
use super::models::UploadableMicroDeposit;
use super::store::MicroDepositStore;
use crate::ach::{AchFile, FileHeader};
use crate::clients::AchClient;

/// Combines a deposit's file into an outbound file
#[async_trait]
pub trait FileMerger: Send + Sync {
    /// Returns the name of the file the deposit now lives in
    async fn merge(&self, deposit: &UploadableMicroDeposit) -> Result<String, MicroDepositError>;
}

/// Appends fetched files into one JSON file per day and ODFI under a directory
pub struct DirectoryMerger {
    ach: Arc<dyn AchClient>,
    outbound_dir: PathBuf,
    odfi_routing_number: String,
    // one writer per process; cross-process duplicates are caught by batch id
    write_lock: Mutex<()>,
}

impl DirectoryMerger {
    pub fn new(
        ach: Arc<dyn AchClient>,
        outbound_dir: impl Into<PathBuf>,
        odfi_routing_number: impl Into<String>,
    ) -> Self {
        Self {
            ach,
            outbound_dir: outbound_dir.into(),
            odfi_routing_number: odfi_routing_number.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn filename(&self, deposit: &UploadableMicroDeposit) -> String {
        format!(
            "{}-{}.ach",
            deposit.created_at.format("%Y%m%d"),
            self.odfi_routing_number
        )
    }

    async fn load(
        &self,
        path: &PathBuf,
        template: &FileHeader,
    ) -> Result<AchFile, MicroDepositError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| MicroDepositError::persistence("reading merged file", e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let header = FileHeader {
                    id: uuid::Uuid::new_v4().to_string(),
                    ..template.clone()
                };
                Ok(AchFile::new(header.id.clone(), header))
            }
            Err(e) => Err(MicroDepositError::persistence("reading merged file", e)),
        }
    }
}

#[async_trait]
impl FileMerger for DirectoryMerger {
    async fn merge(&self, deposit: &UploadableMicroDeposit) -> Result<String, MicroDepositError> {
        let incoming = self
            .ach
            .get_file(&deposit.file_id)
            .await
            .map_err(|e| MicroDepositError::upstream("fetching ACH file for merge", e))?;

        let filename = self.filename(deposit);
        let path = self.outbound_dir.join(&filename);

        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&self.outbound_dir)
            .await
            .map_err(|e| MicroDepositError::persistence("creating outbound directory", e))?;
        let mut merged = self.load(&path, &incoming.header).await?;

        let mut appended = 0;
        for batch in incoming.batches {
            if merged.batches.iter().any(|b| b.header().id == batch.header().id) {
                continue;
            }
            let mut batch = batch;
            let mut header = batch.header().clone();
            header.batch_number = merged.batches.len() as u32 + 1;
            batch.set_header(header);
            merged.add_batch(batch);
            appended += 1;
        }

        if appended > 0 {
            let body = serde_json::to_vec_pretty(&merged)
                .map_err(|e| MicroDepositError::persistence("encoding merged file", e))?;
            tokio::fs::write(&path, body)
                .await
                .map_err(|e| MicroDepositError::persistence("writing merged file", e))?;
        }
        debug!(file_id = %deposit.file_id, filename = %filename, appended, "merged ACH file");
        Ok(filename)
    }
}

/// Counts from one sweep pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub merged: usize,
    /// Already marked by another sweep
    pub skipped: usize,
    pub failed: usize,
}

pub struct MergeSweep {
    store: MicroDepositStore,
    merger: Arc<dyn FileMerger>,
    batch_size: usize,
    interval: Duration,
}

impl MergeSweep {
    pub fn new(
        store: MicroDepositStore,
        merger: Arc<dyn FileMerger>,
        batch_size: usize,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            merger,
            batch_size,
            interval,
        }
    }

    /// Run sweeps forever on the configured interval
    pub async fn run(&self) {
        info!(
            "Merge sweep starting, batch size: {}, interval: {:?}",
            self.batch_size, self.interval
        );
        loop {
            match self.sweep_once().await {
                Ok(report) if report != SweepReport::default() => {
                    info!(
                        merged = report.merged,
                        skipped = report.skipped,
                        failed = report.failed,
                        "micro-deposit merge sweep finished"
                    );
                }
                Ok(_) => debug!("no micro-deposits to merge"),
                Err(e) => error!("micro-deposit merge sweep failed: {}", e),
            }
            sleep(self.interval).await;
        }
    }

    /// One pass over today's unmerged deposits.
    ///
    /// A failed row is logged and left for the next pass.
    pub async fn sweep_once(&self) -> Result<SweepReport, MicroDepositError> {
        let mut cursor = self.store.cursor(self.batch_size);
        let mut report = SweepReport::default();

        loop {
            let batch = cursor.next().await?;
            if batch.is_empty() {
                break;
            }
            for deposit in &batch {
                let filename = match self.merger.merge(deposit).await {
                    Ok(name) => name,
                    Err(e) => {
                        warn!(
                            depository_id = %deposit.depository_id,
                            file_id = %deposit.file_id,
                            "problem merging micro-deposit: {}",
                            e
                        );
                        report.failed += 1;
                        continue;
                    }
                };
                match self.store.mark_merged(&filename, deposit).await {
                    Ok(true) => report.merged += 1,
                    Ok(false) => report.skipped += 1,
                    Err(e) => {
                        warn!(
                            depository_id = %deposit.depository_id,
                            file_id = %deposit.file_id,
                            "problem marking micro-deposit merged: {}",
                            e
                        );
                        report.failed += 1;
                    }
                }
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ach::{FileBuilder, Receiver, StandardEntryClassCode, TransferRequest, TransferType};
    use crate::ach::add_micro_deposit_reversal;
    use crate::clients::ach::mock::MockAchClient;
    use crate::depository::DepositoryId;
    use crate::depository::repository::mock::unverified_depository;
    use crate::micro_deposit::models::MicroDeposit;
    use crate::micro_deposit::repository::mock::MockMicroDepositRepository;
    use crate::money::Amount;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingMerger {
        calls: AtomicUsize,
        fail_file: Option<String>,
    }

    #[async_trait]
    impl FileMerger for CountingMerger {
        async fn merge(
            &self,
            deposit: &UploadableMicroDeposit,
        ) -> Result<String, MicroDepositError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_file.as_deref() == Some(deposit.file_id.as_str()) {
                return Err(MicroDepositError::upstream("merge", "boom"));
            }
            Ok("merged.ach".to_string())
        }
    }

    async fn seeded_store() -> (Arc<MockMicroDepositRepository>, MicroDepositStore) {
        let repo = Arc::new(MockMicroDepositRepository::new());
        let store = MicroDepositStore::new(repo.clone());
        let deposits: Vec<MicroDeposit> = [12, 7, 19]
            .iter()
            .enumerate()
            .map(|(i, c)| MicroDeposit {
                amount: Amount::usd_cents(*c),
                file_id: format!("file-{}", i + 1),
            })
            .collect();
        store
            .initiate(&DepositoryId::new("dep-1"), "user", &deposits)
            .await
            .unwrap();
        (repo, store)
    }

    #[tokio::test]
    async fn test_sweep_marks_every_row_once() {
        let (repo, store) = seeded_store().await;
        let merger = Arc::new(CountingMerger {
            calls: AtomicUsize::new(0),
            fail_file: None,
        });
        let sweep = MergeSweep::new(store, merger.clone(), 2, Duration::from_secs(60));

        let first = sweep.sweep_once().await.unwrap();
        assert_eq!(first.merged, 3);
        assert!(repo.rows().iter().all(|r| r.merged_filename.as_deref() == Some("merged.ach")));

        let second = sweep.sweep_once().await.unwrap();
        assert_eq!(second, SweepReport::default());
        assert_eq!(merger.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failed_row_left_for_next_pass() {
        let (repo, store) = seeded_store().await;
        let merger = Arc::new(CountingMerger {
            calls: AtomicUsize::new(0),
            fail_file: Some("file-2".to_string()),
        });
        let sweep = MergeSweep::new(store, merger, 10, Duration::from_secs(60));

        let report = sweep.sweep_once().await.unwrap();
        assert_eq!((report.merged, report.failed), (2, 1));
        let unmerged: Vec<_> = repo
            .rows()
            .into_iter()
            .filter(|r| r.merged_filename.is_none())
            .collect();
        assert_eq!(unmerged.len(), 1);
        assert_eq!(unmerged[0].row.file_id, "file-2");
    }

    #[tokio::test]
    async fn test_concurrent_sweeps_mark_once() {
        let (repo, store) = seeded_store().await;
        let merger = Arc::new(CountingMerger {
            calls: AtomicUsize::new(0),
            fail_file: None,
        });
        let a = MergeSweep::new(store.clone(), merger.clone(), 1, Duration::from_secs(60));
        let b = MergeSweep::new(store, merger, 1, Duration::from_secs(60));

        let (ra, rb) = tokio::join!(a.sweep_once(), b.sweep_once());
        let (ra, rb) = (ra.unwrap(), rb.unwrap());
        assert_eq!(ra.merged + rb.merged, 3);
        assert!(repo.rows().iter().all(|r| r.merged_filename.is_some()));
    }

    fn verification_file(cents: i64) -> AchFile {
        let dep = unverified_depository("dep-1", "user");
        let mut odfi = unverified_depository("odfi", "");
        odfi.routing_number = "987654320".to_string();
        let receiver = Receiver {
            id: "r-micro-deposit-verify".to_string(),
            default_depository: dep.id.clone(),
            metadata: dep.holder.clone(),
        };
        let originator = crate::ach::Originator {
            id: "odfi".to_string(),
            default_depository: odfi.id.clone(),
            identification: "001".to_string(),
            metadata: "Operator".to_string(),
        };
        let transfer = TransferRequest {
            transfer_type: TransferType::Push,
            amount: Amount::usd_cents(cents),
            originator: "odfi".to_string(),
            originator_depository: odfi.id.clone(),
            receiver: receiver.id.clone(),
            receiver_depository: dep.id.clone(),
            description: "verification".to_string(),
            standard_entry_class_code: StandardEntryClassCode::Ppd,
        }
        .into_transfer();
        let mut file = FileBuilder::new()
            .build("key", &transfer, &receiver, &dep, &originator, &odfi)
            .unwrap();
        add_micro_deposit_reversal(&mut file).unwrap();
        file
    }

    #[tokio::test]
    async fn test_directory_merger_appends_batches_once() {
        let dir = std::env::temp_dir().join(format!("paygate-merge-{}", uuid::Uuid::new_v4()));
        let ach = Arc::new(MockAchClient::new());
        ach.insert_file("file-1", verification_file(12));
        ach.insert_file("file-2", verification_file(7));
        let merger = DirectoryMerger::new(ach, &dir, "987654320");

        let deposit = |file_id: &str| UploadableMicroDeposit {
            depository_id: DepositoryId::new("dep-1"),
            user_id: "user".to_string(),
            amount: Amount::usd_cents(1),
            file_id: file_id.to_string(),
            created_at: chrono::Utc::now(),
        };

        let name = merger.merge(&deposit("file-1")).await.unwrap();
        assert!(name.ends_with("-987654320.ach"));
        merger.merge(&deposit("file-2")).await.unwrap();
        // re-delivery of an already merged file
        merger.merge(&deposit("file-1")).await.unwrap();

        let merged: AchFile =
            serde_json::from_slice(&std::fs::read(dir.join(&name)).unwrap()).unwrap();
        assert_eq!(merged.batches.len(), 2);
        assert_eq!(merged.entry_count(), 4);
        assert_eq!(merged.control.batch_count, 2);
        assert_eq!(merged.batches[1].header().batch_number, 2);

        std::fs::remove_dir_all(&dir).ok();
    }
}
