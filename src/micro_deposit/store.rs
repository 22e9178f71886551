//! Micro-deposit store
//!
//! Once-only initiation, guess matching and merge-marking on top of a
//! [`MicroDepositRepository`].

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::cursor::MicroDepositCursor;
use super::error::MicroDepositError;
use super::models::{MicroDeposit, UploadableMicroDeposit};
use super::repository::{InsertOutcome, MicroDepositRepository};
use crate::depository::DepositoryId;
use crate::money::{Amount, ParsedAmount};

#[derive(Clone)]
pub struct MicroDepositStore {
    repo: Arc<dyn MicroDepositRepository>,
}

impl MicroDepositStore {
    pub fn new(repo: Arc<dyn MicroDepositRepository>) -> Self {
        Self { repo }
    }

    /// Cheap pre-check used before any file is submitted
    pub async fn has_deposits(
        &self,
        id: &DepositoryId,
        user_id: &str,
    ) -> Result<bool, MicroDepositError> {
        self.repo
            .has_deposits(id, user_id)
            .await
            .map_err(|e| MicroDepositError::persistence("checking existing micro-deposits", e))
    }

    /// Persist the full set atomically; `Conflict` if any live rows exist
    pub async fn initiate(
        &self,
        id: &DepositoryId,
        user_id: &str,
        deposits: &[MicroDeposit],
    ) -> Result<(), MicroDepositError> {
        if deposits.is_empty() {
            return Err(MicroDepositError::Validation("no micro-deposits to store".to_string()));
        }
        let outcome = self
            .repo
            .insert_set(id, user_id, deposits)
            .await
            .map_err(|e| MicroDepositError::persistence("storing micro-deposits", e))?;

        match outcome {
            InsertOutcome::Inserted => {
                info!(
                    depository_id = %id,
                    user_id,
                    count = deposits.len(),
                    "stored micro-deposits"
                );
                Ok(())
            }
            InsertOutcome::AlreadyExists => Err(MicroDepositError::Conflict),
        }
    }

    /// Check guesses against the stored deposits.
    ///
    /// Each guess can satisfy at most one stored deposit. Count errors never
    /// disclose how many deposits are stored.
    pub async fn confirm(
        &self,
        id: &DepositoryId,
        user_id: &str,
        guesses: &[Amount],
    ) -> Result<(), MicroDepositError> {
        let stored = self
            .repo
            .list_for_user(id, user_id)
            .await
            .map_err(|e| MicroDepositError::persistence("reading micro-deposits", e))?;
        let stored: Vec<Amount> = stored
            .into_iter()
            .filter_map(|row| ParsedAmount::parse(&row.amount).into_valid("stored micro-deposit"))
            .collect();

        if stored.is_empty() || guesses.len() != stored.len() {
            return Err(MicroDepositError::Validation(format!(
                "incorrect amount of guesses, got {}",
                guesses.len()
            )));
        }

        if matches_one_to_one(&stored, guesses) {
            debug!(depository_id = %id, user_id, "micro-deposit guesses matched");
            Ok(())
        } else {
            warn!(depository_id = %id, user_id, "incorrect micro-deposit guesses");
            Err(MicroDepositError::Mismatch)
        }
    }

    /// All parseable deposits of a depository, for the admin surface only
    pub async fn list_for_admin(
        &self,
        id: &DepositoryId,
    ) -> Result<Vec<MicroDeposit>, MicroDepositError> {
        let rows = self
            .repo
            .list_for_depository(id)
            .await
            .map_err(|e| MicroDepositError::persistence("listing micro-deposits", e))?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                ParsedAmount::parse(&row.amount)
                    .into_valid("admin listing")
                    .map(|amount| MicroDeposit {
                        amount,
                        file_id: row.file_id,
                    })
            })
            .collect())
    }

    pub fn cursor(&self, batch_size: usize) -> MicroDepositCursor {
        MicroDepositCursor::new(self.repo.clone(), batch_size)
    }

    /// Record the merged file name once; repeated calls are no-ops.
    ///
    /// Returns whether this call set the name.
    pub async fn mark_merged(
        &self,
        filename: &str,
        deposit: &UploadableMicroDeposit,
    ) -> Result<bool, MicroDepositError> {
        let affected = self
            .repo
            .mark_merged(
                filename,
                &deposit.depository_id,
                &deposit.file_id,
                &deposit.amount.to_string(),
            )
            .await
            .map_err(|e| MicroDepositError::persistence("marking micro-deposit merged", e))?;
        Ok(affected > 0)
    }
}

fn matches_one_to_one(stored: &[Amount], guesses: &[Amount]) -> bool {
    let mut used = vec![false; guesses.len()];
    stored.iter().all(|expected| {
        match guesses
            .iter()
            .enumerate()
            .position(|(i, g)| !used[i] && g == expected)
        {
            Some(i) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}
