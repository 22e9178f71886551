//! Verification workflow
//!
//! ```text
//! Unverified --initiate--> Unverified (+3 deposits) --confirm ok--> Verified
//!                                   |  ^
//!                                   +--+ confirm mismatch
//! ```
//!
//! Initiation submits three files (two pushes, one pull for their sum), each
//! carrying its own reversal, and only then stores the deposit set. Files
//! already accepted upstream are not compensated if a later step fails.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::amounts::{self, AmountSet};
use super::error::MicroDepositError;
use super::ledger::LedgerPoster;
use super::models::MicroDeposit;
use super::odfi::OdfiAccount;
use super::store::MicroDepositStore;
use crate::ach::{
    AchFile, FileBuilder, Receiver, ReversalOutcome, StandardEntryClassCode, TransferRequest,
    TransferType, add_micro_deposit_reversal,
};
use crate::clients::AchClient;
use crate::depository::{Depository, DepositoryId, DepositoryRepository, DepositoryStatus};
use crate::events::{Event, EventRepository};
use crate::money::{Amount, ParsedAmount};

/// Caller identity carried through every upstream call
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub user_id: String,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// Ledger side of an initiation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LedgerStatus {
    /// No ledger integration configured
    Disabled,
    Posted { transactions: usize },
    /// Files and rows are in place but the ledger is behind
    Degraded { message: String },
}

#[derive(Debug, Clone)]
pub struct InitiationOutcome {
    pub deposits: Vec<MicroDeposit>,
    pub ledger: LedgerStatus,
}

pub struct VerificationWorkflow {
    depositories: Arc<dyn DepositoryRepository>,
    store: MicroDepositStore,
    ach: Arc<dyn AchClient>,
    events: Arc<dyn EventRepository>,
    odfi: Arc<OdfiAccount>,
    ledger: Option<LedgerPoster>,
}

impl VerificationWorkflow {
    pub fn new(
        depositories: Arc<dyn DepositoryRepository>,
        store: MicroDepositStore,
        ach: Arc<dyn AchClient>,
        events: Arc<dyn EventRepository>,
        odfi: Arc<OdfiAccount>,
        ledger: Option<LedgerPoster>,
    ) -> Self {
        Self {
            depositories,
            store,
            ach,
            events,
            odfi,
            ledger,
        }
    }

    pub fn store(&self) -> &MicroDepositStore {
        &self.store
    }

    /// Start verification with freshly generated amounts
    pub async fn initiate(
        &self,
        ctx: &RequestContext,
        id: &DepositoryId,
    ) -> Result<InitiationOutcome, MicroDepositError> {
        self.initiate_with(ctx, id, amounts::generate()).await
    }

    /// Start verification with a given amount set
    pub async fn initiate_with(
        &self,
        ctx: &RequestContext,
        id: &DepositoryId,
        amounts: AmountSet,
    ) -> Result<InitiationOutcome, MicroDepositError> {
        let dep = self.unverified_depository(ctx, id).await?;

        if self.store.has_deposits(id, &ctx.user_id).await? {
            warn!(
                request_id = %ctx.request_id,
                depository_id = %id,
                "micro-deposits already initiated"
            );
            return Err(MicroDepositError::Conflict);
        }

        let deposits = self.submit_deposits(ctx, &dep, &amounts).await?;
        info!(
            request_id = %ctx.request_id,
            user_id = %ctx.user_id,
            depository_id = %id,
            count = deposits.len(),
            "submitted micro-deposits"
        );

        self.store.initiate(id, &ctx.user_id, &deposits).await?;

        let ledger = match &self.ledger {
            None => LedgerStatus::Disabled,
            Some(poster) => {
                match poster
                    .post_micro_deposit_set(&ctx.request_id, &ctx.user_id, &dep, &amounts)
                    .await
                {
                    Ok(txs) => {
                        info!(
                            request_id = %ctx.request_id,
                            count = txs.len(),
                            "posted micro-deposit transactions"
                        );
                        LedgerStatus::Posted {
                            transactions: txs.len(),
                        }
                    }
                    Err(e) => {
                        error!(
                            request_id = %ctx.request_id,
                            user_id = %ctx.user_id,
                            depository_id = %id,
                            "ledger out of sync with submitted micro-deposits: {}",
                            e
                        );
                        LedgerStatus::Degraded {
                            message: e.public_message(),
                        }
                    }
                }
            }
        };

        Ok(InitiationOutcome { deposits, ledger })
    }

    /// Check the caller's guesses and mark the depository verified.
    ///
    /// Malformed guesses are dropped; none left is a validation error.
    pub async fn confirm(
        &self,
        ctx: &RequestContext,
        id: &DepositoryId,
        raw_guesses: &[String],
    ) -> Result<(), MicroDepositError> {
        self.unverified_depository(ctx, id).await?;

        let guesses: Vec<Amount> = raw_guesses
            .iter()
            .filter_map(|raw| ParsedAmount::parse(raw).into_valid("micro-deposit guess"))
            .collect();
        if guesses.is_empty() {
            return Err(MicroDepositError::Validation("invalid amounts, found none".to_string()));
        }

        self.store.confirm(id, &ctx.user_id, &guesses).await?;

        self.depositories
            .update_status(id, &ctx.user_id, DepositoryStatus::Verified)
            .await
            .map_err(|e| MicroDepositError::persistence("marking depository verified", e))?;
        info!(
            request_id = %ctx.request_id,
            user_id = %ctx.user_id,
            depository_id = %id,
            "depository verified"
        );
        Ok(())
    }

    async fn unverified_depository(
        &self,
        ctx: &RequestContext,
        id: &DepositoryId,
    ) -> Result<Depository, MicroDepositError> {
        let dep = self
            .depositories
            .get_user_depository(id, &ctx.user_id)
            .await
            .map_err(|e| MicroDepositError::persistence("reading depository", e))?
            .ok_or(MicroDepositError::NotFound)?;

        if dep.status != DepositoryStatus::Unverified {
            return Err(MicroDepositError::InvalidState(format!(
                "depository {} in status {}",
                dep.id,
                dep.status.as_str()
            )));
        }
        Ok(dep)
    }

    async fn submit_deposits(
        &self,
        ctx: &RequestContext,
        dep: &Depository,
        amounts: &AmountSet,
    ) -> Result<Vec<MicroDeposit>, MicroDepositError> {
        let (originator, odfi_dep) = self.odfi.metadata();
        let builder = FileBuilder::new();

        let mut deposits = Vec::with_capacity(3);
        for (i, amount) in amounts.all().into_iter().enumerate() {
            let transfer_type = if i < 2 { TransferType::Push } else { TransferType::Pull };

            let receiver = Receiver {
                id: format!("{}-micro-deposit-verify", uuid::Uuid::new_v4().simple()),
                default_depository: dep.id.clone(),
                metadata: dep.holder.clone(),
            };
            let req = TransferRequest {
                transfer_type,
                amount: amount.clone(),
                originator: originator.id.clone(),
                originator_depository: odfi_dep.id.clone(),
                receiver: receiver.id.clone(),
                receiver_depository: dep.id.clone(),
                description: format!("{} micro-deposit verification", odfi_dep.bank_name),
                standard_entry_class_code: StandardEntryClassCode::Ppd,
            };
            let transfer = req.into_transfer();

            let idempotency_key = uuid::Uuid::new_v4().to_string();
            let mut file = builder
                .build(&idempotency_key, &transfer, &receiver, dep, &originator, &odfi_dep)
                .map_err(|e| {
                    MicroDepositError::Validation(format!("problem constructing ACH file: {}", e))
                })?;
            match add_micro_deposit_reversal(&mut file) {
                Ok(ReversalOutcome::Applied) => {}
                Ok(ReversalOutcome::Skipped) => {
                    warn!(
                        request_id = %ctx.request_id,
                        transfer_id = %transfer.id,
                        "reversal not applied"
                    );
                }
                Err(e) => {
                    return Err(MicroDepositError::Validation(format!(
                        "problem adding reversal: {}",
                        e
                    )));
                }
            }

            let file_id = self
                .ach
                .create_file(&idempotency_key, &file)
                .await
                .map_err(|e| {
                    error!(
                        request_id = %ctx.request_id,
                        user_id = %ctx.user_id,
                        "problem creating ACH file: {}",
                        e
                    );
                    MicroDepositError::upstream("problem creating ACH file", e)
                })?;
            self.check_file(ctx, &file_id, &file).await?;
            debug!(
                request_id = %ctx.request_id,
                transfer_id = %transfer.id,
                file_id = %file_id,
                depository_id = %dep.id,
                "created ACH file"
            );

            self.events
                .write_event(&ctx.user_id, &Event::transfer_created(&transfer.request))
                .await
                .map_err(|e| {
                    MicroDepositError::persistence("writing micro-deposit transfer event", e)
                })?;

            deposits.push(MicroDeposit {
                amount: amount.clone(),
                file_id,
            });
        }
        Ok(deposits)
    }

    /// Validate the stored file and confirm it came back with the submitted shape
    async fn check_file(
        &self,
        ctx: &RequestContext,
        file_id: &str,
        submitted: &AchFile,
    ) -> Result<(), MicroDepositError> {
        self.ach
            .validate_file(file_id)
            .await
            .map_err(|e| MicroDepositError::upstream("ACH file failed validation", e))?;
        let stored = self
            .ach
            .get_file(file_id)
            .await
            .map_err(|e| MicroDepositError::upstream("problem reading back ACH file", e))?;

        if !same_structure(submitted, &stored) {
            error!(
                request_id = %ctx.request_id,
                file_id,
                submitted_entries = submitted.entry_count(),
                stored_entries = stored.entry_count(),
                "ACH file read back incomplete"
            );
            return Err(MicroDepositError::upstream(
                "ACH file read back incomplete",
                format!("file {}", file_id),
            ));
        }
        Ok(())
    }
}

fn same_structure(a: &AchFile, b: &AchFile) -> bool {
    a.batches.len() == b.batches.len()
        && a.batches.iter().zip(&b.batches).all(|(x, y)| {
            x.entries().len() == y.entries().len()
                && x.entries()
                    .iter()
                    .zip(y.entries())
                    .all(|(e, f)| e.transaction_code == f.transaction_code && e.amount == f.amount)
        })
}
