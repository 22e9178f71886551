//! Ledger mirroring of verification deposits
//!
//! Each deposit becomes a double-entry transaction between the target account
//! and the operator account. Postings are not rolled back on a later failure;
//! the ledger and the submitted files are reconciled out of band.

use std::sync::Arc;
use tracing::{debug, warn};

use super::amounts::AmountSet;
use super::error::MicroDepositError;
use super::odfi::OdfiAccount;
use crate::clients::{
    AccountQuery, AccountsClient, Transaction, TransactionLine, TransactionPurpose,
};
use crate::depository::Depository;

/// Attempts per posting, including the first
pub const MAX_ATTEMPTS: usize = 3;

pub struct LedgerPoster {
    client: Arc<dyn AccountsClient>,
    odfi: Arc<OdfiAccount>,
}

impl LedgerPoster {
    pub fn new(client: Arc<dyn AccountsClient>, odfi: Arc<OdfiAccount>) -> Self {
        Self { client, odfi }
    }

    /// Post one transaction, retrying immediately up to [`MAX_ATTEMPTS`]
    pub async fn post_one(
        &self,
        request_id: &str,
        user_id: &str,
        lines: &[TransactionLine],
    ) -> Result<Transaction, MicroDepositError> {
        let mut last_err = None;
        for attempt in 1..=MAX_ATTEMPTS {
            match self.client.post_transaction(request_id, user_id, lines).await {
                Ok(tx) => {
                    debug!(
                        request_id,
                        transaction_id = %tx.id,
                        attempt,
                        "ledger transaction posted"
                    );
                    return Ok(tx);
                }
                Err(e) => {
                    warn!(request_id, attempt, "ledger posting failed: {}", e);
                    last_err = Some(e);
                }
            }
        }
        Err(match last_err {
            Some(e) => MicroDepositError::upstream("posting ledger transaction", e),
            None => MicroDepositError::upstream("posting ledger transaction", "no attempts made"),
        })
    }

    /// Mirror a full deposit set: one credit per push, then the reversing debit.
    ///
    /// Stops at the first failed posting; earlier postings stay committed.
    pub async fn post_micro_deposit_set(
        &self,
        request_id: &str,
        user_id: &str,
        dep: &Depository,
        amounts: &AmountSet,
    ) -> Result<Vec<Transaction>, MicroDepositError> {
        let query = AccountQuery {
            account_number: dep.account_number.clone(),
            routing_number: dep.routing_number.clone(),
            account_type: dep.account_type,
        };
        let target = self
            .client
            .search_account(request_id, user_id, &query)
            .await
            .map_err(|e| MicroDepositError::upstream("searching target ledger account", e))?
            .ok_or_else(|| {
                MicroDepositError::upstream(
                    "searching target ledger account",
                    "no matching account",
                )
            })?;
        let odfi_id = self.odfi.resolve(request_id, user_id).await?;

        let mut transactions = Vec::with_capacity(3);
        for amount in amounts.pushes() {
            let lines = [
                line(&target.id, TransactionPurpose::AchCredit, amount.cents()),
                line(&odfi_id, TransactionPurpose::AchDebit, amount.cents()),
            ];
            transactions.push(self.post_one(request_id, user_id, &lines).await?);
        }

        let reversal = [
            line(&target.id, TransactionPurpose::AchDebit, amounts.sum.cents()),
            line(&odfi_id, TransactionPurpose::AchCredit, amounts.sum.cents()),
        ];
        transactions.push(self.post_one(request_id, user_id, &reversal).await?);

        Ok(transactions)
    }
}

fn line(account_id: &str, purpose: TransactionPurpose, cents: i64) -> TransactionLine {
    TransactionLine {
        account_id: account_id.to_string(),
        purpose,
        amount: cents,
    }
}
