//! Operator (ODFI) settlement account
//!
//! The ledger identifier of the operator's own account is looked up lazily
//! and cached for the lifetime of the resolver. Concurrent resolutions are
//! serialized by an async mutex so at most one lookup populates the cache.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::error::MicroDepositError;
use crate::ach::Originator;
use crate::clients::{AccountQuery, AccountsClient};
use crate::config::OdfiConfig;
use crate::depository::{AccountType, Depository, DepositoryId, DepositoryStatus, HolderType};

const ODFI_ID: &str = "odfi";

pub struct OdfiAccount {
    account_number: String,
    routing_number: String,
    account_type: AccountType,
    identification: String,
    holder: String,
    bank_name: String,

    client: Option<Arc<dyn AccountsClient>>,

    account_id: Mutex<Option<String>>,
}

impl OdfiAccount {
    pub fn new(config: &OdfiConfig, client: Option<Arc<dyn AccountsClient>>) -> Self {
        Self {
            account_number: config.account_number.clone(),
            routing_number: config.routing_number.clone(),
            account_type: config.account_type,
            identification: config.identification.clone(),
            holder: config.holder.clone(),
            bank_name: config.bank_name.clone(),
            client,
            account_id: Mutex::new(None),
        }
    }

    /// Ledger account id of the operator account, resolved once then cached.
    ///
    /// A failed lookup leaves the cache empty; the next call retries.
    pub async fn resolve(
        &self,
        request_id: &str,
        user_id: &str,
    ) -> Result<String, MicroDepositError> {
        let mut cached = self.account_id.lock().await;
        if let Some(id) = cached.as_ref() {
            return Ok(id.clone());
        }

        let client = self.client.as_ref().ok_or_else(|| {
            MicroDepositError::upstream("resolving ODFI account", "no accounts client configured")
        })?;

        let query = AccountQuery {
            account_number: self.account_number.clone(),
            routing_number: self.routing_number.clone(),
            account_type: self.account_type,
        };
        let account = match client.search_account(request_id, user_id, &query).await {
            Ok(Some(account)) if !account.id.is_empty() => account,
            Ok(_) => {
                warn!(
                    request_id,
                    routing_number = %self.routing_number,
                    "ODFI account not found in ledger"
                );
                return Err(MicroDepositError::upstream(
                    "resolving ODFI account",
                    "no matching ledger account",
                ));
            }
            Err(e) => {
                warn!(request_id, "ODFI account lookup failed: {}", e);
                return Err(MicroDepositError::upstream("resolving ODFI account", e));
            }
        };

        debug!(request_id, account_id = %account.id, "cached ODFI ledger account");
        *cached = Some(account.id.clone());
        Ok(account.id)
    }

    /// Synthetic originator and depository representing the operator
    pub fn metadata(&self) -> (Originator, Depository) {
        let originator = Originator {
            id: ODFI_ID.to_string(),
            default_depository: DepositoryId::new(ODFI_ID),
            identification: self.identification.clone(),
            metadata: format!("{} micro-deposits", self.holder),
        };
        let depository = Depository {
            id: DepositoryId::new(ODFI_ID),
            user_id: String::new(),
            bank_name: self.bank_name.clone(),
            holder: self.holder.clone(),
            holder_type: HolderType::Business,
            account_type: self.account_type,
            routing_number: self.routing_number.clone(),
            account_number: self.account_number.clone(),
            status: DepositoryStatus::Verified,
        };
        (originator, depository)
    }
}
