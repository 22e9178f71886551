//! Ledger (Accounts service) client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::ClientError;
use super::{check_status, http_client};
use crate::depository::AccountType;

const SERVICE: &str = "accounts";

/// Ledger account as returned by search
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub account_number: String,
    #[serde(default)]
    pub routing_number: String,
    #[serde(default, rename = "type")]
    pub account_type: String,
}

/// Lookup key for a ledger account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountQuery {
    pub account_number: String,
    pub routing_number: String,
    pub account_type: AccountType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionPurpose {
    #[serde(rename = "ACHCredit")]
    AchCredit,
    #[serde(rename = "ACHDebit")]
    AchDebit,
}

/// One leg of a double-entry transaction, amount in cents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLine {
    pub account_id: String,
    pub purpose: TransactionPurpose,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(default)]
    pub lines: Vec<TransactionLine>,
}

#[derive(Serialize)]
struct CreateTransactionRequest<'a> {
    lines: &'a [TransactionLine],
}

#[async_trait]
pub trait AccountsClient: Send + Sync {
    /// `Ok(None)` when no account matches
    async fn search_account(
        &self,
        request_id: &str,
        user_id: &str,
        query: &AccountQuery,
    ) -> Result<Option<Account>, ClientError>;

    async fn post_transaction(
        &self,
        request_id: &str,
        user_id: &str,
        lines: &[TransactionLine],
    ) -> Result<Transaction, ClientError>;
}

pub struct HttpAccountsClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAccountsClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            client: http_client(timeout)?,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AccountsClient for HttpAccountsClient {
    async fn search_account(
        &self,
        request_id: &str,
        user_id: &str,
        query: &AccountQuery,
    ) -> Result<Option<Account>, ClientError> {
        let response = self
            .client
            .get(format!("{}/accounts/search", self.endpoint))
            .header("X-Request-ID", request_id)
            .header("X-User-ID", user_id)
            .query(&[
                ("number", query.account_number.as_str()),
                ("routingNumber", query.routing_number.as_str()),
                ("type", query.account_type.as_str()),
            ])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let account: Account = check_status(SERVICE, response).await?.json().await?;
        Ok(Some(account).filter(|a| !a.id.is_empty()))
    }

    async fn post_transaction(
        &self,
        request_id: &str,
        user_id: &str,
        lines: &[TransactionLine],
    ) -> Result<Transaction, ClientError> {
        let response = self
            .client
            .post(format!("{}/accounts/transactions", self.endpoint))
            .header("X-Request-ID", request_id)
            .header("X-User-ID", user_id)
            .json(&CreateTransactionRequest { lines })
            .send()
            .await?;
        Ok(check_status(SERVICE, response).await?.json().await?)
    }
}

/// Mock ledger for testing
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    pub struct MockAccountsClient {
        accounts: Mutex<HashMap<String, Account>>,
        search_count: AtomicUsize,
        post_count: AtomicUsize,
        posted: Mutex<Vec<Vec<TransactionLine>>>,
        /// Remaining post calls that fail before posts succeed again
        fail_posts: AtomicUsize,
        fail_search: Mutex<bool>,
    }

    impl MockAccountsClient {
        pub fn new() -> Self {
            Self::default()
        }

        /// Register an account keyed by account number
        pub fn add_account(&self, id: &str, account_number: &str, routing_number: &str) {
            self.accounts.lock().unwrap().insert(
                account_number.to_string(),
                Account {
                    id: id.to_string(),
                    account_number: account_number.to_string(),
                    routing_number: routing_number.to_string(),
                    account_type: "checking".to_string(),
                },
            );
        }

        pub fn set_fail_posts(&self, n: usize) {
            self.fail_posts.store(n, Ordering::SeqCst);
        }

        pub fn set_fail_search(&self, fail: bool) {
            *self.fail_search.lock().unwrap() = fail;
        }

        pub fn search_count(&self) -> usize {
            self.search_count.load(Ordering::SeqCst)
        }

        pub fn post_count(&self) -> usize {
            self.post_count.load(Ordering::SeqCst)
        }

        pub fn posted(&self) -> Vec<Vec<TransactionLine>> {
            self.posted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AccountsClient for MockAccountsClient {
        async fn search_account(
            &self,
            _request_id: &str,
            _user_id: &str,
            query: &AccountQuery,
        ) -> Result<Option<Account>, ClientError> {
            self.search_count.fetch_add(1, Ordering::SeqCst);
            // let concurrent callers pile up behind the resolver's lock
            tokio::task::yield_now().await;
            if *self.fail_search.lock().unwrap() {
                return Err(ClientError::Status {
                    service: SERVICE,
                    status: 503,
                    body: "mock search failure".to_string(),
                });
            }
            Ok(self
                .accounts
                .lock()
                .unwrap()
                .get(&query.account_number)
                .cloned())
        }

        async fn post_transaction(
            &self,
            _request_id: &str,
            _user_id: &str,
            lines: &[TransactionLine],
        ) -> Result<Transaction, ClientError> {
            let n = self.post_count.fetch_add(1, Ordering::SeqCst) + 1;
            let failing = self
                .fail_posts
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok();
            if failing {
                return Err(ClientError::Status {
                    service: SERVICE,
                    status: 500,
                    body: format!("mock post failure #{}", n),
                });
            }
            self.posted.lock().unwrap().push(lines.to_vec());
            Ok(Transaction {
                id: format!("tx-{}", n),
                lines: lines.to_vec(),
            })
        }
    }
}
