//! HTTP clients for the external collaborators
//!
//! - [`ach`]: file-transfer processor (create / validate / read back files)
//! - [`accounts`]: ledger service (account search, transaction posting)
//!
//! Both are consumed through traits so the verification flow can be driven
//! by in-memory fakes in tests.

pub mod accounts;
pub mod ach;
pub mod error;

pub use accounts::{
    Account, AccountQuery, AccountsClient, HttpAccountsClient, Transaction, TransactionLine,
    TransactionPurpose,
};
pub use ach::{AchClient, HttpAchClient};
pub use error::ClientError;

use std::time::Duration;

/// Shared reqwest client with the timeout used for all upstream calls
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, ClientError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Turn a non-success response into [`ClientError::Status`]
pub(crate) async fn check_status(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        service,
        status: status.as_u16(),
        body,
    })
}
