//! Verification error types
//!
//! Every variant maps to a stable code and an HTTP status. Messages never
//! carry the number of stored deposits.

use thiserror::Error;

use crate::clients::ClientError;

#[derive(Error, Debug)]
pub enum MicroDepositError {
    #[error("depository not found")]
    NotFound,

    #[error("invalid depository state: {0}")]
    InvalidState(String),

    #[error("{0}")]
    Validation(String),

    #[error("micro-deposits already initiated")]
    Conflict,

    #[error("incorrect micro deposit guesses")]
    Mismatch,

    #[error("{context}: {message}")]
    Upstream { context: String, message: String },

    #[error("{context}: {message}")]
    Persistence { context: String, message: String },
}

impl MicroDepositError {
    pub fn upstream(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        MicroDepositError::Upstream {
            context: context.into(),
            message: err.to_string(),
        }
    }

    pub fn persistence(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        MicroDepositError::Persistence {
            context: context.into(),
            message: err.to_string(),
        }
    }

    /// Error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            MicroDepositError::NotFound => "DEPOSITORY_NOT_FOUND",
            MicroDepositError::InvalidState(_) => "INVALID_STATE",
            MicroDepositError::Validation(_) => "VALIDATION_ERROR",
            MicroDepositError::Conflict => "ALREADY_INITIATED",
            MicroDepositError::Mismatch => "INCORRECT_GUESSES",
            MicroDepositError::Upstream { .. } => "UPSTREAM_ERROR",
            MicroDepositError::Persistence { .. } => "PERSISTENCE_ERROR",
        }
    }

    /// HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            MicroDepositError::NotFound => 404,
            MicroDepositError::InvalidState(_) | MicroDepositError::Conflict => 409,
            MicroDepositError::Validation(_) | MicroDepositError::Mismatch => 400,
            MicroDepositError::Upstream { .. } => 502,
            MicroDepositError::Persistence { .. } => 500,
        }
    }

    /// Message safe to return to callers.
    ///
    /// Upstream and storage details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            MicroDepositError::Upstream { context, .. }
            | MicroDepositError::Persistence { context, .. } => context.clone(),
            other => other.to_string(),
        }
    }
}

impl From<sqlx::Error> for MicroDepositError {
    fn from(e: sqlx::Error) -> Self {
        MicroDepositError::persistence("database error", e)
    }
}

impl From<ClientError> for MicroDepositError {
    fn from(e: ClientError) -> Self {
        MicroDepositError::upstream("upstream service error", e)
    }
}
