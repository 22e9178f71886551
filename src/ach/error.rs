use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AchError {
    #[error("Unsupported transaction code: {0}")]
    UnsupportedTransactionCode(u8),

    #[error("Unsupported service class code: {0}")]
    UnsupportedServiceClassCode(u16),

    #[error("Invalid routing number: {0}")]
    InvalidRoutingNumber(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),
}
