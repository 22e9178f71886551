//! Transfer request types
//!
//! Transfers are not persisted by this crate: they exist to drive file
//! construction and the audit event written for each submitted file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::codes::{EntryDirection, StandardEntryClassCode};
use crate::depository::DepositoryId;
use crate::money::Amount;

/// ULID-based transfer identifier (sortable, no coordination needed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransferId(ulid::Ulid);

impl TransferId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransferId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}

impl Serialize for TransferId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Money movement relative to the receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferType {
    /// Deposit into the receiver's account
    Push,
    /// Withdraw from the receiver's account
    Pull,
}

impl TransferType {
    pub fn direction(&self) -> EntryDirection {
        match self {
            TransferType::Push => EntryDirection::Credit,
            TransferType::Pull => EntryDirection::Debit,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferType::Push => "push",
            TransferType::Pull => "pull",
        }
    }
}

/// Party that initiates the transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Originator {
    pub id: String,
    pub default_depository: DepositoryId,
    /// Company identification placed in the batch header
    pub identification: String,
    pub metadata: String,
}

/// Party whose account receives the entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receiver {
    pub id: String,
    pub default_depository: DepositoryId,
    pub metadata: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub transfer_type: TransferType,
    pub amount: Amount,
    pub originator: String,
    pub originator_depository: DepositoryId,
    pub receiver: String,
    pub receiver_depository: DepositoryId,
    pub description: String,
    pub standard_entry_class_code: StandardEntryClassCode,
}

impl TransferRequest {
    pub fn into_transfer(self) -> Transfer {
        Transfer {
            id: TransferId::new(),
            request: self,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub id: TransferId,
    #[serde(flatten)]
    pub request: TransferRequest,
    pub created_at: DateTime<Utc>,
}
