//! Depository data models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Depository identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepositoryId(String);

impl DepositoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bank account type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    #[default]
    Checking,
    Savings,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Checking => "checking",
            AccountType::Savings => "savings",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "checking" => Ok(AccountType::Checking),
            "savings" => Ok(AccountType::Savings),
            _ => Err(format!("Invalid account type: {}", s)),
        }
    }
}

/// Account holder type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HolderType {
    #[default]
    Individual,
    Business,
}

impl HolderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HolderType::Individual => "individual",
            HolderType::Business => "business",
        }
    }
}

impl FromStr for HolderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "individual" => Ok(HolderType::Individual),
            "business" => Ok(HolderType::Business),
            _ => Err(format!("Invalid holder type: {}", s)),
        }
    }
}

/// Verification status
///
/// ```text
/// Unverified ──confirm ok──▶ Verified
///     │
///     └── (external) ──▶ Rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepositoryStatus {
    Unverified,
    Verified,
    Rejected,
}

impl DepositoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepositoryStatus::Unverified => "unverified",
            DepositoryStatus::Verified => "verified",
            DepositoryStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for DepositoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DepositoryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unverified" => Ok(DepositoryStatus::Unverified),
            "verified" => Ok(DepositoryStatus::Verified),
            "rejected" => Ok(DepositoryStatus::Rejected),
            _ => Err(format!("Invalid depository status: {}", s)),
        }
    }
}

/// A bank account owned by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Depository {
    pub id: DepositoryId,
    pub user_id: String,
    pub bank_name: String,
    pub holder: String,
    pub holder_type: HolderType,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub routing_number: String,
    pub account_number: String,
    pub status: DepositoryStatus,
}
