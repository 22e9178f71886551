use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::depository::DepositoryId;
use crate::money::Amount;

/// One verification amount and the file it was submitted in.
///
/// Only the amount is ever serialized; file ids stay internal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MicroDeposit {
    pub amount: Amount,
    #[serde(skip)]
    pub file_id: String,
}

/// Unmerged deposit handed to the merge sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadableMicroDeposit {
    pub depository_id: DepositoryId,
    pub user_id: String,
    pub amount: Amount,
    pub file_id: String,
    pub created_at: DateTime<Utc>,
}

/// Deposit row as stored; the amount is untrusted text until parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MicroDepositRow {
    pub depository_id: DepositoryId,
    pub user_id: String,
    pub amount: String,
    pub file_id: String,
    pub created_at: DateTime<Utc>,
}

/// Confirmation request body
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct ConfirmRequest {
    #[serde(default)]
    pub amounts: Vec<String>,
}

/// Admin listing item
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct MicroDepositView {
    /// e.g. `"USD 0.12"`
    pub amount: String,
}

impl From<&MicroDeposit> for MicroDepositView {
    fn from(d: &MicroDeposit) -> Self {
        Self {
            amount: d.amount.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_micro_deposit_serializes_amount_only() {
        let d = MicroDeposit {
            amount: Amount::usd_cents(12),
            file_id: "file-1".to_string(),
        };
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json, serde_json::json!({"amount": "USD 0.12"}));
    }

    #[test]
    fn test_confirm_request_missing_amounts() {
        let req: ConfirmRequest = serde_json::from_str("{}").unwrap();
        assert!(req.amounts.is_empty());
    }
}
