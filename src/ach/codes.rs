//! NACHA code tables used by verification files

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::AchError;
use crate::depository::AccountType;

/// Which side of the receiver's account an entry hits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryDirection {
    Credit,
    Debit,
}

/// Entry detail transaction codes
///
/// Only the codes this engine emits or understands are representable; any
/// other numeric value is rejected when decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum TransactionCode {
    CheckingCredit = 22,
    CheckingPrenoteCredit = 23,
    CheckingDebit = 27,
    CheckingPrenoteDebit = 28,
    SavingsCredit = 32,
    SavingsPrenoteCredit = 33,
    SavingsDebit = 37,
    SavingsPrenoteDebit = 38,
}

/// Debit/credit pairs used when reversing a verification entry
const REVERSAL_PAIRS: [(TransactionCode, TransactionCode); 2] = [
    (TransactionCode::CheckingDebit, TransactionCode::CheckingCredit),
    (TransactionCode::SavingsDebit, TransactionCode::SavingsCredit),
];

impl TransactionCode {
    /// Live (non-prenote) code for an account type and direction
    pub fn for_account(account_type: AccountType, direction: EntryDirection) -> Self {
        match (account_type, direction) {
            (AccountType::Checking, EntryDirection::Credit) => TransactionCode::CheckingCredit,
            (AccountType::Checking, EntryDirection::Debit) => TransactionCode::CheckingDebit,
            (AccountType::Savings, EntryDirection::Credit) => TransactionCode::SavingsCredit,
            (AccountType::Savings, EntryDirection::Debit) => TransactionCode::SavingsDebit,
        }
    }

    #[inline]
    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn is_debit(&self) -> bool {
        matches!(
            self,
            TransactionCode::CheckingDebit
                | TransactionCode::CheckingPrenoteDebit
                | TransactionCode::SavingsDebit
                | TransactionCode::SavingsPrenoteDebit
        )
    }

    pub fn is_credit(&self) -> bool {
        !self.is_debit()
    }

    /// Opposite-direction code for the same account type.
    ///
    /// Prenotes carry no money and have no reversal.
    pub fn reversal(&self) -> Result<TransactionCode, AchError> {
        REVERSAL_PAIRS
            .iter()
            .find_map(|&(debit, credit)| {
                if *self == debit {
                    Some(credit)
                } else if *self == credit {
                    Some(debit)
                } else {
                    None
                }
            })
            .ok_or(AchError::UnsupportedTransactionCode(self.code()))
    }
}

impl From<TransactionCode> for u8 {
    fn from(code: TransactionCode) -> u8 {
        code.code()
    }
}

impl TryFrom<u8> for TransactionCode {
    type Error = AchError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            22 => Ok(TransactionCode::CheckingCredit),
            23 => Ok(TransactionCode::CheckingPrenoteCredit),
            27 => Ok(TransactionCode::CheckingDebit),
            28 => Ok(TransactionCode::CheckingPrenoteDebit),
            32 => Ok(TransactionCode::SavingsCredit),
            33 => Ok(TransactionCode::SavingsPrenoteCredit),
            37 => Ok(TransactionCode::SavingsDebit),
            38 => Ok(TransactionCode::SavingsPrenoteDebit),
            other => Err(AchError::UnsupportedTransactionCode(other)),
        }
    }
}

impl fmt::Display for TransactionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Batch header service class code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ServiceClassCode {
    MixedDebitsAndCredits = 200,
    CreditsOnly = 220,
    DebitsOnly = 225,
}

impl ServiceClassCode {
    pub fn for_direction(direction: EntryDirection) -> Self {
        match direction {
            EntryDirection::Credit => ServiceClassCode::CreditsOnly,
            EntryDirection::Debit => ServiceClassCode::DebitsOnly,
        }
    }
}

impl From<ServiceClassCode> for u16 {
    fn from(code: ServiceClassCode) -> u16 {
        code as u16
    }
}

impl TryFrom<u16> for ServiceClassCode {
    type Error = AchError;

    fn try_from(v: u16) -> Result<Self, Self::Error> {
        match v {
            200 => Ok(ServiceClassCode::MixedDebitsAndCredits),
            220 => Ok(ServiceClassCode::CreditsOnly),
            225 => Ok(ServiceClassCode::DebitsOnly),
            other => Err(AchError::UnsupportedServiceClassCode(other)),
        }
    }
}

/// Standard Entry Class code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum StandardEntryClassCode {
    /// Prearranged Payment and Deposit (consumer accounts)
    #[default]
    Ppd,
    /// Corporate Credit or Debit
    Ccd,
    /// Internet-initiated
    Web,
    /// Telephone-initiated
    Tel,
}

impl StandardEntryClassCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StandardEntryClassCode::Ppd => "PPD",
            StandardEntryClassCode::Ccd => "CCD",
            StandardEntryClassCode::Web => "WEB",
            StandardEntryClassCode::Tel => "TEL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reversal_table_both_directions() {
        assert_eq!(
            TransactionCode::CheckingDebit.reversal().unwrap(),
            TransactionCode::CheckingCredit
        );
        assert_eq!(
            TransactionCode::CheckingCredit.reversal().unwrap(),
            TransactionCode::CheckingDebit
        );
        assert_eq!(
            TransactionCode::SavingsDebit.reversal().unwrap(),
            TransactionCode::SavingsCredit
        );
        assert_eq!(
            TransactionCode::SavingsCredit.reversal().unwrap(),
            TransactionCode::SavingsDebit
        );
    }

    #[test]
    fn test_prenote_has_no_reversal() {
        assert!(matches!(
            TransactionCode::CheckingPrenoteDebit.reversal(),
            Err(AchError::UnsupportedTransactionCode(28))
        ));
    }

    #[test]
    fn test_unknown_numeric_code_rejected() {
        assert!(TransactionCode::try_from(17).is_err());
        assert_eq!(TransactionCode::try_from(37).unwrap(), TransactionCode::SavingsDebit);
    }

    #[test]
    fn test_code_serializes_as_number() {
        let json = serde_json::to_string(&TransactionCode::CheckingDebit).unwrap();
        assert_eq!(json, "27");
        assert!(serde_json::from_str::<TransactionCode>("99").is_err());
        assert_eq!(
            serde_json::to_string(&ServiceClassCode::MixedDebitsAndCredits).unwrap(),
            "200"
        );
    }
}
