//! Depository (bank account under verification)
//!
//! Depositories are created by the account-linking flow. The verification
//! engine only reads them and promotes `Unverified -> Verified`.

pub mod models;
pub mod repository;

pub use models::{AccountType, Depository, DepositoryId, DepositoryStatus, HolderType};
pub use repository::{DepositoryRepository, PgDepositoryRepository};
