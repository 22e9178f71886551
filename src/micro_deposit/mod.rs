//! Micro-deposit verification
//!
//! Proves a user controls a bank account: two random deposits and a
//! balancing withdrawal are sent to the account, and the user must echo the
//! amounts back.
//!
//! - [`amounts`]: balanced amount sets from OS entropy
//! - [`odfi`]: lazily resolved operator ledger account
//! - [`ledger`]: double-entry mirroring with bounded retry
//! - [`store`] / [`cursor`]: once-only persistence and the merge cursor
//! - [`workflow`]: initiate / confirm orchestration
//! - [`sweep`]: periodic merge of submitted files

pub mod amounts;
pub mod cursor;
pub mod error;
pub mod ledger;
pub mod models;
pub mod odfi;
pub mod repository;
pub mod store;
pub mod sweep;
pub mod workflow;

pub use amounts::AmountSet;
pub use cursor::MicroDepositCursor;
pub use error::MicroDepositError;
pub use ledger::LedgerPoster;
pub use models::{ConfirmRequest, MicroDeposit, MicroDepositView, UploadableMicroDeposit};
pub use odfi::OdfiAccount;
pub use repository::{MicroDepositRepository, PgMicroDepositRepository};
pub use store::MicroDepositStore;
pub use sweep::{DirectoryMerger, FileMerger, MergeSweep, SweepReport};
pub use workflow::{InitiationOutcome, LedgerStatus, RequestContext, VerificationWorkflow};
