//! ACH file construction for verification deposits
//!
//! Only the single-batch, single-entry shape used by micro-deposits is
//! modelled. [`builder::add_micro_deposit_reversal`] turns such a file into a
//! balanced debit/credit pair inside the same batch.

pub mod builder;
pub mod codes;
pub mod error;
pub mod file;
pub mod transfer;

pub use builder::{FileBuilder, ReversalOutcome, add_micro_deposit_reversal};
pub use codes::{EntryDirection, ServiceClassCode, StandardEntryClassCode, TransactionCode};
pub use error::AchError;
pub use file::{AchFile, Batch, BatchControl, BatchHeader, EntryDetail, FileControl, FileHeader};
pub use transfer::{Originator, Receiver, Transfer, TransferId, TransferRequest, TransferType};
