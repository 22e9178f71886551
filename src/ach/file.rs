//! ACH file records
//!
//! A reduced NACHA model: one file header, batches of entry details, and the
//! batch/file control records derived from them. Serialized as JSON for the
//! file-transfer processor.

use serde::{Deserialize, Serialize};

use super::codes::{ServiceClassCode, StandardEntryClassCode, TransactionCode};
use super::error::AchError;

/// Entry hash is the sum of RDFI identifications truncated to 10 digits
const ENTRY_HASH_MODULUS: u64 = 10_000_000_000;

/// Records per block in a NACHA file
const BLOCKING_FACTOR: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileHeader {
    pub id: String,
    pub immediate_destination: String,
    pub immediate_origin: String,
    pub immediate_destination_name: String,
    pub immediate_origin_name: String,
    /// YYMMDD
    pub file_creation_date: String,
    /// HHMM
    pub file_creation_time: String,
    pub file_id_modifier: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileControl {
    pub batch_count: usize,
    pub block_count: usize,
    pub entry_addenda_count: usize,
    pub entry_hash: u64,
    pub total_debit_entry_dollar_amount_in_file: i64,
    pub total_credit_entry_dollar_amount_in_file: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchHeader {
    pub id: String,
    pub service_class_code: ServiceClassCode,
    pub company_name: String,
    pub company_identification: String,
    pub standard_entry_class_code: StandardEntryClassCode,
    pub company_entry_description: String,
    /// YYMMDD
    pub effective_entry_date: String,
    pub originator_status_code: u8,
    #[serde(rename = "ODFIIdentification")]
    pub odfi_identification: String,
    pub batch_number: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchControl {
    pub service_class_code: Option<ServiceClassCode>,
    pub entry_addenda_count: usize,
    pub entry_hash: u64,
    pub total_debit_entry_dollar_amount: i64,
    pub total_credit_entry_dollar_amount: i64,
    pub company_identification: String,
    #[serde(rename = "ODFIIdentification")]
    pub odfi_identification: String,
    pub batch_number: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDetail {
    /// 8-character record identifier
    pub id: String,
    pub transaction_code: TransactionCode,
    /// First 8 digits of the receiver's routing number
    #[serde(rename = "RDFIIdentification")]
    pub rdfi_identification: String,
    pub check_digit: String,
    #[serde(rename = "DFIAccountNumber")]
    pub dfi_account_number: String,
    /// Cents
    pub amount: i64,
    pub identification_number: String,
    pub individual_name: String,
    pub discretionary_data: String,
    pub addenda_record_indicator: u8,
    pub trace_number: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    header: BatchHeader,
    entries: Vec<EntryDetail>,
    control: BatchControl,
}

impl Batch {
    pub fn new(header: BatchHeader) -> Self {
        let mut batch = Self {
            header,
            entries: Vec::new(),
            control: BatchControl::default(),
        };
        batch.recompute_control();
        batch
    }

    pub fn header(&self) -> &BatchHeader {
        &self.header
    }

    pub fn set_header(&mut self, header: BatchHeader) {
        self.header = header;
        self.recompute_control();
    }

    pub fn entries(&self) -> &[EntryDetail] {
        &self.entries
    }

    pub fn control(&self) -> &BatchControl {
        &self.control
    }

    /// Append an entry and keep the batch control in step
    pub fn add_entry(&mut self, entry: EntryDetail) {
        self.entries.push(entry);
        self.recompute_control();
    }

    fn recompute_control(&mut self) {
        let mut debits = 0i64;
        let mut credits = 0i64;
        let mut hash = 0u64;
        for entry in &self.entries {
            if entry.transaction_code.is_debit() {
                debits += entry.amount;
            } else {
                credits += entry.amount;
            }
            hash += entry.rdfi_identification.parse::<u64>().unwrap_or(0);
        }

        self.control = BatchControl {
            service_class_code: Some(self.header.service_class_code),
            entry_addenda_count: self.entries.len(),
            entry_hash: hash % ENTRY_HASH_MODULUS,
            total_debit_entry_dollar_amount: debits,
            total_credit_entry_dollar_amount: credits,
            company_identification: self.header.company_identification.clone(),
            odfi_identification: self.header.odfi_identification.clone(),
            batch_number: self.header.batch_number,
        };
    }

    /// Structural checks the processor would also perform
    pub fn validate(&self) -> Result<(), AchError> {
        if self.entries.is_empty() {
            return Err(AchError::MissingField("entries"));
        }
        let has_debit = self.entries.iter().any(|e| e.transaction_code.is_debit());
        let has_credit = self.entries.iter().any(|e| e.transaction_code.is_credit());
        let consistent = match self.header.service_class_code {
            ServiceClassCode::MixedDebitsAndCredits => true,
            ServiceClassCode::CreditsOnly => !has_debit,
            ServiceClassCode::DebitsOnly => !has_credit,
        };
        if !consistent {
            return Err(AchError::UnsupportedServiceClassCode(
                self.header.service_class_code.into(),
            ));
        }
        for entry in &self.entries {
            if entry.amount <= 0 {
                return Err(AchError::InvalidAmount(entry.amount.to_string()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchFile {
    pub id: String,
    pub header: FileHeader,
    pub batches: Vec<Batch>,
    pub control: FileControl,
}

impl AchFile {
    pub fn new(id: impl Into<String>, header: FileHeader) -> Self {
        Self {
            id: id.into(),
            header,
            batches: Vec::new(),
            control: FileControl::default(),
        }
    }

    pub fn add_batch(&mut self, batch: Batch) {
        self.batches.push(batch);
        self.recompute_control();
    }

    /// Rebuild the file control from the batch controls
    pub fn recompute_control(&mut self) {
        let mut control = FileControl {
            batch_count: self.batches.len(),
            ..FileControl::default()
        };
        let mut hash = 0u64;
        for batch in &self.batches {
            let bc = batch.control();
            control.entry_addenda_count += bc.entry_addenda_count;
            control.total_debit_entry_dollar_amount_in_file += bc.total_debit_entry_dollar_amount;
            control.total_credit_entry_dollar_amount_in_file +=
                bc.total_credit_entry_dollar_amount;
            hash += bc.entry_hash;
        }
        control.entry_hash = hash % ENTRY_HASH_MODULUS;

        // file header + file control + (batch header + batch control) per batch + entries
        let records = 2 + 2 * self.batches.len() + control.entry_addenda_count;
        control.block_count = records.div_ceil(BLOCKING_FACTOR);
        self.control = control;
    }

    pub fn validate(&self) -> Result<(), AchError> {
        if self.batches.is_empty() {
            return Err(AchError::MissingField("batches"));
        }
        self.batches.iter().try_for_each(Batch::validate)
    }

    /// Total number of entry details across all batches
    pub fn entry_count(&self) -> usize {
        self.batches.iter().map(|b| b.entries().len()).sum()
    }
}
