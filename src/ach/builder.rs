//! File construction and micro-deposit reversal synthesis

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};

use super::codes::{ServiceClassCode, TransactionCode};
use super::error::AchError;
use super::file::{AchFile, Batch, BatchHeader, EntryDetail, FileHeader};
use super::transfer::{Originator, Receiver, Transfer};
use crate::depository::Depository;

const COMPANY_NAME_LEN: usize = 16;
const ENTRY_DESCRIPTION_LEN: usize = 10;
const INDIVIDUAL_NAME_LEN: usize = 22;
const IDENTIFICATION_NUMBER_LEN: usize = 15;
const ENTRY_ID_LEN: usize = 8;

/// Result of [`add_micro_deposit_reversal`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReversalOutcome {
    /// The reversing entry was appended
    Applied,
    /// File shape was not one batch with one entry; nothing changed
    Skipped,
}

/// Builds single-entry verification files
pub struct FileBuilder {
    now: DateTime<Utc>,
}

impl Default for FileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FileBuilder {
    pub fn new() -> Self {
        Self { now: Utc::now() }
    }

    /// Builder with a fixed clock
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Construct a file holding one batch with one entry for `transfer`.
    ///
    /// The entry addresses the receiver's depository; the batch is
    /// originated from the originator's depository.
    pub fn build(
        &self,
        idempotency_key: &str,
        transfer: &Transfer,
        receiver: &Receiver,
        receiver_dep: &Depository,
        originator: &Originator,
        originator_dep: &Depository,
    ) -> Result<AchFile, AchError> {
        let (rdfi_identification, check_digit) =
            split_routing_number(&receiver_dep.routing_number)?;
        let (odfi_identification, _) = split_routing_number(&originator_dep.routing_number)?;

        let req = &transfer.request;
        if req.amount.cents() <= 0 {
            return Err(AchError::InvalidAmount(req.amount.to_string()));
        }
        let direction = req.transfer_type.direction();

        let header = FileHeader {
            id: idempotency_key.to_string(),
            immediate_destination: receiver_dep.routing_number.clone(),
            immediate_origin: originator_dep.routing_number.clone(),
            immediate_destination_name: receiver_dep.bank_name.clone(),
            immediate_origin_name: originator_dep.bank_name.clone(),
            file_creation_date: self.now.format("%y%m%d").to_string(),
            file_creation_time: self.now.format("%H%M").to_string(),
            file_id_modifier: "A".to_string(),
        };

        let batch_header = BatchHeader {
            id: new_record_id(),
            service_class_code: ServiceClassCode::for_direction(direction),
            company_name: truncate(&originator.metadata, COMPANY_NAME_LEN),
            company_identification: originator.identification.clone(),
            standard_entry_class_code: req.standard_entry_class_code,
            company_entry_description: truncate(&req.description, ENTRY_DESCRIPTION_LEN),
            effective_entry_date: next_business_day(self.now.date_naive())
                .format("%y%m%d")
                .to_string(),
            originator_status_code: 1,
            odfi_identification: odfi_identification.clone(),
            batch_number: 1,
        };

        let entry = EntryDetail {
            id: new_record_id(),
            transaction_code: TransactionCode::for_account(receiver_dep.account_type, direction),
            rdfi_identification,
            check_digit,
            dfi_account_number: receiver_dep.account_number.clone(),
            amount: req.amount.cents(),
            identification_number: truncate(&transfer.id.to_string(), IDENTIFICATION_NUMBER_LEN),
            individual_name: truncate(&receiver.metadata, INDIVIDUAL_NAME_LEN),
            discretionary_data: String::new(),
            addenda_record_indicator: 0,
            trace_number: format!("{}{:07}", odfi_identification, 1),
            category: "Forward".to_string(),
        };

        let mut batch = Batch::new(batch_header);
        batch.add_entry(entry);

        let mut file = AchFile::new(idempotency_key, header);
        file.add_batch(batch);
        file.validate()?;
        Ok(file)
    }
}

/// Turn a one-directional verification file into a self-balancing one.
///
/// Requires exactly one batch holding exactly one entry, otherwise the file is
/// left untouched and `Skipped` is returned. The appended entry is a copy of
/// the original with the opposite transaction code, a fresh identifier and the
/// next trace number. An entry whose code has no reversal pair is an error and
/// the file is left unchanged.
pub fn add_micro_deposit_reversal(file: &mut AchFile) -> Result<ReversalOutcome, AchError> {
    if file.batches.len() != 1 || file.batches[0].entries().len() != 1 {
        return Ok(ReversalOutcome::Skipped);
    }

    let batch = &mut file.batches[0];
    let original = &batch.entries()[0];

    let mut reversal = original.clone();
    reversal.transaction_code = original.transaction_code.reversal()?;
    reversal.id = loop {
        let id = new_record_id();
        if id != original.id {
            break id;
        }
    };
    reversal.trace_number = next_trace_number(&original.trace_number);

    // The batch now carries both a debit and a credit
    let mut header = batch.header().clone();
    header.service_class_code = ServiceClassCode::MixedDebitsAndCredits;
    batch.set_header(header);
    batch.add_entry(reversal);

    file.recompute_control();
    Ok(ReversalOutcome::Applied)
}

/// Increment a numeric trace number keeping its width.
///
/// Non-numeric or saturated traces stay as is.
fn next_trace_number(trace: &str) -> String {
    match trace.parse::<u64>().ok().and_then(|n| n.checked_add(1)) {
        Some(next) => format!("{:0width$}", next, width = trace.len()),
        None => trace.to_string(),
    }
}

/// Split a 9-digit ABA routing number into RDFI/ODFI identification and check digit
fn split_routing_number(routing: &str) -> Result<(String, String), AchError> {
    let digits: Vec<u32> = routing.chars().filter_map(|c| c.to_digit(10)).collect();
    if routing.len() != 9 || digits.len() != 9 {
        return Err(AchError::InvalidRoutingNumber(routing.to_string()));
    }

    let weighted: u32 = digits
        .iter()
        .zip([3, 7, 1, 3, 7, 1, 3, 7, 1])
        .map(|(d, w)| d * w)
        .sum();
    if weighted % 10 != 0 {
        return Err(AchError::InvalidRoutingNumber(routing.to_string()));
    }

    Ok((routing[..8].to_string(), routing[8..].to_string()))
}

fn next_business_day(today: NaiveDate) -> NaiveDate {
    let mut day = today + Duration::days(1);
    while matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
        day += Duration::days(1);
    }
    day
}

fn new_record_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..ENTRY_ID_LEN].to_string()
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
