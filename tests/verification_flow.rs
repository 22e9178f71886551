//! End-to-end checks of the verification building blocks through the public API

use chrono::{TimeZone, Utc};
use paygate::Amount;
use paygate::ach::{
    FileBuilder, Originator, Receiver, ReversalOutcome, StandardEntryClassCode, TransactionCode,
    TransferRequest, TransferType, add_micro_deposit_reversal,
};
use paygate::depository::{AccountType, Depository, DepositoryId, DepositoryStatus, HolderType};
use paygate::micro_deposit::amounts;

fn depository(id: &str, routing: &str, account_type: AccountType) -> Depository {
    Depository {
        id: DepositoryId::new(id),
        user_id: "user-1".to_string(),
        bank_name: format!("{} bank", id),
        holder: "Jane Doe".to_string(),
        holder_type: HolderType::Individual,
        account_type,
        routing_number: routing.to_string(),
        account_number: "1234567".to_string(),
        status: DepositoryStatus::Unverified,
    }
}

fn request(transfer_type: TransferType, amount: Amount) -> TransferRequest {
    TransferRequest {
        transfer_type,
        amount,
        originator: "odfi".to_string(),
        originator_depository: DepositoryId::new("odfi"),
        receiver: "receiver-1".to_string(),
        receiver_depository: DepositoryId::new("dep-1"),
        description: "micro-deposit verification".to_string(),
        standard_entry_class_code: StandardEntryClassCode::Ppd,
    }
}

#[test]
fn test_generated_set_builds_balanced_files() {
    let set = amounts::generate();
    let target = depository("dep-1", "121042882", AccountType::Savings);
    let odfi = depository("odfi", "987654320", AccountType::Checking);
    let originator = Originator {
        id: "odfi".to_string(),
        default_depository: odfi.id.clone(),
        identification: "001".to_string(),
        metadata: "Moov micro-deposits".to_string(),
    };
    let receiver = Receiver {
        id: "receiver-1".to_string(),
        default_depository: target.id.clone(),
        metadata: "Jane Doe".to_string(),
    };
    let builder = FileBuilder::at(Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap());

    let kinds = [TransferType::Push, TransferType::Push, TransferType::Pull];
    let mut net_to_target = 0i64;
    for (amount, kind) in set.all().into_iter().zip(kinds) {
        let transfer = request(kind, amount.clone()).into_transfer();
        let mut file = builder
            .build("key-1", &transfer, &receiver, &target, &originator, &odfi)
            .unwrap();
        match kind {
            TransferType::Push => net_to_target += amount.cents(),
            TransferType::Pull => net_to_target -= amount.cents(),
        }

        assert_eq!(
            add_micro_deposit_reversal(&mut file).unwrap(),
            ReversalOutcome::Applied
        );
        assert_eq!(file.entry_count(), 2);
        assert_eq!(
            file.control.total_debit_entry_dollar_amount_in_file,
            file.control.total_credit_entry_dollar_amount_in_file
        );

        let codes: Vec<TransactionCode> = file.batches[0]
            .entries()
            .iter()
            .map(|e| e.transaction_code)
            .collect();
        assert!(codes.contains(&TransactionCode::SavingsCredit));
        assert!(codes.contains(&TransactionCode::SavingsDebit));
    }

    // the pull exactly offsets both pushes
    assert_eq!(net_to_target, 0);
}

#[test]
fn test_reversal_is_applied_once() {
    let target = depository("dep-1", "121042882", AccountType::Checking);
    let odfi = depository("odfi", "987654320", AccountType::Checking);
    let originator = Originator {
        id: "odfi".to_string(),
        default_depository: odfi.id.clone(),
        identification: "001".to_string(),
        metadata: "Moov".to_string(),
    };
    let receiver = Receiver {
        id: "receiver-1".to_string(),
        default_depository: target.id.clone(),
        metadata: "Jane Doe".to_string(),
    };
    let transfer = request(TransferType::Push, Amount::usd_cents(12)).into_transfer();
    let mut file = FileBuilder::new()
        .build("key-2", &transfer, &receiver, &target, &originator, &odfi)
        .unwrap();

    add_micro_deposit_reversal(&mut file).unwrap();
    let applied = file.clone();
    assert_eq!(
        add_micro_deposit_reversal(&mut file).unwrap(),
        ReversalOutcome::Skipped
    );
    assert_eq!(file, applied);
}

#[test]
fn test_amount_text_forms() {
    let amount: Amount = "USD 0.07".parse().unwrap();
    assert_eq!(amount.cents(), 7);
    assert_eq!(amount.to_string(), "USD 0.07");
    assert!("USD 0.071".parse::<Amount>().is_err());
    assert!("seven cents".parse::<Amount>().is_err());
}

#[test]
fn test_generated_amounts_within_range() {
    for _ in 0..200 {
        let set = amounts::generate();
        for push in set.pushes() {
            assert!(amounts::CENT_RANGE.contains(&push.cents()));
        }
        assert_eq!(set.sum.cents(), set.first.cents() + set.second.cents());
    }
}
