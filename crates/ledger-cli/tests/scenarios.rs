//! End-to-end scenarios run through the full parse -> load -> book pipeline.
//!
//! Each test writes a small ledger file to a temp directory and drives it
//! through [`ledger_cli::pipeline::run`], checking the booked output rather
//! than any single stage in isolation.

use std::fs;
use std::path::PathBuf;

use ledger_booking::{BookingError, DirectiveError};
use ledger_cli::pipeline;
use ledger_core::BookedLedger;
use rust_decimal_macros::dec;
use tempfile::tempdir;

fn write_ledger(contents: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("main.ledger");
    fs::write(&path, contents).unwrap();
    (dir, path)
}

fn booking_error(err: anyhow::Error) -> BookingError {
    err.downcast::<DirectiveError>()
        .expect("expected a DirectiveError in the anyhow chain")
        .kind
}

fn postings_of(ledger: &BookedLedger, index: usize) -> Vec<String> {
    ledger.transactions[index]
        .postings
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// S1: two augmentations open FIFO lots on 2025-04-01 and 2025-04-02; a
/// partial reduction consumes the older lot first and leaves a remainder.
#[test]
fn s1_fifo_reduction_consumes_oldest_lot_first() {
    let source = "\
2025-04-01 open Assets:Test USD
2025-04-01 open Assets:Cash CHF
2025-04-01 open Trading:Default

2025-04-01 * \"Open lot 1\"
  Assets:Test  1 USD {1.1 CHF, 2025-04-01}
  Assets:Cash

2025-04-02 * \"Open lot 2\"
  Assets:Test  1 USD {1.2 CHF, 2025-04-02}
  Assets:Cash

2025-04-03 * \"Reduce\"
  Assets:Test  -0.5 USD {}
  Assets:Cash
";
    let (_dir, path) = write_ledger(source);
    let ledger = pipeline::run(&path).expect("scenario should book cleanly");

    let reduction = postings_of(&ledger, 2);
    assert!(
        reduction[0].starts_with("Assets:Test -0.5 USD"),
        "expected the oldest lot to be reduced first, got {reduction:?}"
    );

    let inventory = &ledger.inventories["Assets:Test"];
    let remaining = inventory.positions_for_currency("USD");
    assert_eq!(remaining.len(), 2, "the untouched lot 2 and the remainder of lot 1 should both survive");
    assert_eq!(inventory.units("USD"), dec!(1.5));
}

/// S2: three FIFO lots exist; an explicit `booking-method: "LIFO"` override
/// on the reducing posting consumes the newest lots first.
#[test]
fn s2_lifo_override_consumes_newest_lots_first() {
    let source = "\
2025-04-01 open Assets:Test USD
2025-04-01 open Assets:Cash CHF
2025-04-01 open Trading:Default

2025-04-01 * \"Open lot 1\"
  Assets:Test  1 USD {1.1 CHF, 2025-04-01}
  Assets:Cash

2025-04-02 * \"Open lot 2\"
  Assets:Test  1 USD {1.2 CHF, 2025-04-02}
  Assets:Cash

2025-04-03 * \"Open lot 3\"
  Assets:Test  1 USD {1.3 CHF, 2025-04-03}
  Assets:Cash

2025-04-04 * \"Reduce LIFO\"
  Assets:Test  -2.6 USD {}  booking-method: \"LIFO\"
  Assets:Cash
";
    let (_dir, path) = write_ledger(source);
    let ledger = pipeline::run(&path).expect("scenario should book cleanly");

    let reduction = postings_of(&ledger, 3);
    assert!(reduction[0].starts_with("Assets:Test -1 USD"), "lot 3 first: {reduction:?}");
    assert!(reduction[1].starts_with("Assets:Test -1 USD"), "lot 2 second: {reduction:?}");
    assert!(reduction[2].starts_with("Assets:Test -0.6 USD"), "lot 1 remainder last: {reduction:?}");

    let inventory = &ledger.inventories["Assets:Test"];
    assert_eq!(inventory.units("USD"), dec!(0.4));
    let remaining = inventory.positions_for_currency("USD");
    assert_eq!(remaining.len(), 1, "only the partially-consumed oldest lot should remain");
}

/// S3: a total-cost augmentation books a per-unit lot and an implicit
/// trading leg, with the elastic posting absorbing the residual.
#[test]
fn s3_total_cost_augmentation_books_per_unit_lot() {
    let source = "\
2025-04-01 open Assets:Broker VT, CHF
2025-04-01 open Trading:Default

2025-04-01 * \"Open Long\"
  Assets:Broker  2 VT {{300 CHF}}
  Assets:Broker
";
    let (_dir, path) = write_ledger(source);
    let ledger = pipeline::run(&path).expect("scenario should book cleanly");

    let postings = postings_of(&ledger, 0);
    assert_eq!(
        postings,
        vec![
            "Assets:Broker 2 VT {150 CHF, 2025-04-01}",
            "Trading:Default -2 VT",
            "Trading:Default 300 CHF",
            "Assets:Broker -300 CHF",
        ],
        "got {postings:?}"
    );
}

/// S4: closing the S3 lot realizes P&L on the elastic income posting.
#[test]
fn s4_closing_a_lot_realizes_gain_on_the_elastic_posting() {
    let source = "\
2025-04-01 open Assets:Broker VT, CHF
2025-04-01 open Trading:Default
2025-04-01 open Income:Trading CHF

2025-04-01 * \"Open Long\"
  Assets:Broker  2 VT {{300 CHF}}
  Assets:Broker

2025-04-02 * \"Close Long\"
  Assets:Broker  -2 VT {}
  Assets:Broker  350 CHF
  Income:Trading
";
    let (_dir, path) = write_ledger(source);
    let ledger = pipeline::run(&path).expect("scenario should book cleanly");

    let postings = postings_of(&ledger, 1);
    assert_eq!(
        postings,
        vec![
            "Assets:Broker -2 VT {150 CHF, 2025-04-01}",
            "Trading:Default 2 VT",
            "Trading:Default -300 CHF",
            "Assets:Broker 350 CHF",
            "Income:Trading -50 CHF",
        ],
        "got {postings:?}"
    );

    let trading_inventory = &ledger.inventories["Trading:Default"];
    assert!(trading_inventory.is_empty(), "the trading account should net to nothing once the lot is closed");
}

/// S5: a balance assertion inside tolerance succeeds; tightening the
/// tolerance below the actual delta fails with `BalanceMismatch`.
#[test]
fn s5_balance_assertion_tolerance() {
    let within = "\
2025-04-01 open Assets:Bank CHF

2025-04-01 * \"Deposit\"
  Assets:Bank  10.00 CHF
  Equity:Opening

2025-06-01 balance Assets:Bank 10.01 CHF ~ 0.02
";
    let (_dir, path) = write_ledger(within);
    pipeline::run(&path).expect("a delta within tolerance should pass");

    let beyond = "\
2025-04-01 open Assets:Bank CHF

2025-04-01 * \"Deposit\"
  Assets:Bank  10.00 CHF
  Equity:Opening

2025-06-01 balance Assets:Bank 10.01 CHF ~ 0.005
";
    let (_dir2, path2) = write_ledger(beyond);
    let err = pipeline::run(&path2).expect_err("a delta beyond tolerance should fail");
    match booking_error(err) {
        BookingError::BalanceMismatch { delta, max_delta, .. } => {
            assert_eq!(delta, dec!(0.01));
            assert_eq!(max_delta, dec!(0.005));
        }
        other => panic!("expected BalanceMismatch, got {other:?}"),
    }
}

/// S6: a transaction whose postings do not net to zero is rejected.
#[test]
fn s6_unbalanced_transaction_is_rejected() {
    let source = "\
2025-04-01 open Assets:Bank CHF
2025-04-01 open Expenses:Misc CHF

2025-04-01 * \"Oops\"
  Assets:Bank  -10.00 CHF
  Expenses:Misc  9.00 CHF
";
    let (_dir, path) = write_ledger(source);
    let err = pipeline::run(&path).expect_err("postings leave a residual and must be rejected");
    match booking_error(err) {
        BookingError::TransactionUnbalanced { .. } => {}
        other => panic!("expected TransactionUnbalanced, got {other:?}"),
    }
}

/// S7: posting a currency not in an account's `open` restriction list fails.
#[test]
fn s7_disallowed_currency_is_rejected() {
    let source = "\
2025-04-01 open Assets:Bank CHF
2025-04-01 open Equity:Opening

2025-04-01 * \"Wrong currency\"
  Assets:Bank  10.00 USD
  Equity:Opening
";
    let (_dir, path) = write_ledger(source);
    let err = pipeline::run(&path).expect_err("USD is not in Assets:Bank's allowed currency list");
    match booking_error(err) {
        BookingError::CurrencyNotAllowed { account, currency } => {
            assert_eq!(account.as_ref(), "Assets:Bank");
            assert_eq!(currency.as_ref(), "USD");
        }
        other => panic!("expected CurrencyNotAllowed, got {other:?}"),
    }
}
