//! Rendering a booked [`Transaction`] back to ledger-like text, used by the
//! CLI's `report` output and by error messages that need to show a
//! transaction for context.

use std::fmt::Write;

use crate::registry::Transaction;

/// Render a booked transaction as an indented block of postings, one per
/// line, in the style of the surface syntax (§6) it was parsed from.
#[must_use]
pub fn format_transaction(txn: &Transaction) -> String {
    let mut out = String::new();
    let payee = txn
        .payee
        .as_ref()
        .map_or_else(String::new, |p| format!("\"{p}\" "));
    let _ = writeln!(out, "{} {} {}\"{}\"", txn.date.date_naive(), txn.flag, payee, txn.narration);
    for posting in &txn.postings {
        let _ = writeln!(out, "  {posting}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;
    use crate::registry::BookedPosting;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    #[test]
    fn renders_date_flag_narration_and_postings() {
        let txn = Transaction {
            date: Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap(),
            flag: '*',
            payee: None,
            narration: "Open Long".into(),
            meta: BTreeMap::new(),
            postings: vec![BookedPosting {
                account: "Assets:Broker".into(),
                flag: '*',
                amount: Amount::new(dec!(2), "VT"),
                cost: None,
                meta: BTreeMap::new(),
            }],
            inventories_before: BTreeMap::new(),
            inventories_after: BTreeMap::new(),
            source: crate::directive::SourceContext::new("main.ledger", 1),
        };
        let rendered = format_transaction(&txn);
        assert!(rendered.contains("2025-04-01 * \"Open Long\""));
        assert!(rendered.contains("Assets:Broker 2 VT"));
    }
}
