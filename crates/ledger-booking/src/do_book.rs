//! The `do_book` helper: a purely-functional fold of emitted postings into
//! per-account inventories and a running transaction balance.

use ledger_core::{Amount, BookedPosting, Cost, InternedStr, InventoryMap, Inventory, Metadata, Position};

/// One posting about to be folded into the running state. Distinct from
/// [`ledger_core::Posting`] (the unbooked, possibly-elastic source form):
/// every field here is already resolved.
#[derive(Debug, Clone)]
pub struct Emission {
    /// The account this posting affects.
    pub account: InternedStr,
    /// The posting's flag.
    pub flag: char,
    /// The resolved amount.
    pub amount: Amount,
    /// The resolved cost, if any.
    pub cost: Option<Cost>,
    /// Posting-level metadata to carry into the booked posting.
    pub meta: Metadata,
}

/// Fold `emissions` into `inventories` and `balance`, producing the booked
/// postings alongside the new snapshots. Never mutates its inputs; each call
/// yields a fresh `InventoryMap` and `Inventory`.
#[must_use]
pub fn do_book(
    inventories: &InventoryMap,
    balance: &Inventory,
    emissions: Vec<Emission>,
) -> (Vec<BookedPosting>, InventoryMap, Inventory) {
    let mut inventories = inventories.clone();
    let mut balance = balance.clone();
    let mut postings = Vec::with_capacity(emissions.len());

    for emission in emissions {
        let position = match &emission.cost {
            Some(cost) => Position::with_cost(emission.amount.clone(), cost.clone()),
            None => Position::simple(emission.amount.clone()),
        };

        let updated = inventories
            .get(&emission.account)
            .cloned()
            .unwrap_or_default()
            .add_position(&position);
        inventories.insert(emission.account.clone(), updated);

        balance = balance.add_amount(&emission.amount);

        postings.push(BookedPosting {
            account: emission.account,
            flag: emission.flag,
            amount: emission.amount,
            cost: emission.cost,
            meta: emission.meta,
        });
    }

    (postings, inventories, balance)
}
