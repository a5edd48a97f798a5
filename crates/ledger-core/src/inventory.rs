//! `Inventory`: a per-account collection of [`Position`]s grouped by currency
//! and lot identity.
//!
//! Every mutating operation returns a new `Inventory`; callers that need the
//! booking-method reduction algorithms (FIFO/LIFO) will find them in
//! `ledger-booking`, which builds on the contract here.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::position::Position;

/// A per-currency, per-lot collection of positions.
///
/// Invariants upheld by every constructor and mutator:
/// - No position with a zero amount is ever retained.
/// - Two positions with the same currency and the same lot identity (both
///   uncosted, or costs that compare equal) are always merged into one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    positions: Vec<Position>,
}

impl Inventory {
    /// An empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if no positions are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// All positions, in stable display/iteration order: by currency
    /// ascending, then by lot date ascending (uncosted positions sort before
    /// any lot in the same currency), then by the lots' structural order.
    #[must_use]
    pub fn positions(&self) -> Vec<Position> {
        let mut sorted = self.positions.clone();
        sorted.sort_by(Self::display_order);
        sorted
    }

    /// Positions held in a specific currency, in the same stable order as
    /// [`Self::positions`].
    #[must_use]
    pub fn positions_for_currency(&self, currency: &str) -> Vec<Position> {
        let mut matching: Vec<Position> = self
            .positions
            .iter()
            .filter(|p| p.currency() == currency)
            .cloned()
            .collect();
        matching.sort_by(Self::display_order);
        matching
    }

    fn display_order(a: &Position, b: &Position) -> Ordering {
        a.currency().cmp(b.currency()).then_with(|| match (&a.cost, &b.cost) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(ca), Some(cb)) => ca.date.cmp(&cb.date).then_with(|| {
                format!("{ca:?}").cmp(&format!("{cb:?}"))
            }),
        })
    }

    /// The net amount held in `currency` across all lots (and any uncosted
    /// position), summed directly — not a position itself.
    #[must_use]
    pub fn units(&self, currency: &str) -> rust_decimal::Decimal {
        self.positions
            .iter()
            .filter(|p| p.currency() == currency)
            .map(|p| p.amount.number)
            .sum()
    }

    /// `add_position(Position::simple(amount))`.
    #[must_use]
    pub fn add_amount(&self, amount: &Amount) -> Self {
        self.add_position(&Position::simple(amount.clone()))
    }

    /// Add one position, folding it into any existing position with the same
    /// currency and lot identity. A sum of zero removes the entry; adding a
    /// zero-amount position is a no-op. Returns a new inventory.
    #[must_use]
    pub fn add_position(&self, position: &Position) -> Self {
        if position.is_empty() {
            return self.clone();
        }

        let mut positions = self.positions.clone();
        if let Some(existing) = positions
            .iter_mut()
            .find(|p| p.currency() == position.currency() && p.cost == position.cost)
        {
            let combined_number = existing.amount.number + position.amount.number;
            if combined_number.is_zero() {
                let currency = existing.currency().to_string();
                positions.retain(|p| !(p.currency() == currency && p.cost == position.cost));
            } else {
                existing.amount = Amount::new(combined_number, existing.amount.currency.clone());
            }
        } else {
            positions.push(position.clone());
        }

        Self { positions }
    }

    /// Fold every position in `items` into this inventory in order.
    #[must_use]
    pub fn add_positions(&self, items: &[Position]) -> Self {
        items
            .iter()
            .fold(self.clone(), |inv, position| inv.add_position(position))
    }

    /// Split into `(matching, rest)` by predicate, preserving each side's
    /// invariants.
    #[must_use]
    pub fn partition(&self, pred: impl Fn(&Position) -> bool) -> (Self, Self) {
        let (matching, rest): (Vec<Position>, Vec<Position>) =
            self.positions.iter().cloned().partition(|p| pred(p));
        (Self { positions: matching }, Self { positions: rest })
    }
}

impl fmt::Display for Inventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.positions().iter().map(ToString::to_string).collect();
        write!(f, "{}", rendered.join(", "))
    }
}
