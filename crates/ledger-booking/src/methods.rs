//! Lot-selection booking methods: FIFO and LIFO.
//!
//! A booking method picks which cost-lots a reduction draws down, and in
//! what order, when a posting's amount spec names no cost (see
//! [`crate::transaction`] Case B).

use std::fmt;
use std::str::FromStr;

use ledger_core::{Amount, InternedStr, Inventory, Position};
use rust_decimal::prelude::Signed;

use crate::error::BookingError;

/// Which lots a reduction consumes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookingMethod {
    /// Oldest lot (by cost date) first.
    Fifo,
    /// Newest lot (by cost date) first.
    Lifo,
}

impl FromStr for BookingMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FIFO" => Ok(Self::Fifo),
            "LIFO" => Ok(Self::Lifo),
            _ => Err(()),
        }
    }
}

impl fmt::Display for BookingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fifo => write!(f, "FIFO"),
            Self::Lifo => write!(f, "LIFO"),
        }
    }
}

/// Reduce `usable` by `amount`, returning the booked-posting pieces (each
/// carrying the cost of the lot it was drawn from, signed the same way as
/// `amount`) and the leftover inventory.
///
/// `usable` must already be filtered down to the candidate lots for this
/// reduction (same currency, matching cost-spec filter, per Case B); this
/// function only orders and consumes them. Positions without a cost are
/// never candidates — callers must exclude them before calling in, and this
/// function ignores any that slip through.
///
/// A zero `amount` is a no-op: `([], usable.clone())`.
pub fn reduce(
    account: &InternedStr,
    usable: &Inventory,
    amount: &Amount,
    method: BookingMethod,
) -> Result<(Vec<Position>, Inventory), BookingError> {
    if amount.is_zero() {
        return Ok((Vec::new(), usable.clone()));
    }

    // `positions_for_currency` already sorts by (currency, cost-date, ...);
    // its resulting index is a stable, deterministic tiebreak for lots that
    // share a cost date.
    let mut candidates: Vec<(usize, Position)> = usable
        .positions_for_currency(&amount.currency)
        .into_iter()
        .enumerate()
        .filter(|(_, p)| p.is_at_cost() && p.can_reduce(amount))
        .collect();

    candidates.sort_by(|(ia, a), (ib, b)| {
        let date_a = a.cost.as_ref().map(|c| c.date);
        let date_b = b.cost.as_ref().map(|c| c.date);
        let by_date = match method {
            BookingMethod::Fifo => date_a.cmp(&date_b),
            BookingMethod::Lifo => date_b.cmp(&date_a),
        };
        by_date.then(ia.cmp(ib))
    });

    let mut remaining = amount.number.abs();
    let mut matched = Vec::new();
    let mut leftover = usable.clone();

    for (_, lot) in candidates {
        if remaining.is_zero() {
            break;
        }
        let available = lot.amount.number.abs();
        let take = remaining.min(available);
        // Split the lot using its own sign convention, then negate the
        // taken chunk to get the posting's sign (opposite of the lot).
        let same_sign_take = take * lot.amount.number.signum();
        let (taken_chunk, remainder_of_lot) = lot.split(same_sign_take);
        matched.push(taken_chunk.neg());
        leftover = leftover
            .partition(|p| *p != lot)
            .0
            .add_position(&remainder_of_lot);
        remaining -= take;
    }

    if !remaining.is_zero() {
        return Err(BookingError::NotEnoughToReduce {
            account: account.clone(),
            remainder: remaining,
        });
    }

    Ok((matched, leftover))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ledger_core::{Cost, DateSpec};
    use rust_decimal_macros::dec;

    fn lot(units: rust_decimal::Decimal, cost_per_unit: rust_decimal::Decimal, year: i32, month: u32, day: u32) -> Position {
        let date = chrono::NaiveDate::from_ymd_opt(year, month, day).unwrap();
        let instant = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap());
        let cost = Cost::new(Amount::new(cost_per_unit, "USD"), instant, DateSpec::date_only(date));
        Position::with_cost(Amount::new(units, "AAPL"), cost)
    }

    #[test]
    fn fifo_consumes_oldest_lot_first() {
        let inv = Inventory::new()
            .add_position(&lot(dec!(10), dec!(100), 2024, 1, 1))
            .add_position(&lot(dec!(10), dec!(120), 2024, 6, 1));

        let (matched, leftover) = reduce(
            &InternedStr::from("Assets:Stock"),
            &inv,
            &Amount::new(dec!(-15), "AAPL"),
            BookingMethod::Fifo,
        )
        .unwrap();

        assert_eq!(matched.len(), 2);
        assert_eq!(matched[0].amount.number, dec!(-10));
        assert_eq!(matched[0].cost.as_ref().unwrap().amounts[0].number, dec!(100));
        assert_eq!(matched[1].amount.number, dec!(-5));
        assert_eq!(matched[1].cost.as_ref().unwrap().amounts[0].number, dec!(120));
        assert_eq!(leftover.units("AAPL"), dec!(5));
    }

    #[test]
    fn lifo_consumes_newest_lot_first() {
        let inv = Inventory::new()
            .add_position(&lot(dec!(10), dec!(100), 2024, 1, 1))
            .add_position(&lot(dec!(10), dec!(120), 2024, 6, 1));

        let (matched, _leftover) = reduce(
            &InternedStr::from("Assets:Stock"),
            &inv,
            &Amount::new(dec!(-15), "AAPL"),
            BookingMethod::Lifo,
        )
        .unwrap();

        assert_eq!(matched[0].cost.as_ref().unwrap().amounts[0].number, dec!(120));
        assert_eq!(matched[1].cost.as_ref().unwrap().amounts[0].number, dec!(100));
    }

    #[test]
    fn not_enough_to_reduce_errors() {
        let inv = Inventory::new().add_position(&lot(dec!(5), dec!(100), 2024, 1, 1));
        let err = reduce(
            &InternedStr::from("Assets:Stock"),
            &inv,
            &Amount::new(dec!(-10), "AAPL"),
            BookingMethod::Fifo,
        )
        .unwrap_err();
        assert!(matches!(err, BookingError::NotEnoughToReduce { .. }));
    }

    #[test]
    fn zero_amount_is_a_noop() {
        let inv = Inventory::new().add_position(&lot(dec!(5), dec!(100), 2024, 1, 1));
        let (matched, leftover) = reduce(
            &InternedStr::from("Assets:Stock"),
            &inv,
            &Amount::new(dec!(0), "AAPL"),
            BookingMethod::Fifo,
        )
        .unwrap();
        assert!(matched.is_empty());
        assert_eq!(leftover, inv);
    }

    #[test]
    fn uncosted_positions_are_never_candidates() {
        let inv = Inventory::new().add_amount(&Amount::new(dec!(10), "AAPL"));
        let err = reduce(
            &InternedStr::from("Assets:Stock"),
            &inv,
            &Amount::new(dec!(-5), "AAPL"),
            BookingMethod::Fifo,
        )
        .unwrap_err();
        assert!(matches!(err, BookingError::NotEnoughToReduce { .. }));
    }
}
