//! `Position`: an amount optionally held at a cost-lot.
//!
//! A position with `cost = None` is "held at no cost" (plain cash); a
//! position with a cost is a lot participating in cost-basis tracking. A
//! position's amount is never zero — callers that would produce a zero
//! amount must drop the position instead (enforced by [`crate::inventory::Inventory`]).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::amount::Amount;
use crate::cost::{Cost, CostSpec};
use crate::error::AmountError;

/// An amount plus an optional cost-lot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// The amount held.
    pub amount: Amount,
    /// The cost-lot this amount is held at, if any.
    pub cost: Option<Cost>,
}

impl Position {
    /// A position held at no cost (e.g. plain cash).
    #[must_use]
    pub const fn simple(amount: Amount) -> Self {
        Self { amount, cost: None }
    }

    /// A position held at a cost-lot.
    #[must_use]
    pub const fn with_cost(amount: Amount, cost: Cost) -> Self {
        Self {
            amount,
            cost: Some(cost),
        }
    }

    /// `true` if the amount is exactly zero (a position that should not be stored).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.amount.is_zero()
    }

    /// The currency of the amount held.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.amount.currency
    }

    /// `true` if this position is held at a cost (a lot).
    #[must_use]
    pub fn is_at_cost(&self) -> bool {
        self.cost.is_some()
    }

    /// `true` if this position's cost matches every non-empty filter on `spec`.
    /// Positions without cost never match — they are invisible to reductions
    /// (§8 boundary behavior).
    #[must_use]
    pub fn matches_cost_spec(&self, spec: &CostSpec) -> bool {
        self.cost.as_ref().is_some_and(|cost| spec.matches(cost))
    }

    /// Negate the amount, keeping the same cost.
    #[must_use]
    pub fn neg(&self) -> Self {
        Self {
            amount: self.amount.neg(),
            cost: self.cost.clone(),
        }
    }

    /// `true` if `reduction` could reduce this position: same currency,
    /// opposite sign.
    #[must_use]
    pub fn can_reduce(&self, reduction: &Amount) -> bool {
        self.amount.currency == reduction.currency
            && self.amount.signum() != 0
            && self.amount.signum() == -reduction.signum()
    }

    /// Split off `take` units (signed, same direction as `reduction` in
    /// [`Self::can_reduce`]) from this position, returning `(taken, remaining)`.
    /// Both share this position's cost. Does not check direction or
    /// magnitude; callers are expected to have validated via `can_reduce`.
    #[must_use]
    pub fn split(&self, take: Decimal) -> (Self, Self) {
        let taken = Self {
            amount: Amount::new(take, self.amount.currency.clone()),
            cost: self.cost.clone(),
        };
        let remaining = Self {
            amount: Amount::new(self.amount.number - take, self.amount.currency.clone()),
            cost: self.cost.clone(),
        };
        (taken, remaining)
    }

    /// Add `other`'s amount to this position's amount (same currency and cost
    /// assumed; callers group by lot-key before calling this).
    ///
    /// # Errors
    /// Returns [`AmountError::CrossCurrencyArithmetic`] if the amounts'
    /// currencies differ.
    pub fn checked_add_amount(&self, other: &Amount) -> Result<Self, AmountError> {
        Ok(Self {
            amount: self.amount.checked_add(other)?,
            cost: self.cost.clone(),
        })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.amount)?;
        if let Some(cost) = &self.cost {
            write!(f, " {cost}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn sample_cost() -> Cost {
        Cost::new(
            Amount::new(dec!(150.00), "USD"),
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
            crate::cost::DateSpec::date_only(chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()),
        )
    }

    #[test]
    fn simple_position_has_no_cost() {
        let pos = Position::simple(Amount::new(dec!(1000.00), "USD"));
        assert_eq!(pos.currency(), "USD");
        assert!(!pos.is_at_cost());
    }

    #[test]
    fn position_with_cost_tracks_lot() {
        let pos = Position::with_cost(Amount::new(dec!(10), "AAPL"), sample_cost());
        assert_eq!(pos.currency(), "AAPL");
        assert!(pos.is_at_cost());
    }

    #[test]
    fn is_empty_detects_zero_amount() {
        assert!(Position::simple(Amount::zero("USD")).is_empty());
        assert!(!Position::simple(Amount::new(dec!(100), "USD")).is_empty());
    }

    #[test]
    fn can_reduce_requires_opposite_sign_same_currency() {
        let pos = Position::simple(Amount::new(dec!(100), "USD"));
        assert!(pos.can_reduce(&Amount::new(dec!(-30), "USD")));
        assert!(!pos.can_reduce(&Amount::new(dec!(30), "USD")));
        assert!(!pos.can_reduce(&Amount::new(dec!(-30), "EUR")));
    }

    #[test]
    fn split_shares_cost() {
        let pos = Position::with_cost(Amount::new(dec!(10), "AAPL"), sample_cost());
        let (taken, remaining) = pos.split(dec!(3));
        assert_eq!(taken.amount.number, dec!(3));
        assert_eq!(remaining.amount.number, dec!(7));
        assert_eq!(taken.cost, pos.cost);
        assert_eq!(remaining.cost, pos.cost);
    }

    #[test]
    fn positions_without_cost_never_match_a_spec() {
        let pos = Position::simple(Amount::new(dec!(100), "USD"));
        assert!(!pos.matches_cost_spec(&CostSpec::default()));
    }
}
