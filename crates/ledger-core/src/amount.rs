//! `Amount`: an exact decimal quantity paired with a currency code.
//!
//! Every binary arithmetic operation on two `Amount`s requires identical
//! currencies; operations across currencies return a typed
//! [`AmountError::CrossCurrencyArithmetic`] rather than panicking or silently
//! coercing. Scalar multiply/divide take a bare [`Decimal`] and never fail on
//! currency grounds.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AmountError;
use crate::intern::InternedStr;

/// A quantity paired with a currency, e.g. `12.50 USD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Amount {
    /// The decimal quantity.
    pub number: Decimal,
    /// The currency code (e.g. `USD`, `EUR`, `AAPL`).
    pub currency: InternedStr,
}

impl Amount {
    /// Construct an amount, normalizing the decimal so equal values compare equal
    /// regardless of trailing-zero representation.
    #[must_use]
    pub fn new(number: Decimal, currency: impl Into<InternedStr>) -> Self {
        Self {
            number: number.normalize(),
            currency: currency.into(),
        }
    }

    /// The distinguished zero value for a currency.
    #[must_use]
    pub fn zero(currency: impl Into<InternedStr>) -> Self {
        Self {
            number: Decimal::ZERO,
            currency: currency.into(),
        }
    }

    /// `true` if the quantity is exactly zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.number.is_zero()
    }

    /// `true` if the quantity is strictly positive.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.number.is_sign_positive() && !self.number.is_zero()
    }

    /// `true` if the quantity is strictly negative.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.number.is_sign_negative() && !self.number.is_zero()
    }

    /// Sign as `-1`, `0`, or `1`.
    #[must_use]
    pub fn signum(&self) -> i32 {
        if self.is_zero() {
            0
        } else if self.is_negative() {
            -1
        } else {
            1
        }
    }

    /// Absolute value, same currency.
    #[must_use]
    pub fn abs(&self) -> Self {
        Self {
            number: self.number.abs(),
            currency: self.currency.clone(),
        }
    }

    /// Negation, same currency. Infallible: negation never combines currencies.
    #[must_use]
    pub fn neg(&self) -> Self {
        Self {
            number: -self.number,
            currency: self.currency.clone(),
        }
    }

    /// Add two amounts of the same currency.
    ///
    /// # Errors
    /// Returns [`AmountError::CrossCurrencyArithmetic`] if `self` and `other`
    /// have different currencies.
    pub fn checked_add(&self, other: &Self) -> Result<Self, AmountError> {
        self.require_same_currency(other)?;
        Ok(Self::new(self.number + other.number, self.currency.clone()))
    }

    /// Subtract `other` from `self`, both of the same currency.
    ///
    /// # Errors
    /// Returns [`AmountError::CrossCurrencyArithmetic`] if `self` and `other`
    /// have different currencies.
    pub fn checked_sub(&self, other: &Self) -> Result<Self, AmountError> {
        self.require_same_currency(other)?;
        Ok(Self::new(self.number - other.number, self.currency.clone()))
    }

    /// Multiply by a bare scalar; currency is preserved, never combined.
    #[must_use]
    pub fn scale(&self, factor: Decimal) -> Self {
        Self::new(self.number * factor, self.currency.clone())
    }

    /// Divide by a bare scalar; currency is preserved, never combined.
    #[must_use]
    pub fn divide(&self, divisor: Decimal) -> Self {
        Self::new(self.number / divisor, self.currency.clone())
    }

    /// Compare for ordering against another amount of the same currency.
    ///
    /// # Errors
    /// Returns [`AmountError::CrossCurrencyArithmetic`] if the currencies differ.
    pub fn checked_cmp(&self, other: &Self) -> Result<std::cmp::Ordering, AmountError> {
        self.require_same_currency(other)?;
        Ok(self.number.cmp(&other.number))
    }

    /// The smallest tolerance implied by this amount's decimal precision:
    /// `0.5 * 10^(-scale)`.
    #[must_use]
    pub fn inferred_tolerance(&self) -> Decimal {
        Decimal::new(5, self.number.scale() + 1)
    }

    /// `true` if this amount is within `tolerance` of `other`, same currency.
    /// Returns `false` (not an error) on a currency mismatch: tolerance
    /// comparison is used only for balance assertions, where a mismatched
    /// currency is never "close enough" rather than malformed input.
    #[must_use]
    pub fn eq_with_tolerance(&self, other: &Self, tolerance: Decimal) -> bool {
        self.currency == other.currency && (self.number - other.number).abs() <= tolerance.abs()
    }

    fn require_same_currency(&self, other: &Self) -> Result<(), AmountError> {
        if self.currency == other.currency {
            Ok(())
        } else {
            Err(AmountError::CrossCurrencyArithmetic {
                lhs: self.currency.clone(),
                rhs: other.currency.clone(),
            })
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn new_normalizes_trailing_zeros() {
        let a = Amount::new(dec!(100.00), "USD");
        let b = Amount::new(dec!(100.0000), "USD");
        assert_eq!(a, b);
    }

    #[test]
    fn zero_is_distinguished_per_currency() {
        let usd = Amount::zero("USD");
        let eur = Amount::zero("EUR");
        assert!(usd.is_zero());
        assert!(eur.is_zero());
        assert_ne!(usd, eur);
    }

    #[test]
    fn checked_add_same_currency() {
        let a = Amount::new(dec!(100.00), "USD");
        let b = Amount::new(dec!(50.00), "USD");
        let sum = a.checked_add(&b).unwrap();
        assert_eq!(sum.number, dec!(150.00));
    }

    #[test]
    fn checked_add_cross_currency_errors() {
        let a = Amount::new(dec!(100.00), "USD");
        let b = Amount::new(dec!(50.00), "EUR");
        let err = a.checked_add(&b).unwrap_err();
        assert_eq!(
            err,
            AmountError::CrossCurrencyArithmetic {
                lhs: "USD".into(),
                rhs: "EUR".into(),
            }
        );
    }

    #[test]
    fn exact_roundtrip_no_rounding_drift() {
        // (p + q) - q == p exactly, for arbitrary same-currency p, q.
        let p = Amount::new(dec!(1.1), "CHF");
        let q = Amount::new(dec!(2.2), "CHF");
        let roundtrip = p.checked_add(&q).unwrap().checked_sub(&q).unwrap();
        assert_eq!(roundtrip, p);
    }

    #[test]
    fn sign_predicates() {
        let pos = Amount::new(dec!(100), "USD");
        let neg = Amount::new(dec!(-100), "USD");
        let zero = Amount::zero("USD");

        assert!(pos.is_positive() && !pos.is_negative());
        assert!(neg.is_negative() && !neg.is_positive());
        assert!(!zero.is_positive() && !zero.is_negative());
        assert_eq!(pos.signum(), 1);
        assert_eq!(neg.signum(), -1);
        assert_eq!(zero.signum(), 0);
    }

    #[test]
    fn scale_and_divide_preserve_currency() {
        let a = Amount::new(dec!(10), "VT");
        let scaled = a.scale(dec!(150.00));
        assert_eq!(scaled.number, dec!(1500.00));
        assert_eq!(scaled.currency, "VT");

        let b = Amount::new(dec!(300), "CHF");
        let divided = b.divide(dec!(2));
        assert_eq!(divided.number, dec!(150));
    }

    #[test]
    fn inferred_tolerance_scales_with_precision() {
        assert_eq!(Amount::new(dec!(100), "USD").inferred_tolerance(), dec!(0.5));
        assert_eq!(
            Amount::new(dec!(100.00), "USD").inferred_tolerance(),
            dec!(0.005)
        );
    }

    #[test]
    fn eq_with_tolerance_respects_currency() {
        let a = Amount::new(dec!(10.00), "CHF");
        let b = Amount::new(dec!(10.01), "CHF");
        assert!(a.eq_with_tolerance(&b, dec!(0.02)));
        assert!(!a.eq_with_tolerance(&b, dec!(0.005)));

        let c = Amount::new(dec!(10.00), "USD");
        assert!(!a.eq_with_tolerance(&c, dec!(1.0)));
    }

    #[test]
    fn display_format() {
        let a = Amount::new(dec!(1234.56), "USD");
        assert_eq!(format!("{a}"), "1234.56 USD");
    }
}
