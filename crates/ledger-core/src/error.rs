//! Errors raised by the core value types.

use thiserror::Error;

use crate::intern::InternedStr;

/// Errors raised by [`crate::amount::Amount`] arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// A binary operation was attempted between two amounts of different currencies.
    #[error("cannot combine {lhs} amount with {rhs} amount: currencies differ")]
    CrossCurrencyArithmetic {
        /// Currency of the left-hand operand.
        lhs: InternedStr,
        /// Currency of the right-hand operand.
        rhs: InternedStr,
    },
}
