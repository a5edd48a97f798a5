//! Option resolution: the three option hierarchies the booker consults
//! (`account-reference-checks`, `trading-account`, `booking-method`).

use std::str::FromStr;

use ledger_core::{AccountMap, AccountState, InternedStr, Metadata, OptionMap};

use crate::error::BookingError;
use crate::methods::BookingMethod;

/// How strictly a posting's account reference is checked against the
/// account registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountReferenceChecks {
    /// No checks at all.
    None,
    /// Closed accounts rejected (unless `allow-closed-account`); missing
    /// accounts tolerated.
    Lenient,
    /// Missing and closed accounts both rejected.
    Strict,
}

impl FromStr for AccountReferenceChecks {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            _ => Err(()),
        }
    }
}

const OPT_ACCOUNT_REFERENCE_CHECKS: &str = "account-reference-checks";
const OPT_ALLOW_CLOSED_ACCOUNT: &str = "allow-closed-account";
const OPT_BOOKING_METHOD: &str = "booking-method";

fn resolve_account_reference_checks(
    option_map: &OptionMap,
) -> Result<AccountReferenceChecks, BookingError> {
    match option_map.get(OPT_ACCOUNT_REFERENCE_CHECKS) {
        None => Ok(AccountReferenceChecks::Lenient),
        Some(raw) => raw.parse().map_err(|()| BookingError::InvalidOption {
            option: OPT_ACCOUNT_REFERENCE_CHECKS,
            value: Some(raw.clone()),
        }),
    }
}

fn allow_closed_account(option_map: &OptionMap) -> bool {
    option_map
        .get(OPT_ALLOW_CLOSED_ACCOUNT)
        .is_some_and(|v| v == "true")
}

/// Check a posting's account reference against the account registry under
/// the transaction's `account-reference-checks` mode.
pub fn check_account_reference(
    account: &InternedStr,
    accounts: &AccountMap,
    option_map: &OptionMap,
) -> Result<(), BookingError> {
    let mode = resolve_account_reference_checks(option_map)?;
    if mode == AccountReferenceChecks::None {
        return Ok(());
    }

    match accounts.get(account) {
        None => {
            if mode == AccountReferenceChecks::Strict {
                Err(BookingError::AccountNotOpen {
                    account: account.clone(),
                })
            } else {
                Ok(())
            }
        }
        Some(AccountState::Closed { .. }) => {
            if mode == AccountReferenceChecks::Lenient && allow_closed_account(option_map) {
                Ok(())
            } else {
                Err(BookingError::AccountClosed {
                    account: account.clone(),
                })
            }
        }
        Some(AccountState::Open { .. }) => Ok(()),
    }
}

/// Resolve the trading account for an augmentation or reduction posting:
/// posting meta → transaction meta → open meta → `Trading:Default`.
#[must_use]
pub fn resolve_trading_account(
    posting_meta: &Metadata,
    transaction_meta: &Metadata,
    open_meta: Option<&Metadata>,
) -> InternedStr {
    const KEY: &str = "trading-account";
    posting_meta
        .get(KEY)
        .and_then(|v| v.as_account())
        .or_else(|| transaction_meta.get(KEY).and_then(|v| v.as_account()))
        .or_else(|| open_meta.and_then(|m| m.get(KEY)).and_then(|v| v.as_account()))
        .cloned()
        .unwrap_or_else(|| InternedStr::from("Trading:Default"))
}

/// Resolve the booking method for a reduction: posting meta → transaction
/// meta → open meta → transaction option-map (`booking-method`) → `fifo`.
pub fn resolve_booking_method(
    posting_meta: &Metadata,
    transaction_meta: &Metadata,
    open_meta: Option<&Metadata>,
    option_map: &OptionMap,
) -> Result<BookingMethod, BookingError> {
    const KEY: &str = "booking-method";

    let as_string = |meta: &Metadata| meta.get(KEY).and_then(|v| v.as_str()).map(str::to_owned);

    let raw = as_string(posting_meta)
        .or_else(|| as_string(transaction_meta))
        .or_else(|| open_meta.and_then(|m| as_string(m)))
        .or_else(|| option_map.get(OPT_BOOKING_METHOD).cloned());

    match raw {
        None => Ok(BookingMethod::Fifo),
        Some(value) => value.parse().map_err(|()| BookingError::InvalidOption {
            option: OPT_BOOKING_METHOD,
            value: Some(value),
        }),
    }
}
