//! The ledger booker: consumes directives in file order, dispatching each to
//! its handler and accumulating the final [`BookedLedger`].

use ledger_core::{
    AccountMap, AccountState, BalanceDirective, BookedLedger, CloseDirective, CurrencyDirective,
    CurrencyMap, Directive, InventoryMap, OpenDirective,
};

use crate::error::{BookingError, DirectiveError};
use crate::transaction::book_transaction;

/// The registries a booking run starts from, enabling incremental booking
/// on top of a previously booked prefix.
#[derive(Debug, Clone, Default)]
pub struct BookingState {
    /// Account lifecycle registry.
    pub accounts: AccountMap,
    /// Declared-currency registry.
    pub currencies: CurrencyMap,
    /// Per-account inventories.
    pub inventories: InventoryMap,
}

/// Book a full directive stream (in the order the loader produced it),
/// starting from `state` (pass [`BookingState::default`] for a fresh ledger).
///
/// Returns the completed [`BookedLedger`] or the first [`DirectiveError`]
/// encountered; booking halts on the first failure.
pub fn book_ledger(
    directives: &[Directive],
    state: BookingState,
) -> Result<BookedLedger, DirectiveError> {
    let BookingState {
        mut accounts,
        mut currencies,
        mut inventories,
    } = state;
    let mut transactions = Vec::new();

    for directive in directives {
        match directive {
            Directive::Open(open) => book_open(open, &mut accounts)
                .map_err(|e| DirectiveError::new(open.source.clone(), open.date, e))?,
            Directive::Close(close) => book_close(close, &mut accounts)
                .map_err(|e| DirectiveError::new(close.source.clone(), close.date, e))?,
            Directive::Currency(currency) => book_currency(currency, &mut currencies)
                .map_err(|e| DirectiveError::new(currency.source.clone(), currency.date, e))?,
            Directive::Balance(balance) => book_balance(balance, &inventories)
                .map_err(|e| DirectiveError::new(balance.source.clone(), balance.date, e))?,
            Directive::Transaction(txn) => {
                let (booked, new_inventories) = book_transaction(txn, &accounts, &inventories)
                    .map_err(|e| DirectiveError::new(txn.source.clone(), txn.date, e))?;
                inventories = new_inventories;
                transactions.push(booked);
            }
            Directive::Option(_) => {}
        }
    }

    Ok(BookedLedger {
        transactions,
        accounts,
        currencies,
        inventories,
    })
}

fn book_open(open: &OpenDirective, accounts: &mut AccountMap) -> Result<(), BookingError> {
    if accounts.get(&open.account).is_some_and(AccountState::is_open) {
        return Err(BookingError::AlreadyOpen {
            account: open.account.clone(),
        });
    }
    accounts.insert(
        open.account.clone(),
        AccountState::Open {
            currencies: open.currencies.clone(),
            meta: open.meta.clone(),
        },
    );
    Ok(())
}

fn book_close(close: &CloseDirective, accounts: &mut AccountMap) -> Result<(), BookingError> {
    if accounts.get(&close.account).is_some_and(AccountState::is_closed) {
        return Err(BookingError::AlreadyClosed {
            account: close.account.clone(),
        });
    }
    accounts.insert(
        close.account.clone(),
        AccountState::Closed {
            meta: close.meta.clone(),
        },
    );
    Ok(())
}

fn book_currency(
    currency: &CurrencyDirective,
    currencies: &mut CurrencyMap,
) -> Result<(), BookingError> {
    if currencies.contains_key(&currency.currency) {
        return Err(BookingError::DuplicateCurrency {
            currency: currency.currency.clone(),
        });
    }
    currencies.insert(currency.currency.clone(), currency.meta.clone());
    Ok(())
}

fn book_balance(
    balance: &BalanceDirective,
    inventories: &InventoryMap,
) -> Result<(), BookingError> {
    let actual = inventories
        .get(&balance.account)
        .map_or(rust_decimal::Decimal::ZERO, |inv| {
            inv.units(&balance.amount.currency)
        });
    let expected = balance.amount.number;
    let delta = (expected - actual).abs();
    let max_delta = balance.tolerance.unwrap_or(rust_decimal::Decimal::ZERO).abs();

    if delta > max_delta {
        return Err(BookingError::BalanceMismatch {
            account: balance.account.clone(),
            expected,
            actual,
            delta,
            max_delta,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ledger_core::{Metadata, OptionMap, SourceContext};
    use rust_decimal_macros::dec;

    fn instant(y: i32, m: u32, d: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn reopen_after_close_is_allowed() {
        let account: ledger_core::InternedStr = "Assets:Cash".into();
        let directives = vec![
            Directive::Open(OpenDirective {
                date: instant(2024, 1, 1),
                account: account.clone(),
                currencies: Vec::new(),
                meta: Metadata::new(),
                option_map: OptionMap::new(),
                source: SourceContext::new("x.ledger", 1),
            }),
            Directive::Close(CloseDirective {
                date: instant(2024, 2, 1),
                account: account.clone(),
                meta: Metadata::new(),
                option_map: OptionMap::new(),
                source: SourceContext::new("x.ledger", 2),
            }),
            Directive::Open(OpenDirective {
                date: instant(2024, 3, 1),
                account,
                currencies: Vec::new(),
                meta: Metadata::new(),
                option_map: OptionMap::new(),
                source: SourceContext::new("x.ledger", 3),
            }),
        ];

        let result = book_ledger(&directives, BookingState::default());
        assert!(result.is_ok());
    }

    #[test]
    fn duplicate_open_fails() {
        let account: ledger_core::InternedStr = "Assets:Cash".into();
        let open = || {
            Directive::Open(OpenDirective {
                date: instant(2024, 1, 1),
                account: account.clone(),
                currencies: Vec::new(),
                meta: Metadata::new(),
                option_map: OptionMap::new(),
                source: SourceContext::new("x.ledger", 1),
            })
        };
        let directives = vec![open(), open()];
        let err = book_ledger(&directives, BookingState::default()).unwrap_err();
        assert!(matches!(err.kind, BookingError::AlreadyOpen { .. }));
    }

    #[test]
    fn balance_matches_within_tolerance() {
        let account: ledger_core::InternedStr = "Assets:Cash".into();
        let mut inventories = InventoryMap::new();
        inventories.insert(
            account.clone(),
            ledger_core::Inventory::new().add_amount(&ledger_core::Amount::new(dec!(100.004), "USD")),
        );
        let balance = BalanceDirective {
            date: instant(2024, 1, 1),
            account,
            amount: ledger_core::Amount::new(dec!(100), "USD"),
            tolerance: Some(dec!(0.01)),
            meta: Metadata::new(),
            option_map: OptionMap::new(),
            source: SourceContext::new("x.ledger", 1),
        };
        assert!(book_balance(&balance, &inventories).is_ok());
    }

    #[test]
    fn balance_mismatch_beyond_tolerance_fails() {
        let balance = BalanceDirective {
            date: instant(2024, 1, 1),
            account: "Assets:Cash".into(),
            amount: ledger_core::Amount::new(dec!(100), "USD"),
            tolerance: Some(dec!(0.01)),
            meta: Metadata::new(),
            option_map: OptionMap::new(),
            source: SourceContext::new("x.ledger", 1),
        };
        let err = book_balance(&balance, &InventoryMap::new()).unwrap_err();
        assert!(matches!(err, BookingError::BalanceMismatch { .. }));
    }
}
