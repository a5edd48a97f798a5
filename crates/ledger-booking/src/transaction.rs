//! The transaction booker: turns one [`TransactionDirective`] into a booked
//! [`Transaction`], dispatching each posting through Cases A–E.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::Signed;
use ledger_core::{
    AccountMap, AccountState, Amount, BookedPosting, Cost, CostSpec, DateSpec, InternedStr,
    Inventory, InventoryMap, Metadata, Posting, Transaction, TransactionDirective,
};

use crate::do_book::{do_book, Emission};
use crate::error::BookingError;
use crate::methods;
use crate::options::{check_account_reference, resolve_booking_method, resolve_trading_account};

/// Book one transaction directive against the current registries, returning
/// the booked transaction and the updated `InventoryMap`.
pub fn book_transaction(
    directive: &TransactionDirective,
    accounts: &AccountMap,
    inventories: &InventoryMap,
) -> Result<(Transaction, InventoryMap), BookingError> {
    let inventories_before = inventories.clone();
    let mut inventories = inventories.clone();
    let mut balance = Inventory::new();
    let mut postings = Vec::new();
    let mut saw_elastic = false;

    for posting in &directive.postings {
        check_account_reference(&posting.account, accounts, &directive.option_map)?;

        let open_meta = open_meta_for(accounts, &posting.account);

        let (mut emitted, new_inventories, new_balance) = match (&posting.cost_spec, &posting.amount)
        {
            (Some(cost_spec), Some(amount)) if cost_spec.is_augmentation() => book_augmentation(
                posting,
                cost_spec,
                amount,
                directive,
                open_meta,
                &inventories,
                &balance,
            )?,
            (Some(cost_spec), Some(amount)) => book_reduction(
                posting,
                cost_spec,
                amount,
                directive,
                open_meta,
                &inventories,
                &balance,
            )?,
            (Some(_), None) => {
                return Err(BookingError::InferenceUnsupported {
                    account: posting.account.clone(),
                })
            }
            (None, Some(amount)) => {
                let (p, inv, bal) = do_book(
                    &inventories,
                    &balance,
                    vec![Emission {
                        account: posting.account.clone(),
                        flag: posting.flag.unwrap_or(directive.flag),
                        amount: amount.clone(),
                        cost: None,
                        meta: posting.meta.clone(),
                    }],
                );
                (p, inv, bal)
            }
            (None, None) => {
                if saw_elastic {
                    return Err(BookingError::MultipleElasticPostings {
                        account: posting.account.clone(),
                    });
                }
                saw_elastic = true;
                book_elastic(posting, directive, &balance, &inventories)?
            }
        };

        check_currency_restriction(accounts, &emitted)?;

        inventories = new_inventories;
        balance = new_balance;
        postings.append(&mut emitted);
    }

    if !balance.is_empty() {
        return Err(BookingError::TransactionUnbalanced { residual: balance });
    }

    let transaction = Transaction {
        date: directive.date,
        flag: directive.flag,
        payee: directive.payee.clone(),
        narration: directive.narration.clone(),
        meta: directive.meta.clone(),
        postings,
        inventories_before,
        inventories_after: inventories.clone(),
        source: directive.source.clone(),
    };

    Ok((transaction, inventories))
}

fn open_meta_for<'a>(accounts: &'a AccountMap, account: &InternedStr) -> Option<&'a Metadata> {
    match accounts.get(account) {
        Some(AccountState::Open { meta, .. }) => Some(meta),
        _ => None,
    }
}

fn check_currency_restriction(
    accounts: &AccountMap,
    emitted: &[BookedPosting],
) -> Result<(), BookingError> {
    for posting in emitted {
        if let Some(AccountState::Open { currencies, .. }) = accounts.get(&posting.account) {
            if !currencies.is_empty() && !currencies.contains(&posting.amount.currency) {
                return Err(BookingError::CurrencyNotAllowed {
                    account: posting.account.clone(),
                    currency: posting.amount.currency.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Case A: cost spec present with amounts, amount present — an augmentation.
fn book_augmentation(
    posting: &Posting,
    cost_spec: &CostSpec,
    amount: &Amount,
    directive: &TransactionDirective,
    open_meta: Option<&Metadata>,
    inventories: &InventoryMap,
    balance: &Inventory,
) -> Result<(Vec<BookedPosting>, InventoryMap, Inventory), BookingError> {
    if !cost_spec.currencies.is_empty() {
        return Err(BookingError::AugmentationHasCurrencyFilter {
            account: posting.account.clone(),
        });
    }
    if cost_spec.dates.len() > 1 {
        return Err(BookingError::AugmentationMultipleDates {
            account: posting.account.clone(),
        });
    }

    let lot_date_spec = cost_spec
        .dates
        .first()
        .cloned()
        .unwrap_or_else(|| DateSpec::date_only(directive.date.date_naive()));
    let lot_date = resolved_instant(&lot_date_spec);

    let per_unit = cost_spec.per_unit_amounts(amount.number);
    let cost = Some(Cost {
        amounts: per_unit,
        date: lot_date,
        date_spec: lot_date_spec,
        tags: Vec::new(),
    });

    let flag = posting.flag.unwrap_or(directive.flag);
    let trading_account =
        resolve_trading_account(&posting.meta, &directive.meta, open_meta);

    let mut emissions = vec![Emission {
        account: posting.account.clone(),
        flag,
        amount: amount.clone(),
        cost,
        meta: posting.meta.clone(),
    }];

    emissions.push(Emission {
        account: trading_account.clone(),
        flag,
        amount: amount.neg(),
        cost: None,
        meta: Metadata::new(),
    });

    for total in cost_spec.total_amounts(amount.number) {
        let signed = Amount::new(total.number * amount.number.signum(), total.currency.clone());
        emissions.push(Emission {
            account: trading_account.clone(),
            flag,
            amount: signed,
            cost: None,
            meta: Metadata::new(),
        });
    }

    Ok(do_book(inventories, balance, emissions))
}

/// Case B: cost spec present without amounts, amount present — a reduction.
fn book_reduction(
    posting: &Posting,
    cost_spec: &CostSpec,
    amount: &Amount,
    directive: &TransactionDirective,
    open_meta: Option<&Metadata>,
    inventories: &InventoryMap,
    balance: &Inventory,
) -> Result<(Vec<BookedPosting>, InventoryMap, Inventory), BookingError> {
    let flag = posting.flag.unwrap_or(directive.flag);
    let current = inventories.get(&posting.account).cloned().unwrap_or_default();

    let (usable, rest) = current.partition(|p| {
        p.is_at_cost() && p.cost.as_ref().is_some_and(|c| cost_spec.matches(c))
    });

    let method = resolve_booking_method(
        &posting.meta,
        &directive.meta,
        open_meta,
        &directive.option_map,
    )?;

    let (matched, leftover) = methods::reduce(&posting.account, &usable, amount, method)?;

    let mut inventories = inventories.clone();
    inventories.insert(posting.account.clone(), rest.add_positions(&leftover.positions()));

    let trading_account = resolve_trading_account(&posting.meta, &directive.meta, open_meta);

    let mut postings = Vec::with_capacity(matched.len() * 2);
    let mut balance = balance.clone();

    for lot in &matched {
        balance = balance.add_amount(&lot.amount);
        postings.push(BookedPosting {
            account: posting.account.clone(),
            flag,
            amount: lot.amount.clone(),
            cost: lot.cost.clone(),
            meta: posting.meta.clone(),
        });

        let mut trading_emissions = vec![Emission {
            account: trading_account.clone(),
            flag,
            amount: lot.amount.neg(),
            cost: None,
            meta: Metadata::new(),
        }];

        if let Some(lot_cost) = &lot.cost {
            for cost_amount in &lot_cost.amounts {
                let value = Amount::new(
                    cost_amount.number * lot.amount.number,
                    cost_amount.currency.clone(),
                );
                trading_emissions.push(Emission {
                    account: trading_account.clone(),
                    flag,
                    amount: value,
                    cost: None,
                    meta: Metadata::new(),
                });
            }
        }

        let (mut trading_postings, new_inventories, new_balance) =
            do_book(&inventories, &balance, trading_emissions);
        postings.append(&mut trading_postings);
        inventories = new_inventories;
        balance = new_balance;
    }

    Ok((postings, inventories, balance))
}

/// Case E: no cost spec, no amount — the elastic posting that absorbs
/// whatever is needed to zero out the running balance.
fn book_elastic(
    posting: &Posting,
    directive: &TransactionDirective,
    balance: &Inventory,
    inventories: &InventoryMap,
) -> Result<(Vec<BookedPosting>, InventoryMap, Inventory), BookingError> {
    let flag = posting.flag.unwrap_or(directive.flag);
    let emissions: Vec<Emission> = balance
        .positions()
        .into_iter()
        .map(|position| Emission {
            account: posting.account.clone(),
            flag,
            amount: position.amount.neg(),
            cost: None,
            meta: posting.meta.clone(),
        })
        .collect();

    Ok(do_book(inventories, balance, emissions))
}

/// Resolve a bare cost-spec date to a UTC instant, defaulting to midnight.
fn resolved_instant(date_spec: &DateSpec) -> DateTime<Utc> {
    use chrono::TimeZone;
    let naive = date_spec
        .time
        .map_or_else(|| date_spec.date.and_hms_opt(0, 0, 0).unwrap(), |t| date_spec.date.and_time(t));
    Utc.from_utc_datetime(&naive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{CostKind, SourceContext};
    use rust_decimal_macros::dec;

    fn open(account: &str) -> (InternedStr, AccountState) {
        (
            InternedStr::from(account),
            AccountState::Open {
                currencies: Vec::new(),
                meta: Metadata::new(),
            },
        )
    }

    fn directive(postings: Vec<Posting>) -> TransactionDirective {
        use chrono::TimeZone;
        TransactionDirective {
            date: Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
            flag: '*',
            payee: None,
            narration: "Test".into(),
            meta: Metadata::new(),
            postings,
            option_map: ledger_core::OptionMap::new(),
            source: SourceContext::new("test.ledger", 1),
        }
    }

    #[test]
    fn simple_posting_balances() {
        let mut accounts = AccountMap::new();
        let (k, v) = open("Assets:Cash");
        accounts.insert(k, v);
        let (k, v) = open("Expenses:Food");
        accounts.insert(k, v);

        let directive = directive(vec![
            Posting::new("Expenses:Food", Amount::new(dec!(50), "USD")),
            Posting::new("Assets:Cash", Amount::new(dec!(-50), "USD")),
        ]);

        let (txn, _inv) = book_transaction(&directive, &accounts, &InventoryMap::new()).unwrap();
        assert_eq!(txn.postings.len(), 2);
    }

    #[test]
    fn elastic_posting_absorbs_residual() {
        let mut accounts = AccountMap::new();
        let (k, v) = open("Assets:Cash");
        accounts.insert(k, v);
        let (k, v) = open("Expenses:Food");
        accounts.insert(k, v);

        let mut elastic = Posting::new("Assets:Cash", Amount::new(dec!(0), "USD"));
        elastic.amount = None;
        let directive = directive(vec![
            Posting::new("Expenses:Food", Amount::new(dec!(50), "USD")),
            elastic,
        ]);

        let (txn, _inv) = book_transaction(&directive, &accounts, &InventoryMap::new()).unwrap();
        let cash_leg = txn
            .postings
            .iter()
            .find(|p| p.account.as_str() == "Assets:Cash")
            .unwrap();
        assert_eq!(cash_leg.amount.number, dec!(-50));
    }

    #[test]
    fn unbalanced_transaction_errors() {
        let accounts = AccountMap::new();
        let directive = directive(vec![
            Posting::new("Expenses:Food", Amount::new(dec!(50), "USD")),
            Posting::new("Assets:Cash", Amount::new(dec!(-40), "USD")),
        ]);
        let err = book_transaction(&directive, &accounts, &InventoryMap::new()).unwrap_err();
        assert!(matches!(err, BookingError::TransactionUnbalanced { .. }));
    }

    #[test]
    fn augmentation_emits_trading_postings() {
        let accounts = AccountMap::new();
        let mut buy = Posting::new("Assets:Stock", Amount::new(dec!(10), "AAPL"));
        buy.cost_spec = Some(CostSpec {
            amounts: vec![Amount::new(dec!(150), "USD")],
            kind: Some(CostKind::PerUnit),
            ..CostSpec::default()
        });
        let cash = Posting::new("Assets:Cash", Amount::new(dec!(-1500), "USD"));
        let directive = directive(vec![buy, cash]);

        let (txn, _inv) = book_transaction(&directive, &accounts, &InventoryMap::new()).unwrap();
        assert!(txn
            .postings
            .iter()
            .any(|p| p.account.as_str() == "Trading:Default"));
    }
}
