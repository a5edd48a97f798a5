//! Bridges the syntax-level model (`ledger_parser::ast`) to the booking-ready
//! model (`ledger_core::directive`): evaluating every `AmountExpr`, resolving
//! every `DateSpec` to a UTC instant, and stamping each directive with the
//! option-map snapshot active when it was read (§4.9).

use chrono::{DateTime, FixedOffset, NaiveTime, TimeZone, Utc};
use ledger_core::{
    Amount, BalanceDirective, CloseDirective, CostSpec, CurrencyDirective, Metadata, MetaValue,
    OpenDirective, OptionMap, Posting, SourceContext, TransactionDirective,
};
use ledger_parser::{
    AmountExpr, SyntaxAmount, SyntaxCostSpec, SyntaxDirective, SyntaxMetaValue, SyntaxMetadata,
    SyntaxPosting,
};

use crate::LoadError;

/// Resolve a `DateSpec` to a UTC instant.
///
/// A bare date (no time of day) is always midnight UTC. A date with a time
/// but no timezone suffix uses `default_tz`; an explicit suffix overrides it.
pub fn normalize_date(
    spec: &ledger_core::DateSpec,
    default_tz: &str,
) -> Result<DateTime<Utc>, LoadError> {
    let Some(time) = spec.time else {
        return Ok(Utc.from_utc_datetime(&spec.date.and_time(NaiveTime::MIN)));
    };
    let tz_name = spec.timezone.as_deref().unwrap_or(default_tz);
    let offset = parse_offset(tz_name)?;
    let naive = spec.date.and_time(time);
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| LoadError::BadTimezone {
            timezone: tz_name.to_string(),
        })
}

/// Parse a timezone suffix into a fixed UTC offset.
///
/// Accepts `UTC`, `Z`, and `+HH:MM`/`-HH:MM`/`+HHMM`/`-HHMM` forms. There is
/// no IANA tzdata dependency here; named zones (`America/New_York`) are
/// rejected.
fn parse_offset(tz: &str) -> Result<FixedOffset, LoadError> {
    if tz.eq_ignore_ascii_case("UTC") || tz == "Z" {
        return Ok(FixedOffset::east_opt(0).expect("zero offset is always valid"));
    }

    let bad = || LoadError::BadTimezone {
        timezone: tz.to_string(),
    };

    let (sign, rest) = match tz.as_bytes().first() {
        Some(b'+') => (1, &tz[1..]),
        Some(b'-') => (-1, &tz[1..]),
        _ => return Err(bad()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    let hours: i32 = digits[0..2].parse().map_err(|_| bad())?;
    let minutes: i32 = digits[2..4].parse().map_err(|_| bad())?;
    let total = sign * (hours * 3600 + minutes * 60);
    FixedOffset::east_opt(total).ok_or_else(bad)
}

fn to_amount(sa: &SyntaxAmount) -> Amount {
    Amount::new(sa.expr.eval(), sa.currency.clone())
}

fn to_meta_value(v: &SyntaxMetaValue) -> MetaValue {
    match v {
        SyntaxMetaValue::String(s) => MetaValue::String(s.clone()),
        SyntaxMetaValue::Account(a) => MetaValue::Account(a.clone()),
        SyntaxMetaValue::Amount(a) => MetaValue::Amount(to_amount(a)),
        SyntaxMetaValue::Number(expr) => MetaValue::Number(expr.eval()),
        SyntaxMetaValue::Bool(b) => MetaValue::Bool(*b),
    }
}

fn to_metadata(meta: &SyntaxMetadata) -> Metadata {
    meta.iter().map(|(k, v)| (k.clone(), to_meta_value(v))).collect()
}

fn to_cost_spec(spec: &SyntaxCostSpec) -> CostSpec {
    CostSpec {
        amounts: spec.amounts.iter().map(to_amount).collect(),
        kind: spec.kind,
        currencies: spec.currencies.clone(),
        dates: spec.dates.clone(),
        tags: spec.tags.clone(),
    }
}

fn to_posting(posting: &SyntaxPosting) -> Posting {
    Posting {
        account: posting.account.clone(),
        flag: posting.flag,
        amount: posting.amount.as_ref().map(to_amount),
        cost_spec: posting.cost_spec.as_ref().map(to_cost_spec),
        price: posting.price.as_ref().map(to_amount),
        meta: to_metadata(&posting.meta),
    }
}

/// Evaluate and date-normalize one parsed directive into its booking-ready
/// counterpart, stamping it with the option-map snapshot as it stood after
/// processing every `option` directive up to and including this line.
///
/// `option` and `include` directives never reach here: the loader consumes
/// them directly while walking the stream.
pub fn lower(
    directive: &SyntaxDirective,
    file: &str,
    default_tz: &str,
    option_map: &OptionMap,
) -> Result<ledger_core::Directive, LoadError> {
    let span = directive.span();
    let source = SourceContext::new(file, span.row);

    Ok(match directive {
        SyntaxDirective::Open {
            date,
            account,
            currencies,
            meta,
            ..
        } => ledger_core::Directive::Open(OpenDirective {
            date: normalize_date(date, default_tz)?,
            account: account.clone(),
            currencies: currencies.clone(),
            meta: to_metadata(meta),
            option_map: option_map.clone(),
            source,
        }),
        SyntaxDirective::Close { date, account, meta, .. } => {
            ledger_core::Directive::Close(CloseDirective {
                date: normalize_date(date, default_tz)?,
                account: account.clone(),
                meta: to_metadata(meta),
                option_map: option_map.clone(),
                source,
            })
        }
        SyntaxDirective::Currency { date, currency, meta, .. } => {
            ledger_core::Directive::Currency(CurrencyDirective {
                date: normalize_date(date, default_tz)?,
                currency: currency.clone(),
                meta: to_metadata(meta),
                option_map: option_map.clone(),
                source,
            })
        }
        SyntaxDirective::Balance {
            date,
            account,
            amount,
            tolerance,
            meta,
            ..
        } => ledger_core::Directive::Balance(BalanceDirective {
            date: normalize_date(date, default_tz)?,
            account: account.clone(),
            amount: to_amount(amount),
            tolerance: tolerance.as_ref().map(AmountExpr::eval),
            meta: to_metadata(meta),
            option_map: option_map.clone(),
            source,
        }),
        SyntaxDirective::Transaction {
            date,
            flag,
            payee,
            narration,
            meta,
            postings,
            ..
        } => ledger_core::Directive::Transaction(TransactionDirective {
            date: normalize_date(date, default_tz)?,
            flag: *flag,
            payee: payee.clone(),
            narration: narration.clone(),
            meta: to_metadata(meta),
            postings: postings.iter().map(to_posting).collect(),
            option_map: option_map.clone(),
            source,
        }),
        SyntaxDirective::Option { .. } | SyntaxDirective::Include { .. } => {
            unreachable!("option and include directives are handled by the loader directly")
        }
    })
}
