//! `Cost`: the acquisition basis of a lot, and `CostSpec`: how source syntax
//! describes or filters one.
//!
//! A [`Cost`] can carry more than one per-unit amount (multi-currency lots
//! are allowed, e.g. an LP token priced in two assets simultaneously). Its
//! identity — what makes two lots "the same lot" for aggregation purposes —
//! is structural over the *set* of (value, currency) pairs and the lot's UTC
//! instant; the raw [`DateSpec`] and tag list are retained for matching and
//! display but deliberately excluded from equality and hashing.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::intern::InternedStr;

/// The raw, as-written form of a date token: a calendar date plus an optional
/// time and an optional timezone name.
///
/// Retained alongside the normalized UTC instant because reduction filters
/// match against the *source* form (§4.4's date-spec structural match), not
/// the normalized instant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateSpec {
    /// Calendar date.
    pub date: NaiveDate,
    /// Time of day, if the source specified one.
    pub time: Option<NaiveTime>,
    /// Timezone name, if the source specified one (e.g. `"America/New_York"`).
    pub timezone: Option<String>,
}

impl DateSpec {
    /// Construct a bare-date spec (no time, no timezone).
    #[must_use]
    pub fn date_only(date: NaiveDate) -> Self {
        Self {
            date,
            time: None,
            timezone: None,
        }
    }

    /// Structural match used by reduction cost-spec filters (§4.4):
    /// `self` (a filter entry) matches `candidate` (a lot's spec) iff the
    /// dates are equal and every field `self` specifies agrees with `candidate`.
    #[must_use]
    pub fn matches(&self, candidate: &Self) -> bool {
        self.date == candidate.date
            && self.time.is_none_or(|t| Some(t) == candidate.time)
            && self
                .timezone
                .as_ref()
                .is_none_or(|tz| Some(tz) == candidate.timezone.as_ref())
    }
}

impl fmt::Display for DateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date)?;
        if let Some(t) = self.time {
            write!(f, "T{t}")?;
        }
        if let Some(tz) = &self.timezone {
            write!(f, "{tz}")?;
        }
        Ok(())
    }
}

/// Whether a `CostSpec`'s amounts describe a per-unit price or a lot total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CostKind {
    /// Amounts are per-unit prices (`{150 CHF}` for a single unit).
    PerUnit,
    /// Amounts are the lot's total cost (`{{300 CHF}}`), divided by the
    /// posting's unit count to get a per-unit price.
    Total,
}

/// The acquisition cost of a lot: one or more per-unit amounts (multi-currency
/// lots are allowed), the lot's UTC instant, the raw date spec it was parsed
/// from, and an ordered list of lot tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cost {
    /// Per-unit amounts, one per currency the lot is priced in. Never empty.
    pub amounts: Vec<Amount>,
    /// Normalized UTC instant of the lot.
    pub date: DateTime<Utc>,
    /// Raw parsed date form, used for reduction-filter structural matching.
    pub date_spec: DateSpec,
    /// Ordered lot tags.
    pub tags: Vec<String>,
}

impl Cost {
    /// Construct a cost from one per-unit amount.
    #[must_use]
    pub fn new(amount: Amount, date: DateTime<Utc>, date_spec: DateSpec) -> Self {
        Self {
            amounts: vec![amount],
            date,
            date_spec,
            tags: Vec::new(),
        }
    }

    /// Builder: attach lot tags.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Canonical structural key: the lot instant plus the amounts as a
    /// currency-sorted multiset of values. Two costs with the same key are
    /// "the same lot" for aggregation purposes.
    fn structural_key(&self) -> (DateTime<Utc>, BTreeMap<InternedStr, Vec<rust_decimal::Decimal>>) {
        let mut by_currency: BTreeMap<InternedStr, Vec<rust_decimal::Decimal>> = BTreeMap::new();
        for amount in &self.amounts {
            by_currency
                .entry(amount.currency.clone())
                .or_default()
                .push(amount.number);
        }
        for values in by_currency.values_mut() {
            values.sort();
        }
        (self.date, by_currency)
    }

    /// Whether any per-unit amount matches `currency`.
    #[must_use]
    pub fn has_currency(&self, currency: &str) -> bool {
        self.amounts.iter().any(|a| a.currency == currency)
    }

    /// Whether any lot tag is present in `wanted`.
    #[must_use]
    pub fn has_any_tag(&self, wanted: &[String]) -> bool {
        self.tags.iter().any(|t| wanted.contains(t))
    }
}

impl PartialEq for Cost {
    fn eq(&self, other: &Self) -> bool {
        self.structural_key() == other.structural_key()
    }
}

impl Eq for Cost {}

impl std::hash::Hash for Cost {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        let (date, by_currency) = self.structural_key();
        date.hash(state);
        for (currency, values) in by_currency {
            currency.hash(state);
            values.hash(state);
        }
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, amount) in self.amounts.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{amount}")?;
        }
        write!(f, ", {}}}", self.date_spec)
    }
}

/// Source-syntax description of a cost: either the cost of an augmentation
/// (amounts supplied) or a filter set narrowing which lots a reduction may
/// consume (amounts empty, filter fields populated).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostSpec {
    /// Per-unit or total amounts, per `kind`. Empty for a reduction filter.
    pub amounts: Vec<Amount>,
    /// Interpretation of `amounts`. Irrelevant (and unused) when `amounts` is empty.
    pub kind: Option<CostKind>,
    /// Reduction filter: currencies a matching lot's cost may be priced in.
    /// Empty means "any currency" (wildcard). Must be empty for an augmentation.
    pub currencies: Vec<InternedStr>,
    /// Reduction filter: date specs a matching lot's instant may equal.
    /// Empty means "any date" (wildcard). An augmentation may supply at most one.
    pub dates: Vec<DateSpec>,
    /// Reduction filter: lot tags a matching lot must carry at least one of.
    /// Empty means "any tags" (wildcard).
    pub tags: Vec<String>,
}

impl CostSpec {
    /// `true` if this spec carries amounts, i.e. describes an augmentation
    /// rather than a reduction filter (§4.4 Case A vs Case B).
    #[must_use]
    pub fn is_augmentation(&self) -> bool {
        !self.amounts.is_empty()
    }

    /// Resolve this augmentation spec's amounts into per-unit `Cost` amounts,
    /// given the signed unit count of the posting being costed.
    ///
    /// `PerUnit` amounts are kept as-is; `Total` amounts are divided by
    /// `|units|`.
    #[must_use]
    pub fn per_unit_amounts(&self, units: rust_decimal::Decimal) -> Vec<Amount> {
        match self.kind {
            Some(CostKind::Total) => self
                .amounts
                .iter()
                .map(|a| a.divide(units.abs()))
                .collect(),
            _ => self.amounts.clone(),
        }
    }

    /// Resolve this augmentation spec's amounts into the *total* cost
    /// amounts booked at the trading account, given the signed unit count.
    ///
    /// `PerUnit` amounts are multiplied by `|units|`; `Total` amounts are
    /// kept as-is.
    #[must_use]
    pub fn total_amounts(&self, units: rust_decimal::Decimal) -> Vec<Amount> {
        match self.kind {
            Some(CostKind::Total) => self.amounts.clone(),
            _ => self.amounts.iter().map(|a| a.scale(units.abs())).collect(),
        }
    }

    /// Whether a lot's cost satisfies every non-empty filter on this spec.
    #[must_use]
    pub fn matches(&self, cost: &Cost) -> bool {
        let currency_ok =
            self.currencies.is_empty() || self.currencies.iter().any(|c| cost.has_currency(c));
        let tags_ok = self.tags.is_empty() || cost.has_any_tag(&self.tags);
        let date_ok =
            self.dates.is_empty() || self.dates.iter().any(|d| d.matches(&cost.date_spec));
        currency_ok && tags_ok && date_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn instant(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn equality_ignores_date_spec_and_tags() {
        let a = Cost::new(
            Amount::new(dec!(150), "CHF"),
            instant(2025, 4, 1),
            DateSpec::date_only(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()),
        )
        .with_tags(vec!["lotA".into()]);
        let b = Cost::new(
            Amount::new(dec!(150), "CHF"),
            instant(2025, 4, 1),
            DateSpec {
                date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
                time: Some(NaiveTime::from_hms_opt(9, 30, 0).unwrap()),
                timezone: Some("UTC".into()),
            },
        )
        .with_tags(vec!["lotB".into()]);

        assert_eq!(a, b);
    }

    #[test]
    fn equality_treats_amounts_as_a_set() {
        let amounts_order_1 = vec![Amount::new(dec!(1), "USD"), Amount::new(dec!(2), "EUR")];
        let amounts_order_2 = vec![Amount::new(dec!(2), "EUR"), Amount::new(dec!(1), "USD")];
        let spec = DateSpec::date_only(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        let a = Cost {
            amounts: amounts_order_1,
            date: instant(2025, 1, 1),
            date_spec: spec.clone(),
            tags: vec![],
        };
        let b = Cost {
            amounts: amounts_order_2,
            date: instant(2025, 1, 1),
            date_spec: spec,
            tags: vec![],
        };
        assert_eq!(a, b);
    }

    #[test]
    fn per_unit_and_total_resolve_symmetrically() {
        let per_unit = CostSpec {
            amounts: vec![Amount::new(dec!(150), "CHF")],
            kind: Some(CostKind::PerUnit),
            ..Default::default()
        };
        assert_eq!(per_unit.per_unit_amounts(dec!(2))[0].number, dec!(150));
        assert_eq!(per_unit.total_amounts(dec!(2))[0].number, dec!(300));

        let total = CostSpec {
            amounts: vec![Amount::new(dec!(300), "CHF")],
            kind: Some(CostKind::Total),
            ..Default::default()
        };
        assert_eq!(total.per_unit_amounts(dec!(2))[0].number, dec!(150));
        assert_eq!(total.total_amounts(dec!(2))[0].number, dec!(300));
    }

    #[test]
    fn date_spec_structural_match_is_partial() {
        let filter = DateSpec::date_only(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
        let candidate = DateSpec {
            date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            time: Some(NaiveTime::from_hms_opt(9, 0, 0).unwrap()),
            timezone: Some("UTC".into()),
        };
        assert!(filter.matches(&candidate));

        let mismatched = DateSpec::date_only(NaiveDate::from_ymd_opt(2025, 4, 2).unwrap());
        assert!(!mismatched.matches(&candidate));
    }
}
