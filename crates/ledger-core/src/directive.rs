//! The directive model: metadata values, source context, the option map, and
//! the six directive variants a loaded ledger is built from.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::cost::CostSpec;
use crate::intern::InternedStr;

/// A metadata value attached to a directive or posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetaValue {
    /// A bare string.
    String(String),
    /// An account reference (used for `trading-account` resolution, §4.4/§4.6).
    Account(InternedStr),
    /// A currency-tagged amount.
    Amount(Amount),
    /// A bare decimal number.
    Number(Decimal),
    /// A boolean flag.
    Bool(bool),
}

impl MetaValue {
    /// Borrow this value as a string, if it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow this value as an account reference, if it is one.
    #[must_use]
    pub fn as_account(&self) -> Option<&InternedStr> {
        match self {
            Self::Account(a) => Some(a),
            _ => None,
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "\"{s}\""),
            Self::Account(a) => write!(f, "{a}"),
            Self::Amount(a) => write!(f, "{a}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// A directive's or posting's metadata, keyed by identifier. Ordered so that
/// display and serialization are deterministic.
pub type Metadata = BTreeMap<String, MetaValue>;

/// The set of `option` key/value pairs active when a directive was loaded,
/// frozen at load time (§4.6, §9 "option-map snapshotting"). Never mutated
/// after a directive is built; the loader accumulates a single mutable
/// working copy and clones it into each directive as it goes.
pub type OptionMap = BTreeMap<String, String>;

/// Where a directive or token came from: which file, which line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceContext {
    /// Path of the file the directive was parsed from.
    pub file: String,
    /// 1-based line number within that file.
    pub row: usize,
}

impl SourceContext {
    /// Construct a source context.
    #[must_use]
    pub fn new(file: impl Into<String>, row: usize) -> Self {
        Self {
            file: file.into(),
            row,
        }
    }
}

impl fmt::Display for SourceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.row)
    }
}

/// A posting as written in source: an account, an optional flag, an optional
/// amount, an optional cost spec, and metadata. At most one posting per
/// transaction may have both `amount` and `cost_spec` absent — the elastic
/// posting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Posting {
    /// The account this posting affects.
    pub account: InternedStr,
    /// Optional per-posting flag (`*`/`!`), overriding the transaction's own.
    pub flag: Option<char>,
    /// The posting's amount, if stated.
    pub amount: Option<Amount>,
    /// The posting's cost specification, if stated.
    pub cost_spec: Option<CostSpec>,
    /// The posting's price annotation (`@`/`@@`), if stated. Not interpreted
    /// by the booking engine; carried through for reporting.
    pub price: Option<Amount>,
    /// Posting-level metadata.
    pub meta: Metadata,
}

impl Posting {
    /// Construct a posting with just an account and amount.
    #[must_use]
    pub fn new(account: impl Into<InternedStr>, amount: Amount) -> Self {
        Self {
            account: account.into(),
            amount: Some(amount),
            ..Self::default()
        }
    }

    /// `true` if this is the elastic posting: no amount and no cost spec.
    #[must_use]
    pub fn is_elastic(&self) -> bool {
        self.amount.is_none() && self.cost_spec.is_none()
    }
}

/// An `open` directive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenDirective {
    /// Normalized UTC instant.
    pub date: DateTime<Utc>,
    /// The account being opened.
    pub account: InternedStr,
    /// Allowed currencies; empty means "any currency allowed".
    pub currencies: Vec<InternedStr>,
    /// Directive metadata.
    pub meta: Metadata,
    /// Option map active at this point in the file.
    pub option_map: OptionMap,
    /// Source context.
    pub source: SourceContext,
}

/// A `close` directive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseDirective {
    /// Normalized UTC instant.
    pub date: DateTime<Utc>,
    /// The account being closed.
    pub account: InternedStr,
    /// Directive metadata.
    pub meta: Metadata,
    /// Option map active at this point in the file.
    pub option_map: OptionMap,
    /// Source context.
    pub source: SourceContext,
}

/// A `currency` (or `commodity`) directive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyDirective {
    /// Normalized UTC instant.
    pub date: DateTime<Utc>,
    /// The currency code being declared.
    pub currency: InternedStr,
    /// Directive metadata.
    pub meta: Metadata,
    /// Option map active at this point in the file.
    pub option_map: OptionMap,
    /// Source context.
    pub source: SourceContext,
}

/// A `balance` assertion directive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceDirective {
    /// Normalized UTC instant.
    pub date: DateTime<Utc>,
    /// The account being asserted against.
    pub account: InternedStr,
    /// The expected amount.
    pub amount: Amount,
    /// Maximum allowed absolute delta; defaults to zero.
    pub tolerance: Option<Decimal>,
    /// Directive metadata.
    pub meta: Metadata,
    /// Option map active at this point in the file.
    pub option_map: OptionMap,
    /// Source context.
    pub source: SourceContext,
}

/// A transaction directive as written in source, before booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDirective {
    /// Normalized UTC instant.
    pub date: DateTime<Utc>,
    /// Completion flag: `*` completed, `!` pending, or the `txn` keyword's
    /// implied flag.
    pub flag: char,
    /// Optional payee.
    pub payee: Option<String>,
    /// Narration text.
    pub narration: String,
    /// Directive (transaction-level) metadata.
    pub meta: Metadata,
    /// The transaction's postings, in file order.
    pub postings: Vec<Posting>,
    /// Option map active at this point in the file.
    pub option_map: OptionMap,
    /// Source context.
    pub source: SourceContext,
}

/// An `option` directive. Consumed by the loader to build the running option
/// map; retained here only as a record (the booking driver does not act on
/// it directly — by the time a later directive is built, its effect is
/// already baked into that directive's `option_map` snapshot).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionDirective {
    /// Normalized UTC instant (the line's position in the file, not
    /// semantically meaningful beyond ordering).
    pub date: DateTime<Utc>,
    /// Option name.
    pub name: String,
    /// Option value.
    pub value: String,
    /// Source context.
    pub source: SourceContext,
}

/// A loaded directive: one of the six variants the booking engine consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Directive {
    /// See [`OpenDirective`].
    Open(OpenDirective),
    /// See [`CloseDirective`].
    Close(CloseDirective),
    /// See [`CurrencyDirective`].
    Currency(CurrencyDirective),
    /// See [`BalanceDirective`].
    Balance(BalanceDirective),
    /// See [`TransactionDirective`].
    Transaction(TransactionDirective),
    /// See [`OptionDirective`].
    Option(OptionDirective),
}

impl Directive {
    /// The directive's normalized UTC instant.
    #[must_use]
    pub fn date(&self) -> DateTime<Utc> {
        match self {
            Self::Open(d) => d.date,
            Self::Close(d) => d.date,
            Self::Currency(d) => d.date,
            Self::Balance(d) => d.date,
            Self::Transaction(d) => d.date,
            Self::Option(d) => d.date,
        }
    }

    /// The directive's source context.
    #[must_use]
    pub fn source(&self) -> &SourceContext {
        match self {
            Self::Open(d) => &d.source,
            Self::Close(d) => &d.source,
            Self::Currency(d) => &d.source,
            Self::Balance(d) => &d.source,
            Self::Transaction(d) => &d.source,
            Self::Option(d) => &d.source,
        }
    }
}
