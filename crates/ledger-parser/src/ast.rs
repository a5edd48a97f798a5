//! Syntax-level model: the pre-normalization counterparts of the booking-ready
//! types in `ledger-core` (§3A). Produced by [`crate::parser`], consumed by
//! the loader, which evaluates every [`AmountExpr`] and resolves every
//! [`ledger_core::DateSpec`] into a UTC instant.

use std::collections::BTreeMap;

use ledger_core::{CostKind, DateSpec, InternedStr};
use rust_decimal::Decimal;

use crate::span::SourceSpan;

/// An arithmetic expression tree over decimal literals, evaluated by the
/// loader into a concrete [`Decimal`] with no floating-point intermediate
/// values (§6).
#[derive(Debug, Clone, PartialEq)]
pub enum AmountExpr {
    /// A decimal literal.
    Literal(Decimal),
    /// Unary `-`.
    Neg(Box<AmountExpr>),
    /// `a + b`
    Add(Box<AmountExpr>, Box<AmountExpr>),
    /// `a - b`
    Sub(Box<AmountExpr>, Box<AmountExpr>),
    /// `a * b`
    Mul(Box<AmountExpr>, Box<AmountExpr>),
    /// `a / b`
    Div(Box<AmountExpr>, Box<AmountExpr>),
}

impl AmountExpr {
    /// Evaluate the expression tree to a single decimal value.
    #[must_use]
    pub fn eval(&self) -> Decimal {
        match self {
            Self::Literal(d) => *d,
            Self::Neg(a) => -a.eval(),
            Self::Add(a, b) => a.eval() + b.eval(),
            Self::Sub(a, b) => a.eval() - b.eval(),
            Self::Mul(a, b) => a.eval() * b.eval(),
            Self::Div(a, b) => a.eval() / b.eval(),
        }
    }
}

/// An amount as written in source: an unevaluated expression plus a currency.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxAmount {
    /// The quantity expression.
    pub expr: AmountExpr,
    /// The currency code.
    pub currency: InternedStr,
}

/// A metadata value as written in source.
#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxMetaValue {
    /// A bare string.
    String(String),
    /// An account reference.
    Account(InternedStr),
    /// A currency-tagged amount.
    Amount(SyntaxAmount),
    /// A bare decimal expression.
    Number(AmountExpr),
    /// A boolean flag.
    Bool(bool),
}

/// Source-syntax metadata, keyed by identifier.
pub type SyntaxMetadata = BTreeMap<String, SyntaxMetaValue>;

/// A cost specification as written in source: either an augmentation's
/// amounts or a reduction's filter fields (§3).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyntaxCostSpec {
    /// Per-unit or total amounts; empty for a reduction filter.
    pub amounts: Vec<SyntaxAmount>,
    /// Interpretation of `amounts`; `None` for a reduction filter.
    pub kind: Option<CostKind>,
    /// Reduction filter: allowed lot currencies.
    pub currencies: Vec<InternedStr>,
    /// Reduction filter: allowed lot date-specs.
    pub dates: Vec<DateSpec>,
    /// Reduction filter: allowed lot tags.
    pub tags: Vec<String>,
}

/// A posting as written in source.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxPosting {
    /// The account this posting affects.
    pub account: InternedStr,
    /// Optional per-posting flag, overriding the transaction's own.
    pub flag: Option<char>,
    /// The posting's amount, if stated.
    pub amount: Option<SyntaxAmount>,
    /// The posting's cost specification, if stated.
    pub cost_spec: Option<SyntaxCostSpec>,
    /// The posting's price annotation (`@`/`@@`), if stated.
    pub price: Option<SyntaxAmount>,
    /// Posting-level metadata.
    pub meta: SyntaxMetadata,
}

/// One parsed line-group (§3A), before include resolution, option-map
/// snapshotting, date normalization, and expression evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxDirective {
    /// `YYYY-MM-DD open ACCOUNT [CURRENCY[,CURRENCY...]]`
    Open {
        /// Raw date token.
        date: DateSpec,
        /// The account being opened.
        account: InternedStr,
        /// Allowed currencies; empty means unrestricted.
        currencies: Vec<InternedStr>,
        /// Directive metadata.
        meta: SyntaxMetadata,
        /// Source location of the directive's header line.
        span: SourceSpan,
    },
    /// `YYYY-MM-DD close ACCOUNT`
    Close {
        /// Raw date token.
        date: DateSpec,
        /// The account being closed.
        account: InternedStr,
        /// Directive metadata.
        meta: SyntaxMetadata,
        /// Source location of the directive's header line.
        span: SourceSpan,
    },
    /// `YYYY-MM-DD currency CURRENCY` (alias `commodity`)
    Currency {
        /// Raw date token.
        date: DateSpec,
        /// The currency code being declared.
        currency: InternedStr,
        /// Directive metadata.
        meta: SyntaxMetadata,
        /// Source location of the directive's header line.
        span: SourceSpan,
    },
    /// `YYYY-MM-DD balance ACCOUNT AMOUNT [~ TOLERANCE]`
    Balance {
        /// Raw date token.
        date: DateSpec,
        /// The account being asserted against.
        account: InternedStr,
        /// The expected amount.
        amount: SyntaxAmount,
        /// Optional tolerance expression.
        tolerance: Option<AmountExpr>,
        /// Directive metadata.
        meta: SyntaxMetadata,
        /// Source location of the directive's header line.
        span: SourceSpan,
    },
    /// `YYYY-MM-DD (txn|*|!) ["PAYEE"] "NARRATION"` plus indented postings.
    Transaction {
        /// Raw date token.
        date: DateSpec,
        /// Completion flag.
        flag: char,
        /// Optional payee.
        payee: Option<String>,
        /// Narration text.
        narration: String,
        /// Transaction-level metadata.
        meta: SyntaxMetadata,
        /// The transaction's postings, in file order.
        postings: Vec<SyntaxPosting>,
        /// Source location of the directive's header line.
        span: SourceSpan,
    },
    /// `option "NAME" "VALUE"`
    Option {
        /// The option key.
        key: String,
        /// The option value.
        value: String,
        /// Source location.
        span: SourceSpan,
    },
    /// `include "PATH"`
    Include {
        /// The included path, relative to the including file.
        path: String,
        /// Source location.
        span: SourceSpan,
    },
}

impl SyntaxDirective {
    /// The source location of this directive's header line.
    #[must_use]
    pub fn span(&self) -> &SourceSpan {
        match self {
            Self::Open { span, .. }
            | Self::Close { span, .. }
            | Self::Currency { span, .. }
            | Self::Balance { span, .. }
            | Self::Transaction { span, .. }
            | Self::Option { span, .. }
            | Self::Include { span, .. } => span,
        }
    }
}
