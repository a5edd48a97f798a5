//! Lexer and recursive-descent parser for plain-text ledger sources.
//!
//! This crate turns source text into the syntax-level directive model
//! (§3A): an [`ast::SyntaxDirective`] per top-level directive, each carrying
//! unevaluated [`ast::AmountExpr`] trees and raw [`ledger_core::DateSpec`]
//! values. The loader crate is responsible for include resolution, option
//! resolution, expression evaluation, and date normalization into the
//! booking-ready [`ledger_core::Directive`] model.
//!
//! # Error recovery
//!
//! Both the lexer and the parser recover at line boundaries: a malformed
//! line or directive contributes one [`ParseError`] and is skipped, but
//! every other line or directive in the file still parses normally.
//!
//! # Example
//!
//! ```
//! use ledger_parser::parse;
//!
//! let source = r#"
//! 2024-01-15 * "Coffee Shop" "Morning coffee"
//!   Expenses:Food:Coffee  5.00 USD
//!   Assets:Cash
//! "#;
//!
//! let (directives, errors) = parse("ledger.txt", source);
//! assert!(errors.is_empty());
//! assert_eq!(directives.len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod ast;
mod error;
mod lexer;
mod parser;
mod span;

pub use ast::{
    AmountExpr, SyntaxAmount, SyntaxCostSpec, SyntaxDirective, SyntaxMetaValue, SyntaxMetadata,
    SyntaxPosting,
};
pub use error::ParseError;
pub use lexer::{lex, Line, Token};
pub use parser::parse;
pub use span::SourceSpan;
