//! Hand-written, allocation-light lexer.
//!
//! Tokenizes one physical line at a time: leading indentation is measured
//! and returned alongside the token list rather than represented as a token,
//! since every line-group in the grammar (§4.8) is either a top-level
//! directive or an indented posting/metadata line. `;` and `#` start a
//! comment that runs to end of line; blank and comment-only lines tokenize
//! to `None`.

use rust_decimal::Decimal;
use std::str::FromStr;

use ledger_core::InternedStr;

use crate::error::ParseError;
use crate::span::SourceSpan;

/// One lexical token, with no payload-free punctuation duplicated: `*` and
/// `!` are literal tokens usable both as a transaction flag (header line,
/// first token) and an arithmetic/pending marker depending on parser
/// context.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A bare ISO date, optionally with time and/or a timezone suffix.
    Date(ledger_core::DateSpec),
    /// A decimal literal.
    Number(Decimal),
    /// A double-quoted string (payee, narration, option key/value, path).
    Str(String),
    /// An account path (`Assets:Cash`, ...).
    Account(InternedStr),
    /// A currency/commodity code.
    Currency(InternedStr),
    /// A metadata key, lexed together with its trailing `:`.
    MetaKey(String),
    /// `txn`
    Txn,
    /// `open`
    Open,
    /// `close`
    Close,
    /// `currency` or `commodity`
    CurrencyKw,
    /// `balance`
    Balance,
    /// `option`
    OptionKw,
    /// `include`
    Include,
    /// `*`
    Star,
    /// `!`
    Bang,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `{{`
    LDoubleBrace,
    /// `}}`
    RDoubleBrace,
    /// `@`
    At,
    /// `@@`
    AtAt,
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// `~`
    Tilde,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `/`
    Slash,
    /// `(`
    LParen,
    /// `)`
    RParen,
}

/// A tokenized line: its indentation width and the tokens found, each
/// paired with the 1-based column it started at.
#[derive(Debug)]
pub struct Line {
    /// 1-based source row.
    pub row: usize,
    /// Count of leading space characters.
    pub indent: usize,
    /// Tokens in order, with source columns.
    pub tokens: Vec<(Token, usize)>,
}

/// Tokenize a whole file into its non-blank, non-comment-only lines.
///
/// A line that fails to lex is dropped and its error recorded; every other
/// line still lexes normally, so one malformed line doesn't prevent the rest
/// of the file from being read.
pub fn lex(file: &str, source: &str) -> (Vec<Line>, Vec<ParseError>) {
    let mut lines = Vec::new();
    let mut errors = Vec::new();

    for (idx, raw_line) in source.lines().enumerate() {
        let row = idx + 1;
        match lex_line(file, row, raw_line) {
            Ok(Some(line)) => lines.push(line),
            Ok(None) => {}
            Err(e) => errors.push(e),
        }
    }

    (lines, errors)
}

fn lex_line(file: &str, row: usize, raw_line: &str) -> Result<Option<Line>, ParseError> {
    let indent = raw_line.len() - raw_line.trim_start_matches(' ').len();
    let body = &raw_line[indent..];
    let body = strip_comment(body);
    if body.trim().is_empty() {
        return Ok(None);
    }

    let mut tokens = Vec::new();
    let bytes = body.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        if c == ' ' || c == '\t' {
            i += 1;
            continue;
        }
        let column = indent + i + 1;

        if c == '"' {
            let (text, consumed) = scan_string(&body[i..]);
            tokens.push((Token::Str(text), column));
            i += consumed;
            continue;
        }

        if c.is_ascii_digit() && looks_like_date(&body[i..]) {
            let (spec, consumed) = scan_date(&body[i..])
                .map_err(|msg| ParseError::new(SourceSpan::new(file, row, column), msg))?;
            tokens.push((Token::Date(spec), column));
            i += consumed;
            continue;
        }

        if c.is_ascii_digit() {
            let (n, consumed) = scan_number(&body[i..]);
            tokens.push((
                Token::Number(Decimal::from_str(&n).map_err(|e| {
                    ParseError::new(SourceSpan::new(file, row, column), format!("bad number: {e}"))
                })?),
                column,
            ));
            i += consumed;
            continue;
        }

        if c.is_ascii_uppercase() {
            let (word, consumed) = scan_word(&body[i..]);
            if word.contains(':') {
                tokens.push((Token::Account(InternedStr::from(word.as_str())), column));
            } else {
                tokens.push((Token::Currency(InternedStr::from(word.as_str())), column));
            }
            i += consumed;
            continue;
        }

        if c.is_ascii_lowercase() {
            let (word, consumed) = scan_ident(&body[i..]);
            let rest = &body[i + consumed..];
            if rest.starts_with(':') {
                tokens.push((Token::MetaKey(word), column));
                i += consumed + 1;
            } else {
                tokens.push((
                    keyword(&word).ok_or_else(|| {
                        ParseError::new(
                            SourceSpan::new(file, row, column),
                            format!("unrecognized word '{word}'"),
                        )
                    })?,
                    column,
                ));
                i += consumed;
            }
            continue;
        }

        let (tok, consumed) = match &body[i..] {
            s if s.starts_with("{{") => (Token::LDoubleBrace, 2),
            s if s.starts_with("}}") => (Token::RDoubleBrace, 2),
            s if s.starts_with("@@") => (Token::AtAt, 2),
            s if s.starts_with('{') => (Token::LBrace, 1),
            s if s.starts_with('}') => (Token::RBrace, 1),
            s if s.starts_with('@') => (Token::At, 1),
            s if s.starts_with(':') => (Token::Colon, 1),
            s if s.starts_with(',') => (Token::Comma, 1),
            s if s.starts_with('~') => (Token::Tilde, 1),
            s if s.starts_with('+') => (Token::Plus, 1),
            s if s.starts_with('-') => (Token::Minus, 1),
            s if s.starts_with('*') => (Token::Star, 1),
            s if s.starts_with('!') => (Token::Bang, 1),
            s if s.starts_with('/') => (Token::Slash, 1),
            s if s.starts_with('(') => (Token::LParen, 1),
            s if s.starts_with(')') => (Token::RParen, 1),
            _ => {
                return Err(ParseError::new(
                    SourceSpan::new(file, row, column),
                    format!("unexpected character '{c}'"),
                ))
            }
        };
        tokens.push((tok, column));
        i += consumed;
    }

    Ok(Some(Line { row, indent, tokens }))
}

fn strip_comment(body: &str) -> &str {
    let mut in_string = false;
    for (i, c) in body.char_indices() {
        match c {
            '"' => in_string = !in_string,
            ';' | '#' if !in_string => return &body[..i],
            _ => {}
        }
    }
    body
}

fn scan_string(s: &str) -> (String, usize) {
    let mut out = String::new();
    let mut chars = s.char_indices().skip(1);
    let mut end = s.len();
    let mut escaped = false;
    for (i, c) in chars.by_ref() {
        if escaped {
            out.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => {
                end = i + 1;
                break;
            }
            other => out.push(other),
        }
    }
    (out, end)
}

fn looks_like_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 10
        && bytes[0..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[5..7].iter().all(u8::is_ascii_digit)
        && bytes[7] == b'-'
        && bytes[8..10].iter().all(u8::is_ascii_digit)
}

fn scan_date(s: &str) -> Result<(ledger_core::DateSpec, usize), String> {
    use chrono::{NaiveDate, NaiveTime};

    let date = NaiveDate::from_ymd_opt(
        s[0..4].parse().map_err(|_| "bad year".to_string())?,
        s[5..7].parse().map_err(|_| "bad month".to_string())?,
        s[8..10].parse().map_err(|_| "bad day".to_string())?,
    )
    .ok_or_else(|| "invalid calendar date".to_string())?;

    let mut consumed = 10;
    let mut time = None;
    let mut timezone = None;

    if s[consumed..].starts_with('T') && s.len() >= consumed + 6 {
        let rest = &s[consumed + 1..];
        let hh = &rest[0..2];
        let mm = &rest[3..5];
        let (ss, time_len) = if rest.len() >= 8 && rest.as_bytes()[5] == b':' {
            (&rest[6..8], 8)
        } else {
            ("00", 5)
        };
        time = Some(
            NaiveTime::from_hms_opt(
                hh.parse().map_err(|_| "bad hour".to_string())?,
                mm.parse().map_err(|_| "bad minute".to_string())?,
                ss.parse().map_err(|_| "bad second".to_string())?,
            )
            .ok_or_else(|| "invalid time of day".to_string())?,
        );
        consumed += 1 + time_len;

        let tz_rest = &rest[time_len..];
        let tz_len = tz_rest
            .find(|c: char| c.is_whitespace() || ",;#".contains(c))
            .unwrap_or(tz_rest.len());
        if tz_len > 0 {
            timezone = Some(tz_rest[..tz_len].to_string());
            consumed += tz_len;
        }
    }

    Ok((
        ledger_core::DateSpec {
            date,
            time,
            timezone,
        },
        consumed,
    ))
}

fn scan_number(s: &str) -> (String, usize) {
    let mut out = String::new();
    let mut i = 0;
    let bytes = s.as_bytes();
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_ascii_digit() {
            out.push(c);
            i += 1;
        } else if c == ',' && i + 1 < bytes.len() && (bytes[i + 1] as char).is_ascii_digit() {
            i += 1;
        } else if c == '.' && i + 1 < bytes.len() && (bytes[i + 1] as char).is_ascii_digit() {
            out.push('.');
            i += 1;
        } else {
            break;
        }
    }
    (out, i)
}

fn scan_word(s: &str) -> (String, usize) {
    let end = s
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == ':' || c == '-' || c == '.' || c == '_' || c == '\''))
        .unwrap_or(s.len());
    (s[..end].to_string(), end)
}

fn scan_ident(s: &str) -> (String, usize) {
    let end = s
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(s.len());
    (s[..end].to_string(), end)
}

fn keyword(word: &str) -> Option<Token> {
    match word {
        "txn" => Some(Token::Txn),
        "open" => Some(Token::Open),
        "close" => Some(Token::Close),
        "currency" | "commodity" => Some(Token::CurrencyKw),
        "balance" => Some(Token::Balance),
        "option" => Some(Token::OptionKw),
        "include" => Some(Token::Include),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens_for(line: &str) -> Vec<Token> {
        lex_line("t.ledger", 1, line)
            .unwrap()
            .unwrap()
            .tokens
            .into_iter()
            .map(|(t, _)| t)
            .collect()
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert!(lex_line("t.ledger", 1, "   ").unwrap().is_none());
        assert!(lex_line("t.ledger", 1, "; a comment").unwrap().is_none());
        assert!(lex_line("t.ledger", 1, "# also a comment").unwrap().is_none());
    }

    #[test]
    fn lexes_an_open_directive() {
        let toks = tokens_for("2024-01-01 open Assets:Cash USD,EUR");
        assert!(matches!(toks[0], Token::Date(_)));
        assert_eq!(toks[1], Token::Open);
        assert!(matches!(toks[2], Token::Account(_)));
        assert!(matches!(toks[3], Token::Currency(_)));
        assert_eq!(toks[4], Token::Comma);
        assert!(matches!(toks[5], Token::Currency(_)));
    }

    #[test]
    fn lexes_a_transaction_header() {
        let toks = tokens_for(r#"2024-01-15 * "Cafe" "Coffee""#);
        assert_eq!(toks[1], Token::Star);
        assert_eq!(toks[2], Token::Str("Cafe".into()));
        assert_eq!(toks[3], Token::Str("Coffee".into()));
    }

    #[test]
    fn lexes_a_posting_with_cost_and_price() {
        let toks = tokens_for("Assets:Stock 10 AAPL {150.00 USD} @ 155.00 USD");
        assert!(matches!(toks[0], Token::Account(_)));
        assert_eq!(toks[1], Token::Number(Decimal::new(10, 0)));
        assert!(matches!(toks[2], Token::Currency(_)));
        assert_eq!(toks[3], Token::LBrace);
        assert_eq!(toks[7], Token::RBrace);
        assert_eq!(toks[8], Token::At);
    }

    #[test]
    fn lexes_metadata_key() {
        let toks = tokens_for(r#"invoice: "INV-001""#);
        assert_eq!(toks[0], Token::MetaKey("invoice".into()));
        assert_eq!(toks[1], Token::Str("INV-001".into()));
    }

    #[test]
    fn comments_inside_strings_are_not_comments() {
        let toks = tokens_for(r#"2024-01-01 balance Assets:Cash 10 USD ; trailing note"#);
        assert_eq!(toks.len(), 5);
    }

    #[test]
    fn stray_character_is_an_error() {
        let err = lex_line("t.ledger", 3, "Assets:Cash $5").unwrap_err();
        assert_eq!(err.span.row, 3);
    }
}
