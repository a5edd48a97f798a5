//! Recursive-descent parser: consumes the lexer's line stream one top-level
//! directive at a time (§4.8).
//!
//! Lines are first grouped into blocks by indentation: a column-0 line opens
//! a new block, and every following indented line belongs to it. A block
//! that fails to parse contributes one [`ParseError`] and is dropped; the
//! next block is unaffected, which is what gives the parser its
//! per-directive error recovery.

use ledger_core::{CostKind, DateSpec, InternedStr};
use rust_decimal::Decimal;

use crate::ast::{
    AmountExpr, SyntaxAmount, SyntaxCostSpec, SyntaxDirective, SyntaxMetaValue, SyntaxMetadata,
    SyntaxPosting,
};
use crate::error::ParseError;
use crate::lexer::{self, Line, Token};
use crate::span::SourceSpan;

/// Parse a whole file's source text into directives and errors.
///
/// Every block that parses cleanly is returned even if others failed, so a
/// caller can report every problem in the file in one pass.
#[must_use]
pub fn parse(file: &str, source: &str) -> (Vec<SyntaxDirective>, Vec<ParseError>) {
    let (lines, mut errors) = lexer::lex(file, source);
    let mut directives = Vec::new();

    for block in group_blocks(&lines) {
        match parse_block(file, block) {
            Ok(directive) => directives.push(directive),
            Err(e) => errors.push(e),
        }
    }

    (directives, errors)
}

fn group_blocks(lines: &[Line]) -> Vec<&[Line]> {
    let mut blocks = Vec::new();
    let mut start = 0;
    for (i, line) in lines.iter().enumerate() {
        if line.indent == 0 && i > start {
            blocks.push(&lines[start..i]);
            start = i;
        }
    }
    if start < lines.len() {
        blocks.push(&lines[start..]);
    }
    blocks
}

struct Cursor<'a> {
    file: &'a str,
    row: usize,
    toks: &'a [(Token, usize)],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(file: &'a str, line: &'a Line) -> Self {
        Self {
            file,
            row: line.row,
            toks: &line.tokens,
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.toks.get(self.pos).map(|(t, _)| t)
    }

    fn column(&self) -> usize {
        self.toks
            .get(self.pos)
            .or_else(|| self.toks.last())
            .map_or(1, |(_, c)| *c)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.toks.get(self.pos).map(|(t, _)| t.clone());
        self.pos += 1;
        tok
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.toks.len()
    }

    fn err(&self, msg: impl Into<String>) -> ParseError {
        ParseError::new(SourceSpan::new(self.file, self.row, self.column()), msg)
    }

    fn span(&self) -> SourceSpan {
        SourceSpan::new(self.file, self.row, self.column())
    }

    fn expect_date(&mut self) -> Result<DateSpec, ParseError> {
        match self.bump() {
            Some(Token::Date(d)) => Ok(d),
            _ => Err(self.err("expected a date")),
        }
    }

    fn expect_account(&mut self) -> Result<InternedStr, ParseError> {
        match self.bump() {
            Some(Token::Account(a)) => Ok(a),
            _ => Err(self.err("expected an account")),
        }
    }

    fn expect_currency(&mut self) -> Result<InternedStr, ParseError> {
        match self.bump() {
            Some(Token::Currency(c)) => Ok(c),
            _ => Err(self.err("expected a currency")),
        }
    }

    fn expect_str(&mut self) -> Result<String, ParseError> {
        match self.bump() {
            Some(Token::Str(s)) => Ok(s),
            _ => Err(self.err("expected a quoted string")),
        }
    }
}

fn parse_block(file: &str, block: &[Line]) -> Result<SyntaxDirective, ParseError> {
    let header = &block[0];
    let mut cur = Cursor::new(file, header);
    let span = cur.span();

    match cur.peek() {
        Some(Token::OptionKw) => {
            cur.bump();
            let key = cur.expect_str()?;
            let value = cur.expect_str()?;
            Ok(SyntaxDirective::Option { key, value, span })
        }
        Some(Token::Include) => {
            cur.bump();
            let path = cur.expect_str()?;
            Ok(SyntaxDirective::Include { path, span })
        }
        Some(Token::Date(_)) => {
            let date = cur.expect_date()?;
            match cur.bump() {
                Some(Token::Open) => parse_open(&mut cur, date, span),
                Some(Token::Close) => parse_close(&mut cur, date, span),
                Some(Token::CurrencyKw) => parse_currency(&mut cur, date, span, &block[1..]),
                Some(Token::Balance) => parse_balance(&mut cur, date, span),
                Some(Token::Txn) => parse_transaction(date, '*', &mut cur, &block[1..], span),
                Some(Token::Star) => parse_transaction(date, '*', &mut cur, &block[1..], span),
                Some(Token::Bang) => parse_transaction(date, '!', &mut cur, &block[1..], span),
                _ => Err(cur.err("expected a directive keyword or flag after the date")),
            }
        }
        _ => Err(cur.err("expected a date, 'option', or 'include' at the start of a line")),
    }
}

fn parse_open(cur: &mut Cursor<'_>, date: DateSpec, span: SourceSpan) -> Result<SyntaxDirective, ParseError> {
    let account = cur.expect_account()?;
    let mut currencies = Vec::new();
    if matches!(cur.peek(), Some(Token::Currency(_))) {
        currencies.push(cur.expect_currency()?);
        while matches!(cur.peek(), Some(Token::Comma)) {
            cur.bump();
            currencies.push(cur.expect_currency()?);
        }
    }
    Ok(SyntaxDirective::Open {
        date,
        account,
        currencies,
        meta: SyntaxMetadata::new(),
        span,
    })
}

fn parse_close(cur: &mut Cursor<'_>, date: DateSpec, span: SourceSpan) -> Result<SyntaxDirective, ParseError> {
    let account = cur.expect_account()?;
    Ok(SyntaxDirective::Close {
        date,
        account,
        meta: SyntaxMetadata::new(),
        span,
    })
}

fn parse_currency(
    cur: &mut Cursor<'_>,
    date: DateSpec,
    span: SourceSpan,
    body: &[Line],
) -> Result<SyntaxDirective, ParseError> {
    let currency = cur.expect_currency()?;
    let mut meta = SyntaxMetadata::new();
    for line in body {
        let mut lcur = Cursor::new(cur.file, line);
        let (key, value) = parse_meta_pair(&mut lcur)?;
        meta.insert(key, value);
    }
    Ok(SyntaxDirective::Currency {
        date,
        currency,
        meta,
        span,
    })
}

fn parse_balance(cur: &mut Cursor<'_>, date: DateSpec, span: SourceSpan) -> Result<SyntaxDirective, ParseError> {
    let account = cur.expect_account()?;
    let amount = parse_amount(cur)?;
    let tolerance = if matches!(cur.peek(), Some(Token::Tilde)) {
        cur.bump();
        Some(parse_amount_expr(cur)?)
    } else {
        None
    };
    Ok(SyntaxDirective::Balance {
        date,
        account,
        amount,
        tolerance,
        meta: SyntaxMetadata::new(),
        span,
    })
}

fn parse_transaction(
    date: DateSpec,
    flag: char,
    cur: &mut Cursor<'_>,
    body: &[Line],
    span: SourceSpan,
) -> Result<SyntaxDirective, ParseError> {
    let strings = {
        let mut out = Vec::new();
        while matches!(cur.peek(), Some(Token::Str(_))) {
            out.push(cur.expect_str()?);
        }
        out
    };
    let (payee, narration) = match strings.len() {
        0 => (None, String::new()),
        1 => (None, strings.into_iter().next().unwrap()),
        _ => {
            let mut it = strings.into_iter();
            let payee = it.next();
            (payee, it.next().unwrap_or_default())
        }
    };

    let mut meta = SyntaxMetadata::new();
    let mut postings = Vec::new();

    for line in body {
        let mut lcur = Cursor::new(cur.file, line);
        match lcur.peek() {
            Some(Token::MetaKey(_)) if postings.is_empty() => {
                let (key, value) = parse_meta_pair(&mut lcur)?;
                meta.insert(key, value);
            }
            _ => postings.push(parse_posting(&mut lcur)?),
        }
    }

    Ok(SyntaxDirective::Transaction {
        date,
        flag,
        payee,
        narration,
        meta,
        postings,
        span,
    })
}

fn parse_posting(cur: &mut Cursor<'_>) -> Result<SyntaxPosting, ParseError> {
    let flag = match cur.peek() {
        Some(Token::Star) => {
            cur.bump();
            Some('*')
        }
        Some(Token::Bang) => {
            cur.bump();
            Some('!')
        }
        _ => None,
    };
    let account = cur.expect_account()?;

    let amount = if matches!(cur.peek(), Some(Token::Number(_) | Token::Minus | Token::LParen)) {
        Some(parse_amount(cur)?)
    } else {
        None
    };

    let cost_spec = match cur.peek() {
        Some(Token::LBrace) => {
            cur.bump();
            let spec = parse_cost_spec(cur, CostKind::PerUnit)?;
            expect_token(cur, &Token::RBrace, "}")?;
            Some(spec)
        }
        Some(Token::LDoubleBrace) => {
            cur.bump();
            let spec = parse_cost_spec(cur, CostKind::Total)?;
            expect_token(cur, &Token::RDoubleBrace, "}}")?;
            Some(spec)
        }
        _ => None,
    };

    let price = match cur.peek() {
        Some(Token::At) => {
            cur.bump();
            Some(parse_amount(cur)?)
        }
        Some(Token::AtAt) => {
            cur.bump();
            Some(parse_amount(cur)?)
        }
        _ => None,
    };

    let mut meta = SyntaxMetadata::new();
    while matches!(cur.peek(), Some(Token::MetaKey(_))) {
        let (key, value) = parse_meta_pair(cur)?;
        meta.insert(key, value);
    }

    if !cur.is_eof() {
        return Err(cur.err("unexpected trailing tokens on posting line"));
    }

    Ok(SyntaxPosting {
        account,
        flag,
        amount,
        cost_spec,
        price,
        meta,
    })
}

fn parse_cost_spec(cur: &mut Cursor<'_>, kind: CostKind) -> Result<SyntaxCostSpec, ParseError> {
    let mut spec = SyntaxCostSpec {
        kind: Some(kind),
        ..SyntaxCostSpec::default()
    };
    if matches!(cur.peek(), Some(Token::RBrace | Token::RDoubleBrace)) {
        return Ok(spec);
    }
    loop {
        match cur.peek() {
            Some(Token::Number(_) | Token::Minus | Token::LParen) => {
                spec.amounts.push(parse_amount(cur)?);
            }
            Some(Token::Currency(_)) => {
                spec.currencies.push(cur.expect_currency()?);
            }
            Some(Token::Date(_)) => {
                if let Some(Token::Date(d)) = cur.bump() {
                    spec.dates.push(d);
                }
            }
            _ => return Err(cur.err("expected an amount, currency, or date inside a cost spec")),
        }
        if matches!(cur.peek(), Some(Token::Comma)) {
            cur.bump();
        } else {
            break;
        }
    }
    Ok(spec)
}

fn parse_meta_pair(cur: &mut Cursor<'_>) -> Result<(String, SyntaxMetaValue), ParseError> {
    let key = match cur.bump() {
        Some(Token::MetaKey(k)) => k,
        _ => return Err(cur.err("expected a metadata key")),
    };
    let value = match cur.peek() {
        Some(Token::Str(_)) => {
            if let Some(Token::Str(s)) = cur.bump() {
                SyntaxMetaValue::String(s)
            } else {
                unreachable!()
            }
        }
        Some(Token::Account(_)) => {
            if let Some(Token::Account(a)) = cur.bump() {
                SyntaxMetaValue::Account(a)
            } else {
                unreachable!()
            }
        }
        Some(Token::Number(_) | Token::Minus | Token::LParen) => {
            let expr = parse_amount_expr(cur)?;
            if matches!(cur.peek(), Some(Token::Currency(_))) {
                let currency = cur.expect_currency()?;
                SyntaxMetaValue::Amount(SyntaxAmount { expr, currency })
            } else {
                SyntaxMetaValue::Number(expr)
            }
        }
        _ => return Err(cur.err("expected a metadata value")),
    };
    Ok((key, value))
}

fn parse_amount(cur: &mut Cursor<'_>) -> Result<SyntaxAmount, ParseError> {
    let expr = parse_amount_expr(cur)?;
    let currency = cur.expect_currency()?;
    Ok(SyntaxAmount { expr, currency })
}

fn parse_amount_expr(cur: &mut Cursor<'_>) -> Result<AmountExpr, ParseError> {
    let mut lhs = parse_term(cur)?;
    loop {
        match cur.peek() {
            Some(Token::Plus) => {
                cur.bump();
                lhs = AmountExpr::Add(Box::new(lhs), Box::new(parse_term(cur)?));
            }
            Some(Token::Minus) => {
                cur.bump();
                lhs = AmountExpr::Sub(Box::new(lhs), Box::new(parse_term(cur)?));
            }
            _ => break,
        }
    }
    Ok(lhs)
}

fn parse_term(cur: &mut Cursor<'_>) -> Result<AmountExpr, ParseError> {
    let mut lhs = parse_factor(cur)?;
    loop {
        match cur.peek() {
            Some(Token::Star) => {
                cur.bump();
                lhs = AmountExpr::Mul(Box::new(lhs), Box::new(parse_factor(cur)?));
            }
            Some(Token::Slash) => {
                cur.bump();
                lhs = AmountExpr::Div(Box::new(lhs), Box::new(parse_factor(cur)?));
            }
            _ => break,
        }
    }
    Ok(lhs)
}

fn parse_factor(cur: &mut Cursor<'_>) -> Result<AmountExpr, ParseError> {
    match cur.bump() {
        Some(Token::Minus) => Ok(AmountExpr::Neg(Box::new(parse_factor(cur)?))),
        Some(Token::Number(n)) => Ok(AmountExpr::Literal(n)),
        Some(Token::LParen) => {
            let inner = parse_amount_expr(cur)?;
            expect_token(cur, &Token::RParen, ")")?;
            Ok(inner)
        }
        _ => Err(cur.err("expected a number, '-', or '('")),
    }
}

fn expect_token(cur: &mut Cursor<'_>, want: &Token, label: &str) -> Result<(), ParseError> {
    if cur.peek() == Some(want) {
        cur.bump();
        Ok(())
    } else {
        Err(cur.err(format!("expected '{label}'")))
    }
}
