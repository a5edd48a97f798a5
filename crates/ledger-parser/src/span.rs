//! Source location tracking: a file-relative line/column pair.

use std::fmt;

/// Where a token or directive came from: file, 1-based row, 1-based column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceSpan {
    /// Path of the file being parsed.
    pub file: String,
    /// 1-based line number.
    pub row: usize,
    /// 1-based column (byte offset within the line, not grapheme-aware).
    pub column: usize,
}

impl SourceSpan {
    /// Construct a span.
    #[must_use]
    pub fn new(file: impl Into<String>, row: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            row,
            column,
        }
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.row, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_as_file_row_column() {
        let span = SourceSpan::new("ledger.txt", 12, 3);
        assert_eq!(span.to_string(), "ledger.txt:12:3");
    }
}
