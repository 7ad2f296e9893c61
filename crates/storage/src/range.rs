//! A1-style range addressing
//!
//! Ranges are written `Table!A<start>:<Last><end>`. The open-ended form
//! `Table!A<start>:<Last>` covers every row from `start` to the end of the
//! table. Table names containing spaces or punctuation are quoted with single
//! quotes, as the spreadsheet API expects.

use std::fmt;

use eventsheet_core::column_letter;

/// A rectangular block of cells starting at column A
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct A1Range {
    pub table: String,
    /// First row, 1-based
    pub start_row: u32,
    /// Last row, inclusive; None means "to the end of the table"
    pub end_row: Option<u32>,
    /// Number of columns from A
    pub width: usize,
}

impl A1Range {
    /// A single row
    pub fn row(table: impl Into<String>, row: u32, width: usize) -> Self {
        Self {
            table: table.into(),
            start_row: row,
            end_row: Some(row),
            width,
        }
    }

    /// Rows `start..=end`
    pub fn rows(table: impl Into<String>, start: u32, end: u32, width: usize) -> Self {
        Self {
            table: table.into(),
            start_row: start,
            end_row: Some(end),
            width,
        }
    }

    /// Every row from `start` to the end of the table
    pub fn open(table: impl Into<String>, start: u32, width: usize) -> Self {
        Self {
            table: table.into(),
            start_row: start,
            end_row: None,
            width,
        }
    }

    pub fn last_column(&self) -> String {
        column_letter(self.width)
    }

    /// Number of rows covered, or None for open ranges
    pub fn height(&self) -> Option<u32> {
        self.end_row
            .map(|end| end.saturating_sub(self.start_row).saturating_add(1))
    }
}

impl fmt::Display for A1Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if needs_quotes(&self.table) {
            write!(f, "'{}'", self.table.replace('\'', "''"))?;
        } else {
            f.write_str(&self.table)?;
        }
        write!(f, "!A{}:{}", self.start_row, self.last_column())?;
        if let Some(end) = self.end_row {
            write!(f, "{end}")?;
        }
        Ok(())
    }
}

fn needs_quotes(table: &str) -> bool {
    !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_row_range() {
        let range = A1Range::row("Events", 5, 19);
        assert_eq!(range.to_string(), "Events!A5:S5");
        assert_eq!(range.height(), Some(1));
    }

    #[test]
    fn test_open_range_and_quoting() {
        let range = A1Range::open("IoT Events", 2, 23);
        assert_eq!(range.to_string(), "'IoT Events'!A2:W");
        assert_eq!(range.height(), None);
    }

    #[test]
    fn test_wide_range_uses_two_letter_column() {
        let range = A1Range::rows("DT Events", 3, 10, 28);
        assert_eq!(range.to_string(), "'DT Events'!A3:AB10");
        assert_eq!(range.height(), Some(8));
    }

    #[test]
    fn test_quote_in_table_name() {
        let range = A1Range::row("Bob's", 2, 1);
        assert_eq!(range.to_string(), "'Bob''s'!A2:A2");
    }
}
