//! Source CSV reader.
//!
//! Both export layouts are headerless, positional CSV in UTF-8, sometimes with
//! a byte order mark. Rows are kept as raw cells; callers decide per column
//! whether to trim, blank `NULL` tokens or pass the text through.

use crate::error::{ConvertError, Result};
use csv::ReaderBuilder;
use std::path::Path;
use tracing::debug;

const BOM: char = '\u{feff}';

/// True for the literal `NULL` placeholder the exports use for absent values.
pub fn is_null_token(cell: &str) -> bool {
    cell.trim().eq_ignore_ascii_case("NULL")
}

/// Blank a cell that only holds the `NULL` token.
pub fn blank_null(cell: &str) -> &str {
    if is_null_token(cell) {
        ""
    } else {
        cell
    }
}

/// One positional row of a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    line: u64,
    cells: Vec<String>,
}

impl SourceRow {
    pub fn new(line: u64, cells: Vec<String>) -> Self {
        Self { line, cells }
    }

    /// 1-based line number in the source file.
    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell text as read, or `""` past the end of the row.
    pub fn raw(&self, idx: usize) -> &str {
        self.cells.get(idx).map(String::as_str).unwrap_or("")
    }

    /// Trimmed cell text, or `""` past the end of the row.
    pub fn cell(&self, idx: usize) -> &str {
        self.raw(idx).trim()
    }

    /// Trimmed cell text, `None` when empty or a `NULL` token.
    pub fn optional(&self, idx: usize) -> Option<&str> {
        let cell = self.cell(idx);
        if cell.is_empty() || is_null_token(cell) {
            None
        } else {
            Some(cell)
        }
    }
}

/// Fail early when an input file does not exist.
pub fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ConvertError::MissingInput(path.display().to_string()))
    }
}

/// Read every row of a source file.
pub fn read_rows(path: &Path) -> Result<Vec<SourceRow>> {
    require_file(path)?;
    let text = std::fs::read_to_string(path)?;
    let rows = parse_rows(&text)?;
    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Parse headerless CSV text, dropping a leading byte order mark.
pub fn parse_rows(text: &str) -> Result<Vec<SourceRow>> {
    let text = text.strip_prefix(BOM).unwrap_or(text);

    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let cells = record.iter().map(str::to_string).collect();
        rows.push(SourceRow::new(line, cells));
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bom_is_stripped() {
        let rows = parse_rows("\u{feff}7,Jane Doe,NULL\n8,Kim,010-1234-5678\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cell(0), "7");
        assert_eq!(rows[1].line(), 2);
    }

    #[test]
    fn test_ragged_rows_are_kept() {
        let rows = parse_rows("1,2\n1,2,3,4\n").unwrap();
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[1].len(), 4);
        assert_eq!(rows[0].cell(5), "");
    }

    #[test]
    fn test_optional_blanks_null_and_empty() {
        let rows = parse_rows("a, NULL ,,null,x \n").unwrap();
        let row = &rows[0];
        assert_eq!(row.optional(0), Some("a"));
        assert_eq!(row.optional(1), None);
        assert_eq!(row.optional(2), None);
        assert_eq!(row.optional(3), None);
        assert_eq!(row.optional(4), Some("x"));
        assert_eq!(row.raw(4), "x ");
    }

    #[test]
    fn test_quoted_cells() {
        let rows = parse_rows("1,\"Cut, then color\",카드\n").unwrap();
        assert_eq!(rows[0].cell(1), "Cut, then color");
    }

    #[test]
    fn test_blank_null() {
        assert_eq!(blank_null("NULL"), "");
        assert_eq!(blank_null("Null"), "");
        assert_eq!(blank_null("memo"), "memo");
    }
}
