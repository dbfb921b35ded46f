//! Column-addressed tabular input.
//!
//! Every pipeline input arrives as a [`Table`]: a header row plus string
//! cells. Typed records are built from it by the `from_table` constructors in
//! the domain crates, which first resolve their required columns with
//! [`Table::require`]. A missing column is the only fatal input problem.

use crate::error::{DomainError, DomainResult};

/// A named table of string cells.
///
/// Rows shorter than the header read as blank cells; extra cells are kept
/// but unreachable by name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table. Header names are trimmed; duplicate header names are
    /// rejected because columns are addressed by name.
    pub fn new(
        name: impl Into<String>,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> DomainResult<Self> {
        let name = name.into();
        let headers: Vec<String> = headers.into_iter().map(|h| h.trim().to_string()).collect();

        for (i, header) in headers.iter().enumerate() {
            if !header.is_empty() && headers[..i].contains(header) {
                return Err(DomainError::validation(format!(
                    "{name} table has duplicate column '{header}'"
                )));
            }
        }

        Ok(Self {
            name,
            headers,
            rows,
        })
    }

    /// Convenience constructor for literal tables (tests, fixtures).
    pub fn from_literal(name: &str, headers: &[&str], rows: &[&[&str]]) -> DomainResult<Self> {
        Self::new(
            name,
            headers.iter().map(|h| (*h).to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| (*c).to_string()).collect())
                .collect(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, if present.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Resolve a column the caller cannot work without.
    pub fn require(&self, name: &str) -> DomainResult<usize> {
        self.column(name)
            .ok_or_else(|| DomainError::missing_column(&self.name, name))
    }

    /// Iterate rows in input order.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|cells| Row { cells })
    }

    /// Overwrite a column with `values` (one per row), appending the column
    /// when the table does not have it yet.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> DomainResult<()> {
        if values.len() != self.rows.len() {
            return Err(DomainError::validation(format!(
                "column '{name}' has {} values but {} table has {} rows",
                values.len(),
                self.name,
                self.rows.len()
            )));
        }

        let idx = match self.column(name) {
            Some(idx) => idx,
            None => {
                self.headers.push(name.to_string());
                self.headers.len() - 1
            }
        };

        for (row, value) in self.rows.iter_mut().zip(values) {
            if row.len() <= idx {
                row.resize(idx + 1, String::new());
            }
            row[idx] = value;
        }
        Ok(())
    }
}

/// Borrowed view of one table row.
#[derive(Debug, Copy, Clone)]
pub struct Row<'a> {
    cells: &'a [String],
}

impl<'a> Row<'a> {
    /// Cell at `idx`, trimmed; blank if the row is short.
    pub fn get(&self, idx: usize) -> &'a str {
        self.cells.get(idx).map(|c| c.trim()).unwrap_or("")
    }

    /// Cell at `idx` as an owned string, `None` when blank.
    pub fn optional(&self, idx: usize) -> Option<String> {
        let cell = self.get(idx);
        (!cell.is_empty()).then(|| cell.to_string())
    }

    pub fn cells(&self) -> &'a [String] {
        self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_literal(
            "stock",
            &["Item Name", " Balance Qty "],
            &[&["Widget", "4"], &["Gadget"]],
        )
        .unwrap()
    }

    #[test]
    fn headers_are_trimmed_and_addressable() {
        let table = sample();
        assert_eq!(table.column("Balance Qty"), Some(1));
        assert_eq!(table.column("Missing"), None);
    }

    #[test]
    fn require_reports_table_and_column() {
        let err = sample().require("SKU").unwrap_err();
        assert_eq!(err, DomainError::missing_column("stock", "SKU"));
        assert_eq!(err.to_string(), "stock table is missing required column 'SKU'");
    }

    #[test]
    fn short_rows_read_as_blank() {
        let table = sample();
        let rows: Vec<_> = table.rows().collect();
        assert_eq!(rows[1].get(1), "");
        assert_eq!(rows[1].optional(1), None);
        assert_eq!(rows[0].optional(0).as_deref(), Some("Widget"));
    }

    #[test]
    fn duplicate_headers_are_rejected() {
        let err = Table::from_literal("orders", &["SKU", "SKU"], &[]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("duplicate column 'SKU'")));
    }

    #[test]
    fn set_column_appends_then_overwrites() {
        let mut table = sample();
        table
            .set_column("On hand", vec!["1".into(), "2".into()])
            .unwrap();
        assert_eq!(table.headers().last().map(String::as_str), Some("On hand"));
        let rows: Vec<_> = table.rows().collect();
        assert_eq!(rows[1].get(2), "2");

        table
            .set_column("On hand", vec!["7".into(), "8".into()])
            .unwrap();
        assert_eq!(table.headers().len(), 3);
        assert_eq!(table.rows().next().unwrap().get(2), "7");
    }

    #[test]
    fn set_column_rejects_length_mismatch() {
        let mut table = sample();
        assert!(table.set_column("On hand", vec!["1".into()]).is_err());
    }
}
