//! A fetched result set: column metadata plus eagerly-decoded rows.
//!
//! The teacher crate (like libmysqlclient) distinguishes `mysql_store_result`
//! (buffer everything up front) from `mysql_use_result` (stream row by row,
//! binding caller-supplied output buffers per `estimated_buffer_size`). This
//! driver has no C buffer-binding boundary to honour, so both the text and
//! binary protocol paths always materialise straight into owned
//! [`NativeValue`] rows as they come off the wire — there is no unbuffered
//! streaming mode. `estimated_buffer_size` (`crate::protocol::bind`) is kept
//! and exercised for the cases that still need a buffer-sizing decision
//! (e.g. a caller pre-allocating a row `Vec`), as a resolved design choice
//! documented in DESIGN.md.

use crate::error::{Error, Result};
use crate::protocol::column::FieldMeta;
use crate::protocol::value::NativeValue;

#[derive(Debug)]
pub struct ResultState {
    pub fields: Vec<FieldMeta>,
    rows: Vec<Vec<NativeValue>>,
    cursor: usize,
}

impl ResultState {
    pub fn new(fields: Vec<FieldMeta>, rows: Vec<Vec<NativeValue>>) -> Self {
        ResultState { fields, rows, cursor: 0 }
    }

    pub fn column_count(&self) -> usize {
        self.fields.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.rows.len()
    }

    /// Advance to and return the next row, or `None` at end of results
    /// (a normal, non-error condition — mirrors the protocol's
    /// EOF-without-errno "no more rows" signal).
    pub fn fetch_row(&mut self) -> Option<&[NativeValue]> {
        if self.cursor >= self.rows.len() {
            return None;
        }
        let row = &self.rows[self.cursor];
        self.cursor += 1;
        Some(row)
    }

    pub fn get_value(&self, row: &[NativeValue], column: usize) -> Result<&NativeValue> {
        row.get(column)
            .ok_or_else(|| Error::ApiUsage(format!("column index {column} out of range")))
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    pub fn all_rows(&self) -> &[Vec<NativeValue>] {
        &self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::{ColumnFlags, ColumnType};

    fn field(name: &str) -> FieldMeta {
        FieldMeta {
            name: name.into(),
            org_name: name.into(),
            table: "t".into(),
            org_table: "t".into(),
            database: "db".into(),
            catalog: "def".into(),
            native_type: ColumnType::MYSQL_TYPE_LONG,
            charset: 33,
            declared_length: 11,
            max_observed_length: 0,
            flags: ColumnFlags::empty(),
            decimals: 0,
            default_value: NativeValue::null(ColumnType::MYSQL_TYPE_LONG),
        }
    }

    #[test]
    fn fetch_row_advances_cursor_and_returns_none_at_end() {
        let fields = vec![field("id")];
        let mut state = ResultState::new(fields, vec![vec![NativeValue::null(ColumnType::MYSQL_TYPE_LONG)]]);
        assert!(!state.is_exhausted());
        assert!(state.fetch_row().is_some());
        assert!(state.fetch_row().is_none());
        assert!(state.is_exhausted());
    }

    #[test]
    fn column_index_is_case_insensitive() {
        let state = ResultState::new(vec![field("Id")], vec![]);
        assert_eq!(state.column_index("id"), Some(0));
        assert_eq!(state.column_index("missing"), None);
    }
}
