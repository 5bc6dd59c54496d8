//! Generates SELECT / INSERT / UPDATE / DELETE skeletons from a table
//! name and a column list, in either prepared (`?`) or literal-substituted
//! form. Grounded on the teacher crate's `protocol::command::text` literal
//! formatting (reused here via the transport layer's literal-rendering
//! logic) and on `transport::metadata::quote_identifier` for
//! backtick-quoting.

use crate::driver::value::{sql_to_native, SqlValue};
use crate::error::Result;
use crate::transport::connection::format_native_as_literal_value;
use crate::transport::metadata::quote_identifier;

/// One column's role in a statement-assembly call. `value` is only
/// consulted in non-prepared mode (for literal substitution) and, for
/// INSERT, to decide whether an auto-increment primary key column is
/// null and therefore omittable.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub name: String,
    pub is_primary_key: bool,
    pub is_auto_increment: bool,
    pub is_read_only: bool,
    pub value: SqlValue,
}

fn qualified_table(schema: Option<&str>, table: &str) -> String {
    match schema {
        Some(schema) => format!("{}.{}", quote_identifier(schema), quote_identifier(table)),
        None => quote_identifier(table),
    }
}

/// Builds a `SELECT <cols> FROM <table>` skeleton (no WHERE clause; see
/// module docs). `columns` empty selects `*`.
pub fn build_select(schema: Option<&str>, table: &str, columns: &[&str]) -> String {
    let column_list = if columns.is_empty() {
        "*".to_string()
    } else {
        columns.iter().map(|c| quote_identifier(c)).collect::<Vec<_>>().join(", ")
    };
    format!("SELECT {} FROM {}", column_list, qualified_table(schema, table))
}

/// Builds an `INSERT INTO` skeleton. Columns that are both an
/// auto-increment primary-key part and currently null are omitted — the
/// server assigns their value. If every column is omitted this way, the
/// result is `INSERT INTO t () VALUES ()`.
pub fn build_insert(schema: Option<&str>, table: &str, columns: &[ColumnSpec], prepared: bool) -> Result<String> {
    let kept: Vec<&ColumnSpec> = columns
        .iter()
        .filter(|c| !(c.is_primary_key && c.is_auto_increment && c.value.is_null()))
        .collect();

    let names = kept.iter().map(|c| quote_identifier(&c.name)).collect::<Vec<_>>().join(", ");
    let values = if prepared {
        vec!["?"; kept.len()].join(", ")
    } else {
        let mut rendered = Vec::with_capacity(kept.len());
        for c in &kept {
            rendered.push(format_native_as_literal_value(&sql_to_native(&c.value))?);
        }
        rendered.join(", ")
    };

    Ok(format!("INSERT INTO {} ({}) VALUES ({})", qualified_table(schema, table), names, values))
}

/// Builds an `UPDATE` skeleton covering every non-key, non-read-only
/// column. Returns an empty string if nothing remains to set — the
/// caller's signal that the update is a no-op.
pub fn build_update(schema: Option<&str>, table: &str, columns: &[ColumnSpec], prepared: bool) -> Result<String> {
    let kept: Vec<&ColumnSpec> = columns.iter().filter(|c| !c.is_primary_key && !c.is_read_only).collect();
    if kept.is_empty() {
        return Ok(String::new());
    }

    let mut assignments = Vec::with_capacity(kept.len());
    for c in &kept {
        let rhs = if prepared {
            "?".to_string()
        } else {
            format_native_as_literal_value(&sql_to_native(&c.value))?
        };
        assignments.push(format!("{} = {}", quote_identifier(&c.name), rhs));
    }

    Ok(format!("UPDATE {} SET {}", qualified_table(schema, table), assignments.join(", ")))
}

/// Builds a `DELETE FROM <table>` skeleton (no WHERE clause).
pub fn build_delete(schema: Option<&str>, table: &str) -> String {
    format!("DELETE FROM {}", qualified_table(schema, table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::value::{SqlData, TypeHint};

    fn spec(name: &str, pk: bool, auto: bool, read_only: bool, value: SqlValue) -> ColumnSpec {
        ColumnSpec {
            name: name.into(),
            is_primary_key: pk,
            is_auto_increment: auto,
            is_read_only: read_only,
            value,
        }
    }

    #[test]
    fn insert_skips_null_auto_increment_primary_key() {
        let columns = vec![
            spec("id", true, true, false, SqlValue::null(TypeHint::Int64)),
            spec("name", false, false, false, SqlValue { data: SqlData::String("bob".into()), hint: TypeHint::String }),
            spec("age", false, false, false, SqlValue { data: SqlData::Int32(9), hint: TypeHint::Int32 }),
        ];
        let sql = build_insert(Some("db"), "t", &columns, true).unwrap();
        assert_eq!(sql, "INSERT INTO `db`.`t` (`name`, `age`) VALUES (?, ?)");
    }

    #[test]
    fn insert_with_all_columns_skipped_is_empty_values() {
        let columns = vec![spec("id", true, true, false, SqlValue::null(TypeHint::Int64))];
        let sql = build_insert(None, "t", &columns, true).unwrap();
        assert_eq!(sql, "INSERT INTO `t` () VALUES ()");
    }

    #[test]
    fn insert_non_prepared_substitutes_literals() {
        let columns = vec![spec("name", false, false, false, SqlValue { data: SqlData::String("o'brien".into()), hint: TypeHint::String })];
        let sql = build_insert(None, "t", &columns, false).unwrap();
        assert_eq!(sql, "INSERT INTO `t` (`name`) VALUES ('o\\'brien')");
    }

    #[test]
    fn update_skips_primary_key_and_read_only_columns() {
        let columns = vec![
            spec("id", true, true, false, SqlValue::null(TypeHint::Int64)),
            spec("created_at", false, false, true, SqlValue::null(TypeHint::DateTime)),
            spec("age", false, false, false, SqlValue { data: SqlData::Int32(10), hint: TypeHint::Int32 }),
        ];
        let sql = build_update(None, "t", &columns, true).unwrap();
        assert_eq!(sql, "UPDATE `t` SET `age` = ?");
    }

    #[test]
    fn update_with_nothing_left_is_empty_string() {
        let columns = vec![spec("id", true, true, false, SqlValue::null(TypeHint::Int64))];
        assert_eq!(build_update(None, "t", &columns, true).unwrap(), "");
    }
}
