//! The uniform row shape consumers see: an ordered sequence of columns,
//! each pairing its metadata with a value, addressable by ordinal or by
//! name. Grounded on the teacher crate's `protocol::column::FieldMeta` for
//! the metadata half and `transport::result::ResultState` for how rows
//! are already being carried internally — this module just re-pairs that
//! data one layer further from the wire.

use crate::driver::value::{native_to_sql, SqlValue};
use crate::protocol::column::FieldMeta;
use crate::protocol::value::NativeValue;
use crate::transport::IndexColumnDef;

/// One column within a [`Record`]: its metadata plus the value for this row.
#[derive(Debug, Clone)]
pub struct RecordField {
    pub meta: FieldMeta,
    pub value: SqlValue,
}

/// A single row, addressable by ordinal or by column name. When a query
/// result has duplicate column names (e.g. a join on two tables with a
/// same-named column), name lookup resolves to the first ordinal
/// occurrence — the same rule `ResultState::column_index` already applies
/// at the transport layer.
#[derive(Debug, Clone)]
pub struct Record {
    fields: Vec<RecordField>,
}

impl Record {
    pub fn from_native(metas: &[FieldMeta], values: &[NativeValue]) -> Self {
        let fields = metas
            .iter()
            .zip(values.iter())
            .map(|(meta, value)| RecordField {
                meta: meta.clone(),
                value: native_to_sql(value),
            })
            .collect();
        Record { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, ordinal: usize) -> Option<&RecordField> {
        self.fields.get(ordinal)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&RecordField> {
        self.fields.iter().find(|f| f.meta.name.eq_ignore_ascii_case(name))
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.meta.name.eq_ignore_ascii_case(name))
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.meta.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordField> {
        self.fields.iter()
    }
}

/// Re-exported rather than redefined: the transport layer already builds
/// this straight off `SHOW INDEX FROM`, and nothing above it needs a
/// richer shape.
pub use crate::transport::IndexInfo;

pub use IndexColumnDef as IndexColumn;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::{ColumnFlags, ColumnType};

    fn meta(name: &str) -> FieldMeta {
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
    fn name_lookup_is_case_insensitive() {
        let metas = vec![meta("Id")];
        let values = vec![NativeValue::null(ColumnType::MYSQL_TYPE_LONG)];
        let record = Record::from_native(&metas, &values);
        assert!(record.get_by_name("id").is_some());
        assert!(record.get_by_name("ID").is_some());
    }

    #[test]
    fn duplicate_names_resolve_to_first_ordinal() {
        let metas = vec![meta("id"), meta("id")];
        let values = vec![
            NativeValue::null(ColumnType::MYSQL_TYPE_LONG),
            NativeValue::null(ColumnType::MYSQL_TYPE_LONG),
        ];
        let record = Record::from_native(&metas, &values);
        assert_eq!(record.column_index("id"), Some(0));
    }

    #[test]
    fn ordinal_out_of_range_is_none() {
        let record = Record::from_native(&[], &[]);
        assert!(record.get(0).is_none());
    }
}
