//! Schema introspection (`SHOW DATABASES`/`SHOW FULL TABLES`/
//! `SHOW FULL COLUMNS`/`SHOW INDEX`) and the `SHOW COLUMNS` type-string
//! parser that turns `"decimal(10,2) unsigned zerofill"` back into a
//! [`FieldMeta`]. The teacher crate never needed this (it always gets
//! typed metadata straight off the wire via `COM_STMT_PREPARE`); this is
//! new functionality grounded on the column-definition flag semantics
//! already established in `protocol/column.rs`.

use crate::constant::{ColumnFlags, ColumnType};
use crate::error::Result;
use crate::protocol::column::FieldMeta;
use crate::protocol::value::{NativeData, NativeValue};
use crate::transport::connection::Connection;

fn escape_like_literal(pattern: &str) -> String {
    // The LIKE pattern's own wildcards (`%`, `_`) are left alone; only the
    // enclosing quote needs escaping to embed the pattern safely.
    pattern.replace('\'', "\\'")
}

pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn row_string(row: &[NativeValue], col: usize) -> Option<String> {
    match &row.get(col)?.data {
        NativeData::String(s) => Some(s.clone()),
        _ => None,
    }
}

pub fn list_databases(conn: &mut Connection, like: Option<&str>) -> Result<Vec<String>> {
    let sql = match like {
        Some(pattern) => format!("SHOW DATABASES LIKE '{}'", escape_like_literal(pattern)),
        None => "SHOW DATABASES".to_string(),
    };
    let result = conn.query(&sql)?;
    Ok(result.all_rows().iter().filter_map(|row| row_string(row, 0)).collect())
}

#[derive(Debug, Clone)]
pub struct TableInfo {
    pub name: String,
    pub table_type: String,
}

/// The `Table_type` kind a table listing can be restricted to. MySQL
/// doesn't let `WHERE Table_type = ...` and `LIKE 'pattern'` appear on the
/// same `SHOW FULL TABLES` statement, so when both a kind and a name
/// pattern are given, the kind filter goes server-side and the name
/// pattern is re-applied client-side (see [`matches_like_pattern`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    BaseTable,
    View,
}

impl TableKind {
    fn as_str(self) -> &'static str {
        match self {
            TableKind::BaseTable => "BASE TABLE",
            TableKind::View => "VIEW",
        }
    }
}

/// A deliberately simplified client-side LIKE matcher: `%` matches any
/// run of characters, `_` matches exactly one, everything else is a
/// literal (case-insensitive, matching MySQL's default collation
/// behavior for identifier comparisons).
fn matches_like_pattern(name: &str, pattern: &str) -> bool {
    fn go(name: &[u8], pattern: &[u8]) -> bool {
        match pattern.first() {
            None => name.is_empty(),
            Some(b'%') => go(name, &pattern[1..]) || (!name.is_empty() && go(&name[1..], pattern)),
            Some(b'_') => !name.is_empty() && go(&name[1..], &pattern[1..]),
            Some(&p) => {
                !name.is_empty() && name[0].eq_ignore_ascii_case(&p) && go(&name[1..], &pattern[1..])
            }
        }
    }
    go(name.as_bytes(), pattern.as_bytes())
}

pub fn list_tables(conn: &mut Connection, database: Option<&str>, like: Option<&str>, kind: Option<TableKind>) -> Result<Vec<TableInfo>> {
    let mut sql = String::from("SHOW FULL TABLES");
    if let Some(db) = database {
        sql.push_str(&format!(" FROM {}", quote_identifier(db)));
    }
    match (kind, like) {
        (Some(kind), _) => sql.push_str(&format!(" WHERE Table_type = '{}'", kind.as_str())),
        (None, Some(pattern)) => sql.push_str(&format!(" LIKE '{}'", escape_like_literal(pattern))),
        (None, None) => {}
    }

    let result = conn.query(&sql)?;
    let rows: Vec<TableInfo> = result
        .all_rows()
        .iter()
        .filter_map(|row| {
            Some(TableInfo {
                name: row_string(row, 0)?,
                table_type: row_string(row, 1).unwrap_or_default(),
            })
        })
        .filter(|table| kind.map_or(true, |kind| table.table_type.eq_ignore_ascii_case(kind.as_str())))
        .collect();

    Ok(match (kind, like) {
        (Some(_), Some(pattern)) => rows.into_iter().filter(|t| matches_like_pattern(&t.name, pattern)).collect(),
        _ => rows,
    })
}

pub fn list_columns(conn: &mut Connection, table: &str, database: Option<&str>) -> Result<Vec<FieldMeta>> {
    let mut sql = format!("SHOW FULL COLUMNS FROM {}", quote_identifier(table));
    if let Some(db) = database {
        sql.push_str(&format!(" FROM {}", quote_identifier(db)));
    }
    let result = conn.query(&sql)?;

    let mut fields = Vec::with_capacity(result.row_count());
    for row in result.all_rows() {
        // SHOW FULL COLUMNS: Field, Type, Collation, Null, Key, Default, Extra, Privileges, Comment
        let name = row_string(row, 0).unwrap_or_default();
        let type_string = row_string(row, 1).unwrap_or_default();
        let null = row_string(row, 3).unwrap_or_default();
        let key = row_string(row, 4).unwrap_or_default();
        let default = row.get(5).cloned();
        let extra = row_string(row, 6).unwrap_or_default();

        let (native_type, mut flags, declared_length, decimals) = parse_type_string(&type_string);

        if null.eq_ignore_ascii_case("NO") {
            flags |= ColumnFlags::NOT_NULL_FLAG;
        }
        match key.as_str() {
            "PRI" => flags |= ColumnFlags::PRI_KEY_FLAG,
            "UNI" => flags |= ColumnFlags::UNIQUE_KEY_FLAG,
            "MUL" => flags |= ColumnFlags::MULTIPLE_KEY_FLAG,
            _ => {}
        }
        if extra.to_ascii_lowercase().contains("auto_increment") {
            flags |= ColumnFlags::AUTO_INCREMENT_FLAG;
        }

        fields.push(FieldMeta {
            name: name.clone(),
            org_name: name,
            table: table.to_string(),
            org_table: table.to_string(),
            database: database.unwrap_or_default().to_string(),
            catalog: "def".to_string(),
            native_type,
            charset: 33,
            declared_length,
            max_observed_length: 0,
            flags,
            decimals,
            default_value: default.unwrap_or_else(|| NativeValue::null(native_type)),
        });
    }
    Ok(fields)
}

/// One column's participation in an index (spec's IndexInfo column-def
/// entry): ordinal position plus the optional statistics `SHOW INDEX`
/// reports for it.
#[derive(Debug, Clone)]
pub struct IndexColumnDef {
    pub name: Option<String>,
    pub sequence: u32,
    pub collation: Option<String>,
    pub cardinality: Option<u64>,
    pub sub_part: Option<u64>,
    pub nullable: bool,
    pub expression: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IndexInfo {
    pub table: String,
    pub name: String,
    pub index_type: String,
    pub is_unique: bool,
    pub is_visible: bool,
    pub comment: String,
    pub index_comment: String,
    pub columns: Vec<IndexColumnDef>,
}

impl IndexInfo {
    pub fn is_primary(&self) -> bool {
        self.name == "PRIMARY"
    }
}

fn row_u64(row: &[NativeValue], col: usize) -> Option<u64> {
    match &row.get(col)?.data {
        NativeData::U64(v) => Some(*v),
        NativeData::I64(v) => Some((*v).try_into().ok()?),
        NativeData::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn row_bool_nonzero(row: &[NativeValue], col: usize, default_if_missing: bool) -> bool {
    match row.get(col).map(|v| &v.data) {
        Some(NativeData::I64(v)) => *v != 0,
        Some(NativeData::I32(v)) => *v != 0,
        Some(NativeData::U64(v)) => *v != 0,
        Some(NativeData::String(s)) => s != "0",
        _ => default_if_missing,
    }
}

/// `SHOW INDEX FROM` column order: Table, Non_unique, Key_name,
/// Seq_in_index, Column_name, Collation, Cardinality, Sub_part, Packed,
/// Null, Index_type, Comment, Index_comment, Visible, Expression.
pub fn list_indexes(conn: &mut Connection, table: &str) -> Result<Vec<IndexInfo>> {
    let sql = format!("SHOW INDEX FROM {}", quote_identifier(table));
    let result = conn.query(&sql)?;

    struct Raw {
        key_name: String,
        non_unique: bool,
        column: IndexColumnDef,
        index_type: String,
        comment: String,
        index_comment: String,
        is_visible: bool,
    }

    let mut raws = Vec::new();
    for row in result.all_rows() {
        let seq = row_u64(row, 3).unwrap_or(0) as u32;
        raws.push(Raw {
            key_name: row_string(row, 2).unwrap_or_default(),
            non_unique: row_bool_nonzero(row, 1, true),
            column: IndexColumnDef {
                name: row_string(row, 4),
                sequence: seq,
                collation: row_string(row, 5),
                cardinality: row_u64(row, 6),
                sub_part: row_u64(row, 7),
                nullable: row_string(row, 9).map(|s| s.eq_ignore_ascii_case("YES")).unwrap_or(false),
                expression: row_string(row, 14),
            },
            index_type: row_string(row, 10).unwrap_or_default(),
            comment: row_string(row, 11).unwrap_or_default(),
            index_comment: row_string(row, 12).unwrap_or_default(),
            is_visible: row_string(row, 13).map(|s| s.eq_ignore_ascii_case("YES")).unwrap_or(true),
        });
    }

    let mut names: Vec<String> = Vec::new();
    for raw in &raws {
        if !names.contains(&raw.key_name) {
            names.push(raw.key_name.clone());
        }
    }

    let mut indexes = Vec::with_capacity(names.len());
    for name in names {
        let mut members: Vec<&Raw> = raws.iter().filter(|r| r.key_name == name).collect();
        members.sort_by_key(|r| r.column.sequence);
        let first = members.first().expect("group built from non-empty raws");
        indexes.push(IndexInfo {
            table: table.to_string(),
            is_unique: !first.non_unique,
            is_visible: first.is_visible,
            comment: first.comment.clone(),
            index_comment: first.index_comment.clone(),
            index_type: first.index_type.clone(),
            columns: members.iter().map(|r| r.column.clone()).collect(),
            name,
        });
    }
    Ok(indexes)
}

/// Parse a `SHOW COLUMNS`-style type string (`"decimal(10,2) unsigned
/// zerofill"`, `"enum('a','b','c')"`, `"bigint unsigned"`, ...) into a
/// `(ColumnType, ColumnFlags, declared_length, decimals)` tuple. Unknown
/// base types default to `MYSQL_TYPE_STRING`, per the documented fallback.
pub fn parse_type_string(type_string: &str) -> (ColumnType, ColumnFlags, u32, u8) {
    let mut flags = ColumnFlags::empty();
    let mut remaining = type_string.trim().to_string();

    for suffix in [" zerofill", " unsigned"] {
        if let Some(pos) = remaining.to_ascii_lowercase().rfind(suffix) {
            if pos + suffix.len() == remaining.len() {
                if suffix == " zerofill" {
                    flags |= ColumnFlags::ZEROFILL_FLAG;
                } else {
                    flags |= ColumnFlags::UNSIGNED_FLAG;
                }
                remaining.truncate(pos);
            }
        }
    }

    let (base, args) = match remaining.find('(') {
        Some(open) => {
            let close = remaining.rfind(')').unwrap_or(remaining.len());
            (remaining[..open].trim().to_ascii_lowercase(), Some(remaining[open + 1..close].to_string()))
        }
        None => (remaining.trim().to_ascii_lowercase(), None),
    };

    let int_arg = || args.as_deref().and_then(|a| a.trim().parse::<u32>().ok());
    let decimal_args = || {
        args.as_deref().and_then(|a| {
            let mut parts = a.split(',');
            let m = parts.next()?.trim().parse::<u32>().ok()?;
            let d = parts.next().and_then(|d| d.trim().parse::<u8>().ok()).unwrap_or(0);
            Some((m, d))
        })
    };

    match base.as_str() {
        "tinyint" => (ColumnType::MYSQL_TYPE_TINY, flags, int_arg().unwrap_or(4), 0),
        "smallint" => (ColumnType::MYSQL_TYPE_SHORT, flags, int_arg().unwrap_or(6), 0),
        "mediumint" => (ColumnType::MYSQL_TYPE_INT24, flags, int_arg().unwrap_or(9), 0),
        "int" | "integer" => (ColumnType::MYSQL_TYPE_LONG, flags, int_arg().unwrap_or(11), 0),
        "bigint" => (ColumnType::MYSQL_TYPE_LONGLONG, flags, int_arg().unwrap_or(20), 0),
        "float" => (ColumnType::MYSQL_TYPE_FLOAT, flags, 12, 0),
        "double" | "real" => (ColumnType::MYSQL_TYPE_DOUBLE, flags, 22, 0),
        "decimal" | "numeric" | "dec" => {
            let (m, d) = decimal_args().unwrap_or((10, 0));
            (ColumnType::MYSQL_TYPE_NEWDECIMAL, flags, m, d)
        }
        "date" => (ColumnType::MYSQL_TYPE_DATE, flags, 10, 0),
        "datetime" => (ColumnType::MYSQL_TYPE_DATETIME, flags, 19, int_arg().unwrap_or(0) as u8),
        "timestamp" => (ColumnType::MYSQL_TYPE_TIMESTAMP, flags, 19, int_arg().unwrap_or(0) as u8),
        "time" => (ColumnType::MYSQL_TYPE_TIME, flags, 10, int_arg().unwrap_or(0) as u8),
        "year" => (ColumnType::MYSQL_TYPE_YEAR, flags, 4, 0),
        "char" => (ColumnType::MYSQL_TYPE_STRING, flags, int_arg().unwrap_or(1), 0),
        "varchar" => (ColumnType::MYSQL_TYPE_VAR_STRING, flags, int_arg().unwrap_or(255), 0),
        "binary" => (ColumnType::MYSQL_TYPE_STRING, flags | ColumnFlags::BINARY_FLAG, int_arg().unwrap_or(1), 0),
        "varbinary" => (
            ColumnType::MYSQL_TYPE_VAR_STRING,
            flags | ColumnFlags::BINARY_FLAG,
            int_arg().unwrap_or(255),
            0,
        ),
        "tinytext" => (ColumnType::MYSQL_TYPE_TINY_BLOB, flags | ColumnFlags::BLOB_FLAG, 255, 0),
        "text" => (ColumnType::MYSQL_TYPE_BLOB, flags | ColumnFlags::BLOB_FLAG, 65_535, 0),
        "mediumtext" => (ColumnType::MYSQL_TYPE_MEDIUM_BLOB, flags | ColumnFlags::BLOB_FLAG, 16_777_215, 0),
        "longtext" => (ColumnType::MYSQL_TYPE_LONG_BLOB, flags | ColumnFlags::BLOB_FLAG, u32::MAX, 0),
        "tinyblob" => (
            ColumnType::MYSQL_TYPE_TINY_BLOB,
            flags | ColumnFlags::BLOB_FLAG | ColumnFlags::BINARY_FLAG,
            255,
            0,
        ),
        "blob" => (
            ColumnType::MYSQL_TYPE_BLOB,
            flags | ColumnFlags::BLOB_FLAG | ColumnFlags::BINARY_FLAG,
            65_535,
            0,
        ),
        "mediumblob" => (
            ColumnType::MYSQL_TYPE_MEDIUM_BLOB,
            flags | ColumnFlags::BLOB_FLAG | ColumnFlags::BINARY_FLAG,
            16_777_215,
            0,
        ),
        "longblob" => (
            ColumnType::MYSQL_TYPE_LONG_BLOB,
            flags | ColumnFlags::BLOB_FLAG | ColumnFlags::BINARY_FLAG,
            u32::MAX,
            0,
        ),
        "enum" => {
            let max_len = args
                .as_deref()
                .map(|a| a.split(',').map(|s| s.trim().trim_matches('\'').len()).max().unwrap_or(0))
                .unwrap_or(0);
            (ColumnType::MYSQL_TYPE_ENUM, flags | ColumnFlags::ENUM_FLAG, max_len as u32, 0)
        }
        "set" => {
            let total_len = args
                .as_deref()
                .map(|a| a.split(',').map(|s| s.trim().trim_matches('\'').len() + 1).sum::<usize>())
                .unwrap_or(0);
            (ColumnType::MYSQL_TYPE_SET, flags | ColumnFlags::SET_FLAG, total_len as u32, 0)
        }
        "bit" => (ColumnType::MYSQL_TYPE_BIT, flags, int_arg().unwrap_or(1), 0),
        "json" => (ColumnType::MYSQL_TYPE_JSON, flags, u32::MAX, 0),
        "geometry" | "point" | "linestring" | "polygon" | "multipoint" | "multilinestring" | "multipolygon"
        | "geometrycollection" => (ColumnType::MYSQL_TYPE_GEOMETRY, flags, 0, 0),
        _ => (ColumnType::MYSQL_TYPE_STRING, flags, 0, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_int_parses_length_and_no_flags() {
        let (ty, flags, len, _) = parse_type_string("int(11)");
        assert_eq!(ty, ColumnType::MYSQL_TYPE_LONG);
        assert_eq!(len, 11);
        assert!(flags.is_empty());
    }

    #[test]
    fn decimal_with_unsigned_zerofill_strips_both_suffixes() {
        let (ty, flags, len, decimals) = parse_type_string("decimal(10,2) unsigned zerofill");
        assert_eq!(ty, ColumnType::MYSQL_TYPE_NEWDECIMAL);
        assert_eq!(len, 10);
        assert_eq!(decimals, 2);
        assert!(flags.contains(ColumnFlags::UNSIGNED_FLAG));
        assert!(flags.contains(ColumnFlags::ZEROFILL_FLAG));
    }

    #[test]
    fn bigint_unsigned_sets_flag_without_zerofill() {
        let (ty, flags, _, _) = parse_type_string("bigint unsigned");
        assert_eq!(ty, ColumnType::MYSQL_TYPE_LONGLONG);
        assert!(flags.contains(ColumnFlags::UNSIGNED_FLAG));
        assert!(!flags.contains(ColumnFlags::ZEROFILL_FLAG));
    }

    #[test]
    fn enum_length_is_longest_member() {
        let (ty, flags, len, _) = parse_type_string("enum('a','bb','ccc')");
        assert_eq!(ty, ColumnType::MYSQL_TYPE_ENUM);
        assert!(flags.contains(ColumnFlags::ENUM_FLAG));
        assert_eq!(len, 3);
    }

    #[test]
    fn bit_parses_length_argument() {
        let (ty, _, len, _) = parse_type_string("bit(8)");
        assert_eq!(ty, ColumnType::MYSQL_TYPE_BIT);
        assert_eq!(len, 8);
    }

    #[test]
    fn unknown_base_type_defaults_to_string() {
        let (ty, _, _, _) = parse_type_string("some_future_type(4)");
        assert_eq!(ty, ColumnType::MYSQL_TYPE_STRING);
    }

    #[test]
    fn like_pattern_percent_matches_any_run() {
        assert!(matches_like_pattern("user_accounts", "user%"));
        assert!(!matches_like_pattern("accounts", "user%"));
    }

    #[test]
    fn like_pattern_underscore_matches_one_char() {
        assert!(matches_like_pattern("cat", "c_t"));
        assert!(!matches_like_pattern("ct", "c_t"));
    }

    #[test]
    fn like_pattern_is_case_insensitive() {
        assert!(matches_like_pattern("Users", "users"));
    }

    #[test]
    fn table_kind_as_str_matches_show_full_tables_vocabulary() {
        assert_eq!(TableKind::BaseTable.as_str(), "BASE TABLE");
        assert_eq!(TableKind::View.as_str(), "VIEW");
    }
}
