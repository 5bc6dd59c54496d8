//! `SqlValue` — the engine-agnostic driver-layer value — and its
//! conversions to/from the protocol layer's [`NativeValue`]. Grounded on
//! the teacher crate's `src/value.rs` `Value<'a>` → owned-value mapping
//! idea, generalised one layer up: where the teacher converts wire bytes
//! straight to a Rust primitive, this module sits one step further out and
//! converts a `NativeValue` to/from a domain-oriented tagged value a
//! caller who has never heard of MySQL wire types can still use.

use crate::constant::{ColumnFlags, ColumnType};
use crate::protocol::time;
use crate::protocol::value::{MysqlTime, MysqlTimeType, NativeData, NativeValue};

#[cfg(feature = "with-chrono")]
pub type ChronoDate = chrono::NaiveDate;
#[cfg(not(feature = "with-chrono"))]
pub type ChronoDate = MysqlTime;

#[cfg(feature = "with-chrono")]
pub type ChronoTime = chrono::Duration;
#[cfg(not(feature = "with-chrono"))]
pub type ChronoTime = MysqlTime;

#[cfg(feature = "with-chrono")]
pub type ChronoDateTime = chrono::NaiveDateTime;
#[cfg(not(feature = "with-chrono"))]
pub type ChronoDateTime = MysqlTime;

/// Domain-oriented type hint, decoupled from any particular database
/// engine (spec's SqlValue type-hint list).
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeHint {
    String,
    FixedString,
    Clob,
    Json,
    Xml,
    Date,
    Time,
    DateTime,
    Timestamp,
    Decimal,
    Numeric,
    ByteArray,
    Blob,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Double,
    Null,
    Interval,
    Array,
    RowId,
    Custom,
    Unknown,
}

#[derive(Debug, Clone)]
pub enum SqlData {
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(String),
    Blob(Vec<u8>),
    ChronoDate(ChronoDate),
    ChronoTime(ChronoTime),
    ChronoDateTime(ChronoDateTime),
}

#[derive(Debug, Clone)]
pub struct SqlValue {
    pub data: SqlData,
    pub hint: TypeHint,
}

impl SqlValue {
    pub fn null(hint: TypeHint) -> Self {
        SqlValue { data: SqlData::Null, hint }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.data, SqlData::Null)
    }
}

fn mysql_time_to_chrono_date(t: &MysqlTime) -> Option<ChronoDate> {
    #[cfg(feature = "with-chrono")]
    {
        time::chrono_conv::to_naive_date(t).ok()
    }
    #[cfg(not(feature = "with-chrono"))]
    {
        Some(*t)
    }
}

fn mysql_time_to_chrono_time(t: &MysqlTime) -> Option<ChronoTime> {
    #[cfg(feature = "with-chrono")]
    {
        time::chrono_conv::to_duration(t).ok()
    }
    #[cfg(not(feature = "with-chrono"))]
    {
        Some(*t)
    }
}

fn mysql_time_to_chrono_datetime(t: &MysqlTime) -> Option<ChronoDateTime> {
    #[cfg(feature = "with-chrono")]
    {
        time::chrono_conv::to_naive_datetime(t).ok()
    }
    #[cfg(not(feature = "with-chrono"))]
    {
        Some(*t)
    }
}

fn chrono_date_to_mysql_time(d: &ChronoDate) -> MysqlTime {
    #[cfg(feature = "with-chrono")]
    {
        time::chrono_conv::from_naive_date(*d)
    }
    #[cfg(not(feature = "with-chrono"))]
    {
        *d
    }
}

fn chrono_datetime_to_mysql_time(d: &ChronoDateTime) -> MysqlTime {
    #[cfg(feature = "with-chrono")]
    {
        time::chrono_conv::from_naive_datetime(*d)
    }
    #[cfg(not(feature = "with-chrono"))]
    {
        *d
    }
}

fn chrono_time_to_mysql_time(d: &ChronoTime) -> MysqlTime {
    #[cfg(feature = "with-chrono")]
    {
        let total_micros = d.num_microseconds().unwrap_or(0);
        let neg = total_micros < 0;
        let micros = total_micros.unsigned_abs();
        MysqlTime {
            hour: (micros / 3_600_000_000) as u16,
            minute: ((micros / 60_000_000) % 60) as u8,
            second: ((micros / 1_000_000) % 60) as u8,
            second_part: (micros % 1_000_000) as u32,
            neg,
            time_type: MysqlTimeType::Time,
            ..MysqlTime::zero(MysqlTimeType::Time)
        }
    }
    #[cfg(not(feature = "with-chrono"))]
    {
        *d
    }
}

/// Map a `SqlValue` to the nearest MySQL native type. Conversion failures
/// of non-null values produce a null `NativeValue` (data loss is
/// preferred over silent misencoding).
pub fn sql_to_native(value: &SqlValue) -> NativeValue {
    let wrap = |data: NativeData, column_type: ColumnType, flags: ColumnFlags| NativeValue {
        data,
        column_type,
        flags,
        charset: if matches!(column_type, ColumnType::MYSQL_TYPE_BLOB) && value.hint == TypeHint::Blob {
            63
        } else {
            33
        },
    };

    if value.is_null() {
        let column_type = native_type_for_hint(value.hint);
        return NativeValue::null(column_type);
    }

    match &value.data {
        SqlData::Null => NativeValue::null(native_type_for_hint(value.hint)),
        SqlData::Bool(b) => wrap(NativeData::Bool(*b), ColumnType::MYSQL_TYPE_TINY, ColumnFlags::empty()),
        SqlData::Int8(v) => wrap(NativeData::I8(*v), ColumnType::MYSQL_TYPE_TINY, ColumnFlags::empty()),
        SqlData::Int16(v) => wrap(NativeData::I16(*v), ColumnType::MYSQL_TYPE_SHORT, ColumnFlags::empty()),
        SqlData::Int32(v) => wrap(NativeData::I32(*v), ColumnType::MYSQL_TYPE_LONG, ColumnFlags::empty()),
        SqlData::Int64(v) => wrap(NativeData::I64(*v), ColumnType::MYSQL_TYPE_LONGLONG, ColumnFlags::empty()),
        SqlData::UInt8(v) => wrap(NativeData::U8(*v), ColumnType::MYSQL_TYPE_TINY, ColumnFlags::UNSIGNED_FLAG),
        SqlData::UInt16(v) => wrap(NativeData::U16(*v), ColumnType::MYSQL_TYPE_SHORT, ColumnFlags::UNSIGNED_FLAG),
        SqlData::UInt32(v) => wrap(NativeData::U32(*v), ColumnType::MYSQL_TYPE_LONG, ColumnFlags::UNSIGNED_FLAG),
        SqlData::UInt64(v) => wrap(NativeData::U64(*v), ColumnType::MYSQL_TYPE_LONGLONG, ColumnFlags::UNSIGNED_FLAG),
        SqlData::Float(v) => wrap(NativeData::Float(*v), ColumnType::MYSQL_TYPE_FLOAT, ColumnFlags::empty()),
        SqlData::Double(v) => wrap(NativeData::Double(*v), ColumnType::MYSQL_TYPE_DOUBLE, ColumnFlags::empty()),
        SqlData::String(s) => {
            let column_type = match value.hint {
                TypeHint::Json => ColumnType::MYSQL_TYPE_JSON,
                TypeHint::Decimal | TypeHint::Numeric => ColumnType::MYSQL_TYPE_NEWDECIMAL,
                _ => ColumnType::MYSQL_TYPE_VAR_STRING,
            };
            wrap(NativeData::String(s.clone()), column_type, ColumnFlags::empty())
        }
        SqlData::Blob(b) => wrap(NativeData::Bytes(b.clone()), ColumnType::MYSQL_TYPE_BLOB, ColumnFlags::BINARY_FLAG),
        SqlData::ChronoDate(d) => {
            wrap(NativeData::Time(chrono_date_to_mysql_time(d)), ColumnType::MYSQL_TYPE_DATE, ColumnFlags::empty())
        }
        SqlData::ChronoTime(t) => {
            wrap(NativeData::Time(chrono_time_to_mysql_time(t)), ColumnType::MYSQL_TYPE_TIME, ColumnFlags::empty())
        }
        SqlData::ChronoDateTime(dt) => {
            let column_type = if value.hint == TypeHint::Timestamp {
                ColumnType::MYSQL_TYPE_TIMESTAMP
            } else {
                ColumnType::MYSQL_TYPE_DATETIME
            };
            wrap(NativeData::Time(chrono_datetime_to_mysql_time(dt)), column_type, ColumnFlags::empty())
        }
    }
}

fn native_type_for_hint(hint: TypeHint) -> ColumnType {
    match hint {
        TypeHint::Bool | TypeHint::Int8 | TypeHint::UInt8 => ColumnType::MYSQL_TYPE_TINY,
        TypeHint::Int16 | TypeHint::UInt16 => ColumnType::MYSQL_TYPE_SHORT,
        TypeHint::Int32 | TypeHint::UInt32 => ColumnType::MYSQL_TYPE_LONG,
        TypeHint::Int64 | TypeHint::UInt64 => ColumnType::MYSQL_TYPE_LONGLONG,
        TypeHint::Float => ColumnType::MYSQL_TYPE_FLOAT,
        TypeHint::Double => ColumnType::MYSQL_TYPE_DOUBLE,
        TypeHint::Json => ColumnType::MYSQL_TYPE_JSON,
        TypeHint::Decimal | TypeHint::Numeric => ColumnType::MYSQL_TYPE_NEWDECIMAL,
        TypeHint::Date => ColumnType::MYSQL_TYPE_DATE,
        TypeHint::Time => ColumnType::MYSQL_TYPE_TIME,
        TypeHint::Timestamp => ColumnType::MYSQL_TYPE_TIMESTAMP,
        TypeHint::DateTime => ColumnType::MYSQL_TYPE_DATETIME,
        TypeHint::ByteArray | TypeHint::Blob => ColumnType::MYSQL_TYPE_BLOB,
        _ => ColumnType::MYSQL_TYPE_VAR_STRING,
    }
}

/// Map a `NativeValue` back to a `SqlValue`, dispatching on the native
/// data variant; `Time` is routed by its `MysqlTimeType` discriminator.
pub fn native_to_sql(value: &NativeValue) -> SqlValue {
    if value.is_null() {
        return SqlValue::null(hint_for_native_type(value.column_type));
    }

    let hint = hint_for_native_type(value.column_type);
    let data = match &value.data {
        NativeData::Null => SqlData::Null,
        NativeData::Bool(b) => SqlData::Bool(*b),
        NativeData::I8(v) => SqlData::Int8(*v),
        NativeData::I16(v) => SqlData::Int16(*v),
        NativeData::I32(v) => SqlData::Int32(*v),
        NativeData::I64(v) => SqlData::Int64(*v),
        NativeData::U8(v) => SqlData::UInt8(*v),
        NativeData::U16(v) => SqlData::UInt16(*v),
        NativeData::U32(v) => SqlData::UInt32(*v),
        NativeData::U64(v) => SqlData::UInt64(*v),
        NativeData::Float(v) => SqlData::Float(*v),
        NativeData::Double(v) => SqlData::Double(*v),
        NativeData::String(s) => SqlData::String(s.clone()),
        NativeData::Bytes(b) => SqlData::Blob(b.clone()),
        NativeData::Time(t) => match t.time_type {
            MysqlTimeType::Date => match mysql_time_to_chrono_date(t) {
                Some(d) => SqlData::ChronoDate(d),
                None => SqlData::Null,
            },
            MysqlTimeType::Time => match mysql_time_to_chrono_time(t) {
                Some(d) => SqlData::ChronoTime(d),
                None => SqlData::Null,
            },
            MysqlTimeType::DateTime | MysqlTimeType::DateTimeWithZone => match mysql_time_to_chrono_datetime(t) {
                Some(d) => SqlData::ChronoDateTime(d),
                None => SqlData::Null,
            },
            MysqlTimeType::None | MysqlTimeType::Error => SqlData::Null,
        },
    };
    SqlValue { data, hint }
}

fn hint_for_native_type(column_type: ColumnType) -> TypeHint {
    use ColumnType::*;
    match column_type {
        MYSQL_TYPE_TINY => TypeHint::Int8,
        MYSQL_TYPE_SHORT | MYSQL_TYPE_YEAR => TypeHint::Int16,
        MYSQL_TYPE_INT24 | MYSQL_TYPE_LONG => TypeHint::Int32,
        MYSQL_TYPE_LONGLONG => TypeHint::Int64,
        MYSQL_TYPE_FLOAT => TypeHint::Float,
        MYSQL_TYPE_DOUBLE => TypeHint::Double,
        MYSQL_TYPE_JSON => TypeHint::Json,
        MYSQL_TYPE_DECIMAL | MYSQL_TYPE_NEWDECIMAL => TypeHint::Decimal,
        MYSQL_TYPE_DATE | MYSQL_TYPE_NEWDATE => TypeHint::Date,
        MYSQL_TYPE_TIME | MYSQL_TYPE_TIME2 => TypeHint::Time,
        MYSQL_TYPE_TIMESTAMP | MYSQL_TYPE_TIMESTAMP2 => TypeHint::Timestamp,
        MYSQL_TYPE_DATETIME | MYSQL_TYPE_DATETIME2 => TypeHint::DateTime,
        MYSQL_TYPE_BLOB | MYSQL_TYPE_TINY_BLOB | MYSQL_TYPE_MEDIUM_BLOB | MYSQL_TYPE_LONG_BLOB | MYSQL_TYPE_GEOMETRY => {
            TypeHint::Blob
        }
        MYSQL_TYPE_BIT => TypeHint::ByteArray,
        _ => TypeHint::String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_int_round_trips_through_native() {
        let sql = SqlValue {
            data: SqlData::UInt32(42),
            hint: TypeHint::UInt32,
        };
        let native = sql_to_native(&sql);
        assert!(native.flags.contains(ColumnFlags::UNSIGNED_FLAG));
        let back = native_to_sql(&native);
        assert!(matches!(back.data, SqlData::UInt32(42)));
    }

    #[test]
    fn null_value_preserves_type_provenance() {
        let sql = SqlValue::null(TypeHint::Int64);
        let native = sql_to_native(&sql);
        assert!(native.is_null());
        assert_eq!(native.column_type, ColumnType::MYSQL_TYPE_LONGLONG);
    }

    #[test]
    fn json_string_carries_json_native_tag() {
        let sql = SqlValue {
            data: SqlData::String("{}".into()),
            hint: TypeHint::Json,
        };
        let native = sql_to_native(&sql);
        assert_eq!(native.column_type, ColumnType::MYSQL_TYPE_JSON);
    }

    #[test]
    fn date_native_value_maps_to_chrono_date_hint() {
        let date_native = NativeValue {
            data: NativeData::Time(MysqlTime {
                year: 2024,
                month: 3,
                day: 1,
                ..MysqlTime::zero(MysqlTimeType::Date)
            }),
            column_type: ColumnType::MYSQL_TYPE_DATE,
            flags: ColumnFlags::empty(),
            charset: 33,
        };
        let sql = native_to_sql(&date_native);
        assert_eq!(sql.hint, TypeHint::Date);
        assert!(matches!(sql.data, SqlData::ChronoDate(_)));
    }
}
