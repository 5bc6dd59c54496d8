//! `NativeValue` — the protocol-layer tagged value — plus the binary
//! protocol's wire-level temporal structs and NULL bitmap, grounded on the
//! teacher crate's `src/value.rs`. The teacher's `Value<'a>` type borrows
//! from the row buffer; this driver always needs an owned value past the
//! point of decode (rows are fully stored, per the spec's "stored results"
//! requirement), so `NativeValue` owns its payload instead of borrowing.

use crate::constant::{ColumnFlags, ColumnType};
use crate::error::{self, Error, Result};
use crate::protocol::primitive::*;
use zerocopy::FromBytes;
use zerocopy::byteorder::little_endian::{U16 as U16LE, U32 as U32LE};
use zerocopy::{Immutable, KnownLayout};

/// Discriminator for [`MysqlTime`], matching the four real temporal kinds
/// plus the two sentinel states used when a value isn't a real timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MysqlTimeType {
    Date,
    Time,
    DateTime,
    DateTimeWithZone,
    None,
    Error,
}

/// A MYSQL_TIME-equivalent temporal record. Zero-date (`0000-00-00`) is a
/// legal encoding, distinct from SQL NULL, represented here as a `Date`/
/// `DateTime` value with all calendar fields zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MysqlTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u16,
    pub minute: u8,
    pub second: u8,
    pub second_part: u32,
    pub neg: bool,
    pub time_type: MysqlTimeType,
}

impl MysqlTime {
    pub const fn zero(time_type: MysqlTimeType) -> Self {
        MysqlTime {
            year: 0,
            month: 0,
            day: 0,
            hour: 0,
            minute: 0,
            second: 0,
            second_part: 0,
            neg: false,
            time_type,
        }
    }
}

/// The protocol-layer tagged value. Carries the originating column's type
/// tag, flags, and charset alongside the decoded datum so that provenance
/// survives even through a `Null`.
#[derive(Debug, Clone)]
pub struct NativeValue {
    pub data: NativeData,
    pub column_type: ColumnType,
    pub flags: ColumnFlags,
    pub charset: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NativeData {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Float(f32),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    Time(MysqlTime),
}

impl NativeValue {
    pub fn null(column_type: ColumnType) -> Self {
        NativeValue {
            data: NativeData::Null,
            column_type,
            flags: ColumnFlags::empty(),
            charset: 0,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.data, NativeData::Null)
    }
}

// ============================================================================
// Wire-level temporal structs (binary protocol)
// ============================================================================

#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
pub struct Timestamp4 {
    pub year: U16LE,
    pub month: u8,
    pub day: u8,
}

#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
pub struct Timestamp7 {
    pub year: U16LE,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
pub struct Timestamp11 {
    pub year: U16LE,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub microsecond: U32LE,
}

#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
pub struct Time8 {
    pub is_negative: u8,
    pub days: U32LE,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
pub struct Time12 {
    pub is_negative: u8,
    pub days: U32LE,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub microsecond: U32LE,
}

fn timestamp_time_type(column_type: ColumnType) -> MysqlTimeType {
    match column_type {
        ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE => MysqlTimeType::Date,
        _ => MysqlTimeType::DateTime,
    }
}

fn time_from_timestamp4(ts: &Timestamp4, time_type: MysqlTimeType) -> MysqlTime {
    MysqlTime {
        year: ts.year.get(),
        month: ts.month,
        day: ts.day,
        time_type,
        ..MysqlTime::zero(time_type)
    }
}

fn time_from_timestamp7(ts: &Timestamp7, time_type: MysqlTimeType) -> MysqlTime {
    MysqlTime {
        year: ts.year.get(),
        month: ts.month,
        day: ts.day,
        hour: ts.hour as u16,
        minute: ts.minute,
        second: ts.second,
        time_type,
        ..MysqlTime::zero(time_type)
    }
}

fn time_from_timestamp11(ts: &Timestamp11, time_type: MysqlTimeType) -> MysqlTime {
    MysqlTime {
        year: ts.year.get(),
        month: ts.month,
        day: ts.day,
        hour: ts.hour as u16,
        minute: ts.minute,
        second: ts.second,
        second_part: ts.microsecond.get(),
        time_type,
        ..MysqlTime::zero(time_type)
    }
}

fn time_from_time8(t: &Time8) -> MysqlTime {
    MysqlTime {
        hour: (t.days.get() as u16).saturating_mul(24).saturating_add(t.hour as u16),
        minute: t.minute,
        second: t.second,
        neg: t.is_negative != 0,
        time_type: MysqlTimeType::Time,
        ..MysqlTime::zero(MysqlTimeType::Time)
    }
}

fn time_from_time12(t: &Time12) -> MysqlTime {
    MysqlTime {
        hour: (t.days.get() as u16).saturating_mul(24).saturating_add(t.hour as u16),
        minute: t.minute,
        second: t.second,
        second_part: t.microsecond.get(),
        neg: t.is_negative != 0,
        time_type: MysqlTimeType::Time,
        ..MysqlTime::zero(MysqlTimeType::Time)
    }
}

// ============================================================================
// NULL bitmap
// ============================================================================

/// NULL bitmap for the binary protocol. `for_result_set` uses a 2-bit
/// offset (COM_STMT_EXECUTE response rows); `for_parameters` uses a 0-bit
/// offset (COM_STMT_EXECUTE parameter values).
#[derive(Debug, Clone, Copy)]
pub struct NullBitmap<'a> {
    bitmap: &'a [u8],
    offset: usize,
}

impl<'a> NullBitmap<'a> {
    pub fn for_result_set(bitmap: &'a [u8]) -> Self {
        Self { bitmap, offset: 2 }
    }

    pub fn for_parameters(bitmap: &'a [u8]) -> Self {
        Self { bitmap, offset: 0 }
    }

    pub fn is_null(&self, idx: usize) -> bool {
        let bit_pos = idx + self.offset;
        let byte_pos = bit_pos >> 3;
        let bit_offset = bit_pos & 7;
        if byte_pos >= self.bitmap.len() {
            return false;
        }
        (self.bitmap[byte_pos] & (1 << bit_offset)) != 0
    }

    pub fn byte_len(num_columns: usize, offset: usize) -> usize {
        (num_columns + offset).div_ceil(8)
    }
}

/// Build an all-zero NULL bitmap for `num_columns` parameters and mark
/// each NULL parameter's bit (offset 0, per `for_parameters`).
pub fn build_parameter_null_bitmap(is_null: &[bool]) -> Vec<u8> {
    let mut bitmap = vec![0u8; NullBitmap::byte_len(is_null.len(), 0)];
    for (idx, &null) in is_null.iter().enumerate() {
        if null {
            bitmap[idx >> 3] |= 1 << (idx & 7);
        }
    }
    bitmap
}

// ============================================================================
// Binary protocol decode
// ============================================================================

/// Decode one binary-protocol value (`bound_result_to_native`). `declared_length`
/// is the column's declared display length, used only for the TINY(1)-as-bool
/// heuristic that mirrors text-protocol behaviour.
pub fn decode_binary_value<'a>(
    column_type: ColumnType,
    flags: ColumnFlags,
    charset: u16,
    declared_length: u32,
    data: &'a [u8],
) -> Result<(NativeValue, &'a [u8])> {
    let is_unsigned = flags.contains(ColumnFlags::UNSIGNED_FLAG);
    let wrap = |data: NativeData| NativeValue {
        data,
        column_type,
        flags,
        charset,
    };

    match column_type {
        ColumnType::MYSQL_TYPE_NULL => Ok((NativeValue::null(column_type), data)),

        ColumnType::MYSQL_TYPE_TINY => {
            let (val, rest) = read_int_1(data)?;
            let value = if declared_length == 1 && !is_unsigned {
                wrap(NativeData::Bool(val != 0))
            } else if is_unsigned {
                wrap(NativeData::U8(val))
            } else {
                wrap(NativeData::I8(val as i8))
            };
            Ok((value, rest))
        }

        ColumnType::MYSQL_TYPE_SHORT | ColumnType::MYSQL_TYPE_YEAR => {
            let (val, rest) = read_int_2(data)?;
            let value = if is_unsigned {
                wrap(NativeData::U16(val))
            } else {
                wrap(NativeData::I16(val as i16))
            };
            Ok((value, rest))
        }

        ColumnType::MYSQL_TYPE_INT24 | ColumnType::MYSQL_TYPE_LONG => {
            let (val, rest) = read_int_4(data)?;
            let value = if is_unsigned {
                wrap(NativeData::U32(val))
            } else {
                wrap(NativeData::I32(val as i32))
            };
            Ok((value, rest))
        }

        ColumnType::MYSQL_TYPE_LONGLONG => {
            let (val, rest) = read_int_8(data)?;
            let value = if is_unsigned {
                wrap(NativeData::U64(val))
            } else {
                wrap(NativeData::I64(val as i64))
            };
            Ok((value, rest))
        }

        ColumnType::MYSQL_TYPE_FLOAT => {
            let (val, rest) = read_int_4(data)?;
            Ok((wrap(NativeData::Float(f32::from_bits(val))), rest))
        }

        ColumnType::MYSQL_TYPE_DOUBLE => {
            let (val, rest) = read_int_8(data)?;
            Ok((wrap(NativeData::Double(f64::from_bits(val))), rest))
        }

        ColumnType::MYSQL_TYPE_DATE
        | ColumnType::MYSQL_TYPE_DATETIME
        | ColumnType::MYSQL_TYPE_TIMESTAMP
        | ColumnType::MYSQL_TYPE_TIMESTAMP2
        | ColumnType::MYSQL_TYPE_DATETIME2
        | ColumnType::MYSQL_TYPE_NEWDATE => {
            let time_type = timestamp_time_type(column_type);
            let (len, rest) = read_int_1(data)?;
            match len {
                0 => Ok((wrap(NativeData::Time(MysqlTime::zero(time_type))), rest)),
                4 => {
                    let (bytes, rest) = read_string_fix(rest, 4)?;
                    let ts = Timestamp4::ref_from_bytes(bytes).map_err(|_| Error::InvalidPacket)?;
                    Ok((wrap(NativeData::Time(time_from_timestamp4(ts, time_type))), rest))
                }
                7 => {
                    let (bytes, rest) = read_string_fix(rest, 7)?;
                    let ts = Timestamp7::ref_from_bytes(bytes).map_err(|_| Error::InvalidPacket)?;
                    Ok((wrap(NativeData::Time(time_from_timestamp7(ts, time_type))), rest))
                }
                11 => {
                    let (bytes, rest) = read_string_fix(rest, 11)?;
                    let ts = Timestamp11::ref_from_bytes(bytes).map_err(|_| Error::InvalidPacket)?;
                    Ok((wrap(NativeData::Time(time_from_timestamp11(ts, time_type))), rest))
                }
                _ => Err(Error::data(
                    error::code::DATA_INVALID_FORMAT,
                    format!("invalid timestamp length {len}"),
                )),
            }
        }

        ColumnType::MYSQL_TYPE_TIME | ColumnType::MYSQL_TYPE_TIME2 => {
            let (len, rest) = read_int_1(data)?;
            match len {
                0 => Ok((wrap(NativeData::Time(MysqlTime::zero(MysqlTimeType::Time))), rest)),
                8 => {
                    let (bytes, rest) = read_string_fix(rest, 8)?;
                    let t = Time8::ref_from_bytes(bytes).map_err(|_| Error::InvalidPacket)?;
                    Ok((wrap(NativeData::Time(time_from_time8(t))), rest))
                }
                12 => {
                    let (bytes, rest) = read_string_fix(rest, 12)?;
                    let t = Time12::ref_from_bytes(bytes).map_err(|_| Error::InvalidPacket)?;
                    Ok((wrap(NativeData::Time(time_from_time12(t))), rest))
                }
                _ => Err(Error::data(
                    error::code::DATA_INVALID_FORMAT,
                    format!("invalid time length {len}"),
                )),
            }
        }

        ColumnType::MYSQL_TYPE_VARCHAR
        | ColumnType::MYSQL_TYPE_VAR_STRING
        | ColumnType::MYSQL_TYPE_STRING
        | ColumnType::MYSQL_TYPE_BLOB
        | ColumnType::MYSQL_TYPE_TINY_BLOB
        | ColumnType::MYSQL_TYPE_MEDIUM_BLOB
        | ColumnType::MYSQL_TYPE_LONG_BLOB
        | ColumnType::MYSQL_TYPE_GEOMETRY
        | ColumnType::MYSQL_TYPE_JSON
        | ColumnType::MYSQL_TYPE_DECIMAL
        | ColumnType::MYSQL_TYPE_NEWDECIMAL
        | ColumnType::MYSQL_TYPE_ENUM
        | ColumnType::MYSQL_TYPE_SET
        | ColumnType::MYSQL_TYPE_BIT => {
            let (bytes, rest) = read_string_lenenc(data)?;
            let value = if flags.contains(ColumnFlags::BINARY_FLAG) && charset == 63 {
                wrap(NativeData::Bytes(bytes.to_vec()))
            } else {
                wrap(NativeData::String(String::from_utf8_lossy(bytes).into_owned()))
            };
            Ok((value, rest))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiny_with_declared_length_one_decodes_as_bool() {
        let (value, rest) =
            decode_binary_value(ColumnType::MYSQL_TYPE_TINY, ColumnFlags::empty(), 33, 1, &[1, 0xaa]).unwrap();
        assert_eq!(value.data, NativeData::Bool(true));
        assert_eq!(rest, &[0xaa]);
    }

    #[test]
    fn tiny_with_declared_length_other_than_one_is_integer() {
        let (value, _) =
            decode_binary_value(ColumnType::MYSQL_TYPE_TINY, ColumnFlags::empty(), 33, 4, &[2]).unwrap();
        assert_eq!(value.data, NativeData::I8(2));
    }

    #[test]
    fn unsigned_longlong_decodes_full_range() {
        let mut data = Vec::new();
        write_int_8(&mut data, u64::MAX);
        let (value, _) = decode_binary_value(
            ColumnType::MYSQL_TYPE_LONGLONG,
            ColumnFlags::UNSIGNED_FLAG,
            33,
            20,
            &data,
        )
        .unwrap();
        assert_eq!(value.data, NativeData::U64(u64::MAX));
    }

    #[test]
    fn zero_length_timestamp_is_zero_date() {
        let (value, rest) =
            decode_binary_value(ColumnType::MYSQL_TYPE_DATE, ColumnFlags::empty(), 33, 10, &[0]).unwrap();
        match value.data {
            NativeData::Time(t) => {
                assert_eq!(t.time_type, MysqlTimeType::Date);
                assert_eq!(t.year, 0);
            }
            _ => panic!("expected Time"),
        }
        assert!(rest.is_empty());
    }

    #[test]
    fn binary_null_bitmap_offsets_differ_for_results_and_params() {
        let bitmap = [0b0000_0100];
        let result_bitmap = NullBitmap::for_result_set(&bitmap);
        let param_bitmap = NullBitmap::for_parameters(&bitmap);
        assert!(result_bitmap.is_null(0));
        assert!(!param_bitmap.is_null(0));
        assert!(param_bitmap.is_null(2));
    }
}
