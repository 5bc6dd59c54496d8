//! Command-phase wire builders and response readers: COM_QUERY (text
//! protocol), COM_STMT_PREPARE/EXECUTE/FETCH/CLOSE/RESET (binary protocol),
//! and the housekeeping commands (COM_PING, COM_QUIT, COM_INIT_DB,
//! COM_RESET_CONNECTION). Grounded on the teacher crate's
//! `protocol/command/{text,query,prepared,utility,resultset}.rs`, stripped
//! of the async state-machine/buffer-pool scaffolding (`Exec`, `Query`,
//! `BufferSet`, `Action`) since this driver reads one blocking packet at a
//! time instead of driving a poll-style state machine.

use crate::constant::{ColumnFlags, ColumnType, CommandByte};
use crate::error::{code, Error, Result};
use crate::protocol::bind::decode_binary_row;
use crate::protocol::column::FieldMeta;
use crate::protocol::primitive::*;
use crate::protocol::response::{ErrPayload, ErrPayloadBytes, OkPayload, OkPayloadBytes};
use crate::protocol::time;
use crate::protocol::value::{NativeData, NativeValue};
use zerocopy::FromBytes;
use zerocopy::byteorder::little_endian::{U16 as U16LE, U32 as U32LE};
use zerocopy::{Immutable, KnownLayout};

pub fn write_query(out: &mut Vec<u8>, sql: &str) {
    write_int_1(out, CommandByte::Query as u8);
    out.extend_from_slice(sql.as_bytes());
}

pub fn write_ping(out: &mut Vec<u8>) {
    write_int_1(out, CommandByte::Ping as u8);
}

pub fn write_quit(out: &mut Vec<u8>) {
    write_int_1(out, CommandByte::Quit as u8);
}

pub fn write_init_db(out: &mut Vec<u8>, database: &str) {
    write_int_1(out, CommandByte::InitDb as u8);
    out.extend_from_slice(database.as_bytes());
}

pub fn write_reset_connection(out: &mut Vec<u8>) {
    write_int_1(out, CommandByte::ResetConnection as u8);
}

pub fn write_prepare(out: &mut Vec<u8>, sql: &str) {
    write_int_1(out, CommandByte::StmtPrepare as u8);
    out.extend_from_slice(sql.as_bytes());
}

pub fn write_close_statement(out: &mut Vec<u8>, statement_id: u32) {
    write_int_1(out, CommandByte::StmtClose as u8);
    write_int_4(out, statement_id);
}

pub fn write_reset_statement(out: &mut Vec<u8>, statement_id: u32) {
    write_int_1(out, CommandByte::StmtReset as u8);
    write_int_4(out, statement_id);
}

pub fn write_fetch_statement(out: &mut Vec<u8>, statement_id: u32, num_rows: u32) {
    write_int_1(out, CommandByte::StmtFetch as u8);
    write_int_4(out, statement_id);
    write_int_4(out, num_rows);
}

pub fn write_execute_header(out: &mut Vec<u8>, statement_id: u32) {
    write_int_1(out, CommandByte::StmtExecute as u8);
    write_int_4(out, statement_id);
    write_int_1(out, 0x00); // CURSOR_TYPE_NO_CURSOR
    write_int_4(out, 1); // iteration_count
}

/// A generic "did this command return an OK packet or a result set"
/// response, shared by COM_QUERY and COM_STMT_EXECUTE.
#[derive(Debug)]
pub enum CommandResponse {
    Ok(OkPayload),
    ResultSet { column_count: u64 },
}

pub fn read_command_response(payload: &[u8]) -> Result<CommandResponse> {
    if payload.is_empty() {
        return Err(Error::UnexpectedEof);
    }
    match payload[0] {
        0xff => Err(Error::from(ErrPayload::try_from(ErrPayloadBytes(payload))?)),
        0x00 => Ok(CommandResponse::Ok(OkPayload::try_from(OkPayloadBytes(payload))?)),
        0xfb => Err(Error::BadConfig("LOCAL INFILE is not supported".into())),
        _ => {
            let (column_count, _rest) = read_int_lenenc(payload)?;
            Ok(CommandResponse::ResultSet { column_count })
        }
    }
}

#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
pub struct PrepareOk {
    statement_id: U32LE,
    num_columns: U16LE,
    num_params: U16LE,
    _reserved: u8,
    warning_count: U16LE,
}

impl PrepareOk {
    pub fn statement_id(&self) -> u32 {
        self.statement_id.get()
    }

    pub fn num_columns(&self) -> u16 {
        self.num_columns.get()
    }

    pub fn num_params(&self) -> u16 {
        self.num_params.get()
    }

    pub fn warning_count(&self) -> u16 {
        self.warning_count.get()
    }
}

pub fn read_prepare_ok(payload: &[u8]) -> Result<PrepareOk> {
    let (status, data) = read_int_1(payload)?;
    if status == 0xff {
        return Err(Error::from(ErrPayload::try_from(ErrPayloadBytes(payload))?));
    }
    if data.len() < 11 {
        return Err(Error::UnexpectedEof);
    }
    PrepareOk::read_from_bytes(&data[..11]).map_err(|_| Error::InvalidPacket)
}

/// Decode a single text-protocol row. Every non-NULL column arrives as a
/// length-encoded string (`0xfb` marks NULL); the caller's [`FieldMeta`]
/// supplies the column-type tag that's preserved on the decoded value even
/// though the wire representation is uniformly textual.
pub fn decode_text_row(payload: &[u8], fields: &[FieldMeta]) -> Result<Vec<NativeValue>> {
    let mut data = payload;
    let mut values = Vec::with_capacity(fields.len());
    for field in fields {
        if data.first() == Some(&0xfb) {
            data = &data[1..];
            values.push(NativeValue::null(field.native_type));
            continue;
        }
        let (bytes, rest) = read_string_lenenc(data)?;
        data = rest;
        let text = String::from_utf8_lossy(bytes).into_owned();
        let native_data = row_field_to_native(&text, bytes, field)?;
        values.push(NativeValue {
            data: native_data,
            column_type: field.native_type,
            flags: field.flags,
            charset: field.charset,
        });
    }
    Ok(values)
}

fn parse_whole<T: std::str::FromStr>(text: &str, what: &str) -> Result<T> {
    text.parse()
        .map_err(|_| Error::data(code::DATA_OUT_OF_RANGE, format!("{what} out of range or malformed: {text:?}")))
}

/// Decodes one text-protocol column per the field's declared type,
/// signedness, and length. `raw` is the column's raw (non-UTF8-lossy)
/// bytes, used for the byte-vector cases; `text` is its lossy-decoded
/// form, used for every numeric/temporal/string case.
fn row_field_to_native(text: &str, raw: &[u8], field: &FieldMeta) -> Result<NativeData> {
    let is_unsigned = field.flags.contains(ColumnFlags::UNSIGNED_FLAG);
    match field.native_type {
        ColumnType::MYSQL_TYPE_TINY => {
            if field.declared_length == 1 && !is_unsigned {
                return match text {
                    "0" => Ok(NativeData::Bool(false)),
                    "1" => Ok(NativeData::Bool(true)),
                    _ => Err(Error::data(
                        code::DATA_INVALID_FORMAT,
                        format!("expected \"0\" or \"1\" for boolean TINY column, got {text:?}"),
                    )),
                };
            }
            if is_unsigned {
                Ok(NativeData::U8(parse_whole(text, "TINY UNSIGNED")?))
            } else {
                Ok(NativeData::I8(parse_whole(text, "TINY")?))
            }
        }
        ColumnType::MYSQL_TYPE_SHORT => {
            if is_unsigned {
                Ok(NativeData::U16(parse_whole(text, "SHORT UNSIGNED")?))
            } else {
                Ok(NativeData::I16(parse_whole(text, "SHORT")?))
            }
        }
        ColumnType::MYSQL_TYPE_INT24 | ColumnType::MYSQL_TYPE_LONG => {
            if is_unsigned {
                Ok(NativeData::U32(parse_whole(text, "INT UNSIGNED")?))
            } else {
                Ok(NativeData::I32(parse_whole(text, "INT")?))
            }
        }
        ColumnType::MYSQL_TYPE_LONGLONG => {
            if is_unsigned {
                Ok(NativeData::U64(parse_whole(text, "BIGINT UNSIGNED")?))
            } else {
                Ok(NativeData::I64(parse_whole(text, "BIGINT")?))
            }
        }
        ColumnType::MYSQL_TYPE_FLOAT => Ok(NativeData::Float(parse_whole(text, "FLOAT")?)),
        ColumnType::MYSQL_TYPE_DOUBLE => Ok(NativeData::Double(parse_whole(text, "DOUBLE")?)),
        ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE => Ok(NativeData::Time(time::parse_date(text)?)),
        ColumnType::MYSQL_TYPE_TIME | ColumnType::MYSQL_TYPE_TIME2 => Ok(NativeData::Time(time::parse_time(text)?)),
        ColumnType::MYSQL_TYPE_DATETIME
        | ColumnType::MYSQL_TYPE_DATETIME2
        | ColumnType::MYSQL_TYPE_TIMESTAMP
        | ColumnType::MYSQL_TYPE_TIMESTAMP2 => Ok(NativeData::Time(time::parse_datetime(text)?)),
        ColumnType::MYSQL_TYPE_VAR_STRING | ColumnType::MYSQL_TYPE_VARCHAR | ColumnType::MYSQL_TYPE_STRING => {
            if field.flags.contains(ColumnFlags::BINARY_FLAG) && field.charset == 63 {
                Ok(NativeData::Bytes(raw.to_vec()))
            } else {
                Ok(NativeData::String(text.to_string()))
            }
        }
        ColumnType::MYSQL_TYPE_BLOB
        | ColumnType::MYSQL_TYPE_TINY_BLOB
        | ColumnType::MYSQL_TYPE_MEDIUM_BLOB
        | ColumnType::MYSQL_TYPE_LONG_BLOB
        | ColumnType::MYSQL_TYPE_GEOMETRY
        | ColumnType::MYSQL_TYPE_BIT => Ok(NativeData::Bytes(raw.to_vec())),
        // DECIMAL/NEWDECIMAL/ENUM/SET/YEAR/JSON, and anything else: retained
        // as an owned string per the text-protocol decode rules.
        _ => Ok(NativeData::String(text.to_string())),
    }
}

/// Decode a binary-protocol row (COM_STMT_EXECUTE / COM_STMT_FETCH result
/// rows), dispatching to [`decode_binary_row`] for the per-column work.
pub fn decode_execute_row(payload: &[u8], fields: &[FieldMeta]) -> Result<Vec<NativeValue>> {
    decode_binary_row(payload, fields)
}

/// `0xfe` with a short payload is an EOF/OK-with-EOF-capability marker; a
/// genuine string<lenenc> row can also start with `0xfe` only when its
/// length prefix implies a payload of exactly `2^24 - 4` bytes, the
/// physical single-packet maximum minus the header — so any shorter
/// `0xfe`-led payload is unambiguously the end-of-rows marker.
const MAX_SINGLE_PACKET_PAYLOAD: usize = (1 << 24) - 4;

pub fn is_end_of_rows_marker(payload: &[u8]) -> bool {
    matches!(payload.first(), Some(0xfe)) && payload.len() != MAX_SINGLE_PACKET_PAYLOAD
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_field() -> FieldMeta {
        FieldMeta {
            name: "id".into(),
            org_name: "id".into(),
            table: "t".into(),
            org_table: "t".into(),
            database: "db".into(),
            catalog: "def".into(),
            native_type: ColumnType::MYSQL_TYPE_VAR_STRING,
            charset: 33,
            declared_length: 10,
            max_observed_length: 0,
            flags: ColumnFlags::empty(),
            decimals: 0,
            default_value: NativeValue::null(ColumnType::MYSQL_TYPE_VAR_STRING),
        }
    }

    #[test]
    fn text_row_decodes_null_and_string_columns() {
        let fields = vec![sample_field(), sample_field()];
        let mut payload = Vec::new();
        payload.push(0xfb);
        write_string_lenenc(&mut payload, "hello");

        let row = decode_text_row(&payload, &fields).unwrap();
        assert!(row[0].is_null());
        assert_eq!(row[1].data, NativeData::String("hello".into()));
    }

    fn field_of(native_type: ColumnType, flags: ColumnFlags, declared_length: u32, charset: u16) -> FieldMeta {
        FieldMeta {
            declared_length,
            flags,
            charset,
            native_type,
            default_value: NativeValue::null(native_type),
            ..sample_field()
        }
    }

    #[test]
    fn tiny_with_length_one_decodes_as_strict_boolean() {
        let field = field_of(ColumnType::MYSQL_TYPE_TINY, ColumnFlags::empty(), 1, 33);
        let mut payload = Vec::new();
        write_string_lenenc(&mut payload, "1");
        let row = decode_text_row(&payload, &[field]).unwrap();
        assert_eq!(row[0].data, NativeData::Bool(true));
    }

    #[test]
    fn tiny_with_length_one_rejects_non_zero_one_text() {
        let field = field_of(ColumnType::MYSQL_TYPE_TINY, ColumnFlags::empty(), 1, 33);
        let mut payload = Vec::new();
        write_string_lenenc(&mut payload, "2");
        assert!(decode_text_row(&payload, &[field]).is_err());
    }

    #[test]
    fn unsigned_bigint_parses_full_u64_range() {
        let field = field_of(ColumnType::MYSQL_TYPE_LONGLONG, ColumnFlags::UNSIGNED_FLAG, 20, 33);
        let mut payload = Vec::new();
        write_string_lenenc(&mut payload, "18446744073709551615");
        let row = decode_text_row(&payload, &[field]).unwrap();
        assert_eq!(row[0].data, NativeData::U64(18_446_744_073_709_551_615));
    }

    #[test]
    fn date_column_is_parsed_into_mysql_time() {
        let field = field_of(ColumnType::MYSQL_TYPE_DATE, ColumnFlags::empty(), 10, 33);
        let mut payload = Vec::new();
        write_string_lenenc(&mut payload, "2024-03-01");
        let row = decode_text_row(&payload, &[field]).unwrap();
        match &row[0].data {
            NativeData::Time(t) => assert_eq!((t.year, t.month, t.day), (2024, 3, 1)),
            other => panic!("expected a Time value, got {other:?}"),
        }
    }

    #[test]
    fn binary_var_string_decodes_to_bytes() {
        let field = field_of(ColumnType::MYSQL_TYPE_VAR_STRING, ColumnFlags::BINARY_FLAG, 10, 63);
        let mut payload = Vec::new();
        write_string_lenenc(&mut payload, "\u{0}\u{1}");
        let row = decode_text_row(&payload, &[field]).unwrap();
        assert!(matches!(row[0].data, NativeData::Bytes(_)));
    }

    #[test]
    fn short_eof_marker_is_recognized_but_full_length_row_is_not() {
        assert!(is_end_of_rows_marker(&[0xfe, 0x00, 0x00]));
        let long_row = vec![0xfeu8; MAX_SINGLE_PACKET_PAYLOAD];
        assert!(!is_end_of_rows_marker(&long_row));
    }

    #[test]
    fn command_response_classifies_ok_err_and_resultset() {
        let mut ok = Vec::new();
        write_int_1(&mut ok, 0x00);
        write_int_lenenc(&mut ok, 0);
        write_int_lenenc(&mut ok, 0);
        write_int_2(&mut ok, 0x0002);
        write_int_2(&mut ok, 0);
        assert!(matches!(read_command_response(&ok), Ok(CommandResponse::Ok(_))));

        let mut result_set = Vec::new();
        write_int_lenenc(&mut result_set, 3);
        assert!(matches!(
            read_command_response(&result_set),
            Ok(CommandResponse::ResultSet { column_count: 3 })
        ));
    }
}
