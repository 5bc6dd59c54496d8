//! Column definition packet parsing and the [`FieldMeta`] data-model entity
//! built from it. Grounded on the teacher crate's `src/col.rs`, which
//! already favours owned `String`s over the zero-copy/lifetime-transmute
//! variant seen in `protocol/command/column_definition.rs` — this driver
//! follows the safer, owned-string version throughout.

use crate::constant::{ColumnFlags, ColumnType};
use crate::error::{Error, Result};
use crate::protocol::primitive::*;
use crate::protocol::value::NativeValue;
use zerocopy::byteorder::little_endian::{U16 as U16LE, U32 as U32LE};
use zerocopy::{FromBytes, Immutable, KnownLayout};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnTypeAndFlags {
    pub column_type: ColumnType,
    pub flags: ColumnFlags,
}

#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
pub struct ColumnDefinitionTail {
    charset: U16LE,
    column_length: U32LE,
    column_type: u8,
    flags: U16LE,
    decimals: u8,
    reserved: U16LE,
}

impl ColumnDefinitionTail {
    pub fn charset(&self) -> u16 {
        self.charset.get()
    }

    pub fn column_length(&self) -> u32 {
        self.column_length.get()
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn flags(&self) -> ColumnFlags {
        ColumnFlags::from_bits_truncate(self.flags.get())
    }

    pub fn column_type(&self) -> Result<ColumnType> {
        ColumnType::from_u8(self.column_type).ok_or(Error::UnknownColumnType(self.column_type))
    }

    pub fn type_and_flags(&self) -> Result<ColumnTypeAndFlags> {
        Ok(ColumnTypeAndFlags {
            column_type: self.column_type()?,
            flags: self.flags(),
        })
    }
}

/// Owned, fully-parsed column definition packet
/// (`Protocol::ColumnDefinition41`).
#[derive(Debug, Clone)]
pub struct ColumnDefinition {
    pub catalog: String,
    pub schema: String,
    pub table: String,
    pub org_table: String,
    pub name: String,
    pub org_name: String,
    pub charset: u16,
    pub column_length: u32,
    pub column_type: ColumnType,
    pub flags: ColumnFlags,
    pub decimals: u8,
}

impl TryFrom<&[u8]> for ColumnDefinition {
    type Error = Error;

    fn try_from(data: &[u8]) -> Result<Self> {
        let (catalog, data) = read_string_lenenc(data)?;
        let (schema, data) = read_string_lenenc(data)?;
        let (table, data) = read_string_lenenc(data)?;
        let (org_table, data) = read_string_lenenc(data)?;
        let (name, data) = read_string_lenenc(data)?;
        let (org_name, data) = read_string_lenenc(data)?;
        let (_fixed_len, data) = read_int_lenenc(data)?;

        if data.len() < 12 {
            return Err(Error::UnexpectedEof);
        }
        let tail = ColumnDefinitionTail::ref_from_bytes(&data[..12]).map_err(|_| Error::InvalidPacket)?;

        Ok(ColumnDefinition {
            catalog: String::from_utf8_lossy(catalog).into_owned(),
            schema: String::from_utf8_lossy(schema).into_owned(),
            table: String::from_utf8_lossy(table).into_owned(),
            org_table: String::from_utf8_lossy(org_table).into_owned(),
            name: String::from_utf8_lossy(name).into_owned(),
            org_name: String::from_utf8_lossy(org_name).into_owned(),
            charset: tail.charset(),
            column_length: tail.column_length(),
            column_type: tail.column_type()?,
            flags: tail.flags(),
            decimals: tail.decimals(),
        })
    }
}

/// Per-column metadata (spec data model's `FieldMeta`): the union of
/// everything a consumer needs to know about a result column, independent
/// of whether it came from a wire column-definition packet or a
/// `SHOW FULL COLUMNS` row.
#[derive(Debug, Clone)]
pub struct FieldMeta {
    pub name: String,
    pub org_name: String,
    pub table: String,
    pub org_table: String,
    pub database: String,
    pub catalog: String,
    pub native_type: ColumnType,
    pub charset: u16,
    pub declared_length: u32,
    pub max_observed_length: u64,
    pub flags: ColumnFlags,
    pub decimals: u8,
    pub default_value: NativeValue,
}

impl FieldMeta {
    pub fn is_primary_key(&self) -> bool {
        self.flags.contains(ColumnFlags::PRI_KEY_FLAG)
    }

    pub fn is_not_null(&self) -> bool {
        self.flags.contains(ColumnFlags::NOT_NULL_FLAG)
    }

    pub fn is_unique(&self) -> bool {
        self.flags.contains(ColumnFlags::UNIQUE_KEY_FLAG)
    }

    pub fn is_auto_increment(&self) -> bool {
        self.flags.contains(ColumnFlags::AUTO_INCREMENT_FLAG)
    }

    pub fn is_unsigned(&self) -> bool {
        self.flags.contains(ColumnFlags::UNSIGNED_FLAG)
    }

    pub fn is_binary(&self) -> bool {
        self.flags.contains(ColumnFlags::BINARY_FLAG)
    }

    pub fn is_blob(&self) -> bool {
        self.flags.contains(ColumnFlags::BLOB_FLAG)
    }

    pub fn update_observed_length(&mut self, len: u64) {
        if len > self.max_observed_length {
            self.max_observed_length = len;
        }
    }
}

impl From<ColumnDefinition> for FieldMeta {
    fn from(col: ColumnDefinition) -> Self {
        FieldMeta {
            name: col.name,
            org_name: col.org_name,
            table: col.table,
            org_table: col.org_table,
            database: col.schema,
            catalog: col.catalog,
            native_type: col.column_type,
            charset: col.charset,
            declared_length: col.column_length,
            max_observed_length: 0,
            flags: col.flags,
            decimals: col.decimals,
            default_value: NativeValue::null(col.column_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_packet() -> Vec<u8> {
        let mut packet = Vec::new();
        write_string_lenenc(&mut packet, "def");
        write_string_lenenc(&mut packet, "test");
        write_string_lenenc(&mut packet, "users");
        write_string_lenenc(&mut packet, "users");
        write_string_lenenc(&mut packet, "id");
        write_string_lenenc(&mut packet, "id");
        write_int_lenenc(&mut packet, 0x0c);
        packet.extend_from_slice(&[
            0x21, 0x00, // charset = 33
            0x0b, 0x00, 0x00, 0x00, // length = 11
            0x03, // LONG
            0x03, 0x00, // NOT_NULL | PRI_KEY
            0x00, // decimals
            0x00, 0x00, // reserved
        ]);
        packet
    }

    #[test]
    fn column_definition_parses_strings_and_tail() {
        let packet = sample_packet();
        let col = ColumnDefinition::try_from(packet.as_slice()).unwrap();
        assert_eq!(col.name, "id");
        assert_eq!(col.table, "users");
        assert_eq!(col.column_type, ColumnType::MYSQL_TYPE_LONG);
        assert!(col.flags.contains(ColumnFlags::PRI_KEY_FLAG));
    }

    #[test]
    fn field_meta_derived_predicates_follow_flags() {
        let col = ColumnDefinition::try_from(sample_packet().as_slice()).unwrap();
        let meta = FieldMeta::from(col);
        assert!(meta.is_primary_key());
        assert!(meta.is_not_null());
        assert!(!meta.is_unsigned());
    }

    #[test]
    fn unknown_column_type_is_rejected() {
        let mut packet = Vec::new();
        write_string_lenenc(&mut packet, "def");
        write_string_lenenc(&mut packet, "test");
        write_string_lenenc(&mut packet, "t");
        write_string_lenenc(&mut packet, "t");
        write_string_lenenc(&mut packet, "c");
        write_string_lenenc(&mut packet, "c");
        write_int_lenenc(&mut packet, 0x0c);
        packet.extend_from_slice(&[0x21, 0x00, 0xff, 0x00, 0x00, 0x00, 0x50, 0x00, 0x00, 0x00, 0x00, 0x00]);
        assert!(ColumnDefinition::try_from(packet.as_slice()).is_err());
    }
}
