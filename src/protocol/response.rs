//! Generic response payloads shared by every command: OK, ERR, and EOF
//! packets. Adapted from the teacher crate's `protocol/response.rs`.

use crate::constant::ServerStatusFlags;
use crate::error::{Error, Result};
use crate::protocol::primitive::*;
use zerocopy::byteorder::little_endian::U16 as U16LE;
use zerocopy::{FromBytes, Immutable, KnownLayout};

#[derive(Debug, Clone, Copy)]
pub struct OkPayloadBytes<'a>(pub &'a [u8]);

impl<'a> OkPayloadBytes<'a> {
    pub fn bytes(&self) -> &[u8] {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct OkPayload {
    pub affected_rows: u64,
    pub last_insert_id: u64,
    pub status_flags: ServerStatusFlags,
    pub warnings: u16,
    pub info: String,
}

impl TryFrom<OkPayloadBytes<'_>> for OkPayload {
    type Error = Error;

    fn try_from(bytes: OkPayloadBytes<'_>) -> Result<Self> {
        let (header, data) = read_int_1(bytes.bytes())?;
        if header != 0x00 && header != 0xfe {
            return Err(Error::InvalidPacket);
        }

        let (affected_rows, data) = read_int_lenenc(data)?;
        let (last_insert_id, data) = read_int_lenenc(data)?;
        let (status_flags, data) = read_int_2(data)?;
        let (warnings, data) = read_int_2(data)?;
        let info = String::from_utf8_lossy(read_string_eof(data)).into_owned();

        Ok(OkPayload {
            affected_rows,
            last_insert_id,
            status_flags: ServerStatusFlags::from_bits_truncate(status_flags),
            warnings,
            info,
        })
    }
}

#[derive(Debug)]
pub struct ErrPayloadBytes<'a>(pub &'a [u8]);

#[derive(Debug, Clone, thiserror::Error)]
#[error("ERROR {} ({}): {}", self.error_code, self.sql_state, self.message)]
pub struct ErrPayload {
    pub error_code: u16,
    pub sql_state: String,
    pub message: String,
}

impl TryFrom<ErrPayloadBytes<'_>> for ErrPayload {
    type Error = Error;

    fn try_from(bytes: ErrPayloadBytes<'_>) -> Result<Self> {
        let (header, data) = read_int_1(bytes.0)?;
        if header != 0xff {
            return Err(Error::InvalidPacket);
        }

        let (error_code, data) = read_int_2(data)?;
        let (_marker, data) = read_string_fix(data, 1)?;
        let (sql_state, data) = read_string_fix(data, 5)?;

        Ok(ErrPayload {
            error_code,
            sql_state: String::from_utf8_lossy(sql_state).into_owned(),
            message: String::from_utf8_lossy(data).into_owned(),
        })
    }
}

impl From<ErrPayload> for Error {
    fn from(err: ErrPayload) -> Self {
        Error::Server {
            error_code: err.error_code,
            sql_state: err.sql_state,
            message: err.message,
        }
    }
}

#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
pub struct EofPacket {
    warnings: U16LE,
    status_flags: U16LE,
}

impl EofPacket {
    pub fn warnings(&self) -> u16 {
        self.warnings.get()
    }

    pub fn status_flags(&self) -> ServerStatusFlags {
        ServerStatusFlags::from_bits_truncate(self.status_flags.get())
    }
}

pub fn read_eof_packet(payload: &[u8]) -> Result<&EofPacket> {
    let (header, data) = read_int_1(payload)?;
    if header != 0xfe {
        return Err(Error::InvalidPacket);
    }
    if data.len() < 4 {
        return Err(Error::InvalidPacket);
    }
    EofPacket::ref_from_bytes(&data[..4]).map_err(|_| Error::InvalidPacket)
}

/// The first byte of a generic response packet tells us which of OK/ERR/EOF/
/// result-set-header we're looking at. `0xfe` is ambiguous: under
/// `CLIENT_DEPRECATE_EOF` (which this driver always negotiates) it is OK, not
/// EOF, whenever the payload is long enough to be a real OK packet.
pub enum GenericResponse<'a> {
    Ok(OkPayload),
    Err(ErrPayload),
    Other(&'a [u8]),
}

pub fn classify_generic_response(payload: &[u8]) -> Result<GenericResponse<'_>> {
    match payload.first() {
        Some(0x00) => Ok(GenericResponse::Ok(OkPayload::try_from(OkPayloadBytes(payload))?)),
        Some(0xff) => Ok(GenericResponse::Err(ErrPayload::try_from(ErrPayloadBytes(payload))?)),
        Some(0xfe) if payload.len() >= 7 => {
            Ok(GenericResponse::Ok(OkPayload::try_from(OkPayloadBytes(payload))?))
        }
        _ => Ok(GenericResponse::Other(payload)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_payload_parses_affected_rows_and_insert_id() {
        let mut bytes = vec![0x00];
        write_int_lenenc(&mut bytes, 3);
        write_int_lenenc(&mut bytes, 42);
        write_int_2(&mut bytes, ServerStatusFlags::SERVER_STATUS_AUTOCOMMIT.bits());
        write_int_2(&mut bytes, 0);

        let ok = OkPayload::try_from(OkPayloadBytes(&bytes)).unwrap();
        assert_eq!(ok.affected_rows, 3);
        assert_eq!(ok.last_insert_id, 42);
        assert!(ok.status_flags.contains(ServerStatusFlags::SERVER_STATUS_AUTOCOMMIT));
    }

    #[test]
    fn err_payload_parses_sqlstate_and_message() {
        let mut bytes = vec![0xff];
        write_int_2(&mut bytes, 1062);
        bytes.extend_from_slice(b"#23000Duplicate entry");

        let err = ErrPayload::try_from(ErrPayloadBytes(&bytes)).unwrap();
        assert_eq!(err.error_code, 1062);
        assert_eq!(err.sql_state, "23000");
        assert_eq!(err.message, "Duplicate entry");
    }
}
