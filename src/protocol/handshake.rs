//! `Protocol::HandshakeV10`, `HandshakeResponse41`, auth-switch, and the two
//! authentication plugins this driver supports. Adapted from the teacher
//! crate's `protocol/connection/handshake.rs`.

use crate::constant::CapabilityFlags;
use crate::error::{Error, Result};
use crate::protocol::primitive::*;
use crate::protocol::response::{ErrPayload, ErrPayloadBytes};

#[derive(Debug, Clone)]
pub struct InitialHandshake {
    pub protocol_version: u8,
    pub server_version: String,
    pub connection_id: u32,
    pub auth_plugin_data: Vec<u8>,
    pub capability_flags: CapabilityFlags,
    pub charset: u8,
    pub status_flags: u16,
    pub auth_plugin_name: Vec<u8>,
}

pub fn read_initial_handshake(payload: &[u8]) -> Result<InitialHandshake> {
    let (protocol_version, data) = read_int_1(payload)?;

    if protocol_version == 0xff {
        let err = ErrPayload::try_from(ErrPayloadBytes(payload))?;
        return Err(Error::from(err));
    }

    let (server_version_bytes, data) = read_string_null(data)?;
    let server_version = String::from_utf8_lossy(server_version_bytes).into_owned();

    let (connection_id, data) = read_int_4(data)?;

    let (auth_data_1, data) = read_string_fix(data, 8)?;
    let (_filler, data) = read_int_1(data)?;

    let (cap_lower, data) = read_int_2(data)?;
    let (charset, data) = read_int_1(data)?;
    let (status_flags, data) = read_int_2(data)?;
    let (cap_upper, data) = read_int_2(data)?;

    let cap_bits = ((cap_upper as u32) << 16) | (cap_lower as u32);
    let capability_flags = CapabilityFlags::from_bits_truncate(cap_bits);

    let (auth_data_len, data) = read_int_1(data)?;
    let (_reserved, data) = read_string_fix(data, 10)?;

    let auth_data_2_len = (auth_data_len as usize).saturating_sub(9).max(12);
    let (auth_data_2, data) = read_string_fix(data, auth_data_2_len)?;
    // The part-2 field is NUL-padded to its declared length; the MySQL docs
    // document 13 bytes reserved with the final byte always zero.
    let auth_data_2 = auth_data_2.split(|&b| b == 0).next().unwrap_or(auth_data_2);
    let (_reserved, data) = read_int_1(data)?;

    let mut auth_plugin_data = Vec::with_capacity(auth_data_1.len() + auth_data_2.len());
    auth_plugin_data.extend_from_slice(auth_data_1);
    auth_plugin_data.extend_from_slice(auth_data_2);

    let (auth_plugin_name, _rest) = read_string_null(data)?;

    Ok(InitialHandshake {
        protocol_version,
        server_version,
        connection_id,
        auth_plugin_data,
        capability_flags,
        charset,
        status_flags,
        auth_plugin_name: auth_plugin_name.to_vec(),
    })
}

#[derive(Debug, Clone)]
pub struct HandshakeResponse41<'a> {
    pub capability_flags: CapabilityFlags,
    pub max_packet_size: u32,
    pub charset: u8,
    pub username: &'a str,
    pub auth_response: &'a [u8],
    pub database: Option<&'a str>,
    pub auth_plugin_name: Option<&'a str>,
}

pub fn write_handshake_response(out: &mut Vec<u8>, response: &HandshakeResponse41) {
    write_int_4(out, response.capability_flags.bits());
    write_int_4(out, response.max_packet_size);
    write_int_1(out, response.charset);
    out.extend_from_slice(&[0u8; 23]);
    write_string_null(out, response.username);

    if response
        .capability_flags
        .contains(CapabilityFlags::CLIENT_PLUGIN_AUTH_LENENC_CLIENT_DATA)
    {
        write_bytes_lenenc(out, response.auth_response);
    } else {
        write_int_1(out, response.auth_response.len() as u8);
        out.extend_from_slice(response.auth_response);
    }

    if let Some(db) = response.database {
        write_string_null(out, db);
    }

    if let Some(plugin) = response.auth_plugin_name {
        if response.capability_flags.contains(CapabilityFlags::CLIENT_PLUGIN_AUTH) {
            write_string_null(out, plugin);
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthSwitchRequest<'a> {
    pub plugin_name: &'a [u8],
    pub plugin_data: &'a [u8],
}

pub fn read_auth_switch_request(payload: &[u8]) -> Result<AuthSwitchRequest<'_>> {
    let (header, data) = read_int_1(payload)?;
    if header != 0xfe {
        return Err(Error::InvalidPacket);
    }

    let (plugin_name, data) = read_string_null(data)?;

    match data.last() {
        Some(0) => Ok(AuthSwitchRequest {
            plugin_name,
            plugin_data: &data[..data.len() - 1],
        }),
        _ => Err(Error::InvalidPacket),
    }
}

pub fn write_auth_switch_response(out: &mut Vec<u8>, auth_data: &[u8]) {
    out.extend_from_slice(auth_data);
}

/// `mysql_native_password`: SHA1(password) XOR SHA1(challenge + SHA1(SHA1(password))).
pub fn auth_mysql_native_password(password: &str, challenge: &[u8]) -> [u8; 20] {
    use sha1::{Digest, Sha1};

    if password.is_empty() {
        return [0u8; 20];
    }

    let stage1 = Sha1::digest(password.as_bytes());
    let stage2 = Sha1::digest(stage1);

    let mut hasher = Sha1::new();
    hasher.update(challenge);
    hasher.update(stage2);
    let token = hasher.finalize();

    let mut result = [0u8; 20];
    for i in 0..20 {
        result[i] = stage1[i] ^ token[i];
    }
    result
}

/// `caching_sha2_password`: XOR(SHA256(password), SHA256(SHA256(SHA256(password)), challenge)).
pub fn auth_caching_sha2_password(password: &str, challenge: &[u8]) -> [u8; 32] {
    use sha2::{Digest, Sha256};

    if password.is_empty() {
        return [0u8; 32];
    }

    let stage1 = Sha256::digest(password.as_bytes());
    let stage2 = Sha256::digest(stage1);

    let mut hasher = Sha256::new();
    hasher.update(stage2);
    hasher.update(challenge);
    let scramble = hasher.finalize();

    let mut result = [0u8; 32];
    for i in 0..32 {
        result[i] = stage1[i] ^ scramble[i];
    }
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachingSha2PasswordFastAuthResult {
    Success,
    FullAuthRequired,
}

pub fn read_caching_sha2_password_fast_auth_result(
    payload: &[u8],
) -> Result<CachingSha2PasswordFastAuthResult> {
    match payload.first() {
        Some(0x03) => Ok(CachingSha2PasswordFastAuthResult::Success),
        Some(0x04) => Ok(CachingSha2PasswordFastAuthResult::FullAuthRequired),
        Some(_) => Err(Error::InvalidPacket),
        None => Err(Error::UnexpectedEof),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_password_yields_zeroed_response() {
        assert_eq!(auth_mysql_native_password("", b"whatever-challenge12"), [0u8; 20]);
        assert_eq!(auth_caching_sha2_password("", b"whatever-challenge12"), [0u8; 32]);
    }

    #[test]
    fn native_password_is_deterministic_for_same_inputs() {
        let challenge = b"01234567890123456789";
        let a = auth_mysql_native_password("hunter2", challenge);
        let b = auth_mysql_native_password("hunter2", challenge);
        assert_eq!(a, b);
        assert_ne!(a, auth_mysql_native_password("different", challenge));
    }

    #[test]
    fn fast_auth_result_rejects_unknown_byte() {
        assert!(matches!(
            read_caching_sha2_password_fast_auth_result(&[0x02]),
            Err(Error::InvalidPacket)
        ));
    }

    /// A real server's initial handshake declares `auth_data_len == 21`
    /// (20 challenge bytes plus a trailing NUL), which leaves a
    /// reserved/terminator byte after auth-plugin-data-part-2 that must be
    /// consumed before the plugin name — otherwise `read_string_null`
    /// matches that leading NUL and returns an empty plugin name.
    #[test]
    fn real_sized_auth_data_len_leaves_plugin_name_intact() {
        let mut payload = Vec::new();
        payload.push(0x0a);
        payload.extend_from_slice(b"8.0.30\0");
        payload.extend_from_slice(&1u32.to_le_bytes());
        payload.extend_from_slice(b"12345678"); // auth-plugin-data-part-1
        payload.push(0x00); // filler
        payload.extend_from_slice(&0xffffu16.to_le_bytes()); // capability flags (lower)
        payload.push(33); // charset
        payload.extend_from_slice(&0x0002u16.to_le_bytes()); // status flags
        payload.extend_from_slice(&0xffffu16.to_le_bytes()); // capability flags (upper)
        payload.push(21); // auth_data_len
        payload.extend_from_slice(&[0u8; 10]); // reserved
        payload.extend_from_slice(b"123456789012"); // auth-plugin-data-part-2 (12 bytes)
        payload.push(0x00); // reserved/terminator byte
        payload.extend_from_slice(b"mysql_native_password\0");

        let handshake = read_initial_handshake(&payload).unwrap();
        assert_eq!(handshake.auth_plugin_name, b"mysql_native_password");
        assert_eq!(handshake.auth_plugin_data.len(), 20);
    }
}
