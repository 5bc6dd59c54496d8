//! MySQL packet framing over a blocking byte stream.
//!
//! The teacher crate frames packets with a `tokio_util::codec::Decoder`
//! driven by an async buffer pool; this driver has no async runtime, so
//! framing here is a pair of blocking `read_payload`/`write_payload`
//! functions over anything that implements `Read`/`Write`. The on-wire
//! header layout (`PacketHeader`) is unchanged from the teacher.

use std::io::{Read, Write};

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::{Error, Result};

/// Largest payload a single physical packet may carry before the client
/// must split it across multiple packets with the same sequence id
/// incrementing each time (`Protocol::Packet` semantics).
pub const MAX_PACKET_PAYLOAD: usize = 0xff_ff_ff;

#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable, IntoBytes)]
pub struct PacketHeader {
    pub length: [u8; 3],
    pub sequence_id: u8,
}

impl PacketHeader {
    pub fn encode(length: usize, sequence_id: u8) -> Self {
        let len = u32::to_le_bytes(length as u32);
        Self {
            length: [len[0], len[1], len[2]],
            sequence_id,
        }
    }

    pub fn length(&self) -> usize {
        u32::from_le_bytes([self.length[0], self.length[1], self.length[2], 0]) as usize
    }

    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        if data.len() < 4 {
            return Err(Error::InvalidPacket);
        }
        Self::ref_from_bytes(&data[..4]).map_err(|_| Error::InvalidPacket)
    }
}

/// Read exactly one physical packet: a 4-byte header followed by its
/// payload. Returns the sequence id and the payload bytes.
fn read_one_packet<R: Read>(reader: &mut R) -> Result<(u8, Vec<u8>)> {
    let mut header_buf = [0u8; 4];
    reader.read_exact(&mut header_buf)?;
    let header = PacketHeader::from_bytes(&header_buf)?;
    let length = header.length();
    let sequence_id = header.sequence_id;

    let mut payload = vec![0u8; length];
    reader.read_exact(&mut payload)?;
    Ok((sequence_id, payload))
}

/// Read a full logical packet, concatenating physical packets split across
/// the 16MB boundary. Returns the sequence id of the last physical packet
/// read and the reassembled payload.
pub fn read_payload<R: Read>(reader: &mut R) -> Result<(u8, Vec<u8>)> {
    let (mut sequence_id, mut payload) = read_one_packet(reader)?;
    let mut last_chunk_len = payload.len();
    while last_chunk_len == MAX_PACKET_PAYLOAD {
        let (next_seq, mut more) = read_one_packet(reader)?;
        sequence_id = next_seq;
        last_chunk_len = more.len();
        payload.append(&mut more);
    }
    Ok((sequence_id, payload))
}

/// Write a full logical packet, splitting across the 16MB boundary as
/// required (an exact multiple of `MAX_PACKET_PAYLOAD` is always followed
/// by an empty closing packet, per protocol).
pub fn write_payload<W: Write>(writer: &mut W, mut sequence_id: u8, payload: &[u8]) -> Result<u8> {
    let mut remaining = payload;
    loop {
        let chunk_len = remaining.len().min(MAX_PACKET_PAYLOAD);
        let chunk = &remaining[..chunk_len];
        let mut out = Vec::with_capacity(4 + chunk_len);
        write_packet_header(&mut out, sequence_id, chunk_len);
        out.extend_from_slice(chunk);
        writer.write_all(&out)?;
        sequence_id = sequence_id.wrapping_add(1);
        remaining = &remaining[chunk_len..];
        if chunk_len < MAX_PACKET_PAYLOAD {
            break;
        }
        if remaining.is_empty() {
            // exact multiple: terminate with an empty packet
            let mut out = Vec::with_capacity(4);
            write_packet_header(&mut out, sequence_id, 0);
            writer.write_all(&out)?;
            sequence_id = sequence_id.wrapping_add(1);
            break;
        }
    }
    Ok(sequence_id)
}

#[inline]
pub fn write_packet_header(out: &mut Vec<u8>, sequence_id: u8, payload_length: usize) {
    let bytes = (payload_length as u32).to_le_bytes();
    out.extend_from_slice(&bytes[..3]);
    out.push(sequence_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn small_payload_roundtrips() {
        let mut buf = Vec::new();
        write_payload(&mut buf, 0, b"select 1").unwrap();
        let mut cursor = Cursor::new(buf);
        let (seq, payload) = read_payload(&mut cursor).unwrap();
        assert_eq!(seq, 1);
        assert_eq!(payload, b"select 1");
    }

    #[test]
    fn header_length_decodes_little_endian_24_bit() {
        let header = PacketHeader::encode(0x01_02_03, 7);
        assert_eq!(header.length(), 0x01_02_03);
        assert_eq!(header.sequence_id, 7);
    }
}
