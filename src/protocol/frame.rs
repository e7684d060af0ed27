//! WebSocket frame codec
//!
//! Outbound frames are always final and unmasked (server to client):
//!
//! ```text
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |F|R|R|R| opcode|0| Payload len |    Extended payload length    |
//! |I|S|S|S|  (4)  | |     (7)     |          (16/64 bits)         |
//! |N|V|V|V|       | |             |                               |
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |                         Payload Data                          |
//! +---------------------------------------------------------------+
//! ```
//!
//! Inbound frames are only inspected for their opcode. Consumers of this relay
//! send nothing but empty control frames, so masking keys and lengths are never
//! parsed and payloads are never reassembled. A client frame with a real
//! payload is not supported: its trailing bytes may be read as the start of a
//! new frame.

use bytes::{BufMut, Bytes, BytesMut};

use super::constants::{
    FIN_BIT, LEN_16_MARKER, LEN_64_MARKER, MAX_16BIT_LEN, MAX_INLINE_LEN, OPCODE_MASK,
};

/// Frame opcode (RFC 6455 Section 5.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Continuation = 0x0,
    Text = 0x1,
    Binary = 0x2,
    Close = 0x8,
    Ping = 0x9,
    Pong = 0xA,
}

impl Opcode {
    /// Map a 4-bit opcode value, `None` for reserved values
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x0 => Some(Opcode::Continuation),
            0x1 => Some(Opcode::Text),
            0x2 => Some(Opcode::Binary),
            0x8 => Some(Opcode::Close),
            0x9 => Some(Opcode::Ping),
            0xA => Some(Opcode::Pong),
            _ => None,
        }
    }
}

/// Encode `payload` as a single final frame with the given opcode
///
/// The length field uses the narrowest of the three encodings.
pub fn encode_frame(opcode: Opcode, payload: &[u8]) -> Bytes {
    let len = payload.len();
    let mut buf = BytesMut::with_capacity(header_len(len) + len);

    buf.put_u8(FIN_BIT | opcode as u8);

    if len < MAX_INLINE_LEN {
        buf.put_u8(len as u8);
    } else if len < MAX_16BIT_LEN {
        buf.put_u8(LEN_16_MARKER);
        buf.put_u16(len as u16);
    } else {
        buf.put_u8(LEN_64_MARKER);
        buf.put_u64(len as u64);
    }

    buf.put_slice(payload);
    buf.freeze()
}

/// Binary data frame
pub fn binary_frame(payload: &[u8]) -> Bytes {
    encode_frame(Opcode::Binary, payload)
}

/// Empty close frame
pub fn close_frame() -> Bytes {
    encode_frame(Opcode::Close, &[])
}

/// Empty pong frame
pub fn pong_frame() -> Bytes {
    encode_frame(Opcode::Pong, &[])
}

/// Size of the header `encode_frame` writes for a payload of `payload_len` bytes
pub fn header_len(payload_len: usize) -> usize {
    if payload_len < MAX_INLINE_LEN {
        2
    } else if payload_len < MAX_16BIT_LEN {
        4
    } else {
        10
    }
}

/// Read the opcode of an inbound frame from the first bytes received
///
/// Needs at least the two fixed header bytes; anything shorter yields `None`,
/// as does a reserved opcode.
pub fn inspect_opcode(data: &[u8]) -> Option<Opcode> {
    if data.len() < 2 {
        return None;
    }
    Opcode::from_u8(data[0] & OPCODE_MASK)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Decoder for the unmasked frames this crate emits.

    use super::Opcode;

    /// Split one server frame off the front of `buf`
    ///
    /// Returns the opcode, the payload and the total frame length, or `None`
    /// if `buf` does not yet hold a complete frame.
    pub(crate) fn decode_frame(buf: &[u8]) -> Option<(Opcode, Vec<u8>, usize)> {
        if buf.len() < 2 {
            return None;
        }
        assert_eq!(buf[0] & 0x80, 0x80, "FIN must be set");
        assert_eq!(buf[1] & 0x80, 0, "server frames are unmasked");
        let opcode = Opcode::from_u8(buf[0] & 0x0F)?;

        let (len, offset) = match buf[1] & 0x7F {
            126 => {
                if buf.len() < 4 {
                    return None;
                }
                (u16::from_be_bytes([buf[2], buf[3]]) as usize, 4)
            }
            127 => {
                if buf.len() < 10 {
                    return None;
                }
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&buf[2..10]);
                (u64::from_be_bytes(raw) as usize, 10)
            }
            n => (n as usize, 2),
        };

        if buf.len() < offset + len {
            return None;
        }
        Some((opcode, buf[offset..offset + len].to_vec(), offset + len))
    }
}
