//! Protocol constants

/// GUID appended to the client key when computing `Sec-WebSocket-Accept` (RFC 6455 4.2.2)
pub const WS_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// End-of-head marker for HTTP-style requests
pub const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Largest request head accepted on either port
pub const MAX_HEAD_SIZE: usize = 16 * 1024;

/// Read size used while collecting a request head
pub const HEAD_READ_SIZE: usize = 4096;

/// Read size used by consumer connections while watching for control frames
pub const CONTROL_READ_SIZE: usize = 4096;

/// FIN bit in the first header byte
pub const FIN_BIT: u8 = 0x80;

/// Mask for the opcode nibble in the first header byte
pub const OPCODE_MASK: u8 = 0x0F;

/// 7-bit length marker: a 16-bit length follows
pub const LEN_16_MARKER: u8 = 126;

/// 7-bit length marker: a 64-bit length follows
pub const LEN_64_MARKER: u8 = 127;

/// Payloads shorter than this fit in the 7-bit length field
pub const MAX_INLINE_LEN: usize = 126;

/// Payloads shorter than this use the 16-bit length field
pub const MAX_16BIT_LEN: usize = 65536;

/// Response sent once a consumer's upgrade request is accepted, minus the accept header
pub const SWITCHING_PROTOCOLS_HEAD: &str =
    "HTTP/1.1 101 Switching Protocols\r\nUpgrade: websocket\r\nConnection: Upgrade\r\n";

/// Response sent to a producer once its request head has been read
pub const INGEST_OK_RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\n\
Content-Type: application/octet-stream\r\n\
Connection: keep-alive\r\n\
\r\n";
