//! WebSocket opening handshake (server side)
//!
//! ```text
//! Client                                         Server
//!   |                                              |
//!   |-- GET / HTTP/1.1 ------------------------->  |
//!   |   Sec-WebSocket-Key: <nonce>                 |
//!   |   ...                                        |
//!   |   <CRLF>                                     |
//!   |                                              |
//!   |  <--------- HTTP/1.1 101 Switching Protocols-|
//!   |             Sec-WebSocket-Accept: <token>    |
//!   |                                              |
//!   |          [Connection is a consumer]          |
//! ```
//!
//! Only the nonce header is examined. Version, origin and subprotocol headers
//! are accepted as-is.
//!
//! Reference: RFC 6455 Section 4.2

use base64::Engine;
use bytes::{BufMut, Bytes, BytesMut};
use sha1::{Digest, Sha1};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::error::{HandshakeError, Result};
use crate::protocol::constants::{SWITCHING_PROTOCOLS_HEAD, WS_GUID};
use crate::protocol::head::{read_head, HeadBuffer};

const KEY_HEADER: &str = "sec-websocket-key:";

/// Handshake state machine
#[derive(Debug)]
pub struct Handshake {
    state: HandshakeState,
    /// Bytes received so far
    head: HeadBuffer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandshakeState {
    /// Collecting the upgrade request
    AwaitingHeaders,
    /// Response produced, connection can be promoted
    Ready,
}

impl Handshake {
    /// Create a new handshake state machine
    pub fn new() -> Self {
        Self {
            state: HandshakeState::AwaitingHeaders,
            head: HeadBuffer::new(),
        }
    }

    /// Check if the upgrade response has been produced
    pub fn is_done(&self) -> bool {
        self.state == HandshakeState::Ready
    }

    /// Feed received bytes and return the upgrade response once the head is complete
    ///
    /// Returns `Ok(None)` while more data is needed. Bytes past the end of the
    /// head are dropped. After the response is produced further input is
    /// ignored.
    pub fn process(&mut self, data: &[u8]) -> Result<Option<Bytes>> {
        if self.state == HandshakeState::Ready {
            return Ok(None);
        }

        let head = match self.head.push(data)? {
            Some(head) => head,
            None => return Ok(None),
        };

        let response = respond(&head.head)?;
        self.state = HandshakeState::Ready;
        Ok(Some(response))
    }

    /// Run the handshake over `stream`, writing the response on success
    ///
    /// Nothing is written on failure; the caller drops the connection.
    pub async fn accept<S>(stream: &mut S) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let head = read_head(stream).await?;
        let response = respond(&head.head)?;

        stream.write_all(&response).await?;
        stream.flush().await?;
        Ok(())
    }
}

impl Default for Handshake {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the upgrade response for a complete request head
fn respond(head: &[u8]) -> Result<Bytes> {
    let key = parse_client_key(head).ok_or(HandshakeError::MissingKey)?;
    Ok(build_response(&compute_accept_key(&key)))
}

/// Find the `Sec-WebSocket-Key` value in a request head
///
/// Header names are matched case-insensitively; the value is trimmed. An empty
/// value counts as missing.
pub fn parse_client_key(head: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(head);

    text.split("\r\n")
        .find(|line| {
            line.len() >= KEY_HEADER.len()
                && line.is_char_boundary(KEY_HEADER.len())
                && line[..KEY_HEADER.len()].eq_ignore_ascii_case(KEY_HEADER)
        })
        .map(|line| line[KEY_HEADER.len()..].trim().to_string())
        .filter(|key| !key.is_empty())
}

/// Compute the `Sec-WebSocket-Accept` token for a client nonce
///
/// SHA-1 over the nonce followed by the protocol GUID, base64 encoded.
pub fn compute_accept_key(client_key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(client_key.as_bytes());
    hasher.update(WS_GUID.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(hasher.finalize())
}

/// Build the `101 Switching Protocols` response
pub fn build_response(accept_key: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(SWITCHING_PROTOCOLS_HEAD.len() + 64);
    buf.put_slice(SWITCHING_PROTOCOLS_HEAD.as_bytes());
    buf.put_slice(b"Sec-WebSocket-Accept: ");
    buf.put_slice(accept_key.as_bytes());
    buf.put_slice(b"\r\n\r\n");
    buf.freeze()
}
