//! Consumer connection handler
//!
//! Drives one WebSocket consumer from handshake to disconnect. After the
//! upgrade the socket is split: the write half goes into the registry for the
//! broadcaster, the read half stays here and is only watched for control
//! frames.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

use crate::error::Result;
use crate::protocol::constants::CONTROL_READ_SIZE;
use crate::protocol::frame::{close_frame, inspect_opcode, pong_frame, Opcode};
use crate::protocol::handshake::Handshake;
use crate::registry::{ConnectionRegistry, ConsumerConnection};
use crate::stats::RelayStats;

/// Why a consumer's read loop ended
#[derive(Debug)]
pub enum DisconnectReason {
    /// Peer sent a close frame
    CloseFrame,
    /// Peer closed the TCP connection
    Eof,
    /// Reading from the peer failed
    ReadError(io::Error),
    /// Connection was closed locally, e.g. evicted after a failed broadcast
    Closed,
}

/// Handles consumer connections
#[derive(Clone)]
pub struct ConsumerHandler {
    registry: Arc<ConnectionRegistry>,
    stats: Arc<RelayStats>,
}

impl ConsumerHandler {
    pub fn new(registry: Arc<ConnectionRegistry>, stats: Arc<RelayStats>) -> Self {
        Self { registry, stats }
    }

    /// Run a consumer connection to completion
    ///
    /// A failed handshake returns the error without writing anything. Once
    /// registered, the connection always ends up removed and closed, and the
    /// method returns `Ok`.
    pub async fn run<S>(&self, mut stream: S, conn_id: u64, peer_addr: SocketAddr) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        Handshake::accept(&mut stream).await?;

        let (mut reader, writer) = tokio::io::split(stream);
        let conn = Arc::new(ConsumerConnection::new(conn_id, peer_addr, writer));

        let consumers = self.registry.add(Arc::clone(&conn)).await;
        self.stats.record_consumer();
        tracing::info!(
            conn_id = conn_id,
            peer = %peer_addr,
            consumers = consumers,
            "Consumer connected"
        );

        let reason = watch_control_frames(&mut reader, &conn).await;

        self.registry.remove(conn_id).await;
        let consumers = self.registry.len().await;
        tracing::info!(
            conn_id = conn_id,
            peer = %peer_addr,
            consumers = consumers,
            reason = ?reason,
            duration_secs = conn.age().as_secs(),
            "Consumer disconnected"
        );

        conn.close().await;
        Ok(())
    }
}

/// Read from the consumer until it goes away, answering control frames
///
/// Only the opcode of each read is looked at; see [`crate::protocol::frame`]
/// for what that means for frames with payloads.
async fn watch_control_frames<R>(reader: &mut R, conn: &ConsumerConnection) -> DisconnectReason
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; CONTROL_READ_SIZE];

    loop {
        let n = tokio::select! {
            _ = conn.closed() => return DisconnectReason::Closed,
            result = reader.read(&mut buf) => match result {
                Ok(0) => return DisconnectReason::Eof,
                Ok(n) => n,
                Err(e) => return DisconnectReason::ReadError(e),
            },
        };

        match inspect_opcode(&buf[..n]) {
            Some(Opcode::Close) => {
                // Reply failures don't matter, the connection is going away
                let _ = conn.send(&close_frame()).await;
                return DisconnectReason::CloseFrame;
            }
            Some(Opcode::Ping) => {
                if let Err(e) = conn.send(&pong_frame()).await {
                    tracing::debug!(conn_id = conn.id(), error = %e, "Pong write failed");
                }
            }
            opcode => {
                tracing::trace!(conn_id = conn.id(), opcode = ?opcode, bytes = n, "Ignoring client data");
            }
        }
    }
}
