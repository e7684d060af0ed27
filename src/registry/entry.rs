//! Consumer connection entry
//!
//! The registry holds the write side of each upgraded connection. The read
//! side stays with the task that watches for control frames.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, Notify};

/// Type-erased write half of a consumer transport
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// A consumer that completed the WebSocket handshake
///
/// Frames reach the transport from two places, the broadcaster and the
/// control-frame replies of the consumer's own task. Both go through
/// [`send`](Self::send), which holds the write lock for the whole frame.
pub struct ConsumerConnection {
    id: u64,
    peer_addr: SocketAddr,
    writer: Mutex<BoxedWriter>,
    closed: AtomicBool,
    close_notify: Notify,
    connected_at: Instant,
}

impl ConsumerConnection {
    /// Wrap the write half of an upgraded connection
    pub fn new<W>(id: u64, peer_addr: SocketAddr, writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            id,
            peer_addr,
            writer: Mutex::new(Box::new(writer)),
            closed: AtomicBool::new(false),
            close_notify: Notify::new(),
            connected_at: Instant::now(),
        }
    }

    /// Connection ID, unique for the lifetime of the server
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remote peer address
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Time since the handshake completed
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }

    /// Write one complete frame
    ///
    /// Fails fast with `NotConnected` once the connection has been closed.
    pub async fn send(&self, frame: &[u8]) -> io::Result<()> {
        if self.is_closed() {
            return Err(io::ErrorKind::NotConnected.into());
        }

        let mut writer = self.writer.lock().await;
        writer.write_all(frame).await?;
        writer.flush().await
    }

    /// Close the transport, best-effort
    ///
    /// Wakes the task waiting in [`closed`](Self::closed). Calling this more
    /// than once is harmless.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.close_notify.notify_one();

        let mut writer = self.writer.lock().await;
        let _ = writer.shutdown().await;
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Resolves once the connection has been closed
    pub async fn closed(&self) {
        if self.is_closed() {
            return;
        }
        // notify_one stores a permit, so a close racing this call is not lost
        self.close_notify.notified().await;
    }
}

impl std::fmt::Debug for ConsumerConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsumerConnection")
            .field("id", &self.id)
            .field("peer_addr", &self.peer_addr)
            .field("closed", &self.is_closed())
            .finish()
    }
}
