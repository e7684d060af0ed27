//! Producer ingestion handler
//!
//! A producer (typically `ffmpeg -f mpegts http://host:port/`) opens the
//! ingestion port, sends a request head, and then streams raw media for as
//! long as it runs. The head is answered with a fixed `200 OK` and never
//! interpreted. Everything after it is broadcast as-is, one frame per read.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::Result;
use crate::protocol::constants::INGEST_OK_RESPONSE;
use crate::protocol::head::read_head;
use crate::server::broadcast::Broadcaster;

/// What one producer connection relayed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Chunks broadcast, including the bytes that trailed the head
    pub chunks: u64,
    /// Payload bytes broadcast
    pub bytes: u64,
    /// Time from the `200 OK` to the end of the stream
    pub duration: Duration,
}

impl IngestSummary {
    fn record(&mut self, len: usize) {
        self.chunks += 1;
        self.bytes += len as u64;
    }

    /// Average bitrate over the connection in bits per second
    pub fn bitrate(&self) -> u64 {
        let secs = self.duration.as_secs();
        if secs > 0 {
            (self.bytes * 8) / secs
        } else {
            0
        }
    }
}

/// Handles producer connections
#[derive(Clone)]
pub struct ProducerHandler {
    broadcaster: Broadcaster,
    read_buffer_size: usize,
}

impl ProducerHandler {
    pub fn new(broadcaster: Broadcaster, read_buffer_size: usize) -> Self {
        Self {
            broadcaster,
            read_buffer_size: read_buffer_size.max(1),
        }
    }

    /// Relay one producer connection until it disconnects
    ///
    /// Returns what this connection relayed once the producer closes the
    /// stream, or an error if the head is malformed or a read fails. The
    /// stream is closed either way.
    pub async fn run<S>(&self, mut stream: S, peer_addr: SocketAddr) -> Result<IngestSummary>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let head = read_head(&mut stream).await?;

        stream.write_all(INGEST_OK_RESPONSE).await?;
        stream.flush().await?;

        self.broadcaster.stats().record_producer();
        tracing::info!(peer = %peer_addr, "Producer stream accepted");

        let started = Instant::now();
        let mut summary = IngestSummary::default();

        if !head.leftover.is_empty() {
            self.broadcaster.broadcast(&head.leftover).await;
            summary.record(head.leftover.len());
        }

        let mut buf = vec![0u8; self.read_buffer_size];
        let result = loop {
            match stream.read(&mut buf).await {
                Ok(0) => break Ok(()),
                Ok(n) => {
                    self.broadcaster.broadcast(&buf[..n]).await;
                    summary.record(n);
                }
                Err(e) => break Err(e),
            }
        };
        summary.duration = started.elapsed();

        tracing::info!(
            peer = %peer_addr,
            chunks = summary.chunks,
            bytes = summary.bytes,
            bitrate = summary.bitrate(),
            duration_secs = summary.duration.as_secs(),
            "Producer disconnected"
        );

        let _ = stream.shutdown().await;
        result?;
        Ok(summary)
    }
}
