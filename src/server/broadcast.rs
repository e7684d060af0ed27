//! Broadcast fan-out
//!
//! Each chunk is encoded once and the same frame is written to every
//! consumer in a registry snapshot, one after another. A consumer whose write
//! fails is dropped after the pass; the others still get the frame.
//!
//! There is no write timeout. A consumer that stops reading without the
//! connection failing stalls the broadcast until the transport gives up.

use std::sync::Arc;

use crate::protocol::frame::binary_frame;
use crate::registry::{ConnectionRegistry, ConsumerConnection};
use crate::stats::RelayStats;

/// Fans media chunks out to all registered consumers
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
    stats: Arc<RelayStats>,
}

impl Broadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>, stats: Arc<RelayStats>) -> Self {
        Self { registry, stats }
    }

    /// Get the stats updated by each broadcast
    pub fn stats(&self) -> &Arc<RelayStats> {
        &self.stats
    }

    /// Send `chunk` as one binary frame to every registered consumer
    ///
    /// Returns how many consumers the frame was written to. Consumers whose
    /// write failed are removed from the registry and closed. Empty chunks
    /// are skipped.
    pub async fn broadcast(&self, chunk: &[u8]) -> usize {
        if chunk.is_empty() {
            return 0;
        }

        let frame = binary_frame(chunk);
        let consumers = self.registry.snapshot().await;

        let mut delivered = 0;
        let mut failed: Vec<Arc<ConsumerConnection>> = Vec::new();

        for conn in consumers {
            match conn.send(&frame).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::debug!(
                        conn_id = conn.id(),
                        peer = %conn.peer_addr(),
                        error = %e,
                        "Broadcast write failed"
                    );
                    failed.push(conn);
                }
            }
        }

        let evicted = failed.len();
        for conn in failed {
            self.registry.remove(conn.id()).await;
            conn.close().await;
            tracing::info!(
                conn_id = conn.id(),
                peer = %conn.peer_addr(),
                "Consumer evicted"
            );
        }

        self.stats.record_broadcast(chunk.len(), delivered, evicted);

        tracing::trace!(
            bytes = chunk.len(),
            delivered = delivered,
            evicted = evicted,
            "Chunk broadcast"
        );

        delivered
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::net::SocketAddr;

    use tokio::io::{AsyncReadExt, DuplexStream};

    use super::*;
    use crate::protocol::frame::testing::decode_frame;
    use crate::protocol::Opcode;

    fn addr() -> SocketAddr {
        "127.0.0.1:45000".parse().unwrap()
    }

    fn setup() -> (Broadcaster, Arc<ConnectionRegistry>, Arc<RelayStats>) {
        let registry = Arc::new(ConnectionRegistry::new());
        let stats = Arc::new(RelayStats::new());
        let broadcaster = Broadcaster::new(registry.clone(), stats.clone());
        (broadcaster, registry, stats)
    }

    async fn add_consumer(registry: &ConnectionRegistry, id: u64) -> DuplexStream {
        let (client, server) = tokio::io::duplex(256 * 1024);
        registry
            .add(Arc::new(ConsumerConnection::new(id, addr(), server)))
            .await;
        client
    }

    async fn read_frame(client: &mut DuplexStream) -> (Opcode, Vec<u8>) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            if let Some((opcode, payload, _)) = decode_frame(&buf) {
                return (opcode, payload);
            }
            let n = client.read(&mut chunk).await.unwrap();
            assert!(n > 0, "stream closed before a full frame arrived");
            buf.extend_from_slice(&chunk[..n]);
        }
    }

    #[tokio::test]
    async fn test_all_consumers_receive_chunk() {
        let (broadcaster, registry, _) = setup();
        let mut clients = Vec::new();
        for id in 1..=3 {
            clients.push(add_consumer(&registry, id).await);
        }

        let chunk: Vec<u8> = (0..1000).map(|i| i as u8).collect();
        assert_eq!(broadcaster.broadcast(&chunk).await, 3);

        for client in clients.iter_mut() {
            let (opcode, payload) = read_frame(client).await;
            assert_eq!(opcode, Opcode::Binary);
            assert_eq!(payload, chunk);
        }
    }

    #[tokio::test]
    async fn test_no_consumers() {
        let (broadcaster, _, stats) = setup();

        assert_eq!(broadcaster.broadcast(b"data").await, 0);
        assert_eq!(stats.snapshot().chunks_broadcast, 1);
    }

    #[tokio::test]
    async fn test_empty_chunk_skipped() {
        let (broadcaster, registry, stats) = setup();
        let _client = add_consumer(&registry, 1).await;

        assert_eq!(broadcaster.broadcast(&[]).await, 0);
        assert_eq!(stats.snapshot().chunks_broadcast, 0);
    }

    #[tokio::test]
    async fn test_failed_consumer_evicted() {
        let (broadcaster, registry, stats) = setup();
        let mut healthy = add_consumer(&registry, 1).await;
        let broken = add_consumer(&registry, 2).await;
        drop(broken);

        assert_eq!(broadcaster.broadcast(b"first").await, 1);
        assert!(registry.contains(1).await);
        assert!(!registry.contains(2).await);

        assert_eq!(broadcaster.broadcast(b"second").await, 1);

        let mut expected = binary_frame(b"first").to_vec();
        expected.extend_from_slice(&binary_frame(b"second"));
        let mut received = vec![0u8; expected.len()];
        healthy.read_exact(&mut received).await.unwrap();
        assert_eq!(received, expected);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.consumers_evicted, 1);
        assert_eq!(snapshot.frames_delivered, 2);
        assert_eq!(snapshot.bytes_broadcast, 11);
    }

    #[tokio::test]
    async fn test_write_error_closes_connection() {
        let (broadcaster, registry, _) = setup();
        let writer = tokio_test::io::Builder::new()
            .write_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .build();
        let conn = Arc::new(ConsumerConnection::new(9, addr(), writer));
        registry.add(conn.clone()).await;

        assert_eq!(broadcaster.broadcast(b"x").await, 0);
        assert!(conn.is_closed());
        assert!(registry.is_empty().await);
    }
}
