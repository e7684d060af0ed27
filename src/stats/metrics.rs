//! Statistics for the relay

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Relay-wide counters, updated concurrently by every connection task
#[derive(Debug)]
pub struct RelayStats {
    started_at: Instant,
    producers_connected: AtomicU64,
    chunks_broadcast: AtomicU64,
    bytes_broadcast: AtomicU64,
    frames_delivered: AtomicU64,
    consumers_admitted: AtomicU64,
    consumers_evicted: AtomicU64,
}

/// Plain copy of [`RelayStats`] at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Time since the stats were created
    pub uptime: Duration,
    /// Producers that completed the ingestion head exchange
    pub producers_connected: u64,
    /// Non-empty chunks handed to the broadcaster
    pub chunks_broadcast: u64,
    /// Payload bytes handed to the broadcaster
    pub bytes_broadcast: u64,
    /// Frames written successfully, summed over consumers
    pub frames_delivered: u64,
    /// Consumers that completed the handshake
    pub consumers_admitted: u64,
    /// Consumers dropped after a failed write
    pub consumers_evicted: u64,
}

impl RelayStats {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            producers_connected: AtomicU64::new(0),
            chunks_broadcast: AtomicU64::new(0),
            bytes_broadcast: AtomicU64::new(0),
            frames_delivered: AtomicU64::new(0),
            consumers_admitted: AtomicU64::new(0),
            consumers_evicted: AtomicU64::new(0),
        }
    }

    pub fn record_producer(&self) {
        self.producers_connected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_consumer(&self) {
        self.consumers_admitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one broadcast call
    pub fn record_broadcast(&self, payload_len: usize, delivered: usize, evicted: usize) {
        self.chunks_broadcast.fetch_add(1, Ordering::Relaxed);
        self.bytes_broadcast
            .fetch_add(payload_len as u64, Ordering::Relaxed);
        self.frames_delivered
            .fetch_add(delivered as u64, Ordering::Relaxed);
        self.consumers_evicted
            .fetch_add(evicted as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            uptime: self.started_at.elapsed(),
            producers_connected: self.producers_connected.load(Ordering::Relaxed),
            chunks_broadcast: self.chunks_broadcast.load(Ordering::Relaxed),
            bytes_broadcast: self.bytes_broadcast.load(Ordering::Relaxed),
            frames_delivered: self.frames_delivered.load(Ordering::Relaxed),
            consumers_admitted: self.consumers_admitted.load(Ordering::Relaxed),
            consumers_evicted: self.consumers_evicted.load(Ordering::Relaxed),
        }
    }
}

impl Default for RelayStats {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsSnapshot {
    /// Average ingest rate in bits per second since startup
    pub fn bitrate(&self) -> u64 {
        let secs = self.uptime.as_secs();
        if secs > 0 {
            (self.bytes_broadcast * 8) / secs
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_are_zero() {
        let snapshot = RelayStats::new().snapshot();

        assert_eq!(snapshot.producers_connected, 0);
        assert_eq!(snapshot.chunks_broadcast, 0);
        assert_eq!(snapshot.bytes_broadcast, 0);
        assert_eq!(snapshot.frames_delivered, 0);
        assert_eq!(snapshot.consumers_admitted, 0);
        assert_eq!(snapshot.consumers_evicted, 0);
    }

    #[test]
    fn test_record_broadcast() {
        let stats = RelayStats::new();
        stats.record_broadcast(188, 3, 0);
        stats.record_broadcast(376, 2, 1);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.chunks_broadcast, 2);
        assert_eq!(snapshot.bytes_broadcast, 564);
        assert_eq!(snapshot.frames_delivered, 5);
        assert_eq!(snapshot.consumers_evicted, 1);
    }

    #[test]
    fn test_record_connections() {
        let stats = RelayStats::new();
        stats.record_producer();
        stats.record_consumer();
        stats.record_consumer();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.producers_connected, 1);
        assert_eq!(snapshot.consumers_admitted, 2);
    }

    #[test]
    fn test_bitrate() {
        let snapshot = StatsSnapshot {
            uptime: Duration::from_secs(2),
            bytes_broadcast: 1000,
            ..Default::default()
        };
        assert_eq!(snapshot.bitrate(), 4000);

        let snapshot = StatsSnapshot::default();
        assert_eq!(snapshot.bitrate(), 0);
    }
}
