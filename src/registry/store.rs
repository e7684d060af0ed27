//! Connection registry implementation
//!
//! The set of consumers that receive broadcast frames.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::entry::ConsumerConnection;

/// Set of live consumer connections
///
/// One mutex covers add, remove and snapshot. Broadcasting works on a
/// snapshot so that socket writes never happen while the lock is held.
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<u64, Arc<ConsumerConnection>>>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// Register a consumer
    ///
    /// Returns the number of registered consumers after the insert.
    pub async fn add(&self, conn: Arc<ConsumerConnection>) -> usize {
        let mut connections = self.connections.lock().await;
        connections.insert(conn.id(), conn);
        connections.len()
    }

    /// Unregister a consumer
    ///
    /// Removing an ID that is not present is a no-op and returns `None`.
    pub async fn remove(&self, id: u64) -> Option<Arc<ConsumerConnection>> {
        self.connections.lock().await.remove(&id)
    }

    /// Point-in-time copy of the registered consumers
    pub async fn snapshot(&self) -> Vec<Arc<ConsumerConnection>> {
        self.connections.lock().await.values().cloned().collect()
    }

    /// Check whether a consumer is registered
    pub async fn contains(&self, id: u64) -> bool {
        self.connections.lock().await.contains_key(&id)
    }

    /// Number of registered consumers
    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    /// Whether no consumers are registered
    pub async fn is_empty(&self) -> bool {
        self.connections.lock().await.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use super::*;

    fn consumer(id: u64) -> Arc<ConsumerConnection> {
        let (_client, server) = tokio::io::duplex(64);
        let addr: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        Arc::new(ConsumerConnection::new(id, addr, server))
    }

    #[tokio::test]
    async fn test_add_and_remove() {
        let registry = ConnectionRegistry::new();
        assert!(registry.is_empty().await);

        assert_eq!(registry.add(consumer(1)).await, 1);
        assert_eq!(registry.add(consumer(2)).await, 2);
        assert!(registry.contains(1).await);

        let removed = registry.remove(1).await.unwrap();
        assert_eq!(removed.id(), 1);
        assert!(!registry.contains(1).await);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let registry = ConnectionRegistry::new();
        registry.add(consumer(1)).await;

        assert!(registry.remove(1).await.is_some());
        assert!(registry.remove(1).await.is_none());
        assert!(registry.remove(99).await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_same_connection_registered_once() {
        let registry = ConnectionRegistry::new();
        let conn = consumer(5);

        registry.add(conn.clone()).await;
        assert_eq!(registry.add(conn).await, 1);
    }

    #[tokio::test]
    async fn test_snapshot_is_detached() {
        let registry = ConnectionRegistry::new();
        registry.add(consumer(1)).await;
        registry.add(consumer(2)).await;

        let snapshot = registry.snapshot().await;
        registry.remove(1).await;
        registry.add(consumer(3)).await;

        let mut ids: Vec<u64> = snapshot.iter().map(|c| c.id()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);
    }
}
