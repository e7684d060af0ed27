//! Relay server listeners
//!
//! Runs the ingestion and consumer accept loops side by side and spawns one
//! task per accepted connection.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};

use crate::error::Result;
use crate::registry::ConnectionRegistry;
use crate::server::broadcast::Broadcaster;
use crate::server::config::RelayConfig;
use crate::server::consumer::ConsumerHandler;
use crate::server::producer::ProducerHandler;
use crate::stats::RelayStats;

/// Media relay server
pub struct RelayServer {
    config: RelayConfig,
    registry: Arc<ConnectionRegistry>,
    stats: Arc<RelayStats>,
    producers: ProducerHandler,
    consumers: ConsumerHandler,
    next_conn_id: AtomicU64,
}

impl RelayServer {
    /// Create a new server with the given configuration
    pub fn new(config: RelayConfig) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let stats = Arc::new(RelayStats::new());
        let broadcaster = Broadcaster::new(Arc::clone(&registry), Arc::clone(&stats));

        Self {
            producers: ProducerHandler::new(broadcaster, config.read_buffer_size),
            consumers: ConsumerHandler::new(Arc::clone(&registry), Arc::clone(&stats)),
            config,
            registry,
            stats,
            next_conn_id: AtomicU64::new(1),
        }
    }

    /// Get a reference to the consumer registry
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Get a reference to the relay statistics
    pub fn stats(&self) -> &Arc<RelayStats> {
        &self.stats
    }

    /// Bind the ingestion and consumer listeners from the configuration
    pub async fn bind(&self) -> Result<(TcpListener, TcpListener)> {
        let ingest = TcpListener::bind(self.config.ingest_addr).await?;
        let consumer = TcpListener::bind(self.config.consumer_addr).await?;
        Ok((ingest, consumer))
    }

    /// Run the server
    ///
    /// This method only returns if binding fails.
    pub async fn run(&self) -> Result<()> {
        let (ingest, consumer) = self.bind().await?;
        self.serve(ingest, consumer).await
    }

    /// Run the server with graceful shutdown
    ///
    /// Connection tasks already spawned keep running until their peers leave.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let (ingest, consumer) = self.bind().await?;

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.serve(ingest, consumer) => result,
        }
    }

    /// Serve on already-bound listeners
    pub async fn serve(&self, ingest: TcpListener, consumer: TcpListener) -> Result<()> {
        if let Ok(addr) = ingest.local_addr() {
            tracing::info!(addr = %addr, "Ingestion listener ready");
        }
        if let Ok(addr) = consumer.local_addr() {
            tracing::info!(addr = %addr, "WebSocket listener ready");
        }

        tokio::select! {
            result = self.ingest_loop(&ingest) => result,
            result = self.consumer_loop(&consumer) => result,
        }
    }

    async fn ingest_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => self.spawn_producer(socket, peer_addr),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept producer connection");
                }
            }
        }
    }

    async fn consumer_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => self.spawn_consumer(socket, peer_addr),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept consumer connection");
                }
            }
        }
    }

    fn spawn_producer(&self, socket: TcpStream, peer_addr: SocketAddr) {
        tracing::info!(peer = %peer_addr, "Producer connected");

        if let Err(e) = self.configure_socket(&socket) {
            tracing::error!(peer = %peer_addr, error = %e, "Failed to configure socket");
            return;
        }

        let producers = self.producers.clone();
        tokio::spawn(async move {
            if let Err(e) = producers.run(socket, peer_addr).await {
                tracing::debug!(peer = %peer_addr, error = %e, "Producer stream error");
            }
        });
    }

    fn spawn_consumer(&self, socket: TcpStream, peer_addr: SocketAddr) {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(conn_id = conn_id, peer = %peer_addr, "New consumer connection");

        if let Err(e) = self.configure_socket(&socket) {
            tracing::error!(peer = %peer_addr, error = %e, "Failed to configure socket");
            return;
        }

        let consumers = self.consumers.clone();
        tokio::spawn(async move {
            if let Err(e) = consumers.run(socket, conn_id, peer_addr).await {
                tracing::debug!(
                    conn_id = conn_id,
                    peer = %peer_addr,
                    error = %e,
                    "Consumer handshake failed"
                );
            }
        });
    }

    fn configure_socket(&self, socket: &TcpStream) -> std::io::Result<()> {
        if self.config.tcp_nodelay {
            socket.set_nodelay(true)?;
        }
        Ok(())
    }
}
