//! Server configuration

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Default port for the producer (ingestion) listener
pub const DEFAULT_INGEST_PORT: u16 = 8081;

/// Default port for the WebSocket consumer listener
pub const DEFAULT_CONSUMER_PORT: u16 = 4901;

/// Default size of each producer read, and so the largest broadcast chunk
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024;

/// Relay configuration options
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address the producer listener binds to
    pub ingest_addr: SocketAddr,

    /// Address the WebSocket listener binds to
    pub consumer_addr: SocketAddr,

    /// Producer read size
    pub read_buffer_size: usize,

    /// Enable TCP_NODELAY on accepted sockets
    pub tcp_nodelay: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        let any = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
        Self {
            ingest_addr: SocketAddr::new(any, DEFAULT_INGEST_PORT),
            consumer_addr: SocketAddr::new(any, DEFAULT_CONSUMER_PORT),
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            tcp_nodelay: true, // Audio chunks are small, don't let Nagle sit on them
        }
    }
}

impl RelayConfig {
    /// Bind both listeners on `ip`, keeping their ports
    pub fn bind_ip(mut self, ip: IpAddr) -> Self {
        self.ingest_addr.set_ip(ip);
        self.consumer_addr.set_ip(ip);
        self
    }

    /// Set the ingestion port
    pub fn ingest_port(mut self, port: u16) -> Self {
        self.ingest_addr.set_port(port);
        self
    }

    /// Set the consumer port
    pub fn consumer_port(mut self, port: u16) -> Self {
        self.consumer_addr.set_port(port);
        self
    }

    /// Set the producer read size (at least one byte)
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(1);
        self
    }

    /// Enable or disable TCP_NODELAY
    pub fn tcp_nodelay(mut self, enabled: bool) -> Self {
        self.tcp_nodelay = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();

        assert_eq!(config.ingest_addr.port(), 8081);
        assert_eq!(config.consumer_addr.port(), 4901);
        assert_eq!(config.read_buffer_size, 65536);
        assert!(config.ingest_addr.ip().is_unspecified());
        assert!(config.tcp_nodelay);
    }

    #[test]
    fn test_builder_ports() {
        let config = RelayConfig::default().ingest_port(9000).consumer_port(9001);

        assert_eq!(config.ingest_addr.port(), 9000);
        assert_eq!(config.consumer_addr.port(), 9001);
    }

    #[test]
    fn test_builder_bind_ip_keeps_ports() {
        let ip: IpAddr = "127.0.0.1".parse().unwrap();
        let config = RelayConfig::default().consumer_port(5000).bind_ip(ip);

        assert_eq!(config.ingest_addr, "127.0.0.1:8081".parse::<SocketAddr>().unwrap());
        assert_eq!(config.consumer_addr, "127.0.0.1:5000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_builder_read_buffer_size_floor() {
        assert_eq!(RelayConfig::default().read_buffer_size(0).read_buffer_size, 1);
        assert_eq!(
            RelayConfig::default().read_buffer_size(4096).read_buffer_size,
            4096
        );
    }

    #[test]
    fn test_builder_chaining() {
        let config = RelayConfig::default()
            .ingest_port(1)
            .consumer_port(2)
            .read_buffer_size(188 * 7)
            .tcp_nodelay(false);

        assert_eq!(config.ingest_addr.port(), 1);
        assert_eq!(config.consumer_addr.port(), 2);
        assert_eq!(config.read_buffer_size, 1316);
        assert!(!config.tcp_nodelay);
    }
}
