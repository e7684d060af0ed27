//! Relay server
//!
//! Two listeners share one consumer registry:
//! - the ingestion port, where producers push raw media after a minimal
//!   HTTP-style head
//! - the WebSocket port, where consumers upgrade and then receive every
//!   chunk as a binary frame

pub mod broadcast;
pub mod config;
pub mod consumer;
pub mod listener;
pub mod producer;

pub use broadcast::Broadcaster;
pub use config::RelayConfig;
pub use consumer::{ConsumerHandler, DisconnectReason};
pub use listener::RelayServer;
pub use producer::{IngestSummary, ProducerHandler};
