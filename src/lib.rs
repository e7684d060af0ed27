//! # audio-relay
//!
//! Relays a live media stream from producers to WebSocket listeners.
//!
//! A producer such as ffmpeg opens the ingestion port, sends an HTTP-style
//! request head and then streams raw bytes (typically MPEG-TS audio). Every
//! chunk it sends is wrapped in a single WebSocket binary frame and written to
//! each consumer connected on the WebSocket port.
//!
//! # Example
//!
//! ```no_run
//! use audio_relay::{RelayConfig, RelayServer};
//!
//! # async fn example() -> audio_relay::Result<()> {
//! let config = RelayConfig::default().ingest_port(8081).consumer_port(4901);
//! let server = RelayServer::new(config);
//! server.run().await
//! # }
//! ```
//!
//! Inbound WebSocket frames are only inspected for their opcode: close and
//! ping are answered, everything else is ignored. Fragmented or
//! payload-carrying client frames are not supported.

pub mod error;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod stats;

pub use error::{Error, HandshakeError, Result};
pub use registry::{ConnectionRegistry, ConsumerConnection};
pub use server::{Broadcaster, IngestSummary, RelayConfig, RelayServer};
pub use stats::{RelayStats, StatsSnapshot};
