//! audio-relay binary
//!
//! Usage:
//!   audio-relay                                   # 0.0.0.0, ports 8081 / 4901
//!   audio-relay --bind 127.0.0.1 --consumer-port 9000
//!
//! Feed it with:
//!   ffmpeg -f pulse -i default -c:a mp2 -f mpegts http://localhost:8081/
//!
//! and point a WebSocket MPEG-TS player (e.g. JSMpeg) at ws://localhost:4901/.

use std::net::IpAddr;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use audio_relay::server::config::{
    DEFAULT_CONSUMER_PORT, DEFAULT_INGEST_PORT, DEFAULT_READ_BUFFER_SIZE,
};
use audio_relay::{RelayConfig, RelayServer};

#[derive(Parser, Debug)]
#[command(name = "audio-relay")]
#[command(about = "Relay an HTTP media upload to WebSocket listeners", version)]
struct Args {
    /// Address both listeners bind to
    #[arg(long, env = "RELAY_BIND", default_value = "0.0.0.0")]
    bind: IpAddr,

    /// Port producers push media to
    #[arg(long, env = "RELAY_INGEST_PORT", default_value_t = DEFAULT_INGEST_PORT)]
    ingest_port: u16,

    /// Port WebSocket consumers connect to
    #[arg(long, env = "RELAY_CONSUMER_PORT", default_value_t = DEFAULT_CONSUMER_PORT)]
    consumer_port: u16,

    /// Bytes read from a producer per broadcast frame
    #[arg(long, env = "RELAY_READ_BUFFER_SIZE", default_value_t = DEFAULT_READ_BUFFER_SIZE)]
    read_buffer_size: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("audio_relay=info")),
        )
        .init();

    let config = RelayConfig::default()
        .bind_ip(args.bind)
        .ingest_port(args.ingest_port)
        .consumer_port(args.consumer_port)
        .read_buffer_size(args.read_buffer_size);

    tracing::info!(
        ingest = %config.ingest_addr,
        consumer = %config.consumer_addr,
        read_buffer_size = config.read_buffer_size,
        "Audio relay starting"
    );

    let server = RelayServer::new(config);

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    let stats = server.stats().snapshot();
    tracing::info!(
        producers = stats.producers_connected,
        consumers = stats.consumers_admitted,
        still_connected = server.registry().len().await,
        chunks = stats.chunks_broadcast,
        bytes = stats.bytes_broadcast,
        "Audio relay stopped"
    );

    Ok(())
}
