use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

mod hub;
mod ws;

use hub::Hub;

#[derive(Clone, Debug)]
struct RelayConfig {
    addr: SocketAddr,
    channel_capacity: usize,
}

impl RelayConfig {
    fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let addr: SocketAddr = env::var("RELAY_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:9300".to_string())
            .parse()
            .map_err(|e| format!("invalid RELAY_ADDR: {e}"))?;
        Ok(Self {
            addr,
            channel_capacity: env_var_usize("RELAY_CHANNEL_CAPACITY", 1024),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = RelayConfig::from_env()?;
    let hub = Arc::new(Hub::new(cfg.channel_capacity));
    let app = ws::router(hub);

    info!("focus relay listening on ws://{}/ws", cfg.addr);
    axum::serve(tokio::net::TcpListener::bind(cfg.addr).await?, app).await?;
    Ok(())
}

fn env_var_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
