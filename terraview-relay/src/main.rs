mod server;
mod ws;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use terraview_core::config::load_config;
use terraview_core::logging;
use terraview_core::upstream::{ReadingSource, UpstreamClient};

use server::RelayServer;
use ws::ReadingHub;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load and validate configuration
    let config = load_config()?;

    // 2. Initialize logging
    logging::init_logging(&config.logging)?;
    info!("TerraView relay starting...");
    info!("Listen address: {}", config.listen_address());
    info!("Upstream base URL: {}", config.upstream.base_url);
    info!(
        "Poll interval: {}s",
        config.relay.poll_interval_seconds
    );

    // 3. Initialize the upstream client and broadcast hub
    let source: Arc<dyn ReadingSource> = Arc::new(UpstreamClient::new(&config.upstream)?);
    let hub = Arc::new(ReadingHub::new());

    // 4. Start the relay server (runs until SIGINT/SIGTERM)
    let relay = RelayServer::new(config, source, hub);
    relay.start().await
}
