use anyhow::{Context, Result};
use clap::Parser;
use ig_token_broker::cache::Store;
use ig_token_broker::config::args::Args;
use ig_token_broker::provider::ProviderClient;
use ig_token_broker::server;
use ig_token_broker::token::TokenManager;
use ig_token_broker::utils::logging;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Read env / flags
    // -------------------------------

    let args = Args::parse();
    let config = args.into_config()?;
    logging::init_logging(&config.logging);
    debug!("config: {:?}", config);

    // -------------------------------
    // 2. Connect cache
    // -------------------------------

    let store = Store::connect(&config.cache_url)
        .await
        .context("failed to connect cache")?;
    info!("cache backend: {}", store.backend());

    // -------------------------------
    // 3. Create provider client
    // -------------------------------

    let provider = ProviderClient::new(&config.provider)?;
    let tokens = TokenManager::new(&config, store, provider);

    // -------------------------------
    // 4. Start http server
    // -------------------------------

    info!("Service starting...");
    server::server::start(&config, tokens).await
}
