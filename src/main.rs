//! Scratcher House: house-side relay for the scratcher game.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! connects the house wallet to the scratcher contract, and serves the
//! relay until Ctrl-C.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use scratcher_house::chain::{EthersScratcher, HouseKey, ScratcherContract};
use scratcher_house::config;
use scratcher_house::relay::{self, RelayState};
use scratcher_house::strategy::HouseNegotiator;

const BANNER: &str = r#"
 ____                 _       _
/ ___|  ___ _ __ __ _| |_ ___| |__   ___ _ __
\___ \ / __| '__/ _` | __/ __| '_ \ / _ \ '__|
 ___) | (__| | | (_| | || (__| | | |  __/ |
|____/ \___|_|  \__,_|\__\___|_| |_|\___|_|

  House offer relay
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = config::AppConfig::load("config.toml")?;

    init_logging();

    println!("{BANNER}");
    info!(
        house = %cfg.house.name,
        chain_id = cfg.chain.chain_id,
        contract = %cfg.chain.contract_address,
        "Scratcher house starting up"
    );

    let negotiation = cfg.negotiation.to_negotiation_config();
    info!(
        threshold = %negotiation.high_ev_threshold,
        high_ev_band = %format!("{}-{}%", negotiation.high_ev_band.min, negotiation.high_ev_band.max),
        normal_ev_band = %format!("{}-{}%", negotiation.normal_ev_band.min, negotiation.normal_ev_band.max),
        "Negotiation bands loaded"
    );

    if !cfg.relay.enabled {
        warn!("Relay disabled in config.toml, nothing to do");
        return Ok(());
    }

    let raw_key = config::AppConfig::resolve_env(&cfg.chain.private_key_env)?;
    let key = HouseKey::parse(&raw_key)
        .with_context(|| format!("Invalid house key in {}", cfg.chain.private_key_env))?;
    let contract: Arc<dyn ScratcherContract> = Arc::new(EthersScratcher::new(&cfg.chain, &key)?);
    info!(backend = contract.name(), "Contract backend ready");

    let state = Arc::new(RelayState::new(contract, HouseNegotiator::with_config(negotiation)));

    relay::serve_relay(state, cfg.relay.port, shutdown_signal()).await?;

    info!("Scratcher house shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Initialise the tracing subscriber.
///
/// Set `HOUSE_LOG_JSON=1` for JSON output. Filter with `RUST_LOG`.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("scratcher_house=info"));

    if std::env::var("HOUSE_LOG_JSON").is_ok() {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
