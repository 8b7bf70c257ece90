use alerter::{Notifier, TelegramAlerter};
use anyhow::Context;
use api_client::VenueRegistry;
use database::CsvTradeLog;
use engine::SimulationEngine;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The main entry point for the funding arbitrage simulator.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file before the config reads them.
    let dotenv = dotenvy::dotenv();

    let config = configuration::load_config().context("Failed to load config.toml")?;
    let _log_guard =
        configuration::init_tracing(&config.logging).context("Failed to initialise logging")?;

    match dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env file."),
        Err(e) if e.not_found() => debug!("No .env file found."),
        Err(e) => warn!(error = %e, "Failed to read .env file."),
    }
    info!(?config, "Configuration loaded.");

    let trade_log = CsvTradeLog::open(&config.ledger.path).with_context(|| {
        format!("Failed to create trade log at {}", config.ledger.path.display())
    })?;
    let registry = VenueRegistry::from_config(&config).context("Failed to build venue clients")?;
    let notifier = TelegramAlerter::new(&config.telegram, config.simulation.request_timeout())
        .map(|alerter| Arc::new(alerter) as Arc<dyn Notifier>);

    let mut engine = SimulationEngine::new(&config, registry, Arc::new(trade_log), notifier)
        .context("Failed to initialise the simulation engine")?;

    engine.run().await;

    info!("Simulator stopped.");
    Ok(())
}
