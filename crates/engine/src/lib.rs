use alerter::{Notifier, settlement_message, startup_message};
use api_client::VenueRegistry;
use configuration::Config;
use core_types::{MarkPriceSnapshot, Position, TradeRecord};
use database::LedgerStore;
use executor::{LedgerError, OpenGates, OpenRequest, PositionLedger};
use rust_decimal::Decimal;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use strategies::{FundingRateArb, FundingRateArbParams, price_stable};
use tracing::{debug, error, info, warn};

pub mod error;
pub mod market_cache;
pub mod snapshot;
pub mod stats;

// Re-export the key components to provide a clean public API.
pub use error::{CycleFault, EngineError};
pub use market_cache::MarketAvailabilityCache;
pub use snapshot::{MarketSnapshot, fetch_snapshot};
pub use stats::SessionStats;

/// The steps of one simulation cycle, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    RefreshMarkets,
    Cleanup,
    FetchData,
    SettlePending,
    Scan,
    Decide,
    OpenAndMaybeSettle,
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CyclePhase::RefreshMarkets => "REFRESH_MARKETS",
            CyclePhase::Cleanup => "CLEANUP",
            CyclePhase::FetchData => "FETCH_DATA",
            CyclePhase::SettlePending => "SETTLE_PENDING",
            CyclePhase::Scan => "SCAN",
            CyclePhase::Decide => "DECIDE",
            CyclePhase::OpenAndMaybeSettle => "OPEN_AND_MAYBE_SETTLE",
        };
        f.write_str(name)
    }
}

/// What the scan-and-decide part of a cycle ended with.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    NoOpportunity,
    /// The best candidate failed an open gate.
    Rejected { coin: String, reason: LedgerError },
    /// Opened, but prices moved too much to settle yet.
    Held { coin: String },
    Settled(TradeRecord),
}

/// Timing and sizing knobs the cycle needs from the configuration.
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    pub open_margin: Decimal,
    pub price_stable_pct: Decimal,
    pub poll_interval: Duration,
    pub markets_refresh_interval: Duration,
    pub fault_backoff: Duration,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        let sim = &config.simulation;
        Self {
            open_margin: sim.open_margin,
            price_stable_pct: sim.price_stable_pct,
            poll_interval: sim.poll_interval(),
            markets_refresh_interval: sim.markets_refresh_interval(),
            fault_backoff: sim.fault_backoff(),
        }
    }
}

/// All mutable simulator state, owned by the engine's control task.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub ledger: PositionLedger,
    pub markets: MarketAvailabilityCache,
    pub stats: SessionStats,
}

/// The central orchestrator of the simulator.
///
/// Drives the cycle `REFRESH_MARKETS -> CLEANUP -> FETCH_DATA -> SETTLE_PENDING ->
/// SCAN -> DECIDE -> OPEN_AND_MAYBE_SETTLE`, then sleeps for the poll interval.
pub struct SimulationEngine {
    settings: EngineSettings,
    registry: VenueRegistry,
    scanner: FundingRateArb,
    store: Arc<dyn LedgerStore>,
    notifier: Option<Arc<dyn Notifier>>,
    state: SimulationState,
}

impl SimulationEngine {
    /// Creates a new `SimulationEngine` with all its required components.
    pub fn new(
        config: &Config,
        registry: VenueRegistry,
        store: Arc<dyn LedgerStore>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Result<Self, EngineError> {
        let sim = &config.simulation;
        let venues = config
            .venue_terms()
            .map_err(|e| EngineError::Configuration(e.to_string()))?;

        let scanner = FundingRateArb::new(
            FundingRateArbParams {
                open_margin: sim.open_margin,
                slippage_pct: sim.slippage_pct,
            },
            venues.clone(),
        )?;
        let ledger = PositionLedger::new(
            venues.keys().copied(),
            sim.start_balance,
            OpenGates {
                min_balance: sim.min_balance,
                min_net_profit: sim.min_net_profit,
            },
        );

        Ok(Self {
            settings: EngineSettings::from_config(config),
            state: SimulationState {
                ledger,
                markets: MarketAvailabilityCache::new(venues.keys().copied()),
                stats: SessionStats::default(),
            },
            registry,
            scanner,
            store,
            notifier,
        })
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Direct access to the simulator state, e.g. to seed positions.
    pub fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Runs until Ctrl-C.
    pub async fn run(&mut self) {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl-C.");
                std::future::pending::<()>().await;
            }
        })
        .await;
    }

    /// Runs cycles back to back until `shutdown` completes.
    ///
    /// A failed cycle is logged with its phase and followed by the fault backoff and
    /// the regular poll sleep; the next cycle starts from scratch. Partial changes a
    /// failed cycle made are kept.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            venues = self.registry.len(),
            poll_interval_secs = self.settings.poll_interval.as_secs(),
            "Simulation engine started."
        );
        self.notify(&startup_message(&self.registry.ids())).await;

        loop {
            let pause = match self.run_cycle().await {
                Ok(outcome) => {
                    debug!(?outcome, "Cycle finished.");
                    self.settings.poll_interval
                }
                Err(fault) => {
                    self.state.stats.faults += 1;
                    error!(
                        phase = %fault.phase,
                        error = %fault.source,
                        backoff_secs = self.settings.fault_backoff.as_secs(),
                        "Cycle failed."
                    );
                    self.settings.fault_backoff + self.settings.poll_interval
                }
            };

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested.");
                    break;
                }
                _ = tokio::time::sleep(pause) => {}
            }
        }

        self.state
            .stats
            .log_summary(self.state.ledger.balances(), self.state.ledger.open_count());
    }

    /// Executes one full cycle, without the trailing sleep.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, CycleFault> {
        let mut phase = CyclePhase::RefreshMarkets;
        self.state.stats.cycles += 1;
        self.cycle(&mut phase)
            .await
            .map_err(|source| CycleFault { phase, source })
    }

    async fn cycle(&mut self, phase: &mut CyclePhase) -> Result<CycleOutcome, EngineError> {
        *phase = CyclePhase::RefreshMarkets;
        if self.state.markets.is_due(self.settings.markets_refresh_interval) {
            self.state.markets.refresh(&self.registry).await;
        }

        *phase = CyclePhase::Cleanup;
        self.cleanup();

        *phase = CyclePhase::FetchData;
        let snapshot = fetch_snapshot(&self.registry).await;
        debug!(
            rate_coins = snapshot.rates.len(),
            price_coins = snapshot.prices.len(),
            failed = snapshot.failed.len(),
            "Fetched market snapshot."
        );

        *phase = CyclePhase::SettlePending;
        self.settle_pending(&snapshot.prices).await?;

        *phase = CyclePhase::Scan;
        let ledger = &self.state.ledger;
        let candidate = self.scanner.scan(
            &snapshot.rates,
            &snapshot.prices,
            self.state.markets.availability(),
            |coin| ledger.is_held(coin),
        );
        let Some(opportunity) = candidate else {
            info!("No opportunity this cycle.");
            return Ok(CycleOutcome::NoOpportunity);
        };
        info!(
            coin = %opportunity.coin,
            ex_low = %opportunity.ex_low,
            ex_high = %opportunity.ex_high,
            fr_low = %opportunity.fr_low,
            fr_high = %opportunity.fr_high,
            net_profit = %opportunity.net_profit,
            "Best opportunity found."
        );

        *phase = CyclePhase::Decide;
        let request = OpenRequest::from_opportunity(&opportunity, self.settings.open_margin);
        let position = match self.state.ledger.open(request) {
            Ok(position) => position,
            Err(reason) => {
                info!(coin = %opportunity.coin, %reason, "No opportunity / insufficient balance.");
                self.state.stats.rejected += 1;
                return Ok(CycleOutcome::Rejected {
                    coin: opportunity.coin,
                    reason,
                });
            }
        };
        self.state.stats.opened += 1;

        *phase = CyclePhase::OpenAndMaybeSettle;
        self.finish_open(position, &snapshot).await
    }

    fn cleanup(&mut self) {
        let removed = self.state.ledger.cleanup(self.state.markets.availability());
        for position in &removed {
            warn!(
                coin = %position.coin,
                long = %position.long.venue,
                short = %position.short.venue,
                "Coin delisted; dropped position without settlement."
            );
        }
        self.state.stats.cleaned += removed.len() as u64;
    }

    /// Settles every position left open by earlier cycles whose legs are back
    /// within the stability band.
    async fn settle_pending(&mut self, prices: &MarkPriceSnapshot) -> Result<(), EngineError> {
        let pct = self.settings.price_stable_pct;
        let ready: Vec<(String, Decimal)> = self
            .state
            .ledger
            .positions()
            .filter(|p| legs_stable(p, prices, pct))
            .map(|p| (p.coin.clone(), p.expected_net_profit))
            .collect();

        for (coin, net_profit) in ready {
            info!(%coin, "Pending position is stable again.");
            self.settle(&coin, net_profit).await?;
        }
        Ok(())
    }

    async fn finish_open(
        &mut self,
        position: Position,
        snapshot: &MarketSnapshot,
    ) -> Result<CycleOutcome, EngineError> {
        if legs_stable(&position, &snapshot.prices, self.settings.price_stable_pct) {
            let record = self
                .settle(&position.coin, position.expected_net_profit)
                .await?;
            Ok(CycleOutcome::Settled(record))
        } else {
            info!(coin = %position.coin, "Prices moved since entry; keeping position open.");
            Ok(CycleOutcome::Held {
                coin: position.coin,
            })
        }
    }

    /// Closes the position, persists the trade and announces it.
    ///
    /// The ledger settles first: balances are credited and the position removed
    /// before the trade log is written. If the append fails the cycle faults with
    /// the profit already credited and no row in the log. The position is gone at
    /// that point, so a later cycle cannot settle and credit it a second time.
    async fn settle(&mut self, coin: &str, net_profit: Decimal) -> Result<TradeRecord, EngineError> {
        let record = self.state.ledger.settle(coin, net_profit)?;
        self.state.stats.record_settlement(&record);
        self.store.append(&record)?;
        self.notify(&settlement_message(&record)).await;
        self.state
            .stats
            .log_summary(self.state.ledger.balances(), self.state.ledger.open_count());
        Ok(record)
    }

    async fn notify(&self, text: &str) {
        if let Some(notifier) = &self.notifier {
            if let Err(e) = notifier.send(text).await {
                error!(error = %e, "Failed to send notification.");
            }
        }
    }
}

/// Both legs have a fresh price within `pct` of their entry price.
fn legs_stable(position: &Position, prices: &MarkPriceSnapshot, pct: Decimal) -> bool {
    position.legs().iter().all(|leg| {
        prices
            .get(&position.coin, leg.venue)
            .is_some_and(|now| price_stable(leg.entry_price, now, pct))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{Leg, LegSide, VenueId};
    use rust_decimal_macros::dec;

    fn position() -> Position {
        Position {
            position_id: uuid::Uuid::nil(),
            coin: "BTC".to_string(),
            long: Leg {
                venue: VenueId::Okx,
                side: LegSide::Long,
                margin: dec!(250),
                entry_price: dec!(100),
            },
            short: Leg {
                venue: VenueId::Bybit,
                side: LegSide::Short,
                margin: dec!(250),
                entry_price: dec!(100),
            },
            expected_net_profit: dec!(6),
            opened_at: Default::default(),
        }
    }

    #[test]
    fn both_legs_must_be_stable() {
        let mut prices = MarkPriceSnapshot::new();
        prices.insert("BTC", VenueId::Okx, dec!(100.3));
        prices.insert("BTC", VenueId::Bybit, dec!(99.8));
        assert!(legs_stable(&position(), &prices, dec!(0.003)));

        prices.insert("BTC", VenueId::Bybit, dec!(99.6));
        assert!(!legs_stable(&position(), &prices, dec!(0.003)));
    }

    #[test]
    fn missing_price_is_not_stable() {
        let mut prices = MarkPriceSnapshot::new();
        prices.insert("BTC", VenueId::Okx, dec!(100));
        assert!(!legs_stable(&position(), &prices, dec!(0.003)));
    }

    #[test]
    fn phases_display_in_upper_snake_case() {
        assert_eq!(CyclePhase::SettlePending.to_string(), "SETTLE_PENDING");
        assert_eq!(CyclePhase::OpenAndMaybeSettle.to_string(), "OPEN_AND_MAYBE_SETTLE");
    }
}
