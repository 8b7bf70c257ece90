use api_client::VenueRegistry;
use core_types::{MarketAvailability, VenueId};
use futures::future::join_all;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Per-venue listings of tradable swap coins, refreshed on an interval.
///
/// Between refreshes the listings are read-only and may be stale by up to the
/// refresh interval.
#[derive(Debug, Clone)]
pub struct MarketAvailabilityCache {
    markets: MarketAvailability,
    last_refresh: Option<Instant>,
}

impl MarketAvailabilityCache {
    pub fn new(venues: impl IntoIterator<Item = VenueId>) -> Self {
        Self {
            markets: MarketAvailability::new(venues),
            last_refresh: None,
        }
    }

    /// True if the cache was never refreshed or `interval` has passed since.
    pub fn is_due(&self, interval: Duration) -> bool {
        match self.last_refresh {
            None => true,
            Some(at) => at.elapsed() > interval,
        }
    }

    /// Queries every venue's listings concurrently.
    ///
    /// A venue that fails keeps its previous listing; the failure is logged and not
    /// propagated. Returns the number of venues refreshed successfully.
    pub async fn refresh(&mut self, registry: &VenueRegistry) -> usize {
        let results = join_all(registry.adapters().iter().map(|adapter| async move {
            (adapter.id(), adapter.list_swap_markets().await)
        }))
        .await;

        let mut refreshed = 0;
        for (venue, result) in results {
            match result {
                Ok(coins) => {
                    info!(%venue, markets = coins.len(), "Refreshed swap markets.");
                    self.markets.replace(venue, coins);
                    refreshed += 1;
                }
                Err(e) => {
                    warn!(%venue, error = %e, "Failed to refresh swap markets; keeping previous listing.");
                }
            }
        }

        self.last_refresh = Some(Instant::now());
        refreshed
    }

    pub fn availability(&self) -> &MarketAvailability {
        &self.markets
    }
}
