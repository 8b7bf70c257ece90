use api_client::VenueRegistry;
use core_types::{FundingRateSnapshot, MarkPriceSnapshot, VenueId};
use futures::future::join_all;
use tracing::{debug, warn};

/// Funding rates and prices gathered from every venue in one pass.
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    pub rates: FundingRateSnapshot,
    pub prices: MarkPriceSnapshot,
    /// Venues whose rates or prices could not be fetched.
    pub failed: Vec<VenueId>,
}

/// Fetches both snapshots from scratch.
///
/// Each venue's two requests run concurrently with every other venue's; results are
/// merged in registry order. A failed request leaves that venue out of the
/// corresponding table for this cycle.
pub async fn fetch_snapshot(registry: &VenueRegistry) -> MarketSnapshot {
    let results = join_all(registry.adapters().iter().map(|adapter| async move {
        let (rates, prices) = tokio::join!(adapter.fetch_funding_rates(), adapter.fetch_mark_prices());
        (adapter.id(), rates, prices)
    }))
    .await;

    let mut snapshot = MarketSnapshot::default();
    for (venue, rates, prices) in results {
        let mut ok = true;
        match rates {
            Ok(rates) => {
                debug!(%venue, coins = rates.len(), "Fetched funding rates.");
                snapshot.rates.merge_venue(venue, rates);
            }
            Err(e) => {
                warn!(%venue, error = %e, "Failed to fetch funding rates.");
                ok = false;
            }
        }
        match prices {
            Ok(prices) => {
                debug!(%venue, coins = prices.len(), "Fetched prices.");
                snapshot.prices.merge_venue(venue, prices);
            }
            Err(e) => {
                warn!(%venue, error = %e, "Failed to fetch prices.");
                ok = false;
            }
        }
        if !ok {
            snapshot.failed.push(venue);
        }
    }
    snapshot
}
