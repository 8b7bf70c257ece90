use crate::enums::{LegSide, VenueId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use uuid::Uuid;

/// The per-venue trading terms the profit model needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueTerms {
    /// Multiplier applied to margin to obtain notional exposure.
    pub leverage: Decimal,
    /// Taker fee charged per leg, as a fraction (0.0006 = 0.06%).
    pub fee_pct: Decimal,
}

/// A `coin -> venue -> value` table rebuilt from scratch every cycle.
///
/// Coins are kept in ascending symbol order and venues in declaration order,
/// so every scan over the table visits entries deterministically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VenueTable {
    entries: BTreeMap<String, BTreeMap<VenueId, Decimal>>,
}

/// Funding rates (signed fractions) per coin and venue.
pub type FundingRateSnapshot = VenueTable;

/// Last traded prices per coin and venue.
pub type MarkPriceSnapshot = VenueTable;

impl VenueTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, coin: impl Into<String>, venue: VenueId, value: Decimal) {
        self.entries.entry(coin.into()).or_default().insert(venue, value);
    }

    /// Merges everything a single venue reported into the table.
    pub fn merge_venue(&mut self, venue: VenueId, values: HashMap<String, Decimal>) {
        for (coin, value) in values {
            self.insert(coin, venue, value);
        }
    }

    pub fn get(&self, coin: &str, venue: VenueId) -> Option<Decimal> {
        self.entries.get(coin).and_then(|quotes| quotes.get(&venue)).copied()
    }

    /// All venue quotes for one coin.
    pub fn quotes(&self, coin: &str) -> Option<&BTreeMap<VenueId, Decimal>> {
        self.entries.get(coin)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<VenueId, Decimal>)> {
        self.entries.iter()
    }

    /// Number of coins in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The set of tradable swap coins listed on each venue.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketAvailability {
    listings: BTreeMap<VenueId, HashSet<String>>,
}

impl MarketAvailability {
    /// Creates an availability table where every venue lists nothing yet.
    pub fn new(venues: impl IntoIterator<Item = VenueId>) -> Self {
        Self {
            listings: venues.into_iter().map(|v| (v, HashSet::new())).collect(),
        }
    }

    /// Replaces the listing of one venue wholesale.
    pub fn replace(&mut self, venue: VenueId, coins: HashSet<String>) {
        self.listings.insert(venue, coins);
    }

    /// A venue without a listing lists nothing.
    pub fn is_listed(&self, venue: VenueId, coin: &str) -> bool {
        self.listings
            .get(&venue)
            .is_some_and(|coins| coins.contains(coin))
    }

    pub fn listed_count(&self, venue: VenueId) -> usize {
        self.listings.get(&venue).map_or(0, HashSet::len)
    }
}

/// One side of a hedged position on a single venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub venue: VenueId,
    pub side: LegSide,
    pub margin: Decimal,
    pub entry_price: Decimal,
}

/// A simulated long/short pair on one coin. Immutable once opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub position_id: Uuid,
    pub coin: String,
    pub long: Leg,
    pub short: Leg,
    /// The net profit the scanner expected when the position was opened.
    pub expected_net_profit: Decimal,
    pub opened_at: DateTime<Utc>,
}

impl Position {
    pub fn legs(&self) -> [&Leg; 2] {
        [&self.long, &self.short]
    }
}

/// The best arbitrage candidate found in one scan.
#[derive(Debug, Clone, PartialEq)]
pub struct Opportunity {
    pub coin: String,
    /// Venue with the lowest funding rate.
    pub ex_low: VenueId,
    /// Venue with the highest funding rate.
    pub ex_high: VenueId,
    pub fr_low: Decimal,
    pub fr_high: Decimal,
    pub net_profit: Decimal,
    pub price_low: Decimal,
    pub price_high: Decimal,
}

impl Opportunity {
    // The long leg goes on the high-funding venue, the short leg on the low one.
    pub fn long_venue(&self) -> VenueId {
        self.ex_high
    }

    pub fn short_venue(&self) -> VenueId {
        self.ex_low
    }

    pub fn long_price(&self) -> Decimal {
        self.price_high
    }

    pub fn short_price(&self) -> Decimal {
        self.price_low
    }
}

/// The immutable fact written to the trade log when a position settles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub timestamp: DateTime<Utc>,
    pub coin: String,
    pub long_venue: VenueId,
    pub short_venue: VenueId,
    pub net_profit: Decimal,
    pub long_entry_price: Decimal,
    pub short_entry_price: Decimal,
}

impl TradeRecord {
    pub fn from_position(position: &Position, net_profit: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            coin: position.coin.clone(),
            long_venue: position.long.venue,
            short_venue: position.short.venue,
            net_profit,
            long_entry_price: position.long.entry_price,
            short_entry_price: position.short.entry_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn venue_table_merges_per_venue_results() {
        let mut table = VenueTable::new();
        table.merge_venue(
            VenueId::Binance,
            HashMap::from([("BTC".to_string(), dec!(0.01)), ("ETH".to_string(), dec!(0.02))]),
        );
        table.merge_venue(VenueId::Okx, HashMap::from([("BTC".to_string(), dec!(-0.01))]));

        assert_eq!(table.len(), 2);
        assert_eq!(table.quotes("BTC").map(|q| q.len()), Some(2));
        assert_eq!(table.get("BTC", VenueId::Okx), Some(dec!(-0.01)));
        assert_eq!(table.get("ETH", VenueId::Okx), None);
    }

    #[test]
    fn unknown_venues_list_nothing() {
        let mut markets = MarketAvailability::new([VenueId::Binance]);
        markets.replace(VenueId::Binance, HashSet::from(["BTC".to_string()]));

        assert!(markets.is_listed(VenueId::Binance, "BTC"));
        assert!(!markets.is_listed(VenueId::Binance, "ETH"));
        assert!(!markets.is_listed(VenueId::Bybit, "BTC"));
        assert_eq!(markets.listed_count(VenueId::Bybit), 0);
    }

    #[test]
    fn opportunity_places_long_leg_on_high_funding_venue() {
        let opp = Opportunity {
            coin: "BTC".to_string(),
            ex_low: VenueId::Bybit,
            ex_high: VenueId::Okx,
            fr_low: dec!(-0.02),
            fr_high: dec!(0.03),
            net_profit: dec!(10),
            price_low: dec!(100),
            price_high: dec!(101),
        };

        assert_eq!(opp.long_venue(), VenueId::Okx);
        assert_eq!(opp.long_price(), dec!(101));
        assert_eq!(opp.short_venue(), VenueId::Bybit);
        assert_eq!(opp.short_price(), dec!(100));
    }
}
