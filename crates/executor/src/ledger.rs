use crate::error::LedgerError;
use chrono::Utc;
use core_types::{Leg, LegSide, MarketAvailability, Opportunity, Position, TradeRecord, VenueId};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, info};
use uuid::Uuid;

/// Thresholds a new position must clear.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenGates {
    /// Both venues must hold at least this much.
    pub min_balance: Decimal,
    pub min_net_profit: Decimal,
}

/// A fully specified request to open a hedged pair.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenRequest {
    pub coin: String,
    pub long_venue: VenueId,
    pub short_venue: VenueId,
    pub long_price: Decimal,
    pub short_price: Decimal,
    /// Margin committed to each leg.
    pub margin: Decimal,
    pub net_profit: Decimal,
}

impl OpenRequest {
    pub fn from_opportunity(opportunity: &Opportunity, margin: Decimal) -> Self {
        Self {
            coin: opportunity.coin.clone(),
            long_venue: opportunity.long_venue(),
            short_venue: opportunity.short_venue(),
            long_price: opportunity.long_price(),
            short_price: opportunity.short_price(),
            margin,
            net_profit: opportunity.net_profit,
        }
    }
}

/// The simulated account: per-venue balances plus the open positions.
///
/// Opening never debits margin; balances only move when a position settles.
#[derive(Debug, Clone)]
pub struct PositionLedger {
    balances: BTreeMap<VenueId, Decimal>,
    positions: BTreeMap<String, Position>,
    gates: OpenGates,
}

impl PositionLedger {
    /// Every venue starts with the same balance.
    pub fn new(
        venues: impl IntoIterator<Item = VenueId>,
        start_balance: Decimal,
        gates: OpenGates,
    ) -> Self {
        Self {
            balances: venues.into_iter().map(|v| (v, start_balance)).collect(),
            positions: BTreeMap::new(),
            gates,
        }
    }

    /// Opens a position if every gate passes.
    ///
    /// Gates are checked in order: no open position for the coin, enough expected
    /// profit, then both venues' balances. The first failure is returned.
    pub fn open(&mut self, request: OpenRequest) -> Result<Position, LedgerError> {
        if self.positions.contains_key(&request.coin) {
            return Err(LedgerError::PositionExists(request.coin));
        }
        if request.net_profit < self.gates.min_net_profit {
            return Err(LedgerError::NetProfitBelowThreshold {
                coin: request.coin,
                net_profit: request.net_profit,
                min: self.gates.min_net_profit,
            });
        }
        for venue in [request.long_venue, request.short_venue] {
            let balance = self.balance(venue).ok_or(LedgerError::UnknownVenue(venue))?;
            if balance < self.gates.min_balance {
                return Err(LedgerError::InsufficientBalance {
                    venue,
                    balance,
                    min: self.gates.min_balance,
                });
            }
        }

        let position = Position {
            position_id: Uuid::new_v4(),
            coin: request.coin.clone(),
            long: Leg {
                venue: request.long_venue,
                side: LegSide::Long,
                margin: request.margin,
                entry_price: request.long_price,
            },
            short: Leg {
                venue: request.short_venue,
                side: LegSide::Short,
                margin: request.margin,
                entry_price: request.short_price,
            },
            expected_net_profit: request.net_profit,
            opened_at: Utc::now(),
        };

        info!(
            coin = %position.coin,
            long = %position.long.venue,
            short = %position.short.venue,
            long_price = %position.long.entry_price,
            short_price = %position.short.entry_price,
            expected = %position.expected_net_profit,
            "Opened simulated position."
        );
        self.positions.insert(request.coin, position.clone());
        Ok(position)
    }

    /// Closes the position on `coin`, splitting `net_profit` evenly between the two
    /// venues, and returns the record of the trade.
    pub fn settle(&mut self, coin: &str, net_profit: Decimal) -> Result<TradeRecord, LedgerError> {
        let position = self
            .positions
            .remove(coin)
            .ok_or_else(|| LedgerError::PositionNotFound(coin.to_string()))?;

        let share = net_profit / Decimal::TWO;
        for leg in position.legs() {
            // Legs were validated against the balance table on open.
            if let Some(balance) = self.balances.get_mut(&leg.venue) {
                *balance += share;
            }
        }

        info!(%coin, %net_profit, "Settled simulated position.");
        Ok(TradeRecord::from_position(&position, net_profit, Utc::now()))
    }

    /// Drops every position whose coin is no longer listed on one of its venues.
    /// No balance changes and no trade record.
    pub fn cleanup(&mut self, markets: &MarketAvailability) -> Vec<Position> {
        let delisted: Vec<String> = self
            .positions
            .values()
            .filter(|p| {
                !markets.is_listed(p.long.venue, &p.coin) || !markets.is_listed(p.short.venue, &p.coin)
            })
            .map(|p| p.coin.clone())
            .collect();

        delisted
            .iter()
            .filter_map(|coin| self.positions.remove(coin))
            .inspect(|p| debug!(coin = %p.coin, position_id = %p.position_id, "Removed delisted position."))
            .collect()
    }

    pub fn balance(&self, venue: VenueId) -> Option<Decimal> {
        self.balances.get(&venue).copied()
    }

    pub fn balances(&self) -> &BTreeMap<VenueId, Decimal> {
        &self.balances
    }

    pub fn position(&self, coin: &str) -> Option<&Position> {
        self.positions.get(coin)
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn is_held(&self, coin: &str) -> bool {
        self.positions.contains_key(coin)
    }

    pub fn open_count(&self) -> usize {
        self.positions.len()
    }

    pub fn gates(&self) -> &OpenGates {
        &self.gates
    }
}
