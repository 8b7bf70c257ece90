use crate::economics::{ProfitInputs, expected_net_profit};
use crate::error::StrategyError;
use core_types::{
    FundingRateSnapshot, MarkPriceSnapshot, MarketAvailability, Opportunity, VenueId, VenueTerms,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use tracing::debug;

/// Sizing parameters shared by every opportunity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FundingRateArbParams {
    /// Margin committed per leg.
    pub open_margin: Decimal,
    /// Assumed slippage per leg, as a fraction of notional.
    pub slippage_pct: Decimal,
}

/// The Funding Rate Arbitrage scanner.
///
/// For each coin it pairs the venue paying the lowest funding rate with the venue
/// paying the highest, prices the pair with the profit model and returns the single
/// most profitable coin of the snapshot.
#[derive(Debug, Clone)]
pub struct FundingRateArb {
    params: FundingRateArbParams,
    venues: BTreeMap<VenueId, VenueTerms>,
}

/// Nothing scoring at or below this is ever returned.
const INITIAL_BEST: Decimal = dec!(-1);

impl FundingRateArb {
    /// Creates a new `FundingRateArb` instance.
    pub fn new(
        params: FundingRateArbParams,
        venues: BTreeMap<VenueId, VenueTerms>,
    ) -> Result<Self, StrategyError> {
        if params.open_margin <= Decimal::ZERO {
            return Err(StrategyError::InvalidParameters(
                "open margin must be positive".to_string(),
            ));
        }
        if venues.len() < 2 {
            return Err(StrategyError::InvalidParameters(
                "at least two venues are required".to_string(),
            ));
        }
        Ok(Self { params, venues })
    }

    pub fn params(&self) -> &FundingRateArbParams {
        &self.params
    }

    /// Finds the coin with the greatest expected net profit.
    ///
    /// Coins for which `is_held` returns true are skipped. Ties keep the coin that
    /// sorts first.
    pub fn scan<F>(
        &self,
        rates: &FundingRateSnapshot,
        prices: &MarkPriceSnapshot,
        markets: &MarketAvailability,
        is_held: F,
    ) -> Option<Opportunity>
    where
        F: Fn(&str) -> bool,
    {
        let mut best: Option<Opportunity> = None;
        let mut best_net = INITIAL_BEST;

        for (coin, quotes) in rates.iter() {
            if is_held(coin) {
                continue;
            }

            let mut ranked: Vec<(VenueId, Decimal)> = quotes
                .iter()
                .filter(|(venue, _)| self.venues.contains_key(venue))
                .map(|(venue, rate)| (*venue, *rate))
                .collect();
            let priced = prices.quotes(coin).map_or(0, |p| p.len());
            if ranked.len() < 2 || priced < 2 {
                continue;
            }

            // Stable: equal rates keep venue order.
            ranked.sort_by(|a, b| a.1.cmp(&b.1));
            let (ex_low, fr_low) = ranked[0];
            let (ex_high, fr_high) = ranked[ranked.len() - 1];

            if !markets.is_listed(ex_low, coin) || !markets.is_listed(ex_high, coin) {
                debug!(%coin, %ex_low, %ex_high, "Skipping coin not listed on both venues.");
                continue;
            }

            let (Some(price_low), Some(price_high)) =
                (prices.get(coin, ex_low), prices.get(coin, ex_high))
            else {
                continue;
            };
            if price_high <= Decimal::ZERO {
                continue;
            }

            let Some(terms) = self.venues.get(&ex_high) else {
                continue;
            };
            let inputs = ProfitInputs {
                margin: self.params.open_margin,
                leverage: terms.leverage,
                fr_high,
                fr_low,
                fee_pct: terms.fee_pct,
                slippage_pct: self.params.slippage_pct,
                price_high,
                price_low,
            };
            let net_profit = match expected_net_profit(&inputs) {
                Ok(net) => net,
                Err(e) => {
                    debug!(%coin, error = %e, "Skipping coin with unusable prices.");
                    continue;
                }
            };

            if net_profit > best_net {
                best_net = net_profit;
                best = Some(Opportunity {
                    coin: coin.clone(),
                    ex_low,
                    ex_high,
                    fr_low,
                    fr_high,
                    net_profit,
                    price_low,
                    price_high,
                });
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn terms() -> VenueTerms {
        VenueTerms {
            leverage: dec!(5),
            fee_pct: dec!(0.0006),
        }
    }

    fn scanner() -> FundingRateArb {
        let venues = VenueId::ALL.iter().map(|v| (*v, terms())).collect();
        FundingRateArb::new(
            FundingRateArbParams {
                open_margin: dec!(250),
                slippage_pct: dec!(0.001),
            },
            venues,
        )
        .unwrap()
    }

    fn listed_everywhere(coins: &[&str]) -> MarketAvailability {
        let mut markets = MarketAvailability::new(VenueId::ALL);
        let set: HashSet<String> = coins.iter().map(|c| c.to_string()).collect();
        for venue in VenueId::ALL {
            markets.replace(venue, set.clone());
        }
        markets
    }

    fn flat_prices(coins: &[&str], venues: &[VenueId]) -> MarkPriceSnapshot {
        let mut prices = MarkPriceSnapshot::new();
        for coin in coins {
            for venue in venues {
                prices.insert(*coin, *venue, dec!(100));
            }
        }
        prices
    }

    #[test]
    fn picks_lowest_and_highest_funding_venues() {
        let mut rates = FundingRateSnapshot::new();
        rates.insert("BTC", VenueId::Binance, dec!(0.01));
        rates.insert("BTC", VenueId::Bybit, dec!(-0.02));
        rates.insert("BTC", VenueId::Okx, dec!(0.03));
        let prices = flat_prices(&["BTC"], &[VenueId::Binance, VenueId::Bybit, VenueId::Okx]);

        let opp = scanner()
            .scan(&rates, &prices, &listed_everywhere(&["BTC"]), |_| false)
            .unwrap();

        assert_eq!(opp.ex_low, VenueId::Bybit);
        assert_eq!(opp.fr_low, dec!(-0.02));
        assert_eq!(opp.ex_high, VenueId::Okx);
        assert_eq!(opp.fr_high, dec!(0.03));
        assert_eq!(opp.long_venue(), VenueId::Okx);
        assert_eq!(opp.short_venue(), VenueId::Bybit);
        // 37.5 - 25 - 1.5 - 2.5 - 0
        assert_eq!(opp.net_profit, dec!(8.5));
    }

    #[test]
    fn selects_the_most_profitable_coin() {
        let mut rates = FundingRateSnapshot::new();
        rates.insert("ETH", VenueId::Binance, dec!(0.001));
        rates.insert("ETH", VenueId::Okx, dec!(0.01));
        rates.insert("SOL", VenueId::Binance, dec!(0.001));
        rates.insert("SOL", VenueId::Okx, dec!(0.02));
        let prices = flat_prices(&["ETH", "SOL"], &[VenueId::Binance, VenueId::Okx]);

        let opp = scanner()
            .scan(&rates, &prices, &listed_everywhere(&["ETH", "SOL"]), |_| false)
            .unwrap();

        assert_eq!(opp.coin, "SOL");
    }

    #[test]
    fn ties_keep_the_first_coin() {
        let mut rates = FundingRateSnapshot::new();
        for coin in ["XRP", "ADA"] {
            rates.insert(coin, VenueId::Bybit, dec!(0.0));
            rates.insert(coin, VenueId::Bitget, dec!(0.02));
        }
        let prices = flat_prices(&["XRP", "ADA"], &[VenueId::Bybit, VenueId::Bitget]);

        let opp = scanner()
            .scan(&rates, &prices, &listed_everywhere(&["XRP", "ADA"]), |_| false)
            .unwrap();

        assert_eq!(opp.coin, "ADA");
    }

    #[test]
    fn equal_rates_keep_venue_order() {
        let venues = [VenueId::Binance, VenueId::Bybit, VenueId::Okx];
        let prices = flat_prices(&["BTC"], &venues);
        let markets = listed_everywhere(&["BTC"]);

        // Tie on the low side: the first venue in order takes it.
        let mut rates = FundingRateSnapshot::new();
        rates.insert("BTC", VenueId::Binance, dec!(0.0));
        rates.insert("BTC", VenueId::Bybit, dec!(0.0));
        rates.insert("BTC", VenueId::Okx, dec!(0.03));

        let opp = scanner().scan(&rates, &prices, &markets, |_| false).unwrap();

        assert_eq!(opp.ex_low, VenueId::Binance);
        assert_eq!(opp.ex_high, VenueId::Okx);
        // 37.5 - 0 - 1.5 - 2.5 - 0
        assert_eq!(opp.net_profit, dec!(33.5));

        // Tie on the high side: the last venue in order takes it.
        let mut rates = FundingRateSnapshot::new();
        rates.insert("BTC", VenueId::Binance, dec!(0.0));
        rates.insert("BTC", VenueId::Bybit, dec!(0.03));
        rates.insert("BTC", VenueId::Okx, dec!(0.03));

        let opp = scanner().scan(&rates, &prices, &markets, |_| false).unwrap();

        assert_eq!(opp.ex_low, VenueId::Binance);
        assert_eq!(opp.ex_high, VenueId::Okx);
    }

    #[test]
    fn identical_rates_are_not_an_opportunity() {
        let mut rates = FundingRateSnapshot::new();
        for venue in [VenueId::Binance, VenueId::Bybit, VenueId::Okx] {
            rates.insert("BTC", venue, dec!(0.01));
        }
        let prices = flat_prices(&["BTC"], &[VenueId::Binance, VenueId::Bybit, VenueId::Okx]);

        // Funding nets to zero, leaving -4 of fees and slippage: below the -1 floor.
        let opp = scanner().scan(&rates, &prices, &listed_everywhere(&["BTC"]), |_| false);

        assert!(opp.is_none());
    }

    #[test]
    fn held_and_single_venue_coins_are_skipped() {
        let mut rates = FundingRateSnapshot::new();
        rates.insert("BTC", VenueId::Binance, dec!(0.0));
        rates.insert("BTC", VenueId::Okx, dec!(0.03));
        rates.insert("ETH", VenueId::Binance, dec!(0.05));
        let prices = flat_prices(&["BTC", "ETH"], &[VenueId::Binance, VenueId::Okx]);

        let found = scanner().scan(
            &rates,
            &prices,
            &listed_everywhere(&["BTC", "ETH"]),
            |coin| coin == "BTC",
        );

        assert!(found.is_none());
    }

    #[test]
    fn unlisted_or_unpriced_coins_are_skipped() {
        let mut rates = FundingRateSnapshot::new();
        rates.insert("BTC", VenueId::Binance, dec!(0.0));
        rates.insert("BTC", VenueId::Okx, dec!(0.03));
        rates.insert("ETH", VenueId::Binance, dec!(0.0));
        rates.insert("ETH", VenueId::Okx, dec!(0.03));

        // ETH lacks a price on Okx, BTC is not listed on Okx.
        let mut prices = flat_prices(&["BTC"], &[VenueId::Binance, VenueId::Okx]);
        prices.insert("ETH", VenueId::Binance, dec!(100));
        prices.insert("ETH", VenueId::Bybit, dec!(100));
        let mut markets = listed_everywhere(&["BTC", "ETH"]);
        markets.replace(VenueId::Okx, HashSet::from(["ETH".to_string()]));

        assert!(scanner().scan(&rates, &prices, &markets, |_| false).is_none());
    }

    #[test]
    fn deeply_negative_profit_is_never_a_candidate() {
        let mut rates = FundingRateSnapshot::new();
        rates.insert("BTC", VenueId::Binance, dec!(0.0));
        rates.insert("BTC", VenueId::Okx, dec!(0.0));
        let mut prices = MarkPriceSnapshot::new();
        prices.insert("BTC", VenueId::Binance, dec!(100));
        prices.insert("BTC", VenueId::Okx, dec!(200));

        assert!(
            scanner()
                .scan(&rates, &prices, &listed_everywhere(&["BTC"]), |_| false)
                .is_none()
        );
    }

    #[test]
    fn zero_price_is_skipped() {
        let mut rates = FundingRateSnapshot::new();
        rates.insert("BTC", VenueId::Binance, dec!(0.0));
        rates.insert("BTC", VenueId::Okx, dec!(0.03));
        let mut prices = MarkPriceSnapshot::new();
        prices.insert("BTC", VenueId::Binance, Decimal::ZERO);
        prices.insert("BTC", VenueId::Okx, dec!(100));

        assert!(
            scanner()
                .scan(&rates, &prices, &listed_everywhere(&["BTC"]), |_| false)
                .is_none()
        );
    }

    #[test]
    fn fewer_than_two_venues_is_invalid() {
        let venues = BTreeMap::from([(VenueId::Binance, terms())]);
        let params = FundingRateArbParams {
            open_margin: dec!(250),
            slippage_pct: dec!(0.001),
        };
        assert!(FundingRateArb::new(params, venues).is_err());
    }
}
