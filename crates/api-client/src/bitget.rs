use crate::error::ApiError;
use crate::responses::{BitgetContract, BitgetEnvelope, BitgetTicker};
use crate::{RestClient, VenueAdapter, collect_quotes, usdt_base};
use async_trait::async_trait;
use core_types::VenueId;
use reqwest::header::HeaderMap;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

const BASE_URL: &str = "https://api.bitget.com";
const PRODUCT_TYPE: (&str, &str) = ("productType", "USDT-FUTURES");

/// Public market data of Bitget USDT-M futures.
#[derive(Clone)]
pub struct BitgetClient {
    rest: RestClient,
}

impl BitgetClient {
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        Ok(Self {
            rest: RestClient::new(VenueId::Bitget, BASE_URL, timeout, HeaderMap::new())?,
        })
    }

    async fn tickers(&self) -> Result<Vec<BitgetTicker>, ApiError> {
        let envelope: BitgetEnvelope<BitgetTicker> = self
            .rest
            .get("/api/v2/mix/market/tickers", &[PRODUCT_TYPE])
            .await?;
        unwrap_envelope(envelope)
    }
}

#[async_trait]
impl VenueAdapter for BitgetClient {
    fn id(&self) -> VenueId {
        VenueId::Bitget
    }

    async fn list_swap_markets(&self) -> Result<HashSet<String>, ApiError> {
        let envelope: BitgetEnvelope<BitgetContract> = self
            .rest
            .get("/api/v2/mix/market/contracts", &[PRODUCT_TYPE])
            .await?;
        Ok(parse_markets(&unwrap_envelope(envelope)?))
    }

    async fn fetch_funding_rates(&self) -> Result<HashMap<String, Decimal>, ApiError> {
        Ok(parse_funding_rates(&self.tickers().await?))
    }

    async fn fetch_mark_prices(&self) -> Result<HashMap<String, Decimal>, ApiError> {
        Ok(parse_prices(&self.tickers().await?))
    }
}

pub(crate) fn unwrap_envelope<T>(envelope: BitgetEnvelope<T>) -> Result<Vec<T>, ApiError> {
    if envelope.code != "00000" {
        return Err(ApiError::Venue {
            venue: VenueId::Bitget,
            code: envelope.code,
            msg: envelope.msg,
        });
    }
    Ok(envelope.data)
}

pub(crate) fn parse_markets(contracts: &[BitgetContract]) -> HashSet<String> {
    contracts
        .iter()
        .filter(|c| c.symbol_status == "normal" && c.quote_coin == "USDT")
        .filter(|c| c.symbol_type.is_empty() || c.symbol_type == "perpetual")
        .map(|c| c.base_coin.clone())
        .collect()
}

pub(crate) fn parse_funding_rates(tickers: &[BitgetTicker]) -> HashMap<String, Decimal> {
    collect_quotes(
        tickers
            .iter()
            .map(|t| (t.symbol.as_str(), t.funding_rate.as_str())),
        usdt_base,
    )
}

pub(crate) fn parse_prices(tickers: &[BitgetTicker]) -> HashMap<String, Decimal> {
    collect_quotes(
        tickers.iter().map(|t| (t.symbol.as_str(), t.last_pr.as_str())),
        usdt_base,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn normal_perpetual_contracts_are_listed() {
        let envelope: BitgetEnvelope<BitgetContract> = serde_json::from_str(
            r#"{"code":"00000","msg":"success","requestTime":1700000000000,"data":[
                {"symbol":"BTCUSDT","baseCoin":"BTC","quoteCoin":"USDT","symbolStatus":"normal","symbolType":"perpetual"},
                {"symbol":"ETHUSDT","baseCoin":"ETH","quoteCoin":"USDT","symbolStatus":"maintain","symbolType":"perpetual"},
                {"symbol":"BTCUSDT0628","baseCoin":"BTC","quoteCoin":"USDT","symbolStatus":"normal","symbolType":"delivery"},
                {"symbol":"ARBUSDT","baseCoin":"ARB","quoteCoin":"USDT","symbolStatus":"normal","symbolType":"perpetual"}
            ]}"#,
        )
        .unwrap();

        let markets = parse_markets(&unwrap_envelope(envelope).unwrap());
        assert_eq!(
            markets,
            HashSet::from(["BTC".to_string(), "ARB".to_string()])
        );
    }

    #[test]
    fn tickers_yield_rates_and_prices() {
        let envelope: BitgetEnvelope<BitgetTicker> = serde_json::from_str(
            r#"{"code":"00000","msg":"success","data":[
                {"symbol":"BTCUSDT","lastPr":"63990.1","fundingRate":"0.000125"},
                {"symbol":"ETHUSDT","lastPr":"3099.8","fundingRate":"-0.00003"}
            ]}"#,
        )
        .unwrap();
        let tickers = unwrap_envelope(envelope).unwrap();

        let rates = parse_funding_rates(&tickers);
        let prices = parse_prices(&tickers);

        assert_eq!(rates["BTC"], dec!(0.000125));
        assert_eq!(rates["ETH"], dec!(-0.00003));
        assert_eq!(prices["ETH"], dec!(3099.8));
    }

    #[test]
    fn non_success_code_is_an_error() {
        let envelope: BitgetEnvelope<BitgetTicker> =
            serde_json::from_str(r#"{"code":"40034","msg":"Parameter does not exist"}"#).unwrap();

        assert!(matches!(
            unwrap_envelope(envelope),
            Err(ApiError::Venue { venue: VenueId::Bitget, .. })
        ));
    }
}
