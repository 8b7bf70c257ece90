use crate::error::ApiError;
use crate::responses::{BybitEnvelope, BybitInstrument, BybitList, BybitTicker};
use crate::{RestClient, VenueAdapter, collect_quotes, usdt_base};
use async_trait::async_trait;
use core_types::VenueId;
use reqwest::header::HeaderMap;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::debug;

const BASE_URL: &str = "https://api.bybit.com";
/// Upper bound on instrument pages, in case the cursor never empties.
const MAX_PAGES: usize = 20;

/// Public market data of Bybit linear (USDT) contracts.
#[derive(Clone)]
pub struct BybitClient {
    rest: RestClient,
}

impl BybitClient {
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        Ok(Self {
            rest: RestClient::new(VenueId::Bybit, BASE_URL, timeout, HeaderMap::new())?,
        })
    }

    async fn tickers(&self) -> Result<Vec<BybitTicker>, ApiError> {
        let envelope: BybitEnvelope<BybitList<BybitTicker>> = self
            .rest
            .get("/v5/market/tickers", &[("category", "linear")])
            .await?;
        Ok(unwrap_envelope(envelope)?.list)
    }
}

#[async_trait]
impl VenueAdapter for BybitClient {
    fn id(&self) -> VenueId {
        VenueId::Bybit
    }

    async fn list_swap_markets(&self) -> Result<HashSet<String>, ApiError> {
        let mut markets = HashSet::new();
        let mut cursor = String::new();

        for page in 0..MAX_PAGES {
            let mut query = vec![("category", "linear"), ("limit", "1000")];
            if !cursor.is_empty() {
                query.push(("cursor", cursor.as_str()));
            }
            let envelope: BybitEnvelope<BybitList<BybitInstrument>> =
                self.rest.get("/v5/market/instruments-info", &query).await?;
            let list = unwrap_envelope(envelope)?;

            markets.extend(parse_markets(&list.list));
            debug!(page, instruments = list.list.len(), "Fetched Bybit instruments page.");

            if list.next_page_cursor.is_empty() {
                break;
            }
            cursor = list.next_page_cursor;
        }
        Ok(markets)
    }

    async fn fetch_funding_rates(&self) -> Result<HashMap<String, Decimal>, ApiError> {
        Ok(parse_funding_rates(&self.tickers().await?))
    }

    async fn fetch_mark_prices(&self) -> Result<HashMap<String, Decimal>, ApiError> {
        Ok(parse_prices(&self.tickers().await?))
    }
}

/// Bybit answers HTTP 200 even on failure; the real status is `retCode`.
pub(crate) fn unwrap_envelope<T>(envelope: BybitEnvelope<T>) -> Result<T, ApiError> {
    if envelope.ret_code != 0 {
        return Err(ApiError::Venue {
            venue: VenueId::Bybit,
            code: envelope.ret_code.to_string(),
            msg: envelope.ret_msg,
        });
    }
    envelope
        .result
        .ok_or_else(|| ApiError::InvalidData("Bybit response has no result".to_string()))
}

pub(crate) fn parse_markets(instruments: &[BybitInstrument]) -> HashSet<String> {
    instruments
        .iter()
        .filter(|i| i.contract_type == "LinearPerpetual" && i.status == "Trading" && i.quote_coin == "USDT")
        .map(|i| i.base_coin.clone())
        .collect()
}

pub(crate) fn parse_funding_rates(tickers: &[BybitTicker]) -> HashMap<String, Decimal> {
    collect_quotes(
        tickers
            .iter()
            .map(|t| (t.symbol.as_str(), t.funding_rate.as_str())),
        usdt_base,
    )
}

pub(crate) fn parse_prices(tickers: &[BybitTicker]) -> HashMap<String, Decimal> {
    collect_quotes(
        tickers
            .iter()
            .map(|t| (t.symbol.as_str(), t.last_price.as_str())),
        usdt_base,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const TICKERS: &str = r#"{
        "retCode":0,"retMsg":"OK",
        "result":{"category":"linear","list":[
            {"symbol":"BTCUSDT","lastPrice":"64010.5","fundingRate":"0.0001"},
            {"symbol":"BTC-27DEC24","lastPrice":"65000","fundingRate":""},
            {"symbol":"BTCPERP","lastPrice":"64020","fundingRate":"0.0001"},
            {"symbol":"DOGEUSDT","lastPrice":"0.1234","fundingRate":"-0.00042"}
        ]}
    }"#;

    #[test]
    fn tickers_yield_rates_and_prices_for_usdt_perpetuals() {
        let envelope: BybitEnvelope<BybitList<BybitTicker>> = serde_json::from_str(TICKERS).unwrap();
        let tickers = unwrap_envelope(envelope).unwrap().list;

        let rates = parse_funding_rates(&tickers);
        let prices = parse_prices(&tickers);

        assert_eq!(rates.len(), 2);
        assert_eq!(rates["DOGE"], dec!(-0.00042));
        assert_eq!(prices["BTC"], dec!(64010.5));
        assert!(!prices.contains_key("BTC-27DEC24"));
    }

    #[test]
    fn nonzero_ret_code_is_an_error() {
        let envelope: BybitEnvelope<BybitList<BybitTicker>> =
            serde_json::from_str(r#"{"retCode":10001,"retMsg":"params error","result":{}}"#).unwrap();

        match unwrap_envelope(envelope) {
            Err(ApiError::Venue { venue, code, msg }) => {
                assert_eq!(venue, VenueId::Bybit);
                assert_eq!(code, "10001");
                assert_eq!(msg, "params error");
            }
            other => panic!("expected venue error, got {:?}", other.map(|l| l.list.len())),
        }
    }

    #[test]
    fn missing_result_is_an_error_even_with_ok_code() {
        let envelope: BybitEnvelope<BybitList<BybitTicker>> =
            serde_json::from_str(r#"{"retCode":0,"retMsg":"OK"}"#).unwrap();

        assert!(envelope.result.is_none());
        assert!(unwrap_envelope(envelope).is_err());
    }

    #[test]
    fn instruments_are_filtered_to_trading_linear_perpetuals() {
        let list: BybitList<BybitInstrument> = serde_json::from_str(
            r#"{"list":[
                {"symbol":"BTCUSDT","contractType":"LinearPerpetual","status":"Trading","baseCoin":"BTC","quoteCoin":"USDT"},
                {"symbol":"ETHPERP","contractType":"LinearPerpetual","status":"Trading","baseCoin":"ETH","quoteCoin":"USDC"},
                {"symbol":"XRPUSDT","contractType":"LinearPerpetual","status":"PreLaunch","baseCoin":"XRP","quoteCoin":"USDT"},
                {"symbol":"BTC-27DEC24","contractType":"LinearFutures","status":"Trading","baseCoin":"BTC","quoteCoin":"USDT"}
            ],"nextPageCursor":""}"#,
        )
        .unwrap();

        assert_eq!(parse_markets(&list.list), HashSet::from(["BTC".to_string()]));
        assert!(list.next_page_cursor.is_empty());
    }
}
