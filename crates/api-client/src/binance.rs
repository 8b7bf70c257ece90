use crate::error::ApiError;
use crate::responses::{BinanceExchangeInfo, BinancePremiumIndex, BinanceTickerPrice};
use crate::{RestClient, VenueAdapter, collect_quotes, usdt_base};
use async_trait::async_trait;
use core_types::VenueId;
use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

const BASE_URL: &str = "https://fapi.binance.com";

/// Public market data of Binance USDⓈ-M futures.
#[derive(Clone)]
pub struct BinanceClient {
    rest: RestClient,
}

impl BinanceClient {
    /// The API key is optional for public endpoints; when present it is sent as
    /// `X-MBX-APIKEY` so requests count against the account's own rate limit.
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        if !api_key.is_empty() {
            let value = HeaderValue::from_str(api_key)
                .map_err(|e| ApiError::Configuration(format!("invalid Binance API key: {}", e)))?;
            headers.insert("X-MBX-APIKEY", value);
        }
        Ok(Self {
            rest: RestClient::new(VenueId::Binance, BASE_URL, timeout, headers)?,
        })
    }
}

#[async_trait]
impl VenueAdapter for BinanceClient {
    fn id(&self) -> VenueId {
        VenueId::Binance
    }

    async fn list_swap_markets(&self) -> Result<HashSet<String>, ApiError> {
        let info: BinanceExchangeInfo = self.rest.get("/fapi/v1/exchangeInfo", &[]).await?;
        Ok(parse_markets(info))
    }

    async fn fetch_funding_rates(&self) -> Result<HashMap<String, Decimal>, ApiError> {
        let index: Vec<BinancePremiumIndex> = self.rest.get("/fapi/v1/premiumIndex", &[]).await?;
        Ok(parse_funding_rates(&index))
    }

    async fn fetch_mark_prices(&self) -> Result<HashMap<String, Decimal>, ApiError> {
        let tickers: Vec<BinanceTickerPrice> = self.rest.get("/fapi/v1/ticker/price", &[]).await?;
        Ok(parse_prices(&tickers))
    }
}

pub(crate) fn parse_markets(info: BinanceExchangeInfo) -> HashSet<String> {
    info.symbols
        .into_iter()
        .filter(|s| s.contract_type == "PERPETUAL" && s.quote_asset == "USDT" && s.status == "TRADING")
        .map(|s| s.base_asset)
        .collect()
}

pub(crate) fn parse_funding_rates(index: &[BinancePremiumIndex]) -> HashMap<String, Decimal> {
    collect_quotes(
        index
            .iter()
            .map(|entry| (entry.symbol.as_str(), entry.last_funding_rate.as_str())),
        usdt_base,
    )
}

pub(crate) fn parse_prices(tickers: &[BinanceTickerPrice]) -> HashMap<String, Decimal> {
    collect_quotes(
        tickers
            .iter()
            .map(|ticker| (ticker.symbol.as_str(), ticker.price.as_str())),
        usdt_base,
    )
}
