use crate::error::ApiError;
use crate::responses::{OkxEnvelope, OkxFundingRate, OkxInstrument, OkxTicker};
use crate::{RestClient, VenueAdapter, collect_quotes};
use async_trait::async_trait;
use core_types::VenueId;
use reqwest::header::HeaderMap;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

const BASE_URL: &str = "https://www.okx.com";

/// Public market data of OKX USDT-margined perpetual swaps.
#[derive(Clone)]
pub struct OkxClient {
    rest: RestClient,
}

impl OkxClient {
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        Ok(Self {
            rest: RestClient::new(VenueId::Okx, BASE_URL, timeout, HeaderMap::new())?,
        })
    }

    async fn data<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, ApiError> {
        let envelope: OkxEnvelope<T> = self.rest.get(path, query).await?;
        unwrap_envelope(envelope)
    }
}

#[async_trait]
impl VenueAdapter for OkxClient {
    fn id(&self) -> VenueId {
        VenueId::Okx
    }

    async fn list_swap_markets(&self) -> Result<HashSet<String>, ApiError> {
        let instruments: Vec<OkxInstrument> = self
            .data("/api/v5/public/instruments", &[("instType", "SWAP")])
            .await?;
        Ok(parse_markets(&instruments))
    }

    async fn fetch_funding_rates(&self) -> Result<HashMap<String, Decimal>, ApiError> {
        let rates: Vec<OkxFundingRate> = self
            .data("/api/v5/public/funding-rate", &[("instId", "ANY")])
            .await?;
        Ok(parse_funding_rates(&rates))
    }

    async fn fetch_mark_prices(&self) -> Result<HashMap<String, Decimal>, ApiError> {
        let tickers: Vec<OkxTicker> = self
            .data("/api/v5/market/tickers", &[("instType", "SWAP")])
            .await?;
        Ok(parse_prices(&tickers))
    }
}

/// `"0"` is success; anything else carries the reason in `msg`.
pub(crate) fn unwrap_envelope<T>(envelope: OkxEnvelope<T>) -> Result<Vec<T>, ApiError> {
    if envelope.code != "0" {
        return Err(ApiError::Venue {
            venue: VenueId::Okx,
            code: envelope.code,
            msg: envelope.msg,
        });
    }
    Ok(envelope.data)
}

/// `BTC-USDT-SWAP` -> `BTC`.
fn swap_base(inst_id: &str) -> Option<&str> {
    inst_id
        .strip_suffix("-USDT-SWAP")
        .filter(|base| !base.is_empty())
}

pub(crate) fn parse_markets(instruments: &[OkxInstrument]) -> HashSet<String> {
    instruments
        .iter()
        .filter(|i| i.state == "live" && i.settle_ccy == "USDT")
        .filter_map(|i| swap_base(&i.inst_id))
        .map(str::to_string)
        .collect()
}

pub(crate) fn parse_funding_rates(rates: &[OkxFundingRate]) -> HashMap<String, Decimal> {
    collect_quotes(
        rates
            .iter()
            .map(|r| (r.inst_id.as_str(), r.funding_rate.as_str())),
        swap_base,
    )
}

pub(crate) fn parse_prices(tickers: &[OkxTicker]) -> HashMap<String, Decimal> {
    collect_quotes(
        tickers.iter().map(|t| (t.inst_id.as_str(), t.last.as_str())),
        swap_base,
    )
}
