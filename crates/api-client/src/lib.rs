use crate::error::ApiError;
use crate::responses::ErrorBody;
use async_trait::async_trait;
use configuration::Config;
use core_types::VenueId;
use reqwest::header::HeaderMap;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub mod binance;
pub mod bitget;
pub mod bybit;
pub mod error;
pub mod okx;
pub mod responses;

// --- Public API ---
pub use binance::BinanceClient;
pub use bitget::BitgetClient;
pub use bybit::BybitClient;
pub use okx::OkxClient;

/// The read-only market-data interface of one derivatives venue.
///
/// Every map returned is keyed by base coin ("BTC", "ETH", ...) of the venue's
/// USDT-settled perpetual contracts. Entries the venue reports in an unusable
/// shape are dropped rather than failing the whole call.
#[async_trait]
pub trait VenueAdapter: Send + Sync {
    fn id(&self) -> VenueId;

    /// Coins that currently have an active USDT perpetual swap on this venue.
    async fn list_swap_markets(&self) -> Result<HashSet<String>, ApiError>;

    /// Latest funding rate per coin, as a fraction (0.0001 = 0.01%).
    async fn fetch_funding_rates(&self) -> Result<HashMap<String, Decimal>, ApiError>;

    /// Latest traded or mark price per coin.
    async fn fetch_mark_prices(&self) -> Result<HashMap<String, Decimal>, ApiError>;
}

/// The set of venues the simulator polls, in `VenueId` order.
#[derive(Clone)]
pub struct VenueRegistry {
    adapters: Vec<Arc<dyn VenueAdapter>>,
}

impl VenueRegistry {
    pub fn new(mut adapters: Vec<Arc<dyn VenueAdapter>>) -> Self {
        adapters.sort_by_key(|adapter| adapter.id());
        Self { adapters }
    }

    /// Builds one live adapter per configured venue.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let timeout = config.simulation.request_timeout();
        let terms = config
            .venue_terms()
            .map_err(|e| ApiError::Configuration(e.to_string()))?;

        let mut adapters: Vec<Arc<dyn VenueAdapter>> = Vec::with_capacity(terms.len());
        for venue in terms.keys() {
            let api_key = config
                .venue(*venue)
                .map(|v| v.api_key.as_str())
                .unwrap_or_default();
            let adapter: Arc<dyn VenueAdapter> = match venue {
                VenueId::Binance => Arc::new(BinanceClient::new(api_key, timeout)?),
                VenueId::Bybit => Arc::new(BybitClient::new(timeout)?),
                VenueId::Okx => Arc::new(OkxClient::new(timeout)?),
                VenueId::Bitget => Arc::new(BitgetClient::new(timeout)?),
            };
            adapters.push(adapter);
        }
        Ok(Self::new(adapters))
    }

    pub fn adapters(&self) -> &[Arc<dyn VenueAdapter>] {
        &self.adapters
    }

    pub fn ids(&self) -> Vec<VenueId> {
        self.adapters.iter().map(|adapter| adapter.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

/// Thin JSON-over-HTTP client shared by the venue adapters.
#[derive(Clone)]
pub(crate) struct RestClient {
    client: reqwest::Client,
    base_url: String,
    venue: VenueId,
}

impl RestClient {
    pub(crate) fn new(
        venue: VenueId,
        base_url: &str,
        timeout: Duration,
        headers: HeaderMap,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            venue,
        })
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return serde_json::from_str::<T>(&text).map_err(|e| {
                ApiError::Deserialization(format!("{} {}: {}", self.venue, path, e))
            });
        }

        match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => Err(ApiError::Venue {
                venue: self.venue,
                code: code_to_string(&body.code),
                msg: body.msg,
            }),
            Err(_) => Err(ApiError::HttpStatus {
                venue: self.venue,
                status: status.as_u16(),
                body: truncate(&text, 200),
            }),
        }
    }
}

fn code_to_string(code: &serde_json::Value) -> String {
    match code {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Parses a venue numeric string. Empty strings and garbage yield `None`.
pub(crate) fn parse_decimal(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// Collects `(symbol, value)` pairs into a coin-keyed map, keeping only symbols
/// `to_coin` recognises and values that parse.
pub(crate) fn collect_quotes<'a, I, F>(entries: I, to_coin: F) -> HashMap<String, Decimal>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
    F: Fn(&str) -> Option<&str>,
{
    entries
        .into_iter()
        .filter_map(|(symbol, value)| {
            let coin = to_coin(symbol)?;
            let value = parse_decimal(value)?;
            Some((coin.to_string(), value))
        })
        .collect()
}

/// Strips the `USDT` quote suffix used by Binance, Bybit and Bitget linear symbols.
pub(crate) fn usdt_base(symbol: &str) -> Option<&str> {
    symbol.strip_suffix("USDT").filter(|base| !base.is_empty())
}
