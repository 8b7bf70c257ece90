//! Raw payloads of the public market-data endpoints.
//!
//! Venues report numbers as strings; they are kept that way here and parsed into
//! `Decimal` by the adapters so a single malformed entry can be skipped.

use serde::Deserialize;

/// Error body shared by Binance, OKX and Bitget on non-2xx responses.
/// `code` is numeric on Binance and a string elsewhere.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub code: serde_json::Value,
    pub msg: String,
}

// --- Binance USDⓈ-M futures ---

#[derive(Debug, Deserialize)]
pub struct BinanceExchangeInfo {
    pub symbols: Vec<BinanceSymbol>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceSymbol {
    pub symbol: String,
    pub contract_type: String,
    pub status: String,
    pub base_asset: String,
    pub quote_asset: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinancePremiumIndex {
    pub symbol: String,
    pub mark_price: String,
    #[serde(default)]
    pub last_funding_rate: String,
}

#[derive(Debug, Deserialize)]
pub struct BinanceTickerPrice {
    pub symbol: String,
    pub price: String,
}

// --- Bybit v5 ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BybitEnvelope<T> {
    pub ret_code: i64,
    #[serde(default)]
    pub ret_msg: String,
    pub result: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BybitList<T> {
    #[serde(default = "Vec::new")]
    pub list: Vec<T>,
    #[serde(default)]
    pub next_page_cursor: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BybitInstrument {
    pub symbol: String,
    pub contract_type: String,
    pub status: String,
    pub base_coin: String,
    pub quote_coin: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BybitTicker {
    pub symbol: String,
    #[serde(default)]
    pub last_price: String,
    #[serde(default)]
    pub funding_rate: String,
}

// --- OKX v5 ---

#[derive(Debug, Deserialize)]
pub struct OkxEnvelope<T> {
    pub code: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OkxInstrument {
    pub inst_id: String,
    pub state: String,
    #[serde(default)]
    pub settle_ccy: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OkxFundingRate {
    pub inst_id: String,
    #[serde(default)]
    pub funding_rate: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OkxTicker {
    pub inst_id: String,
    #[serde(default)]
    pub last: String,
}

// --- Bitget v2 mix ---

#[derive(Debug, Deserialize)]
pub struct BitgetEnvelope<T> {
    pub code: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitgetContract {
    pub symbol: String,
    pub base_coin: String,
    pub quote_coin: String,
    pub symbol_status: String,
    #[serde(default)]
    pub symbol_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitgetTicker {
    pub symbol: String,
    #[serde(default)]
    pub last_pr: String,
    #[serde(default)]
    pub funding_rate: String,
}
