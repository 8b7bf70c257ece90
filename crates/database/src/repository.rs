use crate::connection::prepare_trade_log;
use crate::error::DbError;
use chrono::{NaiveDateTime, TimeZone, Utc};
use core_types::TradeRecord;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Durable, append-only storage for settled trades.
pub trait LedgerStore: Send + Sync {
    fn append(&self, record: &TradeRecord) -> Result<(), DbError>;
}

/// One line of the trade log, as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRow {
    pub timestamp: String,
    pub coin: String,
    pub ex_long: String,
    pub ex_short: String,
    pub net_profit: String,
    pub long_price: String,
    pub short_price: String,
}

impl From<&TradeRecord> for TradeRow {
    fn from(record: &TradeRecord) -> Self {
        Self {
            timestamp: record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            coin: record.coin.clone(),
            ex_long: record.long_venue.to_string(),
            ex_short: record.short_venue.to_string(),
            net_profit: record.net_profit.to_string(),
            long_price: record.long_entry_price.to_string(),
            short_price: record.short_entry_price.to_string(),
        }
    }
}

impl TryFrom<TradeRow> for TradeRecord {
    type Error = DbError;

    fn try_from(row: TradeRow) -> Result<Self, Self::Error> {
        let naive = NaiveDateTime::parse_from_str(&row.timestamp, TIMESTAMP_FORMAT)
            .map_err(|e| DbError::InvalidRow(format!("timestamp '{}': {}", row.timestamp, e)))?;
        Ok(TradeRecord {
            timestamp: Utc.from_utc_datetime(&naive),
            long_venue: row
                .ex_long
                .parse()
                .map_err(|e| DbError::InvalidRow(format!("{}", e)))?,
            short_venue: row
                .ex_short
                .parse()
                .map_err(|e| DbError::InvalidRow(format!("{}", e)))?,
            net_profit: parse_decimal("net_profit", &row.net_profit)?,
            long_entry_price: parse_decimal("long_price", &row.long_price)?,
            short_entry_price: parse_decimal("short_price", &row.short_price)?,
            coin: row.coin,
        })
    }
}

fn parse_decimal(column: &str, raw: &str) -> Result<Decimal, DbError> {
    Decimal::from_str(raw).map_err(|e| DbError::InvalidRow(format!("{} '{}': {}", column, raw, e)))
}

/// The CSV file behind the `LedgerStore`.
#[derive(Debug, Clone)]
pub struct CsvTradeLog {
    path: PathBuf,
}

impl CsvTradeLog {
    /// Opens the log at `path`, creating it with a header row if absent.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DbError> {
        let path = path.into();
        prepare_trade_log(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every trade written so far.
    pub fn records(&self) -> Result<Vec<TradeRecord>, DbError> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        reader
            .deserialize::<TradeRow>()
            .map(|row| TradeRecord::try_from(row?))
            .collect()
    }
}

impl LedgerStore for CsvTradeLog {
    fn append(&self, record: &TradeRecord) -> Result<(), DbError> {
        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.serialize(TradeRow::from(record))?;
        writer.flush()?;
        debug!(coin = %record.coin, path = %self.path.display(), "Appended trade record.");
        Ok(())
    }
}
