//! # Fundarb Database Crate
//!
//! The durable record of simulated trades. Every settled position becomes one row of
//! an append-only CSV file that survives restarts.
//!
//! ## Public API
//!
//! - `LedgerStore`: the append interface the engine writes through.
//! - `CsvTradeLog`: the file-backed implementation.
//! - `prepare_trade_log`: creates the file and its header row if absent.
//! - `DbError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{HEADER, prepare_trade_log};
pub use error::DbError;
pub use repository::{CsvTradeLog, LedgerStore, TradeRow};
