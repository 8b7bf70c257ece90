//! # Fundarb Executor Crate
//!
//! This crate owns the simulated account: one virtual balance per venue and at most
//! one hedged position per coin. Nothing here talks to a venue; the `PositionLedger`
//! is a pure state machine driven by the engine.
//!
//! ## Public API
//!
//! - `PositionLedger`: open, settle and clean up positions, read balances.
//! - `OpenRequest` / `OpenGates`: what to open and the thresholds it must pass.
//! - `LedgerError`: the specific rejections that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod error;
pub mod ledger;

// Re-export the key components to provide a clean, public-facing API.
pub use error::LedgerError;
pub use ledger::{OpenGates, OpenRequest, PositionLedger};
