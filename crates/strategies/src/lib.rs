//! # Fundarb Strategy Library
//!
//! This crate contains the decision logic of the simulator: the profit model that
//! prices a cross-venue funding-rate spread, and the scanner that picks the single
//! best spread out of a market snapshot.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of venues'
//!   APIs, the ledger or persistence. It depends only on `core-types`.
//! - **Deterministic:** Given the same snapshots, a scan always returns the same
//!   opportunity. Coins and venues are visited in a fixed order.
//!
//! ## Public API
//!
//! - `FundingRateArb`: the opportunity scanner.
//! - `economics`: `expected_net_profit` and `price_stable`.

// Declare all the modules that constitute this crate.
pub mod economics;
pub mod error;
pub mod funding_rate_arb;

// Re-export the key components to create a clean, public-facing API.
pub use economics::{ProfitBreakdown, ProfitInputs, expected_net_profit, price_stable};
pub use error::StrategyError;
pub use funding_rate_arb::{FundingRateArb, FundingRateArbParams};
