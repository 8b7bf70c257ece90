use core_types::VenueId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Reasons the ledger refuses a state transition. Open rejections are expected
/// outcomes of a cycle, not faults.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("A position is already open for {0}")]
    PositionExists(String),

    #[error("Expected net profit {net_profit} for {coin} is below the minimum of {min}")]
    NetProfitBelowThreshold {
        coin: String,
        net_profit: Decimal,
        min: Decimal,
    },

    #[error("Insufficient balance on {venue}. Required: {min}, Available: {balance}")]
    InsufficientBalance {
        venue: VenueId,
        balance: Decimal,
        min: Decimal,
    },

    #[error("Venue {0} is not part of the ledger")]
    UnknownVenue(VenueId),

    #[error("Position not found for coin: {0}")]
    PositionNotFound(String),
}
