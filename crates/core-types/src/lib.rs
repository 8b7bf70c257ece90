pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{LegSide, VenueId};
pub use error::CoreError;
pub use structs::{
    FundingRateSnapshot, Leg, MarkPriceSnapshot, MarketAvailability, Opportunity, Position,
    TradeRecord, VenueTable, VenueTerms,
};
