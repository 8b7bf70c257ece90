use crate::CyclePhase;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API client error: {0}")]
    ApiClient(#[from] api_client::error::ApiError),

    #[error("Trade log error: {0}")]
    Database(#[from] database::DbError),

    #[error("Strategy error: {0}")]
    Strategy(#[from] strategies::StrategyError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] executor::LedgerError),
}

/// An error that escaped a cycle, tagged with the phase it escaped from.
#[derive(Error, Debug)]
#[error("cycle failed during {phase}: {source}")]
pub struct CycleFault {
    pub phase: CyclePhase,
    pub source: EngineError,
}
