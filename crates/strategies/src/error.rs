use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum StrategyError {
    #[error("Strategy received invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Price must be positive, got {0}")]
    InvalidPrice(rust_decimal::Decimal),
}
