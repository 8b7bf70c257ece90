use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Trade log I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Trade log CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Trade log row is malformed: {0}")]
    InvalidRow(String),
}
