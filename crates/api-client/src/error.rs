use core_types::VenueId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{venue} returned HTTP {status}: {body}")]
    HttpStatus { venue: VenueId, status: u16, body: String },

    #[error("{venue} rejected the request (code {code}): {msg}")]
    Venue { venue: VenueId, code: String, msg: String },

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),

    #[error("Venue configuration error: {0}")]
    Configuration(String),
}
