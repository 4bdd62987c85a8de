//! Error types for simulation, estimation and cluster I/O.

use crate::cluster::Point;

#[derive(Debug, thiserror::Error)]
pub enum DlaError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Point {0} is already occupied")]
    AlreadyOccupied(Point),

    #[error("Gave up after {attempts} particle attempts with {stuck} particles stuck")]
    RetryLimitExceeded { attempts: usize, stuck: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Export error: {0}")]
    Export(String),
}

impl From<serde_json::Error> for DlaError {
    fn from(e: serde_json::Error) -> Self {
        DlaError::Config(e.to_string())
    }
}

impl From<image::ImageError> for DlaError {
    fn from(e: image::ImageError) -> Self {
        DlaError::Export(e.to_string())
    }
}

impl From<gif::EncodingError> for DlaError {
    fn from(e: gif::EncodingError) -> Self {
        DlaError::Export(e.to_string())
    }
}
