use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComplianceError {
    #[error("Watchlist initialization failed: {0}")]
    Initialization(String),

    #[error("Invalid screening query: {0}")]
    InvalidQuery(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, ComplianceError>;
