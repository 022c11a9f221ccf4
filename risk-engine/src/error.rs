//! Error types for risk engine

use compliance_service::ComplianceError;
use thiserror::Error;

/// Risk engine error
#[derive(Debug, Error)]
pub enum Error {
    /// Watchlist loading or screening failed
    #[error("Screening error: {0}")]
    Screening(#[from] ComplianceError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// KYC flags table could not be read
    #[error("KYC flags unavailable: {0}")]
    KycUnavailable(String),

    /// Calculation error
    #[error("Calculation error: {0}")]
    Calculation(String),

    /// Report serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
