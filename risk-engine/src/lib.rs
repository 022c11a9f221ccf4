//! Risk Engine for entity screening
//!
//! Combines watchlist screening, geographic risk and KYC red flags into a
//! single compliance risk score and band.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod geo;
pub mod kyc;
pub mod report;
pub mod scoring;
pub mod types;

pub use config::{EngineConfig, RiskConfig};
pub use error::{Error, Result};
pub use geo::{GeoRiskConfig, GeoRiskTable};
pub use kyc::{KycConfig, KycFlag, KycFlagTable, KycPolicy, KycSignal, KycSource, Severity};
pub use report::ScreeningReport;
pub use scoring::RiskScorer;
pub use types::*;
