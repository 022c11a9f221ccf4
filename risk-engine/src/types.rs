//! Core types for risk engine

use compliance_service::ScreeningResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    /// Low risk (< 50)
    Low,
    /// Medium risk (50-79.99)
    Medium,
    /// High risk (>= 80)
    High,
}

impl RiskLevel {
    /// Lowest final score banded as high risk
    pub const HIGH_MIN: f64 = 80.0;

    /// Lowest final score banded as medium risk
    pub const MEDIUM_MIN: f64 = 50.0;

    /// Band a final score. Each band includes its lower bound.
    pub fn from_score(score: f64) -> Self {
        if score >= Self::HIGH_MIN {
            RiskLevel::High
        } else if score >= Self::MEDIUM_MIN {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Label used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A risk component that was scored as 0 because its input was unavailable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedSignal {
    /// Component name, e.g. `kyc`
    pub component: String,

    /// Why the component could not be computed
    pub reason: String,
}

/// Aggregated risk for one screened entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRecord {
    /// Entity name as submitted
    pub name: String,

    /// Country as submitted
    pub country: Option<String>,

    /// Final score of the top watchlist hit, 0 without a hit
    pub match_score: f64,

    /// Geographic risk weight (0-100)
    pub geo_risk_score: u8,

    /// KYC signal (0-100)
    pub kyc_score: u8,

    /// Weighted total (0-100), two decimals
    pub final_score: f64,

    /// Risk band of `final_score`
    pub risk_level: RiskLevel,

    /// List type of the top watchlist hit
    pub matched_list: Option<String>,

    /// Components forced to 0, with reasons
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded_signals: Vec<DegradedSignal>,
}

/// Screening result together with the risk record derived from it
#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    /// Watchlist screening outcome
    pub screening: ScreeningResult,

    /// Aggregated risk
    pub risk: RiskRecord,
}
