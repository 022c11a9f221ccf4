//! Configuration for the risk scoring engine

use crate::geo::GeoRiskConfig;
use crate::kyc::KycConfig;
use crate::{Error, Result};
use compliance_service::ScreeningConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Weights for combining the risk components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Weight of the top watchlist match score
    pub match_weight: f64,

    /// Weight of the geographic risk
    pub geo_weight: f64,

    /// Weight of the KYC signal
    pub kyc_weight: f64,

    /// Geographic risk table
    pub geo_risk: GeoRiskConfig,

    /// KYC scoring
    pub kyc: KycConfig,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            match_weight: 0.5,
            geo_weight: 0.3,
            kyc_weight: 0.2,
            geo_risk: GeoRiskConfig::default(),
            kyc: KycConfig::default(),
        }
    }
}

impl RiskConfig {
    /// Check weights and nested tables
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("match_weight", self.match_weight),
            ("geo_weight", self.geo_weight),
            ("kyc_weight", self.kyc_weight),
        ];
        for (field, weight) in weights {
            if !(0.0..=1.0).contains(&weight) {
                return Err(Error::InvalidConfig(format!(
                    "{} must be within 0..=1, got {}",
                    field, weight
                )));
            }
        }

        let total = self.match_weight + self.geo_weight + self.kyc_weight;
        if total > 1.0 + f64::EPSILON * 4.0 {
            return Err(Error::InvalidConfig(format!(
                "risk weights add up to {}, more than 1",
                total
            )));
        }

        self.geo_risk.validate()?;
        self.kyc.validate()
    }
}

/// Full engine configuration, usually read from a TOML file
///
/// ```toml
/// watchlist_path = "data/master_screening_dataset.csv"
/// kyc_flags_path = "data/kyc_red_flags.csv"
///
/// [screening]
/// threshold = 75.0
///
/// [risk.geo_risk.weights]
/// iran = 100
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Master watchlist dataset (CSV)
    pub watchlist_path: PathBuf,

    /// Optional KYC flags table (CSV)
    #[serde(default)]
    pub kyc_flags_path: Option<PathBuf>,

    /// Screening threshold and field weights
    #[serde(default)]
    pub screening: ScreeningConfig,

    /// Risk aggregation
    #[serde(default)]
    pub risk: RiskConfig,
}

impl EngineConfig {
    /// Default configuration for a watchlist file
    pub fn new(watchlist_path: impl Into<PathBuf>) -> Self {
        Self {
            watchlist_path: watchlist_path.into(),
            kyc_flags_path: None,
            screening: ScreeningConfig::default(),
            risk: RiskConfig::default(),
        }
    }

    /// Parse and validate TOML
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(toml).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file. Relative data paths are resolved against the
    /// directory holding the file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::InvalidConfig(format!("cannot read {}: {}", path.display(), e)))?;
        let mut config = Self::from_toml_str(&contents)?;

        if let Some(base) = path.parent() {
            config.watchlist_path = base.join(&config.watchlist_path);
            config.kyc_flags_path = config.kyc_flags_path.map(|kyc| base.join(kyc));
        }
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.screening
            .validate()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        self.risk.validate()
    }
}
