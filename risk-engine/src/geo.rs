//! Geographic risk lookup

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Built-in country weights, used when the configuration supplies none
pub const DEFAULT_COUNTRY_WEIGHTS: [(&str, u8); 10] = [
    ("iran", 100),
    ("iraq", 90),
    ("syria", 90),
    ("russia", 85),
    ("afghanistan", 80),
    ("pakistan", 70),
    ("china", 60),
    ("uae", 40),
    ("india", 30),
    ("usa", 20),
];

/// Geographic risk configuration
///
/// A `weights` table in the configuration replaces the built-in table as a
/// whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoRiskConfig {
    /// Country name -> risk weight (0-100)
    pub weights: BTreeMap<String, u8>,

    /// Weight for a country missing from `weights`
    pub unmapped_weight: u8,

    /// Weight when no country is supplied
    pub missing_country_weight: u8,
}

impl Default for GeoRiskConfig {
    fn default() -> Self {
        Self {
            weights: DEFAULT_COUNTRY_WEIGHTS
                .iter()
                .map(|(country, weight)| (country.to_string(), *weight))
                .collect(),
            unmapped_weight: 20,
            missing_country_weight: 0,
        }
    }
}

impl GeoRiskConfig {
    /// Check every weight is within 0..=100
    pub fn validate(&self) -> Result<()> {
        let out_of_range = self
            .weights
            .iter()
            .map(|(country, weight)| (country.as_str(), *weight))
            .chain([
                ("unmapped_weight", self.unmapped_weight),
                ("missing_country_weight", self.missing_country_weight),
            ])
            .find(|(_, weight)| *weight > 100);

        match out_of_range {
            Some((key, weight)) => Err(Error::InvalidConfig(format!(
                "geographic risk weight for {} must be within 0..=100, got {}",
                key, weight
            ))),
            None => Ok(()),
        }
    }
}

/// Country risk table with normalized keys
#[derive(Debug, Clone)]
pub struct GeoRiskTable {
    weights: HashMap<String, u8>,
    unmapped_weight: u8,
    missing_country_weight: u8,
}

impl GeoRiskTable {
    /// Build the table from configuration
    pub fn new(config: &GeoRiskConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            weights: config
                .weights
                .iter()
                .map(|(country, weight)| (normalize_country(country), *weight))
                .collect(),
            unmapped_weight: config.unmapped_weight,
            missing_country_weight: config.missing_country_weight,
        })
    }

    /// Risk weight for a country; blank counts as missing
    pub fn lookup(&self, country: Option<&str>) -> u8 {
        let key = country.map(normalize_country).unwrap_or_default();
        if key.is_empty() {
            return self.missing_country_weight;
        }
        self.weights.get(&key).copied().unwrap_or(self.unmapped_weight)
    }

    /// Number of mapped countries
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// True when no country is mapped
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl Default for GeoRiskTable {
    fn default() -> Self {
        let config = GeoRiskConfig::default();
        Self {
            weights: config.weights.into_iter().collect(),
            unmapped_weight: config.unmapped_weight,
            missing_country_weight: config.missing_country_weight,
        }
    }
}

fn normalize_country(country: &str) -> String {
    country.trim().to_lowercase()
}
