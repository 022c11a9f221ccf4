use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One sanctioned entity from the master watchlist dataset.
///
/// Column order matches the master schema written by
/// [`crate::integration::write_master_csv`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WatchlistRecord {
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub list_type: String,
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl WatchlistRecord {
    pub fn new(name: impl Into<String>, list_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: None,
            address: None,
            list_type: list_type.into(),
            program: None,
            risk_level: None,
            source: None,
            notes: None,
        }
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = non_blank(Some(country.into()));
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = non_blank(Some(address.into()));
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = non_blank(Some(source.into()));
        self
    }
}

/// Entity submitted for screening. Only `name` is mandatory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryEntity {
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl QueryEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: None,
            address: None,
        }
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

/// Screening status as shown to report consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreeningStatus {
    #[serde(rename = "No Match")]
    NoMatch,
    #[serde(rename = "Potential Match")]
    PotentialMatch,
}

impl ScreeningStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ScreeningStatus::NoMatch => "No Match",
            ScreeningStatus::PotentialMatch => "Potential Match",
        }
    }
}

impl fmt::Display for ScreeningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Similarity of one watchlist record to the query.
#[derive(Debug, Clone, Serialize)]
pub struct MatchCandidate {
    pub name_score: f64,    // 0-100
    pub country_score: f64, // 0-100
    pub address_score: f64, // 0-100
    pub final_score: f64,   // 0-100, two decimals
    /// Position of the record in the reference index
    pub position: usize,
    pub record: Arc<WatchlistRecord>,
}

impl MatchCandidate {
    pub fn match_name(&self) -> &str {
        &self.record.name
    }

    pub fn list_type(&self) -> &str {
        &self.record.list_type
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status")]
pub enum ScreeningResult {
    #[serde(rename = "No Match")]
    NoMatch,
    /// Hits at or above the threshold, best first.
    #[serde(rename = "Potential Match")]
    PotentialMatch { matches: Vec<MatchCandidate> },
}

impl ScreeningResult {
    pub(crate) fn from_hits(matches: Vec<MatchCandidate>) -> Self {
        if matches.is_empty() {
            ScreeningResult::NoMatch
        } else {
            ScreeningResult::PotentialMatch { matches }
        }
    }

    pub fn status(&self) -> ScreeningStatus {
        match self {
            ScreeningResult::NoMatch => ScreeningStatus::NoMatch,
            ScreeningResult::PotentialMatch { .. } => ScreeningStatus::PotentialMatch,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, ScreeningResult::PotentialMatch { .. })
    }

    pub fn matches(&self) -> &[MatchCandidate] {
        match self {
            ScreeningResult::NoMatch => &[],
            ScreeningResult::PotentialMatch { matches } => matches,
        }
    }

    pub fn top_match(&self) -> Option<&MatchCandidate> {
        self.matches().first()
    }

    pub fn count(&self) -> usize {
        self.matches().len()
    }
}

// Trimmed value, or None when nothing is left
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
