use crate::error::{ComplianceError, Result};
use crate::index::{comparison_key, ReferenceIndex, SharedWatchlist};
use crate::similarity::{full_process, partial_ratio, token_set_ratio_processed};
use crate::types::{MatchCandidate, QueryEntity, ScreeningResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Screening configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreeningConfig {
    /// Minimum final score (0-100) for a record to be reported as a hit
    pub threshold: f64,

    pub name_weight: f64,
    pub country_weight: f64,
    pub address_weight: f64,

    /// Rescale the weights of the fields the query actually supplies so they
    /// add up to the configured total. When off, a missing country or address
    /// simply contributes nothing.
    /// `false` is the original unweighted-term behaviour.
    pub renormalize_missing_fields: bool,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            threshold: 75.0,
            name_weight: 0.7,
            country_weight: 0.2,
            address_weight: 0.1,
            renormalize_missing_fields: true,
        }
    }
}

impl ScreeningConfig {
    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.threshold)?;

        let weights = [
            ("name_weight", self.name_weight),
            ("country_weight", self.country_weight),
            ("address_weight", self.address_weight),
        ];
        for (field, weight) in weights {
            if !(0.0..=1.0).contains(&weight) {
                return Err(ComplianceError::ConfigError(format!(
                    "{} must be within 0..=1, got {}",
                    field, weight
                )));
            }
        }

        let total = self.name_weight + self.country_weight + self.address_weight;
        if total > 1.0 + f64::EPSILON * 4.0 {
            return Err(ComplianceError::ConfigError(format!(
                "field weights add up to {}, more than 1",
                total
            )));
        }
        if self.name_weight <= 0.0 {
            return Err(ComplianceError::ConfigError(
                "name_weight must be positive".to_string(),
            ));
        }
        Ok(())
    }

    // (name, country, address) weights for a query with the given fields
    fn effective_weights(&self, has_country: bool, has_address: bool) -> (f64, f64, f64) {
        let country = if has_country { self.country_weight } else { 0.0 };
        let address = if has_address { self.address_weight } else { 0.0 };
        if !self.renormalize_missing_fields {
            return (self.name_weight, country, address);
        }

        let supplied = self.name_weight + country + address;
        let configured = self.name_weight + self.country_weight + self.address_weight;
        let scale = configured / supplied;
        (self.name_weight * scale, country * scale, address * scale)
    }
}

fn validate_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&threshold) {
        return Err(ComplianceError::ConfigError(format!(
            "threshold must be within 0..=100, got {}",
            threshold
        )));
    }
    Ok(())
}

/// Round a score to two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// Query with comparison keys, validated
struct PreparedQuery {
    name_key: String,
    country_key: Option<String>,
    address_key: Option<String>,
}

impl PreparedQuery {
    fn new(query: &QueryEntity) -> Result<Self> {
        let name_key = full_process(&query.name);
        if name_key.is_empty() {
            return Err(ComplianceError::InvalidQuery(format!(
                "entity name {:?} has nothing to match on",
                query.name
            )));
        }

        let optional = |value: Option<&str>| Some(comparison_key(value)).filter(|key| !key.is_empty());
        Ok(Self {
            name_key,
            country_key: optional(query.country.as_deref()),
            address_key: optional(query.address.as_deref()),
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct FieldScores {
    position: usize,
    name: f64,
    country: f64,
    address: f64,
    total: f64,
}

/// WatchlistScreener ranks every watchlist record by similarity to a query
/// and reports those at or above the threshold.
pub struct WatchlistScreener {
    watchlist: Arc<SharedWatchlist>,
    config: ScreeningConfig,
}

impl WatchlistScreener {
    pub fn new(watchlist: Arc<SharedWatchlist>, config: ScreeningConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { watchlist, config })
    }

    /// Screener over a fixed index
    pub fn from_index(index: ReferenceIndex, config: ScreeningConfig) -> Result<Self> {
        Self::new(Arc::new(SharedWatchlist::new(index)), config)
    }

    pub fn watchlist(&self) -> &Arc<SharedWatchlist> {
        &self.watchlist
    }

    pub fn config(&self) -> &ScreeningConfig {
        &self.config
    }

    /// Screen against the configured threshold
    pub fn screen(&self, query: &QueryEntity) -> Result<ScreeningResult> {
        self.screen_with_threshold(query, self.config.threshold)
    }

    pub fn screen_with_threshold(&self, query: &QueryEntity, threshold: f64) -> Result<ScreeningResult> {
        validate_threshold(threshold)?;
        let prepared = PreparedQuery::new(query)?;
        let index = self.watchlist.current();

        let hits: Vec<FieldScores> = self
            .score_all(&index, &prepared)
            .into_iter()
            .filter(|scores| scores.total >= threshold)
            .collect();
        let result = ScreeningResult::from_hits(Self::candidates(&index, hits));

        match result.top_match() {
            Some(top) => info!(
                "Potential match for {}: {} hit(s), top {} ({}) at {}",
                query.name,
                result.count(),
                top.match_name(),
                top.list_type(),
                top.final_score
            ),
            None => debug!(
                "No match for {} across {} records (threshold {})",
                query.name,
                index.len(),
                threshold
            ),
        }
        Ok(result)
    }

    /// Every record of the active index, best match first.
    pub fn rank(&self, query: &QueryEntity) -> Result<Vec<MatchCandidate>> {
        let prepared = PreparedQuery::new(query)?;
        let index = self.watchlist.current();
        let scores = self.score_all(&index, &prepared);
        Ok(Self::candidates(&index, scores))
    }

    pub fn screen_batch(&self, queries: &[QueryEntity]) -> Vec<Result<ScreeningResult>> {
        queries.iter().map(|query| self.screen(query)).collect()
    }

    // Scores in descending order of total; equal totals keep index order.
    fn score_all(&self, index: &ReferenceIndex, query: &PreparedQuery) -> Vec<FieldScores> {
        let (name_w, country_w, address_w) = self
            .config
            .effective_weights(query.country_key.is_some(), query.address_key.is_some());

        let mut scores: Vec<FieldScores> = index
            .entries()
            .iter()
            .enumerate()
            .map(|(position, entry)| {
                let name = f64::from(token_set_ratio_processed(&query.name_key, &entry.name_key));
                let country = query
                    .country_key
                    .as_deref()
                    .map_or(0.0, |key| f64::from(partial_ratio(key, &entry.country_key)));
                let address = query
                    .address_key
                    .as_deref()
                    .map_or(0.0, |key| f64::from(partial_ratio(key, &entry.address_key)));

                let total = round2(name * name_w + country * country_w + address * address_w);
                FieldScores {
                    position,
                    name,
                    country,
                    address,
                    total: total.clamp(0.0, 100.0),
                }
            })
            .collect();

        scores.sort_by(|a, b| b.total.total_cmp(&a.total));
        scores
    }

    fn candidates(index: &ReferenceIndex, scores: Vec<FieldScores>) -> Vec<MatchCandidate> {
        let entries = index.entries();
        scores
            .into_iter()
            .map(|scores| MatchCandidate {
                name_score: scores.name,
                country_score: scores.country,
                address_score: scores.address,
                final_score: scores.total,
                position: scores.position,
                record: Arc::clone(&entries[scores.position].record),
            })
            .collect()
    }
}
