//! Risk scoring engine

use crate::config::{EngineConfig, RiskConfig};
use crate::geo::GeoRiskTable;
use crate::kyc::{kyc_signal, KycSignal, KycSource};
use crate::{Error, Result, RiskAssessment, RiskLevel, RiskRecord};
use compliance_service::screening::round2;
use compliance_service::{QueryEntity, ReferenceIndex, ScreeningResult, SharedWatchlist, WatchlistScreener};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Risk scorer
///
/// Blends the top watchlist match, the geographic risk of the entity's
/// country and its KYC signal into one weighted score. Holds no mutable
/// state besides the swappable watchlist, so a single instance can serve
/// any number of threads.
pub struct RiskScorer {
    screener: WatchlistScreener,
    geo: GeoRiskTable,
    kyc_source: KycSource,
    config: RiskConfig,
}

impl RiskScorer {
    /// Create new risk scorer
    pub fn new(screener: WatchlistScreener, config: RiskConfig, kyc_source: KycSource) -> Result<Self> {
        config.validate()?;
        let geo = GeoRiskTable::new(&config.geo_risk)?;
        Ok(Self {
            screener,
            geo,
            kyc_source,
            config,
        })
    }

    /// Load the watchlist and KYC flags named in `config`.
    ///
    /// A watchlist that cannot be loaded is fatal; an unreadable KYC table
    /// only degrades the KYC component.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        config.validate()?;

        let index = ReferenceIndex::from_csv_path(&config.watchlist_path)?;
        let screener = WatchlistScreener::new(
            Arc::new(SharedWatchlist::new(index)),
            config.screening.clone(),
        )?;
        let kyc_source = KycSource::load(config.kyc_flags_path.as_deref());

        Self::new(screener, config.risk.clone(), kyc_source)
    }

    /// Underlying watchlist screener
    pub fn screener(&self) -> &WatchlistScreener {
        &self.screener
    }

    /// Active watchlist, for reloads
    pub fn watchlist(&self) -> &Arc<SharedWatchlist> {
        self.screener.watchlist()
    }

    /// Risk configuration
    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Swap in a freshly loaded watchlist; returns its record count.
    pub fn reload_watchlist(&self, path: impl AsRef<Path>) -> Result<usize> {
        self.watchlist().reload_from_path(path)?;
        Ok(self.watchlist().current().len())
    }

    /// Geographic risk weight for a country
    pub fn geo_risk(&self, country: Option<&str>) -> u8 {
        self.geo.lookup(country)
    }

    /// KYC signal for an entity name
    pub fn kyc_signal(&self, name: &str) -> KycSignal {
        kyc_signal(&self.config.kyc, &self.kyc_source, name)
    }

    /// Screen the entity and aggregate its risk
    pub fn score_entity(&self, query: &QueryEntity) -> Result<RiskRecord> {
        Ok(self.assess(query)?.risk)
    }

    /// Like [`RiskScorer::score_entity`], keeping the screening result
    pub fn assess(&self, query: &QueryEntity) -> Result<RiskAssessment> {
        let screening = self.screener.screen(query)?;
        let risk = self.aggregate(query, &screening);
        Ok(RiskAssessment { screening, risk })
    }

    /// Aggregate risk from an existing screening result
    pub fn aggregate(&self, query: &QueryEntity, screening: &ScreeningResult) -> RiskRecord {
        let (match_score, matched_list) = match screening.top_match() {
            Some(top) => (top.final_score, Some(top.list_type().to_string())),
            None => (0.0, None),
        };
        let geo_risk_score = self.geo_risk(query.country.as_deref());
        let kyc = self.kyc_signal(&query.name);

        let weighted = match_score * self.config.match_weight
            + f64::from(geo_risk_score) * self.config.geo_weight
            + f64::from(kyc.score) * self.config.kyc_weight;
        let final_score = round2(weighted).clamp(0.0, 100.0);
        let risk_level = RiskLevel::from_score(final_score);

        debug!(
            "Risk components for {}: match {}, geo {}, kyc {} ({} flags)",
            query.name, match_score, geo_risk_score, kyc.score, kyc.flag_count
        );
        info!(
            "Risk assessed for {}: {} ({})",
            query.name, final_score, risk_level
        );

        RiskRecord {
            name: query.name.clone(),
            country: query.country.clone(),
            match_score,
            geo_risk_score,
            kyc_score: kyc.score,
            final_score,
            risk_level,
            matched_list,
            degraded_signals: kyc.degraded.into_iter().collect(),
        }
    }

    /// Score many entities on the blocking thread pool. Results keep the
    /// order of `queries`.
    pub async fn score_batch(self: Arc<Self>, queries: Vec<QueryEntity>) -> Vec<Result<RiskRecord>> {
        let handles: Vec<_> = queries
            .into_iter()
            .map(|query| {
                let scorer = Arc::clone(&self);
                tokio::task::spawn_blocking(move || scorer.score_entity(&query))
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(match handle.await {
                Ok(result) => result,
                Err(e) => Err(Error::Calculation(format!("scoring task failed: {}", e))),
            });
        }
        results
    }
}
