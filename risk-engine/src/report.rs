//! Screening report payload
//!
//! Everything an external renderer needs to lay out a screening report for
//! one entity. No formatting happens here.

use crate::{Error, Result, RiskAssessment, RiskRecord};
use chrono::{DateTime, Utc};
use compliance_service::{QueryEntity, ScreeningResult};
use serde::Serialize;
use uuid::Uuid;

/// Report payload for one screened entity
#[derive(Debug, Clone, Serialize)]
pub struct ScreeningReport {
    /// Report ID
    pub report_id: Uuid,

    /// Generation timestamp
    pub generated_at: DateTime<Utc>,

    /// Entity as submitted
    pub entity: QueryEntity,

    /// Watchlist screening outcome
    pub screening: ScreeningResult,

    /// Aggregated risk
    pub risk: RiskRecord,
}

impl ScreeningReport {
    /// Wrap an assessment for rendering
    pub fn new(entity: QueryEntity, assessment: RiskAssessment) -> Self {
        Self {
            report_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            entity,
            screening: assessment.screening,
            risk: assessment.risk,
        }
    }

    /// Suggested file stem, e.g. `Bank_Melli_Iran_screening_report`
    pub fn file_stem(&self) -> String {
        let name: String = self
            .entity
            .name
            .trim()
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        format!("{}_screening_report", name)
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}
