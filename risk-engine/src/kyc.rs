//! KYC red-flag signal
//!
//! Flags come from an external table keyed by entity name. The table is
//! optional: when it is absent the entity simply has no flags, and when it
//! cannot be read the KYC component scores 0 and the record carries a
//! [`DegradedSignal`] explaining why.

use crate::{DegradedSignal, Error, Result};
use compliance_service::similarity::full_process;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// How flags turn into a KYC score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycPolicy {
    /// Fixed `kyc_default_score` when the entity has at least one flag
    AnyFlag,
    /// Sum of per-flag severity scores, capped at 100
    SeverityWeighted,
}

/// Flag severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Low severity
    Low,
    /// Medium severity
    Medium,
    /// High severity
    High,
}

impl Severity {
    /// Parse a severity label, ignoring case
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            _ => None,
        }
    }
}

/// KYC scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KycConfig {
    /// Scoring policy
    pub policy: KycPolicy,

    /// Score for a flagged entity under `any_flag`, and for flags without a
    /// severity under `severity_weighted`
    pub kyc_default_score: u8,

    /// Score of a low severity flag
    pub low_severity_score: u8,

    /// Score of a medium severity flag
    pub medium_severity_score: u8,

    /// Score of a high severity flag
    pub high_severity_score: u8,
}

impl Default for KycConfig {
    fn default() -> Self {
        Self {
            policy: KycPolicy::AnyFlag,
            kyc_default_score: 10,
            low_severity_score: 10,
            medium_severity_score: 25,
            high_severity_score: 50,
        }
    }
}

impl KycConfig {
    /// Check every score is within 0..=100
    pub fn validate(&self) -> Result<()> {
        let scores = [
            ("kyc_default_score", self.kyc_default_score),
            ("low_severity_score", self.low_severity_score),
            ("medium_severity_score", self.medium_severity_score),
            ("high_severity_score", self.high_severity_score),
        ];
        for (field, score) in scores {
            if score > 100 {
                return Err(Error::InvalidConfig(format!(
                    "{} must be within 0..=100, got {}",
                    field, score
                )));
            }
        }
        Ok(())
    }

    fn severity_score(&self, severity: Option<Severity>) -> u32 {
        u32::from(match severity {
            Some(Severity::Low) => self.low_severity_score,
            Some(Severity::Medium) => self.medium_severity_score,
            Some(Severity::High) => self.high_severity_score,
            None => self.kyc_default_score,
        })
    }
}

/// One red flag raised against an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycFlag {
    /// Entity name the flag belongs to
    pub name: String,

    /// Flag description
    pub flag: Option<String>,

    /// Flag severity, when known
    pub severity: Option<Severity>,
}

impl KycFlag {
    /// Flag without description or severity
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flag: None,
            severity: None,
        }
    }

    /// Set the severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }
}

/// KYC flags grouped by normalized entity name
#[derive(Debug, Clone, Default)]
pub struct KycFlagTable {
    flags: HashMap<String, Vec<KycFlag>>,
}

impl KycFlagTable {
    /// Table without flags
    pub fn empty() -> Self {
        Self::default()
    }

    /// Group flags by entity
    pub fn from_flags(flags: impl IntoIterator<Item = KycFlag>) -> Self {
        let mut table: HashMap<String, Vec<KycFlag>> = HashMap::new();
        for flag in flags {
            let key = entity_key(&flag.name);
            if key.is_empty() {
                continue;
            }
            table.entry(key).or_default().push(flag);
        }
        Self { flags: table }
    }

    /// Load flags from a CSV file with a `name` column and optional `flag`
    /// and `severity` columns.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Error::KycUnavailable(format!("cannot open {}: {}", path.display(), e)))?;
        let table = Self::from_csv_reader(file)?;
        info!(
            "Loaded KYC flags for {} entities from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    /// Load flags from any CSV source with a header row
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| Error::KycUnavailable(format!("unreadable header row: {}", e)))?
            .clone();
        let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let name_col = column("name")
            .ok_or_else(|| Error::KycUnavailable("missing required column: name".to_string()))?;
        let flag_col = column("flag");
        let severity_col = column("severity");

        let mut flags = Vec::new();
        for result in rdr.records() {
            let row = result.map_err(|e| Error::KycUnavailable(e.to_string()))?;
            let field = |col: Option<usize>| {
                col.and_then(|i| row.get(i))
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
            };

            let Some(name) = field(Some(name_col)) else {
                continue;
            };
            flags.push(KycFlag {
                name,
                flag: field(flag_col),
                severity: field(severity_col).as_deref().and_then(Severity::parse),
            });
        }

        Ok(Self::from_flags(flags))
    }

    /// Flags recorded for an entity name
    pub fn flags_for(&self, name: &str) -> &[KycFlag] {
        self.flags
            .get(&entity_key(name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of flagged entities
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// True when no entity is flagged
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

// Normalized name with single spaces between words
fn entity_key(name: &str) -> String {
    full_process(name).split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Where the engine gets its KYC flags from
#[derive(Debug, Clone)]
pub enum KycSource {
    /// Flags loaded successfully (possibly none)
    Table(KycFlagTable),

    /// The table was configured but could not be read
    Unavailable {
        /// Load failure
        reason: String,
    },
}

impl KycSource {
    /// Load the optional flags table. A missing path means no flags; a
    /// failed load is kept as [`KycSource::Unavailable`] instead of an error.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return KycSource::Table(KycFlagTable::empty());
        };

        match KycFlagTable::from_csv_path(path) {
            Ok(table) => KycSource::Table(table),
            Err(e) => {
                warn!("KYC flags unavailable, KYC component will score 0: {}", e);
                KycSource::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }
}

impl Default for KycSource {
    fn default() -> Self {
        KycSource::Table(KycFlagTable::empty())
    }
}

/// KYC component of one risk assessment
#[derive(Debug, Clone, PartialEq)]
pub struct KycSignal {
    /// Score (0-100)
    pub score: u8,

    /// Flags found for the entity
    pub flag_count: usize,

    /// Set when the score could not be computed
    pub degraded: Option<DegradedSignal>,
}

/// KYC signal for `name` under `config`
pub fn kyc_signal(config: &KycConfig, source: &KycSource, name: &str) -> KycSignal {
    let table = match source {
        KycSource::Table(table) => table,
        KycSource::Unavailable { reason } => {
            return KycSignal {
                score: 0,
                flag_count: 0,
                degraded: Some(DegradedSignal {
                    component: "kyc".to_string(),
                    reason: reason.clone(),
                }),
            }
        }
    };

    let flags = table.flags_for(name);
    let score = if flags.is_empty() {
        0
    } else {
        match config.policy {
            KycPolicy::AnyFlag => config.kyc_default_score,
            KycPolicy::SeverityWeighted => {
                let total: u32 = flags
                    .iter()
                    .map(|flag| config.severity_score(flag.severity))
                    .sum();
                total.min(100) as u8
            }
        }
    };

    KycSignal {
        score,
        flag_count: flags.len(),
        degraded: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLAGS_CSV: &str = "\
name,flag,severity
Acme Trading LLC,shell company indicators,high
acme trading llc,nominee directors,Medium
Blue Lagoon Shipping,adverse media,
,orphan flag,low
";

    #[test]
    fn test_flags_keyed_by_normalized_name() {
        let table = KycFlagTable::from_csv_reader(FLAGS_CSV.as_bytes()).unwrap();

        assert_eq!(table.len(), 2);
        let flags = table.flags_for("  ACME Trading, LLC ");
        assert_eq!(flags.len(), 2);
        assert_eq!(flags[0].severity, Some(Severity::High));
        assert_eq!(flags[1].severity, Some(Severity::Medium));
        assert!(table.flags_for("Unknown Entity").is_empty());
    }

    #[test]
    fn test_any_flag_policy() {
        let source = KycSource::Table(KycFlagTable::from_csv_reader(FLAGS_CSV.as_bytes()).unwrap());
        let config = KycConfig::default();

        let flagged = kyc_signal(&config, &source, "Acme Trading LLC");
        assert_eq!(flagged.score, 10);
        assert_eq!(flagged.flag_count, 2);

        let clean = kyc_signal(&config, &source, "John Smith");
        assert_eq!(clean.score, 0);
        assert_eq!(clean.degraded, None);
    }

    #[test]
    fn test_severity_weighted_policy() {
        let source = KycSource::Table(KycFlagTable::from_csv_reader(FLAGS_CSV.as_bytes()).unwrap());
        let config = KycConfig {
            policy: KycPolicy::SeverityWeighted,
            ..KycConfig::default()
        };

        assert_eq!(kyc_signal(&config, &source, "Acme Trading LLC").score, 75);
        // No severity falls back to the default score
        assert_eq!(kyc_signal(&config, &source, "Blue Lagoon Shipping").score, 10);
    }

    #[test]
    fn test_severity_weighted_is_capped() {
        let table = KycFlagTable::from_flags(
            (0..5).map(|_| KycFlag::new("Repeat Offender").with_severity(Severity::High)),
        );
        let config = KycConfig {
            policy: KycPolicy::SeverityWeighted,
            ..KycConfig::default()
        };
        assert_eq!(kyc_signal(&config, &KycSource::Table(table), "Repeat Offender").score, 100);
    }

    #[test]
    fn test_missing_name_column() {
        let err = KycFlagTable::from_csv_reader("entity,flag\nAcme,pep\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::KycUnavailable(_)));
    }

    #[test]
    fn test_unreadable_table_degrades() {
        let source = KycSource::load(Some(Path::new("/nonexistent/kyc_red_flags.csv")));
        assert!(matches!(source, KycSource::Unavailable { .. }));

        let signal = kyc_signal(&KycConfig::default(), &source, "Acme Trading LLC");
        assert_eq!(signal.score, 0);
        assert_eq!(signal.degraded.unwrap().component, "kyc");
    }

    #[test]
    fn test_scores_above_100_rejected() {
        assert!(KycConfig::default().validate().is_ok());

        let config = KycConfig {
            high_severity_score: 150,
            ..KycConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = KycConfig {
            kyc_default_score: 101,
            ..KycConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_no_table_configured() {
        let source = KycSource::load(None);
        let signal = kyc_signal(&KycConfig::default(), &source, "Acme Trading LLC");
        assert_eq!(signal.score, 0);
        assert!(signal.degraded.is_none());
    }
}
