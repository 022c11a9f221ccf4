use crate::error::{ComplianceError, Result};
use crate::integration::{summarize, ListSummary};
use crate::similarity::full_process;
use crate::types::{non_blank, WatchlistRecord};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Columns the master watchlist dataset must provide. Others are ignored.
pub const REQUIRED_COLUMNS: [&str; 4] = ["name", "country", "address", "list_type"];

// Row as it appears in the master dataset, before validation
#[derive(Debug, Deserialize)]
struct RawWatchlistRow {
    name: Option<String>,
    country: Option<String>,
    address: Option<String>,
    list_type: Option<String>,
    #[serde(default)]
    program: Option<String>,
    #[serde(default)]
    risk_level: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

/// Record plus the comparison keys derived from it at load time.
#[derive(Debug)]
pub(crate) struct IndexedRecord {
    pub(crate) record: Arc<WatchlistRecord>,
    pub(crate) name_key: String,
    pub(crate) country_key: String,
    pub(crate) address_key: String,
}

impl IndexedRecord {
    fn new(record: WatchlistRecord) -> Self {
        let name_key = full_process(&record.name);
        let country_key = comparison_key(record.country.as_deref());
        let address_key = comparison_key(record.address.as_deref());
        Self {
            record: Arc::new(record),
            name_key,
            country_key,
            address_key,
        }
    }
}

pub(crate) fn comparison_key(value: Option<&str>) -> String {
    value.map(|v| v.trim().to_lowercase()).unwrap_or_default()
}

/// Immutable, fully validated snapshot of the master watchlist.
#[derive(Debug)]
pub struct ReferenceIndex {
    records: Vec<IndexedRecord>,
    loaded_at: DateTime<Utc>,
    source: Option<PathBuf>,
}

impl ReferenceIndex {
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            loaded_at: Utc::now(),
            source: None,
        }
    }

    /// Build an index from records already in memory. Every record needs a name.
    pub fn from_records(records: impl IntoIterator<Item = WatchlistRecord>) -> Result<Self> {
        let mut indexed = Vec::new();
        for (position, mut record) in records.into_iter().enumerate() {
            record.name = record.name.trim().to_string();
            if record.name.is_empty() {
                return Err(ComplianceError::Initialization(format!(
                    "record {} has no entity name",
                    position
                )));
            }
            indexed.push(IndexedRecord::new(record));
        }

        Ok(Self {
            records: indexed,
            loaded_at: Utc::now(),
            source: None,
        })
    }

    /// Load the master dataset from a CSV file
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            ComplianceError::Initialization(format!("cannot open {}: {}", path.display(), e))
        })?;

        let mut index = Self::from_csv_reader(file)?;
        index.source = Some(path.to_path_buf());
        info!(
            "Loaded watchlist {} with {} records",
            path.display(),
            index.len()
        );
        Ok(index)
    }

    /// Load the master dataset from any CSV source with a header row.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| ComplianceError::Initialization(format!("unreadable header row: {}", e)))?
            .clone();

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|column| !headers.iter().any(|h| h == *column))
            .collect();
        if !missing.is_empty() {
            return Err(ComplianceError::Initialization(format!(
                "missing required column(s): {}",
                missing.join(", ")
            )));
        }

        let mut records = Vec::new();
        for (row, result) in rdr.deserialize::<RawWatchlistRow>().enumerate() {
            // Header is line 1
            let line = row + 2;
            let raw = result.map_err(|e| {
                ComplianceError::Initialization(format!("line {}: {}", line, e))
            })?;

            let name = non_blank(raw.name).ok_or_else(|| {
                ComplianceError::Initialization(format!("line {}: missing entity name", line))
            })?;

            records.push(WatchlistRecord {
                name,
                country: non_blank(raw.country),
                address: non_blank(raw.address),
                list_type: non_blank(raw.list_type).unwrap_or_default(),
                program: non_blank(raw.program),
                risk_level: non_blank(raw.risk_level),
                source: non_blank(raw.source),
                notes: non_blank(raw.notes),
            });
        }

        Self::from_records(records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&WatchlistRecord> {
        self.records.get(position).map(|entry| entry.record.as_ref())
    }

    /// Records in load order
    pub fn records(&self) -> impl Iterator<Item = &WatchlistRecord> {
        self.records.iter().map(|entry| entry.record.as_ref())
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Record count per list type, largest first
    pub fn summary(&self) -> Vec<ListSummary> {
        summarize(self.records())
    }

    pub(crate) fn entries(&self) -> &[IndexedRecord] {
        &self.records
    }
}

impl Default for ReferenceIndex {
    fn default() -> Self {
        Self::empty()
    }
}

/// Holder of the active [`ReferenceIndex`].
///
/// Readers take an `Arc` snapshot and keep using it for the whole call;
/// a reload builds a new index off to the side and swaps the pointer, so no
/// reader ever sees a partially replaced watchlist.
#[derive(Debug)]
pub struct SharedWatchlist {
    active: RwLock<Arc<ReferenceIndex>>,
}

impl SharedWatchlist {
    pub fn new(index: ReferenceIndex) -> Self {
        Self {
            active: RwLock::new(Arc::new(index)),
        }
    }

    /// Snapshot of the active index
    pub fn current(&self) -> Arc<ReferenceIndex> {
        Arc::clone(&self.active.read())
    }

    /// Install `index` as the active watchlist and return the previous one.
    pub fn replace(&self, index: ReferenceIndex) -> Arc<ReferenceIndex> {
        let next = Arc::new(index);
        let records = next.len();
        let previous = std::mem::replace(&mut *self.active.write(), next);
        info!(
            "Swapped active watchlist: {} -> {} records",
            previous.len(),
            records
        );
        previous
    }

    /// Load a new master dataset and swap it in. On error the active index is
    /// left untouched.
    pub fn reload_from_path(&self, path: impl AsRef<Path>) -> Result<Arc<ReferenceIndex>> {
        let index = ReferenceIndex::from_csv_path(path)?;
        Ok(self.replace(index))
    }
}

impl Default for SharedWatchlist {
    fn default() -> Self {
        Self::new(ReferenceIndex::empty())
    }
}
