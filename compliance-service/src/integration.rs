//! Watchlist integration helpers
//!
//! Bring individual source lists (OFAC SDN, BIS entity list, ...) into the
//! master schema consumed by [`crate::ReferenceIndex`]:
//! - map whatever columns a source provides onto the master columns
//! - stamp list type and source, assign a default risk level
//! - merge lists, dropping exact duplicates
//! - per-list summary counts

use crate::error::Result;
use crate::types::{non_blank, WatchlistRecord};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};
use tracing::{debug, info, warn};

/// Column order of the master dataset
pub const MASTER_COLUMNS: [&str; 8] = [
    "name",
    "country",
    "address",
    "list_type",
    "program",
    "risk_level",
    "source",
    "notes",
];

/// Lists whose entries are always treated as high risk
pub const HIGH_RISK_LIST_TYPES: [&str; 6] = ["OFAC_SDN", "ENTITY_LIST", "MEU", "MIEU", "UVL", "DPL"];

const HIGH_RISK_LEVEL: &str = "High";
const DEFAULT_RISK_LEVEL: &str = "Medium";

/// Identity of one source list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceList {
    pub list_type: String,
    pub source: String,
}

impl SourceList {
    pub fn new(list_type: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            list_type: list_type.into(),
            source: source.into(),
        }
    }

    pub fn is_high_risk(&self) -> bool {
        HIGH_RISK_LIST_TYPES.contains(&self.list_type.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSummary {
    pub list_type: String,
    pub count: usize,
}

/// Normalize a raw source list into master-schema records.
///
/// Columns named like a master column are carried over, everything else is
/// dropped. Rows that cannot be parsed or carry no name are skipped.
pub fn normalize_source<R: Read>(reader: R, list: &SourceList) -> Result<Vec<WatchlistRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let name_col = column("name");
    let country_col = column("country");
    let address_col = column("address");
    let program_col = column("program");
    let risk_col = column("risk_level");
    let notes_col = column("notes");

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (row, result) in rdr.records().enumerate() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Skipping malformed row {} in {}: {}", row + 2, list.list_type, e);
                skipped += 1;
                continue;
            }
        };
        let field = |col: Option<usize>| non_blank(col.and_then(|i| raw.get(i)).map(str::to_string));

        let Some(name) = field(name_col) else {
            skipped += 1;
            continue;
        };

        let risk_level = if list.is_high_risk() {
            HIGH_RISK_LEVEL.to_string()
        } else {
            field(risk_col).unwrap_or_else(|| DEFAULT_RISK_LEVEL.to_string())
        };

        records.push(WatchlistRecord {
            name,
            country: field(country_col),
            address: field(address_col),
            list_type: list.list_type.clone(),
            program: field(program_col),
            risk_level: Some(risk_level),
            source: Some(list.source.clone()),
            notes: field(notes_col),
        });
    }

    debug!(
        "Normalized {} rows from {} ({} skipped)",
        records.len(),
        list.list_type,
        skipped
    );
    Ok(records)
}

/// Concatenate normalized lists, keeping the first copy of exact duplicates.
pub fn merge_master(lists: impl IntoIterator<Item = Vec<WatchlistRecord>>) -> Vec<WatchlistRecord> {
    let mut seen = HashSet::new();
    let mut master = Vec::new();
    let mut duplicates = 0usize;

    for record in lists.into_iter().flatten() {
        if seen.insert(record.clone()) {
            master.push(record);
        } else {
            duplicates += 1;
        }
    }

    info!(
        "Merged master watchlist: {} records, {} duplicates dropped",
        master.len(),
        duplicates
    );
    master
}

/// Record count per list type, largest first (ties by list type).
pub fn summarize<'a>(records: impl IntoIterator<Item = &'a WatchlistRecord>) -> Vec<ListSummary> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.list_type.as_str()).or_default() += 1;
    }

    let mut summary: Vec<ListSummary> = counts
        .into_iter()
        .map(|(list_type, count)| ListSummary {
            list_type: list_type.to_string(),
            count,
        })
        .collect();
    summary.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.list_type.cmp(&b.list_type)));
    summary
}

/// Write the master dataset, header first, in [`MASTER_COLUMNS`] order.
pub fn write_master_csv<W: Write>(writer: W, records: &[WatchlistRecord]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    wtr.write_record(MASTER_COLUMNS)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_summary_csv<W: Write>(writer: W, summary: &[ListSummary]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in summary {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
