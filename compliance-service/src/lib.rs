pub mod error;
pub mod index;
pub mod integration;
pub mod screening;
pub mod similarity;
pub mod types;

pub use error::{ComplianceError, Result};
pub use index::{ReferenceIndex, SharedWatchlist, REQUIRED_COLUMNS};
pub use integration::{ListSummary, SourceList};
pub use screening::{ScreeningConfig, WatchlistScreener};
pub use types::{MatchCandidate, QueryEntity, ScreeningResult, ScreeningStatus, WatchlistRecord};
