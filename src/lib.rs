//! tidyset - Data Quality Scoring, Cleaning and Versioning on Arrow
//!
//! Load a tabular dataset, measure its quality, get an ordered list of
//! cleaning suggestions, apply idempotent cleaning transforms and keep an
//! append-only history of every cleaned version.
//!
//! # Design Principles
//!
//! 1. **Arrow throughout** - a [`Snapshot`] is one `RecordBatch` of nullable
//!    `Float64` and `Utf8` columns
//! 2. **Value semantics** - transforms return new snapshots, inputs are
//!    never mutated
//! 3. **Pluggable storage** - versions live behind [`StorageBackend`]
//!    (local filesystem or memory)
//! 4. **Deterministic** - the same snapshot always yields the same score,
//!    statistics and suggestions
//!
//! # Quick Start
//!
//! ```
//! use tidyset::{quality::SuggestionEngine, transform::ApplyAll, Snapshot};
//!
//! let snapshot = Snapshot::from_csv_str("age,city\n25,NY\n30,\n,NY\n1000,LA\n").unwrap();
//!
//! let suggestions = SuggestionEngine::new().suggest(&snapshot);
//! assert_eq!(suggestions.len(), 2);
//!
//! let (cleaned, applied) = ApplyAll::new().run(&snapshot).unwrap();
//! assert_eq!(applied.len(), 2);
//! assert_eq!(cleaned.total_missing(), 0);
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
// Allow common test patterns
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::cast_lossless,
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::redundant_clone,
        clippy::too_many_lines,
        clippy::float_cmp,
        clippy::unreadable_literal
    )
)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
/// CLI module for command-line interface
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod quality;
pub mod snapshot;
pub mod stats;
pub mod transform;
pub mod versioning;
pub mod workspace;

// Re-exports for convenience
pub use arrow::{
    array::RecordBatch,
    datatypes::{Schema, SchemaRef},
};
pub use backend::{BackendConfig, LocalBackend, MemoryBackend, StorageBackend};
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use quality::{
    IssueKind, QualityScore, QualityScorer, Suggestion, SuggestionEngine, SuggestionSeverity,
    Thresholds,
};
pub use snapshot::{Column, ColumnKind, CsvOptions, FileFormat, Snapshot};
pub use stats::{Analytics, ColumnStatistics, IqrRule};
pub use transform::{CleaningPlan, FillStrategy, OutlierAction, Transform};
pub use versioning::{VersionRecord, VersionStore};
pub use workspace::{CleaningScript, DataSource, Workspace};
