//! Upload, inspect, clean and version datasets by filename.
//!
//! A [`Workspace`] pairs the uploaded original of each dataset (stored under
//! `raw/<filename>`) with its [`VersionStore`] history. Reads go to the
//! latest cleaned copy when one exists and fall back to the original;
//! every cleaning operation transforms that current data and commits the
//! result as a new version.

use std::{fmt::Write, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    backend::{create_backend, StorageBackend},
    config::Config,
    error::{Error, Result},
    quality::{
        diagnose_with, DiagnosisReport, IssueKind, QualityScore, QualityScorer, Suggestion,
        SuggestionEngine, Thresholds,
    },
    snapshot::{ColumnKind, FileFormat, Snapshot},
    stats::{Analytics, ColumnStatistics},
    transform::{ApplyAll, ApplySuggestion, CleaningPlan, Transform},
    versioning::{
        decode_snapshot, encode_snapshot, split_filename, validate_filename, Clock, VersionRecord,
        VersionStore,
    },
};

const RAW_PREFIX: &str = "raw/";

/// Which copy of a dataset an operation read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// The uploaded file; nothing was committed since.
    Original,
    /// The latest committed version.
    Cleaned,
}

impl DataSource {
    /// Lowercase label, as serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Cleaned => "cleaned",
        }
    }
}

/// Everything known about a dataset's current data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Dataset filename.
    pub filename: String,
    /// Copy the report describes.
    pub data_source: DataSource,
    /// Per-column health.
    pub diagnosis: DiagnosisReport,
    /// Column statistics.
    pub analytics: Analytics,
    /// Open suggestions.
    pub suggestions: Vec<Suggestion>,
    /// Score of the original upload.
    pub before_score: QualityScore,
    /// Score of the current data.
    pub after_score: QualityScore,
}

/// Headline numbers of one copy of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub columns: usize,
    /// Missing cells.
    pub missing_cells: usize,
    /// Duplicate rows.
    pub duplicate_rows: usize,
    /// IQR outliers over all numeric columns.
    pub outlier_cells: usize,
    /// Quality score.
    pub score: QualityScore,
}

/// Original versus current data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// The uploaded file.
    pub original: DatasetSummary,
    /// The current data.
    pub current: DatasetSummary,
}

/// Shareable analytics document without row data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsExport {
    /// Dataset filename.
    pub filename: String,
    /// Copy the analytics describe.
    pub data_source: DataSource,
    /// Column statistics of the current data.
    pub analytics: Analytics,
    /// Score of the original upload.
    pub before_score: QualityScore,
    /// Score of the current data.
    pub after_score: QualityScore,
}

impl AnalyticsExport {
    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A pandas script that reproduces "apply all" on the uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleaningScript {
    /// Suggested file name, `<stem>_cleaning.py`.
    pub name: String,
    /// Python source.
    pub source: String,
}

/// Datasets and their version histories in one storage backend.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use tidyset::{backend::MemoryBackend, quality::IssueKind, Workspace};
///
/// let workspace = Workspace::new(Arc::new(MemoryBackend::new()));
/// workspace
///     .upload_bytes("people.csv", b"age,city\n25,NY\n30,\n,NY\n1000,LA\n")
///     .unwrap();
///
/// workspace
///     .apply_suggestion("people.csv", IssueKind::MissingValues, "age")
///     .unwrap();
/// let versions = workspace.versions("people.csv").unwrap();
/// assert_eq!(versions[0].action, "Applied missing_values fix on age");
/// ```
pub struct Workspace {
    backend: Arc<dyn StorageBackend>,
    versions: VersionStore,
    thresholds: Thresholds,
}

impl Workspace {
    /// Creates a workspace on `backend` with default thresholds.
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            versions: VersionStore::new(Arc::clone(&backend)),
            backend,
            thresholds: Thresholds::default(),
        }
    }

    /// Creates the backend and thresholds described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the backend
    /// cannot be created.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let backend: Arc<dyn StorageBackend> = Arc::from(create_backend(config.backend_config())?);
        Ok(Self::new(backend).with_thresholds(config.thresholds))
    }

    /// Uses custom thresholds.
    #[must_use]
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Uses a custom commit clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.versions = self.versions.with_clock(clock);
        self
    }

    /// The thresholds in use.
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// The underlying version store.
    pub fn version_store(&self) -> &VersionStore {
        &self.versions
    }

    // ═══════════════════════════════════════════════════════════════════
    // Datasets
    // ═══════════════════════════════════════════════════════════════════

    /// Stores `snapshot` as the original of `filename`. A previous cleaned
    /// copy is forgotten; its history is kept.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid filenames or if storage fails.
    pub fn upload(&self, filename: &str, snapshot: &Snapshot) -> Result<()> {
        validate_filename(filename)?;
        self.backend
            .put(&raw_key(filename), encode_snapshot(filename, snapshot)?)?;
        self.versions.clear_latest(filename)?;
        tracing::info!(
            filename,
            rows = snapshot.num_rows(),
            columns = snapshot.num_columns(),
            "uploaded dataset"
        );
        Ok(())
    }

    /// Parses `data` in the format implied by the extension of `filename`
    /// and uploads it.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown extensions, unparseable data, invalid
    /// filenames or storage failures.
    pub fn upload_bytes(&self, filename: &str, data: &[u8]) -> Result<Snapshot> {
        validate_filename(filename)?;
        let snapshot = Snapshot::from_bytes(data, FileFormat::from_path(filename)?)?;
        self.upload(filename, &snapshot)?;
        Ok(snapshot)
    }

    /// Filenames of all uploaded datasets, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    pub fn datasets(&self) -> Result<Vec<String>> {
        Ok(self
            .backend
            .list(RAW_PREFIX)?
            .into_iter()
            .filter_map(|key| key.strip_prefix(RAW_PREFIX).map(str::to_string))
            .collect())
    }

    /// The uploaded original of `filename`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatasetNotFound`] if nothing was uploaded.
    pub fn original(&self, filename: &str) -> Result<Snapshot> {
        validate_filename(filename)?;
        let data = self
            .backend
            .try_get(&raw_key(filename))?
            .ok_or_else(|| Error::dataset_not_found(filename))?;
        decode_snapshot(filename, &data)
    }

    /// The latest cleaned copy if there is one, else the original.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatasetNotFound`] if neither exists.
    pub fn current(&self, filename: &str) -> Result<(Snapshot, DataSource)> {
        match self.versions.try_latest(filename)? {
            Some(latest) => Ok((latest, DataSource::Cleaned)),
            None => Ok((self.original(filename)?, DataSource::Original)),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Inspection
    // ═══════════════════════════════════════════════════════════════════

    fn scorer(&self) -> QualityScorer {
        QualityScorer::new().with_rule(self.thresholds.rule())
    }

    fn statistics(&self) -> ColumnStatistics {
        ColumnStatistics::new().with_rule(self.thresholds.rule())
    }

    /// Quality score of the current data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatasetNotFound`] for unknown datasets.
    pub fn score(&self, filename: &str) -> Result<QualityScore> {
        let (snapshot, _) = self.current(filename)?;
        Ok(self.scorer().score(&snapshot))
    }

    /// Suggestions for the current data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatasetNotFound`] for unknown datasets.
    pub fn suggestions(&self, filename: &str) -> Result<Vec<Suggestion>> {
        let (snapshot, _) = self.current(filename)?;
        Ok(SuggestionEngine::new()
            .with_thresholds(self.thresholds)
            .suggest(&snapshot))
    }

    /// Column statistics of the current data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatasetNotFound`] for unknown datasets.
    pub fn analytics(&self, filename: &str) -> Result<Analytics> {
        let (snapshot, _) = self.current(filename)?;
        Ok(self.statistics().analyze(&snapshot))
    }

    /// Diagnosis of the current data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatasetNotFound`] for unknown datasets.
    pub fn diagnose(&self, filename: &str) -> Result<DiagnosisReport> {
        let (snapshot, _) = self.current(filename)?;
        Ok(diagnose_with(&snapshot, &self.thresholds))
    }

    /// Full report on the current data, with the original's score for
    /// comparison.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatasetNotFound`] for unknown datasets.
    pub fn report(&self, filename: &str) -> Result<Report> {
        let original = self.original(filename)?;
        let (current, data_source) = self.current(filename)?;
        let scorer = self.scorer();

        Ok(Report {
            filename: filename.to_string(),
            data_source,
            diagnosis: diagnose_with(&current, &self.thresholds),
            analytics: self.statistics().analyze(&current),
            suggestions: SuggestionEngine::new()
                .with_thresholds(self.thresholds)
                .suggest(&current),
            before_score: scorer.score(&original),
            after_score: scorer.score(&current),
        })
    }

    fn summarize(&self, snapshot: &Snapshot) -> DatasetSummary {
        let counts = self.scorer().counts(snapshot);
        DatasetSummary {
            rows: counts.rows,
            columns: counts.columns,
            missing_cells: counts.missing_cells,
            duplicate_rows: counts.duplicate_rows,
            outlier_cells: counts.outlier_cells,
            score: counts.score(),
        }
    }

    /// Summaries of the original and the current data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatasetNotFound`] for unknown datasets.
    pub fn compare(&self, filename: &str) -> Result<Comparison> {
        let original = self.original(filename)?;
        let (current, _) = self.current(filename)?;
        Ok(Comparison {
            original: self.summarize(&original),
            current: self.summarize(&current),
        })
    }

    /// Analytics and scores without any row data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatasetNotFound`] for unknown datasets.
    pub fn export_analytics(&self, filename: &str) -> Result<AnalyticsExport> {
        let original = self.original(filename)?;
        let (current, data_source) = self.current(filename)?;
        let scorer = self.scorer();
        Ok(AnalyticsExport {
            filename: filename.to_string(),
            data_source,
            analytics: self.statistics().analyze(&current),
            before_score: scorer.score(&original),
            after_score: scorer.score(&current),
        })
    }

    /// A pandas script applying the fixes suggested for the original upload,
    /// in the order "apply all" uses.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatasetNotFound`] for unknown datasets.
    pub fn export_script(&self, filename: &str) -> Result<CleaningScript> {
        let original = self.original(filename)?;
        let suggestions = SuggestionEngine::new()
            .with_thresholds(self.thresholds)
            .suggest(&original);
        let k = self.thresholds.iqr_multiplier;

        let read = match FileFormat::from_path(filename) {
            Ok(FileFormat::Parquet) => "read_parquet",
            Ok(FileFormat::JsonLines) => "read_json",
            _ => "read_csv",
        };
        let lines = if read == "read_json" { ", lines=True" } else { "" };

        let mut source = String::from("import pandas as pd\n\n");
        let _ = writeln!(source, "df = pd.{read}({}{lines})", py_literal(filename)?);
        source.push_str("\n# Cleaning steps\n");

        for suggestion in &suggestions {
            let col = py_literal(&suggestion.column)?;
            let _ = match suggestion.issue {
                IssueKind::MissingValues => {
                    let idx = original.column_index(&suggestion.column)?;
                    if original.kind(idx) == ColumnKind::Numeric {
                        writeln!(source, "df[{col}] = df[{col}].fillna(df[{col}].median())")
                    } else {
                        writeln!(source, "df[{col}] = df[{col}].fillna(df[{col}].mode().iloc[0])")
                    }
                }
                IssueKind::Duplicates => writeln!(source, "df = df.drop_duplicates()"),
                IssueKind::Datatype => {
                    writeln!(source, "df[{col}] = pd.to_numeric(df[{col}], errors=\"coerce\")")
                }
                IssueKind::Outliers => writeln!(
                    source,
                    "q1, q3 = df[{col}].quantile([0.25, 0.75])\n\
                     df[{col}] = df[{col}].clip(q1 - {k} * (q3 - q1), q3 + {k} * (q3 - q1))"
                ),
            };
        }

        source.push_str("\ndf.to_csv(\"cleaned_output.csv\", index=False)\n");
        let (stem, _) = split_filename(filename);
        Ok(CleaningScript {
            name: format!("{stem}_cleaning.py"),
            source,
        })
    }

    /// CSV bytes of the current data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatasetNotFound`] for unknown datasets.
    pub fn download(&self, filename: &str) -> Result<Vec<u8>> {
        let (snapshot, _) = self.current(filename)?;
        snapshot.to_csv_bytes()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Cleaning
    // ═══════════════════════════════════════════════════════════════════

    /// Applies `transform` to the current data and commits the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset is unknown, the transform fails or
    /// the commit fails.
    pub fn apply<T: Transform + ?Sized>(&self, filename: &str, transform: &T) -> Result<VersionRecord> {
        let (snapshot, source) = self.current(filename)?;
        let cleaned = transform.apply(&snapshot)?;
        let action = transform.describe();
        tracing::debug!(filename, ?source, %action, "applying transform");
        self.versions.commit(filename, &cleaned, &action)
    }

    /// Fixes one suggested issue and commits the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset or column is unknown or the fix does
    /// not apply to the column.
    pub fn apply_suggestion(
        &self,
        filename: &str,
        issue: IssueKind,
        column: &str,
    ) -> Result<VersionRecord> {
        let fix = ApplySuggestion::new(issue, column).with_rule(self.thresholds.rule());
        self.apply(filename, &fix)
    }

    /// Applies every current suggestion and commits one version. Returns the
    /// record and the suggestions that were applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset is unknown or a fix fails.
    pub fn apply_all(&self, filename: &str) -> Result<(VersionRecord, Vec<Suggestion>)> {
        let (snapshot, _) = self.current(filename)?;
        let all = ApplyAll::new().with_thresholds(self.thresholds);
        let (cleaned, applied) = all.run(&snapshot)?;
        let record = self.versions.commit(filename, &cleaned, &all.describe())?;
        Ok((record, applied))
    }

    /// Runs a cleaning plan on the current data and commits the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset is unknown or a step fails.
    pub fn clean(&self, filename: &str, plan: &CleaningPlan) -> Result<VersionRecord> {
        let plan = plan.with_rule(self.thresholds.rule());
        self.apply(filename, &plan)
    }

    // ═══════════════════════════════════════════════════════════════════
    // History
    // ═══════════════════════════════════════════════════════════════════

    /// Version records, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be read.
    pub fn versions(&self, filename: &str) -> Result<Vec<VersionRecord>> {
        self.versions.list_versions(filename)
    }

    /// The snapshot of version `index` (0 = newest).
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionNotFound`] if `index` is out of range.
    pub fn load_version(&self, filename: &str, index: usize) -> Result<Snapshot> {
        self.versions.load_version(filename, index)
    }

    /// Makes version `index` current again without a new history entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionNotFound`] if `index` is out of range.
    pub fn undo(&self, filename: &str, index: usize) -> Result<VersionRecord> {
        self.versions.revert(filename, index)
    }
}

fn raw_key(filename: &str) -> String {
    format!("{RAW_PREFIX}{filename}")
}

/// A Python string literal for `value`. JSON string escapes are valid
/// Python escapes.
fn py_literal(value: &str) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{
        backend::MemoryBackend,
        snapshot::Column,
        transform::{FillStrategy, OutlierAction},
        versioning::FixedClock,
    };

    const PEOPLE: &[u8] = b"age,city\n25,NY\n30,\n,NY\n1000,LA\n";

    fn workspace() -> Workspace {
        let at = NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(7, 5, 1))
            .expect("valid timestamp");
        Workspace::new(Arc::new(MemoryBackend::new())).with_clock(Arc::new(FixedClock(at)))
    }

    #[test]
    fn test_upload_and_current() {
        let ws = workspace();
        let snapshot = ws.upload_bytes("people.csv", PEOPLE).expect("upload");
        let (current, source) = ws.current("people.csv").expect("current");
        assert_eq!(source, DataSource::Original);
        assert_eq!(current, snapshot);
        assert_eq!(ws.datasets().expect("list"), vec!["people.csv"]);
    }

    #[test]
    fn test_unknown_dataset() {
        let ws = workspace();
        let err = ws.current("nope.csv").expect_err("missing");
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
        assert!(ws.report("nope.csv").is_err());
    }

    #[test]
    fn test_upload_unsupported_extension() {
        let ws = workspace();
        let err = ws.upload_bytes("people.xlsx", PEOPLE).expect_err("format");
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_report_before_and_after() {
        let ws = workspace();
        ws.upload_bytes("people.csv", PEOPLE).expect("upload");

        let report = ws.report("people.csv").expect("report");
        assert_eq!(report.data_source, DataSource::Original);
        assert_eq!(report.suggestions.len(), 2);
        assert_eq!(report.before_score, report.after_score);
        assert_eq!(report.before_score.total, 93.8);

        ws.apply_all("people.csv").expect("apply all");
        let report = ws.report("people.csv").expect("report");
        assert_eq!(report.data_source, DataSource::Cleaned);
        // filling makes rows 2 and 3 equal and narrows the age quartiles
        let issues: Vec<_> = report.suggestions.iter().map(|s| s.issue).collect();
        assert_eq!(issues, vec![IssueKind::Duplicates, IssueKind::Outliers]);
        assert_eq!(report.after_score.completeness, 25.0);
        assert_eq!(report.before_score.total, 93.8);
    }

    #[test]
    fn test_apply_suggestion_commits_on_current() {
        let ws = workspace();
        ws.upload_bytes("people.csv", PEOPLE).expect("upload");

        ws.apply_suggestion("people.csv", IssueKind::MissingValues, "age")
            .expect("age");
        ws.apply_suggestion("people.csv", IssueKind::MissingValues, "city")
            .expect("city");

        let (current, _) = ws.current("people.csv").expect("current");
        assert_eq!(current.total_missing(), 0);
        assert_eq!(
            current.column("age").expect("age"),
            Column::numeric([Some(25.0), Some(30.0), Some(30.0), Some(1000.0)])
        );

        let versions = ws.versions("people.csv").expect("versions");
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].action, "Applied missing_values fix on city");
        assert_eq!(versions[1].action, "Applied missing_values fix on age");
    }

    #[test]
    fn test_apply_suggestion_bad_column() {
        let ws = workspace();
        ws.upload_bytes("people.csv", PEOPLE).expect("upload");
        let err = ws
            .apply_suggestion("people.csv", IssueKind::Outliers, "city")
            .expect_err("text");
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidInput);
        assert!(ws.versions("people.csv").expect("versions").is_empty());
    }

    #[test]
    fn test_clean_with_plan() {
        let ws = workspace();
        ws.upload_bytes("people.csv", PEOPLE).expect("upload");
        let plan = CleaningPlan::new()
            .fill_missing(FillStrategy::Mean)
            .outliers(OutlierAction::Cap)
            .remove_duplicates(true);
        let record = ws.clean("people.csv", &plan).expect("clean");
        assert_eq!(record.action, "Custom cleaning applied");
        assert_eq!(record.rows, 4);

        let (current, _) = ws.current("people.csv").expect("current");
        // city is text and keeps its missing cell
        assert_eq!(current.total_missing(), 1);
    }

    #[test]
    fn test_clean_starts_from_current_data() {
        let ws = workspace();
        ws.upload_bytes("people.csv", PEOPLE).expect("upload");
        ws.apply_suggestion("people.csv", IssueKind::MissingValues, "city")
            .expect("city");

        let plan = CleaningPlan::new()
            .fill_missing(FillStrategy::Median)
            .remove_duplicates(true);
        let record = ws.clean("people.csv", &plan).expect("clean");

        // the filled city survives and the filled age makes (30, NY) a duplicate
        let (current, _) = ws.current("people.csv").expect("current");
        assert_eq!(current.total_missing(), 0);
        assert_eq!(record.rows, 3);
        assert_eq!(ws.versions("people.csv").expect("versions").len(), 2);
    }

    #[test]
    fn test_undo_and_reupload() {
        let ws = workspace();
        ws.upload_bytes("people.csv", PEOPLE).expect("upload");
        ws.apply_suggestion("people.csv", IssueKind::MissingValues, "age")
            .expect("age");
        ws.apply_suggestion("people.csv", IssueKind::MissingValues, "city")
            .expect("city");

        ws.undo("people.csv", 1).expect("undo");
        let (current, source) = ws.current("people.csv").expect("current");
        assert_eq!(source, DataSource::Cleaned);
        assert_eq!(current.total_missing(), 1);
        assert_eq!(ws.versions("people.csv").expect("versions").len(), 2);

        ws.upload_bytes("people.csv", PEOPLE).expect("reupload");
        let (_, source) = ws.current("people.csv").expect("current");
        assert_eq!(source, DataSource::Original);
        assert_eq!(ws.versions("people.csv").expect("versions").len(), 2);
    }

    #[test]
    fn test_compare_and_export() {
        let ws = workspace();
        ws.upload_bytes("people.csv", PEOPLE).expect("upload");
        ws.apply_all("people.csv").expect("apply all");

        let comparison = ws.compare("people.csv").expect("compare");
        assert_eq!(comparison.original.missing_cells, 2);
        assert_eq!(comparison.current.missing_cells, 0);
        assert_eq!(comparison.original.rows, 4);

        let export = ws.export_analytics("people.csv").expect("export");
        let json = export.to_json().expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(value["filename"], "people.csv");
        assert_eq!(value["data_source"], "cleaned");
        assert!(value["analytics"]["columns"].is_array());
    }

    #[test]
    fn test_export_script_fills_suggested_columns() {
        let ws = workspace();
        ws.upload_bytes("people.csv", PEOPLE).expect("upload");
        ws.apply_all("people.csv").expect("apply all");

        // built from the original upload, not the cleaned data
        let script = ws.export_script("people.csv").expect("script");
        assert_eq!(script.name, "people_cleaning.py");
        assert_eq!(
            script.source,
            "import pandas as pd\n\
             \n\
             df = pd.read_csv(\"people.csv\")\n\
             \n\
             # Cleaning steps\n\
             df[\"age\"] = df[\"age\"].fillna(df[\"age\"].median())\n\
             df[\"city\"] = df[\"city\"].fillna(df[\"city\"].mode().iloc[0])\n\
             \n\
             df.to_csv(\"cleaned_output.csv\", index=False)\n"
        );
    }

    #[test]
    fn test_export_script_quotes_column_names() {
        let ws = workspace();
        ws.upload_bytes("odd.csv", b"it's,n\nx,1\n,2\n")
            .expect("upload");
        let script = ws.export_script("odd.csv").expect("script");
        assert!(script.source.contains("df[\"it's\"].mode()"), "{}", script.source);
        assert!(ws.export_script("missing.csv").is_err());
    }

    #[test]
    fn test_download_is_csv_of_current() {
        let ws = workspace();
        ws.upload_bytes("people.csv", PEOPLE).expect("upload");
        ws.apply_all("people.csv").expect("apply all");
        let csv = ws.download("people.csv").expect("download");
        let reloaded = Snapshot::from_csv_bytes(&csv).expect("reload");
        assert_eq!(reloaded.total_missing(), 0);
        assert_eq!(reloaded.num_rows(), 4);
    }

    #[test]
    fn test_thresholds_flow_into_suggestions() {
        let ws = workspace().with_thresholds(Thresholds {
            high_missing_percent: 50.0,
            ..Thresholds::default()
        });
        ws.upload_bytes("people.csv", PEOPLE).expect("upload");
        let suggestions = ws.suggestions("people.csv").expect("suggest");
        assert!(suggestions
            .iter()
            .all(|s| s.severity == crate::quality::SuggestionSeverity::Medium));
    }
}
