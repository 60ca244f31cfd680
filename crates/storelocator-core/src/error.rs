use std::path::PathBuf;

use thiserror::Error;

use crate::models::DayOfWeek;
use crate::pipeline::LoadReport;

/// Boxed error returned by a sink implementation.
pub type SinkError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while resolving the load configuration. All of these are
/// reported before any network or file I/O beyond the settings file itself.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("data file is missing or does not exist: {0}")]
    MissingDataFile(String),

    #[error("dataset is missing")]
    MissingDataset,

    #[error("table name is missing")]
    MissingTable,

    #[error("{key} is not set; pass --{flag}, set {env}, or add `{key}` to the config file")]
    MissingSetting {
        key: &'static str,
        flag: &'static str,
        env: &'static str,
    },

    #[error("batch size must be a positive integer, got {0}")]
    InvalidBatchSize(i64),

    #[error("cannot determine the configuration directory: HOME is not set")]
    NoConfigDir,

    #[error("failed to read config file {path}: {source}")]
    SettingsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    SettingsFileParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// A single hours cell that is neither empty nor an `open-close` pair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HoursError {
    #[error("malformed hours for {day}: {value:?} (expected empty or \"open-close\")")]
    Malformed { day: DayOfWeek, value: String },
}

/// A data row that cannot be turned into a store record. `row` is the
/// 1-based line number in the input file (the header is line 1).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("row {row}: expected {expected} fields, found {actual}")]
    FieldCount {
        row: u64,
        expected: usize,
        actual: usize,
    },

    #[error("row {row}: {source}")]
    Hours {
        row: u64,
        #[source]
        source: HoursError,
    },
}

/// Errors raised while reading the input file.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to open data file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Row(#[from] RowError),
}

/// Errors raised by [`crate::run_load`]. Insert and publish failures carry
/// the progress made before the failing batch.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to prepare warehouse dataset/table: {source}")]
    Prepare {
        #[source]
        source: SinkError,
    },

    #[error("warehouse insert failed on batch {batch} of {total_batches} after {completed}: {source}")]
    Insert {
        batch: usize,
        total_batches: usize,
        completed: LoadReport,
        #[source]
        source: SinkError,
    },

    #[error("publish failed on batch {batch} of {total_batches} after {completed}: {source}")]
    Publish {
        batch: usize,
        total_batches: usize,
        completed: LoadReport,
        #[source]
        source: SinkError,
    },
}

impl LoadError {
    /// Batches that were fully inserted and published before the failure.
    #[must_use]
    pub fn completed(&self) -> LoadReport {
        match self {
            LoadError::Prepare { .. } => LoadReport::default(),
            LoadError::Insert { completed, .. } | LoadError::Publish { completed, .. } => {
                *completed
            }
        }
    }
}
