//! Error types for tidyset.

use std::path::PathBuf;

/// Result type alias for tidyset operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], used by callers that only need to
/// know whose fault a failure was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller supplied data or arguments that cannot be processed.
    InvalidInput,
    /// A dataset, version or key does not exist.
    NotFound,
    /// Storage or serialization failed underneath a valid request.
    Internal,
}

/// Errors that can occur in tidyset operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        /// The path where the error occurred, if known.
        path: Option<PathBuf>,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Arrow error while reading or reshaping tabular data.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error during import or export.
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Input could not be parsed as tabular data.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parse error.
        message: String,
    },

    /// Column not found in the snapshot.
    #[error("Column '{name}' not found in dataset")]
    ColumnNotFound {
        /// The name of the missing column.
        name: String,
    },

    /// Two columns share a name.
    #[error("Duplicate column name '{name}'")]
    DuplicateColumn {
        /// The repeated name.
        name: String,
    },

    /// A numeric-only operation was requested on a text column.
    #[error("Column '{column}' is not numeric")]
    NotNumeric {
        /// The offending column.
        column: String,
    },

    /// Columns of unequal length or otherwise inconsistent shape.
    #[error("Schema mismatch: {message}")]
    SchemaMismatch {
        /// Description of the schema mismatch.
        message: String,
    },

    /// Unsupported file format.
    #[error("Unsupported format: {format}")]
    UnsupportedFormat {
        /// The unsupported format name or extension.
        format: String,
    },

    /// Invalid argument such as an unknown issue name or a bad filename.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of the problem.
        message: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// Requested version index is past the end of the history.
    #[error("Version {index} not found for '{filename}' ({count} versions available)")]
    VersionNotFound {
        /// Dataset filename.
        filename: String,
        /// Requested position (0 = most recent).
        index: usize,
        /// Number of recorded versions.
        count: usize,
    },

    /// No upload or committed version exists for the filename.
    #[error("Dataset '{filename}' not found")]
    DatasetNotFound {
        /// Dataset filename.
        filename: String,
    },

    /// Backend storage error.
    #[error("Storage backend error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization error.
        message: String,
    },
}

impl Error {
    /// Create an I/O error with a path context.
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            path: Some(path.into()),
            source,
        }
    }

    /// Create an I/O error without path context.
    pub fn io_no_path(source: std::io::Error) -> Self {
        Self::Io { path: None, source }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a column not found error.
    pub fn column_not_found(name: impl Into<String>) -> Self {
        Self::ColumnNotFound { name: name.into() }
    }

    /// Create a not-numeric error.
    pub fn not_numeric(column: impl Into<String>) -> Self {
        Self::NotNumeric {
            column: column.into(),
        }
    }

    /// Create a schema mismatch error.
    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            message: message.into(),
        }
    }

    /// Create an unsupported format error.
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a dataset not found error.
    pub fn dataset_not_found(filename: impl Into<String>) -> Self {
        Self::DatasetNotFound {
            filename: filename.into(),
        }
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Arrow(_)
            | Self::Parquet(_)
            | Self::Parse { .. }
            | Self::ColumnNotFound { .. }
            | Self::DuplicateColumn { .. }
            | Self::NotNumeric { .. }
            | Self::SchemaMismatch { .. }
            | Self::UnsupportedFormat { .. }
            | Self::InvalidInput { .. }
            | Self::InvalidConfig { .. } => ErrorKind::InvalidInput,
            Self::VersionNotFound { .. } | Self::DatasetNotFound { .. } => ErrorKind::NotFound,
            Self::Io { .. } | Self::Storage { .. } | Self::Serialization { .. } => {
                ErrorKind::Internal
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}
