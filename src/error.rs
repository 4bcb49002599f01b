//! Error types for wheelfork

use thiserror::Error;

/// Main error type for patching operations
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid listing: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Command failed with code {code}: {command}")]
    Command { command: String, code: i32 },

    #[error("Malformed archive {archive}: {reason}")]
    MalformedArchive { archive: String, reason: String },

    #[error("Integrity check failed for {path}: expected {expected}, got {actual}")]
    Integrity {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Worker failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl PatchError {
    pub(crate) fn malformed(
        archive: impl AsRef<std::path::Path>,
        reason: impl Into<String>,
    ) -> Self {
        PatchError::MalformedArchive {
            archive: archive.as_ref().display().to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors related to RECORD file
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Invalid CSV: {0}")]
    InvalidCsv(String),

    #[error("Invalid digest: {0}")]
    InvalidDigest(String),
}

/// Result of validating RECORD entries against archive contents
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Individual validation error
#[derive(Debug)]
pub enum ValidationError {
    HashMismatch {
        path: String,
        expected: String,
        actual: String,
    },
    SizeMismatch {
        path: String,
        expected: Option<u64>,
        actual: u64,
    },
    MissingFile {
        path: String,
    },
    MissingEntry {
        path: String,
    },
}

impl From<ValidationError> for PatchError {
    fn from(error: ValidationError) -> Self {
        match error {
            ValidationError::HashMismatch {
                path,
                expected,
                actual,
            } => PatchError::Integrity {
                path,
                expected,
                actual,
            },
            ValidationError::SizeMismatch {
                path,
                expected,
                actual,
            } => PatchError::Integrity {
                path,
                expected: expected.map_or_else(|| "no size".to_string(), |s| s.to_string()),
                actual: actual.to_string(),
            },
            ValidationError::MissingFile { path } => PatchError::Integrity {
                path,
                expected: "file in archive".to_string(),
                actual: "missing".to_string(),
            },
            ValidationError::MissingEntry { path } => PatchError::Integrity {
                path,
                expected: "RECORD entry".to_string(),
                actual: "missing".to_string(),
            },
        }
    }
}
