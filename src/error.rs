use chrono::{NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

/// Broad classification of a failure, used to report why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A field could not be parsed or a required value is blank.
    MalformedInput,
    /// The data parsed fine but contradicts itself.
    Consistency,
    /// The file system, configuration or runtime got in the way.
    Environment,
}

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Missing required field '{field}' on line {line}")]
    MissingField { field: &'static str, line: u64 },

    #[error("Invalid quality code: {0}")]
    InvalidQualityCode(String),

    #[error("Unknown department: {0}")]
    UnknownDepartment(u8),

    #[error("Station {station_id} appears more than once in the registry")]
    DuplicateStation { station_id: u32 },

    #[error("Station {station_id} has an empty validity interval [{from}, {to})")]
    InvalidStationInterval {
        station_id: u32,
        from: NaiveDate,
        to: NaiveDate,
    },

    #[error("Inferred station {station_id} reported with conflicting {field}: '{expected}' vs '{found}'")]
    InconsistentStation {
        station_id: u32,
        field: &'static str,
        expected: String,
        found: String,
    },

    #[error("Duplicate observation for station {station_id} at {timestamp}")]
    DuplicateObservation {
        station_id: u32,
        timestamp: NaiveDateTime,
    },

    #[error("Observation at {timestamp} lies outside period {period}")]
    OutsidePeriod {
        timestamp: NaiveDateTime,
        period: String,
    },

    #[error("Observation timestamp {timestamp} is not on the hour")]
    NotOnTheHour { timestamp: NaiveDateTime },

    #[error("Quality code mismatch for station {station_id} at {timestamp}: {message}")]
    QualityMismatch {
        station_id: u32,
        timestamp: NaiveDateTime,
        message: String,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Output directory {} does not exist", .path.display())]
    OutputMissing { path: PathBuf },

    #[error("{} is not a directory", .path.display())]
    OutputNotDirectory { path: PathBuf },

    #[error("Output directory {} is not empty", .path.display())]
    OutputNotEmpty { path: PathBuf },

    #[error("No observation writer is open for period {period}")]
    WriterNotOpen { period: String },

    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Error while processing {}: {source}", .path.display())]
    Shard {
        path: PathBuf,
        #[source]
        source: Box<ProcessingError>,
    },
}

impl ProcessingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProcessingError::Csv(_)
            | ProcessingError::InvalidFormat(_)
            | ProcessingError::MissingField { .. }
            | ProcessingError::InvalidQualityCode(_)
            | ProcessingError::UnknownDepartment(_) => ErrorKind::MalformedInput,

            ProcessingError::DuplicateStation { .. }
            | ProcessingError::InvalidStationInterval { .. }
            | ProcessingError::InconsistentStation { .. }
            | ProcessingError::DuplicateObservation { .. }
            | ProcessingError::OutsidePeriod { .. }
            | ProcessingError::NotOnTheHour { .. }
            | ProcessingError::QualityMismatch { .. }
            | ProcessingError::Validation(_) => ErrorKind::Consistency,

            ProcessingError::Io(_)
            | ProcessingError::OutputMissing { .. }
            | ProcessingError::OutputNotDirectory { .. }
            | ProcessingError::OutputNotEmpty { .. }
            | ProcessingError::WriterNotOpen { .. }
            | ProcessingError::LockPoisoned(_)
            | ProcessingError::Config(_)
            | ProcessingError::Settings(_)
            | ProcessingError::Json(_)
            | ProcessingError::TaskJoin(_) => ErrorKind::Environment,

            ProcessingError::Shard { source, .. } => source.kind(),
        }
    }

    /// Attach the location of the shard being processed.
    pub fn in_shard(self, path: &Path) -> Self {
        match self {
            already @ ProcessingError::Shard { .. } => already,
            other => ProcessingError::Shard {
                path: path.to_path_buf(),
                source: Box::new(other),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_context_keeps_kind() {
        let error = ProcessingError::DuplicateStation { station_id: 1 }
            .in_shard(Path::new("H_01_2000-2009.csv.gz"));

        assert_eq!(error.kind(), ErrorKind::Consistency);
        assert!(error.to_string().contains("H_01_2000-2009.csv.gz"));

        // Wrapping twice keeps the innermost location
        let rewrapped = error.in_shard(Path::new("other.csv.gz"));
        assert!(rewrapped.to_string().contains("H_01_2000-2009.csv.gz"));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ProcessingError::InvalidFormat("x".to_string()).kind(),
            ErrorKind::MalformedInput
        );
        assert_eq!(
            ProcessingError::OutputNotEmpty {
                path: PathBuf::from("out")
            }
            .kind(),
            ErrorKind::Environment
        );
    }
}
