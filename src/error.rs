// src/error.rs
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

/// Failures that end an ingestion run (or prevent one from starting).
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("scheduler error: {0}")]
    Schedule(String),
}

impl From<serde_json::Error> for IngestError {
    fn from(e: serde_json::Error) -> Self {
        IngestError::Parse(e.to_string())
    }
}

impl From<sqlx::Error> for IngestError {
    fn from(e: sqlx::Error) -> Self {
        IngestError::Storage(e.to_string())
    }
}

impl From<tokio_cron_scheduler::JobSchedulerError> for IngestError {
    fn from(e: tokio_cron_scheduler::JobSchedulerError) -> Self {
        IngestError::Schedule(format!("{:?}", e))
    }
}

impl From<csv::Error> for IngestError {
    fn from(e: csv::Error) -> Self {
        IngestError::Parse(e.to_string())
    }
}

/// A raw record that cannot be normalized at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("record has no CUSIP")]
    MissingCusip,

    #[error("record {cusip} has no auction date")]
    MissingAuctionDate { cusip: String },

    #[error("record {cusip} has unparsable auction date '{value}'")]
    InvalidAuctionDate { cusip: String, value: String },
}
