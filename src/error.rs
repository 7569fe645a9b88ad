use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("Inconsistent endpoint for app '{app_name}'")]
    InconsistentEndpoint { app_name: String },

    #[error("No records found")]
    NoRecords,

    #[error("No app records found for '{app_name}'")]
    NoAppRecords { app_name: String },

    #[error("Invalid elapsed time \"{input}\" (expected a non-negative number of seconds, e.g. 1.5s)")]
    InvalidElapsed { input: String },

    #[error("Invalid timezone: {input}")]
    InvalidTimezone { input: String },

    #[error("Unsupported locale: {input}")]
    UnsupportedLocale { input: String },

    #[error("Cannot determine a database location; pass --db or set TOOLSTATS_DB")]
    NoDatabasePath,

    #[error("{0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid status \"{value}\" on record {id}")]
    InvalidStatus { id: i64, value: String },

    #[error("Invalid timestamp \"{value}\" on record {id}")]
    InvalidTimestamp { id: i64, value: String },

    #[error("No record {id} for task '{task_id}'")]
    NotFound { id: i64, task_id: String },

    #[error("Record {id} already completed with status {status}")]
    AlreadyCompleted { id: i64, status: String },
}
