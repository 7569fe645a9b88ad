//! Record source abstraction layer
//!
//! The SQLite event log and JSON exports both implement `RecordSource`, so
//! the report pipeline never cares where records come from.

pub(crate) mod json;
pub(crate) mod loader;
pub(crate) mod sqlite;

use crate::core::UsageRecord;
use crate::error::StoreError;

/// Data source trait - implemented by each record backend
pub(crate) trait RecordSource {
    /// Short name used in log lines
    fn name(&self) -> &'static str;

    /// Fetch every record with a successful terminal status.
    ///
    /// `Ok(None)` means the backend answered without a record set at all,
    /// which is different from an empty one.
    fn fetch_successful(&self) -> Result<Option<Vec<UsageRecord>>, StoreError>;
}

pub(crate) use json::JsonFileSource;
pub(crate) use loader::{LoadResult, load_report};
pub(crate) use sqlite::{NewRecord, UsageDb};
