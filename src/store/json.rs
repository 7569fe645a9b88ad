//! Exported record sets (JSON array of `UsageRecord`)

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use crate::core::UsageRecord;
use crate::error::StoreError;
use crate::store::RecordSource;

/// Read records from a JSON export.
///
/// A document that is literally `null` is an absent response, not an empty one.
pub(crate) struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for JsonFileSource {
    fn name(&self) -> &'static str {
        "json"
    }

    fn fetch_successful(&self) -> Result<Option<Vec<UsageRecord>>, StoreError> {
        let file = File::open(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        let parsed: Option<Vec<UsageRecord>> = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| StoreError::Json {
                path: self.path.clone(),
                source,
            })?;
        Ok(parsed.map(|records| records.into_iter().filter(UsageRecord::is_success).collect()))
    }
}
