//! SQLite-backed usage event log
//!
//! Records are written in two phases: `create_pending` when a tool run
//! starts, `complete` when it finishes. Reads only ever see successful rows.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Deserialize;
use std::path::Path;

use crate::core::{RunStatus, UsageRecord};
use crate::error::StoreError;
use crate::store::RecordSource;

const MIGRATION_0001: &str = r#"
CREATE TABLE IF NOT EXISTS usage_record (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    app_name     TEXT NOT NULL,
    endpoint     TEXT NOT NULL,
    elapsed_time TEXT,
    status       TEXT NOT NULL DEFAULT 'submitted',
    task_id      TEXT NOT NULL DEFAULT '',
    created_at   TEXT NOT NULL,
    updated_at   TEXT
);
CREATE INDEX IF NOT EXISTS idx_usage_record_status ON usage_record(status, created_at);
CREATE INDEX IF NOT EXISTS idx_usage_record_app ON usage_record(app_name);
"#;

const MIGRATION_0002: &str = r#"
CREATE INDEX IF NOT EXISTS idx_usage_record_task ON usage_record(task_id);
"#;

const MIGRATIONS: &[(&str, &str)] = &[
    ("0001_init", MIGRATION_0001),
    ("0002_task_index", MIGRATION_0002),
];

const RECORD_COLUMNS: &str =
    "id, app_name, endpoint, elapsed_time, status, task_id, created_at";

/// A finished record to import as-is
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct NewRecord {
    pub(crate) app_name: String,
    pub(crate) endpoint: String,
    #[serde(default)]
    pub(crate) elapsed_time: Option<String>,
    pub(crate) status: RunStatus,
    pub(crate) created_at: DateTime<Utc>,
    #[serde(default)]
    pub(crate) task_id: String,
}

/// Row exactly as stored, before status/timestamp validation
struct StoredRow {
    id: i64,
    app_name: String,
    endpoint: String,
    elapsed_time: Option<String>,
    status: String,
    task_id: String,
    created_at: String,
}

impl StoredRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(StoredRow {
            id: row.get(0)?,
            app_name: row.get(1)?,
            endpoint: row.get(2)?,
            elapsed_time: row.get(3)?,
            status: row.get(4)?,
            task_id: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn into_record(self) -> Result<UsageRecord, StoreError> {
        let status = self
            .status
            .parse::<RunStatus>()
            .map_err(|value| StoreError::InvalidStatus { id: self.id, value })?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|_| StoreError::InvalidTimestamp {
                id: self.id,
                value: self.created_at.clone(),
            })?
            .with_timezone(&Utc);
        Ok(UsageRecord {
            id: self.id,
            app_name: self.app_name,
            endpoint: self.endpoint,
            elapsed_time: self.elapsed_time,
            status,
            created_at,
            task_id: self.task_id,
        })
    }
}

fn timestamp(dt: DateTime<Utc>) -> String {
    // Fixed-width UTC so lexical order == chronological order
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) struct UsageDb {
    conn: Connection,
}

impl UsageDb {
    pub(crate) fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        tracing::debug!(path = %path.display(), "opening usage database");
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            "#,
        )?;
        let mut db = UsageDb { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_migration (name TEXT PRIMARY KEY, applied_at TEXT NOT NULL);",
        )?;
        for (name, sql) in MIGRATIONS {
            let applied: Option<String> = tx
                .query_row(
                    "SELECT name FROM schema_migration WHERE name = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .optional()?;
            if applied.is_some() {
                continue;
            }
            tracing::debug!(migration = *name, "applying migration");
            tx.execute_batch(sql)?;
            tx.execute(
                "INSERT INTO schema_migration (name, applied_at) VALUES (?1, ?2)",
                params![name, timestamp(Utc::now())],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Phase one: record that a run started
    pub(crate) fn create_pending(
        &self,
        app_name: &str,
        endpoint: &str,
        task_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<UsageRecord, StoreError> {
        self.conn.execute(
            "INSERT INTO usage_record (app_name, endpoint, status, task_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                app_name,
                endpoint,
                RunStatus::Submitted.as_str(),
                task_id,
                timestamp(created_at)
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.find(id, task_id)?.ok_or_else(|| StoreError::NotFound {
            id,
            task_id: task_id.to_string(),
        })
    }

    /// Phase two: store the final status and elapsed time.
    ///
    /// Repeating an identical completion is a no-op. Completing a finished
    /// record differently is rejected.
    pub(crate) fn complete(
        &mut self,
        id: i64,
        task_id: &str,
        status: RunStatus,
        elapsed_time: &str,
    ) -> Result<UsageRecord, StoreError> {
        if !status.is_terminal() {
            return Err(StoreError::InvalidStatus {
                id,
                value: status.to_string(),
            });
        }

        let tx = self.conn.transaction()?;
        let sql = format!("SELECT {RECORD_COLUMNS} FROM usage_record WHERE id = ?1 AND task_id = ?2");
        let existing = tx
            .query_row(&sql, params![id, task_id], StoredRow::from_row)
            .optional()?
            .ok_or_else(|| StoreError::NotFound {
                id,
                task_id: task_id.to_string(),
            })?
            .into_record()?;

        if existing.status.is_terminal() {
            let same = existing.status == status
                && existing.elapsed_time.as_deref() == Some(elapsed_time);
            if same {
                tracing::debug!(id, task_id, "completion already recorded");
                return Ok(existing);
            }
            return Err(StoreError::AlreadyCompleted {
                id,
                status: existing.status.to_string(),
            });
        }

        tx.execute(
            "UPDATE usage_record SET status = ?1, elapsed_time = ?2, updated_at = ?3
             WHERE id = ?4 AND task_id = ?5",
            params![status.as_str(), elapsed_time, timestamp(Utc::now()), id, task_id],
        )?;
        tx.commit()?;

        Ok(UsageRecord {
            status,
            elapsed_time: Some(elapsed_time.to_string()),
            ..existing
        })
    }

    /// Bulk import of finished records in one transaction
    pub(crate) fn insert_records(&mut self, records: &[NewRecord]) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO usage_record (app_name, endpoint, elapsed_time, status, task_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            )?;
            for r in records {
                stmt.execute(params![
                    r.app_name,
                    r.endpoint,
                    r.elapsed_time,
                    r.status.as_str(),
                    r.task_id,
                    timestamp(r.created_at)
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    pub(crate) fn find(&self, id: i64, task_id: &str) -> Result<Option<UsageRecord>, StoreError> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM usage_record WHERE id = ?1 AND task_id = ?2");
        self.conn
            .query_row(&sql, params![id, task_id], StoredRow::from_row)
            .optional()?
            .map(StoredRow::into_record)
            .transpose()
    }
}

impl RecordSource for UsageDb {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn fetch_successful(&self) -> Result<Option<Vec<UsageRecord>>, StoreError> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM usage_record WHERE status = ?1 ORDER BY created_at, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![RunStatus::Success.as_str()], StoredRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        let records = rows
            .into_iter()
            .map(StoredRow::into_record)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(records))
    }
}
