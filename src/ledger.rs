//! Export ledger: provenance records for packaged archives.
//!
//! One row per artifact, inserted only after the archive file exists on
//! disk with a known size, and never mutated afterwards except deletion.
//!
//! The filesystem is the source of truth for whether an artifact exists;
//! the ledger is an index over it. The two are reconciled, never assumed
//! consistent: [`Ledger::reconcile`] drops records whose backing file is
//! gone and collects archive files no record points at. Running it on an
//! already-consistent store is a no-op, so it is safe to run on every
//! startup or from a cron job.

use crate::package::ARCHIVE_SUFFIX;
use crate::types::ArtifactRecord;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Metadata for a freshly packaged artifact, not yet recorded.
#[derive(Debug, Clone)]
pub struct NewArtifact<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub theme: &'a str,
    pub filename: &'a str,
    pub size_bytes: u64,
    pub gallery_count: u32,
    pub image_count: u32,
    pub gallery_ids: &'a [i64],
}

/// What a [`Ledger::reconcile`] pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Records whose backing archive file was missing.
    pub records_removed: usize,
    /// Archive files with no matching record.
    pub files_removed: usize,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.records_removed == 0 && self.files_removed == 0
    }
}

const TABLE: &str = "
CREATE TABLE IF NOT EXISTS exports (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    title         TEXT NOT NULL,
    description   TEXT,
    theme         TEXT NOT NULL,
    filename      TEXT NOT NULL UNIQUE,
    size_bytes    INTEGER NOT NULL,
    gallery_count INTEGER NOT NULL,
    image_count   INTEGER NOT NULL,
    gallery_ids   TEXT NOT NULL,
    created_at    TEXT NOT NULL
);
";

/// SQLite-backed artifact record store.
pub struct Ledger {
    conn: Connection,
}

impl Ledger {
    /// Open the ledger in the shared database at `path` (usually the same
    /// file as [`crate::store::Store`]).
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(TABLE)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(TABLE)?;
        Ok(Self { conn })
    }

    /// Insert one record for a packaged archive. Call only after the
    /// file exists on disk with its final size.
    pub fn record(&self, artifact: &NewArtifact<'_>) -> Result<i64, LedgerError> {
        let gallery_ids = artifact
            .gallery_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.conn.execute(
            "INSERT INTO exports
             (title, description, theme, filename, size_bytes,
              gallery_count, image_count, gallery_ids, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                artifact.title,
                artifact.description,
                artifact.theme,
                artifact.filename,
                artifact.size_bytes as i64,
                artifact.gallery_count,
                artifact.image_count,
                gallery_ids,
                Utc::now().to_rfc3339(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(artifact_id = id, filename = artifact.filename, "artifact recorded");
        Ok(id)
    }

    /// All records, newest first.
    pub fn list(&self) -> Result<Vec<ArtifactRecord>, LedgerError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, theme, filename, size_bytes,
                    gallery_count, image_count, gallery_ids, created_at
             FROM exports ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], row_to_record)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn get(&self, id: i64) -> Result<Option<ArtifactRecord>, LedgerError> {
        self.conn
            .query_row(
                "SELECT id, title, description, theme, filename, size_bytes,
                        gallery_count, image_count, gallery_ids, created_at
                 FROM exports WHERE id = ?1",
                params![id],
                row_to_record,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Delete an artifact: remove the backing file when present, then the
    /// record. Returns false (no side effects) when the record doesn't
    /// exist; a record whose file is already gone still deletes cleanly.
    pub fn delete(&self, id: i64, exports_dir: &Path) -> Result<bool, LedgerError> {
        let Some(record) = self.get(id)? else {
            return Ok(false);
        };
        let path = exports_dir.join(&record.filename);
        match std::fs::remove_file(&path) {
            Ok(()) => debug!(artifact_id = id, file = %path.display(), "archive file removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(artifact_id = id, file = %path.display(), "archive file already missing");
            }
            Err(e) => return Err(e.into()),
        }
        self.conn
            .execute("DELETE FROM exports WHERE id = ?1", params![id])?;
        Ok(true)
    }

    /// Align the ledger with the exports directory: drop records whose
    /// file is gone, delete archive files no record points at.
    /// Idempotent — a second pass over an unchanged store removes nothing.
    pub fn reconcile(&self, exports_dir: &Path) -> Result<ReconcileReport, LedgerError> {
        let mut report = ReconcileReport::default();

        let records = self.list()?;
        for record in &records {
            if !exports_dir.join(&record.filename).exists() {
                self.conn
                    .execute("DELETE FROM exports WHERE id = ?1", params![record.id])?;
                warn!(
                    artifact_id = record.id,
                    filename = %record.filename,
                    "removed record with missing archive file"
                );
                report.records_removed += 1;
            }
        }

        let known: std::collections::HashSet<&str> = records
            .iter()
            .map(|r| r.filename.as_str())
            .collect();
        if exports_dir.is_dir() {
            for entry in std::fs::read_dir(exports_dir)? {
                let entry = entry?;
                if !entry.file_type()?.is_file() {
                    continue;
                }
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.ends_with(ARCHIVE_SUFFIX) && !known.contains(name.as_str()) {
                    std::fs::remove_file(entry.path())?;
                    warn!(filename = %name, "removed archive file with no ledger record");
                    report.files_removed += 1;
                }
            }
        }

        if !report.is_clean() {
            info!(
                records_removed = report.records_removed,
                files_removed = report.files_removed,
                "ledger reconciled"
            );
        }
        Ok(report)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ArtifactRecord> {
    let created_at: String = row.get(9)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_default();
    Ok(ArtifactRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        theme: row.get(3)?,
        filename: row.get(4)?,
        size_bytes: row.get::<_, i64>(5)? as u64,
        gallery_count: row.get(6)?,
        image_count: row.get(7)?,
        gallery_ids: row.get(8)?,
        created_at,
    })
}
