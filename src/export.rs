//! The export pipeline: select → assemble → package → record.
//!
//! ```text
//! gallery ids ──▶ select::resolve ──▶ assemble::assemble ──▶ package::package ──▶ Ledger::record
//!                 (ordered           (scratch dir with       (.tar.gz in the      (provenance row)
//!                  selections)        watermarked images      exports dir)
//!                                     and index.html)
//! ```
//!
//! Stage failures before the archive exists abort the export and leave no
//! trace: the scratch directory is a `TempDir`, so it disappears with the
//! error. A ledger failure *after* the archive is written is deliberately
//! not fatal — the archive is the thing the user asked for and it already
//! exists on disk; the miss is reported in
//! [`ExportOutcome::ledger_warning`] and a later `reconcile` pass cleans
//! up the unrecorded file if nobody wants it.

use crate::assemble::{self, AssembleError, SiteMeta};
use crate::ledger::{Ledger, NewArtifact};
use crate::package::{self, PackageError};
use crate::select::{self, SelectError};
use crate::store::{GallerySource, StoreError};
use crate::types::WatermarkConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("nothing to export: {0}")]
    NothingToExport(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Assemble(#[from] AssembleError),
    #[error(transparent)]
    Package(#[from] PackageError),
}

impl From<SelectError> for ExportError {
    fn from(err: SelectError) -> Self {
        match err {
            SelectError::NothingToExport(reason) => ExportError::NothingToExport(reason),
            SelectError::Store(err) => ExportError::Store(err),
        }
    }
}

/// What to export, as given by the caller.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Gallery ids in the order they should appear on the page.
    pub gallery_ids: Vec<i64>,
    pub title: String,
    pub description: Option<String>,
    pub theme: String,
}

/// Result of a completed export.
#[derive(Debug)]
pub struct ExportOutcome {
    /// Ledger row id, `None` when recording failed (see `ledger_warning`).
    pub record_id: Option<i64>,
    pub filename: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Theme actually rendered, after any fallback.
    pub theme: String,
    pub gallery_count: usize,
    pub image_count: usize,
    pub watermarked: usize,
    pub skipped: Vec<String>,
    pub ledger_warning: Option<String>,
}

/// Run the full pipeline for one export request.
pub fn run(
    source: &impl GallerySource,
    ledger: &Ledger,
    request: &ExportRequest,
    watermark_config: &WatermarkConfig,
    storage_root: &Path,
    exports_dir: &Path,
) -> Result<ExportOutcome, ExportError> {
    let selections = select::resolve(source, &request.gallery_ids)?;

    let meta = SiteMeta {
        title: request.title.clone(),
        description: request.description.clone(),
    };
    let staged = assemble::assemble(
        &selections,
        &meta,
        &request.theme,
        watermark_config,
        storage_root,
    )?;

    let archive = package::package(staged.path(), exports_dir)?;
    // Scratch directory is no longer needed once the archive exists.
    let theme = staged.theme.clone();
    let gallery_count = staged.gallery_count;
    let image_count = staged.image_count;
    let watermarked = staged.watermarked;
    let skipped = staged.skipped.clone();
    drop(staged);

    let artifact = NewArtifact {
        title: &request.title,
        description: request.description.as_deref(),
        theme: &theme,
        filename: &archive.filename,
        size_bytes: archive.size_bytes,
        gallery_count: gallery_count as u32,
        image_count: image_count as u32,
        gallery_ids: &request.gallery_ids,
    };
    let (record_id, ledger_warning) = match ledger.record(&artifact) {
        Ok(id) => (Some(id), None),
        Err(err) => {
            warn!(
                archive = %archive.path.display(),
                error = %err,
                "archive written but ledger record failed; reconcile will clean up"
            );
            (None, Some(err.to_string()))
        }
    };

    info!(
        archive = %archive.filename,
        galleries = gallery_count,
        images = image_count,
        watermarked,
        skipped = skipped.len(),
        "export complete"
    );

    Ok(ExportOutcome {
        record_id,
        filename: archive.filename,
        path: archive.path,
        size_bytes: archive.size_bytes,
        theme,
        gallery_count,
        image_count,
        watermarked,
        skipped,
        ledger_warning,
    })
}
