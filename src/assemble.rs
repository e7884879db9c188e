//! Site assembly: stage an export into an isolated scratch directory.
//!
//! Takes the resolved selections and produces a directory tree ready for
//! packaging:
//!
//! ```text
//! <scratch>/
//! ├── index.html                  # rendered theme page
//! └── images/
//!     ├── gallery_3/
//!     │   ├── 001-dawn.jpg        # copied (or watermarked) originals
//!     │   └── 002-dusk.jpg
//!     └── gallery_5/
//!         └── rome.jpg
//! ```
//!
//! The scratch directory is a [`tempfile::TempDir`]: uniquely named, so
//! concurrent exports can't collide, and removed on drop, so cleanup
//! happens whether packaging succeeds or the pipeline bails anywhere
//! after staging.
//!
//! ## Failure policy
//!
//! A single bad image never aborts the export: missing sources and failed
//! copies are logged, collected in [`StagedSite::skipped`], and excluded
//! from both the `images/` tree and the rendered page — the exported site
//! never references a file it doesn't contain. Unknown themes fall back
//! to the default theme. Everything else (scratch dir creation, page
//! write) is a hard error.

use crate::themes::{self, SitePage, ThemeError};
use crate::types::{GallerySelection, WatermarkConfig};
use crate::watermark;
use std::path::Path;
use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("misconfigured themes: {0}")]
    ThemeMisconfigured(String),
}

/// Site-level metadata rendered into the page header.
#[derive(Debug, Clone)]
pub struct SiteMeta {
    pub title: String,
    pub description: Option<String>,
}

/// A fully staged export, ready for packaging.
///
/// Dropping this removes the scratch directory.
pub struct StagedSite {
    dir: TempDir,
    /// Theme actually rendered (after any fallback).
    pub theme: String,
    pub gallery_count: usize,
    /// Images present in the staged `images/` tree and the page.
    pub image_count: usize,
    /// How many staged images carry a watermark.
    pub watermarked: usize,
    /// Source-relative names of images that could not be staged.
    pub skipped: Vec<String>,
}

impl StagedSite {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Stage `selections` into a scratch directory: copy or watermark every
/// resolvable image, render the theme, write `index.html`.
pub fn assemble(
    selections: &[GallerySelection],
    meta: &SiteMeta,
    theme: &str,
    watermark_config: &WatermarkConfig,
    storage_root: &Path,
) -> Result<StagedSite, AssembleError> {
    let dir = tempfile::Builder::new()
        .prefix("shutterbox-export-")
        .tempdir()?;
    debug!(scratch = %dir.path().display(), "staging export");

    let mut staged: Vec<GallerySelection> = Vec::with_capacity(selections.len());
    let mut skipped = Vec::new();
    let mut watermarked = 0usize;

    for selection in selections {
        let gallery_id = selection.gallery.id;
        let source_dir = storage_root.join(format!("gallery_{gallery_id}"));
        let dest_dir = dir
            .path()
            .join("images")
            .join(format!("gallery_{gallery_id}"));
        std::fs::create_dir_all(&dest_dir)?;

        let mut included = Vec::with_capacity(selection.images.len());
        for image in &selection.images {
            let source = source_dir.join(&image.filename);
            let dest = dest_dir.join(&image.filename);
            match watermark::apply(&source, &dest, watermark_config) {
                Ok(applied) => {
                    if applied {
                        watermarked += 1;
                    }
                    included.push(image.clone());
                }
                Err(reason) => {
                    warn!(
                        gallery_id,
                        filename = %image.filename,
                        %reason,
                        "skipping image that could not be staged"
                    );
                    skipped.push(format!("gallery_{gallery_id}/{}", image.filename));
                }
            }
        }
        staged.push(GallerySelection {
            gallery: selection.gallery.clone(),
            images: included,
        });
    }

    let page = SitePage {
        title: &meta.title,
        description: meta.description.as_deref(),
        galleries: &staged,
    };
    let markup = match themes::render(theme, &page) {
        Ok(markup) => markup,
        Err(ThemeError::Unknown(name)) => {
            warn!(theme = %name, fallback = themes::DEFAULT_THEME, "unknown theme, using default");
            themes::render(themes::DEFAULT_THEME, &page)
                .map_err(|e| AssembleError::ThemeMisconfigured(e.to_string()))?
        }
    };
    std::fs::write(dir.path().join("index.html"), markup.into_string())?;

    let theme_used = if themes::THEME_NAMES.contains(&theme) {
        theme.to_string()
    } else {
        themes::DEFAULT_THEME.to_string()
    };
    let image_count = staged.iter().map(|s| s.images.len()).sum();
    info!(
        galleries = staged.len(),
        images = image_count,
        skipped = skipped.len(),
        theme = %theme_used,
        "export staged"
    );

    Ok(StagedSite {
        dir,
        theme: theme_used,
        gallery_count: staged.len(),
        image_count,
        watermarked,
        skipped,
    })
}
