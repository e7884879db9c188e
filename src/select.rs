//! Export selection: which (gallery, image) pairs go into an export.
//!
//! First stage of the export pipeline. Resolves the caller's gallery ids
//! against the store, keeping the caller's ordering, and fetches each
//! gallery's enabled images in display order. Ids that don't resolve are
//! skipped silently — an absent gallery is simply not part of the export,
//! not a failure.
//!
//! The one hard rule: an export with nothing in it is refused here, before
//! any filesystem work happens. "Nothing" means no ids, no resolvable
//! galleries, or all resolved galleries having zero enabled images.

use crate::store::{GallerySource, StoreError};
use crate::types::GallerySelection;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SelectError {
    #[error("nothing to export: {0}")]
    NothingToExport(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Resolve gallery ids into ordered selections of enabled images.
///
/// Output gallery order matches `gallery_ids`; image order within each
/// gallery is `sort_key ASC, id ASC` (the [`GallerySource`] contract), so
/// repeated calls over unchanged data are byte-identical downstream.
pub fn resolve(
    source: &impl GallerySource,
    gallery_ids: &[i64],
) -> Result<Vec<GallerySelection>, SelectError> {
    if gallery_ids.is_empty() {
        return Err(SelectError::NothingToExport(
            "no galleries requested".to_string(),
        ));
    }

    let mut selections = Vec::new();
    for &id in gallery_ids {
        let Some(gallery) = source.gallery(id)? else {
            debug!(gallery_id = id, "requested gallery does not exist, skipping");
            continue;
        };
        let images = source.enabled_images(id)?;
        if images.is_empty() {
            debug!(gallery_id = id, title = %gallery.title, "gallery has no enabled images");
        }
        selections.push(GallerySelection { gallery, images });
    }

    if selections.is_empty() {
        return Err(SelectError::NothingToExport(
            "none of the requested galleries exist".to_string(),
        ));
    }
    if selections.iter().all(|s| s.images.is_empty()) {
        return Err(SelectError::NothingToExport(
            "the selected galleries contain no enabled images".to_string(),
        ));
    }

    Ok(selections)
}
