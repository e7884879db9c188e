//! Packaging: turn a staged directory into a single `.tar.gz` archive.
//!
//! Every file under the staging root goes into the archive with its path
//! relative to that root, so unpacking reproduces the staged tree exactly
//! — `index.html` at the top, images under `images/`.
//!
//! Archive names are derived from local time at second granularity
//! (`gallery_export_20260825_143012.tar.gz`). Two exports landing in the
//! same second get disambiguated with a numeric suffix instead of
//! clobbering each other.

use chrono::Local;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum PackageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Fixed prefix of every archive filename.
pub const ARCHIVE_PREFIX: &str = "gallery_export_";
/// Extension shared by every archive.
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// A packaged archive in the exports directory.
#[derive(Debug, Clone)]
pub struct PackagedArchive {
    pub path: PathBuf,
    pub filename: String,
    pub size_bytes: u64,
}

/// Walk `staged_root` and write it into a new archive under
/// `exports_dir`, returning the archive's path and byte size.
pub fn package(staged_root: &Path, exports_dir: &Path) -> Result<PackagedArchive, PackageError> {
    std::fs::create_dir_all(exports_dir)?;

    let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let path = unique_archive_path(exports_dir, &stamp);

    let file = std::fs::File::create(&path)?;
    let encoder = GzEncoder::new(std::io::BufWriter::new(file), Compression::default());
    let mut archive = tar::Builder::new(encoder);

    for entry in WalkDir::new(staged_root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(staged_root)
            .map_err(|e| std::io::Error::other(e))?;
        archive.append_path_with_name(entry.path(), relative)?;
    }

    archive.into_inner()?.finish()?;

    let size_bytes = std::fs::metadata(&path)?.len();
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    info!(archive = %path.display(), size_bytes, "export packaged");

    Ok(PackagedArchive {
        path,
        filename,
        size_bytes,
    })
}

/// First unused `gallery_export_<stamp>[_n].tar.gz` path in `exports_dir`.
fn unique_archive_path(exports_dir: &Path, stamp: &str) -> PathBuf {
    let base = exports_dir.join(format!("{ARCHIVE_PREFIX}{stamp}{ARCHIVE_SUFFIX}"));
    if !base.exists() {
        return base;
    }
    for n in 1.. {
        let candidate = exports_dir.join(format!("{ARCHIVE_PREFIX}{stamp}_{n}{ARCHIVE_SUFFIX}"));
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!("suffix search is unbounded")
}
