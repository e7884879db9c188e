//! # Shutterbox
//!
//! A photo gallery organizer whose end product is a portable static site.
//! Galleries, image metadata, and settings live in a single SQLite file;
//! the export command turns a selection of galleries into a themed,
//! self-contained HTML page packaged as one `.tar.gz` archive.
//!
//! # Architecture: The Export Pipeline
//!
//! Exporting runs four stages, each a separate module with its own error
//! type, consuming the previous stage's output:
//!
//! ```text
//! 1. Select    gallery ids  →  ordered selections   (store → enabled images, display order)
//! 2. Assemble  selections   →  scratch directory    (watermarking + themed index.html)
//! 3. Package   scratch dir  →  exports/*.tar.gz     (timestamped, collision-safe)
//! 4. Record    archive      →  ledger row           (provenance: what, when, how big)
//! ```
//!
//! This separation exists for three reasons:
//!
//! - **Testability**: selection runs against the [`store::GallerySource`]
//!   trait, so pipeline logic is tested with an in-memory mock; assembly
//!   and packaging are plain functions over directories.
//! - **Clean failure boundaries**: anything that fails before the archive
//!   exists leaves no trace (staging happens in a `TempDir`); the one
//!   failure after it — a ledger miss — degrades to a warning because the
//!   archive the user asked for is already on disk.
//! - **Reconcilability**: because stage 4 is a plain record over stage 3's
//!   file, the ledger can always be re-aligned with the exports directory
//!   ([`ledger::Ledger::reconcile`]).
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`store`] | SQLite storage for galleries, images, and settings; the [`store::GallerySource`] seam |
//! | [`select`] | Stage 1 — resolves gallery ids into ordered selections of enabled images |
//! | [`watermark`] | Text watermark stamping via `ab_glyph` + `imageproc`, degrading to a plain copy |
//! | [`themes`] | Built-in Maud themes rendering selections into a self-contained HTML page |
//! | [`assemble`] | Stage 2 — stages images and the rendered page into a scratch directory |
//! | [`package`] | Stage 3 — walks the scratch directory into a timestamped `.tar.gz` |
//! | [`ledger`] | Stage 4 — export provenance records: record, list, delete, reconcile |
//! | [`export`] | Pipeline orchestration and the outward [`export::ExportOutcome`] |
//! | [`config`] | `shutterbox.toml` data-directory layout (database, storage, exports paths) |
//! | [`types`] | Shared domain types (`Gallery`, `ImageRecord`, `WatermarkConfig`, …) |
//! | [`output`] | CLI output formatting — pure `format_*` functions plus print wrappers |
//!
//! # Design Decisions
//!
//! ## Maud Over Template Engines
//!
//! Exported HTML is generated with [Maud](https://maud.lambda.xyz/):
//! compile-time checked, type-safe, auto-escaped. A theme is Rust code,
//! not a file that can go missing at runtime, so the archive is fully
//! reproducible from the database plus the image files.
//!
//! ## Watermarking Never Blocks an Export
//!
//! The watermark stage is best-effort by design: an undecodable image or
//! an absent font degrades that image to a plain copy, logged but not
//! fatal. Only a missing source file excludes an image — and then it is
//! excluded from the rendered page too, so the exported site never
//! references a file it doesn't contain.
//!
//! ## The Filesystem Is the Source of Truth for Artifacts
//!
//! Archive files outlive their database rows and vice versa (external
//! deletion, a crash between packaging and recording). Rather than
//! pretending this can't happen, the ledger ships a `reconcile` operation
//! that deletes records without files and files without records, and is
//! idempotent so it can run on every startup.

pub mod assemble;
pub mod config;
pub mod export;
pub mod ledger;
pub mod output;
pub mod package;
pub mod select;
pub mod store;
pub mod themes;
pub mod types;
pub mod watermark;
