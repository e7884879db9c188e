//! CLI output formatting.
//!
//! Output is information-centric: every entity leads with its identity
//! (id + title), with filesystem details shown as indented context lines.
//!
//! ```text
//! Galleries
//! #1 Street (4 images)
//!     A year of walking around
//! #2 Nature (2 images)
//!
//! Exports
//! #3 Portfolio (1.4 MB)
//!     File: gallery_export_20260825_143012.tar.gz
//!     Created: 2026-08-25 14:30 UTC
//!     Theme: default, 2 galleries, 6 images
//! ```
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure — no I/O, no side effects.

use crate::export::ExportOutcome;
use crate::ledger::ReconcileReport;
use crate::types::{ArtifactRecord, Gallery, ImageRecord};

// ============================================================================
// Shared helpers
// ============================================================================

/// Human-readable byte size: `512 B`, `1.4 KB`, `2.0 MB`.
fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

fn counted(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

// ============================================================================
// Galleries and images
// ============================================================================

/// Format the gallery listing: one header per gallery with its image count,
/// description as an indented context line.
pub fn format_gallery_list(galleries: &[(Gallery, usize)]) -> Vec<String> {
    if galleries.is_empty() {
        return vec!["No galleries yet.".to_string()];
    }
    let mut lines = vec!["Galleries".to_string()];
    for (gallery, image_count) in galleries {
        lines.push(format!(
            "#{} {} ({})",
            gallery.id,
            gallery.title,
            counted(*image_count, "image", "images")
        ));
        if let Some(description) = &gallery.description {
            lines.push(format!("    {description}"));
        }
    }
    lines
}

pub fn print_gallery_list(galleries: &[(Gallery, usize)]) {
    for line in format_gallery_list(galleries) {
        println!("{line}");
    }
}

/// Format a gallery's images in display order, disabled ones marked.
pub fn format_image_list(images: &[ImageRecord]) -> Vec<String> {
    if images.is_empty() {
        return vec!["No images in this gallery.".to_string()];
    }
    let mut lines = Vec::new();
    for image in images {
        let marker = if image.enabled { "" } else { " (disabled)" };
        match &image.title {
            Some(title) => {
                lines.push(format!("#{} {}{}", image.id, title, marker));
                lines.push(format!("    Source: {}", image.filename));
            }
            None => lines.push(format!("#{} ({}){}", image.id, image.filename, marker)),
        }
    }
    lines
}

pub fn print_image_list(images: &[ImageRecord]) {
    for line in format_image_list(images) {
        println!("{line}");
    }
}

// ============================================================================
// Export summary
// ============================================================================

/// Format the summary printed after a successful export.
pub fn format_export_outcome(outcome: &ExportOutcome) -> Vec<String> {
    let mut lines = vec![format!(
        "Exported {}, {} \u{2192} {} ({})",
        counted(outcome.gallery_count, "gallery", "galleries"),
        counted(outcome.image_count, "image", "images"),
        outcome.filename,
        human_size(outcome.size_bytes)
    )];
    lines.push(format!("    Theme: {}", outcome.theme));
    if outcome.watermarked > 0 {
        lines.push(format!(
            "    Watermarked: {}",
            counted(outcome.watermarked, "image", "images")
        ));
    }
    for name in &outcome.skipped {
        lines.push(format!("    Skipped: {name}"));
    }
    if let Some(warning) = &outcome.ledger_warning {
        lines.push(format!("    Warning: not recorded in ledger: {warning}"));
    }
    lines
}

pub fn print_export_outcome(outcome: &ExportOutcome) {
    for line in format_export_outcome(outcome) {
        println!("{line}");
    }
}

// ============================================================================
// Export ledger
// ============================================================================

/// Format the artifact listing, newest first as given.
pub fn format_artifact_list(records: &[ArtifactRecord]) -> Vec<String> {
    if records.is_empty() {
        return vec!["No exports recorded.".to_string()];
    }
    let mut lines = vec!["Exports".to_string()];
    for record in records {
        lines.push(format!(
            "#{} {} ({})",
            record.id,
            record.title,
            human_size(record.size_bytes)
        ));
        lines.push(format!("    File: {}", record.filename));
        lines.push(format!(
            "    Created: {}",
            record.created_at.format("%Y-%m-%d %H:%M UTC")
        ));
        lines.push(format!(
            "    Theme: {}, {}, {}",
            record.theme,
            counted(record.gallery_count as usize, "gallery", "galleries"),
            counted(record.image_count as usize, "image", "images")
        ));
        if let Some(description) = &record.description {
            lines.push(format!("    {description}"));
        }
    }
    lines
}

pub fn print_artifact_list(records: &[ArtifactRecord]) {
    for line in format_artifact_list(records) {
        println!("{line}");
    }
}

/// Format a reconcile report.
pub fn format_reconcile_report(report: &ReconcileReport) -> Vec<String> {
    if report.is_clean() {
        return vec!["Ledger and exports directory are consistent.".to_string()];
    }
    vec![format!(
        "Removed {} and {}",
        counted(report.records_removed, "stale record", "stale records"),
        counted(report.files_removed, "orphan file", "orphan files")
    )]
}

pub fn print_reconcile_report(report: &ReconcileReport) {
    for line in format_reconcile_report(report) {
        println!("{line}");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    #[test]
    fn human_size_bytes() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(1023), "1023 B");
    }

    #[test]
    fn human_size_kilobytes() {
        assert_eq!(human_size(1024), "1.0 KB");
        assert_eq!(human_size(1536), "1.5 KB");
    }

    #[test]
    fn human_size_megabytes() {
        assert_eq!(human_size(2 * 1024 * 1024), "2.0 MB");
    }

    #[test]
    fn counted_forms() {
        assert_eq!(counted(1, "image", "images"), "1 image");
        assert_eq!(counted(3, "image", "images"), "3 images");
        assert_eq!(counted(0, "gallery", "galleries"), "0 galleries");
    }

    #[test]
    fn gallery_list_with_description() {
        let galleries = vec![
            (
                Gallery {
                    id: 1,
                    title: "Street".to_string(),
                    description: Some("A year of walking".to_string()),
                },
                4,
            ),
            (
                Gallery {
                    id: 2,
                    title: "Nature".to_string(),
                    description: None,
                },
                1,
            ),
        ];
        let lines = format_gallery_list(&galleries);
        assert_eq!(lines[0], "Galleries");
        assert_eq!(lines[1], "#1 Street (4 images)");
        assert_eq!(lines[2], "    A year of walking");
        assert_eq!(lines[3], "#2 Nature (1 image)");
    }

    #[test]
    fn gallery_list_empty() {
        assert_eq!(format_gallery_list(&[]), vec!["No galleries yet."]);
    }

    #[test]
    fn image_list_marks_disabled_and_shows_source() {
        let mut titled = crate::store::tests::image(5, 1, "dawn.jpg", 0);
        titled.title = Some("Dawn".to_string());
        let mut disabled = crate::store::tests::image(6, 1, "dusk.jpg", 1);
        disabled.enabled = false;

        let lines = format_image_list(&[titled, disabled]);
        assert_eq!(lines[0], "#5 Dawn");
        assert_eq!(lines[1], "    Source: dawn.jpg");
        assert_eq!(lines[2], "#6 (dusk.jpg) (disabled)");
    }

    #[test]
    fn export_outcome_summary() {
        let outcome = ExportOutcome {
            record_id: Some(3),
            filename: "gallery_export_20260825_143012.tar.gz".to_string(),
            path: PathBuf::from("/tmp/x"),
            size_bytes: 1536,
            theme: "default".to_string(),
            gallery_count: 2,
            image_count: 6,
            watermarked: 6,
            skipped: vec!["gallery_1/ghost.jpg".to_string()],
            ledger_warning: None,
        };
        let lines = format_export_outcome(&outcome);
        assert_eq!(
            lines[0],
            "Exported 2 galleries, 6 images \u{2192} gallery_export_20260825_143012.tar.gz (1.5 KB)"
        );
        assert_eq!(lines[1], "    Theme: default");
        assert_eq!(lines[2], "    Watermarked: 6 images");
        assert_eq!(lines[3], "    Skipped: gallery_1/ghost.jpg");
    }

    #[test]
    fn export_outcome_includes_ledger_warning() {
        let outcome = ExportOutcome {
            record_id: None,
            filename: "a.tar.gz".to_string(),
            path: PathBuf::from("/tmp/a.tar.gz"),
            size_bytes: 10,
            theme: "default".to_string(),
            gallery_count: 1,
            image_count: 1,
            watermarked: 0,
            skipped: vec![],
            ledger_warning: Some("database error".to_string()),
        };
        let lines = format_export_outcome(&outcome);
        assert!(lines.last().unwrap().contains("not recorded in ledger"));
    }

    #[test]
    fn artifact_list_layout() {
        let records = vec![ArtifactRecord {
            id: 3,
            title: "Portfolio".to_string(),
            description: Some("Selected work".to_string()),
            theme: "slate".to_string(),
            filename: "gallery_export_20260825_143012.tar.gz".to_string(),
            size_bytes: 1024 * 1024,
            gallery_count: 2,
            image_count: 6,
            gallery_ids: "1,2".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 8, 25, 14, 30, 12).unwrap(),
        }];
        let lines = format_artifact_list(&records);
        assert_eq!(lines[0], "Exports");
        assert_eq!(lines[1], "#3 Portfolio (1.0 MB)");
        assert_eq!(lines[2], "    File: gallery_export_20260825_143012.tar.gz");
        assert_eq!(lines[3], "    Created: 2026-08-25 14:30 UTC");
        assert_eq!(lines[4], "    Theme: slate, 2 galleries, 6 images");
        assert_eq!(lines[5], "    Selected work");
    }

    #[test]
    fn artifact_list_empty() {
        assert_eq!(format_artifact_list(&[]), vec!["No exports recorded."]);
    }

    #[test]
    fn reconcile_report_clean_and_dirty() {
        assert_eq!(
            format_reconcile_report(&ReconcileReport::default()),
            vec!["Ledger and exports directory are consistent."]
        );
        let report = ReconcileReport {
            records_removed: 1,
            files_removed: 2,
        };
        assert_eq!(
            format_reconcile_report(&report),
            vec!["Removed 1 stale record and 2 orphan files"]
        );
    }
}
