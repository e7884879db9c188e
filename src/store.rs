//! SQLite-backed gallery, image, and settings storage.
//!
//! One database file holds everything: gallery and image rows, the string
//! key/value settings table (watermark configuration), and the export
//! ledger's `exports` table (owned by [`crate::ledger`], created here so a
//! fresh database is complete after one `open`).
//!
//! The export pipeline never touches [`Store`] directly — it consumes the
//! [`GallerySource`] trait, which returns ordered, enabled-only image rows.
//! That seam keeps the selector and assembler testable against an
//! in-memory mock (see the `tests` module) without a database.
//!
//! ## Ordering guarantee
//!
//! `enabled_images` orders by `sort_key ASC, id ASC`. The tie-break on
//! `id` makes image ordering deterministic across repeated calls even when
//! sort keys collide, which the export pipeline relies on for
//! reproducible page and archive content.

use crate::types::{Gallery, ImageRecord, WatermarkConfig};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("gallery {0} not found")]
    GalleryNotFound(i64),
    #[error("image {0} not found")]
    ImageNotFound(i64),
}

/// Read access to galleries and their exportable images.
///
/// Implementations must return only `enabled` images, ordered by
/// `sort_key` ascending with `id` ascending as tie-break.
pub trait GallerySource {
    fn gallery(&self, id: i64) -> Result<Option<Gallery>, StoreError>;
    fn enabled_images(&self, gallery_id: i64) -> Result<Vec<ImageRecord>, StoreError>;
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS galleries (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT NOT NULL,
    description TEXT
);
CREATE TABLE IF NOT EXISTS images (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    gallery_id  INTEGER NOT NULL REFERENCES galleries(id) ON DELETE CASCADE,
    filename    TEXT NOT NULL,
    title       TEXT,
    description TEXT,
    camera      TEXT,
    lens        TEXT,
    settings    TEXT,
    enabled     INTEGER NOT NULL DEFAULT 1,
    sort_key    INTEGER NOT NULL DEFAULT 0,
    UNIQUE(gallery_id, filename)
);
CREATE INDEX IF NOT EXISTS idx_images_gallery_order
    ON images(gallery_id, sort_key, id);
CREATE TABLE IF NOT EXISTS settings (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
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

/// SQLite store for galleries, images, and settings.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (creating if needed) the database at `path` and ensure the
    /// schema exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        debug!(db = %path.display(), "store opened");
        Ok(Self { conn })
    }

    /// In-memory store, used by tests and `--dry-run` style tooling.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    // ------------------------------------------------------------------
    // Galleries
    // ------------------------------------------------------------------

    pub fn add_gallery(&self, title: &str, description: Option<&str>) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO galleries (title, description) VALUES (?1, ?2)",
            params![title, description],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn galleries(&self) -> Result<Vec<Gallery>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title, description FROM galleries ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Gallery {
                id: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ------------------------------------------------------------------
    // Images
    // ------------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub fn add_image(
        &self,
        gallery_id: i64,
        filename: &str,
        title: Option<&str>,
        description: Option<&str>,
        camera: Option<&str>,
        lens: Option<&str>,
        settings: Option<&str>,
        sort_key: i64,
        enabled: bool,
    ) -> Result<i64, StoreError> {
        if self.gallery(gallery_id)?.is_none() {
            return Err(StoreError::GalleryNotFound(gallery_id));
        }
        self.conn.execute(
            "INSERT INTO images
             (gallery_id, filename, title, description, camera, lens, settings, sort_key, enabled)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                gallery_id,
                filename,
                title,
                description,
                camera,
                lens,
                settings,
                sort_key,
                enabled
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn set_image_enabled(&self, image_id: i64, enabled: bool) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE images SET enabled = ?1 WHERE id = ?2",
            params![enabled, image_id],
        )?;
        if changed == 0 {
            return Err(StoreError::ImageNotFound(image_id));
        }
        Ok(())
    }

    pub fn set_image_sort_key(&self, image_id: i64, sort_key: i64) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE images SET sort_key = ?1 WHERE id = ?2",
            params![sort_key, image_id],
        )?;
        if changed == 0 {
            return Err(StoreError::ImageNotFound(image_id));
        }
        Ok(())
    }

    /// All images of a gallery, disabled ones included — the management
    /// view, not the export view.
    pub fn images(&self, gallery_id: i64) -> Result<Vec<ImageRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, gallery_id, filename, title, description, camera, lens, settings,
                    enabled, sort_key
             FROM images WHERE gallery_id = ?1
             ORDER BY sort_key ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![gallery_id], row_to_image)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    /// The complete, defaulted watermark configuration. Never partial,
    /// never an error for malformed stored values.
    pub fn watermark_config(&self) -> Result<WatermarkConfig, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM settings WHERE key LIKE 'watermark_%'")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let map: std::collections::HashMap<String, String> =
            rows.collect::<Result<_, _>>()?;
        Ok(WatermarkConfig::from_settings(|k| map.get(k).cloned()))
    }
}

impl GallerySource for Store {
    fn gallery(&self, id: i64) -> Result<Option<Gallery>, StoreError> {
        self.conn
            .query_row(
                "SELECT id, title, description FROM galleries WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Gallery {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        description: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    fn enabled_images(&self, gallery_id: i64) -> Result<Vec<ImageRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, gallery_id, filename, title, description, camera, lens, settings,
                    enabled, sort_key
             FROM images WHERE gallery_id = ?1 AND enabled = 1
             ORDER BY sort_key ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![gallery_id], row_to_image)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn row_to_image(row: &rusqlite::Row<'_>) -> rusqlite::Result<ImageRecord> {
    Ok(ImageRecord {
        id: row.get(0)?,
        gallery_id: row.get(1)?,
        filename: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        camera: row.get(5)?,
        lens: row.get(6)?,
        settings: row.get(7)?,
        enabled: row.get(8)?,
        sort_key: row.get(9)?,
    })
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::BTreeMap;

    /// In-memory [`GallerySource`] for pipeline tests — no database.
    #[derive(Default)]
    pub struct MemorySource {
        pub galleries: BTreeMap<i64, Gallery>,
        pub images: BTreeMap<i64, Vec<ImageRecord>>,
    }

    impl MemorySource {
        pub fn with_gallery(mut self, gallery: Gallery, images: Vec<ImageRecord>) -> Self {
            self.images.insert(gallery.id, images);
            self.galleries.insert(gallery.id, gallery);
            self
        }
    }

    impl GallerySource for MemorySource {
        fn gallery(&self, id: i64) -> Result<Option<Gallery>, StoreError> {
            Ok(self.galleries.get(&id).cloned())
        }

        fn enabled_images(&self, gallery_id: i64) -> Result<Vec<ImageRecord>, StoreError> {
            let mut images: Vec<ImageRecord> = self
                .images
                .get(&gallery_id)
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .filter(|img| img.enabled)
                .collect();
            images.sort_by_key(|img| (img.sort_key, img.id));
            Ok(images)
        }
    }

    pub fn image(id: i64, gallery_id: i64, filename: &str, sort_key: i64) -> ImageRecord {
        ImageRecord {
            id,
            gallery_id,
            filename: filename.to_string(),
            title: None,
            description: None,
            camera: None,
            lens: None,
            settings: None,
            enabled: true,
            sort_key,
        }
    }

    // ------------------------------------------------------------------
    // SQLite store tests
    // ------------------------------------------------------------------

    #[test]
    fn add_and_fetch_gallery() {
        let store = Store::open_in_memory().unwrap();
        let id = store.add_gallery("Landscapes", Some("wide open")).unwrap();

        let gallery = store.gallery(id).unwrap().unwrap();
        assert_eq!(gallery.title, "Landscapes");
        assert_eq!(gallery.description.as_deref(), Some("wide open"));
        assert!(store.gallery(id + 1).unwrap().is_none());
    }

    #[test]
    fn enabled_images_filters_and_orders() {
        let store = Store::open_in_memory().unwrap();
        let g = store.add_gallery("G", None).unwrap();

        // Insert out of order, with a disabled row and a sort-key tie.
        store
            .add_image(g, "c.jpg", None, None, None, None, None, 30, true)
            .unwrap();
        store
            .add_image(g, "hidden.jpg", None, None, None, None, None, 1, false)
            .unwrap();
        let tie_first = store
            .add_image(g, "a.jpg", None, None, None, None, None, 10, true)
            .unwrap();
        let tie_second = store
            .add_image(g, "b.jpg", None, None, None, None, None, 10, true)
            .unwrap();

        let images = store.enabled_images(g).unwrap();
        let names: Vec<&str> = images.iter().map(|i| i.filename.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);

        // Tie broken by insertion id.
        assert_eq!(images[0].id, tie_first);
        assert_eq!(images[1].id, tie_second);

        // Management view still sees the disabled row.
        assert_eq!(store.images(g).unwrap().len(), 4);
    }

    #[test]
    fn enabled_images_stable_across_calls() {
        let store = Store::open_in_memory().unwrap();
        let g = store.add_gallery("G", None).unwrap();
        for (name, key) in [("x.jpg", 5), ("y.jpg", 5), ("z.jpg", 2)] {
            store
                .add_image(g, name, None, None, None, None, None, key, true)
                .unwrap();
        }

        let first: Vec<i64> = store.enabled_images(g).unwrap().iter().map(|i| i.id).collect();
        let second: Vec<i64> = store.enabled_images(g).unwrap().iter().map(|i| i.id).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn add_image_to_unknown_gallery_fails() {
        let store = Store::open_in_memory().unwrap();
        let result = store.add_image(99, "a.jpg", None, None, None, None, None, 0, true);
        assert!(matches!(result, Err(StoreError::GalleryNotFound(99))));
    }

    #[test]
    fn duplicate_filename_within_gallery_rejected() {
        let store = Store::open_in_memory().unwrap();
        let g = store.add_gallery("G", None).unwrap();
        store
            .add_image(g, "dup.jpg", None, None, None, None, None, 0, true)
            .unwrap();
        let result = store.add_image(g, "dup.jpg", None, None, None, None, None, 1, true);
        assert!(result.is_err());
    }

    #[test]
    fn toggle_enabled_round_trip() {
        let store = Store::open_in_memory().unwrap();
        let g = store.add_gallery("G", None).unwrap();
        let id = store
            .add_image(g, "a.jpg", None, None, None, None, None, 0, true)
            .unwrap();

        store.set_image_enabled(id, false).unwrap();
        assert!(store.enabled_images(g).unwrap().is_empty());

        store.set_image_enabled(id, true).unwrap();
        assert_eq!(store.enabled_images(g).unwrap().len(), 1);

        assert!(matches!(
            store.set_image_enabled(999, true),
            Err(StoreError::ImageNotFound(999))
        ));
    }

    #[test]
    fn settings_round_trip_and_watermark_config() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.setting("watermark_text").unwrap().is_none());

        store.set_setting("watermark_enabled", "true").unwrap();
        store.set_setting("watermark_text", "© Test").unwrap();
        store.set_setting("watermark_opacity", "45").unwrap();
        // Overwrite works.
        store.set_setting("watermark_opacity", "55").unwrap();

        let config = store.watermark_config().unwrap();
        assert!(config.is_active());
        assert_eq!(config.text, "© Test");
        assert_eq!(config.opacity, 55);
        // Unset keys stay defaulted — the config is always complete.
        assert_eq!(config.font_size, WatermarkConfig::default().font_size);
    }
}
