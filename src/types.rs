//! Shared types used across the export pipeline.
//!
//! These are the records flowing between the store, the selector, the
//! assembler, and the ledger. Everything is serde-derived so the CLI can
//! dump pipeline state as JSON for inspection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named collection of images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gallery {
    pub id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An image row as consumed by the export pipeline.
///
/// `filename` is unique within the gallery's storage namespace
/// (`storage/gallery_<id>/`). `sort_key` is an explicit integer ordering,
/// not necessarily contiguous; ties are broken by `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: i64,
    pub gallery_id: i64,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<String>,
    pub enabled: bool,
    pub sort_key: i64,
}

/// One gallery's contribution to an export: the gallery row plus its
/// enabled images in display order.
#[derive(Debug, Clone, Serialize)]
pub struct GallerySelection {
    pub gallery: Gallery,
    pub images: Vec<ImageRecord>,
}

/// Vertical anchor for the watermark text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalPos {
    Top,
    Bottom,
}

/// Horizontal anchor for the watermark text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalPos {
    Left,
    Center,
    Right,
}

/// Watermark overlay configuration.
///
/// Built from the settings table via [`WatermarkConfig::from_settings`],
/// which coerces the stored string values leniently — a malformed opacity
/// or font size falls back to its default rather than failing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkConfig {
    pub enabled: bool,
    pub text: String,
    pub font_family: String,
    pub font_size: f32,
    /// 0–100, mapped linearly onto the 0–255 alpha channel when drawing.
    pub opacity: u8,
    pub vertical: VerticalPos,
    pub horizontal: HorizontalPos,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            text: String::new(),
            font_family: "DejaVu Sans".to_string(),
            font_size: 24.0,
            opacity: 60,
            vertical: VerticalPos::Bottom,
            horizontal: HorizontalPos::Right,
        }
    }
}

impl WatermarkConfig {
    /// True when the transform should actually draw: enabled with
    /// non-whitespace text. Anything else means plain copy.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.text.trim().is_empty()
    }

    /// Build a complete config from string settings, defaulting every
    /// missing or unparseable value.
    pub fn from_settings(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let enabled = get("watermark_enabled")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes" | "on"))
            .unwrap_or(defaults.enabled);
        let text = get("watermark_text").unwrap_or(defaults.text);
        let font_family = get("watermark_font").unwrap_or(defaults.font_family);
        let font_size = get("watermark_font_size")
            .and_then(|v| v.trim().parse::<f32>().ok())
            .filter(|s| *s > 0.0)
            .unwrap_or(defaults.font_size);
        let opacity = get("watermark_opacity")
            .and_then(|v| v.trim().parse::<u8>().ok())
            .filter(|o| *o <= 100)
            .unwrap_or(defaults.opacity);
        let vertical = match get("watermark_vpos").as_deref().map(str::trim) {
            Some("top") => VerticalPos::Top,
            Some("bottom") => VerticalPos::Bottom,
            _ => defaults.vertical,
        };
        let horizontal = match get("watermark_hpos").as_deref().map(str::trim) {
            Some("left") => HorizontalPos::Left,
            Some("center") => HorizontalPos::Center,
            Some("right") => HorizontalPos::Right,
            _ => defaults.horizontal,
        };
        Self {
            enabled,
            text,
            font_family,
            font_size,
            opacity,
            vertical,
            horizontal,
        }
    }
}

/// A packaged, downloadable export as recorded in the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub theme: String,
    pub filename: String,
    pub size_bytes: u64,
    pub gallery_count: u32,
    pub image_count: u32,
    /// Comma-joined ids of the contributing galleries, in request order.
    pub gallery_ids: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn watermark_defaults_are_inactive() {
        let config = WatermarkConfig::default();
        assert!(!config.enabled);
        assert!(!config.is_active());
        assert_eq!(config.opacity, 60);
        assert_eq!(config.vertical, VerticalPos::Bottom);
        assert_eq!(config.horizontal, HorizontalPos::Right);
    }

    #[test]
    fn enabled_with_whitespace_text_is_not_active() {
        let config = WatermarkConfig {
            enabled: true,
            text: "   ".to_string(),
            ..Default::default()
        };
        assert!(!config.is_active());
    }

    #[test]
    fn from_settings_parses_complete_config() {
        let map = settings(&[
            ("watermark_enabled", "true"),
            ("watermark_text", "© Jane Doe"),
            ("watermark_font", "Liberation Sans"),
            ("watermark_font_size", "32"),
            ("watermark_opacity", "80"),
            ("watermark_vpos", "top"),
            ("watermark_hpos", "left"),
        ]);
        let config = WatermarkConfig::from_settings(|k| map.get(k).cloned());

        assert!(config.is_active());
        assert_eq!(config.text, "© Jane Doe");
        assert_eq!(config.font_family, "Liberation Sans");
        assert_eq!(config.font_size, 32.0);
        assert_eq!(config.opacity, 80);
        assert_eq!(config.vertical, VerticalPos::Top);
        assert_eq!(config.horizontal, HorizontalPos::Left);
    }

    #[test]
    fn from_settings_coerces_garbage_to_defaults() {
        let map = settings(&[
            ("watermark_enabled", "1"),
            ("watermark_text", "x"),
            ("watermark_font_size", "not-a-number"),
            ("watermark_opacity", "250"),
            ("watermark_vpos", "middle"),
        ]);
        let config = WatermarkConfig::from_settings(|k| map.get(k).cloned());

        // Malformed values are best-effort defaults, never an error.
        assert_eq!(config.font_size, WatermarkConfig::default().font_size);
        assert_eq!(config.opacity, WatermarkConfig::default().opacity);
        assert_eq!(config.vertical, VerticalPos::Bottom);
        assert!(config.is_active());
    }

    #[test]
    fn from_settings_empty_store_is_default() {
        let config = WatermarkConfig::from_settings(|_| None);
        assert!(!config.is_active());
        assert_eq!(config.font_family, "DejaVu Sans");
    }
}
