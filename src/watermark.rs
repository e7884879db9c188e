//! Watermark overlay: stamp configurable text onto an image copy.
//!
//! The contract is deliberately forgiving. [`apply`] writes exactly one
//! file at the destination and reports whether a watermark actually landed:
//!
//! - config inactive (disabled, or empty text) → plain byte copy, `Ok(false)`
//! - decode, font, draw, or encode failure → plain byte copy, `Ok(false)`
//! - missing source, or a fallback copy that itself fails → `Err`
//!
//! Nothing in the drawing path is allowed to kill an export; the worst a
//! bad image or an unavailable font can do is produce an unwatermarked
//! copy. The source file is never mutated.
//!
//! ## Drawing
//!
//! The source is decoded and composited in RGBA: a semi-transparent dark
//! rectangle (70% of the text alpha) backs the text for legibility over
//! busy backgrounds, then the text is drawn at the configured opacity
//! (0–100 mapped onto 0–255) and the result is flattened to RGB before
//! encoding. For small images the font size shrinks proportionally once
//! the shorter edge drops under 200 px, with an 8 px readability floor.
//!
//! ## Fonts
//!
//! Fonts load at runtime from the OS font directories. The configured
//! family is tried first, then a fixed fallback list of faces that ship
//! with practically every desktop. No usable font at all degrades to a
//! plain copy.

use crate::types::{HorizontalPos, VerticalPos, WatermarkConfig};
use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum WatermarkError {
    #[error("source image missing: {0}")]
    SourceMissing(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorter-edge size under which the font scales down proportionally.
const READABILITY_THRESHOLD: u32 = 200;
/// Smallest font size ever used, regardless of image size.
const MIN_FONT_SIZE: f32 = 8.0;
/// Padding from the image edge, as a fraction of each dimension.
const EDGE_PADDING: f32 = 0.02;

/// Copy `source` to `dest`, watermarked when the config is active.
///
/// Returns whether a watermark was applied. See the module docs for the
/// failure policy.
pub fn apply(
    source: &Path,
    dest: &Path,
    config: &WatermarkConfig,
) -> Result<bool, WatermarkError> {
    if !source.exists() {
        return Err(WatermarkError::SourceMissing(source.to_path_buf()));
    }
    if !config.is_active() {
        std::fs::copy(source, dest)?;
        return Ok(false);
    }
    match stamp(source, dest, config) {
        Ok(()) => Ok(true),
        Err(reason) => {
            warn!(
                source = %source.display(),
                %reason,
                "watermark failed, falling back to plain copy"
            );
            std::fs::copy(source, dest)?;
            Ok(false)
        }
    }
}

/// The fallible drawing path. Any error here means "copy instead".
fn stamp(source: &Path, dest: &Path, config: &WatermarkConfig) -> Result<(), String> {
    let img = image::open(source).map_err(|e| format!("decode failed: {e}"))?;
    let font = load_font(&config.font_family).ok_or("no usable font found")?;

    let mut base = img.to_rgba8();
    let (width, height) = base.dimensions();
    let text = config.text.trim();

    let size = scaled_font_size(config.font_size, width, height);
    let scale = PxScale::from(size);
    let (text_w, text_h) = text_size(scale, &font, text);
    let (x, y) = anchor(config, width, height, text_w, text_h);

    let text_alpha = (config.opacity as u32 * 255 / 100) as u8;
    let backing_alpha = (text_alpha as u32 * 70 / 100) as u8;

    // Draw onto a transparent canvas and composite, so both the backing
    // rectangle and the glyphs alpha-blend against the photograph.
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    let margin = (size / 6.0).max(2.0) as i32;
    let backing = Rect::at(x - margin, y - margin).of_size(
        text_w + 2 * margin as u32,
        text_h + 2 * margin as u32,
    );
    draw_filled_rect_mut(&mut canvas, backing, Rgba([0, 0, 0, backing_alpha]));
    draw_text_mut(
        &mut canvas,
        Rgba([255, 255, 255, text_alpha]),
        x,
        y,
        scale,
        &font,
        text,
    );
    image::imageops::overlay(&mut base, &canvas, 0, 0);

    // Flatten to opaque RGB; format is inferred from the destination
    // extension (JPEG can't carry the alpha channel anyway).
    let flattened = DynamicImage::ImageRgba8(base).to_rgb8();
    flattened
        .save(dest)
        .map_err(|e| format!("encode failed: {e}"))?;

    debug!(dest = %dest.display(), "watermark applied");
    Ok(())
}

/// Shrink the requested size proportionally on small images, never below
/// the readability floor.
fn scaled_font_size(requested: f32, width: u32, height: u32) -> f32 {
    let min_dim = width.min(height);
    if min_dim < READABILITY_THRESHOLD {
        (requested * min_dim as f32 / READABILITY_THRESHOLD as f32).max(MIN_FONT_SIZE)
    } else {
        requested
    }
}

/// Resolve the text's top-left corner from the position enums, with 2%
/// edge padding, clamped so oversized text still starts on-canvas.
fn anchor(
    config: &WatermarkConfig,
    width: u32,
    height: u32,
    text_w: u32,
    text_h: u32,
) -> (i32, i32) {
    let pad_x = (width as f32 * EDGE_PADDING) as i32;
    let pad_y = (height as f32 * EDGE_PADDING) as i32;
    let x = match config.horizontal {
        HorizontalPos::Left => pad_x,
        HorizontalPos::Center => (width as i32 - text_w as i32) / 2,
        HorizontalPos::Right => width as i32 - text_w as i32 - pad_x,
    };
    let y = match config.vertical {
        VerticalPos::Top => pad_y,
        VerticalPos::Bottom => height as i32 - text_h as i32 - pad_y,
    };
    (x.max(0), y.max(0))
}

/// Directories searched for font files, in order.
fn font_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/usr/share/fonts"),
        PathBuf::from("/usr/local/share/fonts"),
        PathBuf::from("/System/Library/Fonts"),
        PathBuf::from("/Library/Fonts"),
        PathBuf::from("C:\\Windows\\Fonts"),
    ];
    if let Ok(home) = std::env::var("HOME") {
        dirs.push(PathBuf::from(home).join(".local/share/fonts"));
    }
    dirs
}

/// Families tried when the configured one can't be found.
const FALLBACK_FAMILIES: &[&str] = &[
    "DejaVuSans",
    "LiberationSans-Regular",
    "FreeSans",
    "Arial",
    "Helvetica",
];

/// Load the configured family, or the first fallback that resolves.
fn load_font(family: &str) -> Option<FontVec> {
    for candidate in std::iter::once(family).chain(FALLBACK_FAMILIES.iter().copied()) {
        if let Some(path) = find_font_file(candidate) {
            match std::fs::read(&path).ok().and_then(|data| FontVec::try_from_vec(data).ok()) {
                Some(font) => {
                    debug!(family = candidate, path = %path.display(), "font loaded");
                    return Some(font);
                }
                None => warn!(path = %path.display(), "font file unreadable, trying next"),
            }
        }
    }
    None
}

/// Find a `.ttf`/`.otf` whose file stem matches the family name, ignoring
/// case, spaces, and dashes ("Liberation Sans" matches
/// `LiberationSans-Regular.ttf` via the fallback list, and
/// `liberation-sans.ttf` directly).
fn find_font_file(family: &str) -> Option<PathBuf> {
    let wanted = normalize(family);
    for dir in font_dirs() {
        if !dir.is_dir() {
            continue;
        }
        for entry in walkdir::WalkDir::new(&dir)
            .max_depth(4)
            .into_iter()
            .filter_map(Result::ok)
        {
            let path = entry.path();
            let is_font = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"));
            if !is_font {
                continue;
            }
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(normalize)
                .unwrap_or_default();
            if stem == wanted {
                return Some(path.to_path_buf());
            }
        }
    }
    None
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .to_lowercase()
}
