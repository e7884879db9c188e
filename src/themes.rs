//! Built-in themes for exported sites.
//!
//! A theme is a named renderer from site data to a complete HTML page.
//! HTML is generated with [maud](https://maud.lambda.xyz/) — compile-time
//! checked, type-safe, auto-escaped — so a theme is Rust code, not a
//! template file that can go missing at runtime. The set of theme names is
//! therefore fixed at build time, but an *unknown requested name* is still
//! a distinguishable condition ([`ThemeError::Unknown`]) so the assembler
//! can log it and fall back to [`DEFAULT_THEME`].
//!
//! The site description accepts markdown, converted with pulldown-cmark.
//! Styling is embedded at compile time from `static/export.css`; the
//! exported page is fully self-contained apart from its `images/` tree.

use crate::types::{GallerySelection, ImageRecord};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Parser, html as md_html};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThemeError {
    #[error("unknown theme: {0}")]
    Unknown(String),
}

/// Theme used when the requested one doesn't exist.
pub const DEFAULT_THEME: &str = "default";

/// Names accepted by [`render`].
pub const THEME_NAMES: &[&str] = &["default", "slate"];

/// Data a theme renders: site metadata plus the selected galleries with
/// the images that actually made it into the staged `images/` tree.
pub struct SitePage<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub galleries: &'a [GallerySelection],
}

/// Render the named theme. Unknown names are an error — the caller
/// decides whether to fall back.
pub fn render(theme: &str, page: &SitePage<'_>) -> Result<Markup, ThemeError> {
    match theme {
        "default" => Ok(site_document(page, None)),
        "slate" => Ok(site_document(page, Some("slate"))),
        other => Err(ThemeError::Unknown(other.to_string())),
    }
}

const CSS: &str = include_str!("../static/export.css");

/// Staged path of an image, relative to the exported site root.
fn image_href(image: &ImageRecord) -> String {
    format!("images/gallery_{}/{}", image.gallery_id, image.filename)
}

fn site_document(page: &SitePage<'_>, body_class: Option<&str>) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (page.title) }
                style { (CSS) }
            }
            body class=[body_class] {
                header.site-header {
                    h1 { (page.title) }
                    @if let Some(description) = page.description {
                        div.site-description { (markdown(description)) }
                    }
                }
                main {
                    @for selection in page.galleries {
                        (gallery_section(selection))
                    }
                }
                footer.site-footer {
                    p { "Generated with shutterbox" }
                }
            }
        }
    }
}

fn gallery_section(selection: &GallerySelection) -> Markup {
    html! {
        section.gallery {
            header.gallery-header {
                h2 { (selection.gallery.title) }
                @if let Some(description) = &selection.gallery.description {
                    p.gallery-description { (description) }
                }
            }
            div.image-grid {
                @for image in &selection.images {
                    (image_figure(image))
                }
            }
        }
    }
}

fn image_figure(image: &ImageRecord) -> Markup {
    let alt = image.title.as_deref().unwrap_or(&image.filename);
    html! {
        figure.photo {
            img src=(image_href(image)) alt=(alt) loading="lazy";
            figcaption {
                @if let Some(title) = &image.title {
                    span.photo-title { (title) }
                }
                @if let Some(description) = &image.description {
                    p.photo-description { (description) }
                }
                @let tech: Vec<&str> = [&image.camera, &image.lens, &image.settings]
                    .into_iter()
                    .filter_map(|field| field.as_deref())
                    .collect();
                @if !tech.is_empty() {
                    p.photo-tech { (tech.join(" · ")) }
                }
            }
        }
    }
}

/// Convert markdown to inline HTML (site descriptions only).
fn markdown(source: &str) -> Markup {
    let parser = Parser::new(source);
    let mut out = String::new();
    md_html::push_html(&mut out, parser);
    PreEscaped(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::image;
    use crate::types::Gallery;

    fn sample_page() -> Vec<GallerySelection> {
        let mut first = image(1, 7, "dawn.jpg", 0);
        first.title = Some("Dawn".to_string());
        first.camera = Some("Fuji X-T5".to_string());
        first.settings = Some("f/8 1/250s ISO 200".to_string());
        let second = image(2, 7, "dusk.jpg", 1);

        vec![GallerySelection {
            gallery: Gallery {
                id: 7,
                title: "Landscapes".to_string(),
                description: Some("Wide open spaces".to_string()),
            },
            images: vec![first, second],
        }]
    }

    #[test]
    fn default_theme_contains_titles_and_filenames() {
        let galleries = sample_page();
        let page = SitePage {
            title: "My Portfolio",
            description: None,
            galleries: &galleries,
        };
        let markup = render("default", &page).unwrap().into_string();

        assert!(markup.contains("My Portfolio"));
        assert!(markup.contains("Landscapes"));
        assert!(markup.contains("images/gallery_7/dawn.jpg"));
        assert!(markup.contains("images/gallery_7/dusk.jpg"));
        assert!(markup.contains("Fuji X-T5"));
    }

    #[test]
    fn image_order_is_preserved_in_markup() {
        let galleries = sample_page();
        let page = SitePage {
            title: "T",
            description: None,
            galleries: &galleries,
        };
        let markup = render("default", &page).unwrap().into_string();

        let dawn = markup.find("dawn.jpg").unwrap();
        let dusk = markup.find("dusk.jpg").unwrap();
        assert!(dawn < dusk);
    }

    #[test]
    fn slate_theme_sets_body_class() {
        let galleries = sample_page();
        let page = SitePage {
            title: "T",
            description: None,
            galleries: &galleries,
        };
        let markup = render("slate", &page).unwrap().into_string();
        assert!(markup.contains(r#"class="slate""#));
    }

    #[test]
    fn unknown_theme_is_distinguishable() {
        let page = SitePage {
            title: "T",
            description: None,
            galleries: &[],
        };
        let result = render("vaporwave", &page);
        assert!(matches!(result, Err(ThemeError::Unknown(name)) if name == "vaporwave"));
    }

    #[test]
    fn site_description_renders_markdown() {
        let page = SitePage {
            title: "T",
            description: Some("Photos that are **bold**."),
            galleries: &[],
        };
        let markup = render("default", &page).unwrap().into_string();
        assert!(markup.contains("<strong>bold</strong>"));
    }

    #[test]
    fn html_in_titles_is_escaped() {
        let mut galleries = sample_page();
        galleries[0].gallery.title = "<script>alert('x')</script>".to_string();
        let page = SitePage {
            title: "T",
            description: None,
            galleries: &galleries,
        };
        let markup = render("default", &page).unwrap().into_string();
        assert!(!markup.contains("<script>alert"));
        assert!(markup.contains("&lt;script&gt;"));
    }
}
