//! Compositing the name onto the template background.
//!
//! The same [`render`] call drives the live preview and the exported file, so an export is laid
//! out exactly like the last preview for the same text and configuration.

pub mod export;
mod surface;

use std::fmt;

use image::RgbaImage;

use crate::background::BackgroundImage;
use crate::geometry::{Color, ImagePoint, ImageSize};
use crate::template::{Alignment, TemplateConfig};
use crate::text::TextDirection;

pub use export::{certificate_file_name, encode_png, save_png, ExportError, ExportResult};
pub use surface::PixelSurface;

#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: f64,
}

impl FontSpec {
    pub fn new(family: impl Into<String>, size: f64) -> Self {
        Self {
            family: family.into(),
            size,
        }
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        Self::new("sans-serif", 10.0)
    }
}

impl fmt::Display for FontSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px {}", self.size, self.family)
    }
}

/// A 2D drawing target with canvas-like state.
///
/// Text is top-anchored: the point given to [`RasterSurface::fill_text`] is the top of the glyph
/// box, matching the boxes the placement controller hit-tests against.
pub trait RasterSurface {
    /// Resizes to `size` and clears every pixel. Drawing state returns to defaults.
    fn reset(&mut self, size: ImageSize);
    /// Copies `image` onto the surface with its top-left corner at (`x`, `y`).
    fn draw_image(&mut self, image: &RgbaImage, x: i64, y: i64);
    fn set_direction(&mut self, direction: TextDirection);
    fn set_font(&mut self, font: FontSpec);
    fn set_fill_color(&mut self, color: Color);
    fn set_text_align(&mut self, alignment: Alignment);
    fn fill_text(&mut self, text: &str, at: ImagePoint);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered,
    /// The background has not finished loading; nothing was drawn.
    NotReady,
}

/// Draws `background` and `text` onto `surface` at the background's native resolution.
pub fn render<S>(
    surface: &mut S,
    background: &BackgroundImage,
    text: &str,
    config: &TemplateConfig,
) -> RenderOutcome
where
    S: RasterSurface + ?Sized,
{
    let Some(image) = background.ready() else {
        tracing::trace!("render skipped; background not ready");
        return RenderOutcome::NotReady;
    };

    surface.reset(ImageSize::new(image.width(), image.height()));
    surface.draw_image(image, 0, 0);
    surface.set_direction(config.language.direction());
    surface.set_font(FontSpec::new(config.font.clone(), config.font_size));
    surface.set_fill_color(config.color);
    surface.set_text_align(config.alignment);
    surface.fill_text(text, config.anchor);
    RenderOutcome::Rendered
}
