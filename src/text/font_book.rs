use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use thiserror::Error;
use ttf_parser::{name_id, Face};

use crate::config::AppConfig;

use super::shaping::shape_line;
use super::{
    fallback_width, font_families, is_generic_family, TextDirection, TextMeasure, TextMetrics,
};

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf"];

/// Family of the face compiled into the binary. It covers Latin and Arabic script, so a name is
/// always drawn even on a machine without configured fonts.
pub const BUNDLED_FAMILY: &str = "DejaVu Sans";
static BUNDLED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

pub type FontResult<T> = std::result::Result<T, FontError>;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to read font {path}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to list font directory {path}")]
    ReadDir { path: PathBuf, source: io::Error },
    #[error("unsupported or corrupt font data")]
    InvalidFont,
}

/// A font face: outlines come from `ab_glyph`, shaping reads the raw tables.
#[derive(Clone)]
pub struct FontFace {
    family: String,
    font: FontArc,
    data: Arc<[u8]>,
}

impl FontFace {
    fn from_data(data: Vec<u8>, family: Option<&str>) -> FontResult<Self> {
        let family = match family {
            Some(family) => family.to_string(),
            None => read_family_name(&data).ok_or(FontError::InvalidFont)?,
        };
        if rustybuzz::Face::from_slice(&data, 0).is_none() {
            return Err(FontError::InvalidFont);
        }
        let data: Arc<[u8]> = Arc::from(data);
        let font = FontArc::try_from_vec(data.to_vec()).map_err(|_| FontError::InvalidFont)?;
        Ok(Self { family, font, data })
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub(crate) fn font(&self) -> &FontArc {
        &self.font
    }

    pub(crate) fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whether every visible character of `text` has a glyph in this face.
    pub fn covers(&self, text: &str) -> bool {
        text.chars()
            .filter(|ch| !ch.is_whitespace() && !ch.is_control())
            .all(|ch| self.font.glyph_id(ch).0 != 0)
    }
}

impl fmt::Debug for FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontFace")
            .field("family", &self.family)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Registered font faces addressed by family name, backed by the bundled face.
#[derive(Debug, Clone)]
pub struct FontBook {
    faces: Vec<FontFace>,
    bundled: Option<FontFace>,
}

impl Default for FontBook {
    fn default() -> Self {
        Self::new()
    }
}

impl FontBook {
    /// A book holding only the bundled face.
    pub fn new() -> Self {
        let bundled = match FontFace::from_data(BUNDLED_FONT.to_vec(), Some(BUNDLED_FAMILY)) {
            Ok(face) => Some(face),
            Err(err) => {
                tracing::error!(%err, "bundled font failed to load");
                None
            }
        };
        Self {
            faces: Vec::new(),
            bundled,
        }
    }

    /// Loads the configured family overrides first, then every font in the configured
    /// directories. Failures are logged and skipped.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut book = Self::new();
        for (family, path) in &config.fonts {
            if let Err(err) = book.load_file(path, Some(family)) {
                tracing::warn!(?err, family = %family, path = %path.display(), "skipping font override");
            }
        }
        for dir in &config.font_dirs {
            if let Err(err) = book.load_dir(dir) {
                tracing::warn!(?err, dir = %dir.display(), "skipping font directory");
            }
        }
        tracing::info!(faces = book.faces.len(), "font book ready");
        book
    }

    /// True when no face besides the bundled one is registered.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.faces.iter().map(FontFace::family)
    }

    /// Registers a face. The family name comes from the font's name table unless overridden.
    pub fn add_font_data(&mut self, data: Vec<u8>, family: Option<&str>) -> FontResult<String> {
        let face = FontFace::from_data(data, family)?;
        tracing::debug!(family = %face.family, "registered font face");
        let family = face.family.clone();
        self.faces.push(face);
        Ok(family)
    }

    pub fn load_file(&mut self, path: &Path, family: Option<&str>) -> FontResult<String> {
        let data = fs::read(path).map_err(|source| FontError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.add_font_data(data, family)
    }

    /// Loads every `.ttf`/`.otf` file directly inside `dir`, returning how many were added.
    pub fn load_dir(&mut self, dir: &Path) -> FontResult<usize> {
        let entries = fs::read_dir(dir).map_err(|source| FontError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut loaded = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() || !has_font_extension(&path) {
                continue;
            }
            match self.load_file(&path, None) {
                Ok(_) => loaded += 1,
                Err(err) => {
                    tracing::warn!(?err, path = %path.display(), "skipping unreadable font");
                }
            }
        }
        Ok(loaded)
    }

    fn all_faces(&self) -> impl Iterator<Item = &FontFace> {
        self.faces.iter().chain(self.bundled.as_ref())
    }

    /// Resolves a CSS-like font list to the face used for `text`.
    ///
    /// Named families are tried in order. If none is registered, the first face that has glyphs
    /// for every character of `text` stands in, so Urdu text falls back to a face with Arabic
    /// script rather than to a Latin-only one.
    pub fn resolve(&self, font: &str, text: &str) -> Option<&FontFace> {
        self.resolve_exact(font)
            .or_else(|| self.all_faces().find(|face| face.covers(text)))
            .or_else(|| self.all_faces().next())
    }

    /// Like [`FontBook::resolve`] without any fallback.
    pub fn resolve_exact(&self, font: &str) -> Option<&FontFace> {
        font_families(font)
            .filter(|family| !is_generic_family(family))
            .find_map(|family| {
                self.all_faces()
                    .find(|face| face.family.eq_ignore_ascii_case(family))
            })
    }
}

impl TextMeasure for FontBook {
    fn measure(&self, text: &str, font: &str, font_size: f64) -> TextMetrics {
        self.measure_run(text, font, font_size, TextDirection::Ltr)
    }

    fn measure_run(
        &self,
        text: &str,
        font: &str,
        font_size: f64,
        direction: TextDirection,
    ) -> TextMetrics {
        let width = match self.resolve(font, text) {
            Some(face) => f64::from(shape_line(face, text, font_size, direction).width),
            None => {
                tracing::debug!(font = %font, "no font face; using fallback metric");
                fallback_width(text, font_size)
            }
        };
        TextMetrics::new(width, font_size)
    }
}

/// Pixel scale for a CSS-style font size, where the size is the em height.
pub(crate) fn em_scale(font: &FontArc, font_size: f64) -> PxScale {
    PxScale::from(units_to_px(font, font_size) * font.height_unscaled())
}

/// Pixels per font unit at `font_size`.
pub(crate) fn units_to_px(font: &FontArc, font_size: f64) -> f32 {
    let units_per_em = font.units_per_em().unwrap_or(1000.0).max(1.0);
    font_size as f32 / units_per_em
}

pub(crate) fn ascent(font: &FontArc, font_size: f64) -> f64 {
    f64::from(font.as_scaled(em_scale(font, font_size)).ascent())
}

fn has_font_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            FONT_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

fn read_family_name(data: &[u8]) -> Option<String> {
    let face = Face::parse(data, 0).ok()?;
    let mut fallback = None;
    for name in face.names() {
        if name.name_id == name_id::TYPOGRAPHIC_FAMILY {
            if let Some(value) = name.to_string() {
                return Some(value);
            }
        } else if name.name_id == name_id::FAMILY && fallback.is_none() {
            fallback = name.to_string();
        }
    }
    fallback
}
