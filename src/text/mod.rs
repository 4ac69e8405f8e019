//! Text measurement and font lookup.

pub mod catalog;
pub(crate) mod font_book;
pub(crate) mod shaping;

pub use catalog::{choices_for, FontChoice, FONT_CHOICES};
pub use font_book::{FontBook, FontError, FontFace, FontResult, BUNDLED_FAMILY};

/// Writing direction of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

/// Glyph box size of a measured run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
}

impl TextMetrics {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Host text measurement.
///
/// Implementations never fail: an unavailable font falls back to a default metric. The height is
/// the font size rather than the measured ascent plus descent.
pub trait TextMeasure {
    fn measure(&self, text: &str, font: &str, font_size: f64) -> TextMetrics;

    /// Measures a run laid out in `direction`. Bidi reordering and shaping can change the width
    /// of mixed-script text, so callers that draw should measure the same way.
    fn measure_run(
        &self,
        text: &str,
        font: &str,
        font_size: f64,
        direction: TextDirection,
    ) -> TextMetrics {
        let _ = direction;
        self.measure(text, font, font_size)
    }
}

/// Average advance of a glyph in ems when no face can be resolved at all.
pub(crate) const FALLBACK_ADVANCE_EM: f64 = 0.62;

pub(crate) fn fallback_width(text: &str, font_size: f64) -> f64 {
    text.chars().count() as f64 * font_size * FALLBACK_ADVANCE_EM
}

/// Splits a CSS-like font list into bare family names.
pub(crate) fn font_families(font: &str) -> impl Iterator<Item = &str> {
    font.split(',')
        .map(|family| family.trim().trim_matches(|ch| ch == '"' || ch == '\''))
        .filter(|family| !family.is_empty())
}

pub(crate) fn is_generic_family(family: &str) -> bool {
    const GENERIC: &[&str] = &[
        "serif",
        "sans-serif",
        "monospace",
        "cursive",
        "fantasy",
        "system-ui",
    ];
    GENERIC
        .iter()
        .any(|generic| generic.eq_ignore_ascii_case(family))
}
