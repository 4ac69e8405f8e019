//! Line layout: bidi reordering with `unicode-bidi`, glyph shaping with `rustybuzz`.

use ab_glyph::GlyphId;
use rustybuzz::{Direction, UnicodeBuffer};
use unicode_bidi::{BidiInfo, Level};

use super::font_book::{units_to_px, FontFace};
use super::TextDirection;

/// A shaped glyph, positioned in pixels relative to the line's left edge and baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PlacedGlyph {
    pub id: GlyphId,
    pub x: f32,
    /// Downward offset from the baseline.
    pub y: f32,
}

/// Glyphs of one line in visual (left to right) order.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ShapedLine {
    pub glyphs: Vec<PlacedGlyph>,
    pub width: f32,
}

/// Lays out `text` as a single line whose base direction is `direction`.
///
/// Runs of the opposite direction keep their own order, so digits and Latin words inside an
/// Urdu name read left to right. Arabic script runs are shaped into their joined forms.
pub(crate) fn shape_line(
    face: &FontFace,
    text: &str,
    font_size: f64,
    direction: TextDirection,
) -> ShapedLine {
    let mut line = ShapedLine::default();
    if text.is_empty() {
        return line;
    }
    let Some(shaper) = rustybuzz::Face::from_slice(face.data(), 0) else {
        tracing::warn!(family = face.family(), "font cannot be shaped; nothing laid out");
        return line;
    };
    let px_per_unit = units_to_px(face.font(), font_size);
    let base_level = match direction {
        TextDirection::Ltr => Level::ltr(),
        TextDirection::Rtl => Level::rtl(),
    };

    let bidi = BidiInfo::new(text, Some(base_level));
    for paragraph in &bidi.paragraphs {
        let (levels, runs) = bidi.visual_runs(paragraph, paragraph.range.clone());
        for run in runs {
            let run_direction = if levels[run.start].is_rtl() {
                Direction::RightToLeft
            } else {
                Direction::LeftToRight
            };
            let mut buffer = UnicodeBuffer::new();
            buffer.push_str(&text[run]);
            buffer.set_direction(run_direction);
            buffer.guess_segment_properties();

            let shaped = rustybuzz::shape(&shaper, &[], buffer);
            for (info, position) in shaped.glyph_infos().iter().zip(shaped.glyph_positions()) {
                line.glyphs.push(PlacedGlyph {
                    id: GlyphId(u16::try_from(info.glyph_id).unwrap_or(0)),
                    x: line.width + position.x_offset as f32 * px_per_unit,
                    y: -(position.y_offset as f32) * px_per_unit,
                });
                line.width += position.x_advance as f32 * px_per_unit;
            }
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::FontBook;
    use ab_glyph::Font;

    fn bundled() -> FontFace {
        FontBook::new()
            .resolve("sans-serif", "")
            .cloned()
            .unwrap()
    }

    fn glyph_ids(line: &ShapedLine) -> Vec<u16> {
        line.glyphs.iter().map(|glyph| glyph.id.0).collect()
    }

    fn position_of(line: &ShapedLine, face: &FontFace, ch: char) -> usize {
        let id = face.font().glyph_id(ch);
        line.glyphs
            .iter()
            .position(|glyph| glyph.id == id)
            .unwrap_or_else(|| panic!("{ch} not laid out"))
    }

    #[test]
    fn latin_run_is_not_mirrored_in_right_to_left_line() {
        let face = bundled();
        let ltr = shape_line(&face, "John", 48.0, TextDirection::Ltr);
        let rtl = shape_line(&face, "John", 48.0, TextDirection::Rtl);
        assert_eq!(glyph_ids(&rtl), glyph_ids(&ltr));
        assert_eq!(position_of(&rtl, &face, 'J'), 0);
    }

    #[test]
    fn digits_keep_left_to_right_order_inside_urdu() {
        let face = bundled();
        let line = shape_line(&face, "علی 12", 48.0, TextDirection::Rtl);
        let one = position_of(&line, &face, '1');
        let two = position_of(&line, &face, '2');
        assert!(one < two);
        // Right-to-left base: the number, written last, sits at the left end.
        assert!(two < 2, "digits should lead the visual line: {:?}", glyph_ids(&line));
    }

    #[test]
    fn arabic_letters_are_joined() {
        let face = bundled();
        let line = shape_line(&face, "علی", 48.0, TextDirection::Rtl);
        let isolated: Vec<u16> = "علی".chars().map(|ch| face.font().glyph_id(ch).0).collect();
        assert!(!line.glyphs.is_empty());
        assert!(
            glyph_ids(&line).iter().any(|id| !isolated.contains(id)),
            "expected contextual forms, got isolated glyphs"
        );
    }

    #[test]
    fn width_is_sum_of_advances() {
        let face = bundled();
        let line = shape_line(&face, "Hi", 20.0, TextDirection::Ltr);
        assert_eq!(line.glyphs.len(), 2);
        assert_eq!(line.glyphs[0].x, 0.0);
        assert!(line.glyphs[1].x > 0.0 && line.glyphs[1].x < line.width);
        assert_eq!(shape_line(&face, "", 20.0, TextDirection::Ltr), ShapedLine::default());
    }
}
