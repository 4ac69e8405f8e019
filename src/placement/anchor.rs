use crate::geometry::{ImagePoint, TextBox};
use crate::template::Alignment;
use crate::text::TextMetrics;

/// Computes the box the text occupies for a given anchor.
///
/// The rendered glyph run is placed through this same function, so the box used for hit-testing
/// is always the one on screen. The top edge sits on the anchor for every alignment.
pub fn resolve_box(anchor: ImagePoint, alignment: Alignment, metrics: TextMetrics) -> TextBox {
    let left = match alignment {
        Alignment::Left => anchor.x,
        Alignment::Center => anchor.x - metrics.width / 2.0,
        Alignment::Right => anchor.x - metrics.width,
    };
    TextBox::new(left, anchor.y, metrics.width, metrics.height)
}
