use crate::geometry::{ImagePoint, TextBox};

/// Inclusive containment test on all four edges.
pub fn is_inside(point: ImagePoint, text_box: TextBox) -> bool {
    point.x >= text_box.left
        && point.x <= text_box.right()
        && point.y >= text_box.top
        && point.y <= text_box.bottom()
}
