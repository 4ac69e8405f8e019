use crate::geometry::{DisplayRect, ImagePoint, ImageSize};

/// Maps a viewport pointer position into image space.
///
/// The surface may be scaled non-uniformly by layout, so each axis gets its own factor. The
/// display rect must be the one measured for this very event; nothing here is cached.
/// Returns `None` when the rect is degenerate and cannot be inverted.
pub fn to_image_space(
    pointer_x: f64,
    pointer_y: f64,
    display_rect: DisplayRect,
    image: ImageSize,
) -> Option<ImagePoint> {
    if !is_invertible(display_rect.width) || !is_invertible(display_rect.height) {
        tracing::debug!(?display_rect, "ignoring pointer over degenerate display rect");
        return None;
    }

    let scale_x = f64::from(image.width) / display_rect.width;
    let scale_y = f64::from(image.height) / display_rect.height;
    Some(ImagePoint::new(
        (pointer_x - display_rect.left) * scale_x,
        (pointer_y - display_rect.top) * scale_y,
    ))
}

fn is_invertible(extent: f64) -> bool {
    extent.is_finite() && extent > 0.0
}
