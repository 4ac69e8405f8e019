use std::rc::Rc;

use ab_glyph::{point, Font};
use image::{imageops, Rgba, RgbaImage};
use imageproc::pixelops::weighted_sum;

use crate::geometry::{Color, ImagePoint, ImageSize, TextBox};
use crate::placement::resolve_box;
use crate::template::Alignment;
use crate::text::font_book::{ascent, em_scale};
use crate::text::shaping::{shape_line, ShapedLine};
use crate::text::{FontBook, FontFace, TextDirection, TextMeasure};

use super::{FontSpec, RasterSurface};

#[derive(Debug, Clone, Default)]
struct DrawState {
    font: FontSpec,
    color: Color,
    alignment: Alignment,
    direction: TextDirection,
}

/// Software surface backed by an RGBA bitmap.
///
/// Text goes through the same [`FontBook`] used for hit-testing, and its left edge is placed
/// with [`resolve_box`], so what is drawn and what is draggable cannot drift apart.
#[derive(Debug)]
pub struct PixelSurface {
    image: RgbaImage,
    fonts: Rc<FontBook>,
    state: DrawState,
}

impl PixelSurface {
    pub fn new(fonts: Rc<FontBook>) -> Self {
        Self {
            image: RgbaImage::new(0, 0),
            fonts,
            state: DrawState::default(),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.image.width(), self.image.height())
    }

    /// Box the next `fill_text` call would cover with the current state.
    pub fn text_box(&self, text: &str, at: ImagePoint) -> TextBox {
        let DrawState {
            font,
            alignment,
            direction,
            ..
        } = &self.state;
        let metrics = self
            .fonts
            .measure_run(text, &font.family, font.size, *direction);
        resolve_box(at, *alignment, metrics)
    }
}

impl RasterSurface for PixelSurface {
    fn reset(&mut self, size: ImageSize) {
        self.image = RgbaImage::new(size.width, size.height);
        self.state = DrawState::default();
    }

    fn draw_image(&mut self, image: &RgbaImage, x: i64, y: i64) {
        imageops::replace(&mut self.image, image, x, y);
    }

    fn set_direction(&mut self, direction: TextDirection) {
        self.state.direction = direction;
    }

    fn set_font(&mut self, font: FontSpec) {
        self.state.font = font;
    }

    fn set_fill_color(&mut self, color: Color) {
        self.state.color = color;
    }

    fn set_text_align(&mut self, alignment: Alignment) {
        self.state.alignment = alignment;
    }

    fn fill_text(&mut self, text: &str, at: ImagePoint) {
        if text.is_empty() {
            return;
        }
        let text_box = self.text_box(text, at);
        let fonts = Rc::clone(&self.fonts);
        let DrawState {
            font,
            color,
            direction,
            ..
        } = &self.state;
        let Some(face) = fonts.resolve(&font.family, text) else {
            tracing::warn!(font = %font, "no font face available; text not drawn");
            return;
        };

        let line = shape_line(face, text, font.size, *direction);
        let origin = ImagePoint::new(text_box.left, text_box.top);
        draw_line(&mut self.image, face, font.size, &line, origin, color.to_rgba());
    }
}

/// Rasterizes a shaped line with its top-left corner at `origin`.
fn draw_line(
    image: &mut RgbaImage,
    face: &FontFace,
    font_size: f64,
    line: &ShapedLine,
    origin: ImagePoint,
    color: Rgba<u8>,
) {
    let font = face.font();
    let scale = em_scale(font, font_size);
    let left = origin.x as f32;
    let baseline = (origin.y + ascent(font, font_size)) as f32;
    let (width, height) = (i64::from(image.width()), i64::from(image.height()));

    for glyph in &line.glyphs {
        let positioned = glyph
            .id
            .with_scale_and_position(scale, point(left + glyph.x, baseline + glyph.y));
        let Some(outlined) = font.outline_glyph(positioned) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, coverage| {
            let x = bounds.min.x as i64 + i64::from(gx);
            let y = bounds.min.y as i64 + i64::from(gy);
            if x < 0 || y < 0 || x >= width || y >= height {
                return;
            }
            let coverage = coverage.clamp(0.0, 1.0);
            let (x, y) = (x as u32, y as u32);
            let blended = weighted_sum(*image.get_pixel(x, y), color, 1.0 - coverage, coverage);
            image.put_pixel(x, y, blended);
        });
    }
}
