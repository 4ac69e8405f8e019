//! Editing session for one template: every mutation re-renders the preview before returning.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::background::BackgroundImage;
use crate::geometry::{Color, DisplayRect, ImagePoint, TextBox};
use crate::placement::{
    resolve_box, to_image_space, PlacementController, PlacementEvent, PlacementMode,
    PlacementOutcome,
};
use crate::render::{
    self, certificate_file_name, encode_png, save_png, ExportError, ExportResult, PixelSurface,
    RenderOutcome,
};
use crate::template::{Alignment, Language, Template, TemplateConfig, TemplateResult};
use crate::text::{FontBook, TextMeasure};

#[derive(Debug)]
pub struct EditorSession {
    template: Template,
    preview_text: String,
    background: BackgroundImage,
    controller: PlacementController,
    fonts: Rc<FontBook>,
    surface: PixelSurface,
}

impl EditorSession {
    /// Opens a template and starts decoding its background off the calling thread.
    pub fn open(template: Template, fonts: Rc<FontBook>, preview_text: impl Into<String>) -> Self {
        let background = BackgroundImage::spawn_decode(template.image.bytes().to_vec());
        Self::with_background(template, fonts, preview_text, background)
    }

    pub fn with_background(
        template: Template,
        fonts: Rc<FontBook>,
        preview_text: impl Into<String>,
        background: BackgroundImage,
    ) -> Self {
        let surface = PixelSurface::new(Rc::clone(&fonts));
        let mut session = Self {
            template,
            preview_text: preview_text.into(),
            background,
            controller: PlacementController::new(),
            fonts,
            surface,
        };
        session.render();
        session
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn into_template(self) -> Template {
        self.template
    }

    pub fn config(&self) -> &TemplateConfig {
        &self.template.config
    }

    pub fn preview_text(&self) -> &str {
        &self.preview_text
    }

    pub fn mode(&self) -> PlacementMode {
        self.controller.mode()
    }

    pub fn surface(&self) -> &PixelSurface {
        &self.surface
    }

    pub fn is_ready(&self) -> bool {
        self.background.ready().is_some()
    }

    /// Picks up a finished background decode and renders it.
    pub fn poll_background(&mut self) -> bool {
        if !self.background.poll() {
            return false;
        }
        self.render();
        true
    }

    pub fn render(&mut self) -> RenderOutcome {
        render::render(
            &mut self.surface,
            &self.background,
            &self.preview_text,
            &self.template.config,
        )
    }

    /// Image-space box of the preview text under the current configuration.
    pub fn text_box(&self) -> TextBox {
        let config = &self.template.config;
        let metrics = self.fonts.measure_run(
            &self.preview_text,
            &config.font,
            config.font_size,
            config.language.direction(),
        );
        resolve_box(config.anchor, config.alignment, metrics)
    }

    pub fn update_config(&mut self, update: impl FnOnce(&mut TemplateConfig)) -> RenderOutcome {
        update(&mut self.template.config);
        self.render()
    }

    pub fn set_anchor(&mut self, anchor: ImagePoint) -> RenderOutcome {
        self.update_config(|config| config.set_anchor(anchor))
    }

    pub fn set_font(&mut self, font: impl Into<String>) -> RenderOutcome {
        let font = font.into();
        self.update_config(|config| config.set_font(font))
    }

    pub fn set_font_size(&mut self, size: f64) -> RenderOutcome {
        self.update_config(|config| config.set_font_size(size))
    }

    pub fn set_alignment(&mut self, alignment: Alignment) -> RenderOutcome {
        self.update_config(|config| config.set_alignment(alignment))
    }

    pub fn set_color(&mut self, color: Color) -> RenderOutcome {
        self.update_config(|config| config.set_color(color))
    }

    pub fn set_color_hex(&mut self, hex: &str) -> TemplateResult<RenderOutcome> {
        self.template.config.set_color_hex(hex)?;
        Ok(self.render())
    }

    pub fn set_language(&mut self, language: Language) -> RenderOutcome {
        self.update_config(|config| config.set_language(language))
    }

    pub fn set_preview_text(&mut self, text: impl Into<String>) -> RenderOutcome {
        self.preview_text = text.into();
        self.render()
    }

    pub fn request_placement(&mut self) -> PlacementOutcome {
        self.dispatch(PlacementEvent::RequestPlacement)
    }

    pub fn cancel_placement(&mut self) -> PlacementOutcome {
        self.dispatch(PlacementEvent::CancelPlacement)
    }

    pub fn pointer_click(&mut self, x: f64, y: f64, display: DisplayRect) -> PlacementOutcome {
        self.dispatch_at(x, y, display, PlacementEvent::PointerClick)
    }

    pub fn pointer_down(&mut self, x: f64, y: f64, display: DisplayRect) -> PlacementOutcome {
        self.dispatch_at(x, y, display, PlacementEvent::PointerDown)
    }

    pub fn pointer_move(&mut self, x: f64, y: f64, display: DisplayRect) -> PlacementOutcome {
        self.dispatch_at(x, y, display, PlacementEvent::PointerMove)
    }

    pub fn pointer_up(&mut self) -> PlacementOutcome {
        self.dispatch(PlacementEvent::PointerUp)
    }

    pub fn pointer_leave(&mut self) -> PlacementOutcome {
        self.dispatch(PlacementEvent::PointerLeave)
    }

    /// Renders and encodes the certificate exactly as previewed.
    pub fn export_png(&mut self) -> ExportResult<Vec<u8>> {
        if self.render() == RenderOutcome::NotReady {
            return Err(ExportError::NotReady);
        }
        encode_png(self.surface.image())
    }

    pub fn save_certificate(&mut self, dir: &Path) -> ExportResult<PathBuf> {
        let bytes = self.export_png()?;
        save_png(dir, &certificate_file_name(&self.preview_text), &bytes)
    }

    fn dispatch_at(
        &mut self,
        x: f64,
        y: f64,
        display: DisplayRect,
        event: fn(ImagePoint) -> PlacementEvent,
    ) -> PlacementOutcome {
        let Some(native) = self.background.native_size() else {
            return PlacementOutcome::Ignored;
        };
        match to_image_space(x, y, display, native) {
            Some(position) => self.dispatch(event(position)),
            None => PlacementOutcome::Ignored,
        }
    }

    fn dispatch(&mut self, event: PlacementEvent) -> PlacementOutcome {
        let Self {
            template,
            preview_text,
            controller,
            fonts,
            ..
        } = self;
        let TemplateConfig {
            anchor,
            font,
            font_size,
            alignment,
            language,
            ..
        } = &mut template.config;
        let pressed_anchor = *anchor;
        let (font, font_size, alignment) = (font.as_str(), *font_size, *alignment);
        let direction = language.direction();

        let outcome = controller.handle(event, anchor, || {
            let metrics = fonts.measure_run(preview_text.as_str(), font, font_size, direction);
            resolve_box(pressed_anchor, alignment, metrics)
        });
        if outcome.anchor_moved() {
            self.render();
        }
        outcome
    }
}
