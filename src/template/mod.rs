//! Certificate templates: background image plus the text placement configuration.

mod library;
mod record;

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::geometry::{Color, ImagePoint, ParseColorError};
use crate::text::TextDirection;

pub use library::TemplateLibrary;
pub use record::{TemplateRecord, TemplateSummary};

pub type TemplateResult<T> = std::result::Result<T, TemplateError>;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("image is not a base64 data url")]
    InvalidDataUrl,
    #[error("invalid base64 image payload")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error(transparent)]
    InvalidColor(#[from] ParseColorError),
    #[error("failed to parse templates")]
    Json(#[from] serde_json::Error),
    #[error("unknown template id {0}")]
    UnknownTemplate(TemplateId),
    #[error("template id {0} is already in use")]
    IdInUse(TemplateId),
}

pub const DEFAULT_FONT: &str = "Arial, sans-serif";
pub const DEFAULT_FONT_SIZE: f64 = 48.0;
pub const DEFAULT_ANCHOR: ImagePoint = ImagePoint::new(50.0, 50.0);
const FONT_SIZE_MIN: f64 = 1.0;
const FONT_SIZE_MAX: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(pub u64);

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ur,
}

impl Language {
    pub const fn direction(self) -> TextDirection {
        match self {
            Self::Ur => TextDirection::Rtl,
            Self::En => TextDirection::Ltr,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ur => "ur",
        }
    }
}

/// Where and how the name is drawn on a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateConfig {
    #[serde(rename = "textPosition", alias = "anchor")]
    pub anchor: ImagePoint,
    pub font: String,
    pub font_size: f64,
    #[serde(default)]
    pub alignment: Alignment,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub language: Language,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            anchor: DEFAULT_ANCHOR,
            font: DEFAULT_FONT.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            alignment: Alignment::Center,
            color: Color::BLACK,
            language: Language::En,
        }
    }
}

impl TemplateConfig {
    pub fn set_anchor(&mut self, anchor: ImagePoint) {
        self.anchor = anchor;
    }

    pub fn set_font(&mut self, font: impl Into<String>) {
        self.font = font.into();
    }

    /// Non-finite sizes are ignored; finite ones are clamped into the supported range.
    pub fn set_font_size(&mut self, size: f64) {
        if let Some(size) = clamp_font_size(size) {
            self.font_size = size;
        }
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        self.alignment = alignment;
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn set_color_hex(&mut self, hex: &str) -> TemplateResult<()> {
        self.color = hex.parse()?;
        Ok(())
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }
}

fn clamp_font_size(size: f64) -> Option<f64> {
    if !size.is_finite() {
        return None;
    }
    Some(size.clamp(FONT_SIZE_MIN, FONT_SIZE_MAX))
}

/// Encoded background image bytes as uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    mime: String,
    bytes: Vec<u8>,
}

impl ImageSource {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let mime = image::guess_format(&bytes)
            .map(|format| format.to_mime_type().to_string())
            .unwrap_or_else(|_| "application/octet-stream".to_string());
        Self { mime, bytes }
    }

    pub fn from_data_url(data_url: &str) -> TemplateResult<Self> {
        let rest = data_url
            .strip_prefix("data:")
            .ok_or(TemplateError::InvalidDataUrl)?;
        let (header, payload) = rest.split_once(',').ok_or(TemplateError::InvalidDataUrl)?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or(TemplateError::InvalidDataUrl)?;
        let bytes = BASE64.decode(payload.trim())?;
        Ok(Self {
            mime: mime.to_string(),
            bytes,
        })
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, BASE64.encode(&self.bytes))
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Serialize for ImageSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_data_url())
    }
}

impl<'de> Deserialize<'de> for ImageSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_data_url(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    pub image: ImageSource,
    pub config: TemplateConfig,
}

impl Template {
    /// A freshly uploaded template with the default configuration.
    pub fn from_upload(id: TemplateId, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            id,
            name: name.into(),
            image: ImageSource::from_bytes(bytes),
            config: TemplateConfig::default(),
        }
    }
}
