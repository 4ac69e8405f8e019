use serde::{Deserialize, Serialize};

use crate::geometry::{Color, ImagePoint};

use super::{
    Alignment, ImageSource, Language, Template, TemplateConfig, TemplateId, TemplateResult,
};

/// Flat template shape exchanged with the persistence backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub name: String,
    pub image_base64: String,
    pub text_position: ImagePoint,
    pub font: String,
    pub font_size: f64,
    pub alignment: Alignment,
    pub color: String,
    pub language: Language,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSummary {
    pub id: TemplateId,
    pub name: String,
    pub language: Language,
}

impl From<&Template> for TemplateRecord {
    fn from(template: &Template) -> Self {
        let config = &template.config;
        Self {
            name: template.name.clone(),
            image_base64: template.image.to_data_url(),
            text_position: config.anchor,
            font: config.font.clone(),
            font_size: config.font_size,
            alignment: config.alignment,
            color: config.color.to_hex(),
            language: config.language,
        }
    }
}

impl TemplateRecord {
    pub fn into_template(self, id: TemplateId) -> TemplateResult<Template> {
        let color: Color = self.color.parse()?;
        let image = ImageSource::from_data_url(&self.image_base64)?;
        let mut config = TemplateConfig {
            anchor: self.text_position,
            font: self.font,
            alignment: self.alignment,
            color,
            language: self.language,
            ..TemplateConfig::default()
        };
        config.set_font_size(self.font_size);
        Ok(Template {
            id,
            name: self.name,
            image,
            config,
        })
    }

    pub fn summary(&self, id: TemplateId) -> TemplateSummary {
        TemplateSummary {
            id,
            name: self.name.clone(),
            language: self.language,
        }
    }
}
