use std::time::{SystemTime, UNIX_EPOCH};

use super::{Template, TemplateConfig, TemplateError, TemplateId, TemplateResult};

/// The in-memory template collection with at most one selected entry.
#[derive(Debug, Default)]
pub struct TemplateLibrary {
    templates: Vec<Template>,
    selected: Option<TemplateId>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn get(&self, id: TemplateId) -> Option<&Template> {
        self.templates.iter().find(|template| template.id == id)
    }

    /// Adds an uploaded image with the default configuration and selects it.
    pub fn add_upload(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> TemplateId {
        let id = self.allocate_id();
        let template = Template::from_upload(id, name, bytes);
        tracing::info!(id = %id, name = %template.name, "template added");
        self.templates.push(template);
        self.selected = Some(id);
        id
    }

    pub fn insert(&mut self, template: Template) {
        match self.templates.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => *existing = template,
            None => self.templates.push(template),
        }
    }

    pub fn select(&mut self, id: TemplateId) -> TemplateResult<()> {
        if self.get(id).is_none() {
            return Err(TemplateError::UnknownTemplate(id));
        }
        self.selected = Some(id);
        Ok(())
    }

    pub fn selected(&self) -> Option<&Template> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn selected_id(&self) -> Option<TemplateId> {
        self.selected
    }

    pub fn update_config(
        &mut self,
        id: TemplateId,
        update: impl FnOnce(&mut TemplateConfig),
    ) -> TemplateResult<()> {
        let template = self
            .templates
            .iter_mut()
            .find(|template| template.id == id)
            .ok_or(TemplateError::UnknownTemplate(id))?;
        update(&mut template.config);
        Ok(())
    }

    pub fn delete(&mut self, id: TemplateId) -> Option<Template> {
        let index = self.templates.iter().position(|template| template.id == id)?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        tracing::info!(id = %id, "template deleted");
        Some(self.templates.remove(index))
    }

    /// Replaces a local id with the one assigned by the backend, keeping the selection.
    pub fn reassign_id(&mut self, from: TemplateId, to: TemplateId) -> TemplateResult<()> {
        if from != to && self.get(to).is_some() {
            return Err(TemplateError::IdInUse(to));
        }
        let template = self
            .templates
            .iter_mut()
            .find(|template| template.id == from)
            .ok_or(TemplateError::UnknownTemplate(from))?;
        template.id = to;
        if self.selected == Some(from) {
            self.selected = Some(to);
        }
        Ok(())
    }

    pub fn export_json(&self) -> TemplateResult<String> {
        Ok(serde_json::to_string_pretty(&self.templates)?)
    }

    /// Replaces the whole collection. On a parse error the library is left untouched.
    pub fn import_json(&mut self, serialized: &str) -> TemplateResult<usize> {
        let imported: Vec<Template> = serde_json::from_str(serialized)?;
        let count = imported.len();
        self.templates = imported;
        if self.selected.is_some_and(|id| self.get(id).is_none()) {
            self.selected = None;
        }
        tracing::info!(count, "templates imported");
        Ok(count)
    }

    fn allocate_id(&self) -> TemplateId {
        let now_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
        let next_free = self
            .templates
            .iter()
            .map(|template| template.id.0.saturating_add(1))
            .max()
            .unwrap_or(0);
        TemplateId(now_millis.max(next_free))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ImagePoint;
    use crate::template::tests::png_bytes;
    use crate::template::Alignment;

    fn library_with_two() -> (TemplateLibrary, TemplateId, TemplateId) {
        let mut library = TemplateLibrary::new();
        let first = library.add_upload("first.png", png_bytes(4, 4, [255; 4]));
        let second = library.add_upload("second.png", png_bytes(4, 4, [0, 0, 0, 255]));
        (library, first, second)
    }

    #[test]
    fn uploads_get_distinct_ids_and_latest_is_selected() {
        let (library, first, second) = library_with_two();
        assert_ne!(first, second);
        assert_eq!(library.len(), 2);
        assert_eq!(library.selected_id(), Some(second));
    }

    #[test]
    fn update_config_is_last_write_wins() {
        let (mut library, first, _) = library_with_two();
        library
            .update_config(first, |config| config.set_alignment(Alignment::Left))
            .unwrap();
        library
            .update_config(first, |config| config.set_alignment(Alignment::Right))
            .unwrap();
        assert_eq!(library.get(first).unwrap().config.alignment, Alignment::Right);
        assert!(matches!(
            library.update_config(TemplateId(1), |_| {}),
            Err(TemplateError::UnknownTemplate(TemplateId(1)))
        ));
    }

    #[test]
    fn deleting_selected_template_clears_selection() {
        let (mut library, first, second) = library_with_two();
        assert!(library.delete(first).is_some());
        assert_eq!(library.selected_id(), Some(second));
        assert!(library.delete(second).is_some());
        assert!(library.selected().is_none());
        assert!(library.delete(second).is_none());
    }

    #[test]
    fn reassign_id_keeps_selection() {
        let (mut library, _, second) = library_with_two();
        library.reassign_id(second, TemplateId(42)).unwrap();
        assert_eq!(library.selected_id(), Some(TemplateId(42)));
        assert!(library.get(second).is_none());
    }

    #[test]
    fn reassign_id_refuses_an_id_held_by_another_template() {
        let (mut library, first, second) = library_with_two();
        let err = library.reassign_id(second, first).unwrap_err();
        assert!(matches!(err, TemplateError::IdInUse(id) if id == first));
        assert!(library.get(second).is_some());
        library.reassign_id(first, first).unwrap();
    }

    #[test]
    fn export_then_import_restores_collection() {
        let (mut library, first, _) = library_with_two();
        library
            .update_config(first, |config| config.set_anchor(ImagePoint::new(1.5, 2.5)))
            .unwrap();
        let exported = library.export_json().unwrap();
        assert!(exported.contains("\"textPosition\""));

        let mut restored = TemplateLibrary::new();
        assert_eq!(restored.import_json(&exported).unwrap(), 2);
        assert_eq!(restored.templates(), library.templates());
    }

    #[test]
    fn invalid_import_leaves_library_untouched() {
        let (mut library, first, _) = library_with_two();
        library.select(first).unwrap();
        assert!(library.import_json("{ not json").is_err());
        assert_eq!(library.len(), 2);
        assert_eq!(library.selected_id(), Some(first));
    }

    #[test]
    fn import_drops_stale_selection() {
        let (mut library, ..) = library_with_two();
        library.import_json("[]").unwrap();
        assert!(library.is_empty());
        assert!(library.selected_id().is_none());
    }
}
