use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::template::{Template, TemplateError, TemplateId, TemplateRecord, TemplateSummary};

const RECORD_EXTENSION: &str = "json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("template {0} not found")]
    NotFound(TemplateId),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed template record {path}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Template(#[from] TemplateError),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Persistence collaborator for templates.
pub trait TemplateBackend {
    fn create(&mut self, template: &Template) -> StorageResult<TemplateId>;
    /// Newest first.
    fn list(&self) -> StorageResult<Vec<TemplateSummary>>;
    fn get(&self, id: TemplateId) -> StorageResult<Template>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    id: TemplateId,
    created_at: u64,
    #[serde(flatten)]
    record: TemplateRecord,
}

/// Stores one `<id>.json` record per template in a directory.
#[derive(Debug, Clone)]
pub struct DirectoryBackend {
    root: PathBuf,
}

impl DirectoryBackend {
    pub fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, id: TemplateId) -> PathBuf {
        self.root.join(format!("{id}.{RECORD_EXTENSION}"))
    }

    fn read_record(path: &Path) -> StorageResult<StoredRecord> {
        let serialized = fs::read_to_string(path)?;
        serde_json::from_str(&serialized).map_err(|source| StorageError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }

    fn stored_records(&self) -> StorageResult<Vec<StoredRecord>> {
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION)
            {
                continue;
            }
            match Self::read_record(&path) {
                Ok(record) => records.push(record),
                Err(err) => {
                    tracing::warn!(path = %path.display(), ?err, "skipping unreadable template record");
                }
            }
        }
        Ok(records)
    }
}

impl TemplateBackend for DirectoryBackend {
    fn create(&mut self, template: &Template) -> StorageResult<TemplateId> {
        let next = self
            .stored_records()?
            .iter()
            .map(|stored| stored.id.0)
            .max()
            .map_or(1, |max| max.saturating_add(1));
        let id = TemplateId(next);
        let stored = StoredRecord {
            id,
            created_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |elapsed| elapsed.as_secs()),
            record: TemplateRecord::from(template),
        };
        let serialized = serde_json::to_string_pretty(&stored).map_err(|source| {
            StorageError::Malformed {
                path: self.record_path(id),
                source,
            }
        })?;
        fs::write(self.record_path(id), serialized)?;
        tracing::info!(id = %id, name = %template.name, "template stored");
        Ok(id)
    }

    fn list(&self) -> StorageResult<Vec<TemplateSummary>> {
        let mut records = self.stored_records()?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(records
            .iter()
            .map(|stored| stored.record.summary(stored.id))
            .collect())
    }

    fn get(&self, id: TemplateId) -> StorageResult<Template> {
        let path = self.record_path(id);
        let stored = match Self::read_record(&path) {
            Ok(stored) => stored,
            Err(StorageError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(id));
            }
            Err(err) => return Err(err),
        };
        Ok(stored.record.into_template(id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ImagePoint;
    use crate::template::tests::png_bytes;
    use crate::template::Language;

    fn fixture_root() -> PathBuf {
        let mut path = std::env::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        path.push(format!("certstamp-storage-{}-{nanos}", std::process::id()));
        path
    }

    fn with_backend<F: FnOnce(&mut DirectoryBackend)>(f: F) {
        let root = fixture_root();
        let mut backend = DirectoryBackend::open(&root).unwrap();
        f(&mut backend);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn create_assigns_ascending_ids_and_get_restores_template() {
        with_backend(|backend| {
            let mut template =
                Template::from_upload(TemplateId(1_700_000_000_000), "a.png", png_bytes(2, 2, [0; 4]));
            template.config.set_anchor(ImagePoint::new(321.0, 123.0));
            template.config.set_language(Language::Ur);

            let first = backend.create(&template).unwrap();
            let second = backend.create(&template).unwrap();
            assert_eq!(first, TemplateId(1));
            assert_eq!(second, TemplateId(2));

            let restored = backend.get(first).unwrap();
            assert_eq!(restored.id, first);
            assert_eq!(restored.config, template.config);
            assert_eq!(restored.image, template.image);
        });
    }

    #[test]
    fn list_returns_newest_first() {
        with_backend(|backend| {
            let template = Template::from_upload(TemplateId(0), "a.png", png_bytes(1, 1, [0; 4]));
            backend.create(&template).unwrap();
            let mut renamed = template.clone();
            renamed.name = "b.png".to_string();
            backend.create(&renamed).unwrap();

            let summaries = backend.list().unwrap();
            assert_eq!(summaries.len(), 2);
            assert_eq!(summaries[0].id, TemplateId(2));
            assert_eq!(summaries[0].name, "b.png");
            assert_eq!(summaries[1].language, Language::En);
        });
    }

    #[test]
    fn get_unknown_id_is_not_found() {
        with_backend(|backend| {
            assert!(matches!(
                backend.get(TemplateId(77)),
                Err(StorageError::NotFound(TemplateId(77)))
            ));
        });
    }

    #[test]
    fn malformed_records_are_skipped_when_listing() {
        with_backend(|backend| {
            fs::write(backend.root().join("9.json"), "{ broken").unwrap();
            fs::write(backend.root().join("notes.txt"), "ignored").unwrap();
            assert!(backend.list().unwrap().is_empty());
            assert!(matches!(
                backend.get(TemplateId(9)),
                Err(StorageError::Malformed { .. })
            ));
        });
    }
}
