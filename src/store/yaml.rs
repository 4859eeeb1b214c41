//! YAML-file document store
//!
//! Layout under the project root:
//!
//! ```text
//! inspections/INSP-01J....yaml
//! stores/STORE-01J....yaml
//! ```
//!
//! The file stem is the document id; the file body is the document.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::{merge, now_millis, Collection, Document, DocumentStore, Query, StoreError};
use crate::core::identity::EntityId;

/// Document store backed by one YAML file per document
#[derive(Debug, Clone)]
pub struct YamlStore {
    root: PathBuf,
}

impl YamlStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding a collection's files
    pub fn collection_dir(&self, collection: Collection) -> PathBuf {
        self.root.join(collection.name())
    }

    fn document_path(&self, collection: Collection, id: &str) -> PathBuf {
        self.collection_dir(collection).join(format!("{}.yaml", id))
    }

    fn read(&self, collection: Collection, id: &str, path: &Path) -> Result<Document, StoreError> {
        let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match serde_yml::from_str::<Value>(&content) {
            Ok(Value::Object(doc)) => Ok(doc),
            Ok(_) => Err(StoreError::Decode {
                collection,
                id: id.to_string(),
                message: "document is not a mapping".to_string(),
            }),
            Err(e) => Err(StoreError::Decode {
                collection,
                id: id.to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn write(&self, path: &Path, doc: &Document) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let yaml = serde_yml::to_string(doc).map_err(|e| StoreError::Encode(e.to_string()))?;
        fs::write(path, yaml).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl DocumentStore for YamlStore {
    fn add(&self, collection: Collection, doc: Document) -> Result<String, StoreError> {
        let id = EntityId::new(collection.prefix()).to_string();
        self.write(&self.document_path(collection, &id), &doc)?;
        Ok(id)
    }

    fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let path = self.document_path(collection, id);
        if !path.is_file() {
            return Ok(None);
        }
        self.read(collection, id, &path).map(Some)
    }

    fn update(&self, collection: Collection, id: &str, patch: Document) -> Result<(), StoreError> {
        let path = self.document_path(collection, id);
        if !path.is_file() {
            return Err(StoreError::Missing {
                collection,
                id: id.to_string(),
            });
        }
        let mut doc = self.read(collection, id, &path)?;
        merge(&mut doc, patch);
        self.write(&path, &doc)
    }

    fn query(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<(String, Document)>, StoreError> {
        let dir = self.collection_dir(collection);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut docs = Vec::new();
        for entry in walkdir::WalkDir::new(&dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "yaml"))
        {
            let path = entry.path();
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            // Unreadable files are skipped; `dwalk validate` reports them
            match self.read(collection, id, path) {
                Ok(doc) => docs.push((id.to_string(), doc)),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable document"),
            }
        }

        Ok(query.apply(docs))
    }

    fn server_timestamp(&self) -> DateTime<Utc> {
        now_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_add_writes_one_file_per_document() {
        let tmp = tempdir().unwrap();
        let store = YamlStore::new(tmp.path());

        let id = store
            .add(Collection::Stores, doc(json!({"name": "Store #123"})))
            .unwrap();

        assert!(id.starts_with("STORE-"));
        assert!(tmp.path().join("stores").join(format!("{}.yaml", id)).is_file());
        let loaded = store.get(Collection::Stores, &id).unwrap().unwrap();
        assert_eq!(loaded["name"], "Store #123");
    }

    #[test]
    fn test_update_merges_and_keeps_other_fields() {
        let tmp = tempdir().unwrap();
        let store = YamlStore::new(tmp.path());
        let id = store
            .add(
                Collection::Inspections,
                doc(json!({"status": "draft", "storeId": "S1", "items": [{"id": 1, "passed": null}]})),
            )
            .unwrap();

        store
            .update(Collection::Inspections, &id, doc(json!({"status": "completed"})))
            .unwrap();

        let loaded = store.get(Collection::Inspections, &id).unwrap().unwrap();
        assert_eq!(loaded["status"], "completed");
        assert_eq!(loaded["storeId"], "S1");
        assert_eq!(loaded["items"][0]["passed"], Value::Null);
    }

    #[test]
    fn test_update_missing_is_reported() {
        let tmp = tempdir().unwrap();
        let store = YamlStore::new(tmp.path());
        let err = store
            .update(Collection::Inspections, "INSP-missing", Document::new())
            .unwrap_err();
        assert!(matches!(err, StoreError::Missing { .. }));
    }

    #[test]
    fn test_query_skips_broken_files() {
        let tmp = tempdir().unwrap();
        let store = YamlStore::new(tmp.path());
        store
            .add(Collection::Stores, doc(json!({"name": "A"})))
            .unwrap();
        fs::write(tmp.path().join("stores/broken.yaml"), "- just\n- a list\n").unwrap();

        let docs = store.query(Collection::Stores, &Query::new()).unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[test]
    fn test_query_on_missing_collection_is_empty() {
        let tmp = tempdir().unwrap();
        let store = YamlStore::new(tmp.path());
        assert!(store.query(Collection::Inspections, &Query::new()).unwrap().is_empty());
    }
}
