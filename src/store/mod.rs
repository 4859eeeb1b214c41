//! Document store abstraction and local backends
//!
//! The inspection service only talks to [`DocumentStore`]. A backend keeps
//! schemaless JSON-object documents in named collections, assigns ids on
//! insert, merges top-level fields on update, and answers simple queries
//! (one equality filter, one descending sort key, a limit).
//!
//! Backends:
//! - [`YamlStore`] - one `.yaml` file per document, the default for projects
//! - [`SqliteStore`] - a single SQLite database with JSON bodies
//! - [`MemoryStore`] - in-process, used by tests and embedders

mod memory;
mod sqlite;
mod yaml;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use yaml::YamlStore;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::identity::EntityPrefix;

/// A stored document body: a JSON object without its id
pub type Document = Map<String, Value>;

/// The collections the application persists
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    Inspections,
    Stores,
}

impl Collection {
    /// Collection name as persisted
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Inspections => "inspections",
            Collection::Stores => "stores",
        }
    }

    /// Prefix for ids minted in this collection
    pub fn prefix(&self) -> EntityPrefix {
        match self {
            Collection::Inspections => EntityPrefix::Insp,
            Collection::Stores => EntityPrefix::Store,
        }
    }

    pub fn all() -> &'static [Collection] {
        &[Collection::Inspections, Collection::Stores]
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which backend a project uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Yaml,
    Sqlite,
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yaml" => Ok(BackendKind::Yaml),
            "sqlite" => Ok(BackendKind::Sqlite),
            _ => Err(format!("Unknown backend: {}. Use yaml or sqlite", s)),
        }
    }
}

/// Errors raised by a backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{collection}/{id} does not exist")]
    Missing { collection: Collection, id: String },

    #[error("failed to decode {collection}/{id}: {message}")]
    Decode {
        collection: Collection,
        id: String,
        message: String,
    },

    #[error("failed to encode document: {0}")]
    Encode(String),

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{0}")]
    Backend(String),
}

/// A query over one collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Equality filter on a top-level field
    pub filter: Option<(String, Value)>,
    /// Sort key, always descending
    pub order_by_desc: Option<String>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter = Some((field.into(), value.into()));
        self
    }

    pub fn order_by_desc(mut self, field: impl Into<String>) -> Self {
        self.order_by_desc = Some(field.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Evaluate the query in process over `(id, document)` pairs
    ///
    /// Sort ties are broken by id, descending.
    pub fn apply(&self, docs: Vec<(String, Document)>) -> Vec<(String, Document)> {
        let mut docs: Vec<(String, Document)> = match &self.filter {
            Some((field, value)) => docs
                .into_iter()
                .filter(|(_, doc)| doc.get(field) == Some(value))
                .collect(),
            None => docs,
        };

        if let Some(field) = &self.order_by_desc {
            docs.sort_by(|(id_a, a), (id_b, b)| {
                compare_values(b.get(field), a.get(field)).then_with(|| id_b.cmp(id_a))
            });
        }

        if let Some(limit) = self.limit {
            docs.truncate(limit);
        }

        docs
    }
}

/// Order JSON values for sorting; missing and null sort lowest
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

/// Merge `patch` over `target`, replacing top-level fields
pub fn merge(target: &mut Document, patch: Document) {
    for (key, value) in patch {
        target.insert(key, value);
    }
}

/// Document storage operations used by the inspection service
pub trait DocumentStore {
    /// Insert a document and return its newly assigned id
    fn add(&self, collection: Collection, doc: Document) -> Result<String, StoreError>;

    /// Fetch a document body by id
    fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError>;

    /// Merge `patch` into an existing document
    ///
    /// Fails with [`StoreError::Missing`] when the document does not exist.
    fn update(&self, collection: Collection, id: &str, patch: Document) -> Result<(), StoreError>;

    /// Run a query over a collection
    fn query(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<(String, Document)>, StoreError>;

    /// The store's notion of "now", used for `createdAt`/`updatedAt`
    fn server_timestamp(&self) -> DateTime<Utc>;
}

impl<T: DocumentStore + ?Sized> DocumentStore for Box<T> {
    fn add(&self, collection: Collection, doc: Document) -> Result<String, StoreError> {
        (**self).add(collection, doc)
    }

    fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        (**self).get(collection, id)
    }

    fn update(&self, collection: Collection, id: &str, patch: Document) -> Result<(), StoreError> {
        (**self).update(collection, id, patch)
    }

    fn query(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<(String, Document)>, StoreError> {
        (**self).query(collection, query)
    }

    fn server_timestamp(&self) -> DateTime<Utc> {
        (**self).server_timestamp()
    }
}

/// Wall-clock timestamp truncated to the persisted precision
pub(crate) fn now_millis() -> DateTime<Utc> {
    use chrono::SubsecRound;
    Utc::now().trunc_subsecs(3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_query_filters_sorts_and_limits() {
        let docs = vec![
            ("a".to_string(), doc(json!({"storeId": "S1", "createdAt": "2024-01-01T00:00:01.000Z"}))),
            ("b".to_string(), doc(json!({"storeId": "S2", "createdAt": "2024-01-01T00:00:02.000Z"}))),
            ("c".to_string(), doc(json!({"storeId": "S1", "createdAt": "2024-01-01T00:00:03.000Z"}))),
            ("d".to_string(), doc(json!({"storeId": "S1", "createdAt": "2024-01-01T00:00:04.000Z"}))),
        ];

        let result = Query::new()
            .where_eq("storeId", "S1")
            .order_by_desc("createdAt")
            .limit(2)
            .apply(docs);

        let ids: Vec<&str> = result.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["d", "c"]);
    }

    #[test]
    fn test_missing_sort_key_sorts_last() {
        let docs = vec![
            ("a".to_string(), doc(json!({}))),
            ("b".to_string(), doc(json!({"createdAt": "2024-01-01T00:00:00.000Z"}))),
        ];
        let result = Query::new().order_by_desc("createdAt").apply(docs);
        assert_eq!(result[0].0, "b");
    }

    #[test]
    fn test_merge_replaces_top_level_fields() {
        let mut target = doc(json!({"status": "draft", "date": "2024-01-01"}));
        merge(&mut target, doc(json!({"status": "completed"})));
        assert_eq!(target["status"], "completed");
        assert_eq!(target["date"], "2024-01-01");
    }
}
