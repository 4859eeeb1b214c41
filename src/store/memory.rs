//! In-memory document store

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use super::{merge, Collection, Document, DocumentStore, Query, StoreError};
use crate::core::identity::EntityId;

/// A document store held entirely in memory
///
/// The server clock starts at 2024-01-01T08:00:00Z and advances one second
/// per timestamp, so creation order is always strictly increasing.
#[derive(Debug)]
pub struct MemoryStore {
    docs: RefCell<BTreeMap<(Collection, String), Document>>,
    clock: Cell<DateTime<Utc>>,
    unavailable: Cell<bool>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2024, 1, 1, 8, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        Self {
            docs: RefCell::new(BTreeMap::new()),
            clock: Cell::new(start),
            unavailable: Cell::new(false),
        }
    }

    /// Make every subsequent operation fail as if the backend were unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.set(unavailable);
    }

    /// Insert a document under a caller-chosen id
    pub fn insert_with_id(&self, collection: Collection, id: &str, doc: Document) {
        self.docs
            .borrow_mut()
            .insert((collection, id.to_string()), doc);
    }

    /// Number of documents in a collection
    pub fn count(&self, collection: Collection) -> usize {
        self.docs
            .borrow()
            .keys()
            .filter(|(c, _)| *c == collection)
            .count()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.get() {
            Err(StoreError::Backend("memory store marked unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

impl DocumentStore for MemoryStore {
    fn add(&self, collection: Collection, doc: Document) -> Result<String, StoreError> {
        self.check()?;
        let id = EntityId::new(collection.prefix()).to_string();
        self.insert_with_id(collection, &id, doc);
        Ok(id)
    }

    fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        self.check()?;
        Ok(self
            .docs
            .borrow()
            .get(&(collection, id.to_string()))
            .cloned())
    }

    fn update(&self, collection: Collection, id: &str, patch: Document) -> Result<(), StoreError> {
        self.check()?;
        let mut docs = self.docs.borrow_mut();
        let doc = docs
            .get_mut(&(collection, id.to_string()))
            .ok_or_else(|| StoreError::Missing {
                collection,
                id: id.to_string(),
            })?;
        merge(doc, patch);
        Ok(())
    }

    fn query(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<(String, Document)>, StoreError> {
        self.check()?;
        let docs = self
            .docs
            .borrow()
            .iter()
            .filter(|((c, _), _)| *c == collection)
            .map(|((_, id), doc)| (id.clone(), doc.clone()))
            .collect();
        Ok(query.apply(docs))
    }

    fn server_timestamp(&self) -> DateTime<Utc> {
        let now = self.clock.get();
        self.clock.set(now + Duration::seconds(1));
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clock_advances() {
        let store = MemoryStore::new();
        let a = store.server_timestamp();
        let b = store.server_timestamp();
        assert!(b > a);
    }

    #[test]
    fn test_update_missing_document() {
        let store = MemoryStore::new();
        let err = store
            .update(Collection::Inspections, "INSP-nope", Document::new())
            .unwrap_err();
        assert!(matches!(err, StoreError::Missing { .. }));
    }

    #[test]
    fn test_unavailable_fails_reads() {
        let store = MemoryStore::new();
        let mut doc = Document::new();
        doc.insert("name".to_string(), json!("Store #1"));
        store.add(Collection::Stores, doc).unwrap();

        store.set_unavailable(true);
        assert!(store.query(Collection::Stores, &Query::new()).is_err());
        store.set_unavailable(false);
        assert_eq!(store.query(Collection::Stores, &Query::new()).unwrap().len(), 1);
    }
}
