//! Embedded JSON Schemas for the document collections

use rust_embed::Embed;
use std::collections::HashMap;

use crate::store::Collection;

#[derive(Embed)]
#[folder = "schemas/"]
struct EmbeddedSchemas;

/// Schema source text per collection
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<Collection, String>,
}

impl SchemaRegistry {
    /// File name of a collection's schema inside `schemas/`
    pub fn file_name(collection: Collection) -> &'static str {
        match collection {
            Collection::Inspections => "inspection.schema.json",
            Collection::Stores => "store.schema.json",
        }
    }

    pub fn get(&self, collection: Collection) -> Option<&str> {
        self.schemas.get(&collection).map(String::as_str)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        let schemas = Collection::all()
            .iter()
            .filter_map(|collection| {
                let file = EmbeddedSchemas::get(Self::file_name(*collection))?;
                let text = std::str::from_utf8(&file.data).ok()?.to_string();
                Some((*collection, text))
            })
            .collect();
        Self { schemas }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_collection_has_a_schema() {
        let registry = SchemaRegistry::default();
        for collection in Collection::all() {
            let text = registry.get(*collection).unwrap();
            assert!(serde_json::from_str::<serde_json::Value>(text).is_ok());
        }
    }
}
