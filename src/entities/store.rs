//! Store entity - read-only reference rows for the store picker

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{timestamp, Entity};
use crate::store::Collection;

/// Id of the synthetic store returned when the collection cannot be read
pub const PLACEHOLDER_STORE_ID: &str = "demo-store";

/// A store that can be inspected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    #[serde(default)]
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl Entity for Store {
    const COLLECTION: Collection = Collection::Stores;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Store {
    /// The row seeded into an empty collection
    pub fn demo(created_at: DateTime<Utc>) -> Self {
        Self {
            id: String::new(),
            name: "Store #123".to_string(),
            location: Some("Main Street".to_string()),
            created_at: Some(created_at),
        }
    }

    /// Stand-in used when the stores collection is unavailable
    pub fn placeholder() -> Self {
        Self {
            id: PLACEHOLDER_STORE_ID.to_string(),
            name: "Demo Store".to_string(),
            location: None,
            created_at: None,
        }
    }
}

/// Resolve a store's display name, falling back to `Store #<id>`
pub fn store_display_name(stores: &[Store], store_id: &str) -> String {
    stores
        .iter()
        .find(|s| s.id == store_id)
        .filter(|s| !s.name.is_empty())
        .map(|s| s.name.clone())
        .unwrap_or_else(|| format!("Store #{}", store_id))
}
