//! Short ID aliases for walks
//!
//! `walk list` numbers its rows `@1`, `@2`, ... and remembers the mapping in
//! `.dwalk/shortids.json` so the next command can say `dwalk walk show @2`.
//! The mapping is replaced on every listing.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::core::project::{Project, PROJECT_DIR};

/// Index file name within `.dwalk/`
const INDEX_FILE: &str = "shortids.json";

/// A mapping of short numbers to full document ids
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ShortIdIndex {
    entries: BTreeMap<u32, String>,
}

impl ShortIdIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn path(project: &Project) -> PathBuf {
        project.root().join(PROJECT_DIR).join(INDEX_FILE)
    }

    /// Load the index from a project, or an empty one if missing or unreadable
    pub fn load(project: &Project) -> Self {
        fs::read_to_string(Self::path(project))
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    /// Save the index to a project
    pub fn save(&self, project: &Project) -> std::io::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(Self::path(project), content)
    }

    /// Replace the index with `ids`, numbered from 1 in order
    pub fn rebuild<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries = ids
            .into_iter()
            .zip(1u32..)
            .map(|(id, n)| (n, id.into()))
            .collect();
    }

    /// Resolve `@N` or a bare number; anything else passes through unchanged
    ///
    /// Returns `None` only for a numeric reference with no entry.
    pub fn resolve(&self, reference: &str) -> Option<String> {
        let number = reference.strip_prefix('@').unwrap_or(reference);
        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
            return Some(reference.to_string());
        }
        number
            .parse::<u32>()
            .ok()
            .and_then(|n| self.entries.get(&n).cloned())
    }

    /// Short number assigned to a full id
    pub fn short_id(&self, id: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(_, full)| full.as_str() == id)
            .map(|(n, _)| *n)
    }

    /// `@N` label for an id, or empty if it has none
    pub fn label(&self, id: &str) -> String {
        self.short_id(id).map(|n| format!("@{}", n)).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve a user-supplied walk reference against the project's index
pub fn resolve_reference(reference: &str, project: &Project) -> Option<String> {
    ShortIdIndex::load(project).resolve(reference)
}
