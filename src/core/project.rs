//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::store::{BackendKind, Collection, DocumentStore, SqliteStore, StoreError, YamlStore};

/// Name of the project marker directory
pub const PROJECT_DIR: &str = ".dwalk";

/// SQLite database file within `.dwalk/`
const DATABASE_FILE: &str = "walks.db";

/// Represents a walk project
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project (parent of .dwalk/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new project structure at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if root.join(PROJECT_DIR).exists() {
            return Err(ProjectError::AlreadyExists(root));
        }

        Self::init_force(&root)
    }

    /// Force initialization even if .dwalk/ exists
    ///
    /// Rewrites the default config; existing documents are left alone.
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let project = Self { root };

        std::fs::create_dir_all(project.dwalk_dir())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        std::fs::write(project.config_path(), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        for collection in Collection::all() {
            std::fs::create_dir_all(project.root.join(collection.name()))
                .map_err(|e| ProjectError::IoError(e.to_string()))?;
        }

        Ok(project)
    }

    fn default_config() -> &'static str {
        r#"# Daily Walk project configuration

# Who is walking. Leave uid unset to require DWALK_USER_ID.
# user:
#   uid: ""
#   display_name: ""
#   email: ""
#   store_id: ""

# Document backend: yaml (one file per document) or sqlite (.dwalk/walks.db)
backend: yaml

# When stores cannot be loaded: propagate (fail) or placeholder (use "Demo Store")
store_fallback: propagate

# Default number of walks shown by `dwalk walk list`
# list_limit: 50

# Default output format (auto, yaml, tsv, json, csv, md, id)
# default_format: auto
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .dwalk configuration directory
    pub fn dwalk_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    /// Project-level config file
    pub fn config_path(&self) -> PathBuf {
        self.dwalk_dir().join("config.yaml")
    }

    /// Path of the SQLite database used by the sqlite backend
    pub fn database_path(&self) -> PathBuf {
        self.dwalk_dir().join(DATABASE_FILE)
    }

    /// Open the document store for the given backend
    pub fn open_store(&self, backend: BackendKind) -> Result<Box<dyn DocumentStore>, StoreError> {
        tracing::debug!(?backend, root = %self.root.display(), "opening document store");
        Ok(match backend {
            BackendKind::Yaml => Box::new(YamlStore::new(&self.root)),
            BackendKind::Sqlite => Box::new(SqliteStore::open(&self.database_path())?),
        })
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not a walk project (searched from {searched_from:?}). Run 'dwalk init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("walk project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Query;
    use tempfile::tempdir;

    #[test]
    fn test_project_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        assert!(project.dwalk_dir().is_dir());
        assert!(project.config_path().exists());
        assert!(project.root().join("inspections").is_dir());
        assert!(project.root().join("stores").is_dir());
    }

    #[test]
    fn test_project_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let err = Project::init(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyExists(_)));
        assert!(Project::init_force(tmp.path()).is_ok());
    }

    #[test]
    fn test_project_discover_finds_dwalk_dir() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let subdir = tmp.path().join("some/nested/dir");
        std::fs::create_dir_all(&subdir).unwrap();

        let project = Project::discover_from(&subdir).unwrap();
        assert_eq!(
            project.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_project_discover_fails_without_dwalk_dir() {
        let tmp = tempdir().unwrap();
        let err = Project::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }

    #[test]
    fn test_default_config_parses() {
        let config: crate::core::Config = serde_yml::from_str(Project::default_config()).unwrap();
        assert_eq!(config.backend(), BackendKind::Yaml);
        assert!(config.user.uid.is_none());
    }

    #[test]
    fn test_open_store_per_backend() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        let sqlite = project.open_store(BackendKind::Sqlite).unwrap();
        assert!(project.database_path().exists());
        assert!(sqlite
            .query(Collection::Stores, &Query::new())
            .unwrap()
            .is_empty());

        let yaml = project.open_store(BackendKind::Yaml).unwrap();
        assert!(yaml
            .query(Collection::Inspections, &Query::new())
            .unwrap()
            .is_empty());
    }
}
