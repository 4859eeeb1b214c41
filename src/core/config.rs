//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::project::Project;
use crate::core::service::{StoreFallback, DEFAULT_LIST_LIMIT};
use crate::core::session::{Session, SessionContext};
use crate::store::BackendKind;

/// Signed-in user, as configured
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub uid: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    /// Store preselected for new walks
    pub store_id: Option<String>,
}

impl UserConfig {
    fn merge(&mut self, other: UserConfig) {
        if other.uid.is_some() {
            self.uid = other.uid;
        }
        if other.display_name.is_some() {
            self.display_name = other.display_name;
        }
        if other.email.is_some() {
            self.email = other.email;
        }
        if other.store_id.is_some() {
            self.store_id = other.store_id;
        }
    }
}

/// dwalk configuration with layered hierarchy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Session identity
    pub user: UserConfig,

    /// Document store backend for the project
    pub backend: Option<BackendKind>,

    /// What to do when the stores collection cannot be read
    pub store_fallback: Option<StoreFallback>,

    /// Default cap on `walk list`
    pub list_limit: Option<usize>,

    /// Editor command for `dwalk config edit`
    pub editor: Option<String>,

    /// Default output format
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let project = Project::discover().ok();
        Self::load_for(project.as_ref())
    }

    /// Load configuration using `project` (if any) for the project layer
    pub fn load_for(project: Option<&Project>) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/dwalk/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Project config (.dwalk/config.yaml)
        if let Some(project) = project {
            if let Some(project_config) = Self::read_file(&project.config_path()) {
                config.merge(project_config);
            }
        }

        // 4. Environment variables
        config.apply_env(|key| std::env::var(key).ok());

        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config");
                None
            }
        }
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(uid) = var("DWALK_USER_ID") {
            self.user.uid = Some(uid);
        }
        if let Some(name) = var("DWALK_USER_NAME") {
            self.user.display_name = Some(name);
        }
        if let Some(email) = var("DWALK_USER_EMAIL") {
            self.user.email = Some(email);
        }
        if let Some(store_id) = var("DWALK_STORE_ID") {
            self.user.store_id = Some(store_id);
        }
        if let Some(backend) = var("DWALK_BACKEND") {
            match backend.parse() {
                Ok(kind) => self.backend = Some(kind),
                Err(e) => tracing::warn!(error = %e, "ignoring DWALK_BACKEND"),
            }
        }
        if let Some(editor) = var("DWALK_EDITOR") {
            self.editor = Some(editor);
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "dwalk")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        self.user.merge(other.user);
        if other.backend.is_some() {
            self.backend = other.backend;
        }
        if other.store_fallback.is_some() {
            self.store_fallback = other.store_fallback;
        }
        if other.list_limit.is_some() {
            self.list_limit = other.list_limit;
        }
        if other.editor.is_some() {
            self.editor = other.editor;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    /// The configured session; anonymous when no uid is set
    pub fn session(&self) -> SessionContext {
        match self.user.uid.as_deref().filter(|uid| !uid.is_empty()) {
            Some(uid) => SessionContext::signed_in(Session {
                uid: uid.to_string(),
                display_name: self.user.display_name.clone(),
                email: self.user.email.clone(),
                store_id: self.user.store_id.clone(),
            }),
            None => SessionContext::anonymous(),
        }
    }

    pub fn backend(&self) -> BackendKind {
        self.backend.unwrap_or_default()
    }

    pub fn store_fallback(&self) -> StoreFallback {
        self.store_fallback.unwrap_or_default()
    }

    pub fn list_limit(&self) -> usize {
        self.list_limit.filter(|n| *n > 0).unwrap_or(DEFAULT_LIST_LIMIT)
    }

    /// Get the editor command
    pub fn editor(&self) -> String {
        self.editor
            .clone()
            .or_else(|| std::env::var("EDITOR").ok())
            .or_else(|| std::env::var("VISUAL").ok())
            .unwrap_or_else(|| "vi".to_string())
    }

    /// Run the editor on a file, properly handling commands with arguments
    /// (e.g., "emacsclient -nw" or "code --wait")
    pub fn run_editor(&self, file_path: &Path) -> std::io::Result<std::process::ExitStatus> {
        let editor = self.editor();
        let mut parts = editor.split_whitespace();

        let Some(cmd) = parts.next() else {
            return std::process::Command::new("vi").arg(file_path).status();
        };

        std::process::Command::new(cmd)
            .args(parts)
            .arg(file_path)
            .status()
    }
}
