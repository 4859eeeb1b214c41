//! Shared utilities for CLI commands

use miette::Result;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::notify::ConsoleNotifier;
use crate::core::project::Project;
use crate::core::service::InspectionService;
use crate::core::session::SessionContext;
use crate::core::shortid::resolve_reference;
use crate::core::Config;
use crate::entities::Store;
use crate::store::DocumentStore;

/// Store handle every command works through
pub type Service = InspectionService<Box<dyn DocumentStore>>;

/// Everything a command needs: the project, its layered config, the session
/// derived from that config, and a service over the configured backend
pub struct WalkContext {
    pub project: Project,
    pub config: Config,
    pub session: SessionContext,
    pub service: Service,
    quiet: bool,
}

impl WalkContext {
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let project = discover_project(global)?;
        let config = Config::load_for(Some(&project));
        let session = config.session();

        let store = project
            .open_store(config.backend())
            .map_err(|e| miette::miette!("failed to open {:?} store: {}", config.backend(), e))?;
        let service = InspectionService::new(store).with_notifier(ConsoleNotifier::new(global.quiet));

        Ok(Self {
            project,
            config,
            session,
            service,
            quiet: global.quiet,
        })
    }

    pub fn quiet(&self) -> bool {
        self.quiet
    }

    /// Stores under the configured failure policy
    pub fn stores(&self) -> Result<Vec<Store>> {
        Ok(self.service.get_stores_with(self.config.store_fallback())?)
    }

    /// Turn `@N`, a bare number or a full id into a document id
    pub fn resolve_walk(&self, reference: &str) -> Result<String> {
        let resolved = resolve_reference(reference, &self.project).ok_or_else(|| {
            miette::miette!(
                "no walk numbered {} in the last listing; run `dwalk walk list` first",
                reference
            )
        })?;
        canonical_walk_id(resolved)
    }

    /// The command's format, else the configured default, else `fallback`
    pub fn format(&self, global: &GlobalOpts, fallback: OutputFormat) -> OutputFormat {
        let configured = self
            .config
            .default_format
            .as_deref()
            .and_then(|f| f.parse::<OutputFormat>().ok())
            .unwrap_or(OutputFormat::Auto);
        global.format.or(configured).or(fallback)
    }
}

/// Normalize a generated walk id to its canonical spelling
///
/// Ids that are not prefix + ULID (imported data) pass through untouched.
pub fn canonical_walk_id(id: String) -> Result<String> {
    match EntityId::parse(&id) {
        Ok(parsed) if parsed.prefix() == EntityPrefix::Insp => Ok(parsed.to_string()),
        Ok(parsed) => Err(miette::miette!(
            help = "walk commands take an INSP-... id or an @N from `dwalk walk list`",
            "{} is a {} id, not a walk",
            id,
            parsed.prefix()
        )),
        Err(_) => Ok(id),
    }
}

/// The project named by `--project`, or the one containing the working directory
pub fn discover_project(global: &GlobalOpts) -> Result<Project> {
    match &global.project {
        Some(path) => Project::discover_from(path),
        None => Project::discover(),
    }
    .map_err(|e| miette::miette!("{}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_walk_id_uppercases_generated_ids() {
        let id = canonical_walk_id("insp-01j0000000000000000000000a".to_string()).unwrap();
        assert_eq!(id, "INSP-01J0000000000000000000000A");
    }

    #[test]
    fn test_canonical_walk_id_rejects_store_ids() {
        let err = canonical_walk_id("STORE-01J0000000000000000000000A".to_string()).unwrap_err();
        assert!(err.to_string().contains("is a STORE id, not a walk"));
    }

    #[test]
    fn test_canonical_walk_id_passes_other_ids_through() {
        assert_eq!(canonical_walk_id("legacy-42".to_string()).unwrap(), "legacy-42");
        assert_eq!(canonical_walk_id("INSP-missing".to_string()).unwrap(), "INSP-missing");
    }
}
