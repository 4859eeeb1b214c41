//! `dwalk config` command - Configuration management

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::commands::utils::discover_project;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::service::StoreFallback;
use crate::core::Config;
use crate::store::BackendKind;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration values
    Show(ShowArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// Unset (remove) a configuration value
    Unset(UnsetArgs),

    /// Open a config file in your editor
    Edit(ScopeArgs),

    /// Show paths to configuration files
    Path,

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Configuration key (e.g., user.uid, backend)
    pub key: String,

    /// Value to set
    pub value: String,

    #[command(flatten)]
    pub scope: ScopeArgs,
}

#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    /// Configuration key to remove
    pub key: String,

    #[command(flatten)]
    pub scope: ScopeArgs,
}

#[derive(clap::Args, Debug)]
pub struct ScopeArgs {
    /// Use the global (user) config instead of the project config
    #[arg(long, short = 'g')]
    pub global: bool,
}

/// Valid configuration keys
const VALID_KEYS: &[(&str, &str)] = &[
    ("user.uid", "Id of the person walking (required to create or list walks)"),
    ("user.display_name", "Name stamped on walks"),
    ("user.email", "Shown when no display name is set"),
    ("user.store_id", "Store preselected for new walks"),
    ("backend", "Document backend: yaml or sqlite"),
    ("store_fallback", "When stores cannot load: propagate or placeholder"),
    ("list_limit", "Default number of walks in `dwalk walk list`"),
    ("editor", "Editor command for `dwalk config edit`"),
    ("default_format", "Default output format (yaml, json, tsv, etc.)"),
];

/// Run a config subcommand
pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args, global),
        ConfigCommands::Set(args) => run_set(args, global),
        ConfigCommands::Unset(args) => run_unset(args, global),
        ConfigCommands::Edit(args) => run_edit(args, global),
        ConfigCommands::Path => run_path(global),
        ConfigCommands::Keys => run_keys(),
    }
}

fn load(global: &GlobalOpts) -> Config {
    let project = discover_project(global).ok();
    Config::load_for(project.as_ref())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let config = load(global);

    if let Some(key) = &args.key {
        return match get_config_value(&config, key) {
            Some(v) => {
                println!("{}", v);
                Ok(())
            }
            None => Err(miette::miette!("Key '{}' is not set", key)),
        };
    }

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config).into_diagnostic()?);
            return Ok(());
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&config).into_diagnostic()?);
            return Ok(());
        }
        _ => {}
    }

    println!("{}", style("Effective Configuration").bold().underlined());
    println!();
    for (key, _) in VALID_KEYS {
        print_config_value(key, get_config_value(&config, key).as_deref());
    }

    println!();
    println!("{}", style("Config Sources (in priority order):").dim());
    println!("  1. Environment variables (DWALK_USER_ID, DWALK_USER_NAME, DWALK_USER_EMAIL,");
    println!("     DWALK_STORE_ID, DWALK_BACKEND, DWALK_EDITOR)");
    println!("  2. Project config (.dwalk/config.yaml)");
    println!("  3. Global config (~/.config/dwalk/config.yaml)");

    Ok(())
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let value = typed_value(&args.key, &args.value)?;
    let config_path = config_path(args.scope.global, global)?;

    let mut config_map = read_mapping(&config_path)?;
    set_nested_value(&mut config_map, &args.key, value);

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    if !global.quiet {
        println!(
            "{} Set {} {} {} in {} config",
            style("✓").green(),
            style(&args.key).cyan(),
            style("→").dim(),
            style(&args.value).yellow(),
            scope_name(args.scope.global)
        );
    }
    Ok(())
}

fn run_unset(args: UnsetArgs, global: &GlobalOpts) -> Result<()> {
    let config_path = config_path(args.scope.global, global)?;
    if !config_path.exists() {
        return Err(miette::miette!(
            "Config file does not exist: {}",
            config_path.display()
        ));
    }

    let mut config_map = read_mapping(&config_path)?;
    if !unset_nested_value(&mut config_map, &args.key) {
        return Err(miette::miette!("Key '{}' not found in config", args.key));
    }

    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    if !global.quiet {
        println!(
            "{} Removed {} from {} config",
            style("✓").green(),
            style(&args.key).cyan(),
            scope_name(args.scope.global)
        );
    }
    Ok(())
}

fn run_edit(args: ScopeArgs, global: &GlobalOpts) -> Result<()> {
    let path = config_path(args.global, global)?;
    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).into_diagnostic()?;
        }
        fs::write(&path, "# dwalk configuration\n").into_diagnostic()?;
    }

    let status = load(global).run_editor(&path).into_diagnostic()?;
    if !status.success() {
        return Err(miette::miette!("editor exited with {}", status));
    }
    Ok(())
}

fn run_path(global: &GlobalOpts) -> Result<()> {
    let global_path = global_config_path()?;

    println!("{}", style("Configuration file paths:").bold());
    println!();
    println!("  {} {}", style("Global:").cyan(), global_path.display());
    println!("         {}", exists_label(global_path.exists()));

    println!();
    match discover_project(global) {
        Ok(project) => {
            let path = project.config_path();
            println!("  {} {}", style("Project:").cyan(), path.display());
            println!("          {}", exists_label(path.exists()));
        }
        Err(_) => println!(
            "  {} {}",
            style("Project:").cyan(),
            style("(not in a walk project)").dim()
        ),
    }
    Ok(())
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();

    for (key, description) in VALID_KEYS {
        println!("  {:<20} {}", style(key).cyan(), style(description).dim());
    }

    println!();
    println!(
        "{}",
        style("Use 'dwalk config set <key> <value>' to set a value.").dim()
    );
    Ok(())
}

fn exists_label(exists: bool) -> console::StyledObject<&'static str> {
    if exists {
        style("(exists)").green()
    } else {
        style("(not created)").dim()
    }
}

fn scope_name(global: bool) -> &'static str {
    if global {
        "global"
    } else {
        "project"
    }
}

fn global_config_path() -> Result<PathBuf> {
    Config::global_config_path()
        .ok_or_else(|| miette::miette!("Could not determine global config directory"))
}

fn config_path(global_scope: bool, global: &GlobalOpts) -> Result<PathBuf> {
    if global_scope {
        global_config_path()
    } else {
        Ok(discover_project(global)?.config_path())
    }
}

fn read_mapping(path: &Path) -> Result<serde_yml::Value> {
    if !path.exists() {
        return Ok(serde_yml::Value::Mapping(Default::default()));
    }
    let content = fs::read_to_string(path).into_diagnostic()?;
    Ok(match serde_yml::from_str::<serde_yml::Value>(&content) {
        Ok(value @ serde_yml::Value::Mapping(_)) => value,
        _ => serde_yml::Value::Mapping(Default::default()),
    })
}

/// Check a value against its key and convert it to the YAML type the key expects
fn typed_value(key: &str, value: &str) -> Result<serde_yml::Value> {
    if !VALID_KEYS.iter().any(|(k, _)| *k == key) {
        return Err(miette::miette!(
            "Unknown configuration key '{}'. Run 'dwalk config keys' for the list.",
            key
        ));
    }

    let text = match key {
        "backend" => {
            value.parse::<BackendKind>().map_err(|e| miette::miette!("{}", e))?;
            value.to_lowercase()
        }
        "store_fallback" => {
            value.parse::<StoreFallback>().map_err(|e| miette::miette!("{}", e))?;
            value.to_lowercase()
        }
        "default_format" => {
            value.parse::<OutputFormat>().map_err(|e| miette::miette!("{}", e))?;
            value.to_lowercase()
        }
        "list_limit" => {
            let n: u64 = value
                .parse()
                .map_err(|_| miette::miette!("list_limit must be a positive number"))?;
            return Ok(serde_yml::Value::Number(n.into()));
        }
        _ => value.to_string(),
    };
    Ok(serde_yml::Value::String(text))
}

fn get_config_value(config: &Config, key: &str) -> Option<String> {
    match key {
        "user.uid" => config.user.uid.clone(),
        "user.display_name" => config.user.display_name.clone(),
        "user.email" => config.user.email.clone(),
        "user.store_id" => config.user.store_id.clone(),
        "backend" => Some(format!("{:?}", config.backend()).to_lowercase()),
        "store_fallback" => Some(format!("{:?}", config.store_fallback()).to_lowercase()),
        "list_limit" => Some(config.list_limit().to_string()),
        "editor" => config.editor.clone(),
        "default_format" => config.default_format.clone(),
        _ => None,
    }
}

fn print_config_value(key: &str, value: Option<&str>) {
    match value {
        Some(v) => println!("  {}: {}", style(key).cyan(), style(v).yellow()),
        None => println!("  {}: {}", style(key).cyan(), style("(not set)").dim()),
    }
}

fn set_nested_value(root: &mut serde_yml::Value, key: &str, value: serde_yml::Value) {
    let parts: Vec<&str> = key.split('.').collect();
    let Some((last, parents)) = parts.split_last() else {
        return;
    };

    let mut current = root;
    for part in parents {
        let serde_yml::Value::Mapping(map) = current else {
            return;
        };
        let key = serde_yml::Value::String(part.to_string());
        if !map.get(&key).is_some_and(serde_yml::Value::is_mapping) {
            map.insert(key.clone(), serde_yml::Value::Mapping(Default::default()));
        }
        let Some(next) = map.get_mut(&key) else {
            return;
        };
        current = next;
    }

    if let serde_yml::Value::Mapping(map) = current {
        map.insert(serde_yml::Value::String(last.to_string()), value);
    }
}

fn unset_nested_value(root: &mut serde_yml::Value, key: &str) -> bool {
    let parts: Vec<&str> = key.split('.').collect();
    let Some((last, parents)) = parts.split_last() else {
        return false;
    };

    let mut current = root;
    for part in parents {
        match current.get_mut(*part) {
            Some(next) => current = next,
            None => return false,
        }
    }

    match current {
        serde_yml::Value::Mapping(map) => map
            .remove(&serde_yml::Value::String(last.to_string()))
            .is_some(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_unset_nested_keys() {
        let mut root = serde_yml::Value::Mapping(Default::default());
        set_nested_value(&mut root, "user.uid", serde_yml::Value::String("u1".into()));
        set_nested_value(&mut root, "backend", serde_yml::Value::String("sqlite".into()));

        let config: Config = serde_yml::from_value(root.clone()).unwrap();
        assert_eq!(config.user.uid.as_deref(), Some("u1"));
        assert_eq!(config.backend(), BackendKind::Sqlite);

        assert!(unset_nested_value(&mut root, "user.uid"));
        assert!(!unset_nested_value(&mut root, "user.uid"));
        assert!(!unset_nested_value(&mut root, "missing.key"));
    }

    #[test]
    fn test_typed_values() {
        assert_eq!(
            typed_value("list_limit", "20").unwrap(),
            serde_yml::Value::Number(20u64.into())
        );
        assert_eq!(
            typed_value("backend", "SQLite").unwrap(),
            serde_yml::Value::String("sqlite".into())
        );
        assert!(typed_value("backend", "postgres").is_err());
        assert!(typed_value("author", "me").is_err());
        assert!(typed_value("list_limit", "many").is_err());
    }
}
