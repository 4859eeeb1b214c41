//! `dwalk init` command - Initialize a new walk project

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::{Path, PathBuf};

use crate::core::project::{Project, ProjectError};
use crate::store::BackendKind;

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Document backend to record in the project config
    #[arg(long, value_parser = parse_backend)]
    pub backend: Option<BackendKind>,

    /// Force initialization even if .dwalk/ already exists
    #[arg(long)]
    pub force: bool,
}

fn parse_backend(s: &str) -> Result<BackendKind, String> {
    s.parse()
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        println!(
            "{} Created directory {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    let project = if args.force {
        Project::init_force(&path)
    } else {
        Project::init(&path)
    };

    match project {
        Ok(project) => {
            if let Some(backend) = args.backend {
                set_backend(&project, backend)?;
            }
            println!(
                "{} Initialized walk project at {}",
                style("✓").green(),
                style(project.root().display()).cyan()
            );
            println!();
            println!("Created project structure:");
            print_structure(project.root());
            println!();
            println!("Next steps:");
            println!(
                "  {} Say who is walking",
                style("export DWALK_USER_ID=<you>").yellow()
            );
            println!("  {} Start a walk", style("dwalk walk new -i").yellow());
            println!("  {} See how stores are doing", style("dwalk stats").yellow());
            Ok(())
        }
        Err(ProjectError::AlreadyExists(path)) => {
            println!(
                "{} Walk project already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!("Use {} to reinitialize", style("dwalk init --force").yellow());
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}

/// Rewrite the `backend:` line of the freshly written config
fn set_backend(project: &Project, backend: BackendKind) -> Result<()> {
    let path = project.config_path();
    let content = std::fs::read_to_string(&path).into_diagnostic()?;
    let value = serde_yml::to_string(&backend).into_diagnostic()?;
    let updated: Vec<String> = content
        .lines()
        .map(|line| {
            if line.starts_with("backend:") {
                format!("backend: {}", value.trim())
            } else {
                line.to_string()
            }
        })
        .collect();
    std::fs::write(&path, updated.join("\n") + "\n").into_diagnostic()
}

fn print_structure(root: &Path) {
    let entries = [".dwalk/", ".dwalk/config.yaml", "inspections/", "stores/"];

    for entry in entries {
        if root.join(entry).exists() {
            let prefix = if entry.ends_with('/') { "📁" } else { "📄" };
            println!("  {} {}", prefix, style(entry).dim());
        }
    }
}
