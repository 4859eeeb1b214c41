//! `dwalk validate` command - Validate stored documents against their schemas

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::Path;
use walkdir::WalkDir;

use crate::cli::commands::utils::WalkContext;
use crate::cli::GlobalOpts;
use crate::entities::checklist::{matches_catalog, CHECKLIST};
use crate::entities::Inspection;
use crate::schema::registry::SchemaRegistry;
use crate::schema::validator::Validator;
use crate::store::{BackendKind, Collection, DocumentStore, Query};

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Strict mode - warnings become errors
    #[arg(long)]
    pub strict: bool,

    /// Continue validation after first error
    #[arg(long)]
    pub keep_going: bool,

    /// Show summary only, don't show individual errors
    #[arg(long)]
    pub summary: bool,
}

/// A document to check: where it came from, its YAML text, its collection
struct Source {
    name: String,
    content: String,
    collection: Collection,
}

/// Validation statistics
#[derive(Default)]
struct ValidationStats {
    checked: usize,
    passed: usize,
    failed: usize,
    total_errors: usize,
    total_warnings: usize,
}

pub fn run(args: ValidateArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = WalkContext::open(global)?;
    let validator = Validator::new(&SchemaRegistry::default());

    let sources = match ctx.config.backend() {
        BackendKind::Yaml => file_sources(ctx.project.root())?,
        BackendKind::Sqlite => database_sources(&ctx)?,
    };

    println!(
        "{} Validating {} document(s)...\n",
        style("→").blue(),
        sources.len()
    );

    let mut stats = ValidationStats::default();
    let mut had_error = false;

    for source in &sources {
        stats.checked += 1;

        match validator.validate(&source.content, &source.name, source.collection) {
            Ok(()) => {
                let warnings = catalog_warnings(source);
                if warnings.is_empty() {
                    stats.passed += 1;
                    if !args.summary {
                        println!("{} {}", style("✓").green(), source.name);
                    }
                    continue;
                }

                stats.total_warnings += warnings.len();
                if !args.summary {
                    println!(
                        "{} {} - {} warning(s)",
                        style("!").yellow(),
                        source.name,
                        warnings.len()
                    );
                    for warning in &warnings {
                        println!("    {}", style(warning).yellow());
                    }
                }
                if args.strict {
                    stats.failed += 1;
                    had_error = true;
                } else {
                    stats.passed += 1;
                }
            }
            Err(e) => {
                stats.failed += 1;
                stats.total_errors += e.violations().len();
                had_error = true;

                if !args.summary {
                    println!(
                        "{} {} - {} error(s)",
                        style("✗").red(),
                        source.name,
                        e.violations().len()
                    );
                    let report = miette::Report::new(e);
                    println!("{:?}", report);
                }

                if !args.keep_going {
                    break;
                }
            }
        }
    }

    println!();
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", style("Validation Summary").bold());
    println!("{}", style("─".repeat(60)).dim());
    println!("  Documents checked: {}", style(stats.checked).cyan());
    println!("  Documents passed:  {}", style(stats.passed).green());
    println!("  Documents failed:  {}", style(stats.failed).red());
    println!("  Total errors:      {}", style(stats.total_errors).red());
    if stats.total_warnings > 0 {
        println!("  Total warnings:    {}", style(stats.total_warnings).yellow());
    }
    println!();

    if had_error {
        Err(miette::miette!(
            "Validation failed: {} document(s) have errors",
            stats.failed
        ))
    } else {
        println!("{} All documents passed validation!", style("✓").green().bold());
        Ok(())
    }
}

/// Every `.yaml` file under the collection directories, sorted by path
fn file_sources(root: &Path) -> Result<Vec<Source>> {
    let mut sources = Vec::new();

    for collection in Collection::all() {
        let dir = root.join(collection.name());
        if !dir.exists() {
            continue;
        }
        let mut paths: Vec<_> = WalkDir::new(&dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "yaml"))
            .collect();
        paths.sort();

        for path in paths {
            let content = std::fs::read_to_string(&path).into_diagnostic()?;
            let name = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .display()
                .to_string();
            sources.push(Source {
                name,
                content,
                collection: *collection,
            });
        }
    }
    Ok(sources)
}

/// Every document in the database, rendered as YAML
fn database_sources(ctx: &WalkContext) -> Result<Vec<Source>> {
    let mut sources = Vec::new();
    for collection in Collection::all() {
        let docs = ctx
            .service
            .store()
            .query(*collection, &Query::new())
            .map_err(|e| miette::miette!("{}", e))?;
        for (id, doc) in docs {
            sources.push(Source {
                name: format!("{}/{}", collection, id),
                content: serde_yml::to_string(&doc).into_diagnostic()?,
                collection: *collection,
            });
        }
    }
    Ok(sources)
}

/// Checks beyond the schema: inspection items should line up with the catalog
fn catalog_warnings(source: &Source) -> Vec<String> {
    if source.collection != Collection::Inspections {
        return Vec::new();
    }
    match serde_yml::from_str::<Inspection>(&source.content) {
        Ok(inspection) if !matches_catalog(&inspection.items) => vec![format!(
            "items do not match the current checklist ({} items, catalog has {})",
            inspection.items.len(),
            CHECKLIST.len()
        )],
        Ok(_) => Vec::new(),
        Err(e) => vec![format!("could not read as an inspection: {}", e)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_sources_reads_both_collections() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("inspections")).unwrap();
        std::fs::create_dir_all(dir.path().join("stores")).unwrap();
        std::fs::write(dir.path().join("stores/STORE-1.yaml"), "name: A\n").unwrap();
        std::fs::write(dir.path().join("inspections/notes.txt"), "ignored").unwrap();

        let sources = file_sources(dir.path()).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].collection, Collection::Stores);
        assert!(sources[0].name.ends_with("STORE-1.yaml"));
    }

    #[test]
    fn test_catalog_warning_for_short_item_list() {
        let source = Source {
            name: "inspections/INSP-1.yaml".to_string(),
            content: r#"
storeId: S1
date: "2024-05-01"
time: "09:30"
items:
  - {id: 1, description: x, passed: true, fixed: false, comments: ""}
status: draft
inspectedBy: {userId: u1, name: Dana}
createdAt: "2024-05-01T09:30:00.000Z"
updatedAt: "2024-05-01T09:30:00.000Z"
"#
            .to_string(),
            collection: Collection::Inspections,
        };
        let warnings = catalog_warnings(&source);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("catalog has 26"));
    }
}
