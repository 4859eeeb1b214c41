//! `dwalk checklist` command - Print the checklist catalog

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::checklist::{ChecklistItemDefinition, CATALOG_VERSION, CHECKLIST};

#[derive(clap::Args, Debug)]
pub struct ChecklistArgs {}

#[derive(Serialize)]
struct Catalog {
    version: u32,
    items: &'static [ChecklistItemDefinition],
}

const COLUMNS: &[ColumnDef] = &[ColumnDef::new("description", "CHECK", 90)];

pub fn run(_args: ChecklistArgs, global: &GlobalOpts) -> Result<()> {
    let catalog = Catalog {
        version: CATALOG_VERSION,
        items: CHECKLIST,
    };

    match global.format.or(OutputFormat::Tsv) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&catalog).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&catalog).into_diagnostic()?);
        }
        format => {
            let rows: Vec<TableRow> = CHECKLIST
                .iter()
                .map(|def| {
                    TableRow::new(def.id.to_string(), def.id.to_string())
                        .cell("description", CellValue::Text(def.description.to_string()))
                })
                .collect();
            TableFormatter::new(COLUMNS, "check")
                .without_summary()
                .output(&rows, format);
            if matches!(format, OutputFormat::Tsv) && !global.quiet {
                println!();
                println!(
                    "{}",
                    style(format!(
                        "Catalog version {}, {} checks",
                        CATALOG_VERSION,
                        CHECKLIST.len()
                    ))
                    .dim()
                );
            }
        }
    }
    Ok(())
}
