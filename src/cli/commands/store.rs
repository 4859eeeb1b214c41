//! `dwalk store` command - Store reference data

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::utils::WalkContext;
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(Subcommand, Debug)]
pub enum StoreCommands {
    /// List stores (an empty project gets a demo store)
    List,

    /// Register a store
    Add(AddArgs),
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Store name, e.g. "Store #204"
    pub name: String,

    /// Where the store is
    #[arg(long, short = 'l')]
    pub location: Option<String>,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("name", "NAME", 30),
    ColumnDef::new("location", "LOCATION", 30),
];

pub fn run(cmd: StoreCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        StoreCommands::List => run_list(global),
        StoreCommands::Add(args) => run_add(args, global),
    }
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let ctx = WalkContext::open(global)?;
    let stores = ctx.stores()?;

    match ctx.format(global, OutputFormat::Tsv) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stores).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&stores).into_diagnostic()?);
        }
        format => {
            let rows: Vec<TableRow> = stores
                .iter()
                .map(|s| {
                    let location = match &s.location {
                        Some(l) => CellValue::Text(l.clone()),
                        None => CellValue::Empty,
                    };
                    TableRow::new(&s.id, &s.id)
                        .cell("name", CellValue::Text(s.name.clone()))
                        .cell("location", location)
                })
                .collect();
            TableFormatter::new(COLUMNS, "store")
                .without_summary()
                .output(&rows, format);
        }
    }
    Ok(())
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = WalkContext::open(global)?;
    let store = ctx.service.add_store(&args.name, args.location.as_deref())?;

    if ctx.quiet() {
        println!("{}", store.id);
    } else {
        println!(
            "{} Added store {} {}",
            style("✓").green(),
            style(&store.name).bold(),
            style(format!("({})", store.id)).dim()
        );
    }
    Ok(())
}
