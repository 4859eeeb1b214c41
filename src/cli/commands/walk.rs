//! `dwalk walk` command - Daily walk inspections

use chrono::{Local, NaiveDate, NaiveTime};
use clap::Subcommand;
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::utils::WalkContext;
use crate::cli::helpers::{parse_item_comment, parse_item_ids};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::{clock_time, InspectionStatus};
use crate::core::error::{ValidationFailure, WalkError};
use crate::core::form::{unanswered_ids, EditController, EditOutcome, NewWalkController, WalkForm};
use crate::core::shortid::ShortIdIndex;
use crate::core::InspectionFilter;
use crate::entities::{store_display_name, Answer, Inspection, Store};

#[derive(Subcommand, Debug)]
pub enum WalkCommands {
    /// Start a new walk and save it as a draft or submit it
    New(NewArgs),

    /// List recent walks
    List(ListArgs),

    /// Show a walk's answers
    Show(ShowArgs),

    /// Continue a draft walk
    Edit(EditArgs),

    /// Mark a walk completed
    Complete(CompleteArgs),
}

/// Answers and form fields shared by `new` and `edit`
#[derive(clap::Args, Debug, Default)]
pub struct AnswerArgs {
    /// Store id or name
    #[arg(long, short = 's')]
    pub store: Option<String>,

    /// Walk date (YYYY-MM-DD, default today)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Walk time (HH:MM, default now)
    #[arg(long, value_parser = parse_clock_time)]
    pub time: Option<NaiveTime>,

    /// Checklist items that passed, e.g. 1,2,5
    #[arg(long, value_name = "IDS")]
    pub pass: Vec<String>,

    /// Checklist items that failed
    #[arg(long, value_name = "IDS")]
    pub fail: Vec<String>,

    /// Checklist items that failed and were fixed during the walk
    #[arg(long, value_name = "IDS")]
    pub fixed: Vec<String>,

    /// Clear the answer on these items
    #[arg(long, value_name = "IDS")]
    pub clear: Vec<String>,

    /// Comment on an item, e.g. --comment 4="Tongs missing"
    #[arg(long, value_name = "ID=TEXT", value_parser = parse_item_comment)]
    pub comment: Vec<(u32, String)>,

    /// Answer every remaining item as passed
    #[arg(long)]
    pub all_pass: bool,

    /// Who corrected the failed items
    #[arg(long)]
    pub corrected_by: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    #[command(flatten)]
    pub answers: AnswerArgs,

    /// Submit as completed instead of saving a draft
    #[arg(long)]
    pub submit: bool,

    /// Interactive mode (prompt for each item)
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only walks of this store (id)
    #[arg(long, short = 's')]
    pub store: Option<String>,

    /// Only walks with this status
    #[arg(long)]
    pub status: Option<InspectionStatus>,

    /// Search store name, inspector and date
    #[arg(long)]
    pub search: Option<String>,

    /// Limit number of results (default: list_limit from config)
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Walk id or short id (@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Walk id or short id (@N)
    pub id: String,

    #[command(flatten)]
    pub answers: AnswerArgs,

    /// Submit as completed instead of saving the draft
    #[arg(long)]
    pub submit: bool,

    /// Interactive mode (prompt for unanswered items)
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct CompleteArgs {
    /// Walk id or short id (@N)
    pub id: String,

    /// Record the current user as having corrected the failed items
    #[arg(long)]
    pub corrected_by_me: bool,

    /// Complete even if some items are unanswered
    #[arg(long)]
    pub force: bool,
}

fn parse_clock_time(s: &str) -> std::result::Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, clock_time::FORMAT)
        .map_err(|_| format!("'{}' is not a time of day (HH:MM)", s))
}

/// Run a walk subcommand
pub fn run(cmd: WalkCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        WalkCommands::New(args) => run_new(args, global),
        WalkCommands::List(args) => run_list(args, global),
        WalkCommands::Show(args) => run_show(args, global),
        WalkCommands::Edit(args) => run_edit(args, global),
        WalkCommands::Complete(args) => run_complete(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = WalkContext::open(global)?;
    let controller = NewWalkController::new(&ctx.service, &ctx.session);
    let mut form = controller.start(Local::now().naive_local())?;

    apply_answers(&mut form, &args.answers, &ctx)?;

    let submit = if args.interactive {
        prompt_form(&mut form, &ctx.stores()?)?;
        args.submit || prompt_submit(&form)?
    } else {
        args.submit
    };

    let inspection = if submit {
        controller.submit(&form)?
    } else {
        controller.save_draft(&form)?
    };
    print_saved(&inspection, submit, global);
    Ok(())
}

fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = WalkContext::open(global)?;
    let id = ctx.resolve_walk(&args.id)?;
    let controller = EditController::new(&ctx.service);

    let mut edit = match controller.load(&id)? {
        EditOutcome::Edit(edit) => edit,
        EditOutcome::Redirect { id, .. } => return show_walk(&ctx, &id, global),
    };

    apply_answers(&mut edit.form, &args.answers, &ctx)?;

    let submit = if args.interactive {
        prompt_form(&mut edit.form, &ctx.stores()?)?;
        args.submit || prompt_submit(&edit.form)?
    } else {
        args.submit
    };

    let inspection = if submit {
        controller.submit(&edit)?
    } else {
        controller.save_draft(&mut edit)?
    };
    print_saved(&inspection, submit, global);
    Ok(())
}

fn run_complete(args: CompleteArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = WalkContext::open(global)?;
    let id = ctx.resolve_walk(&args.id)?;

    let inspection = ctx.service.get_inspection_by_id(&id)?;
    let missing = unanswered_ids(&inspection.items);
    if !missing.is_empty() && !args.force {
        return Err(WalkError::from(ValidationFailure::Unanswered { item_ids: missing }).into());
    }

    let corrected_by = if args.corrected_by_me {
        Some(ctx.session.require()?)
    } else {
        None
    };
    ctx.service.complete_inspection(&id, corrected_by)?;

    if !global.quiet {
        println!("{} Completed walk {}", style("✓").green(), style(&id).cyan());
    }
    Ok(())
}

const LIST_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("date", "DATE", 12),
    ColumnDef::new("time", "TIME", 7),
    ColumnDef::new("store", "STORE", 24),
    ColumnDef::new("inspector", "INSPECTOR", 20),
    ColumnDef::new("status", "STATUS", 11),
    ColumnDef::new("passed", "PASS", 6),
    ColumnDef::new("failed", "FAIL", 6),
    ColumnDef::new("fixed", "FIXED", 6),
];

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = WalkContext::open(global)?;
    let limit = args.limit.unwrap_or_else(|| ctx.config.list_limit());

    let inspections =
        ctx.service
            .get_inspections(&ctx.session, args.store.as_deref(), limit)?;

    let stores = ctx.stores()?;
    let filter = InspectionFilter {
        store_id: None,
        status: args.status,
        search: args.search,
    };
    let inspections = filter.apply(inspections, &stores);

    if args.count {
        println!("{}", inspections.len());
        return Ok(());
    }

    let mut short_ids = ShortIdIndex::load(&ctx.project);
    short_ids.rebuild(inspections.iter().map(|i| i.id.clone()));
    if let Err(e) = short_ids.save(&ctx.project) {
        tracing::warn!(error = %e, "could not save short id index");
    }

    match ctx.format(global, OutputFormat::Tsv) {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&inspections).into_diagnostic()?
            );
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&inspections).into_diagnostic()?);
        }
        format => {
            if inspections.is_empty() && matches!(format, OutputFormat::Tsv) {
                println!("No walks found.");
                return Ok(());
            }
            let rows: Vec<TableRow> = inspections
                .iter()
                .map(|i| list_row(i, &stores, &short_ids))
                .collect();
            TableFormatter::new(LIST_COLUMNS, "walk").output(&rows, format);
        }
    }
    Ok(())
}

fn list_row(inspection: &Inspection, stores: &[Store], short_ids: &ShortIdIndex) -> TableRow {
    let summary = inspection.summary();
    TableRow::new(&inspection.id, short_ids.label(&inspection.id))
        .cell("date", CellValue::Date(inspection.date))
        .cell("time", CellValue::Time(inspection.time))
        .cell(
            "store",
            CellValue::Text(store_display_name(stores, &inspection.store_id)),
        )
        .cell(
            "inspector",
            CellValue::Text(inspection.inspected_by.name.clone()),
        )
        .cell("status", CellValue::Status(inspection.status))
        .cell("passed", CellValue::Number(summary.passed))
        .cell("failed", CellValue::Number(summary.failed))
        .cell("fixed", CellValue::Number(summary.fixed))
}

const ITEM_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("description", "ITEM", 60),
    ColumnDef::new("answer", "ANSWER", 12),
    ColumnDef::new("comments", "COMMENTS", 40),
];

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = WalkContext::open(global)?;
    let id = ctx.resolve_walk(&args.id)?;
    show_walk(&ctx, &id, global)
}

/// Read-only view of one walk, shared by `show` and the `edit` redirect
fn show_walk(ctx: &WalkContext, id: &str, global: &GlobalOpts) -> Result<()> {
    let inspection = ctx.service.get_inspection_by_id(id)?;

    match ctx.format(global, OutputFormat::Auto) {
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&inspection).into_diagnostic()?);
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&inspection).into_diagnostic()?
            );
        }
        OutputFormat::Id => println!("{}", inspection.id),
        OutputFormat::Auto | OutputFormat::Tsv => {
            let stores = ctx.stores()?;
            print_details(&inspection, &stores);
            println!();
            TableFormatter::new(ITEM_COLUMNS, "item")
                .without_summary()
                .output(&item_rows(&inspection), OutputFormat::Tsv);
        }
        format => {
            TableFormatter::new(ITEM_COLUMNS, "item")
                .without_summary()
                .output(&item_rows(&inspection), format);
        }
    }
    Ok(())
}

fn print_details(inspection: &Inspection, stores: &[Store]) {
    let summary = inspection.summary();

    println!("{}", style(&inspection.id).cyan().bold());
    println!(
        "  {:<13} {}",
        style("Store:").dim(),
        store_display_name(stores, &inspection.store_id)
    );
    println!(
        "  {:<13} {} {}",
        style("When:").dim(),
        inspection.date,
        inspection.time.format(clock_time::FORMAT)
    );
    println!("  {:<13} {}", style("Status:").dim(), inspection.status);
    println!(
        "  {:<13} {}",
        style("Inspected by:").dim(),
        inspection.inspected_by.name
    );
    if let Some(corrected_by) = &inspection.corrected_by {
        println!(
            "  {:<13} {}",
            style("Corrected by:").dim(),
            corrected_by.display_name()
        );
    }
    println!(
        "  {:<13} {} passed, {} failed ({} fixed), {} unanswered",
        style("Answers:").dim(),
        style(summary.passed).green(),
        style(summary.failed).red(),
        summary.fixed,
        summary.unanswered
    );
}

fn item_rows(inspection: &Inspection) -> Vec<TableRow> {
    inspection
        .items
        .iter()
        .map(|item| {
            let comments = if item.comments.is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(item.comments.clone())
            };
            TableRow::new(item.id.to_string(), item.id.to_string())
                .cell("description", CellValue::Text(item.description.clone()))
                .cell("answer", CellValue::Answer(item.answer))
                .cell("comments", comments)
        })
        .collect()
}

/// Apply command-line answers to a form, in flag order: pass, fail, fixed,
/// clear, comments, then `--all-pass` for whatever is left
fn apply_answers(form: &mut WalkForm, args: &AnswerArgs, ctx: &WalkContext) -> Result<()> {
    if let Some(store) = &args.store {
        form.store_id = Some(resolve_store(&ctx.stores()?, store)?);
    }
    if let Some(date) = args.date {
        form.date = date;
    }
    if let Some(time) = args.time {
        form.time = time;
    }

    for id in item_ids(&args.pass)? {
        form.answer(id, true)?;
    }
    for id in item_ids(&args.fail)? {
        form.answer(id, false)?;
    }
    for id in item_ids(&args.fixed)? {
        form.answer(id, false)?;
        form.set_fixed(id, true)?;
    }
    for id in item_ids(&args.clear)? {
        form.clear_answer(id)?;
    }
    for (id, text) in &args.comment {
        form.set_comments(*id, text.clone())?;
    }
    if args.all_pass {
        form.pass_remaining();
    }
    if let Some(name) = &args.corrected_by {
        form.corrected_by = name.clone();
    }
    Ok(())
}

fn item_ids(lists: &[String]) -> Result<Vec<u32>> {
    let mut ids = Vec::new();
    for list in lists {
        ids.extend(parse_item_ids(list).map_err(|e| miette::miette!("{}", e))?);
    }
    Ok(ids)
}

/// Match a store by id, then by case-insensitive name
fn resolve_store(stores: &[Store], reference: &str) -> Result<String> {
    stores
        .iter()
        .find(|s| s.id == reference)
        .or_else(|| {
            stores
                .iter()
                .find(|s| s.name.eq_ignore_ascii_case(reference))
        })
        .map(|s| s.id.clone())
        .ok_or_else(|| {
            miette::miette!(
                help = "run `dwalk store list` to see known stores",
                "no store matches '{}'",
                reference
            )
        })
}

fn prompt_form(form: &mut WalkForm, stores: &[Store]) -> Result<()> {
    let theme = ColorfulTheme::default();

    if !stores.is_empty() {
        let names: Vec<String> = stores.iter().map(|s| s.name.clone()).collect();
        let current = form
            .store_id
            .as_ref()
            .and_then(|id| stores.iter().position(|s| &s.id == id))
            .unwrap_or(0);
        let idx = Select::with_theme(&theme)
            .with_prompt("Store")
            .items(&names)
            .default(current)
            .interact()
            .into_diagnostic()?;
        form.store_id = Some(stores[idx].id.clone());
    }

    let pending: Vec<(u32, String)> = form
        .items
        .iter()
        .filter(|i| !i.answer.is_answered())
        .map(|i| (i.id, i.description.clone()))
        .collect();
    let total = form.items.len();

    for (id, description) in pending {
        let choice = Select::with_theme(&theme)
            .with_prompt(format!("[{}/{}] {}", id, total, description))
            .items(&["Yes", "No", "Skip"])
            .default(0)
            .interact()
            .into_diagnostic()?;

        match choice {
            0 => form.answer(id, true)?,
            1 => {
                form.answer(id, false)?;
                let fixed = Confirm::with_theme(&theme)
                    .with_prompt("Fixed during the walk?")
                    .default(false)
                    .interact()
                    .into_diagnostic()?;
                form.set_fixed(id, fixed)?;
                let comments: String = Input::with_theme(&theme)
                    .with_prompt("Comments")
                    .allow_empty(true)
                    .interact_text()
                    .into_diagnostic()?;
                form.set_comments(id, comments)?;
            }
            _ => {}
        }
    }

    if form.has_failed_items() && form.corrected_by.trim().is_empty() {
        form.corrected_by = Input::with_theme(&theme)
            .with_prompt("Corrected by")
            .allow_empty(true)
            .interact_text()
            .into_diagnostic()?;
    }
    Ok(())
}

/// Ask whether to submit; only offered when the form is submittable
fn prompt_submit(form: &WalkForm) -> Result<bool> {
    if form.validate_submit().is_err() {
        return Ok(false);
    }
    let idx = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Every item is answered")
        .items(&["Submit", "Save as draft"])
        .default(0)
        .interact()
        .into_diagnostic()?;
    Ok(idx == 0)
}

fn print_saved(inspection: &Inspection, submitted: bool, global: &GlobalOpts) {
    if global.quiet || matches!(global.format, OutputFormat::Id) {
        println!("{}", inspection.id);
        return;
    }

    let verb = if submitted { "Submitted" } else { "Saved draft" };
    println!(
        "{} {} {}",
        style("✓").green(),
        verb,
        style(&inspection.id).cyan()
    );
    if !submitted {
        let missing = unanswered_ids(&inspection.items).len();
        if missing > 0 {
            println!(
                "   {} item(s) still unanswered. Continue with {}",
                missing,
                style(format!("dwalk walk edit {} -i", inspection.id)).yellow()
            );
        }
    }
    if inspection.items.iter().any(|i| matches!(i.answer, Answer::Failed { fixed: false })) {
        println!("   {}", style("Some failed items are not fixed yet.").yellow());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stores() -> Vec<Store> {
        vec![
            Store {
                id: "STORE-1".to_string(),
                name: "Store #123".to_string(),
                location: None,
                created_at: None,
            },
            Store {
                id: "STORE-2".to_string(),
                name: "Downtown".to_string(),
                location: None,
                created_at: None,
            },
        ]
    }

    #[test]
    fn test_resolve_store_by_id_or_name() {
        assert_eq!(resolve_store(&stores(), "STORE-2").unwrap(), "STORE-2");
        assert_eq!(resolve_store(&stores(), "downtown").unwrap(), "STORE-2");
        assert!(resolve_store(&stores(), "Uptown").is_err());
    }

    #[test]
    fn test_item_ids_across_flags() {
        let ids = item_ids(&["1,2".to_string(), "7".to_string()]).unwrap();
        assert_eq!(ids, vec![1, 2, 7]);
        assert!(item_ids(&["x".to_string()]).is_err());
    }

    #[test]
    fn test_parse_clock_time() {
        assert_eq!(
            parse_clock_time("07:05").unwrap(),
            NaiveTime::from_hms_opt(7, 5, 0).unwrap()
        );
        assert!(parse_clock_time("7am").is_err());
    }
}
