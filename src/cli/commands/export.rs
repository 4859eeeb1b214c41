//! `dwalk export` command - CSV export, one row per checklist answer

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

use crate::cli::commands::utils::WalkContext;
use crate::cli::GlobalOpts;
use crate::core::entity::{clock_time, InspectionStatus};
use crate::entities::{store_display_name, Inspection, Store};

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Only walks of this store (id)
    #[arg(long, short = 's')]
    pub store: Option<String>,

    /// Only walks with this status
    #[arg(long)]
    pub status: Option<InspectionStatus>,

    /// Write to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// One exported line
#[derive(Debug, Serialize, PartialEq)]
struct ExportRow {
    inspection_id: String,
    store_id: String,
    store_name: String,
    date: String,
    time: String,
    status: String,
    inspected_by: String,
    corrected_by: String,
    item_id: u32,
    description: String,
    /// `yes`, `no` or empty while unanswered
    passed: String,
    fixed: bool,
    comments: String,
}

pub fn run(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = WalkContext::open(global)?;

    let inspections =
        ctx.service
            .get_inspections(&ctx.session, args.store.as_deref(), usize::MAX)?;
    let stores = ctx.stores()?;

    let selected: Vec<&Inspection> = inspections
        .iter()
        .filter(|i| args.status.as_ref().map_or(true, |s| &i.status == s))
        .collect();

    match &args.output {
        Some(path) => {
            let file = std::fs::File::create(path).into_diagnostic()?;
            let count = write_csv(file, &selected, &stores)?;
            if !global.quiet {
                println!("Exported {} row(s) to: {}", count, path.display());
            }
        }
        None => {
            write_csv(std::io::stdout().lock(), &selected, &stores)?;
        }
    }
    Ok(())
}

fn write_csv<W: Write>(out: W, inspections: &[&Inspection], stores: &[Store]) -> Result<usize> {
    let mut writer = csv::Writer::from_writer(out);
    let mut count = 0;
    for inspection in inspections {
        for row in rows(inspection, stores) {
            writer.serialize(row).into_diagnostic()?;
            count += 1;
        }
    }
    writer.flush().into_diagnostic()?;
    Ok(count)
}

fn rows(inspection: &Inspection, stores: &[Store]) -> Vec<ExportRow> {
    let store_name = store_display_name(stores, &inspection.store_id);
    let corrected_by = inspection
        .corrected_by
        .as_ref()
        .map(|c| c.display_name().to_string())
        .unwrap_or_default();

    inspection
        .items
        .iter()
        .map(|item| ExportRow {
            inspection_id: inspection.id.clone(),
            store_id: inspection.store_id.clone(),
            store_name: store_name.clone(),
            date: inspection.date.to_string(),
            time: inspection.time.format(clock_time::FORMAT).to_string(),
            status: inspection.status.to_string(),
            inspected_by: inspection.inspected_by.name.clone(),
            corrected_by: corrected_by.clone(),
            item_id: item.id,
            description: item.description.clone(),
            passed: match item.passed() {
                Some(true) => "yes".to_string(),
                Some(false) => "no".to_string(),
                None => String::new(),
            },
            fixed: item.fixed(),
            comments: item.comments.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::checklist::initialize_checklist_items;
    use crate::entities::{Answer, CorrectedBy, UserRef};
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

    fn inspection() -> Inspection {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let mut items = initialize_checklist_items();
        items[0].answer = Answer::Passed;
        items[1].answer = Answer::Failed { fixed: true };
        items[1].comments = "tags, reprinted".to_string();
        Inspection {
            id: "INSP-1".to_string(),
            store_id: "S1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            items,
            status: InspectionStatus::Draft,
            inspected_by: UserRef {
                user_id: "u1".to_string(),
                name: "Dana".to_string(),
            },
            corrected_by: Some(CorrectedBy::Name("Sam".to_string())),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_one_row_per_item() {
        let rows = rows(&inspection(), &[]);
        assert_eq!(rows.len(), 26);
        assert_eq!(rows[0].passed, "yes");
        assert_eq!(rows[1].passed, "no");
        assert!(rows[1].fixed);
        assert_eq!(rows[2].passed, "");
        assert_eq!(rows[0].store_name, "Store #S1");
        assert_eq!(rows[0].corrected_by, "Sam");
    }

    #[test]
    fn test_csv_quotes_commas() {
        let inspection = inspection();
        let mut buf = Vec::new();
        let count = write_csv(&mut buf, &[&inspection], &[]).unwrap();
        assert_eq!(count, 26);

        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "inspection_id,store_id,store_name,date,time,status,inspected_by,corrected_by,item_id,description,passed,fixed,comments"
        );
        assert!(text.contains("\"tags, reprinted\""));
        assert!(text.contains("INSP-1,S1,Store #S1,2024-05-01,09:30,draft,Dana,Sam,1,"));
    }
}
