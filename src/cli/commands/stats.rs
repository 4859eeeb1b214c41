//! `dwalk stats` command - Compliance and fix-rate report

use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::commands::utils::WalkContext;
use crate::cli::helpers::truncate_str;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::WalkStats;

#[derive(clap::Args, Debug)]
pub struct StatsArgs {
    /// Only walks of this store (id)
    #[arg(long, short = 's')]
    pub store: Option<String>,

    /// Only the most recent N walks (default: list_limit from config)
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Output to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: StatsArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = WalkContext::open(global)?;

    let inspections = ctx.service.get_inspections(
        &ctx.session,
        args.store.as_deref(),
        args.limit.unwrap_or_else(|| ctx.config.list_limit()),
    )?;
    let stores = ctx.stores()?;
    let stats = WalkStats::compute(&inspections, &stores);

    let content = match ctx.format(global, OutputFormat::Md) {
        OutputFormat::Json => serde_json::to_string_pretty(&stats).into_diagnostic()? + "\n",
        OutputFormat::Yaml => serde_yml::to_string(&stats).into_diagnostic()?,
        _ => render_report(&stats),
    };
    write_output(&content, args.output)
}

fn render_report(stats: &WalkStats) -> String {
    let mut output = String::new();
    output.push_str("# Daily Walk Statistics\n\n");

    output.push_str("## Summary\n\n");
    let mut summary = Builder::default();
    summary.push_record(["Metric", "Value"]);
    summary.push_record(["Total Walks", &stats.total.to_string()]);
    summary.push_record(["Completed", &stats.completed.to_string()]);
    summary.push_record(["Drafts", &stats.draft.to_string()]);
    summary.push_record(["Items Checked", &stats.items_checked().to_string()]);
    summary.push_record(["Passed", &stats.passed_items.to_string()]);
    summary.push_record(["Failed", &stats.failed_items.to_string()]);
    summary.push_record(["Fixed", &stats.fixed_items.to_string()]);
    summary.push_record(["Compliance Rate", &format!("{}%", stats.compliance_rate)]);
    summary.push_record(["Fix Rate", &format!("{}%", stats.fix_rate)]);
    output.push_str(&summary.build().with(Style::markdown()).to_string());
    output.push('\n');

    if !stats.store_stats.is_empty() {
        output.push_str("\n## By Store\n\n");
        let mut by_store = Builder::default();
        by_store.push_record([
            "Store",
            "Walks",
            "Passed",
            "Failed",
            "Fixed",
            "Compliance",
            "Fix Rate",
        ]);
        for row in &stats.store_stats {
            by_store.push_record([
                truncate_str(&row.name, 30),
                row.inspections.to_string(),
                row.passed.to_string(),
                row.failed.to_string(),
                row.fixed.to_string(),
                format!("{}%", row.compliance_rate),
                format!("{}%", row.fix_rate),
            ]);
        }
        output.push_str(&by_store.build().with(Style::markdown()).to_string());
        output.push('\n');
    }

    output
}

fn write_output(content: &str, output_path: Option<PathBuf>) -> Result<()> {
    match output_path {
        Some(path) => {
            let file = File::create(&path).into_diagnostic()?;
            let mut writer = BufWriter::new(file);
            writer.write_all(content.as_bytes()).into_diagnostic()?;
            println!("Report written to: {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StoreStats;

    #[test]
    fn test_report_lists_rates_and_stores() {
        let stats = WalkStats {
            total: 2,
            completed: 1,
            draft: 1,
            passed_items: 33,
            failed_items: 17,
            fixed_items: 5,
            compliance_rate: 66,
            fix_rate: 29,
            store_stats: vec![StoreStats {
                store_id: "S1".to_string(),
                name: "Store #123".to_string(),
                inspections: 2,
                passed: 33,
                failed: 17,
                fixed: 5,
                compliance_rate: 66,
                fix_rate: 29,
            }],
        };

        let report = render_report(&stats);
        assert!(report.contains("| Compliance Rate | 66%"));
        assert!(report.contains("| Fix Rate"));
        assert!(report.contains("## By Store"));
        assert!(report.contains("Store #123"));
    }

    #[test]
    fn test_empty_report_has_no_store_table() {
        let report = render_report(&WalkStats::default());
        assert!(report.contains("Total Walks"));
        assert!(report.starts_with("# Daily Walk Statistics"));
        assert!(!report.contains("By Store"));
    }
}
