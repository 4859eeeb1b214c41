//! Table formatting for CLI list commands
//!
//! Rows are built from typed cells so that each output format can render
//! them its own way: padded and colored for the terminal, escaped for CSV,
//! pipe-safe for Markdown.

use chrono::{NaiveDate, NaiveTime};
use console::style;

use crate::cli::helpers::{escape_csv, format_short_id, truncate_str};
use crate::cli::OutputFormat;
use crate::core::entity::InspectionStatus;
use crate::entities::Answer;

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Document id (truncated in the terminal, cyan)
    Id(String),
    Text(String),
    Status(InspectionStatus),
    Answer(Answer),
    Date(NaiveDate),
    Time(NaiveTime),
    Number(usize),
    /// Whole percentage, colored by threshold
    Percent(u32),
    Empty,
}

impl CellValue {
    fn plain(&self) -> String {
        match self {
            CellValue::Id(id) | CellValue::Text(id) => id.clone(),
            CellValue::Status(status) => status.to_string(),
            CellValue::Answer(answer) => answer.label().to_string(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::Time(t) => t.format("%H:%M").to_string(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Percent(p) => format!("{}%", p),
            CellValue::Empty => String::new(),
        }
    }

    /// Format for terminal output (with colors if terminal)
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Id(id) => format!("{:<width$}", style(format_short_id(id)).cyan()),
            CellValue::Text(s) => format!("{:<width$}", truncate_str(s, width.saturating_sub(2))),
            CellValue::Status(status) => {
                let s = status.to_string();
                let styled = match status {
                    InspectionStatus::Draft => style(s).yellow(),
                    InspectionStatus::Completed => style(s).green(),
                    InspectionStatus::Reviewed => style(s).cyan().bold(),
                };
                format!("{:<width$}", styled)
            }
            CellValue::Answer(answer) => {
                let styled = match answer {
                    Answer::Unanswered => style(answer.label()).dim(),
                    Answer::Passed => style(answer.label()).green(),
                    Answer::Failed { fixed: true } => style(answer.label()).yellow(),
                    Answer::Failed { fixed: false } => style(answer.label()).red().bold(),
                };
                format!("{:<width$}", styled)
            }
            CellValue::Number(n) => format!("{:>width$}", n),
            CellValue::Percent(p) => {
                let s = format!("{}%", p);
                let styled = match p {
                    90.. => style(s).green(),
                    70..=89 => style(s).yellow(),
                    _ => style(s).red(),
                };
                format!("{:>width$}", styled)
            }
            CellValue::Empty => format!("{:<width$}", "-"),
            other => format!("{:<width$}", other.plain()),
        }
    }

    /// Format for CSV output (RFC 4180, no colors)
    pub fn format_csv(&self) -> String {
        match self {
            CellValue::Percent(p) => p.to_string(),
            other => escape_csv(&other.plain()),
        }
    }

    /// Format for Markdown output (no colors, escaped pipes)
    pub fn format_md(&self) -> String {
        match self {
            CellValue::Empty => "-".to_string(),
            other => other.plain().replace('|', "\\|"),
        }
    }

    fn display_width(&self) -> usize {
        match self {
            CellValue::Id(id) => id.chars().count().min(16),
            CellValue::Empty => 1,
            other => other.plain().chars().count(),
        }
    }
}

/// Column definition with header label and maximum width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// A row of cell values for table output
pub struct TableRow {
    pub short_id: String,
    pub full_id: String,
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new(full_id: impl Into<String>, short_id: impl Into<String>) -> Self {
        Self {
            short_id: short_id.into(),
            full_id: full_id.into(),
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Table formatter that outputs rows in various formats
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    entity_name: &'static str,
    show_summary: bool,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], entity_name: &'static str) -> Self {
        Self {
            columns,
            entity_name,
            show_summary: true,
        }
    }

    /// Hide the "N found" line
    pub fn without_summary(mut self) -> Self {
        self.show_summary = false;
        self
    }

    /// Render rows; formats with no table shape fall back to TSV
    pub fn render(&self, rows: &[TableRow], format: OutputFormat) -> String {
        match format {
            OutputFormat::Csv => self.render_csv(rows),
            OutputFormat::Md => self.render_md(rows),
            OutputFormat::Id => rows
                .iter()
                .map(|r| format!("{}\n", r.full_id))
                .collect(),
            _ => self.render_tsv(rows),
        }
    }

    pub fn output(&self, rows: &[TableRow], format: OutputFormat) {
        print!("{}", self.render(rows, format));
    }

    fn widths(&self, rows: &[TableRow]) -> Vec<usize> {
        self.columns
            .iter()
            .map(|col| {
                let content = rows
                    .iter()
                    .filter_map(|r| r.get(col.key))
                    .map(CellValue::display_width)
                    .max()
                    .unwrap_or(0);
                col.header.len().max(content + 2).min(col.width)
            })
            .collect()
    }

    fn render_tsv(&self, rows: &[TableRow]) -> String {
        let widths = self.widths(rows);
        let short_width = rows
            .iter()
            .map(|r| r.short_id.len())
            .max()
            .unwrap_or(0)
            .max(5);

        let mut out = String::new();
        let mut header = vec![format!("{:<short_width$}", style("SHORT").bold().dim())];
        header.extend(
            self.columns
                .iter()
                .zip(&widths)
                .map(|(col, w)| format!("{:<w$}", style(col.header).bold(), w = *w)),
        );
        out.push_str(&header.join(" "));
        out.push('\n');

        let total: usize = short_width + widths.iter().sum::<usize>() + widths.len();
        out.push_str(&"-".repeat(total));
        out.push('\n');

        for row in rows {
            let mut parts = vec![format!("{:<short_width$}", style(&row.short_id).cyan())];
            for (col, w) in self.columns.iter().zip(&widths) {
                parts.push(match row.get(col.key) {
                    Some(value) => value.format_tsv(*w),
                    None => format!("{:<w$}", "-", w = *w),
                });
            }
            out.push_str(parts.join(" ").trim_end());
            out.push('\n');
        }

        if self.show_summary {
            out.push('\n');
            out.push_str(&format!(
                "{} {}(s) found. Use {} to reference by short ID.\n",
                style(rows.len()).cyan(),
                self.entity_name,
                style("@N").cyan()
            ));
        }
        out
    }

    fn render_csv(&self, rows: &[TableRow]) -> String {
        let mut out = String::from("short_id,id");
        for col in self.columns {
            out.push(',');
            out.push_str(col.key);
        }
        out.push('\n');

        for row in rows {
            let mut parts = vec![row.short_id.clone(), escape_csv(&row.full_id)];
            parts.extend(self.columns.iter().map(|col| {
                row.get(col.key)
                    .map(CellValue::format_csv)
                    .unwrap_or_default()
            }));
            out.push_str(&parts.join(","));
            out.push('\n');
        }
        out
    }

    fn render_md(&self, rows: &[TableRow]) -> String {
        let mut out = String::from("| Short | ID |");
        for col in self.columns {
            out.push_str(&format!(" {} |", col.header));
        }
        out.push('\n');
        out.push_str(&"|---".repeat(self.columns.len() + 2));
        out.push_str("|\n");

        for row in rows {
            out.push_str(&format!("| {} | {} |", row.short_id, row.full_id));
            for col in self.columns {
                let cell = row.get(col.key).map(CellValue::format_md).unwrap_or_else(|| "-".to_string());
                out.push_str(&format!(" {} |", cell));
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[ColumnDef] = &[
        ColumnDef::new("store", "STORE", 20),
        ColumnDef::new("status", "STATUS", 10),
        ColumnDef::new("rate", "RATE", 6),
    ];

    fn rows() -> Vec<TableRow> {
        vec![TableRow::new("INSP-01ABC", "@1")
            .cell("store", CellValue::Text("Main, Street".to_string()))
            .cell("status", CellValue::Status(InspectionStatus::Completed))
            .cell("rate", CellValue::Percent(33))]
    }

    #[test]
    fn test_csv_rendering() {
        let out = TableFormatter::new(COLUMNS, "walk").render(&rows(), OutputFormat::Csv);
        assert_eq!(
            out,
            "short_id,id,store,status,rate\n@1,INSP-01ABC,\"Main, Street\",completed,33\n"
        );
    }

    #[test]
    fn test_markdown_rendering() {
        let out = TableFormatter::new(COLUMNS, "walk").render(&rows(), OutputFormat::Md);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "| Short | ID | STORE | STATUS | RATE |");
        assert_eq!(lines[1], "|---|---|---|---|---|");
        assert_eq!(lines[2], "| @1 | INSP-01ABC | Main, Street | completed | 33% |");
    }

    #[test]
    fn test_id_rendering() {
        let out = TableFormatter::new(COLUMNS, "walk").render(&rows(), OutputFormat::Id);
        assert_eq!(out, "INSP-01ABC\n");
    }

    #[test]
    fn test_tsv_summary_toggle() {
        let with = TableFormatter::new(COLUMNS, "walk").render(&rows(), OutputFormat::Tsv);
        assert!(with.contains("walk(s) found"));
        let without = TableFormatter::new(COLUMNS, "walk")
            .without_summary()
            .render(&rows(), OutputFormat::Tsv);
        assert!(!without.contains("found"));
        assert!(without.contains("Main, Street"));
    }
}
