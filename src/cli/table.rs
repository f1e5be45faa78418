//! Table formatting for CLI list output
//!
//! Rows are built from typed [`CellValue`]s so each output format can render
//! them its own way: padded and colored columns for `tsv`, tabled markdown
//! for `md`. The last visible column is never truncated, which keeps long
//! rule messages readable.

use console::style;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{escape_tsv, format_money, truncate_str};
use crate::cli::OutputFormat;
use crate::entities::part::PartCategory;
use crate::entities::rule::Severity;

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Record id, cyan
    Id(String),
    /// Plain text, truncated to the column width
    Text(String),
    /// Rule severity with color coding
    Severity(Severity),
    Category(PartCategory),
    /// Price in dollars, "-" when unknown
    Money(Option<f64>),
    /// Number with fixed precision, "-" when unknown
    Float(Option<f64>, usize),
    /// Share of a total
    Percent(f64),
    /// yes/no flag
    Flag(bool),
    Empty,
}

impl CellValue {
    /// Plain text for this cell (no colors)
    pub fn raw(&self) -> String {
        match self {
            CellValue::Id(s) | CellValue::Text(s) => s.clone(),
            CellValue::Severity(s) => s.to_string(),
            CellValue::Category(c) => c.to_string(),
            CellValue::Money(m) => format_money(*m),
            CellValue::Float(Some(f), precision) => format!("{:.prec$}", f, prec = precision),
            CellValue::Float(None, _) => "-".to_string(),
            CellValue::Percent(p) => format!("{:.1}%", p),
            CellValue::Flag(true) => "yes".to_string(),
            CellValue::Flag(false) => "no".to_string(),
            CellValue::Empty => "-".to_string(),
        }
    }

    /// Format for TSV output (with colors if terminal)
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Id(id) => format!("{:<width$}", style(id).cyan(), width = width),
            CellValue::Text(s) => {
                let truncated = truncate_str(&escape_tsv(s), width.saturating_sub(2).max(4));
                format!("{:<width$}", truncated, width = width)
            }
            CellValue::Severity(severity) => {
                let s = severity.to_string();
                let styled = match severity {
                    Severity::Error => style(s).red().bold(),
                    Severity::Warning => style(s).yellow(),
                    Severity::Info => style(s).cyan(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Flag(active) => {
                let styled = if *active {
                    style("yes").green()
                } else {
                    style("no").dim()
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Money(_) | CellValue::Float(..) | CellValue::Percent(_) => {
                format!("{:>width$}", self.raw(), width = width)
            }
            CellValue::Category(_) => format!("{:<width$}", self.raw(), width = width),
            CellValue::Empty => format!("{:<width$}", style("-").dim(), width = width),
        }
    }

    /// Format for Markdown output (no colors, escaped pipes)
    pub fn format_md(&self) -> String {
        let raw = match self {
            CellValue::Severity(Severity::Error) => "**error**".to_string(),
            _ => self.raw(),
        };
        raw.replace('|', "\\|")
    }

    /// Width of the unstyled content
    pub fn display_width(&self) -> usize {
        self.raw().chars().count()
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
#[derive(Debug, Default)]
pub struct TableRow {
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new() -> Self {
        Self::default()
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
    noun: &'static str,
    show_summary: bool,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], noun: &'static str) -> Self {
        Self {
            columns,
            noun,
            show_summary: true,
        }
    }

    /// Print or skip the "N thing(s)" line after a TSV table
    pub fn with_summary(mut self, show: bool) -> Self {
        self.show_summary = show;
        self
    }

    /// Render rows in the specified format
    pub fn render(&self, rows: &[TableRow], format: OutputFormat) -> String {
        match format {
            OutputFormat::Md => self.render_md(rows),
            _ => self.render_tsv(rows),
        }
    }

    pub fn output(&self, rows: &[TableRow], format: OutputFormat) {
        print!("{}", self.render(rows, format));
    }

    /// Column widths from content, capped at each column's width
    fn calculate_widths(&self, rows: &[TableRow]) -> Vec<usize> {
        self.columns
            .iter()
            .map(|col| {
                let max_content = rows
                    .iter()
                    .filter_map(|r| r.get(col.key))
                    .map(|v| v.display_width())
                    .max()
                    .unwrap_or(0);
                col.header
                    .len()
                    .max(max_content.saturating_add(2))
                    .min(col.width)
            })
            .collect()
    }

    fn render_tsv(&self, rows: &[TableRow]) -> String {
        let widths = self.calculate_widths(rows);
        let last = self.columns.len().saturating_sub(1);
        let mut out = String::new();

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| format!("{:<width$}", style(col.header).bold(), width = w))
            .collect();
        out.push_str(header.join(" ").trim_end());
        out.push('\n');

        let total_width: usize = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);
        out.push_str(&"-".repeat(total_width));
        out.push('\n');

        for row in rows {
            let parts: Vec<String> = self
                .columns
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(i, (col, w))| match row.get(col.key) {
                    Some(CellValue::Text(s)) if i == last => escape_tsv(s),
                    Some(value) => value.format_tsv(*w),
                    None => format!("{:<width$}", "-", width = w),
                })
                .collect();
            out.push_str(parts.join(" ").trim_end());
            out.push('\n');
        }

        if self.show_summary {
            out.push('\n');
            out.push_str(&format!("{} {}(s)\n", style(rows.len()).cyan(), self.noun));
        }
        out
    }

    fn render_md(&self, rows: &[TableRow]) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.columns.iter().map(|c| c.header.to_string()));
        for row in rows {
            builder.push_record(self.columns.iter().map(|col| {
                row.get(col.key)
                    .map(CellValue::format_md)
                    .unwrap_or_else(|| "-".to_string())
            }));
        }
        let mut table = builder.build();
        table.with(Style::markdown());
        format!("{}\n", table)
    }
}
