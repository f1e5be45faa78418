//! `kbt cost` command - cost estimate and budget check for a build

use console::style;
use miette::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::helpers::{format_money, print_structured, Session};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::metrics::cost::{estimate_cost_with, BudgetState, BudgetStatus, CostEstimate, CostMode};

#[derive(clap::Args, Debug)]
pub struct CostArgs {
    /// Build file (YAML)
    pub build: PathBuf,

    /// Add placeholder amounts for categories not yet picked
    #[arg(long)]
    pub full: bool,

    /// Budget in dollars to compare against
    #[arg(long, short = 'b')]
    pub budget: Option<f64>,

    /// Exit with an error when the total is over budget
    #[arg(long, requires = "budget")]
    pub strict: bool,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("group", "GROUP", 20),
    ColumnDef::new("amount", "AMOUNT", 12),
    ColumnDef::new("percent", "SHARE", 8),
];

#[derive(Debug, Serialize)]
struct CostReport<'a> {
    build: &'a str,
    #[serde(flatten)]
    estimate: &'a CostEstimate,
    #[serde(skip_serializing_if = "Option::is_none")]
    budget: Option<BudgetStatus>,
}

pub fn run(args: CostArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let build = session.load_build(&args.build)?;

    let mode = if args.full {
        CostMode::FullBuild
    } else {
        CostMode::Selected
    };
    let estimate = estimate_cost_with(
        build.power.as_ref(),
        &build.parts,
        mode,
        &session.config.placeholders(),
    );
    let budget = match args.budget {
        Some(b) => {
            let status = estimate.budget(b);
            if status.is_none() {
                tracing::warn!(budget = b, "budget must be positive; ignoring");
            }
            status
        }
        None => None,
    };

    let report = CostReport {
        build: &build.name,
        estimate: &estimate,
        budget,
    };

    match session.format(global, OutputFormat::Tsv) {
        format @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&report, format)?,
        format => print_report(&report, format, global.quiet),
    }

    if args.strict {
        if let Some(status) = &report.budget {
            if status.state == BudgetState::Over {
                return Err(miette::miette!(
                    "{} is {} over budget",
                    build.name,
                    format_money(Some(status.overage))
                ));
            }
        }
    }
    Ok(())
}

fn print_report(report: &CostReport<'_>, format: OutputFormat, quiet: bool) {
    let estimate = report.estimate;
    let rows: Vec<TableRow> = estimate
        .breakdown
        .iter()
        .map(|share| {
            TableRow::new()
                .cell("group", CellValue::Text(share.label.clone()))
                .cell("amount", CellValue::Money(Some(share.amount)))
                .cell("percent", CellValue::Percent(share.percent))
        })
        .collect();
    if !rows.is_empty() {
        TableFormatter::new(COLUMNS, "group")
            .with_summary(false)
            .output(&rows, format);
        println!();
    }

    for line in &estimate.placeholders {
        println!(
            "  {} {:<18} {}",
            style("+").dim(),
            line.label,
            style(format_money(Some(line.amount))).dim()
        );
    }

    println!(
        "{} {}",
        style("Total:").bold(),
        style(format_money(Some(estimate.total))).cyan().bold()
    );

    if let Some(status) = &report.budget {
        let state = match status.state {
            BudgetState::Under => style("under budget".to_string()).green(),
            BudgetState::Approaching => style("approaching budget".to_string()).yellow(),
            BudgetState::Over => style(format!(
                "over budget by {}",
                format_money(Some(status.overage))
            ))
            .red()
            .bold(),
        };
        println!(
            "{} {} of {} ({})",
            style("Budget:").bold(),
            format!("{:.1}%", status.percent_used),
            format_money(Some(status.budget)),
            state
        );
    }

    if quiet {
        return;
    }
    if estimate.unpriced > 0 {
        println!(
            "{} {} item(s) have no price and count as $0",
            style("!").yellow(),
            estimate.unpriced
        );
    }
    println!(
        "{}",
        style("Estimates are approximate; check current prices before buying.").dim()
    );
}
