//! `kbt check` command - compatibility check for a build

use console::style;
use miette::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::helpers::{print_structured, Session};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::compat::evaluator::{
    has_incompatibilities, sort_by_severity, CompatibilityWarning, Evaluator,
};
use crate::entities::rule::Severity;

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Build file (YAML)
    pub build: PathBuf,

    /// Exit with an error when the build has incompatibilities
    #[arg(long)]
    pub strict: bool,

    /// List errors first, then warnings, then info
    #[arg(long)]
    pub sort: bool,

    /// Skip the drive-system advisories
    #[arg(long)]
    pub no_advisories: bool,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("severity", "SEVERITY", 10),
    ColumnDef::new("source", "SOURCE", 28),
    ColumnDef::new("target", "TARGET", 28),
    ColumnDef::new("message", "MESSAGE", 80),
];

#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    build: &'a str,
    compatible: bool,
    errors: usize,
    warnings: usize,
    info: usize,
    issues: &'a [CompatibilityWarning],
}

pub fn run(args: CheckArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let build = session.load_build(&args.build)?;
    let rules = session.rules();

    let evaluator = Evaluator::new(&rules, &session.catalog.mappings)
        .with_options(session.evaluator_options(!args.no_advisories));
    let mut issues = evaluator.evaluate(build.power.as_ref(), &build.parts);
    if args.sort {
        sort_by_severity(&mut issues);
    }

    let count = |s: Severity| issues.iter().filter(|w| w.severity == s).count();
    let report = CheckReport {
        build: &build.name,
        compatible: !has_incompatibilities(&issues),
        errors: count(Severity::Error),
        warnings: count(Severity::Warning),
        info: count(Severity::Info),
        issues: &issues,
    };

    match session.format(global, OutputFormat::Tsv) {
        format @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&report, format)?,
        format => print_table(&report, format, global.quiet),
    }

    if args.strict && !report.compatible {
        return Err(miette::miette!(
            "{} has {} incompatibilit{}",
            build.name,
            report.errors,
            if report.errors == 1 { "y" } else { "ies" }
        ));
    }
    Ok(())
}

fn print_table(report: &CheckReport<'_>, format: OutputFormat, quiet: bool) {
    if report.issues.is_empty() {
        if !quiet {
            println!(
                "{} {} has no compatibility issues",
                style("✓").green(),
                report.build
            );
        }
        return;
    }

    let rows: Vec<TableRow> = report
        .issues
        .iter()
        .map(|w| {
            TableRow::new()
                .cell("severity", CellValue::Severity(w.severity))
                .cell("source", CellValue::Text(w.source.clone()))
                .cell("target", CellValue::Text(w.target.clone()))
                .cell("message", CellValue::Text(w.message.clone()))
        })
        .collect();
    TableFormatter::new(COLUMNS, "issue")
        .with_summary(false)
        .output(&rows, format);

    if quiet {
        return;
    }
    println!();
    let verdict = if report.compatible {
        style("compatible").green().bold()
    } else {
        style("incompatible").red().bold()
    };
    println!(
        "{}: {} ({} error(s), {} warning(s), {} info)",
        report.build, verdict, report.errors, report.warnings, report.info
    );
}
