//! `kbt rules` command - list compatibility rules

use miette::Result;

use crate::cli::helpers::{print_structured, Session};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::compat::builtin::is_builtin;
use crate::entities::part::PartCategory;
use crate::entities::rule::{Rule, RuleSource, Severity};

#[derive(clap::Args, Debug)]
pub struct RulesArgs {
    /// Only rules reading from this source (engine, motor or a part category)
    #[arg(long)]
    pub source: Option<RuleSource>,

    /// Only rules checking this part category
    #[arg(long)]
    pub target: Option<PartCategory>,

    /// Only rules of this type
    #[arg(long = "type")]
    pub rule_type: Option<String>,

    /// Only rules with this severity
    #[arg(long)]
    pub severity: Option<Severity>,

    /// Include inactive rules
    #[arg(long)]
    pub all: bool,

    /// Leave out the built-in rules
    #[arg(long)]
    pub no_builtin: bool,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 36),
    ColumnDef::new("source", "SOURCE", 18),
    ColumnDef::new("target", "TARGET", 18),
    ColumnDef::new("type", "TYPE", 16),
    ColumnDef::new("severity", "SEVERITY", 10),
    ColumnDef::new("active", "ACTIVE", 8),
    ColumnDef::new("message", "MESSAGE", 60),
];

pub fn run(args: RulesArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let rules: Vec<Rule> = session
        .rules()
        .into_iter()
        .filter(|r| matches_filters(r, &args))
        .collect();

    match session.format(global, OutputFormat::Tsv) {
        format @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&rules, format)?,
        format => {
            let rows: Vec<TableRow> = rules.iter().map(rule_row).collect();
            TableFormatter::new(COLUMNS, "rule")
                .with_summary(!global.quiet)
                .output(&rows, format);
        }
    }
    Ok(())
}

fn matches_filters(rule: &Rule, args: &RulesArgs) -> bool {
    (args.all || rule.is_active)
        && !(args.no_builtin && is_builtin(rule))
        && args.source.map_or(true, |s| rule.source_category == s)
        && args.target.map_or(true, |t| rule.target_category == t)
        && args
            .rule_type
            .as_deref()
            .map_or(true, |t| rule.rule_type.eq_ignore_ascii_case(t))
        && args.severity.map_or(true, |s| rule.severity == s)
}

fn rule_row(rule: &Rule) -> TableRow {
    TableRow::new()
        .cell("id", CellValue::Id(rule.id.clone()))
        .cell("source", CellValue::Text(rule.source_category.to_string()))
        .cell("target", CellValue::Category(rule.target_category))
        .cell("type", CellValue::Text(rule.rule_type.clone()))
        .cell("severity", CellValue::Severity(rule.severity))
        .cell("active", CellValue::Flag(rule.is_active))
        .cell("message", CellValue::Text(rule.warning_message.clone()))
}
