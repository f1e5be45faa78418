//! `kbt compatible` command - parts that fit an engine

use miette::Result;
use serde::Serialize;

use crate::cli::helpers::{print_structured, Session};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::compat::evaluator::Evaluator;
use crate::compat::mapping::resolve_direct;
use crate::entities::part::{Part, PartCategory};
use crate::entities::rule::CompatibilityLevel;

#[derive(clap::Args, Debug)]
pub struct CompatibleArgs {
    /// Engine id
    #[arg(long, short = 'e')]
    pub engine: String,

    /// Only parts in this category
    #[arg(long)]
    pub category: Option<PartCategory>,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 28),
    ColumnDef::new("category", "CATEGORY", 18),
    ColumnDef::new("price", "PRICE", 10),
    ColumnDef::new("fit", "FIT", 22),
    ColumnDef::new("name", "NAME", 50),
];

#[derive(Debug, Serialize)]
struct CompatiblePart<'a> {
    #[serde(flatten)]
    part: &'a Part,
    #[serde(skip_serializing_if = "Option::is_none")]
    compatibility_level: Option<CompatibilityLevel>,
}

pub fn run(args: CompatibleArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let engine = session.catalog.engine(&args.engine).ok_or_else(|| {
        miette::miette!(
            help = "list engine ids in engines.yaml",
            "unknown engine: {}",
            args.engine
        )
    })?;

    let candidates = session.catalog.active_parts(args.category);
    let rules = session.rules();
    let evaluator = Evaluator::new(&rules, &session.catalog.mappings)
        .with_options(session.evaluator_options(false));
    let parts = evaluator.compatible_parts(engine, &candidates);

    let direct = resolve_direct(
        &engine.id,
        parts.iter().map(|p| p.id.as_str()),
        &session.catalog.mappings,
    );
    let listed: Vec<CompatiblePart<'_>> = parts
        .iter()
        .map(|&part| CompatiblePart {
            part,
            compatibility_level: direct.get(&part.id).map(|fit| fit.level),
        })
        .collect();

    match session.format(global, OutputFormat::Tsv) {
        format @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&listed, format)?,
        format => {
            let rows: Vec<TableRow> = listed
                .iter()
                .map(|c| {
                    TableRow::new()
                        .cell("id", CellValue::Id(c.part.id.clone()))
                        .cell("category", CellValue::Category(c.part.category))
                        .cell("price", CellValue::Money(c.part.price))
                        .cell(
                            "fit",
                            c.compatibility_level
                                .map_or(CellValue::Empty, |l| CellValue::Text(l.to_string())),
                        )
                        .cell("name", CellValue::Text(c.part.name.clone()))
                })
                .collect();
            TableFormatter::new(COLUMNS, "compatible part")
                .with_summary(!global.quiet)
                .output(&rows, format);
        }
    }
    Ok(())
}
