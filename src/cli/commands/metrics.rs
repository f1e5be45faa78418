//! `kbt metrics` command - performance summary for a build

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::{format_money, print_structured, Session};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::metrics::performance::{compute_metrics, BuildMetrics, PerformanceOptions};

#[derive(clap::Args, Debug)]
pub struct MetricsArgs {
    /// Build file (YAML)
    pub build: PathBuf,

    /// Bare kart weight in lb (overrides config)
    #[arg(long)]
    pub base_weight: Option<f64>,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("metric", "METRIC", 24),
    ColumnDef::new("value", "VALUE", 40),
];

pub fn run(args: MetricsArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let build = session.load_build(&args.build)?;

    let options = PerformanceOptions {
        base_kart_weight_lbs: args
            .base_weight
            .unwrap_or_else(|| session.config.base_kart_weight()),
    };
    let metrics = compute_metrics(build.power.as_ref(), &build.parts, &options);

    match session.format(global, OutputFormat::Tsv) {
        format @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&metrics, format)?,
        OutputFormat::Md => {
            TableFormatter::new(COLUMNS, "metric")
                .output(&metric_rows(&metrics), OutputFormat::Md);
        }
        _ => print_summary(&build.name, &metrics),
    }
    Ok(())
}

fn opt(value: Option<f64>, precision: usize, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.prec$}{}", v, unit, prec = precision),
        None => "-".to_string(),
    }
}

fn metric_rows(m: &BuildMetrics) -> Vec<TableRow> {
    let mut pairs = vec![
        (
            "Power",
            m.power_type.map_or("-".to_string(), |p| p.to_string()),
        ),
        ("Horsepower", format!("{:.1}", m.total_hp)),
        ("Torque (lb-ft)", format!("{:.1}", m.total_torque)),
        ("Weight (lb)", format!("{:.2}", m.total_weight_lbs)),
        ("Gear ratio", opt(m.gear_ratio, 2, ":1")),
        ("Est. top speed", opt(m.top_speed_mph, 1, " mph")),
        ("HP per 100 lb", opt(m.power_to_weight, 2, "")),
        ("0-20 mph", opt(m.zero_to_twenty_secs, 1, " s")),
        ("0-30 mph", opt(m.zero_to_thirty_secs, 1, " s")),
        ("Total cost", format_money(Some(m.total_cost))),
    ];
    if let Some(tier) = &m.tier {
        pairs.push(("Tier", tier.tier.to_string()));
        pairs.push(("Recommended ratio", tier.recommended_ratio.clone()));
        pairs.push(("Top speed", tier.top_speed.clone()));
        if let Some(s) = &tier.sprockets {
            pairs.push(("Sprockets", s.clone()));
        }
        if let Some(b) = &tier.battery {
            pairs.push(("Battery", b.clone()));
        }
    }
    pairs
        .into_iter()
        .map(|(k, v)| {
            TableRow::new()
                .cell("metric", CellValue::Text(k.to_string()))
                .cell("value", CellValue::Text(v))
        })
        .collect()
}

fn print_summary(name: &str, m: &BuildMetrics) {
    println!("{}", style(format!("Performance: {}", name)).bold());
    println!("{}", style("─".repeat(60)).dim());
    for row in metric_rows(m) {
        let label = row.get("metric").map(CellValue::raw).unwrap_or_default();
        let value = row.get("value").map(CellValue::raw).unwrap_or_default();
        println!("  {:<20} {}", format!("{}:", label), style(value).cyan());
    }
}
