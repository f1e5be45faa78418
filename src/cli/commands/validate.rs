//! `kbt validate` command - Validate catalog files, rules and build files

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::GlobalOpts;
use crate::compat::evaluator::Evaluator;
use crate::core::loader::{load_build_file, Catalog};

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Build files to check against the catalog
    #[arg()]
    pub builds: Vec<PathBuf>,

    /// Strict mode - warnings become errors
    #[arg(long)]
    pub strict: bool,

    /// Show summary only, don't show individual problems
    #[arg(long)]
    pub summary: bool,
}

/// Validation statistics
#[derive(Default)]
struct ValidationStats {
    rows_checked: usize,
    rules_checked: usize,
    builds_checked: usize,
    total_errors: usize,
    total_warnings: usize,
}

pub fn run(args: ValidateArgs, global: &GlobalOpts) -> Result<()> {
    // Always parse from source so cached rules cannot hide a bad row
    let catalog = Catalog::load(&global.catalog)?;
    let mut stats = ValidationStats {
        rows_checked: catalog.engines.len()
            + catalog.motors.len()
            + catalog.parts.len()
            + catalog.mappings.len()
            + catalog.rejected().len(),
        rules_checked: catalog.rules.len(),
        ..Default::default()
    };
    let show = !args.summary && !global.quiet;

    if show {
        println!(
            "{} Validating catalog {}...\n",
            style("→").blue(),
            catalog.root.display()
        );
    }

    for row in catalog.rejected() {
        stats.total_errors += 1;
        if show {
            println!(
                "{} {} row {}{} - {}",
                style("✗").red(),
                row.file.display(),
                row.index,
                row.id
                    .as_deref()
                    .map(|id| format!(" ({})", id))
                    .unwrap_or_default(),
                row.reason
            );
            if let Some(hint) = &row.hint {
                println!("    {} {}", style("help:").cyan(), hint);
            }
        }
    }

    let evaluator = Evaluator::new(&catalog.rules, &catalog.mappings);
    for error in evaluator.skipped() {
        stats.total_errors += 1;
        if show {
            println!("{} rule {} - {}", style("✗").red(), error.rule_id(), error);
        }
    }

    for mapping in &catalog.mappings {
        let mut problems = Vec::new();
        if catalog.engine(&mapping.engine_id).is_none() {
            problems.push(format!("unknown engine {}", mapping.engine_id));
        }
        if catalog.part(&mapping.part_id).is_none() {
            problems.push(format!("unknown part {}", mapping.part_id));
        }
        for problem in problems {
            stats.total_warnings += 1;
            if show {
                println!(
                    "{} mapping {} -> {} - {}",
                    style("!").yellow(),
                    mapping.engine_id,
                    mapping.part_id,
                    problem
                );
            }
        }
    }

    for path in &args.builds {
        stats.builds_checked += 1;
        let file = match load_build_file(path) {
            Ok(f) => f,
            Err(e) => {
                stats.total_errors += 1;
                if show {
                    println!("{} {} - {}", style("✗").red(), path.display(), e);
                }
                continue;
            }
        };

        let mut issues = Vec::new();
        if let Some(id) = &file.engine {
            if catalog.engine(id).is_none() {
                issues.push(format!("unknown engine {}", id));
            }
        }
        if let Some(id) = &file.motor {
            if catalog.motor(id).is_none() {
                issues.push(format!("unknown motor {}", id));
            }
        }
        if file.engine.is_some() && file.motor.is_some() {
            issues.push("names both an engine and a motor; the engine is used".to_string());
        }
        for (key, ids) in &file.parts {
            for id in ids.ids() {
                if catalog.part(id).is_none() {
                    issues.push(format!("unknown part {} under {}", id, key));
                }
            }
        }

        if issues.is_empty() {
            if show {
                println!("{} {}", style("✓").green(), path.display());
            }
        } else {
            stats.total_warnings += issues.len();
            if show {
                println!("{} {}", style("!").yellow(), path.display());
                for issue in &issues {
                    println!("    {}", style(issue).yellow());
                }
            }
        }
    }

    // Print summary
    if !global.quiet {
        println!();
        println!("{}", style("─".repeat(60)).dim());
        println!("{}", style("Validation Summary").bold());
        println!("{}", style("─".repeat(60)).dim());
        println!("  Rows checked:   {}", style(stats.rows_checked).cyan());
        println!("  Rules checked:  {}", style(stats.rules_checked).cyan());
        if stats.builds_checked > 0 {
            println!("  Builds checked: {}", style(stats.builds_checked).cyan());
        }
        println!("  Total errors:   {}", style(stats.total_errors).red());
        if stats.total_warnings > 0 {
            println!("  Total warnings: {}", style(stats.total_warnings).yellow());
        }
        println!();
    }

    let failures = stats.total_errors + if args.strict { stats.total_warnings } else { 0 };
    if failures > 0 {
        Err(miette::miette!(
            "Validation failed: {} problem{} found",
            failures,
            if failures == 1 { "" } else { "s" }
        ))
    } else {
        if !global.quiet {
            println!("{} Catalog passed validation!", style("✓").green().bold());
        }
        Ok(())
    }
}
