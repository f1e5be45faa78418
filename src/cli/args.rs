//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    check::CheckArgs, compatible::CompatibleArgs, completions::CompletionsArgs, cost::CostArgs,
    metrics::MetricsArgs, rules::RulesArgs, validate::ValidateArgs,
};

#[derive(Parser)]
#[command(name = "kbt")]
#[command(author, version, about = "Kart Build Toolkit")]
#[command(
    long_about = "Kart Build Toolkit\n\nChecks go-kart builds for part compatibility and estimates their performance and cost from a catalog of plain YAML files."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Catalog directory holding engines.yaml, parts.yaml, rules.yaml, ...
    #[arg(long, short = 'c', global = true, env = "KBT_CATALOG", default_value = ".")]
    pub catalog: PathBuf,

    /// Ignore the rule cache for this run
    #[arg(long, global = true)]
    pub no_cache: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check a build for compatibility problems
    Check(CheckArgs),

    /// Show horsepower, torque, weight, gearing and tier for a build
    Metrics(MetricsArgs),

    /// Estimate the cost of a build
    Cost(CostArgs),

    /// List compatibility rules
    Rules(RulesArgs),

    /// List parts compatible with an engine
    Compatible(CompatibleArgs),

    /// Validate catalog files and rules
    Validate(ValidateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable tables (or the configured default_format)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// JSON format (for programming)
    Json,
    /// Tab-separated values (for piping)
    Tsv,
    /// Markdown tables
    Md,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <OutputFormat as ValueEnum>::from_str(s, true)
    }
}
