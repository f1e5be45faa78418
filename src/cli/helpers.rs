//! Shared helper functions for CLI commands

use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::compat::builtin::builtin_rules;
use crate::compat::condition::MatchOptions;
use crate::compat::evaluator::EvaluatorOptions;
use crate::core::cache::RuleCache;
use crate::core::config::Config;
use crate::core::loader::{load_build_file, Catalog};
use crate::entities::build::Build;
use crate::entities::rule::Rule;

/// Config and catalog for one command invocation
pub struct Session {
    pub config: Config,
    pub catalog: Catalog,
}

impl Session {
    /// Load config and catalog, using the rule cache unless disabled
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let config = Config::load(&global.catalog);
        let catalog = if global.no_cache || config.cache_ttl() <= chrono::Duration::zero() {
            Catalog::load(&global.catalog)?
        } else {
            let mut cache = RuleCache::open(&global.catalog, config.cache_ttl());
            Catalog::load_with(&global.catalog, Some(&mut cache))?
        };
        Ok(Self { config, catalog })
    }

    /// Built-in rules (when enabled) followed by catalog rules
    pub fn rules(&self) -> Vec<Rule> {
        let mut rules = if self.config.use_builtin_rules() {
            builtin_rules()
        } else {
            Vec::new()
        };
        rules.extend(self.catalog.rules.iter().cloned());
        rules
    }

    pub fn evaluator_options(&self, advisories: bool) -> EvaluatorOptions {
        EvaluatorOptions {
            matching: MatchOptions {
                default_tolerance: self.config.tolerance(),
            },
            advisories,
        }
    }

    /// Read a build file and resolve it against the catalog
    pub fn load_build(&self, path: &Path) -> Result<Build> {
        let file = load_build_file(path)?;
        let mut build = self.catalog.resolve_build(&file);
        if build.name.is_empty() {
            build.name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        Ok(build)
    }

    /// Resolve `auto` against the configured default, then `fallback`
    pub fn format(&self, global: &GlobalOpts, fallback: OutputFormat) -> OutputFormat {
        resolve_format(global.format, self.config.default_format.as_deref(), fallback)
    }
}

pub fn resolve_format(
    requested: OutputFormat,
    configured: Option<&str>,
    fallback: OutputFormat,
) -> OutputFormat {
    if requested != OutputFormat::Auto {
        return requested;
    }
    match configured.map(str::parse::<OutputFormat>) {
        Some(Ok(format)) if format != OutputFormat::Auto => format,
        Some(Err(e)) => {
            tracing::warn!(error = %e, "ignoring unknown default_format");
            fallback
        }
        _ => fallback,
    }
}

/// Print a value as YAML or JSON
pub fn print_structured<T: serde::Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value).into_diagnostic()?;
            println!("{}", json);
        }
        _ => {
            let yaml = serde_yml::to_string(value).into_diagnostic()?;
            print!("{}", yaml);
        }
    }
    Ok(())
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Make a string safe for a TSV cell
pub fn escape_tsv(s: &str) -> String {
    s.replace(['\t', '\n', '\r'], " ")
}

/// "$12.50", or "-" for an unknown price
pub fn format_money(amount: Option<f64>) -> String {
    match amount {
        Some(a) => format!("${:.2}", a),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("3/4\" bore ø", 6), "3/4...");
    }

    #[test]
    fn test_escape_tsv() {
        assert_eq!(escape_tsv("simple"), "simple");
        assert_eq!(escape_tsv("a\tb\nc"), "a b c");
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(Some(54.9)), "$54.90");
        assert_eq!(format_money(None), "-");
    }

    #[test]
    fn test_resolve_format() {
        assert_eq!(
            resolve_format(OutputFormat::Json, Some("yaml"), OutputFormat::Tsv),
            OutputFormat::Json
        );
        assert_eq!(
            resolve_format(OutputFormat::Auto, Some("md"), OutputFormat::Tsv),
            OutputFormat::Md
        );
        assert_eq!(
            resolve_format(OutputFormat::Auto, Some("xml"), OutputFormat::Tsv),
            OutputFormat::Tsv
        );
        assert_eq!(
            resolve_format(OutputFormat::Auto, None, OutputFormat::Yaml),
            OutputFormat::Yaml
        );
    }
}
