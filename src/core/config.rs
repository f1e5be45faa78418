//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::compat::condition::DEFAULT_TOLERANCE;
use crate::metrics::cost::CostPlaceholders;
use crate::metrics::performance::DEFAULT_BASE_KART_WEIGHT_LBS;

/// Catalog-local config file name
pub const CATALOG_CONFIG_FILE: &str = "kbt.yaml";

/// Rule cache lifetime when nothing is configured
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// KBT configuration with layered hierarchy
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Numeric tolerance for rules that set none
    pub default_tolerance: Option<f64>,

    /// Bare kart weight added for power-to-weight
    pub base_kart_weight_lbs: Option<f64>,

    /// Rule cache lifetime in seconds; 0 disables the cache
    pub cache_ttl_secs: Option<u64>,

    /// Run the built-in fit rules alongside catalog rules
    pub builtin_rules: Option<bool>,

    /// Full-build placeholder amounts
    pub placeholders: Option<CostPlaceholders>,

    /// Default output format
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(catalog: &Path) -> Self {
        Self::load_from(
            Self::global_config_path().as_deref(),
            Some(catalog.join(CATALOG_CONFIG_FILE).as_path()),
            |key| std::env::var(key).ok(),
        )
    }

    /// Layered load from explicit sources
    pub fn load_from(
        global: Option<&Path>,
        catalog: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        // 1. Built-in defaults (already in Default impl)
        let mut config = Config::default();

        // 2. Global user config (~/.config/kbt/config.yaml)
        // 3. Catalog config (<catalog>/kbt.yaml)
        for path in [global, catalog].into_iter().flatten() {
            if let Some(layer) = Self::read_file(path) {
                config.merge(layer);
            }
        }

        // 4. Environment variables
        if let Some(tol) = parse_env(&env, "KBT_TOLERANCE") {
            config.default_tolerance = Some(tol);
        }
        if let Some(ttl) = parse_env(&env, "KBT_CACHE_TTL_SECS") {
            config.cache_ttl_secs = Some(ttl);
        }
        if let Some(weight) = parse_env(&env, "KBT_BASE_KART_WEIGHT") {
            config.base_kart_weight_lbs = Some(weight);
        }

        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read config file");
                return None;
            }
        };
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config file");
                None
            }
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "kbt")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.default_tolerance.is_some() {
            self.default_tolerance = other.default_tolerance;
        }
        if other.base_kart_weight_lbs.is_some() {
            self.base_kart_weight_lbs = other.base_kart_weight_lbs;
        }
        if other.cache_ttl_secs.is_some() {
            self.cache_ttl_secs = other.cache_ttl_secs;
        }
        if other.builtin_rules.is_some() {
            self.builtin_rules = other.builtin_rules;
        }
        if other.placeholders.is_some() {
            self.placeholders = other.placeholders;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    /// Tolerance for rules without their own; negative values fall back to the default
    pub fn tolerance(&self) -> f64 {
        match self.default_tolerance {
            Some(t) if t.is_finite() && t >= 0.0 => t,
            Some(t) => {
                tracing::warn!(tolerance = t, "ignoring invalid default_tolerance");
                DEFAULT_TOLERANCE
            }
            None => DEFAULT_TOLERANCE,
        }
    }

    pub fn base_kart_weight(&self) -> f64 {
        self.base_kart_weight_lbs
            .filter(|w| w.is_finite() && *w >= 0.0)
            .unwrap_or(DEFAULT_BASE_KART_WEIGHT_LBS)
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        let secs = self.cache_ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS);
        let secs = i64::try_from(secs).unwrap_or(i64::MAX).min(i64::MAX / 1000);
        chrono::Duration::seconds(secs)
    }

    pub fn use_builtin_rules(&self) -> bool {
        self.builtin_rules.unwrap_or(true)
    }

    pub fn placeholders(&self) -> CostPlaceholders {
        self.placeholders.clone().unwrap_or_default()
    }
}

fn parse_env<T: std::str::FromStr>(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = env(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable environment variable");
            None
        }
    }
}
