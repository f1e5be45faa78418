//! Catalog loading
//!
//! A catalog is a directory of YAML files, each holding a list of records:
//!
//! ```text
//! engines.yaml   motors.yaml   parts.yaml   rules.yaml   mappings.yaml
//! parts/**/*.yaml   (optional, more part lists)
//! ```
//!
//! Every row is re-validated on load. A row that does not deserialize, or
//! repeats an id, is skipped with a warning and recorded in
//! [`Catalog::rejected`]; the rest of the file still loads.

use miette::Diagnostic;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::core::cache::{fingerprint, RuleCache};
use crate::core::entity::CatalogRecord;
use crate::entities::build::{Build, BuildFile, PowerSource};
use crate::entities::engine::Engine;
use crate::entities::motor::Motor;
use crate::entities::part::{Part, PartCategory};
use crate::entities::rule::{DirectMapping, Rule};
use crate::yaml::diagnostics::catalog_hint;
use crate::yaml::{parse_yaml_file, parse_yaml_str, YamlError};

pub const ENGINES_FILE: &str = "engines.yaml";
pub const MOTORS_FILE: &str = "motors.yaml";
pub const PARTS_FILE: &str = "parts.yaml";
pub const PARTS_DIR: &str = "parts";
pub const RULES_FILE: &str = "rules.yaml";
pub const MAPPINGS_FILE: &str = "mappings.yaml";

#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("catalog directory not found: {}", .0.display())]
    #[diagnostic(
        code(kbt::catalog::not_found),
        help("pass --catalog <DIR> or set KBT_CATALOG")
    )]
    NotFound(PathBuf),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Yaml(#[from] YamlError),

    #[error("{}: expected a list of {kind}", .path.display())]
    #[diagnostic(
        code(kbt::catalog::shape),
        help("catalog files hold a YAML sequence, e.g. `- id: ...`")
    )]
    NotAList { path: PathBuf, kind: &'static str },

    #[error("cannot scan {}: {source}", .path.display())]
    #[diagnostic(code(kbt::catalog::walk))]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// A catalog row that was skipped
#[derive(Debug, Clone, Serialize)]
pub struct RejectedRow {
    pub file: PathBuf,
    /// Zero-based position in the file's list
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// All catalog records, validated
#[derive(Debug, Default)]
pub struct Catalog {
    pub root: PathBuf,
    pub engines: Vec<Engine>,
    pub motors: Vec<Motor>,
    pub parts: Vec<Part>,
    pub rules: Vec<Rule>,
    pub mappings: Vec<DirectMapping>,
    /// SHA-256 over the rule and mapping files
    pub fingerprint: String,
    /// True when rules and mappings came from the rule cache
    pub from_cache: bool,
    rejected: Vec<RejectedRow>,
}

impl Catalog {
    /// Load a catalog without the rule cache
    pub fn load(root: &Path) -> Result<Self, CatalogError> {
        Self::load_with(root, None)
    }

    /// Load a catalog, serving rules and mappings from `cache` when fresh
    pub fn load_with(root: &Path, cache: Option<&mut RuleCache>) -> Result<Self, CatalogError> {
        if !root.is_dir() {
            return Err(CatalogError::NotFound(root.to_path_buf()));
        }

        let mut catalog = Catalog {
            root: root.to_path_buf(),
            ..Default::default()
        };

        catalog.engines = catalog.load_records(&root.join(ENGINES_FILE))?;
        catalog.motors = catalog.load_records(&root.join(MOTORS_FILE))?;

        let mut parts: Vec<Part> = catalog.load_rows(&root.join(PARTS_FILE), Part::KIND)?;
        for path in part_files(&root.join(PARTS_DIR))? {
            parts.extend(catalog.load_rows::<Part>(&path, Part::KIND)?);
        }
        catalog.parts = catalog.dedupe(parts, &root.join(PARTS_FILE));

        let rules_path = root.join(RULES_FILE);
        let mappings_path = root.join(MAPPINGS_FILE);
        let rules_src = read_optional(&rules_path)?;
        let mappings_src = read_optional(&mappings_path)?;
        catalog.fingerprint = fingerprint([
            rules_src.as_deref().unwrap_or("").as_bytes(),
            mappings_src.as_deref().unwrap_or("").as_bytes(),
        ]);

        let now = chrono::Utc::now();
        let cached = cache
            .as_deref()
            .and_then(|c| c.get(&catalog.fingerprint, now))
            .map(|hit| (hit.rules.to_vec(), hit.mappings.to_vec()));
        if let Some((rules, mappings)) = cached {
            catalog.rules = rules;
            catalog.mappings = mappings;
            catalog.from_cache = true;
        } else {
            let rules: Vec<Rule> = match &rules_src {
                Some(src) => catalog.parse_rows(src, &rules_path, Rule::KIND)?,
                None => Vec::new(),
            };
            catalog.rules = catalog.dedupe(rules, &rules_path);
            catalog.mappings = match &mappings_src {
                Some(src) => catalog.parse_rows(src, &mappings_path, "mappings")?,
                None => Vec::new(),
            };

            if let Some(cache) = cache {
                cache.put(
                    catalog.fingerprint.clone(),
                    catalog.rules.clone(),
                    catalog.mappings.clone(),
                    now,
                );
                if let Err(e) = cache.save() {
                    tracing::warn!(error = %e, "could not write rule cache");
                }
            }
        }

        tracing::debug!(
            engines = catalog.engines.len(),
            motors = catalog.motors.len(),
            parts = catalog.parts.len(),
            rules = catalog.rules.len(),
            mappings = catalog.mappings.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// Rows skipped while loading
    pub fn rejected(&self) -> &[RejectedRow] {
        &self.rejected
    }

    pub fn engine(&self, id: &str) -> Option<&Engine> {
        self.engines.iter().find(|e| e.id == id)
    }

    pub fn motor(&self, id: &str) -> Option<&Motor> {
        self.motors.iter().find(|m| m.id == id)
    }

    pub fn part(&self, id: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.id == id)
    }

    /// Active parts, optionally limited to one category
    pub fn active_parts(&self, category: Option<PartCategory>) -> Vec<Part> {
        self.parts
            .iter()
            .filter(|p| CatalogRecord::is_active(*p))
            .filter(|p| category.map_or(true, |c| p.category == c))
            .cloned()
            .collect()
    }

    /// Resolve a build file's ids to records.
    ///
    /// Unknown ids are skipped with a warning. When both an engine and a
    /// motor are named the engine is used.
    pub fn resolve_build(&self, file: &BuildFile) -> Build {
        let mut build = Build::new(file.name.clone());

        if file.engine.is_some() && file.motor.is_some() {
            tracing::warn!(build = %file.name, "build names both an engine and a motor; using the engine");
        }
        build.power = match (&file.engine, &file.motor) {
            (Some(id), _) => self.engine(id).cloned().map(PowerSource::Engine).or_else(|| {
                tracing::warn!(engine_id = %id, "unknown engine id; skipping");
                None
            }),
            (None, Some(id)) => self.motor(id).cloned().map(PowerSource::Motor).or_else(|| {
                tracing::warn!(motor_id = %id, "unknown motor id; skipping");
                None
            }),
            (None, None) => None,
        };

        for (key, ids) in &file.parts {
            let declared = key.parse::<PartCategory>().ok();
            if declared.is_none() {
                tracing::warn!(category = %key, "unknown category key in build file");
            }
            for id in ids.ids() {
                let Some(part) = self.part(id) else {
                    tracing::warn!(part_id = %id, category = %key, "unknown part id; skipping");
                    continue;
                };
                if declared.map_or(false, |c| c != part.category) {
                    tracing::warn!(
                        part_id = %id,
                        listed_under = %key,
                        category = %part.category,
                        "part listed under a different category"
                    );
                }
                build.parts.push(part.clone());
            }
        }

        build
    }

    fn load_records<T: CatalogRecord>(&mut self, path: &Path) -> Result<Vec<T>, CatalogError> {
        let rows = self.load_rows(path, T::KIND)?;
        Ok(self.dedupe(rows, path))
    }

    fn load_rows<T: DeserializeOwned>(
        &mut self,
        path: &Path,
        kind: &'static str,
    ) -> Result<Vec<T>, CatalogError> {
        match read_optional(path)? {
            Some(src) => self.parse_rows(&src, path, kind),
            None => Ok(Vec::new()),
        }
    }

    fn parse_rows<T: DeserializeOwned>(
        &mut self,
        src: &str,
        path: &Path,
        kind: &'static str,
    ) -> Result<Vec<T>, CatalogError> {
        let value: serde_yml::Value = parse_yaml_str(src, &path.display().to_string())?;
        let rows = match value {
            serde_yml::Value::Null => return Ok(Vec::new()),
            serde_yml::Value::Sequence(rows) => rows,
            // `engines: [...]` style files
            serde_yml::Value::Mapping(mut map) => match map.remove(kind) {
                Some(serde_yml::Value::Sequence(rows)) => rows,
                _ => {
                    return Err(CatalogError::NotAList {
                        path: path.to_path_buf(),
                        kind,
                    })
                }
            },
            _ => {
                return Err(CatalogError::NotAList {
                    path: path.to_path_buf(),
                    kind,
                })
            }
        };

        let mut records = Vec::with_capacity(rows.len());
        for (index, row) in rows.into_iter().enumerate() {
            let id = row.get("id").and_then(|v| v.as_str()).map(str::to_string);
            match serde_yml::from_value::<T>(row) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(
                        file = %path.display(),
                        index,
                        id = id.as_deref().unwrap_or("-"),
                        error = %e,
                        "skipping invalid {} row",
                        kind
                    );
                    self.rejected.push(RejectedRow {
                        file: path.to_path_buf(),
                        index,
                        id,
                        reason: e.to_string(),
                        hint: catalog_hint(&e.to_string()),
                    });
                }
            }
        }
        Ok(records)
    }

    /// Keep the first record for each id
    fn dedupe<T: CatalogRecord>(&mut self, records: Vec<T>, path: &Path) -> Vec<T> {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            if seen.insert(record.id().to_string()) {
                kept.push(record);
            } else {
                tracing::warn!(
                    kind = T::KIND,
                    id = record.id(),
                    name = record.display_name(),
                    "duplicate id; keeping the first"
                );
                self.rejected.push(RejectedRow {
                    file: path.to_path_buf(),
                    index,
                    id: Some(record.id().to_string()),
                    reason: format!("duplicate {} id", T::KIND),
                    hint: None,
                });
            }
        }
        kept
    }
}

/// Read and parse a build file
pub fn load_build_file(path: &Path) -> Result<BuildFile, YamlError> {
    parse_yaml_file(path)
}

fn read_optional(path: &Path) -> Result<Option<String>, CatalogError> {
    if !path.exists() {
        return Ok(None);
    }
    std::fs::read_to_string(path)
        .map(Some)
        .map_err(|source| {
            CatalogError::Yaml(YamlError::Io {
                path: path.to_path_buf(),
                source,
            })
        })
}

/// YAML files under `dir`, sorted by path
fn part_files(dir: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|source| CatalogError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path
                .extension()
                .map_or(false, |e| e == "yaml" || e == "yml")
        {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}
