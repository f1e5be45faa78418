//! Rule cache - parsed rules and mappings keyed by a catalog fingerprint
//!
//! The cache stores the rule and mapping rows that were accepted from the
//! catalog together with a SHA-256 fingerprint of the source files. An entry
//! is served only while the fingerprint matches and the entry is younger than
//! the configured TTL.
//!
//! The cache is user-local and lives in `<catalog>/.kbt/rule-cache.json`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::entities::rule::{DirectMapping, Rule};

/// Cache file location within a catalog
pub const CACHE_FILE: &str = ".kbt/rule-cache.json";

/// Bumped whenever the stored layout changes
const CACHE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to write rule cache {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode rule cache: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    version: u32,
    fingerprint: String,
    stored_at: DateTime<Utc>,
    rules: Vec<Rule>,
    mappings: Vec<DirectMapping>,
}

/// Rules and mappings served from the cache
#[derive(Debug, Clone, Copy)]
pub struct CachedRules<'a> {
    pub rules: &'a [Rule],
    pub mappings: &'a [DirectMapping],
    pub stored_at: DateTime<Utc>,
}

/// TTL cache for parsed rules, optionally backed by a file
#[derive(Debug)]
pub struct RuleCache {
    path: Option<PathBuf>,
    ttl: Duration,
    entry: Option<CacheEntry>,
}

impl RuleCache {
    /// Cache that lives only as long as the value
    pub fn in_memory(ttl: Duration) -> Self {
        Self {
            path: None,
            ttl,
            entry: None,
        }
    }

    /// Open the cache file for a catalog. A missing or unreadable file gives
    /// an empty cache.
    pub fn open(catalog: &Path, ttl: Duration) -> Self {
        let path = catalog.join(CACHE_FILE);
        let entry = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<CacheEntry>(&contents) {
                Ok(entry) if entry.version == CACHE_VERSION => Some(entry),
                Ok(_) => {
                    tracing::debug!(path = %path.display(), "discarding rule cache from another version");
                    None
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "discarding unreadable rule cache");
                    None
                }
            },
            Err(_) => None,
        };

        Self {
            path: Some(path),
            ttl,
            entry,
        }
    }

    /// Whether entries can ever be served
    pub fn is_enabled(&self) -> bool {
        self.ttl > Duration::zero()
    }

    /// Cached rules for `fingerprint`, if fresh at `now`
    pub fn get(&self, fingerprint: &str, now: DateTime<Utc>) -> Option<CachedRules<'_>> {
        if !self.is_enabled() {
            return None;
        }
        let entry = self.entry.as_ref()?;
        if entry.fingerprint != fingerprint {
            tracing::debug!("rule cache fingerprint changed");
            return None;
        }
        if now - entry.stored_at >= self.ttl {
            tracing::debug!(stored_at = %entry.stored_at, "rule cache expired");
            return None;
        }
        tracing::debug!(rules = entry.rules.len(), "rule cache hit");
        Some(CachedRules {
            rules: &entry.rules,
            mappings: &entry.mappings,
            stored_at: entry.stored_at,
        })
    }

    /// Replace the cached entry
    pub fn put(
        &mut self,
        fingerprint: impl Into<String>,
        rules: Vec<Rule>,
        mappings: Vec<DirectMapping>,
        now: DateTime<Utc>,
    ) {
        if !self.is_enabled() {
            return;
        }
        self.entry = Some(CacheEntry {
            version: CACHE_VERSION,
            fingerprint: fingerprint.into(),
            stored_at: now,
            rules,
            mappings,
        });
    }

    /// Drop the entry (and the backing file, if any)
    pub fn clear(&mut self) -> Result<(), CacheError> {
        self.entry = None;
        if let Some(path) = &self.path {
            if path.exists() {
                fs::remove_file(path).map_err(|source| CacheError::Io {
                    path: path.clone(),
                    source,
                })?;
            }
        }
        Ok(())
    }

    /// Write the entry to the backing file. No-op for in-memory caches.
    pub fn save(&self) -> Result<(), CacheError> {
        let (Some(path), Some(entry)) = (&self.path, &self.entry) else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| CacheError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string(entry)?;
        fs::write(path, json).map_err(|source| CacheError::Io {
            path: path.clone(),
            source,
        })
    }
}

/// SHA-256 over the given chunks, each prefixed with its length
pub fn fingerprint<'a>(chunks: impl IntoIterator<Item = &'a [u8]>) -> String {
    let mut hasher = Sha256::new();
    for chunk in chunks {
        hasher.update((chunk.len() as u64).to_le_bytes());
        hasher.update(chunk);
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::part::PartCategory;
    use crate::entities::rule::{CompatibilityLevel, RuleSource, Severity};
    use tempfile::tempdir;

    fn sample_rule() -> Rule {
        Rule::new(
            "r1",
            RuleSource::Engine,
            PartCategory::Clutch,
            serde_json::json!({ "op": "present", "field": "bore_in" }),
            "msg",
            Severity::Info,
        )
    }

    #[test]
    fn test_fingerprint_is_stable_and_sensitive() {
        let a = fingerprint([b"rules".as_slice(), b"maps".as_slice()]);
        let b = fingerprint([b"rules".as_slice(), b"maps".as_slice()]);
        let c = fingerprint([b"rulesm".as_slice(), b"aps".as_slice()]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_hit_miss_and_expiry() {
        let now = Utc::now();
        let mut cache = RuleCache::in_memory(Duration::seconds(60));
        assert!(cache.get("fp", now).is_none());

        cache.put("fp", vec![sample_rule()], vec![], now);
        assert_eq!(cache.get("fp", now).map(|c| c.rules.len()), Some(1));
        assert!(cache.get("other", now).is_none());
        assert!(cache.get("fp", now + Duration::seconds(59)).is_some());
        assert!(cache.get("fp", now + Duration::seconds(60)).is_none());
    }

    #[test]
    fn test_zero_ttl_disables() {
        let now = Utc::now();
        let mut cache = RuleCache::in_memory(Duration::zero());
        cache.put("fp", vec![sample_rule()], vec![], now);
        assert!(cache.get("fp", now).is_none());
    }

    #[test]
    fn test_file_roundtrip_and_clear() {
        let dir = tempdir().unwrap();
        let now = Utc::now();
        let mapping = DirectMapping::new("e1", "p1", CompatibilityLevel::DirectFit);

        let mut cache = RuleCache::open(dir.path(), Duration::seconds(300));
        cache.put("fp", vec![sample_rule()], vec![mapping], now);
        cache.save().unwrap();
        assert!(dir.path().join(CACHE_FILE).exists());

        let mut reopened = RuleCache::open(dir.path(), Duration::seconds(300));
        let hit = reopened.get("fp", now).unwrap();
        assert_eq!(hit.rules[0].id, "r1");
        assert_eq!(hit.mappings[0].part_id, "p1");

        reopened.clear().unwrap();
        assert!(!dir.path().join(CACHE_FILE).exists());
    }

    #[test]
    fn test_corrupt_file_is_ignored() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".kbt")).unwrap();
        std::fs::write(dir.path().join(CACHE_FILE), "{not json").unwrap();
        let cache = RuleCache::open(dir.path(), Duration::seconds(300));
        assert!(cache.get("fp", Utc::now()).is_none());
    }
}
