//! Institution context store.
//!
//! Holds every known [`UniversityContext`], keyed by institution id. The
//! store is built once at startup from the bundled institution files plus any
//! TOML files in the configured institutions directory, then shared read-only.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

use super::types::UniversityContext;

/// Institution files compiled into the binary.
const BUNDLED_INSTITUTIONS: &[(&str, &str)] = &[(
    "msu.toml",
    include_str!("../../config/institutions/msu.toml"),
)];

/// Resolves an institution id to its context.
#[async_trait]
pub trait ContextResolver: Send + Sync {
    async fn resolve_context(&self, institution_id: &str) -> Result<UniversityContext>;
}

// ─────────────────────────────────────────────────────────────────
// Context Store
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ContextStore {
    institutions: BTreeMap<String, UniversityContext>,
}

impl ContextStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the bundled institutions only.
    pub fn bundled() -> Result<Self> {
        let mut store = Self::new();
        for (file_name, content) in BUNDLED_INSTITUTIONS {
            let context = parse_institution(content)
                .map_err(|e| Error::Internal(format!("Bundled institution {} is invalid: {}", file_name, e)))?;
            store.insert(context);
        }
        Ok(store)
    }

    /// Bundled institutions plus every `*.toml` in `dir`. Files in `dir`
    /// replace bundled entries with the same id.
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        let mut store = Self::bundled()?;

        let Some(dir) = dir else {
            return Ok(store);
        };
        if !dir.exists() {
            debug!(dir = %dir.display(), "Institutions directory does not exist, using bundled data");
            return Ok(store);
        }

        let entries = fs::read_dir(dir).map_err(|e| Error::io_read(dir, e))?;
        for entry in entries {
            let path = entry.map_err(|e| Error::io_read(dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }

            let content = fs::read_to_string(&path).map_err(|e| Error::io_read(&path, e))?;
            match parse_institution(&content) {
                Ok(context) => {
                    debug!(id = %context.id, path = %path.display(), "Loaded institution");
                    store.insert(context);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping invalid institution file");
                }
            }
        }

        info!(count = store.len(), "Institution contexts loaded");
        Ok(store)
    }

    pub fn insert(&mut self, context: UniversityContext) {
        self.institutions.insert(context.id.to_lowercase(), context);
    }

    pub fn get(&self, institution_id: &str) -> Option<&UniversityContext> {
        self.institutions.get(&institution_id.trim().to_lowercase())
    }

    pub fn list(&self) -> impl Iterator<Item = &UniversityContext> {
        self.institutions.values()
    }

    pub fn len(&self) -> usize {
        self.institutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.institutions.is_empty()
    }
}

#[async_trait]
impl ContextResolver for ContextStore {
    async fn resolve_context(&self, institution_id: &str) -> Result<UniversityContext> {
        self.get(institution_id)
            .cloned()
            .ok_or_else(|| Error::ContextNotFound {
                institution_id: institution_id.to_string(),
            })
    }
}

fn parse_institution(content: &str) -> std::result::Result<UniversityContext, String> {
    let context: UniversityContext = toml::from_str(content).map_err(|e| e.to_string())?;
    if context.id.trim().is_empty() {
        return Err("institution id is empty".to_string());
    }
    if context.programs.is_empty() {
        return Err(format!("institution '{}' lists no programs", context.id));
    }
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_bundled_store_has_msu() {
        let store = ContextStore::bundled().unwrap();
        let msu = store.get("msu").unwrap();
        assert_eq!(msu.name, "Michigan State University");
        let ids: Vec<_> = msu.programs.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["scm", "msl", "hcm"]);
        assert!(msu.messaging.is_some());
    }

    #[tokio::test]
    async fn test_resolve_unknown_institution() {
        let store = ContextStore::bundled().unwrap();
        let err = store.resolve_context("nowhere").await.unwrap_err();
        assert!(matches!(err, Error::ContextNotFound { .. }));

        let ctx = store.resolve_context(" MSU ").await.unwrap();
        assert_eq!(ctx.id, "msu");
    }

    #[test]
    fn test_load_from_directory_overrides_and_skips_invalid() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("lakeview.toml"),
            r#"
id = "lakeview"
name = "Lakeview College"

[[programs]]
id = "nurs"
name = "Nursing Leadership Certificate"
category = "Healthcare Management"
description = "Leadership for charge nurses"
target_audience = "Registered nurses"
key_benefits = ["Clinical leadership"]
"#,
        )
        .unwrap();
        fs::write(dir.path().join("broken.toml"), "id = ").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let store = ContextStore::load(Some(dir.path())).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("lakeview").unwrap().programs[0].id, "nurs");

        let resolved = tokio_test::block_on(store.resolve_context("lakeview")).unwrap();
        assert_eq!(resolved.name, "Lakeview College");
    }

    #[test]
    fn test_load_missing_directory_uses_bundled() {
        let store = ContextStore::load(Some(Path::new("/definitely/not/here"))).unwrap();
        assert!(store.get("msu").is_some());
    }
}
