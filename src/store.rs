//! Persona persistence seam.
//!
//! The pipeline only needs three operations: insert a finished batch, set one
//! persona's avatar, and list what exists for duplicate checks.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{Error, Result};
use crate::persona::{Ownership, Persona, PersonaDraft};

#[async_trait]
pub trait PersonaRepository: Send + Sync {
    /// Promote drafts to personas and store them, preserving order.
    async fn insert_drafts(&self, drafts: &[PersonaDraft], ownership: &Ownership) -> Result<Vec<Persona>>;

    async fn update_avatar(&self, persona_id: &str, avatar_url: &str) -> Result<()>;

    async fn list(&self) -> Result<Vec<Persona>>;
}

fn promote(drafts: &[PersonaDraft], ownership: &Ownership) -> Vec<Persona> {
    let now = Utc::now();
    drafts
        .iter()
        .map(|draft| Persona::from_draft(draft, ownership, now))
        .collect()
}

fn set_avatar(personas: &mut [Persona], persona_id: &str, avatar_url: &str) -> Result<()> {
    let persona = personas
        .iter_mut()
        .find(|p| p.id == persona_id)
        .ok_or_else(|| Error::PersonaNotFound {
            persona_id: persona_id.to_string(),
        })?;
    persona.avatar_url = Some(avatar_url.to_string());
    persona.updated_at = Utc::now();
    Ok(())
}

// ─────────────────────────────────────────────────────────────────
// In-memory
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryRepository {
    personas: RwLock<Vec<Persona>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_personas(personas: Vec<Persona>) -> Self {
        Self {
            personas: RwLock::new(personas),
        }
    }

    pub fn len(&self) -> usize {
        self.personas.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.read().is_empty()
    }
}

#[async_trait]
impl PersonaRepository for MemoryRepository {
    async fn insert_drafts(&self, drafts: &[PersonaDraft], ownership: &Ownership) -> Result<Vec<Persona>> {
        let inserted = promote(drafts, ownership);
        self.personas.write().extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn update_avatar(&self, persona_id: &str, avatar_url: &str) -> Result<()> {
        set_avatar(&mut self.personas.write(), persona_id, avatar_url)
    }

    async fn list(&self) -> Result<Vec<Persona>> {
        Ok(self.personas.read().clone())
    }
}

// ─────────────────────────────────────────────────────────────────
// JSON file
// ─────────────────────────────────────────────────────────────────

/// All personas in a single pretty-printed JSON array.
#[derive(Debug)]
pub struct JsonFileRepository {
    path: PathBuf,
    lock: RwLock<()>,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Vec<Persona>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|e| Error::io_read(&self.path, e))?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_all(&self, personas: &[Persona]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io_write(parent, e))?;
        }
        let content = serde_json::to_string_pretty(personas)?;
        fs::write(&self.path, content).map_err(|e| Error::io_write(&self.path, e))?;
        debug!(path = %self.path.display(), count = personas.len(), "Personas written");
        Ok(())
    }
}

#[async_trait]
impl PersonaRepository for JsonFileRepository {
    async fn insert_drafts(&self, drafts: &[PersonaDraft], ownership: &Ownership) -> Result<Vec<Persona>> {
        let _guard = self.lock.write();
        let mut all = self.read_all()?;
        let inserted = promote(drafts, ownership);
        all.extend(inserted.iter().cloned());
        self.write_all(&all)?;
        Ok(inserted)
    }

    async fn update_avatar(&self, persona_id: &str, avatar_url: &str) -> Result<()> {
        let _guard = self.lock.write();
        let mut all = self.read_all()?;
        set_avatar(&mut all, persona_id, avatar_url)?;
        self.write_all(&all)
    }

    async fn list(&self) -> Result<Vec<Persona>> {
        let _guard = self.lock.read();
        self.read_all()
    }
}
