//! Generation sessions: an audit record per batch, stored as JSON files.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::persona::PersonaGenerationRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Generating,
    Completed,
    Failed,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Generating => "generating",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One generation run and what it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSession {
    pub id: String,
    pub request: PersonaGenerationRequest,
    #[serde(default)]
    pub persona_ids: Vec<String>,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub fallback_count: usize,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_time_ms: Option<u64>,
    /// Session this one re-ran, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replay_of: Option<String>,
}

impl GenerationSession {
    pub fn new(request: PersonaGenerationRequest) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            request,
            persona_ids: Vec::new(),
            status: SessionStatus::Pending,
            error_message: None,
            fallback_count: 0,
            created_at: Utc::now(),
            completed_at: None,
            generation_time_ms: None,
            replay_of: None,
        }
    }

    pub fn start(&mut self) {
        self.status = SessionStatus::Generating;
    }

    pub fn complete(&mut self, persona_ids: Vec<String>, fallback_count: usize) {
        self.persona_ids = persona_ids;
        self.fallback_count = fallback_count;
        self.finish(SessionStatus::Completed);
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
        self.finish(SessionStatus::Failed);
    }

    fn finish(&mut self, status: SessionStatus) {
        let now = Utc::now();
        self.status = status;
        self.completed_at = Some(now);
        self.generation_time_ms = Some((now - self.created_at).num_milliseconds().max(0) as u64);
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, SessionStatus::Completed | SessionStatus::Failed)
    }
}

// ─────────────────────────────────────────────────────────────────
// Session Log
// ─────────────────────────────────────────────────────────────────

/// Directory of `<session id>.json` files.
#[derive(Debug, Clone)]
pub struct SessionLog {
    dir: PathBuf,
}

impl SessionLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File for `id`, `None` unless the id is a single plain file stem.
    fn path_for(&self, id: &str) -> Option<PathBuf> {
        let plain = !id.is_empty()
            && !id.contains("..")
            && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
        plain.then(|| self.dir.join(format!("{}.json", id)))
    }

    pub fn save(&self, session: &GenerationSession) -> Result<()> {
        let path = self.path_for(&session.id).ok_or_else(|| {
            Error::invalid_request(format!("session id {:?} is not a plain file name", session.id))
        })?;
        fs::create_dir_all(&self.dir).map_err(|e| Error::io_write(&self.dir, e))?;
        let content = serde_json::to_string_pretty(session)?;
        fs::write(&path, content).map_err(|e| Error::io_write(&path, e))?;
        debug!(session = %session.id, status = %session.status, "Session saved");
        Ok(())
    }

    pub fn load(&self, id: &str) -> Result<GenerationSession> {
        let id = id.trim();
        let Some(path) = self.path_for(id).filter(|p| p.exists()) else {
            return Err(Error::SessionNotFound {
                session_id: id.to_string(),
            });
        };
        let content = fs::read_to_string(&path).map_err(|e| Error::io_read(&path, e))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// All readable sessions, newest first. Unreadable files are skipped.
    pub fn list(&self) -> Result<Vec<GenerationSession>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut sessions = Vec::new();
        let entries = fs::read_dir(&self.dir).map_err(|e| Error::io_read(&self.dir, e))?;
        for entry in entries {
            let path = entry.map_err(|e| Error::io_read(&self.dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|c| serde_json::from_str::<GenerationSession>(&c).map_err(|e| e.to_string()));
            match parsed {
                Ok(session) => sessions.push(session),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable session"),
            }
        }

        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }
}
