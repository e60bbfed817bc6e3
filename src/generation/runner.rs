//! End-to-end pipeline run: generate, persist, backfill avatars, record the
//! session.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::images::{BackfillReport, ImageBackfillOrchestrator};
use crate::persona::{DuplicateCheck, Ownership, Persona, PersonaGenerationRequest};
use crate::store::PersonaRepository;

use super::orchestrator::{advisory_duplicates, GenerationOrchestrator};
use super::session::{GenerationSession, SessionLog};

/// Everything one run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub session: GenerationSession,
    pub personas: Vec<Persona>,
    pub fallback_count: usize,
    pub attempts: u32,
    /// Matches against personas that existed before this run
    pub duplicates: Vec<DuplicateCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<BackfillReport>,
}

pub struct GenerationRunner {
    orchestrator: GenerationOrchestrator,
    repo: Arc<dyn PersonaRepository>,
    images: Option<ImageBackfillOrchestrator>,
    sessions: Option<SessionLog>,
    ownership: Ownership,
}

impl GenerationRunner {
    pub fn new(orchestrator: GenerationOrchestrator, repo: Arc<dyn PersonaRepository>) -> Self {
        Self {
            orchestrator,
            repo,
            images: None,
            sessions: None,
            ownership: Ownership::default(),
        }
    }

    pub fn with_images(mut self, images: ImageBackfillOrchestrator) -> Self {
        self.images = Some(images);
        self
    }

    pub fn with_sessions(mut self, sessions: SessionLog) -> Self {
        self.sessions = Some(sessions);
        self
    }

    pub fn with_ownership(mut self, ownership: Ownership) -> Self {
        self.ownership = ownership;
        self
    }

    pub fn orchestrator(&self) -> &GenerationOrchestrator {
        &self.orchestrator
    }

    pub async fn run(&self, request: PersonaGenerationRequest) -> Result<PipelineReport> {
        self.execute(GenerationSession::new(request)).await
    }

    /// Re-run a recorded session with the same request.
    pub async fn replay(&self, session_id: &str) -> Result<PipelineReport> {
        let sessions = self
            .sessions
            .as_ref()
            .ok_or_else(|| Error::Config("session log is not configured".to_string()))?;
        let original = sessions.load(session_id)?;
        info!(session = %original.id, "Replaying session");

        let mut session = GenerationSession::new(original.request);
        session.replay_of = Some(original.id);
        self.execute(session).await
    }

    async fn execute(&self, mut session: GenerationSession) -> Result<PipelineReport> {
        session.start();
        self.record(&session);

        match self.pipeline(&session).await {
            Ok((personas, fallback_count, attempts, duplicates, images)) => {
                session.complete(personas.iter().map(|p| p.id.clone()).collect(), fallback_count);
                self.record(&session);
                info!(
                    session = %session.id,
                    personas = personas.len(),
                    fallback = fallback_count,
                    attempts,
                    elapsed_ms = session.generation_time_ms.unwrap_or_default(),
                    max_item_wait_ms = self.orchestrator.config().retry.total_delay().as_millis() as u64,
                    "Generation session completed"
                );
                Ok(PipelineReport {
                    session,
                    personas,
                    fallback_count,
                    attempts,
                    duplicates,
                    images,
                })
            }
            Err(e) => {
                let message = e.format_for_log();
                error!(session = %session.id, error = %message, "Generation session failed");
                session.fail(message);
                self.record(&session);
                Err(e)
            }
        }
    }

    #[allow(clippy::type_complexity)]
    async fn pipeline(
        &self,
        session: &GenerationSession,
    ) -> Result<(Vec<Persona>, usize, u32, Vec<DuplicateCheck>, Option<BackfillReport>)> {
        let request = &session.request;
        let batch = self.orchestrator.generate_batch(request).await?;

        let existing = self.repo.list().await?;
        let duplicates = advisory_duplicates(&batch.drafts, &existing);

        let mut personas = self.repo.insert_drafts(&batch.drafts, &self.ownership).await?;

        let images = match (&self.images, request.generate_images) {
            (Some(images), true) => Some(images.backfill(&mut personas, self.repo.as_ref()).await),
            (None, true) => {
                warn!("Image generation requested but no image backfill is configured");
                None
            }
            _ => None,
        };

        Ok((personas, batch.fallback_count, batch.attempts, duplicates, images))
    }

    fn record(&self, session: &GenerationSession) {
        if let Some(sessions) = &self.sessions {
            if let Err(e) = sessions.save(session) {
                warn!(session = %session.id, error = %e, "Failed to record session");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::context::{ContextResolver, ContextStore};
    use crate::generation::{OrchestratorConfig, SessionStatus};
    use crate::images::BackfillConfig;
    use crate::persona::Provenance;
    use crate::store::MemoryRepository;
    use tempfile::TempDir;

    fn request(count: usize) -> PersonaGenerationRequest {
        PersonaGenerationRequest::new(
            "Working supply chain professionals seeking an online masters",
            "msu",
            vec!["scm".into()],
            count,
        )
    }

    fn runner(mock: Option<Arc<MockBackend>>, repo: Arc<MemoryRepository>, dir: &TempDir) -> GenerationRunner {
        let contexts: Arc<dyn ContextResolver> = Arc::new(ContextStore::bundled().unwrap());
        let client = mock.clone().map(|m| m as Arc<dyn crate::backend::GenerationClient>);
        let images = ImageBackfillOrchestrator::new(
            mock.map(|m| m as Arc<dyn crate::backend::ImageClient>),
            BackfillConfig::default(),
        );
        GenerationRunner::new(
            GenerationOrchestrator::new(OrchestratorConfig::default(), contexts, client),
            repo,
        )
        .with_images(images)
        .with_sessions(SessionLog::new(dir.path()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_persists_and_records() {
        let dir = TempDir::new().unwrap();
        let repo = Arc::new(MemoryRepository::new());
        let runner = runner(Some(Arc::new(MockBackend::new())), repo.clone(), &dir);

        let report = runner.run(request(2).with_images(true)).await.unwrap();

        assert_eq!(report.personas.len(), 2);
        assert_eq!(repo.len(), 2);
        assert_eq!(report.images.as_ref().unwrap().generated_count(), 2);
        assert_eq!(report.session.status, SessionStatus::Completed);

        let stored = SessionLog::new(dir.path()).load(&report.session.id).unwrap();
        assert_eq!(stored.persona_ids, report.personas.iter().map(|p| p.id.clone()).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_failed_run_is_recorded() {
        let dir = TempDir::new().unwrap();
        let repo = Arc::new(MemoryRepository::new());
        let runner = runner(None, repo.clone(), &dir);

        let mut bad = request(1);
        bad.institution_id = "nowhere".into();
        assert!(runner.run(bad).await.is_err());
        assert!(repo.is_empty());

        let sessions = SessionLog::new(dir.path()).list().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].status, SessionStatus::Failed);
        let message = sessions[0].error_message.as_deref().unwrap();
        assert!(message.starts_with("[E500]"), "unexpected message {}", message);
        assert!(message.contains("nowhere"));
    }

    #[tokio::test]
    async fn test_replay_reuses_request() {
        let dir = TempDir::new().unwrap();
        let repo = Arc::new(MemoryRepository::new());
        let runner = runner(None, repo.clone(), &dir);

        let first = runner.run(request(2)).await.unwrap();
        assert!(first.personas.iter().all(|p| p.provenance == Provenance::Fallback));

        let replayed = runner.replay(&first.session.id).await.unwrap();
        assert_eq!(replayed.session.request, first.session.request);
        assert_eq!(replayed.session.replay_of.as_deref(), Some(first.session.id.as_str()));
        assert_eq!(repo.len(), 4);
        // Second run sees the first run's personas.
        assert!(!replayed.duplicates.is_empty());

        assert!(matches!(runner.replay("missing").await, Err(Error::SessionNotFound { .. })));
    }
}
