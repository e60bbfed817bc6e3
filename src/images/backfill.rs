//! Sequential avatar backfill for a saved batch.
//!
//! Requests are issued one at a time with a fixed spacing between them. The
//! spacing works around upstream caching that returns near-identical images
//! for similar prompts; it is backpressure, not an ordering requirement.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::{ImageClient, ImageRequest};
use crate::persona::Persona;
use crate::store::PersonaRepository;

use super::placeholder::{placeholder_avatar, DEFAULT_PLACEHOLDER_BASE};
use super::prompt::build_image_prompt;

#[derive(Debug, Clone, PartialEq)]
pub struct BackfillConfig {
    /// Wait between consecutive image requests
    pub spacing: Duration,
    pub placeholder_base_url: String,
    /// Fixed seed for attire variation, mostly for tests
    pub seed: Option<u64>,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            spacing: Duration::from_millis(2000),
            placeholder_base_url: DEFAULT_PLACEHOLDER_BASE.to_string(),
            seed: None,
        }
    }
}

/// Where one persona's avatar came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvatarOutcome {
    pub persona_id: String,
    pub avatar_url: String,
    pub placeholder: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BackfillReport {
    pub outcomes: Vec<AvatarOutcome>,
}

impl BackfillReport {
    pub fn generated_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.placeholder).count()
    }

    pub fn placeholder_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.placeholder).count()
    }
}

// ─────────────────────────────────────────────────────────────────
// Orchestrator
// ─────────────────────────────────────────────────────────────────

pub struct ImageBackfillOrchestrator {
    /// `None` assigns placeholders without any request
    client: Option<Arc<dyn ImageClient>>,
    config: BackfillConfig,
    rng: Mutex<StdRng>,
}

impl ImageBackfillOrchestrator {
    pub fn new(client: Option<Arc<dyn ImageClient>>, config: BackfillConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            client,
            config,
            rng: Mutex::new(rng),
        }
    }

    pub fn config(&self) -> &BackfillConfig {
        &self.config
    }

    /// Give every persona an avatar, updating both `personas` and the
    /// repository. Never fails; per-persona problems end in a placeholder.
    pub async fn backfill(
        &self,
        personas: &mut [Persona],
        repo: &dyn PersonaRepository,
    ) -> BackfillReport {
        let mut report = BackfillReport::default();
        info!(count = personas.len(), offline = self.client.is_none(), "Starting image backfill");

        for (i, persona) in personas.iter_mut().enumerate() {
            let outcome = match &self.client {
                Some(client) => {
                    if i > 0 && !self.config.spacing.is_zero() {
                        debug!(delay_ms = self.config.spacing.as_millis() as u64, "Spacing image requests");
                        tokio::time::sleep(self.config.spacing).await;
                    }
                    self.request_avatar(client.as_ref(), persona).await
                }
                None => self.placeholder_for(persona, None),
            };

            if let Err(e) = repo.update_avatar(&persona.id, &outcome.avatar_url).await {
                warn!(persona_id = %persona.id, error = %e, "Failed to store avatar");
            }
            persona.avatar_url = Some(outcome.avatar_url.clone());
            report.outcomes.push(outcome);
        }

        info!(
            generated = report.generated_count(),
            placeholders = report.placeholder_count(),
            "Image backfill finished"
        );
        report
    }

    async fn request_avatar(&self, client: &dyn ImageClient, persona: &Persona) -> AvatarOutcome {
        let prompt = {
            let mut rng = self.rng.lock();
            build_image_prompt(persona, &mut *rng)
        };
        let request = ImageRequest {
            prompt,
            persona_id: persona.id.clone(),
        };

        match client.generate_image(&request).await {
            Ok(url) if !url.trim().is_empty() => {
                debug!(persona_id = %persona.id, "Avatar generated");
                AvatarOutcome {
                    persona_id: persona.id.clone(),
                    avatar_url: url.trim().to_string(),
                    placeholder: false,
                    error: None,
                }
            }
            Ok(_) => self.placeholder_for(persona, Some("empty image URL".to_string())),
            Err(e) => self.placeholder_for(persona, Some(e.to_string())),
        }
    }

    fn placeholder_for(&self, persona: &Persona, error: Option<String>) -> AvatarOutcome {
        if let Some(reason) = &error {
            warn!(persona_id = %persona.id, error = %reason, "Image generation failed, using placeholder");
        }
        AvatarOutcome {
            persona_id: persona.id.clone(),
            avatar_url: placeholder_avatar(&self.config.placeholder_base_url, &persona.id),
            placeholder: true,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::error::Error;
    use crate::persona::{Ownership, PersonaDraft, PersonaField};
    use crate::store::MemoryRepository;

    async fn saved(repo: &MemoryRepository, n: usize) -> Vec<Persona> {
        let drafts: Vec<PersonaDraft> = (0..n)
            .map(|i| {
                let mut d = PersonaDraft::default();
                d.set_text(PersonaField::Name, format!("Persona {}", i));
                d.set_text(PersonaField::AgeRange, "30-37");
                d.set_text(PersonaField::Occupation, "Buyer");
                d
            })
            .collect();
        repo.insert_drafts(&drafts, &Ownership::default()).await.unwrap()
    }

    fn orchestrator(mock: Arc<MockBackend>) -> ImageBackfillOrchestrator {
        ImageBackfillOrchestrator::new(
            Some(mock),
            BackfillConfig {
                seed: Some(1),
                ..Default::default()
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_backfill_spacing_and_success() {
        let repo = MemoryRepository::new();
        let mut personas = saved(&repo, 3).await;
        let mock = Arc::new(MockBackend::new());

        let start = tokio::time::Instant::now();
        let report = orchestrator(mock.clone()).backfill(&mut personas, &repo).await;

        assert!(start.elapsed() >= Duration::from_secs(4));
        assert_eq!(report.generated_count(), 3);
        assert_eq!(mock.call_count("generate_image"), 3);

        let requested: Vec<String> = mock.image_requests().into_iter().map(|r| r.persona_id).collect();
        let ids: Vec<String> = personas.iter().map(|p| p.id.clone()).collect();
        assert_eq!(requested, ids);

        let stored = repo.list().await.unwrap();
        assert!(stored.iter().all(|p| p.avatar_url.as_deref().unwrap_or("").starts_with("mock://")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_get_placeholders() {
        let repo = MemoryRepository::new();
        let mut personas = saved(&repo, 3).await;
        let mock = Arc::new(MockBackend::new());
        mock.push_image_error(Error::network("mock://images", "reset"))
            .push_image("   ");

        let report = orchestrator(mock.clone()).backfill(&mut personas, &repo).await;

        assert_eq!(report.placeholder_count(), 2);
        assert_eq!(report.generated_count(), 1);
        assert!(report.outcomes[0].error.is_some());
        assert_eq!(
            personas[0].avatar_url.as_deref(),
            Some(placeholder_avatar(DEFAULT_PLACEHOLDER_BASE, &personas[0].id).as_str())
        );
        assert!(personas.iter().all(|p| p.avatar_url.as_ref().is_some_and(|u| !u.is_empty())));
    }

    #[tokio::test]
    async fn test_offline_backfill_makes_no_requests() {
        let repo = MemoryRepository::new();
        let mut personas = saved(&repo, 2).await;
        let backfill = ImageBackfillOrchestrator::new(None, BackfillConfig::default());

        let report = backfill.backfill(&mut personas, &repo).await;
        assert_eq!(report.placeholder_count(), 2);
        assert!(report.outcomes.iter().all(|o| o.error.is_none()));
    }

    #[tokio::test]
    async fn test_unknown_persona_does_not_stop_backfill() {
        let repo = MemoryRepository::new();
        let mut personas = saved(&MemoryRepository::new(), 2).await;
        let backfill = ImageBackfillOrchestrator::new(
            Some(Arc::new(MockBackend::new())),
            BackfillConfig {
                spacing: Duration::ZERO,
                ..Default::default()
            },
        );

        let report = backfill.backfill(&mut personas, &repo).await;
        assert_eq!(report.outcomes.len(), 2);
        assert!(personas.iter().all(|p| p.avatar_url.is_some()));
    }
}
