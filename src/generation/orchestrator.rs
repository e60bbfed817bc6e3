//! Batch generation with retry, fallback and per-item isolation.
//!
//! Items run strictly one after another. An item either ends with an accepted
//! model draft or a fallback draft; only fatal errors (configuration, bad
//! request, authentication) abort the batch.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::backend::{CompletionRequest, GenerationClient};
use crate::context::{ContextResolver, ProgramData, UniversityContext};
use crate::error::{Error, Result};
use crate::persona::{
    self, templates, DuplicateCheck, Enricher, FallbackSynthesizer, Persona, PersonaDraft,
    PersonaGenerationRequest, PromptBuilder, PromptPair, Provenance, Validator,
    DUPLICATE_THRESHOLD,
};

use super::retry::{
    AttemptHook, AttemptOutcome, AttemptRecord, OutcomeKind, RetryPolicy, ValidationPolicy,
};

/// Largest batch a single request may ask for.
pub const MAX_BATCH_SIZE: usize = 50;

/// Briefs shorter than this are accepted with a warning.
const MIN_USEFUL_BRIEF: usize = 20;

// ─────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    pub retry: RetryPolicy,

    /// Hard limit on one generation call
    pub timeout: Duration,

    pub temperature: f32,
    pub max_tokens: u32,

    /// Treat a model draft that duplicates an earlier one in the batch as a
    /// failed attempt
    pub reject_duplicates: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(30),
            temperature: 0.7,
            max_tokens: 2000,
            reject_duplicates: true,
        }
    }
}

/// Drafts of one batch, in request order.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub drafts: Vec<PersonaDraft>,
    pub fallback_count: usize,
    /// Generation calls made across all items
    pub attempts: u32,
    pub context: UniversityContext,
}

impl BatchResult {
    pub fn ai_count(&self) -> usize {
        self.drafts.len() - self.fallback_count
    }
}

// ─────────────────────────────────────────────────────────────────
// Orchestrator
// ─────────────────────────────────────────────────────────────────

pub struct GenerationOrchestrator {
    config: OrchestratorConfig,
    contexts: Arc<dyn ContextResolver>,
    /// `None` runs the fallback path only
    client: Option<Arc<dyn GenerationClient>>,
    validator: Validator,
    enricher: Enricher,
    fallback: FallbackSynthesizer,
    hook: Option<AttemptHook>,
}

impl GenerationOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        contexts: Arc<dyn ContextResolver>,
        client: Option<Arc<dyn GenerationClient>>,
    ) -> Self {
        Self {
            config,
            contexts,
            client,
            validator: Validator::new(),
            enricher: Enricher::new(),
            fallback: FallbackSynthesizer::new(),
            hook: None,
        }
    }

    /// Receive an [`AttemptRecord`] after every attempt.
    pub fn with_hook(mut self, hook: AttemptHook) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn is_offline(&self) -> bool {
        self.client.is_none()
    }

    /// Generate exactly `request.count` drafts.
    pub async fn generate_batch(&self, request: &PersonaGenerationRequest) -> Result<BatchResult> {
        validate_request(request)?;

        if let Some(client) = &self.client {
            if !client.has_credentials() {
                return Err(Error::missing_credentials(client.name()));
            }
        }

        let context = self.contexts.resolve_context(&request.institution_id).await?;
        let programs = resolve_programs(&context, request)?;
        let prompts = PromptBuilder::new(&context, request)?;

        info!(
            institution = %context.id,
            count = request.count,
            level = %request.intelligence_level,
            offline = self.is_offline(),
            "Generating persona batch"
        );

        let mut drafts: Vec<PersonaDraft> = Vec::with_capacity(request.count);
        let mut fallback_count = 0;
        let mut attempts = 0;

        for item in 0..request.count {
            let generated = match &self.client {
                Some(client) => {
                    let (draft, used) = self
                        .generate_item(client.as_ref(), item, prompts.for_item(item + 1), &drafts)
                        .await?;
                    attempts += used;
                    draft
                }
                None => None,
            };

            let mut draft = match generated {
                Some(draft) => draft,
                None => {
                    fallback_count += 1;
                    warn!(item, provenance = %Provenance::Fallback, "Using fallback persona");
                    self.fallback.synthesize(item, &context, &programs)
                }
            };

            let filled = self.enricher.enrich(&mut draft);
            if !filled.is_empty() {
                debug!(item, fields = ?filled, "Enriched draft");
            }
            draft.quality_score = Some(self.validator.validate(&draft).score);

            debug!(
                item,
                provenance = %draft.provenance,
                score = draft.quality_score.unwrap_or(0),
                "Item resolved"
            );
            drafts.push(draft);
        }

        info!(
            count = drafts.len(),
            fallback = fallback_count,
            attempts,
            "Persona batch complete"
        );

        Ok(BatchResult {
            drafts,
            fallback_count,
            attempts,
            context,
        })
    }

    /// Run the attempt loop for one item. `Ok(None)` means use fallback.
    async fn generate_item(
        &self,
        client: &dyn GenerationClient,
        item: usize,
        prompts: PromptPair,
        earlier: &[PersonaDraft],
    ) -> Result<(Option<PersonaDraft>, u32)> {
        let max_attempts = self.config.retry.max_attempts.max(1);
        let mut schedule = self.config.retry.schedule();

        for attempt in 1..=max_attempts {
            let outcome = self.attempt(client, &prompts, earlier).await;
            let kind = outcome.kind();

            match outcome {
                AttemptOutcome::Accepted(draft) => {
                    self.notify(item, attempt, kind, None, None);
                    return Ok((Some(draft), attempt));
                }
                AttemptOutcome::Fatal(error) => {
                    self.notify(item, attempt, kind, Some(error.to_string()), None);
                    return Err(error);
                }
                AttemptOutcome::Rejected(reason) => {
                    warn!(item, attempt, reason = %reason, "Draft rejected");
                    self.notify(item, attempt, kind, Some(reason), None);
                    return Ok((None, attempt));
                }
                AttemptOutcome::Retryable(reason) => {
                    let delay = (attempt < max_attempts).then(|| schedule.next_delay());
                    warn!(
                        item,
                        attempt,
                        delay_ms = delay.map_or(0, |d| d.as_millis() as u64),
                        reason = %reason,
                        "Generation attempt failed"
                    );
                    self.notify(item, attempt, kind, Some(reason), delay);
                    if let Some(delay) = delay {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Ok((None, max_attempts))
    }

    /// One call, parse, sanitize, validate and duplicate check.
    async fn attempt(
        &self,
        client: &dyn GenerationClient,
        prompts: &PromptPair,
        earlier: &[PersonaDraft],
    ) -> AttemptOutcome {
        let request = CompletionRequest {
            system: prompts.system.clone(),
            user: prompts.user.clone(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let raw = match tokio::time::timeout(self.config.timeout, client.complete(&request)).await {
            Err(_) => {
                return AttemptOutcome::from_error(Error::GenerationTimeout {
                    timeout_secs: self.config.timeout.as_secs(),
                })
            }
            Ok(Err(error)) => return AttemptOutcome::from_error(error),
            Ok(Ok(raw)) => raw,
        };

        let draft = match persona::parse(&raw) {
            Ok(draft) => self.validator.sanitize(&draft),
            Err(error) => return AttemptOutcome::from_error(error),
        };

        let result = self.validator.validate(&draft);
        if !result.is_valid {
            let error = Error::ValidationFailed {
                errors: result.errors,
            };
            return match self.config.retry.validation {
                ValidationPolicy::RetryOnInvalid => AttemptOutcome::from_error(error),
                ValidationPolicy::AcceptWithWarnings => AttemptOutcome::Rejected(error.to_string()),
            };
        }
        if !result.warnings.is_empty() {
            debug!(warnings = ?result.warnings, "Draft accepted with warnings");
        }

        if self.config.reject_duplicates {
            let model_drafts: Vec<&PersonaDraft> = earlier
                .iter()
                .filter(|d| d.provenance == Provenance::AiGenerated)
                .collect();
            for other in model_drafts {
                let score = persona::similarity(&draft, other);
                if score > DUPLICATE_THRESHOLD {
                    return AttemptOutcome::Retryable(format!(
                        "draft duplicates an earlier persona ({:.0}% similar)",
                        score
                    ));
                }
            }
        }

        AttemptOutcome::Accepted(draft)
    }

    fn notify(
        &self,
        item: usize,
        attempt: u32,
        outcome: OutcomeKind,
        reason: Option<String>,
        delay: Option<Duration>,
    ) {
        if let Some(hook) = &self.hook {
            hook(&AttemptRecord {
                item,
                attempt,
                outcome,
                reason,
                delay,
            });
        }
    }
}

/// Advisory check of a finished batch against already persisted personas.
pub fn advisory_duplicates(drafts: &[PersonaDraft], existing: &[Persona]) -> Vec<DuplicateCheck> {
    let found = persona::find_duplicates(drafts, existing);
    for dup in &found {
        warn!(
            item = dup.candidate_index,
            persona_id = %existing[dup.existing_index].id,
            similarity = dup.similarity,
            fields = ?dup.matching_fields,
            "Generated persona resembles an existing one"
        );
    }
    found
}

// ─────────────────────────────────────────────────────────────────
// Request checks
// ─────────────────────────────────────────────────────────────────

/// Reject requests that cannot produce a meaningful batch.
pub fn validate_request(request: &PersonaGenerationRequest) -> Result<()> {
    let brief = request.brief.trim();
    if brief.is_empty() {
        return Err(Error::invalid_request("brief must not be empty"));
    }
    if brief.chars().count() < MIN_USEFUL_BRIEF {
        warn!(
            length = brief.chars().count(),
            "Brief is very short; personas may be generic"
        );
    }
    if request.count == 0 || request.count > MAX_BATCH_SIZE {
        return Err(Error::invalid_request(format!(
            "count must be between 1 and {} (got {})",
            MAX_BATCH_SIZE, request.count
        )));
    }
    if request.program_ids.iter().all(|id| id.trim().is_empty()) {
        return Err(Error::invalid_request("at least one program id is required"));
    }
    if request.institution_id.trim().is_empty() {
        return Err(Error::invalid_request("institution id must not be empty"));
    }
    if let Some(template_id) = &request.template_id {
        templates::find(template_id)?;
    }
    Ok(())
}

fn resolve_programs<'a>(
    context: &'a UniversityContext,
    request: &PersonaGenerationRequest,
) -> Result<Vec<&'a ProgramData>> {
    let programs = context.select_programs(&request.program_ids);
    if programs.is_empty() {
        return Err(Error::ProgramNotFound {
            institution_id: context.id.clone(),
            program_ids: request.program_ids.join(", "),
        });
    }

    for id in &request.program_ids {
        if context.program(id).is_none() {
            warn!(institution = %context.id, program = %id, "Unknown program id skipped");
        }
    }
    Ok(programs)
}
