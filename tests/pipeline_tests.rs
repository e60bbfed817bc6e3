//! End-to-end pipeline tests against the scripted mock backend
//!
//! Generation, persistence, avatar backfill and session recording run
//! together here with paused tokio time, so backoff and image spacing cost
//! nothing on the wall clock.

mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use persona_forge::backend::{GenerationClient, ImageClient, MockBackend, MockConfig};
use persona_forge::error::Error;
use persona_forge::generation::{
    GenerationOrchestrator, GenerationRunner, OrchestratorConfig, SessionLog, SessionStatus,
};
use persona_forge::images::{BackfillConfig, ImageBackfillOrchestrator};
use persona_forge::persona::{similarity, PersonaDraft, Provenance, Validator};
use persona_forge::store::{MemoryRepository, PersonaRepository};
use once_cell::sync::Lazy;
use regex::Regex;
use tempfile::TempDir;

fn orchestrator(client: Option<Arc<MockBackend>>) -> GenerationOrchestrator {
    let client = client.map(|c| c as Arc<dyn GenerationClient>);
    GenerationOrchestrator::new(OrchestratorConfig::default(), common::contexts(), client)
}

fn backfill(client: Option<Arc<MockBackend>>) -> ImageBackfillOrchestrator {
    let client = client.map(|c| c as Arc<dyn ImageClient>);
    ImageBackfillOrchestrator::new(
        client,
        BackfillConfig {
            seed: Some(7),
            ..Default::default()
        },
    )
}

static AGE_RANGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{2})-(\d{2})$").unwrap());
static INCOME_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\$(\d+)k-\$(\d+)k$").unwrap());

/// Both bounds of a range matched by `pattern`, when it matches.
fn bounds(pattern: &Regex, value: &str) -> Option<(u64, u64)> {
    let caps = pattern.captures(value)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

fn assert_demographics(draft: &PersonaDraft) {
    let age = draft.age_range.as_deref().unwrap();
    let (lo, hi) = bounds(&AGE_RANGE, age).unwrap_or_else(|| panic!("bad age range {}", age));
    assert!(lo < hi, "age range not increasing: {}", age);

    let income = draft.income_range.as_deref().unwrap();
    let (lo, hi) = bounds(&INCOME_RANGE, income).unwrap_or_else(|| panic!("bad income {}", income));
    assert!(lo < hi, "income range not increasing: {}", income);
}

// ─────────────────────────────────────────────────────────────────
// Generation
// ─────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_garbled_response_is_retried() {
    let mock = Arc::new(MockBackend::new());
    mock.push_completion("Sure! Here is a persona: {not really json");

    let result = orchestrator(Some(mock.clone()))
        .generate_batch(&common::scm_request(3))
        .await
        .unwrap();

    assert_eq!(result.drafts.len(), 3);
    assert_eq!(result.fallback_count, 0);
    assert_eq!(result.attempts, 4);
    assert_eq!(mock.call_count("complete"), 4);
}

#[tokio::test(start_paused = true)]
async fn test_failing_endpoint_yields_valid_fallback_batch() {
    let mock = Arc::new(MockBackend::failing());
    let result = orchestrator(Some(mock.clone()))
        .generate_batch(&common::scm_request(3))
        .await
        .unwrap();

    assert_eq!(result.drafts.len(), 3);
    assert_eq!(result.fallback_count, 3);
    assert_eq!(result.ai_count(), 0);
    assert_eq!(mock.call_count("complete"), 9);

    let validator = Validator::new();
    let mut names = HashSet::new();
    for draft in &result.drafts {
        assert_eq!(draft.provenance, Provenance::Fallback);
        let validation = validator.validate(draft);
        assert!(validation.is_valid, "fallback draft invalid: {:?}", validation.errors);

        assert_demographics(draft);

        names.insert(draft.name.clone().unwrap());
    }
    assert_eq!(names.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_mixed_batch_has_well_formed_ranges() {
    let mock = Arc::new(MockBackend::new());
    for _ in 0..3 {
        mock.push_completion_error(Error::network("https://api", "connection reset"));
    }

    let result = orchestrator(Some(mock.clone()))
        .generate_batch(&common::scm_request(4))
        .await
        .unwrap();

    assert_eq!(result.drafts.len(), 4);
    assert_eq!(result.fallback_count, 1);
    assert_eq!(result.drafts[0].provenance, Provenance::Fallback);
    assert!(result.drafts[1..]
        .iter()
        .all(|d| d.provenance == Provenance::AiGenerated));
    for draft in &result.drafts {
        assert_demographics(draft);
    }
}

#[tokio::test(start_paused = true)]
async fn test_missing_credentials_makes_no_calls() {
    let mock = Arc::new(MockBackend::with_config(MockConfig {
        credentials: false,
        ..Default::default()
    }));

    let err = orchestrator(Some(mock.clone()))
        .generate_batch(&common::scm_request(2))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MissingCredentials { .. }));
    assert_eq!(err.exit_code(), 10);
    assert_eq!(mock.call_count("complete"), 0);
}

#[tokio::test]
async fn test_sanitize_is_idempotent_on_generated_drafts() {
    let validator = Validator::new();
    let result = orchestrator(None).generate_batch(&common::scm_request(4)).await.unwrap();

    for draft in &result.drafts {
        let once = validator.sanitize(draft);
        let twice = validator.sanitize(&once);
        assert_eq!(once, twice);
    }
}

#[tokio::test]
async fn test_similarity_is_symmetric_across_batch() {
    let result = orchestrator(None).generate_batch(&common::scm_request(3)).await.unwrap();

    for a in &result.drafts {
        for b in &result.drafts {
            assert_eq!(similarity(a, b), similarity(b, a));
        }
        assert_eq!(similarity(a, a), 100.0);
    }
}

// ─────────────────────────────────────────────────────────────────
// Image Backfill
// ─────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_backfill_spaces_requests() {
    let repo = MemoryRepository::new();
    let batch = orchestrator(None).generate_batch(&common::scm_request(4)).await.unwrap();
    let mut personas = repo.insert_drafts(&batch.drafts, &Default::default()).await.unwrap();

    let mock = Arc::new(MockBackend::new());
    let start = tokio::time::Instant::now();
    let report = backfill(Some(mock.clone())).backfill(&mut personas, &repo).await;

    assert!(start.elapsed() >= Duration::from_secs(6));
    assert_eq!(report.generated_count(), 4);
    assert_eq!(mock.call_count("generate_image"), 4);

    let stored = repo.list().await.unwrap();
    assert!(stored.iter().all(|p| p.avatar_url.as_deref().is_some_and(|u| !u.is_empty())));
}

// ─────────────────────────────────────────────────────────────────
// Full Runs
// ─────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_failing_services_still_complete_run() {
    let temp = TempDir::new().unwrap();
    let repo = Arc::new(MemoryRepository::new());
    let mock = Arc::new(MockBackend::failing());

    let runner = GenerationRunner::new(orchestrator(Some(mock.clone())), repo.clone())
        .with_images(backfill(Some(mock.clone())))
        .with_sessions(SessionLog::new(temp.path()));

    let report = runner
        .run(common::scm_request(3).with_images(true))
        .await
        .unwrap();

    assert_eq!(report.personas.len(), 3);
    assert_eq!(report.fallback_count, 3);
    assert_eq!(repo.len(), 3);

    let images = report.images.unwrap();
    assert_eq!(images.placeholder_count(), 3);
    assert!(report
        .personas
        .iter()
        .all(|p| p.avatar_url.as_deref().is_some_and(|u| u.contains("svg?seed="))));

    let recorded = SessionLog::new(temp.path()).load(&report.session.id).unwrap();
    assert_eq!(recorded.status, SessionStatus::Completed);
    assert_eq!(recorded.fallback_count, 3);
    assert_eq!(recorded.persona_ids.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_second_run_reports_duplicates_of_saved_personas() {
    let repo = Arc::new(MemoryRepository::new());
    let runner = GenerationRunner::new(orchestrator(None), repo.clone());

    let first = runner.run(common::scm_request(2)).await.unwrap();
    assert!(first.duplicates.is_empty());

    let second = runner.run(common::scm_request(2)).await.unwrap();
    assert!(!second.duplicates.is_empty());
    assert!(second.duplicates.iter().all(|d| d.similarity > 70.0));
    // Advisory only: the second batch is still saved
    assert_eq!(repo.len(), 4);
}
