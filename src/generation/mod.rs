//! Batch generation: retry policy, orchestrator, sessions and the full
//! pipeline runner.

mod orchestrator;
mod retry;
mod runner;
mod session;

pub use orchestrator::{
    advisory_duplicates, validate_request, BatchResult, GenerationOrchestrator,
    OrchestratorConfig, MAX_BATCH_SIZE,
};
pub use retry::{
    AttemptHook, AttemptOutcome, AttemptRecord, BackoffKind, BackoffSchedule, OutcomeKind,
    RetryPolicy, ValidationPolicy,
};
pub use runner::{GenerationRunner, PipelineReport};
pub use session::{GenerationSession, SessionLog, SessionStatus};
