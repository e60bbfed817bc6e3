//! Persona Forge
//!
//! Generates batches of synthetic marketing personas from a free-text brief
//! and institution context. Each persona is requested from an
//! OpenAI-compatible model with timeout, retry and backoff, parsed, sanitized,
//! validated, scored, checked for duplicates and enriched. Items that exhaust
//! their attempts are replaced by template personas, so a batch always has the
//! requested size. Saved personas can then be given avatar images one at a
//! time, with deterministic placeholders when image generation fails.

pub mod backend;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod generation;
pub mod images;
pub mod logging;
pub mod persona;
pub mod store;
pub mod version;

pub use config::ForgeConfig;
pub use error::{Error, Result};
pub use generation::{GenerationOrchestrator, GenerationRunner, OrchestratorConfig};
pub use persona::{Persona, PersonaDraft, PersonaGenerationRequest};
