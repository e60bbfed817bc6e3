//! Persona records and the per-draft pipeline stages.
//!
//! Stages run in order on each item: prompt construction, response parsing,
//! sanitize and validate, deduplication, enrichment. The fallback synthesizer
//! replaces the first four when generation attempts are exhausted.

pub mod dedup;
pub mod enrich;
pub mod fallback;
pub mod parser;
pub mod prompt;
pub mod templates;
pub mod types;
pub mod validator;

pub use dedup::{find_duplicates, similarity, DuplicateCheck, DUPLICATE_THRESHOLD};
pub use enrich::Enricher;
pub use fallback::FallbackSynthesizer;
pub use parser::parse;
pub use prompt::{PromptBuilder, PromptPair};
pub use templates::PromptTemplate;
pub use types::{
    IntelligenceLevel, Ownership, Persona, PersonaDraft, PersonaField, PersonaGenerationRequest,
    PersonaStatus, PersonaView, Provenance, TextList,
};
pub use validator::{QualityGrade, QualityReport, ValidationResult, Validator};
