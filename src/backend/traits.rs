//! Backend trait definitions
//!
//! Text and image generation are separate seams so the orchestrators can be
//! driven by a real endpoint or a scripted mock.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

// ─────────────────────────────────────────────────────────────────
// Requests
// ─────────────────────────────────────────────────────────────────

/// One text-generation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Upper bound on output tokens
    pub max_tokens: u32,
}

/// One image-generation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRequest {
    /// Natural-language image prompt
    pub prompt: String,

    /// Persona the image is for
    pub persona_id: String,
}

// ─────────────────────────────────────────────────────────────────
// Client Traits
// ─────────────────────────────────────────────────────────────────

/// A text-generation endpoint.
///
/// Implementations return the raw text payload; extracting the persona JSON
/// is the parser's job. Timeouts are applied by the caller.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Whether credentials are configured. Checked once per batch.
    fn has_credentials(&self) -> bool;

    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// An image-generation endpoint.
#[async_trait]
pub trait ImageClient: Send + Sync {
    fn name(&self) -> &'static str;

    /// Generate one image and return its URL.
    async fn generate_image(&self, request: &ImageRequest) -> Result<String>;
}
