//! Avatar images for saved personas.

mod backfill;
mod placeholder;
mod prompt;

pub use backfill::{AvatarOutcome, BackfillConfig, BackfillReport, ImageBackfillOrchestrator};
pub use placeholder::{placeholder_avatar, DEFAULT_PLACEHOLDER_BASE, PLACEHOLDER_STYLES};
pub use prompt::{age_description, build_image_prompt};
