//! Institution context: programs, messaging and brand data that ground prompts.

pub mod store;
pub mod types;

pub use store::{ContextResolver, ContextStore};
pub use types::{MessagingFramework, ProgramData, UniversityContext};
