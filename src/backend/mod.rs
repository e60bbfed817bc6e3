//! Backend module for text and image generation
//!
//! This module provides the client abstractions the orchestrators call
//! through, an OpenAI-compatible implementation and a scripted mock.

mod mock;
mod openai;
mod traits;

pub use mock::{MockBackend, MockConfig, WhenExhausted};
pub use openai::{OpenAiClient, OpenAiConfig};
pub use traits::*;
