//! Common test utilities and fixtures
//!
//! This module provides shared test infrastructure

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use persona_forge::context::{ContextResolver, ContextStore};
use persona_forge::persona::PersonaGenerationRequest;

/// Get the path to the test fixtures directory
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Get a path to a specific fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

/// Get the valid config fixture path
pub fn valid_config_fixture() -> PathBuf {
    fixture_path("valid_config.toml")
}

/// Get the invalid config fixture path
pub fn invalid_config_fixture() -> PathBuf {
    fixture_path("invalid_config.toml")
}

/// Bundled institution contexts
pub fn contexts() -> Arc<dyn ContextResolver> {
    Arc::new(ContextStore::bundled().expect("bundled institutions parse"))
}

/// A request for `count` supply chain personas
pub fn scm_request(count: usize) -> PersonaGenerationRequest {
    PersonaGenerationRequest::new(
        "Mid-career supply chain professionals considering an online master's degree",
        "msu",
        vec!["scm".to_string()],
        count,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_exist() {
        assert!(fixtures_dir().exists(), "Fixtures directory should exist");
        assert!(valid_config_fixture().exists());
        assert!(invalid_config_fixture().exists());
        assert!(fixture_path("persona_valid.json").exists());
    }
}
