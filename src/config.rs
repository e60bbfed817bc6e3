//! Configuration system for Persona Forge
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (PERSONA_FORGE_* prefix, plus OPENAI_API_KEY)
//! 3. Configuration file (TOML)
//! 4. Default values

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::backend::OpenAiConfig;
use crate::error::{Error, Result};
use crate::generation::{BackoffKind, OrchestratorConfig, RetryPolicy, ValidationPolicy};
use crate::images::{BackfillConfig, DEFAULT_PLACEHOLDER_BASE};
use crate::persona::{IntelligenceLevel, Ownership};

const ENV_PREFIX: &str = "PERSONA_FORGE_";

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    /// Batch generation, retry and validation policy
    pub generation: GenerationSettings,

    /// OpenAI-compatible text and image endpoint
    pub openai: OpenAiConfig,

    /// Avatar backfill
    pub images: ImageSettings,

    /// Institution context sources
    pub context: ContextSettings,

    /// Data storage paths
    pub storage: StorageSettings,

    /// Owner stamped onto persisted personas
    pub ownership: Ownership,

    /// Logging configuration
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Attempts per persona before falling back (1-10)
    pub max_attempts: u32,

    /// Timeout for one generation call in seconds
    pub timeout_secs: u64,

    /// Sampling temperature (0.0-2.0)
    pub temperature: f32,

    pub max_tokens: u32,

    pub backoff: BackoffKind,

    /// Base delay the backoff schedule grows from
    pub backoff_base_ms: u64,

    pub validation_policy: ValidationPolicy,

    /// Retry model drafts that duplicate an earlier draft of the same batch
    pub reject_duplicates: bool,

    pub default_intelligence_level: IntelligenceLevel,

    pub default_institution: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    /// Wait between consecutive image requests in milliseconds
    pub spacing_ms: u64,

    /// Base URL for placeholder avatars
    pub placeholder_base_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextSettings {
    /// Extra institution TOML files
    pub institutions_dir: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Base data directory
    pub data_dir: String,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (empty = no file logging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Maximum log file size in MB before rotation
    pub max_file_size_mb: u64,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

// Default implementations

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout_secs: 30,
            temperature: 0.7,
            max_tokens: 2000,
            backoff: BackoffKind::Exponential,
            backoff_base_ms: 1000,
            validation_policy: ValidationPolicy::RetryOnInvalid,
            reject_duplicates: true,
            default_intelligence_level: IntelligenceLevel::Basic,
            default_institution: "msu".to_string(),
        }
    }
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            spacing_ms: 2000,
            placeholder_base_url: DEFAULT_PLACEHOLDER_BASE.to_string(),
        }
    }
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            institutions_dir: "~/.persona-forge/institutions".to_string(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.persona-forge".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            max_file_size_mb: 100,
            max_files: 5,
            json_format: false,
        }
    }
}

impl ForgeConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        // 1. Load from config file if it exists
        if let Some(path) = Self::find_config_file(config_path)? {
            debug!(path = %path.display(), "Loading configuration file");
            let content = fs::read_to_string(&path).map_err(|e| Error::io_read(&path, e))?;
            config = Self::from_toml(&content, &path)?;
            info!(path = %path.display(), "Configuration loaded from file");
        }

        // 2. Apply environment variable overrides
        config.apply_overrides(|key| std::env::var(key).ok())?;

        // 3. Expand paths
        config.expand_paths();

        // 4. Validate
        config.validate()?;

        Ok(config)
    }

    fn from_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::config_parse(format!("Failed to parse {}", path.display()), e))
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        // If explicit path provided, use it (error if not found)
        if let Some(path) = explicit_path {
            let path = PathBuf::from(expand_path(path));
            if path.exists() {
                return Ok(Some(path));
            }
            return Err(Error::config_not_found(path));
        }

        let search_paths = [
            PathBuf::from("persona-forge.toml"),
            dirs::config_dir()
                .map(|p| p.join("persona-forge").join("config.toml"))
                .unwrap_or_default(),
            dirs::home_dir()
                .map(|p| p.join(".persona-forge").join("config.toml"))
                .unwrap_or_default(),
        ];

        for path in &search_paths {
            if !path.as_os_str().is_empty() && path.exists() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path.clone()));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Apply overrides from a variable lookup, normally the process
    /// environment.
    pub fn apply_overrides<F>(&mut self, get: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| get(&format!("{}{}", ENV_PREFIX, name));
        let flag = |val: &str| val.eq_ignore_ascii_case("true") || val == "1";

        // Generation settings
        if let Some(n) = var("MAX_ATTEMPTS").and_then(|v| v.parse().ok()) {
            self.generation.max_attempts = n;
        }
        if let Some(n) = var("TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.generation.timeout_secs = n;
        }
        if let Some(n) = var("TEMPERATURE").and_then(|v| v.parse().ok()) {
            self.generation.temperature = n;
        }
        if let Some(val) = var("BACKOFF") {
            self.generation.backoff = val
                .parse()
                .map_err(|e: String| Error::config_field_invalid("generation.backoff", e))?;
        }
        if let Some(val) = var("VALIDATION_POLICY") {
            self.generation.validation_policy = val
                .parse()
                .map_err(|e: String| Error::config_field_invalid("generation.validation_policy", e))?;
        }
        if let Some(val) = var("INTELLIGENCE_LEVEL") {
            self.generation.default_intelligence_level = val.parse().map_err(|e: String| {
                Error::config_field_invalid("generation.default_intelligence_level", e)
            })?;
        }
        if let Some(val) = var("INSTITUTION") {
            self.generation.default_institution = val;
        }

        // OpenAI settings
        if let Some(val) = var("OPENAI_BASE_URL") {
            self.openai.base_url = val;
        }
        if let Some(val) = var("OPENAI_API_KEY") {
            self.openai.api_key = val;
        }
        if let Some(val) = var("OPENAI_MODEL") {
            self.openai.model = val;
        }
        if let Some(val) = var("IMAGE_MODEL") {
            self.openai.image_model = val;
        }
        if self.openai.api_key.trim().is_empty() {
            if let Some(val) = get("OPENAI_API_KEY") {
                self.openai.api_key = val;
            }
        }

        // Image settings
        if let Some(n) = var("IMAGE_SPACING_MS").and_then(|v| v.parse().ok()) {
            self.images.spacing_ms = n;
        }
        if let Some(val) = var("PLACEHOLDER_BASE_URL") {
            self.images.placeholder_base_url = val;
        }

        // Paths
        if let Some(val) = var("INSTITUTIONS_DIR") {
            self.context.institutions_dir = val;
        }
        if let Some(val) = var("DATA_DIR") {
            self.storage.data_dir = val;
        }

        // Ownership
        if let Some(val) = var("ORGANIZATION_ID") {
            self.ownership.organization_id = Some(val);
        }
        if let Some(val) = var("USER_ID") {
            self.ownership.user_id = Some(val);
        }

        // Logging settings
        if let Some(val) = var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Some(val) = var("LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Some(val) = var("LOG_JSON") {
            self.logging.json_format = flag(&val);
        }

        Ok(())
    }

    /// Expand ~ and other path variables
    fn expand_paths(&mut self) {
        self.storage.data_dir = expand_path(&self.storage.data_dir);
        self.context.institutions_dir = expand_path(&self.context.institutions_dir);

        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        check_url("openai.base_url", &self.openai.base_url)?;
        check_url("images.placeholder_base_url", &self.images.placeholder_base_url)?;

        let generation = &self.generation;
        if !(1..=10).contains(&generation.max_attempts) {
            return Err(Error::config_field_invalid(
                "generation.max_attempts",
                "must be between 1 and 10",
            ));
        }
        if !(0.0..=2.0).contains(&generation.temperature) {
            return Err(Error::config_field_invalid(
                "generation.temperature",
                "must be between 0.0 and 2.0",
            ));
        }
        if generation.timeout_secs == 0 {
            return Err(Error::config_field_invalid(
                "generation.timeout_secs",
                "must be greater than 0",
            ));
        }
        if generation.max_tokens == 0 {
            return Err(Error::config_field_invalid(
                "generation.max_tokens",
                "must be greater than 0",
            ));
        }
        if generation.default_institution.trim().is_empty() {
            return Err(Error::config_field_invalid(
                "generation.default_institution",
                "cannot be empty",
            ));
        }

        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::config_field_invalid(
                "logging.level",
                format!(
                    "invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            ));
        }

        Ok(())
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        let generation = &self.generation;
        OrchestratorConfig {
            retry: RetryPolicy {
                max_attempts: generation.max_attempts,
                backoff: generation.backoff,
                base_delay: Duration::from_millis(generation.backoff_base_ms),
                validation: generation.validation_policy,
            },
            timeout: Duration::from_secs(generation.timeout_secs),
            temperature: generation.temperature,
            max_tokens: generation.max_tokens,
            reject_duplicates: generation.reject_duplicates,
        }
    }

    pub fn backfill_config(&self) -> BackfillConfig {
        BackfillConfig {
            spacing: Duration::from_millis(self.images.spacing_ms),
            placeholder_base_url: self.images.placeholder_base_url.clone(),
            seed: None,
        }
    }

    /// Get the data directory as a PathBuf
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.data_dir)
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.data_dir().join("sessions")
    }

    pub fn personas_path(&self) -> PathBuf {
        self.data_dir().join("personas.json")
    }

    pub fn institutions_dir(&self) -> PathBuf {
        PathBuf::from(&self.context.institutions_dir)
    }

    /// Effective configuration as TOML with the API key masked.
    pub fn to_display_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        shown.openai.api_key = mask_secret(&shown.openai.api_key);
        Ok(toml::to_string_pretty(&shown)?)
    }
}

fn check_url(field: &str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value)
        .map_err(|e| Error::config_field_invalid(field, format!("'{}' is not a valid URL: {}", value, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::config_field_invalid(field, "URL must use http:// or https://"));
    }
    Ok(())
}

/// Keep the first four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let visible: String = secret.chars().take(4).collect();
    format!("{}****", visible)
}

/// Expand ~ and environment variables in paths
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or_else(|_| std::borrow::Cow::Borrowed(path))
        .into_owned()
}

pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".persona-forge")
        .join("config.toml")
}

/// Initialize a new configuration file
pub fn init_config(path: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = path
        .map(|p| PathBuf::from(expand_path(p)))
        .unwrap_or_else(default_config_path);

    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::io_write(parent, e))?;
        }
    }

    fs::write(&config_path, generate_default_config())
        .map_err(|e| Error::io_write(&config_path, e))?;

    Ok(config_path)
}

/// Generate default configuration content with comments
fn generate_default_config() -> String {
    r#"# Persona Forge Configuration

[generation]
# Attempts per persona before the template fallback is used (1-10)
max_attempts = 3

# Timeout for a single generation call in seconds
timeout_secs = 30

# Sampling temperature (0.0-2.0)
temperature = 0.7
max_tokens = 2000

# Delay between attempts: "exponential" (2s, 4s, ...) or "linear" (1s, 2s, ...)
backoff = "exponential"
backoff_base_ms = 1000

# "retry-on-invalid" retries drafts with validation errors.
# "accept-with-warnings" sends them straight to the fallback.
validation_policy = "retry-on-invalid"

# Retry drafts that duplicate an earlier persona of the same batch
reject_duplicates = true

# basic, advanced or expert
default_intelligence_level = "basic"
default_institution = "msu"

[openai]
base_url = "https://api.openai.com/v1"

# Leave empty to read OPENAI_API_KEY from the environment
api_key = ""

model = "gpt-4o-mini"
image_model = "dall-e-3"
image_size = "1024x1024"
image_quality = "standard"
image_timeout_secs = 120

[images]
# Wait between image requests in milliseconds
spacing_ms = 2000
placeholder_base_url = "https://api.dicebear.com/7.x"

[context]
# Additional institution files (*.toml)
institutions_dir = "~/.persona-forge/institutions"

[storage]
# Personas and generation sessions are stored here
data_dir = "~/.persona-forge"

[ownership]
# organization_id = "org-123"
# user_id = "user-456"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (comment out to disable file logging)
# file = "~/.persona-forge/logs/persona-forge.log"

# Maximum log file size in MB before rotation
max_file_size_mb = 100

# Number of rotated log files to keep
max_files = 5

# Enable JSON formatted logging
json_format = false
"#
    .to_string()
}
