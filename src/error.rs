//! Error types for Persona Forge
//!
//! Every failure carries a numeric code (`E1xx` config through `E9xx`
//! internal) that also picks the process exit status. The generation loop
//! asks errors whether they are worth another attempt or end the batch.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,
    MissingCredentials = 103,

    // IO errors (2xx)
    IoRead = 200,
    IoWrite = 201,
    IoPermission = 202,
    IoNotFound = 203,
    Serialization = 204,

    // Upstream errors (3xx)
    NetworkFailed = 300,
    UpstreamTimeout = 301,
    UpstreamRejected = 302,
    AuthenticationFailed = 303,

    // Input errors (4xx)
    ResponseParse = 400,
    InvalidRequest = 401,
    ValidationFailed = 402,

    // Lookup errors (5xx)
    ContextNotFound = 500,
    ProgramNotFound = 501,
    TemplateNotFound = 502,
    SessionNotFound = 503,
    PersonaNotFound = 504,

    // Image errors (6xx)
    ImageGeneration = 600,

    // Internal errors (9xx)
    InternalError = 900,
}

impl ErrorCode {
    /// Get the string code (e.g., "E100")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for CLI (maps to 1-125 range)
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10, // Config errors
            200..=299 => 20, // IO errors
            300..=399 => 30, // Upstream errors
            400..=499 => 40, // Input errors
            500..=599 => 50, // Lookup errors
            600..=699 => 60, // Image errors
            900..=999 => 90, // Internal errors
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration parse error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    /// Generic configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generation endpoint credentials are absent
    #[error("No API credentials configured for {provider}")]
    MissingCredentials { provider: String },

    // ─────────────────────────────────────────────────────────────
    // IO Errors
    // ─────────────────────────────────────────────────────────────

    /// File read error
    #[error("Failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File write error
    #[error("Failed to write file: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Upstream Errors
    // ─────────────────────────────────────────────────────────────

    /// Request could not reach the endpoint
    #[error("Request to {url} failed: {message}")]
    Network { url: String, message: String },

    /// A single generation call exceeded its deadline
    #[error("Generation request timed out after {timeout_secs}s")]
    GenerationTimeout { timeout_secs: u64 },

    /// Endpoint answered with a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Credentials were rejected
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ─────────────────────────────────────────────────────────────
    // Input Errors
    // ─────────────────────────────────────────────────────────────

    /// No usable JSON persona in a model response
    #[error("Failed to parse persona response: {message}")]
    Parse { message: String },

    /// Generation request rejected before any work started
    #[error("Invalid generation request: {message}")]
    InvalidRequest { message: String },

    /// Draft has blocking validation errors
    #[error("Persona failed validation: {}", .errors.join("; "))]
    ValidationFailed { errors: Vec<String> },

    // ─────────────────────────────────────────────────────────────
    // Lookup Errors
    // ─────────────────────────────────────────────────────────────

    /// Unknown institution id
    #[error("University context not found for id: {institution_id}")]
    ContextNotFound { institution_id: String },

    /// None of the requested programs exist for the institution
    #[error("No programs matching [{program_ids}] for institution {institution_id}")]
    ProgramNotFound {
        institution_id: String,
        program_ids: String,
    },

    /// Unknown prompt template id
    #[error("Prompt template not found: {template_id}")]
    TemplateNotFound { template_id: String },

    /// Unknown generation session id
    #[error("Generation session not found: {session_id}")]
    SessionNotFound { session_id: String },

    /// Unknown persona id
    #[error("Persona not found: {persona_id}")]
    PersonaNotFound { persona_id: String },

    // ─────────────────────────────────────────────────────────────
    // Image Errors
    // ─────────────────────────────────────────────────────────────

    /// Image request failed or returned no URL
    #[error("Image generation failed: {message}")]
    ImageGeneration {
        persona_id: Option<String>,
        message: String,
    },

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    // ─────────────────────────────────────────────────────────────
    // Error Classification
    // ─────────────────────────────────────────────────────────────

    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::ConfigValidation { .. } => ErrorCode::ConfigValidation,
            Error::Config(_) => ErrorCode::ConfigValidation,
            Error::MissingCredentials { .. } => ErrorCode::MissingCredentials,

            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::IoWrite { .. } => ErrorCode::IoWrite,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                std::io::ErrorKind::PermissionDenied => ErrorCode::IoPermission,
                _ => ErrorCode::IoRead,
            },
            Error::Toml(_) => ErrorCode::ConfigParseError,
            Error::Json(_) => ErrorCode::Serialization,

            Error::Network { .. } => ErrorCode::NetworkFailed,
            Error::GenerationTimeout { .. } => ErrorCode::UpstreamTimeout,
            Error::Api { .. } => ErrorCode::UpstreamRejected,
            Error::AuthenticationFailed { .. } => ErrorCode::AuthenticationFailed,

            Error::Parse { .. } => ErrorCode::ResponseParse,
            Error::InvalidRequest { .. } => ErrorCode::InvalidRequest,
            Error::ValidationFailed { .. } => ErrorCode::ValidationFailed,

            Error::ContextNotFound { .. } => ErrorCode::ContextNotFound,
            Error::ProgramNotFound { .. } => ErrorCode::ProgramNotFound,
            Error::TemplateNotFound { .. } => ErrorCode::TemplateNotFound,
            Error::SessionNotFound { .. } => ErrorCode::SessionNotFound,
            Error::PersonaNotFound { .. } => ErrorCode::PersonaNotFound,

            Error::ImageGeneration { .. } => ErrorCode::ImageGeneration,

            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Transient failures that another attempt may cure
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network { .. }
            | Error::GenerationTimeout { .. }
            | Error::Parse { .. }
            | Error::ValidationFailed { .. } => true,
            Error::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Failures that end the whole batch
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ConfigNotFound { .. }
                | Error::ConfigParse { .. }
                | Error::ConfigValidation { .. }
                | Error::Config(_)
                | Error::MissingCredentials { .. }
                | Error::AuthenticationFailed { .. }
                | Error::InvalidRequest { .. }
                | Error::ContextNotFound { .. }
                | Error::ProgramNotFound { .. }
                | Error::TemplateNotFound { .. }
                | Error::Internal(_)
        )
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    // ─────────────────────────────────────────────────────────────
    // User-Friendly Messages
    // ─────────────────────────────────────────────────────────────

    /// Get a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ConfigNotFound { .. } => Some(
                "Run 'persona-forge config init' to create a default configuration file."
            ),
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. Run 'persona-forge config validate' to see details."
            ),
            Error::ConfigValidation { .. } => Some(
                "Review the configuration file and fix the invalid values."
            ),
            Error::MissingCredentials { .. } => Some(
                "Set OPENAI_API_KEY (or [openai] api_key in the config file), or pass --offline to use template personas only."
            ),

            Error::Network { .. } => Some(
                "Check your network connection and the [openai] base_url setting."
            ),
            Error::GenerationTimeout { .. } => Some(
                "The generation endpoint is slow to respond. Raise [generation] timeout_secs or try again later."
            ),
            Error::AuthenticationFailed { .. } => Some(
                "The API key was rejected. Verify OPENAI_API_KEY or [openai] api_key."
            ),

            Error::InvalidRequest { .. } => Some(
                "Provide a descriptive --brief, at least one --program and a --count between 1 and 50."
            ),
            Error::ValidationFailed { .. } => Some(
                "Run 'persona-forge validate <file>' to see every error and warning for the persona."
            ),

            Error::ContextNotFound { .. } => Some(
                "Run 'persona-forge institutions list' to see the available institutions."
            ),
            Error::ProgramNotFound { .. } => Some(
                "Run 'persona-forge institutions list' to see the programs offered by each institution."
            ),
            Error::TemplateNotFound { .. } => Some(
                "Run 'persona-forge templates list' to see the available prompt templates."
            ),
            Error::SessionNotFound { .. } => Some(
                "Run 'persona-forge sessions list' to see recorded generation sessions."
            ),

            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let code = self.code();
        let suggestion = self.suggestion();

        let mut output = format!(
            "\x1b[31mError [{}]\x1b[0m: {}\n",
            code.as_str(),
            self
        );

        if let Some(hint) = suggestion {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        format!("[{}] {}", self.code().as_str(), self)
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors (for ergonomic error creation)
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Error::ConfigNotFound {
            path: path.into(),
            source: None,
        }
    }

    pub fn config_parse(message: impl Into<String>, source: toml::de::Error) -> Self {
        Error::ConfigParse {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a config validation error with field name
    pub fn config_field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn missing_credentials(provider: impl Into<String>) -> Self {
        Error::MissingCredentials {
            provider: provider.into(),
        }
    }

    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Network {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Error::Parse {
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Error::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn image(persona_id: Option<&str>, message: impl Into<String>) -> Self {
        Error::ImageGeneration {
            persona_id: persona_id.map(str::to_string),
            message: message.into(),
        }
    }

    pub fn io_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::IoRead {
            path: path.into(),
            source,
        }
    }

    pub fn io_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::IoWrite {
            path: path.into(),
            source,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
