//! Error types for reddit-persona
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - User-friendly messages with suggestions
//! - Exit codes grouped by pipeline stage

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
    MissingApiKey = 103,

    // Input errors (2xx)
    InvalidUrl = 200,

    // Fetch errors (3xx)
    FetchFailed = 300,
    FetchTimeout = 301,
    FetchRateLimited = 302,
    FetchUpstream = 303,
    FetchMalformed = 304,

    // Synthesis errors (4xx)
    SynthesisFailed = 400,
    SynthesisTimeout = 401,
    SynthesisRejected = 402,

    // Write errors (5xx)
    WriteFailed = 500,
    WritePermission = 501,

    // Internal errors (9xx)
    InternalError = 900,
}

impl ErrorCode {
    /// Get the string code (e.g., "E200")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10, // Config errors
            200..=299 => 20, // Input errors
            300..=399 => 30, // Fetch errors
            400..=499 => 40, // Synthesis errors
            500..=599 => 50, // Write errors
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
    ConfigNotFound { path: PathBuf },

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

    /// Generation service API key absent from the environment
    #[error("Missing API key: environment variable {var} is not set")]
    MissingApiKey { var: String },

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    // ─────────────────────────────────────────────────────────────
    // Input Errors
    // ─────────────────────────────────────────────────────────────

    /// Profile URL does not have the expected shape
    #[error("Invalid Reddit profile URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // Fetch Errors
    // ─────────────────────────────────────────────────────────────

    /// Reddit answered with a non-success status
    #[error("Reddit returned HTTP {status} for {url}")]
    FetchStatus { url: String, status: u16 },

    /// Request to Reddit timed out
    #[error("Request to {url} timed out after {timeout_secs}s")]
    FetchTimeout { url: String, timeout_secs: u64 },

    /// Transport-level failure talking to Reddit
    #[error("Failed to fetch {url}: {message}")]
    FetchFailed { url: String, message: String },

    /// Reddit payload could not be decoded
    #[error("Malformed listing from {url}: {message}")]
    FetchMalformed { url: String, message: String },

    // ─────────────────────────────────────────────────────────────
    // Synthesis Errors
    // ─────────────────────────────────────────────────────────────

    /// Generation service answered with a non-success status
    #[error("Generation service returned HTTP {status}: {message}")]
    SynthesisStatus { status: u16, message: String },

    /// Generation request timed out
    #[error("Generation request timed out after {timeout_secs}s")]
    SynthesisTimeout { timeout_secs: u64 },

    /// Transport or protocol failure talking to the generation service
    #[error("Persona synthesis failed: {message}")]
    SynthesisFailed { message: String },

    // ─────────────────────────────────────────────────────────────
    // Write Errors
    // ─────────────────────────────────────────────────────────────

    /// Persona file could not be written
    #[error("Failed to write persona file: {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
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
            Error::MissingApiKey { .. } => ErrorCode::MissingApiKey,
            Error::Toml(_) => ErrorCode::ConfigParseError,

            Error::InvalidUrl { .. } => ErrorCode::InvalidUrl,

            Error::FetchStatus { status: 429, .. } => ErrorCode::FetchRateLimited,
            Error::FetchStatus { .. } => ErrorCode::FetchUpstream,
            Error::FetchTimeout { .. } => ErrorCode::FetchTimeout,
            Error::FetchFailed { .. } => ErrorCode::FetchFailed,
            Error::FetchMalformed { .. } => ErrorCode::FetchMalformed,

            Error::SynthesisStatus { status, .. } if is_transient_status(*status) => {
                ErrorCode::SynthesisFailed
            }
            Error::SynthesisStatus { .. } => ErrorCode::SynthesisRejected,
            Error::SynthesisTimeout { .. } => ErrorCode::SynthesisTimeout,
            Error::SynthesisFailed { .. } => ErrorCode::SynthesisFailed,

            Error::Write { source, .. } => match source.kind() {
                std::io::ErrorKind::PermissionDenied => ErrorCode::WritePermission,
                _ => ErrorCode::WriteFailed,
            },

            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Check if the error is worth another attempt under a retry policy
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::FetchStatus { status, .. } => is_transient_status(*status),
            Error::SynthesisStatus { status, .. } => is_transient_status(*status),
            Error::FetchTimeout { .. }
            | Error::FetchFailed { .. }
            | Error::SynthesisTimeout { .. }
            | Error::SynthesisFailed { .. } => true,
            _ => false,
        }
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
                "Run 'reddit-persona config init' to create a default configuration file.",
            ),
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. Run 'reddit-persona config validate' to see details.",
            ),
            Error::ConfigValidation { .. } => Some(
                "Review the configuration file and fix the invalid values.",
            ),
            Error::MissingApiKey { .. } => Some(
                "Export your API key, e.g. 'export OPENAI_API_KEY=sk-...', and run again.",
            ),

            Error::InvalidUrl { .. } => Some(
                "Use a profile URL of the form https://www.reddit.com/user/<username>/",
            ),

            Error::FetchStatus { status: 429, .. } => Some(
                "Reddit is rate limiting requests. Wait a minute or raise 'request_delay_ms'.",
            ),
            Error::FetchStatus { .. } | Error::FetchFailed { .. } | Error::FetchTimeout { .. } => {
                Some("Check your network connection. Reddit may be temporarily unavailable.")
            }

            Error::SynthesisStatus { status: 401, .. } => Some(
                "The generation service rejected the API key. Verify OPENAI_API_KEY.",
            ),
            Error::SynthesisStatus { .. }
            | Error::SynthesisFailed { .. }
            | Error::SynthesisTimeout { .. } => Some(
                "The generation service is unavailable. Check [generation] base_url and model, then retry.",
            ),

            Error::Write { .. } => Some(
                "Choose a writable location with --output-dir and make sure the disk is not full.",
            ),

            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let mut output = format!(
            "\x1b[31mError [{}]\x1b[0m: {}\n",
            self.code().as_str(),
            self
        );

        if let Some(hint) = self.suggestion() {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        format!("[{}] {}", self.code().as_str(), self)
    }
}

/// 429 and 5xx are the statuses worth retrying
pub fn is_transient_status(status: u16) -> bool {
    status == 429 || (500..=599).contains(&status)
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn config_parse(message: impl Into<String>) -> Self {
        Error::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_validation(message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: None,
        }
    }

    pub fn config_field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn synthesis_failed(message: impl Into<String>) -> Self {
        Error::SynthesisFailed {
            message: message.into(),
        }
    }

    /// Classify a reqwest failure against Reddit
    pub fn from_fetch(url: &str, timeout_secs: u64, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::FetchTimeout {
                url: url.to_string(),
                timeout_secs,
            }
        } else if err.is_decode() {
            Error::FetchMalformed {
                url: url.to_string(),
                message: err.to_string(),
            }
        } else {
            Error::FetchFailed {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// Classify a reqwest failure against the generation service
    pub fn from_synthesis(timeout_secs: u64, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::SynthesisTimeout { timeout_secs }
        } else {
            Error::SynthesisFailed {
                message: err.to_string(),
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
