//! Configuration system for reddit-persona
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (REDDIT_PERSONA_* prefix)
//! 3. Configuration file (TOML)
//! 4. Default values
//!
//! The generation API key is never read from the file; it always comes from
//! the environment variable named by `generation.api_key_env`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use crate::version;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    /// Reddit listing API settings
    pub reddit: RedditSettings,

    /// Generation service settings
    pub generation: GenerationSettings,

    /// Output settings
    pub output: OutputSettings,

    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Reddit listing API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditSettings {
    /// Base URL of the public JSON API
    pub base_url: String,

    /// User-Agent sent with every request
    pub user_agent: String,

    /// Minimum delay between two requests in milliseconds
    pub request_delay_ms: u64,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Total attempts per request on 429/5xx/timeouts
    pub max_retries: u32,

    /// First backoff delay in milliseconds (doubles per attempt)
    pub retry_base_delay_ms: u64,

    /// Items requested per listing page (1-100)
    pub page_size: u32,
}

/// Generation service (OpenAI-compatible) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// API base URL (e.g., "https://api.openai.com/v1", "http://localhost:11434/v1")
    pub base_url: String,

    /// Name of the environment variable holding the API key
    pub api_key_env: String,

    /// Model identifier
    pub model: String,

    /// Maximum completion tokens
    pub max_tokens: u32,

    /// Sampling temperature (0.0-2.0)
    pub temperature: f32,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Retries after the first attempt on transient failures
    pub max_retries: u32,

    /// Backoff before the retry in milliseconds
    pub retry_base_delay_ms: u64,

    /// Upper bound on the source material embedded in the prompt
    pub max_prompt_chars: usize,

    /// Cross-reference trait keywords against sources when the service gives no citations
    pub keyword_citations: bool,

    /// Below this many sources the persona is flagged as limited
    pub min_items: usize,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Directory persona files are written to
    pub dir: String,

    /// Default maximum number of posts and comments to analyze
    pub max_posts: usize,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
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

impl Default for RedditSettings {
    fn default() -> Self {
        Self {
            base_url: "https://www.reddit.com".to_string(),
            user_agent: version::default_user_agent(),
            request_delay_ms: 1000,
            timeout_secs: 30,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            page_size: 100,
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 1000,
            temperature: 0.7,
            timeout_secs: 120,
            max_retries: 1,
            retry_base_delay_ms: 2000,
            max_prompt_chars: 12_000,
            keyword_citations: true,
            min_items: 5,
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: "output".to_string(),
            max_posts: 100,
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

impl RedditSettings {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries.max(1),
            Duration::from_millis(self.retry_base_delay_ms),
        )
        .with_max_delay(Duration::from_secs(self.timeout_secs.max(1)))
    }
}

impl GenerationSettings {
    /// One initial attempt plus `max_retries` retries
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries + 1,
            Duration::from_millis(self.retry_base_delay_ms),
        )
    }

    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(Error::MissingApiKey {
                var: self.api_key_env.clone(),
            }),
        }
    }
}

impl PersonaConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = Self::find_config_file(config_path)? {
            debug!(path = %path.display(), "Loading configuration file");
            config = Self::from_file(&path)?;
            info!(path = %path.display(), "Configuration loaded from file");
        }

        config.apply_env_overrides();
        config.expand_paths();
        config.validate()?;

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config_parse(format!("Failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse {
            message: format!("{}: {}", path.display(), e.message()),
            source: Some(e),
        })
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit_path {
            let path = PathBuf::from(expand_path(path));
            return if path.exists() {
                Ok(Some(path))
            } else {
                Err(Error::ConfigNotFound { path })
            };
        }

        let search_paths = [
            Some(PathBuf::from("reddit-persona.toml")),
            dirs::config_dir().map(|p| p.join("reddit-persona").join("config.toml")),
            dirs::home_dir().map(|p| p.join(".reddit-persona").join("config.toml")),
        ];

        for path in search_paths.into_iter().flatten() {
            if path.exists() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Reddit settings
        if let Ok(val) = std::env::var("REDDIT_PERSONA_REDDIT_BASE_URL") {
            self.reddit.base_url = val;
        }
        if let Ok(val) = std::env::var("REDDIT_PERSONA_USER_AGENT") {
            self.reddit.user_agent = val;
        }
        if let Some(n) = env_parse("REDDIT_PERSONA_REQUEST_DELAY_MS") {
            self.reddit.request_delay_ms = n;
        }
        if let Some(n) = env_parse("REDDIT_PERSONA_FETCH_RETRIES") {
            self.reddit.max_retries = n;
        }

        // Generation settings
        if let Ok(val) = std::env::var("REDDIT_PERSONA_GENERATION_BASE_URL") {
            self.generation.base_url = val;
        }
        if let Ok(val) = std::env::var("REDDIT_PERSONA_MODEL") {
            self.generation.model = val;
        }
        if let Some(n) = env_parse("REDDIT_PERSONA_GENERATION_TIMEOUT_SECS") {
            self.generation.timeout_secs = n;
        }
        if let Some(n) = env_parse("REDDIT_PERSONA_MAX_PROMPT_CHARS") {
            self.generation.max_prompt_chars = n;
        }
        if let Ok(val) = std::env::var("REDDIT_PERSONA_KEYWORD_CITATIONS") {
            self.generation.keyword_citations = env_flag(&val);
        }

        // Output settings
        if let Ok(val) = std::env::var("REDDIT_PERSONA_OUTPUT_DIR") {
            self.output.dir = val;
        }
        if let Some(n) = env_parse("REDDIT_PERSONA_MAX_POSTS") {
            self.output.max_posts = n;
        }

        // Logging settings
        if let Ok(val) = std::env::var("REDDIT_PERSONA_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("REDDIT_PERSONA_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Ok(val) = std::env::var("REDDIT_PERSONA_LOG_JSON") {
            self.logging.json_format = env_flag(&val);
        }
    }

    /// Expand ~ and other path variables
    fn expand_paths(&mut self) {
        self.output.dir = expand_path(&self.output.dir);
        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        for (field, url) in [
            ("reddit.base_url", &self.reddit.base_url),
            ("generation.base_url", &self.generation.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(Error::config_field_invalid(
                    field,
                    format!("{} must start with http:// or https:// (got '{}')", field, url),
                ));
            }
        }

        if self.reddit.user_agent.trim().is_empty() {
            return Err(Error::config_field_invalid(
                "reddit.user_agent",
                "reddit.user_agent cannot be empty",
            ));
        }

        for (field, value) in [
            ("reddit.request_delay_ms", self.reddit.request_delay_ms),
            ("reddit.timeout_secs", self.reddit.timeout_secs),
            ("generation.timeout_secs", self.generation.timeout_secs),
        ] {
            if value == 0 {
                return Err(Error::config_field_invalid(
                    field,
                    format!("{} must be greater than 0", field),
                ));
            }
        }

        if !(1..=100).contains(&self.reddit.page_size) {
            return Err(Error::config_field_invalid(
                "reddit.page_size",
                "reddit.page_size must be between 1 and 100",
            ));
        }

        if self.generation.max_prompt_chars < 1000 {
            return Err(Error::config_field_invalid(
                "generation.max_prompt_chars",
                "generation.max_prompt_chars must be at least 1000",
            ));
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(Error::config_field_invalid(
                "generation.temperature",
                "generation.temperature must be between 0.0 and 2.0",
            ));
        }

        if self.generation.api_key_env.trim().is_empty() {
            return Err(Error::config_field_invalid(
                "generation.api_key_env",
                "generation.api_key_env cannot be empty",
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::config_field_invalid(
                "logging.level",
                format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            ));
        }

        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn env_flag(val: &str) -> bool {
    val.eq_ignore_ascii_case("true") || val == "1"
}

/// Expand ~ and environment variables in paths
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or(std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Initialize a new configuration file
pub fn init_config(path: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = path
        .map(|p| PathBuf::from(expand_path(p)))
        .unwrap_or_else(|| PathBuf::from("reddit-persona.toml"));

    if config_path.exists() && !force {
        return Err(Error::config_validation(format!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::Write {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    fs::write(&config_path, generate_default_config()).map_err(|e| Error::Write {
        path: config_path.clone(),
        source: e,
    })?;

    Ok(config_path)
}

/// Generate default configuration content with comments
fn generate_default_config() -> String {
    r#"# reddit-persona configuration

[reddit]
# Public JSON API base URL
base_url = "https://www.reddit.com"

# Distinguishing User-Agent (Reddit throttles generic agents)
# user_agent = "reddit-persona/0.1.0 (command-line persona generator)"

# Minimum delay between requests in milliseconds
request_delay_ms = 1000

# Per-request timeout in seconds
timeout_secs = 30

# Attempts per request on HTTP 429/5xx or timeouts
max_retries = 3

# First backoff delay in milliseconds (doubles per attempt)
retry_base_delay_ms = 1000

# Items per listing page (1-100)
page_size = 100

[generation]
# OpenAI-compatible API base URL (OpenAI, Ollama, vLLM, LM Studio, etc.)
base_url = "https://api.openai.com/v1"

# Environment variable holding the API key
api_key_env = "OPENAI_API_KEY"

# Model identifier
model = "gpt-3.5-turbo"

# Completion budget and sampling temperature
max_tokens = 1000
temperature = 0.7

# Request timeout in seconds
timeout_secs = 120

# Retries after the first attempt on transient failures
max_retries = 1
retry_base_delay_ms = 2000

# Upper bound on source text placed in the prompt (oldest items dropped first)
max_prompt_chars = 12000

# Match trait keywords against sources when the model returns no citations
keyword_citations = true

# Below this many sources the persona is flagged as limited
min_items = 5

[output]
# Directory persona files are written to
dir = "output"

# Maximum number of posts and comments to analyze
max_posts = 100

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (comment out to disable file logging)
# file = "~/.reddit-persona/logs/persona.log"

# Maximum log file size in MB before rotation
max_file_size_mb = 100

# Number of rotated log files to keep
max_files = 5

# Enable JSON formatted logging
json_format = false
"#
    .to_string()
}
