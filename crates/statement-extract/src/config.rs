//! Configuration for the extraction service

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::generation::GenerationParams;

/// Environment variable naming an optional TOML config file
pub const CONFIG_PATH_ENV: &str = "STATEMENT_EXTRACT_CONFIG";

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExtractConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Caller authentication
    #[serde(default)]
    pub auth: AuthConfig,
    /// Gemini backend configuration
    #[serde(default)]
    pub gemini: GeminiConfig,
    /// Readiness polling and deadlines
    #[serde(default)]
    pub polling: PollingConfig,
    /// Local upload storage
    #[serde(default)]
    pub storage: StorageConfig,
}

impl ExtractConfig {
    /// Load configuration: `.env`, optional TOML file, then environment overrides
    pub fn load() -> Result<Self> {
        if dotenvy::dotenv().is_err() {
            tracing::debug!("No .env file found, using process environment only");
        }

        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("PORT") {
            self.server.port = parse_env("PORT", &port)?;
        }
        if let Some(origins) = get("CORS_ORIGINS") {
            self.server.allowed_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(size) = get("MAX_UPLOAD_BYTES") {
            self.server.max_upload_size = parse_env("MAX_UPLOAD_BYTES", &size)?;
        }
        if let Some(key) = get("API_KEY") {
            self.auth.api_key = Secret::new(key);
        }
        if let Some(key) = get("GEMINI_API_KEY") {
            self.gemini.api_key = Secret::new(key);
        }
        if let Some(model) = get("GEMINI_MODEL") {
            self.gemini.model = model;
        }
        if let Some(url) = get("GEMINI_BASE_URL") {
            self.gemini.base_url = url;
        }
        if let Some(secs) = get("POLL_INTERVAL_SECS") {
            self.polling.interval_secs = parse_env("POLL_INTERVAL_SECS", &secs)?;
        }
        if let Some(attempts) = get("POLL_MAX_ATTEMPTS") {
            self.polling.max_attempts = Some(parse_env("POLL_MAX_ATTEMPTS", &attempts)?);
        }
        if let Some(secs) = get("POLL_MAX_WAIT_SECS") {
            self.polling.max_wait_secs = Some(parse_env("POLL_MAX_WAIT_SECS", &secs)?);
        }
        if let Some(secs) = get("REQUEST_DEADLINE_SECS") {
            self.polling.request_deadline_secs = Some(parse_env("REQUEST_DEADLINE_SECS", &secs)?);
        }
        if let Some(dir) = get("UPLOAD_DIR") {
            self.storage.upload_dir = PathBuf::from(dir);
        }

        Ok(())
    }

    /// Reject configurations the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.auth.api_key.is_empty() {
            return Err(Error::Config("API_KEY environment variable is required".to_string()));
        }
        if self.gemini.api_key.is_empty() {
            return Err(Error::Config(
                "GEMINI_API_KEY environment variable is required".to_string(),
            ));
        }
        if self.polling.interval_secs == 0 {
            return Err(Error::Config("Poll interval must be at least 1 second".to_string()));
        }
        if self.polling.max_attempts == Some(0) {
            return Err(Error::Config("Poll attempt limit must be at least 1".to_string()));
        }
        if self.server.max_upload_size == 0 {
            return Err(Error::Config("Maximum upload size must be positive".to_string()));
        }
        Ok(())
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", key, e)))
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Origins allowed by CORS. Empty allows any origin without credentials.
    pub allowed_origins: Vec<String>,
    /// Maximum upload size in bytes (default: 20MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            allowed_origins: vec![
                "https://textify-pdf-helper.lovable.app".to_string(),
                "https://magical-pasca-4b7eba.netlify.app".to_string(),
                "http://localhost:3000".to_string(),
            ],
            max_upload_size: 20 * 1024 * 1024, // 20MB
        }
    }
}

/// Caller authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Bearer token callers must present
    #[serde(default)]
    pub api_key: Secret,
}

/// Gemini backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key sent as `x-goog-api-key`
    #[serde(default)]
    pub api_key: Secret,
    /// API base URL
    pub base_url: String,
    /// Generation model name
    pub model: String,
    /// Timeout for a single HTTP request to the backend, in seconds
    pub http_timeout_secs: u64,
    /// Sampling parameters for the extraction call
    #[serde(default)]
    pub generation: GenerationParams,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: Secret::default(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.0-flash".to_string(),
            http_timeout_secs: 300,
            generation: GenerationParams::default(),
        }
    }
}

/// Readiness polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Delay between status checks (default: 10s)
    pub interval_secs: u64,
    /// Give up after this many status checks per file (default: unbounded)
    #[serde(default)]
    pub max_attempts: Option<u32>,
    /// Give up after waiting this long per file (default: unbounded)
    #[serde(default)]
    pub max_wait_secs: Option<u64>,
    /// Deadline for polling plus inference of one request (default: none)
    #[serde(default)]
    pub request_deadline_secs: Option<u64>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            max_attempts: None,
            max_wait_secs: None,
            request_deadline_secs: None,
        }
    }
}

impl PollingConfig {
    /// Delay between status checks
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Per-file wait bound, if any
    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_secs.map(Duration::from_secs)
    }

    /// Per-request deadline, if any
    pub fn request_deadline(&self) -> Option<Duration> {
        self.request_deadline_secs.map(Duration::from_secs)
    }
}

/// Local upload storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory temporary uploads are written to
    pub upload_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: std::env::temp_dir().join("statement-extract"),
        }
    }
}

/// String secret that never shows up in `Debug` output
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret value
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether no secret is configured
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("Secret(<unset>)")
        } else {
            f.write_str("Secret(<redacted>)")
        }
    }
}
