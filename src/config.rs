//! Configuration handling for the query service.
//!
//! This module provides configuration management via CLI arguments and environment variables.
//! Configuration is read once at startup and passed by reference afterwards; nothing in the
//! request path reads the environment.

use crate::error::{PipelineError, PipelineResult};
use crate::models::{DatabaseType, masked_connection_string};
use clap::Parser;
use std::time::Duration;

pub const DEFAULT_HTTP_HOST: &str = "0.0.0.0";
pub const DEFAULT_HTTP_PORT: u16 = 8000;
pub const DEFAULT_ALLOWED_ORIGINS: &str = "*";

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_LLM_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_MAX_TOKENS: u32 = 512;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

/// Configuration for the query service.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "askdb-server",
    about = "Answers natural-language questions about the invoice database with read-only SQL",
    version,
    author
)]
pub struct Config {
    /// Database connection URL (postgres://... or sqlite:...)
    #[arg(long, value_name = "URL", env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// API key for the generative backend. When absent, the keyword heuristic is used.
    #[arg(long, value_name = "KEY", env = "GROQ_API_KEY", hide_env_values = true)]
    pub groq_api_key: Option<String>,

    /// Base URL of the OpenAI-compatible chat completions API
    #[arg(long, default_value = DEFAULT_LLM_BASE_URL, env = "LLM_BASE_URL")]
    pub llm_base_url: String,

    /// Model name sent to the generative backend
    #[arg(long, default_value = DEFAULT_LLM_MODEL, env = "LLM_MODEL")]
    pub llm_model: String,

    /// Sampling temperature for SQL generation
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE, env = "LLM_TEMPERATURE")]
    pub temperature: f32,

    /// Maximum tokens the backend may generate
    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS, env = "LLM_MAX_TOKENS")]
    pub max_tokens: u32,

    /// HTTP host to bind to
    #[arg(long, default_value = DEFAULT_HTTP_HOST, env = "HTTP_HOST")]
    pub http_host: String,

    /// HTTP port to bind to
    #[arg(short, long, default_value_t = DEFAULT_HTTP_PORT, env = "PORT")]
    pub port: u16,

    /// Comma-separated list of allowed CORS origins ("*" allows any origin)
    #[arg(long, default_value = DEFAULT_ALLOWED_ORIGINS, env = "ALLOWED_ORIGINS")]
    pub allowed_origins: String,

    /// Maximum pooled database connections (SQLite always uses 1)
    #[arg(long, default_value_t = DEFAULT_MAX_CONNECTIONS, env = "DB_MAX_CONNECTIONS")]
    pub max_connections: u32,

    /// Connection and schema inspection timeout in seconds
    #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS, env = "CONNECT_TIMEOUT")]
    pub connect_timeout: u64,

    /// Generative backend timeout in seconds
    #[arg(long, default_value_t = DEFAULT_BACKEND_TIMEOUT_SECS, env = "BACKEND_TIMEOUT")]
    pub backend_timeout: u64,

    /// Query execution timeout in seconds
    #[arg(long, default_value_t = DEFAULT_QUERY_TIMEOUT_SECS, env = "QUERY_TIMEOUT")]
    pub query_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// Parse configuration from command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            database_url: None,
            groq_api_key: None,
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            http_host: DEFAULT_HTTP_HOST.to_string(),
            port: DEFAULT_HTTP_PORT,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_SECS,
            backend_timeout: DEFAULT_BACKEND_TIMEOUT_SECS,
            query_timeout: DEFAULT_QUERY_TIMEOUT_SECS,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// Get the database URL, failing if none is configured.
    pub fn database_url(&self) -> PipelineResult<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PipelineError::configuration("DATABASE_URL not set"))
    }

    /// Detect the database type from the configured URL.
    pub fn database_type(&self) -> PipelineResult<DatabaseType> {
        let url = self.database_url()?;
        DatabaseType::from_connection_string(url).ok_or_else(|| {
            PipelineError::configuration(format!(
                "Unsupported database URL scheme: {}",
                masked_connection_string(url)
            ))
        })
    }

    /// Database URL with the password masked, for logging.
    pub fn masked_database_url(&self) -> Option<String> {
        self.database_url
            .as_deref()
            .map(masked_connection_string)
    }

    /// The backend credential, if one is configured. Blank keys count as absent.
    pub fn backend_credential(&self) -> Option<&str> {
        self.groq_api_key
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Parsed CORS origins. An empty list means any origin is allowed.
    pub fn allowed_origin_list(&self) -> Vec<String> {
        let origins: Vec<String> = self
            .allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect();

        if origins.iter().any(|o| o == "*") {
            Vec::new()
        } else {
            origins
        }
    }

    /// Get the connect timeout as a Duration.
    pub fn connect_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    /// Get the backend timeout as a Duration.
    pub fn backend_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.backend_timeout)
    }

    /// Get the query timeout as a Duration.
    pub fn query_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.query_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
