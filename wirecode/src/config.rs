//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable
//! overrides. The configuration file path defaults to `config.yaml` but can be
//! specified via `-f` flag or `WIRECODE_CONFIG` environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources
//! override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `WIRECODE_` override
//!    YAML values; nested keys use double underscores
//!    (`WIRECODE_AI__BASE_URL=...` sets `ai.base_url`)
//! 3. **DATABASE_URL** - Special case: overrides `database.url` if set
//! 4. **OPENROUTER_API_KEY** - Special case: fills `ai.api_key` if unset
//!
//! ```bash
//! # Override server port
//! WIRECODE_PORT=8080
//!
//! # Point the AI client at a different OpenAI-compatible backend
//! WIRECODE_AI__BASE_URL="https://openrouter.ai/api/v1"
//! OPENROUTER_API_KEY="sk-or-..."
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "WIRECODE_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// All fields have sensible defaults defined in the `Default` implementation,
/// so an empty config file is a valid starting point.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// Upstream AI completion service configuration
    pub ai: AiConfig,
    /// Credit system configuration
    pub credits: CreditsConfig,
    /// Rate limit policy points
    pub limits: LimitsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            ai: AiConfig::default(),
            credits: CreditsConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite connection URL; the file is created if missing
    pub url: String,
    /// Maximum number of pooled connections
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://wirecode.db".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Trusted proxy header carrying the caller's verified identity
    pub proxy_header: ProxyHeaderConfig,
}

/// The identity provider is an external collaborator: a fronting proxy
/// authenticates the user and forwards the verified email in a header.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProxyHeaderConfig {
    /// Header name the proxy sets (lowercase)
    pub header_name: String,
}

impl Default for ProxyHeaderConfig {
    fn default() -> Self {
        Self {
            header_name: "x-wirecode-user".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AiConfig {
    /// Base URL of the OpenAI-compatible completion service
    pub base_url: Url,
    /// Bearer token for the completion service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Completion token budget per generation
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// End-to-end timeout for one generation request
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1"
                .parse()
                .expect("default AI base URL is valid"),
            api_key: None,
            max_tokens: 4000,
            temperature: 0.7,
            request_timeout: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CreditsConfig {
    /// Credit grant for newly created users
    pub initial_credits: i64,
    /// Credits debited per wireframe creation
    pub generation_cost: i64,
    /// When true (production behavior), creation is blocked with 402 once the
    /// balance cannot cover the cost. When false (development override), the
    /// debit clamps at zero and never blocks.
    pub enforce_debits: bool,
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            initial_credits: 3,
            generation_cost: 1,
            enforce_debits: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Rate limit for the "wireframe-creation" action key
    pub wireframe_creation: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Maximum requests per window and caller. 0 means unlimited (the
    /// policy point exists but admits everything).
    pub max_requests: u32,
    /// Fixed window length
    #[serde(with = "humantime_serde")]
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 0,
            window: Duration::from_secs(900),
        }
    }
}

impl Config {
    /// Load configuration from the YAML file and environment overrides.
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Config = Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("WIRECODE_").split("__"))
            .extract()?;

        // DATABASE_URL is the conventional deployment override
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database.url = url;
        }

        // OpenRouter keys are conventionally provided out of band
        if config.ai.api_key.is_none()
            && let Ok(key) = std::env::var("OPENROUTER_API_KEY")
        {
            config.ai.api_key = Some(key);
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), figment::Error> {
        if self.credits.generation_cost < 0 {
            return Err(figment::Error::from("credits.generation_cost must be non-negative".to_string()));
        }
        if self.credits.initial_credits < 0 {
            return Err(figment::Error::from("credits.initial_credits must be non-negative".to_string()));
        }
        Ok(())
    }
}
