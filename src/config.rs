// src/config.rs
// Env-driven configuration. Every value has a default so the service boots with
// nothing but PERPLEXITY_API_KEY set; a .env file is honored when present.

use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration, built once in main and passed into components
/// explicitly. There is no global config instance.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    pub upstream: UpstreamConfig,
    pub server: ServerConfig,
    pub sessions: SessionConfig,
    pub log_level: String,
}

/// Perplexity chat-completions settings. The generation knobs default to the
/// values the service has always sent; overriding them changes every request.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub search_domain: String,
    pub search_recency: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Session eviction limits. Zero disables a limit; with both at zero the store
/// keeps every session for the life of the process and no sweeper runs.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub ttl_secs: u64,
    pub max_sessions: usize,
    pub sweep_interval_secs: u64,
}

fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            let clean_val = val.split('#').next().unwrap_or("").trim();
            match clean_val.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    tracing::warn!("config: {key} = '{val}' failed to parse, using default");
                    default
                }
            }
        }
        Err(_) => default,
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.perplexity.ai".to_string(),
            model: "llama-3.1-sonar-small-128k-online".to_string(),
            max_tokens: 1000,
            temperature: 0.7,
            top_p: 0.9,
            search_domain: "perplexity.ai".to_string(),
            search_recency: "month".to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 0,
            max_sessions: 0,
            sweep_interval_secs: 60,
        }
    }
}

impl UpstreamConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: env_var_or("PERPLEXITY_API_KEY", defaults.api_key),
            base_url: env_var_or("PERPLEXITY_BASE_URL", defaults.base_url),
            model: env_var_or("PERPLEXITY_MODEL", defaults.model),
            max_tokens: env_var_or("PERPLEXITY_MAX_TOKENS", defaults.max_tokens),
            temperature: env_var_or("PERPLEXITY_TEMPERATURE", defaults.temperature),
            top_p: env_var_or("PERPLEXITY_TOP_P", defaults.top_p),
            search_domain: env_var_or("PERPLEXITY_SEARCH_DOMAIN", defaults.search_domain),
            search_recency: env_var_or("PERPLEXITY_SEARCH_RECENCY", defaults.search_recency),
            timeout_secs: env_var_or("PERPLEXITY_TIMEOUT_SECS", defaults.timeout_secs),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.base_url.is_empty() {
            return Err(anyhow::anyhow!("PERPLEXITY_BASE_URL cannot be empty"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(anyhow::anyhow!(
                "PERPLEXITY_TEMPERATURE must be between 0.0 and 2.0"
            ));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(anyhow::anyhow!("PERPLEXITY_TOP_P must be between 0.0 and 1.0"));
        }
        if self.max_tokens == 0 {
            return Err(anyhow::anyhow!("PERPLEXITY_MAX_TOKENS must be positive"));
        }
        // An empty api_key is allowed here; it surfaces as an auth error on the
        // first chat call rather than preventing startup.
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env_var_or("RELAY_HOST", defaults.host),
            port: env_var_or("RELAY_PORT", defaults.port),
        }
    }

    /// Server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl SessionConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ttl_secs: env_var_or("RELAY_SESSION_TTL_SECS", defaults.ttl_secs),
            max_sessions: env_var_or("RELAY_SESSION_CAPACITY", defaults.max_sessions),
            sweep_interval_secs: env_var_or(
                "RELAY_SWEEP_INTERVAL_SECS",
                defaults.sweep_interval_secs,
            ),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.eviction_enabled() && self.sweep_interval_secs == 0 {
            return Err(anyhow::anyhow!(
                "RELAY_SWEEP_INTERVAL_SECS must be positive when eviction is enabled"
            ));
        }
        Ok(())
    }

    pub fn eviction_enabled(&self) -> bool {
        self.ttl_secs > 0 || self.max_sessions > 0
    }

    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_secs > 0).then(|| Duration::from_secs(self.ttl_secs))
    }

    pub fn capacity(&self) -> Option<usize> {
        (self.max_sessions > 0).then_some(self.max_sessions)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl RelayConfig {
    /// Load configuration from the environment, reading a .env file first if
    /// one exists.
    pub fn from_env() -> Self {
        if dotenvy::dotenv().is_err() {
            tracing::debug!("no .env file found, using environment variables and defaults");
        }

        Self {
            upstream: UpstreamConfig::from_env(),
            server: ServerConfig::from_env(),
            sessions: SessionConfig::from_env(),
            log_level: env_var_or("RELAY_LOG_LEVEL", "info".to_string()),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.upstream.validate()?;
        self.sessions.validate()?;
        Ok(())
    }
}
