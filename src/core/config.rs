//! Configuration for the chat backend.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::core::errors::{BotError, BotResult};

/// Top-level configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BotConfig {
    /// Session store settings.
    pub session: SessionConfig,
    /// Expiry sweeper settings.
    pub sweeper: SweeperConfig,
    /// Catalog client settings.
    pub catalog: CatalogConfig,
    /// Language-model client settings.
    pub llm: LlmConfig,
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Behavior profile selection.
    pub profile: ProfileConfig,
}

impl BotConfig {
    /// Build a configuration from defaults overridden by `STOREBOT_*`
    /// environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("STOREBOT_SESSION_TIMEOUT_SECS")
            && let Ok(parsed) = value.parse()
        {
            config.session.timeout_seconds = parsed;
        }
        if let Ok(value) = std::env::var("STOREBOT_SWEEP_INTERVAL_SECS")
            && let Ok(parsed) = value.parse()
        {
            config.sweeper.interval_seconds = parsed;
        }
        if let Ok(value) = std::env::var("STOREBOT_CATALOG_URL") {
            config.catalog.base_url = value;
        }
        if let Ok(value) = std::env::var("STOREBOT_CATALOG_TOKEN") {
            config.catalog.access_token = Some(value);
        }
        if let Ok(value) = std::env::var("STOREBOT_LLM_URL") {
            config.llm.base_url = value;
        }
        if let Ok(value) = std::env::var("STOREBOT_LLM_API_KEY") {
            config.llm.api_key = Some(value);
        }
        if let Ok(value) = std::env::var("STOREBOT_LLM_MODEL") {
            config.llm.model = value;
        }
        if let Ok(value) = std::env::var("STOREBOT_PORT")
            && let Ok(parsed) = value.parse()
        {
            config.server.port = parsed;
        }
        if let Ok(value) = std::env::var("STOREBOT_PROFILE") {
            config.profile.active = value;
        }

        config
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> BotResult<()> {
        if self.session.max_history == 0 {
            return Err(BotError::InvalidConfig(
                "session.max_history must be > 0".to_string(),
            ));
        }

        if self.session.timeout_seconds == 0 {
            return Err(BotError::InvalidConfig(
                "session.timeout_seconds must be > 0".to_string(),
            ));
        }

        if self.sweeper.interval_seconds == 0 {
            return Err(BotError::InvalidConfig(
                "sweeper.interval_seconds must be > 0".to_string(),
            ));
        }

        if self.catalog.search_limit == 0 {
            return Err(BotError::InvalidConfig(
                "catalog.search_limit must be > 0".to_string(),
            ));
        }

        if self.llm.max_tokens == 0 {
            return Err(BotError::InvalidConfig(
                "llm.max_tokens must be > 0".to_string(),
            ));
        }

        if !self.catalog.base_url.is_empty() {
            Url::parse(&self.catalog.base_url)?;
        }
        Url::parse(&self.llm.base_url)?;

        Ok(())
    }
}

/// Session store settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum retained messages per session; the oldest are evicted first.
    pub max_history: usize,
    /// Idle seconds after which a session expires.
    pub timeout_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_history: 20,
            timeout_seconds: 30 * 60,
        }
    }
}

/// Expiry sweeper settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SweeperConfig {
    /// Interval between sweeps (in seconds).
    pub interval_seconds: u64,
    /// Whether the background sweeper runs at all.
    pub enabled: bool,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 5 * 60,
            enabled: true,
        }
    }
}

/// Catalog client settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Storefront API base URL.
    pub base_url: String,
    /// Storefront access token.
    pub access_token: Option<String>,
    /// Result cap for product searches.
    pub search_limit: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            access_token: None,
            search_limit: 5,
        }
    }
}

/// Language-model client settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Chat-completions API base URL.
    pub base_url: String,
    /// API key; requests fail with a missing-credential error when unset.
    pub api_key: Option<String>,
    /// Model identifier.
    pub model: String,
    /// Completion token budget.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
    /// Client-side request cap per minute.
    pub rate_limit_per_minute: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            max_tokens: 500,
            temperature: 0.7,
            rate_limit_per_minute: 30,
        }
    }
}

/// HTTP server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen port.
    pub port: u16,
    /// Directory served at the root path (widget assets).
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            static_dir: "static".to_string(),
        }
    }
}

/// Behavior profile selection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Name of the active profile in the registry.
    pub active: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            active: "ecommerce".to_string(),
        }
    }
}
