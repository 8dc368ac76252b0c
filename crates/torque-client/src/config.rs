//! # Client Configuration
//!
//! Where the API lives, how requests retry, and the pricing fallback used
//! before settings are loaded from the server.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TORQUE_API_BASE_URL=https://shop.example.com                       │
//! │     TORQUE_RETRIES=2                                                   │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/torque-shop/client.toml (Linux)                          │
//! │     ~/Library/Application Support/com.torque.shop/client.toml (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [api]
//! base_url = "http://localhost:3001"
//! timeout_secs = 30
//!
//! [retry]
//! retries = 2
//! retry_delay_ms = 1000
//! strategy = "constant"   # constant | exponential
//! max_delay_ms = 30000
//!
//! [cache]
//! enabled = true
//! ttl_secs = 300
//!
//! [pricing]
//! taxRate = "0.0875"
//! laborRate = "140"
//! partsMarkup = "0.35"
//! shopSuppliesRate = "0.05"
//! diagnosticFee = "150"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use torque_core::money::lenient;
use torque_core::{validation, Money, Rate, ShopSettings};
use tracing::{debug, info, warn};

use crate::cache::{ResponseCache, DEFAULT_CACHE_TTL};
use crate::error::{ConfigError, ConfigResult};
use crate::retry::{BackoffStrategy, RetryPolicy, DEFAULT_MAX_DELAY, DEFAULT_RETRY_DELAY};

// =============================================================================
// API Settings
// =============================================================================

/// Location of the shop API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL prepended to relative `/api/...` paths by the transport.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout the transport should enforce (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// =============================================================================
// Retry Settings
// =============================================================================

/// Default retry behaviour for controllers built from this config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Retries after the first attempt.
    #[serde(default)]
    pub retries: u32,

    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    #[serde(default)]
    pub strategy: BackoffStrategy,

    /// Ceiling for exponential waits.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

fn default_retry_delay() -> u64 {
    DEFAULT_RETRY_DELAY.as_millis() as u64
}

fn default_max_delay() -> u64 {
    DEFAULT_MAX_DELAY.as_millis() as u64
}

impl Default for RetrySettings {
    fn default() -> Self {
        RetrySettings {
            retries: 0,
            retry_delay_ms: default_retry_delay(),
            strategy: BackoffStrategy::default(),
            max_delay_ms: default_max_delay(),
        }
    }
}

// =============================================================================
// Cache Settings
// =============================================================================

/// Longest accepted cache TTL (one week).
pub const MAX_CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_cache_ttl() -> u64 {
    DEFAULT_CACHE_TTL.as_secs()
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            enabled: true,
            ttl_secs: default_cache_ttl(),
        }
    }
}

// =============================================================================
// Main Client Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub cache: CacheSettings,

    /// Pricing used until the server's settings are loaded, and by the
    /// quote tool.
    #[serde(default)]
    pub pricing: ShopSettings,
}

impl ClientConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (client.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load client config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::SaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::SaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        info!(?path, "Client config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        let url = &self.api.base_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "API base URL must start with http:// or https://, got: {}",
                url
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.cache.enabled && self.cache.ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "cache ttl_secs must be greater than 0 when the cache is enabled".into(),
            ));
        }

        if self.cache.ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(ConfigError::Invalid(format!(
                "cache ttl_secs must be at most {}, got: {}",
                MAX_CACHE_TTL_SECS, self.cache.ttl_secs
            )));
        }

        validation::validate_settings(&self.pricing)?;

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `TORQUE_*` overrides read through `lookup`. Values that do
    /// not parse leave the setting unchanged.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("TORQUE_API_BASE_URL") {
            debug!(url = %url, "Overriding API base URL from environment");
            self.api.base_url = url;
        }

        if let Some(timeout) = lookup("TORQUE_API_TIMEOUT_SECS") {
            if let Ok(t) = timeout.parse::<u64>() {
                self.api.timeout_secs = t;
            }
        }

        if let Some(retries) = lookup("TORQUE_RETRIES") {
            if let Ok(r) = retries.parse::<u32>() {
                debug!(retries = r, "Overriding retries from environment");
                self.retry.retries = r;
            }
        }

        if let Some(delay) = lookup("TORQUE_RETRY_DELAY_MS") {
            if let Ok(d) = delay.parse::<u64>() {
                self.retry.retry_delay_ms = d;
            }
        }

        if let Some(strategy) = lookup("TORQUE_RETRY_STRATEGY") {
            match strategy.parse() {
                Ok(parsed) => self.retry.strategy = parsed,
                Err(_) => warn!(strategy = %strategy, "Unknown retry strategy in environment"),
            }
        }

        if let Some(enabled) = lookup("TORQUE_CACHE_ENABLED") {
            match enabled.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.cache.enabled = true,
                "0" | "false" | "no" | "off" => self.cache.enabled = false,
                _ => warn!(value = %enabled, "Invalid TORQUE_CACHE_ENABLED in environment"),
            }
        }

        if let Some(ttl) = lookup("TORQUE_CACHE_TTL_SECS") {
            if let Ok(t) = ttl.parse::<u64>() {
                self.cache.ttl_secs = t;
            }
        }

        if let Some(rate) = lookup("TORQUE_TAX_RATE") {
            match lenient::parse_decimal(&rate) {
                Some(value) => {
                    debug!(tax_rate = %value, "Overriding tax rate from environment");
                    self.pricing.tax_rate = Rate::new(value);
                }
                None => warn!(value = %rate, "Invalid TORQUE_TAX_RATE in environment"),
            }
        }

        if let Some(rate) = lookup("TORQUE_LABOR_RATE") {
            match lenient::parse_decimal(&rate) {
                Some(value) => self.pricing.labor_rate = Money::new(value),
                None => warn!(value = %rate, "Invalid TORQUE_LABOR_RATE in environment"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "torque", "shop")
            .map(|dirs| dirs.config_dir().join("client.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Retry policy for controllers built from this config.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retry.retries,
            delay: Duration::from_millis(self.retry.retry_delay_ms),
            strategy: self.retry.strategy,
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
        }
    }

    /// A shared response cache, or `None` when caching is disabled.
    pub fn response_cache(&self) -> Option<Arc<ResponseCache>> {
        self.cache
            .enabled
            .then(|| Arc::new(ResponseCache::new(Duration::from_secs(self.cache.ttl_secs))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn temp_config_path() -> PathBuf {
        std::env::temp_dir().join(format!("torque-client-{}.toml", Uuid::new_v4()))
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retry.retries, 0);
        assert_eq!(config.retry.retry_delay_ms, 1000);
        assert_eq!(config.pricing, ShopSettings::default());
        assert!(config.response_cache().is_some());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClientConfig::default();

        config.api.base_url = "ftp://shop".into();
        assert!(config.validate().is_err());

        config.api.base_url = "https://shop.example.com".into();
        assert!(config.validate().is_ok());

        config.cache.ttl_secs = 0;
        assert!(config.validate().is_err());
        config.cache.enabled = false;
        assert!(config.validate().is_ok());

        config.pricing.tax_rate = Rate::from_bps(20_000);
        assert!(matches!(config.validate(), Err(ConfigError::Pricing(_))));
    }

    #[test]
    fn test_cache_ttl_is_bounded() {
        let mut config = ClientConfig::default();

        config.cache.ttl_secs = MAX_CACHE_TTL_SECS;
        assert!(config.validate().is_ok());

        config.cache.ttl_secs = i64::MAX as u64;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("TORQUE_RETRIES", "3"),
            ("TORQUE_RETRY_STRATEGY", "exponential"),
            ("TORQUE_TAX_RATE", "0.0725"),
            ("TORQUE_CACHE_ENABLED", "off"),
            ("TORQUE_API_BASE_URL", "https://shop.example.com"),
        ]);

        let mut config = ClientConfig::default();
        config.apply_overrides(|key| env.get(key).map(|value| value.to_string()));

        assert_eq!(config.retry.retries, 3);
        assert_eq!(config.retry.strategy, BackoffStrategy::Exponential);
        assert_eq!(config.pricing.tax_rate, Rate::from_bps(725));
        assert!(!config.cache.enabled);
        assert_eq!(config.api.base_url, "https://shop.example.com");
        // Unset keys keep their values
        assert_eq!(config.pricing.labor_rate, ShopSettings::default().labor_rate);
    }

    #[test]
    fn test_invalid_env_overrides_are_ignored() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("TORQUE_RETRIES", "lots"),
            ("TORQUE_TAX_RATE", "eight percent"),
            ("TORQUE_RETRY_STRATEGY", "fibonacci"),
            ("TORQUE_CACHE_TTL_SECS", "-5"),
        ]);

        let mut config = ClientConfig::default();
        config.retry.retries = 1;
        config.apply_overrides(|key| env.get(key).map(|value| value.to_string()));

        assert_eq!(config.retry.retries, 1);
        assert_eq!(config.pricing.tax_rate, ShopSettings::default().tax_rate);
        assert_eq!(config.retry.strategy, BackoffStrategy::Constant);
        assert_eq!(config.cache.ttl_secs, 300);
    }

    #[test]
    fn test_load_from_file() {
        let path = temp_config_path();
        std::fs::write(
            &path,
            r#"
[api]
base_url = "https://shop.example.com"

[retry]
retries = 3
strategy = "exponential"

[pricing]
taxRate = 0.06
laborRate = "125"
"#,
        )
        .unwrap();

        let config = ClientConfig::load(Some(path.clone())).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.api.base_url, "https://shop.example.com");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.pricing.tax_rate, Rate::from_bps(600));
        assert_eq!(config.pricing.labor_rate, Money::from_dollars(125));
        assert_eq!(config.pricing.parts_markup, Rate::from_bps(3500));

        let policy = config.retry_policy();
        assert_eq!(policy.retries, 3);
        assert_eq!(policy.strategy, BackoffStrategy::Exponential);
        assert_eq!(policy.delay, Duration::from_millis(1000));
    }

    #[test]
    fn test_save_and_reload() {
        let path = temp_config_path();
        let mut config = ClientConfig::default();
        config.retry.retries = 2;
        config.cache.enabled = false;

        config.save(Some(path.clone())).unwrap();
        let reloaded = ClientConfig::load(Some(path.clone())).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(reloaded.retry.retries, 2);
        assert!(!reloaded.cache.enabled);
        assert!(reloaded.response_cache().is_none());
        assert_eq!(reloaded.pricing, config.pricing);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = ClientConfig::load(Some(temp_config_path())).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:3001");
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&ClientConfig::default()).unwrap();
        assert!(toml_str.contains("[api]"));
        assert!(toml_str.contains("[retry]"));
        assert!(toml_str.contains("[pricing]"));
        assert!(toml_str.contains("taxRate"));
    }
}
