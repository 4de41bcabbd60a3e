use crate::error::{GepError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

pub const DEFAULT_BASE_URL: &str = "https://open.bigmodel.cn/api/paas/v4";
pub const DEFAULT_VISION_MODEL: &str = "glm-4v-plus";
pub const DEFAULT_CHAT_MODEL: &str = "glm-4";

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for the hosted-model client.
///
/// The API key is deliberately absent: it lives only in process memory and
/// is never read from or written to a file.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub base_url: ConfigValue<String>,
    pub vision_model: ConfigValue<String>,
    pub chat_model: ConfigValue<String>,
    /// `None` leaves the HTTP client's own timeout behaviour in place
    pub request_timeout_secs: ConfigValue<Option<u64>>,
    /// Extra attempts for the valuation call; 0 means a single attempt
    pub max_retries: ConfigValue<u32>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            base_url: ConfigValue::new(DEFAULT_BASE_URL.to_string(), ConfigSource::Default),
            vision_model: ConfigValue::new(DEFAULT_VISION_MODEL.to_string(), ConfigSource::Default),
            chat_model: ConfigValue::new(DEFAULT_CHAT_MODEL.to_string(), ConfigSource::Default),
            request_timeout_secs: ConfigValue::new(None, ConfigSource::Default),
            max_retries: ConfigValue::new(0, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| GepError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| GepError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(base_url) = file_config.base_url {
            self.base_url.update(validate_base_url(&base_url)?, ConfigSource::File);
        }

        if let Some(vision_model) = file_config.vision_model {
            self.vision_model.update(vision_model, ConfigSource::File);
        }

        if let Some(chat_model) = file_config.chat_model {
            self.chat_model.update(chat_model, ConfigSource::File);
        }

        if let Some(timeout) = file_config.request_timeout_secs {
            self.request_timeout_secs.update(Some(timeout), ConfigSource::File);
        }

        if let Some(max_retries) = file_config.max_retries {
            self.max_retries.update(max_retries, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // GEP_BASE_URL
        if let Ok(url) = env::var("GEP_BASE_URL") {
            match validate_base_url(&url) {
                Ok(url) => self.base_url.update(url, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEP_BASE_URL value '{}': expected an http(s) URL",
                    url
                ),
            }
        }

        // GEP_VISION_MODEL
        if let Ok(model) = env::var("GEP_VISION_MODEL") {
            self.vision_model.update(model, ConfigSource::Environment);
        }

        // GEP_CHAT_MODEL
        if let Ok(model) = env::var("GEP_CHAT_MODEL") {
            self.chat_model.update(model, ConfigSource::Environment);
        }

        // GEP_REQUEST_TIMEOUT_SECS
        if let Ok(timeout_str) = env::var("GEP_REQUEST_TIMEOUT_SECS") {
            match timeout_str.parse::<u64>() {
                Ok(timeout) => {
                    self.request_timeout_secs.update(Some(timeout), ConfigSource::Environment)
                }
                Err(_) => tracing::warn!(
                    "Invalid GEP_REQUEST_TIMEOUT_SECS value '{}': expected whole seconds",
                    timeout_str
                ),
            }
        }

        // GEP_MAX_RETRIES
        if let Ok(retries_str) = env::var("GEP_MAX_RETRIES") {
            match retries_str.parse::<u32>() {
                Ok(retries) => self.max_retries.update(retries, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEP_MAX_RETRIES value '{}': expected a non-negative integer",
                    retries_str
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) -> Result<()> {
        if let Some(base_url) = overrides.base_url {
            self.base_url.update(validate_base_url(&base_url)?, ConfigSource::Cli);
        }

        if let Some(vision_model) = overrides.vision_model {
            self.vision_model.update(vision_model, ConfigSource::Cli);
        }

        if let Some(chat_model) = overrides.chat_model {
            self.chat_model.update(chat_model, ConfigSource::Cli);
        }

        if let Some(timeout) = overrides.request_timeout_secs {
            self.request_timeout_secs.update(Some(timeout), ConfigSource::Cli);
        }

        if let Some(max_retries) = overrides.max_retries {
            self.max_retries.update(max_retries, ConfigSource::Cli);
        }

        Ok(())
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert("base_url".to_string(), (self.base_url.value.clone(), self.base_url.source));

        map.insert(
            "vision_model".to_string(),
            (self.vision_model.value.clone(), self.vision_model.source),
        );

        map.insert(
            "chat_model".to_string(),
            (self.chat_model.value.clone(), self.chat_model.source),
        );

        map.insert(
            "request_timeout_secs".to_string(),
            (
                self.request_timeout_secs
                    .value
                    .map(|secs| format!("{}s", secs))
                    .unwrap_or_else(|| "transport default".to_string()),
                self.request_timeout_secs.source,
            ),
        );

        map.insert(
            "max_retries".to_string(),
            (self.max_retries.value.to_string(), self.max_retries.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    base_url: Option<String>,
    vision_model: Option<String>,
    chat_model: Option<String>,
    request_timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub base_url: Option<String>,
    pub vision_model: Option<String>,
    pub chat_model: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

/// Check that a base URL is http(s) and drop any trailing slash
pub fn validate_base_url(s: &str) -> Result<String> {
    let trimmed = s.trim().trim_end_matches('/');
    if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        Ok(trimmed.to_string())
    } else {
        Err(GepError::ConfigInvalid {
            key: "base_url".to_string(),
            reason: format!("Invalid base URL: {}. Use an http:// or https:// URL", s),
        })
    }
}
