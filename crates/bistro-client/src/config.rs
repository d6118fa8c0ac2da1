//! # Client Configuration
//!
//! Configuration for the storefront client.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     BISTRO_API_URL=https://api.example.com                             │
//! │     BISTRO_STRICT_CARDINALITY=true                                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/bistro/client.toml (Linux)                               │
//! │     ~/Library/Application Support/com.bistro.client/client.toml (macOS)│
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [api]
//! base_url = "http://localhost:5019"
//! timeout_secs = 10
//!
//! [pricing]
//! charge_ungrouped_extras = false
//! cardinality = "presence"  # presence | strict
//!
//! [storage]
//! basket_path = "/tmp/basket.json"
//! ```

use bistro_core::{CardinalityMode, PricingPolicy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};

// =============================================================================
// API Settings
// =============================================================================

/// Where the storefront API lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL without trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:5019".to_string()
}

fn default_timeout() -> u64 {
    10
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
// Pricing Settings
// =============================================================================

/// Pricing and validation switches passed to every configuration session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingSettings {
    #[serde(default)]
    pub charge_ungrouped_extras: bool,

    #[serde(default)]
    pub cardinality: CardinalityMode,
}

// =============================================================================
// Storage Settings
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Persisted basket file. Defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basket_path: Option<PathBuf>,
}

// =============================================================================
// Main Client Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub pricing: PricingSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

impl ClientConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (client.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
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
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::Config("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Client config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        let url = &self.api.base_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ClientError::Config(format!(
                "API URL must start with http:// or https://, got: {}",
                url
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(ClientError::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("BISTRO_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Ok(timeout) = std::env::var("BISTRO_TIMEOUT_SECS") {
            if let Ok(t) = timeout.parse::<u64>() {
                self.api.timeout_secs = t;
            }
        }

        if let Ok(flag) = std::env::var("BISTRO_CHARGE_UNGROUPED_EXTRAS") {
            match parse_flag(&flag) {
                Some(value) => self.pricing.charge_ungrouped_extras = value,
                None => warn!(value = %flag, "Unknown BISTRO_CHARGE_UNGROUPED_EXTRAS value"),
            }
        }

        if let Ok(flag) = std::env::var("BISTRO_STRICT_CARDINALITY") {
            match parse_flag(&flag) {
                Some(true) => self.pricing.cardinality = CardinalityMode::Strict,
                Some(false) => self.pricing.cardinality = CardinalityMode::Presence,
                None => warn!(value = %flag, "Unknown BISTRO_STRICT_CARDINALITY value"),
            }
        }

        if let Ok(path) = std::env::var("BISTRO_BASKET_PATH") {
            self.storage.basket_path = Some(PathBuf::from(path));
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "bistro", "client")
            .map(|dirs| dirs.config_dir().join("client.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Where the basket is persisted.
    pub fn basket_path(&self) -> Option<PathBuf> {
        self.storage.basket_path.clone().or_else(|| {
            directories::ProjectDirs::from("com", "bistro", "client")
                .map(|dirs| dirs.data_dir().join("basket.json"))
        })
    }

    pub fn pricing_policy(&self) -> PricingPolicy {
        PricingPolicy {
            charge_ungrouped_extras: self.pricing.charge_ungrouped_extras,
        }
    }

    pub fn cardinality_mode(&self) -> CardinalityMode {
        self.pricing.cardinality
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
