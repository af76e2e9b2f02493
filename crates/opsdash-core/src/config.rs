//! Dashboard configuration.
//!
//! The [`DashboardConfig`] has sections for the derivation core, the remote
//! prediction bridge, and card display.
//!
//! Configuration is stored in `~/.opsdash/config.toml` and supports partial configs
//! where unspecified values use sensible defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::display::DisplayValue;
use crate::error::{Error, Result};
use crate::metrics::FormulaVariant;

/// Main dashboard configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Derivation and validation settings.
    pub core: CoreConfig,

    /// Remote prediction settings.
    pub prediction: PredictionConfig,

    /// Card display settings.
    pub display: DisplayConfig,
}

/// Derivation and validation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Efficiency baseline policy.
    pub variant: FormulaVariant,

    /// What to do with slider values outside a field's domain.
    pub range_policy: RangePolicy,

    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            variant: FormulaVariant::Fixed,
            range_policy: RangePolicy::Clamp,
            event_capacity: 64,
        }
    }
}

/// Handling of out-of-domain slider values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RangePolicy {
    /// Clamp into the field's domain.
    #[default]
    Clamp,
    /// Reject with a validation error.
    Reject,
}

/// Remote prediction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Send a prediction request on every update.
    pub enabled: bool,

    /// Scoring endpoint (HTTP POST).
    pub endpoint: Option<String>,

    /// Request timeout in milliseconds.
    pub timeout_ms: u64,

    /// Drop responses that belong to an older update.
    pub discard_stale: bool,

    /// Abort in-flight requests when a newer one is sent.
    pub cancel_superseded: bool,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            timeout_ms: 10_000,
            discard_stale: true,
            cancel_superseded: true,
        }
    }
}

impl PredictionConfig {
    /// The endpoint, if predictions are enabled and one is configured.
    pub fn active_endpoint(&self) -> Option<&str> {
        if self.enabled {
            self.endpoint.as_deref().filter(|e| !e.trim().is_empty())
        } else {
            None
        }
    }
}

/// Card display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Decimal places for metric cards.
    pub decimal_places: usize,

    /// Totals shown until a prediction provides them.
    pub placeholders: PlaceholderTotals,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            decimal_places: 2,
            placeholders: PlaceholderTotals::default(),
        }
    }
}

/// Initial card totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderTotals {
    pub total_views: DisplayValue,
    pub total_profit: DisplayValue,
    pub total_product: DisplayValue,
    pub total_users: DisplayValue,
}

impl Default for PlaceholderTotals {
    fn default() -> Self {
        Self {
            total_views: DisplayValue::Text("$3.456K".to_string()),
            total_profit: DisplayValue::Text("$45.2K".to_string()),
            total_product: DisplayValue::Text("2,450".to_string()),
            total_users: DisplayValue::Number(0.0),
        }
    }
}

impl DashboardConfig {
    /// Get the default config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".opsdash"))
    }

    /// Get the default config file path.
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    /// Load configuration from the default location.
    ///
    /// Returns default config if file doesn't exist.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| Error::Config("could not determine config directory".to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Check values serde cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        if self.core.event_capacity == 0 {
            return Err(Error::Config("core.event_capacity must be positive".to_string()));
        }
        if self.prediction.enabled && self.prediction.active_endpoint().is_none() {
            return Err(Error::Config(
                "prediction.enabled requires prediction.endpoint".to_string(),
            ));
        }
        if self.prediction.timeout_ms == 0 {
            return Err(Error::Config("prediction.timeout_ms must be positive".to_string()));
        }
        Ok(())
    }
}
