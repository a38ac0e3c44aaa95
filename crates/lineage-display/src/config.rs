//! Configuration for the Display Formatter

use serde::{Deserialize, Serialize};

/// Configuration for the Display Formatter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Minimum confidence for the `high` reliability level
    pub high_threshold: f64,

    /// Minimum confidence for the `medium` reliability level
    pub medium_threshold: f64,

    /// Age in days after which evidence for a `current` question is flagged stale
    pub stale_after_days: i64,

    /// Include the attribution statistics block
    pub include_statistics: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            high_threshold: 0.8,
            medium_threshold: 0.5,
            stale_after_days: 90,
            include_statistics: true,
        }
    }
}

impl DisplayConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let in_range = |t: f64| (0.0..=1.0).contains(&t);
        if !in_range(self.high_threshold) || !in_range(self.medium_threshold) {
            return Err("reliability thresholds must be in [0, 1]".to_string());
        }
        if self.medium_threshold > self.high_threshold {
            return Err(format!(
                "medium_threshold ({}) must not exceed high_threshold ({})",
                self.medium_threshold, self.high_threshold
            ));
        }
        if self.stale_after_days < 0 {
            return Err("stale_after_days must not be negative".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
