//! Configuration for the Context Parser

use serde::{Deserialize, Serialize};

/// Configuration for the Context Parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Remove inline provenance markers from stored chunk content
    pub strip_markers: bool,

    /// Maximum records decoded per section; the rest are ignored
    pub max_records_per_section: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            strip_markers: true,
            max_records_per_section: 1_000,
        }
    }
}

impl ParserConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_records_per_section == 0 {
            return Err("max_records_per_section must be greater than 0".to_string());
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
