//! Engine configuration
//!
//! Each component keeps its own config; the engine nests them under one TOML
//! document:
//!
//! ```toml
//! [parser]
//! strip_markers = true
//!
//! [sentences]
//! min_overlap = 0.2
//!
//! [confidence]
//! conflict_tolerance = 0.05
//!
//! [confidence.weights]
//! filing = 1.0
//!
//! [display]
//! high_threshold = 0.8
//! ```

use lineage_attribution::{PathAttributorConfig, SentenceAttributorConfig};
use lineage_confidence::SynthesizerConfig;
use lineage_display::DisplayConfig;
use lineage_parser::ParserConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for every pipeline stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Context Parser
    pub parser: ParserConfig,

    /// Sentence Attributor
    pub sentences: SentenceAttributorConfig,

    /// Graph Path Attributor
    pub paths: PathAttributorConfig,

    /// Confidence Synthesizer (its weights also score multi-match sentences)
    pub confidence: SynthesizerConfig,

    /// Display Formatter
    pub display: DisplayConfig,
}

impl EngineConfig {
    /// Strict preset: tighter matching and conflict tolerance
    pub fn strict() -> Self {
        Self {
            sentences: SentenceAttributorConfig::strict(),
            confidence: SynthesizerConfig::strict(),
            ..Default::default()
        }
    }

    /// Lenient preset: looser matching and conflict tolerance
    pub fn lenient() -> Self {
        Self {
            sentences: SentenceAttributorConfig::lenient(),
            confidence: SynthesizerConfig::lenient(),
            ..Default::default()
        }
    }

    /// Validate every section, naming the first one that fails
    pub fn validate(&self) -> Result<(), String> {
        self.parser.validate().map_err(|e| format!("[parser] {}", e))?;
        self.sentences.validate().map_err(|e| format!("[sentences] {}", e))?;
        self.paths.validate().map_err(|e| format!("[paths] {}", e))?;
        self.confidence.validate().map_err(|e| format!("[confidence] {}", e))?;
        self.display.validate().map_err(|e| format!("[display] {}", e))?;
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::from_toml(&contents)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
        assert!(EngineConfig::strict().validate().is_ok());
        assert!(EngineConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = EngineConfig::from_toml(
            r#"
            [confidence]
            conflict_tolerance = 0.2

            [display]
            stale_after_days = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.confidence.conflict_tolerance, 0.2);
        assert_eq!(config.display.stale_after_days, 30);
        assert_eq!(config.sentences, SentenceAttributorConfig::default());
        assert_eq!(config.parser, ParserConfig::default());
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[sentences]\nmin_shared_tokens = 3").unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.sentences.min_shared_tokens, 3);
        assert_eq!(config.confidence, SynthesizerConfig::default());
    }

    #[test]
    fn test_from_missing_file() {
        let err = EngineConfig::from_file("/nonexistent/lineage.toml").unwrap_err();
        assert!(err.starts_with("Failed to read /nonexistent/lineage.toml"));
    }

    #[test]
    fn test_validation_names_section() {
        let mut config = EngineConfig::default();
        config.parser.max_records_per_section = 0;
        let err = config.validate().unwrap_err();
        assert!(err.starts_with("[parser]"));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = EngineConfig::strict();
        let toml = config.to_toml().unwrap();
        assert_eq!(EngineConfig::from_toml(&toml).unwrap(), config);
    }

    #[test]
    fn test_malformed_toml() {
        let err = EngineConfig::from_toml("[display\nhigh_threshold = ").unwrap_err();
        assert!(err.starts_with("Failed to parse TOML"));
    }
}
