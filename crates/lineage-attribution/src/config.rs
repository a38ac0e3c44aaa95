//! Attribution configuration

use crate::text::{DEFAULT_ABBREVIATIONS, DEFAULT_STOP_WORDS};
use serde::{Deserialize, Serialize};

/// Upper bound on reasoning paths, whatever the configuration says
pub const MAX_PATHS_CAP: usize = 5;

/// Configuration for the Sentence Attributor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentenceAttributorConfig {
    /// Minimum share of sentence tokens found in a chunk (0.0-1.0)
    pub min_overlap: f64,

    /// Minimum number of shared tokens
    pub min_shared_tokens: usize,

    /// Maximum chunks attached to one sentence
    pub max_chunks_per_sentence: usize,

    /// Confidence of a sentence with no supporting chunk
    pub floor_confidence: f64,

    /// Words ignored when scoring overlap
    pub stop_words: Vec<String>,

    /// Tokens whose trailing period does not end a sentence (lowercase, no final period)
    pub abbreviations: Vec<String>,
}

impl Default for SentenceAttributorConfig {
    fn default() -> Self {
        Self {
            min_overlap: 0.2,
            min_shared_tokens: 2,
            max_chunks_per_sentence: 3,
            floor_confidence: 0.30,
            stop_words: to_strings(DEFAULT_STOP_WORDS),
            abbreviations: to_strings(DEFAULT_ABBREVIATIONS),
        }
    }
}

impl SentenceAttributorConfig {
    /// Attach a chunk only on substantial overlap
    pub fn strict() -> Self {
        Self {
            min_overlap: 0.4,
            min_shared_tokens: 3,
            max_chunks_per_sentence: 2,
            ..Default::default()
        }
    }

    /// Attach chunks on any meaningful overlap
    pub fn lenient() -> Self {
        Self {
            min_overlap: 0.1,
            min_shared_tokens: 1,
            max_chunks_per_sentence: 5,
            ..Default::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.min_overlap) {
            return Err(format!("min_overlap must be in [0, 1], got {}", self.min_overlap));
        }
        if !(0.0..=1.0).contains(&self.floor_confidence) {
            return Err(format!(
                "floor_confidence must be in [0, 1], got {}",
                self.floor_confidence
            ));
        }
        if self.min_shared_tokens == 0 {
            return Err("min_shared_tokens must be at least 1".to_string());
        }
        if self.max_chunks_per_sentence == 0 {
            return Err("max_chunks_per_sentence must be at least 1".to_string());
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

/// Configuration for the Graph Path Attributor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathAttributorConfig {
    /// Maximum paths returned; values above 5 are capped
    pub max_paths: usize,

    /// Minimum length of both sides of an entity label match
    pub min_match_len: usize,

    /// Step confidence when no chunk supports a path and it has no usable weight
    pub default_step_confidence: f64,
}

impl Default for PathAttributorConfig {
    fn default() -> Self {
        Self {
            max_paths: MAX_PATHS_CAP,
            min_match_len: 3,
            default_step_confidence: 0.5,
        }
    }
}

impl PathAttributorConfig {
    /// Number of paths actually returned
    pub fn effective_max_paths(&self) -> usize {
        self.max_paths.min(MAX_PATHS_CAP)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_paths == 0 {
            return Err("max_paths must be at least 1".to_string());
        }
        if self.min_match_len == 0 {
            return Err("min_match_len must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.default_step_confidence) {
            return Err(format!(
                "default_step_confidence must be in [0, 1], got {}",
                self.default_step_confidence
            ));
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

fn to_strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}
