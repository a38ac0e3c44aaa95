//! Configuration for the Confidence Synthesizer

use lineage_domain::SourceType;
use serde::{Deserialize, Serialize};

/// Default relative divergence above which numeric claims conflict
pub const DEFAULT_CONFLICT_TOLERANCE: f64 = 0.05;

/// Source-quality weights used by the weighted average
///
/// Regulatory filings weigh most, unresolved sources least.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceWeights {
    /// Weight for regulatory filings
    pub filing: f64,
    /// Weight for API-derived data
    pub api: f64,
    /// Weight for generic documents
    pub document: f64,
    /// Weight for mail-derived text
    pub email: f64,
    /// Weight for unresolved sources
    pub unknown: f64,
}

impl Default for SourceWeights {
    fn default() -> Self {
        Self {
            filing: 1.0,
            api: 0.8,
            document: 0.7,
            email: 0.6,
            unknown: 0.5,
        }
    }
}

impl SourceWeights {
    /// Weight for a source type
    pub fn weight(&self, source_type: SourceType) -> f64 {
        match source_type {
            SourceType::Filing => self.filing,
            SourceType::Api => self.api,
            SourceType::Document => self.document,
            SourceType::Email => self.email,
            SourceType::Unknown => self.unknown,
        }
    }

    /// `Σ wᵢcᵢ / Σ wᵢ` over `(source type, confidence)` pairs
    ///
    /// Returns `None` for an empty input.
    pub fn weighted_average<I>(&self, items: I) -> Option<f64>
    where
        I: IntoIterator<Item = (SourceType, f64)>,
    {
        let (weighted_sum, total_weight) = items
            .into_iter()
            .fold((0.0, 0.0), |(sum, total), (source_type, confidence)| {
                let weight = self.weight(source_type);
                (sum + weight * confidence, total + weight)
            });

        (total_weight > 0.0).then(|| weighted_sum / total_weight)
    }

    /// Validate the weight table
    pub fn validate(&self) -> Result<(), String> {
        for source_type in SourceType::ALL {
            let weight = self.weight(source_type);
            if !weight.is_finite() || weight <= 0.0 {
                return Err(format!(
                    "weight for {} must be a positive number, got {}",
                    source_type, weight
                ));
            }
        }
        Ok(())
    }
}

/// Configuration for the Confidence Synthesizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesizerConfig {
    /// Relative divergence `(max − min) / min(|v|)` above which claims conflict
    pub conflict_tolerance: f64,

    /// Source-quality weights
    pub weights: SourceWeights,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            conflict_tolerance: DEFAULT_CONFLICT_TOLERANCE,
            weights: SourceWeights::default(),
        }
    }
}

impl SynthesizerConfig {
    /// Flag even small numeric disagreements
    pub fn strict() -> Self {
        Self {
            conflict_tolerance: 0.01,
            ..Default::default()
        }
    }

    /// Tolerate rounding and restatement differences
    pub fn lenient() -> Self {
        Self {
            conflict_tolerance: 0.10,
            ..Default::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.conflict_tolerance.is_finite() || self.conflict_tolerance < 0.0 {
            return Err(format!(
                "conflict_tolerance must be a non-negative number, got {}",
                self.conflict_tolerance
            ));
        }
        self.weights.validate()
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
