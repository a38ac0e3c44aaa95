//! The attribution pipeline

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::request::{AttributionReport, AttributionRequest};
use lineage_attribution::{PathAttributor, SentenceAttributor};
use lineage_confidence::{ConfidenceSynthesizer, EvidencePattern};
use lineage_display::{DisplayFormatter, StructuredDisplay};
use lineage_parser::ContextParser;
use tracing::{debug, info};

/// Runs parse, attribution, synthesis and formatting for one answer at a time
///
/// The engine holds configuration only; every call is independent, so one
/// instance can be shared across threads or tasks.
pub struct AttributionEngine {
    config: EngineConfig,
    parser: ContextParser,
    sentences: SentenceAttributor,
    paths: PathAttributor,
    synthesizer: ConfidenceSynthesizer,
}

impl AttributionEngine {
    /// Create an engine; fails if the configuration is invalid
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate().map_err(EngineError::Config)?;

        Ok(Self {
            parser: ContextParser::new(config.parser.clone()),
            sentences: SentenceAttributor::new(
                config.sentences.clone(),
                config.confidence.weights.clone(),
            ),
            paths: PathAttributor::new(config.paths.clone()),
            synthesizer: ConfidenceSynthesizer::new(config.confidence.clone()),
            config,
        })
    }

    /// Get the engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the full pipeline and keep every intermediate result
    pub fn attribute(&self, request: &AttributionRequest) -> Result<AttributionReport> {
        let raw_context = request.raw_context.as_deref().ok_or(EngineError::MissingContext)?;

        let context = self.parser.parse(raw_context);
        let sentences = self.sentences.attribute(&request.answer, &context);

        let classification = request.classification;
        let paths = if classification.is_multi_hop {
            self.paths
                .attribute_paths(&request.answer, &request.causal_paths, &context, &sentences)
        } else {
            debug!("Single-hop question; path attribution skipped");
            Vec::new()
        };

        let pattern = EvidencePattern::from_attribution(
            &sentences,
            &paths,
            &context,
            classification.is_multi_hop,
        );
        let confidence = self.synthesizer.synthesize(&pattern);

        let mut formatter = DisplayFormatter::new(self.config.display.clone());
        if let Some(date) = request.reference_date {
            formatter = formatter.with_reference_date(date);
        }
        let display = formatter.format(
            &sentences,
            &paths,
            Some(&confidence),
            &context.chunks,
            &classification,
        );

        info!(
            "Attribution complete: {} chunks, {} sentences, {} paths, confidence {:.2} ({})",
            context.chunks.len(),
            sentences.len(),
            paths.len(),
            confidence.confidence,
            confidence.confidence_type.as_str()
        );

        Ok(AttributionReport {
            context,
            sentences,
            paths,
            confidence,
            display,
        })
    }

    /// Run the full pipeline and return only the display payload
    pub fn explain(&self, request: &AttributionRequest) -> Result<StructuredDisplay> {
        self.attribute(request).map(|report| report.display)
    }
}
