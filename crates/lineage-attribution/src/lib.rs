//! Lineage Attribution
//!
//! Reconstructs which evidence supports which part of a generated answer.
//!
//! - [`SentenceAttributor`] maps each answer sentence to the chunks that
//!   share enough significant vocabulary with it.
//! - [`PathAttributor`] maps multi-hop reasoning chains onto the entities the
//!   answer names, annotating each step with corroborating chunks.
//!
//! # Example Usage
//!
//! ```
//! use lineage_attribution::{get_attribution_statistics, SentenceAttributor};
//! use lineage_domain::{Chunk, ParsedContext, Provenance};
//!
//! let context = ParsedContext {
//!     chunks: vec![Chunk::new(
//!         "1",
//!         "iPhone revenue grew 8% in Q2.",
//!         Provenance::unknown("Chunk 1"),
//!     )],
//!     ..Default::default()
//! };
//!
//! let sentences =
//!     SentenceAttributor::default().attribute("iPhone revenue grew 8% in Q2.", &context);
//! let stats = get_attribution_statistics(&sentences);
//! assert_eq!(stats.coverage_percentage, 100.0);
//! ```

#![warn(missing_docs)]

mod config;
mod paths;
mod references;
mod sentences;
mod text;

pub use config::{PathAttributorConfig, SentenceAttributorConfig, MAX_PATHS_CAP};
pub use paths::PathAttributor;
pub use references::{CapitalizedPhraseExtractor, ReferenceExtractor, ReferencesSectionExtractor};
pub use sentences::{get_attribution_statistics, AttributionStatistics, SentenceAttributor};
pub use text::{
    split_sentences, strip_citation_markers, tokenize, DEFAULT_ABBREVIATIONS, DEFAULT_STOP_WORDS,
};
