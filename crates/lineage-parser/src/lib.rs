//! Lineage Context Parser
//!
//! Normalizes the raw context returned by the retrieval engine into typed
//! entities, relationships and chunks, each chunk carrying resolved
//! provenance.
//!
//! # Overview
//!
//! The raw context is a semi-structured blob with three delimited sections:
//!
//! ```text
//! -----Entities(KG)-----
//! [{"id": "1", "entity": "Apple Inc", "type": "ORGANIZATION"}]
//! -----Relationships(KG)-----
//! [{"entity1": "Apple Inc", "entity2": "iPhone", "description": "OFFERS"}]
//! -----Document Chunks(DC)-----
//! [{"id": 1, "content": "...", "file_path": "email:Quarterly Update.eml"}]
//! ```
//!
//! Section bodies may also be wrapped in a json code fence. Each section is
//! decoded independently. A section that fails to decode
//! degrades to an empty list and the parser carries on; the parser itself
//! never fails.
//!
//! # Provenance Tiers
//!
//! Chunk provenance is resolved by an ordered list of strategies, first match
//! wins:
//!
//! 1. [`InlineMarkerStrategy`]: `[EMAIL | subject: ... | from: ... | date: ...]`
//! 2. [`PathPrefixStrategy`]: `email:Quarterly Update.eml`
//! 3. Unknown default (always applies)
//!
//! Every tier populates the shared `label` of [`SourceDetails`], synthesizing
//! one when the tier's own data has none.
//!
//! # Example Usage
//!
//! ```
//! use lineage_parser::ContextParser;
//!
//! let raw = r#"-----Document Chunks(DC)-----
//! [{"id": 1, "content": "Revenue grew 8%.", "file_path": "email:Quarterly Update.eml"}]"#;
//!
//! let parsed = ContextParser::default().parse(raw);
//! assert_eq!(parsed.chunks.len(), 1);
//! assert_eq!(parsed.chunks[0].label(), "Quarterly Update");
//! ```
//!
//! [`SourceDetails`]: lineage_domain::SourceDetails

#![warn(missing_docs)]

mod config;
mod dates;
mod error;
mod parser;
mod provenance;
mod records;
mod sections;

pub use config::ParserConfig;
pub use dates::parse_date_str;
pub use error::ParserError;
pub use parser::{parse, ContextParser};
pub use provenance::{
    fallback_label, strip_inline_markers, InlineMarkerStrategy, PathPrefixStrategy,
    ProvenanceResolver, ProvenanceStrategy, RawChunk, Resolution,
};
