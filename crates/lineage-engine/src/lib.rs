//! Lineage Engine
//!
//! Source attribution and traceability for generated answers. Given an answer
//! and the raw context it was generated from, the engine works out which
//! evidence supports which sentence, which graph relationships form the
//! reasoning chain, how much the answer can be trusted, and renders all of it
//! as a tiered display payload.
//!
//! # Pipeline
//!
//! 1. [`lineage_parser`]: raw context into entities, relationships and chunks
//!    with resolved provenance
//! 2. [`lineage_attribution`]: sentence attribution, then path attribution for
//!    multi-hop questions
//! 3. [`lineage_confidence`]: evidence pattern classification and confidence
//! 4. [`lineage_display`]: citation numbering and cards
//!
//! # Example Usage
//!
//! ```
//! use lineage_engine::{AttributionEngine, AttributionRequest, EngineConfig};
//!
//! let raw = r#"-----Document Chunks(DC)-----
//! [{"id": 1, "content": "[EMAIL | subject: Q2 Update | from: cfo@example.com] iPhone revenue grew 8% in Q2."}]"#;
//!
//! let engine = AttributionEngine::new(EngineConfig::default()).unwrap();
//! let request = AttributionRequest::new(raw, "iPhone revenue grew 8% in Q2.");
//! let display = engine.explain(&request).unwrap();
//!
//! assert_eq!(display.answer.text, "iPhone revenue grew 8% in Q2 [1].");
//! assert_eq!(display.sources.groups[0].entries[0].label, "Q2 Update");
//! ```

#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod request;

pub use config::EngineConfig;
pub use engine::AttributionEngine;
pub use error::{EngineError, Result};
pub use request::{AttributionReport, AttributionRequest};

pub use lineage_display::StructuredDisplay;
