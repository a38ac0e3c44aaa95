//! Source types and the per-type provenance payload
//!
//! `SourceDetails` is a sum type keyed by source type. Every variant carries
//! the same required `label` field, which is the one key the display layer
//! reads for a human-readable source name. Type-specific fields are optional
//! because the lower provenance tiers rarely have them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of source a chunk was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Mail-derived text
    Email,

    /// Aggregated market or financial data from an API provider
    Api,

    /// Regulatory filing
    Filing,

    /// Generic document
    Document,

    /// Provenance could not be resolved
    Unknown,
}

impl SourceType {
    /// All source types, in display order
    pub const ALL: [SourceType; 5] = [
        SourceType::Filing,
        SourceType::Api,
        SourceType::Document,
        SourceType::Email,
        SourceType::Unknown,
    ];

    /// Get the source type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Email => "email",
            SourceType::Api => "api",
            SourceType::Filing => "filing",
            SourceType::Document => "document",
            SourceType::Unknown => "unknown",
        }
    }

    /// Parse a source type keyword, accepting common aliases
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "email" | "mail" | "eml" => Some(SourceType::Email),
            "api" => Some(SourceType::Api),
            "filing" | "sec" => Some(SourceType::Filing),
            "document" | "doc" => Some(SourceType::Document),
            "unknown" => Some(SourceType::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid source type: {}", s))
    }
}

/// Source-type dependent provenance payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source_type", rename_all = "lowercase")]
pub enum SourceDetails {
    /// Mail-derived text; the label holds the subject
    Email {
        /// Human-readable label (the subject line, or a synthesized stand-in)
        label: String,
        /// Sender address or name
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender: Option<String>,
        /// Date exactly as written in the marker
        #[serde(default, skip_serializing_if = "Option::is_none")]
        raw_date: Option<String>,
    },

    /// API-derived data
    Api {
        /// Human-readable label
        label: String,
        /// Data provider (e.g. "FMP")
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provider: Option<String>,
        /// Ticker or series symbol
        #[serde(default, skip_serializing_if = "Option::is_none")]
        symbol: Option<String>,
    },

    /// Regulatory filing
    Filing {
        /// Human-readable label
        label: String,
        /// Form type (e.g. "10-K")
        #[serde(default, skip_serializing_if = "Option::is_none")]
        form: Option<String>,
        /// Filing company
        #[serde(default, skip_serializing_if = "Option::is_none")]
        company: Option<String>,
    },

    /// Generic document
    Document {
        /// Human-readable label
        label: String,
        /// Document title, when distinct from the label
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },

    /// Unresolved provenance
    Unknown {
        /// Best-effort label (file stem or chunk reference)
        label: String,
    },
}

impl SourceDetails {
    /// Create details carrying only a label for the given source type
    pub fn labelled(source_type: SourceType, label: impl Into<String>) -> Self {
        let label = label.into();
        match source_type {
            SourceType::Email => SourceDetails::Email {
                label,
                sender: None,
                raw_date: None,
            },
            SourceType::Api => SourceDetails::Api {
                label,
                provider: None,
                symbol: None,
            },
            SourceType::Filing => SourceDetails::Filing {
                label,
                form: None,
                company: None,
            },
            SourceType::Document => SourceDetails::Document { label, title: None },
            SourceType::Unknown => SourceDetails::Unknown { label },
        }
    }

    /// The source type this payload belongs to
    pub fn source_type(&self) -> SourceType {
        match self {
            SourceDetails::Email { .. } => SourceType::Email,
            SourceDetails::Api { .. } => SourceType::Api,
            SourceDetails::Filing { .. } => SourceType::Filing,
            SourceDetails::Document { .. } => SourceType::Document,
            SourceDetails::Unknown { .. } => SourceType::Unknown,
        }
    }

    /// The shared human-readable label
    pub fn label(&self) -> &str {
        match self {
            SourceDetails::Email { label, .. }
            | SourceDetails::Api { label, .. }
            | SourceDetails::Filing { label, .. }
            | SourceDetails::Document { label, .. }
            | SourceDetails::Unknown { label } => label,
        }
    }

    /// Whether the payload satisfies the label contract (non-blank label)
    pub fn has_label(&self) -> bool {
        !self.label().trim().is_empty()
    }

    /// Replace the label, keeping type-specific fields
    pub fn with_label(mut self, new_label: impl Into<String>) -> Self {
        let new_label = new_label.into();
        match &mut self {
            SourceDetails::Email { label, .. }
            | SourceDetails::Api { label, .. }
            | SourceDetails::Filing { label, .. }
            | SourceDetails::Document { label, .. }
            | SourceDetails::Unknown { label } => *label = new_label,
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_type_parse_aliases() {
        assert_eq!(SourceType::parse("MAIL"), Some(SourceType::Email));
        assert_eq!(SourceType::parse(" doc "), Some(SourceType::Document));
        assert_eq!(SourceType::parse("sec"), Some(SourceType::Filing));
        assert_eq!(SourceType::parse("C"), None);
    }

    #[test]
    fn test_labelled_matches_source_type() {
        for source_type in SourceType::ALL {
            let details = SourceDetails::labelled(source_type, "x");
            assert_eq!(details.source_type(), source_type);
            assert_eq!(details.label(), "x");
        }
    }

    #[test]
    fn test_serialized_label_key_is_shared() {
        // The display layer reads `label` regardless of variant
        for source_type in SourceType::ALL {
            let details = SourceDetails::labelled(source_type, "Quarterly Update");
            let json = serde_json::to_value(&details).unwrap();
            assert_eq!(json["label"], "Quarterly Update");
            assert_eq!(json["source_type"], source_type.as_str());
        }
    }

    #[test]
    fn test_with_label_keeps_fields() {
        let details = SourceDetails::Api {
            label: String::new(),
            provider: Some("FMP".to_string()),
            symbol: Some("AAPL".to_string()),
        };
        assert!(!details.has_label());

        let details = details.with_label("FMP AAPL");
        assert!(details.has_label());
        match details {
            SourceDetails::Api { provider, .. } => assert_eq!(provider.as_deref(), Some("FMP")),
            other => panic!("Expected Api, got {:?}", other),
        }
    }
}
