//! Reference entity extraction from answer text
//!
//! Extractors run in order and the first non-empty result wins.

use crate::text::{
    is_list_item, split_answer, strip_file_extension, strip_list_marker, DEFAULT_STOP_WORDS,
};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static LEADING_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\[[^\]]*\]\s*")
        .unwrap_or_else(|e| panic!("leading tag pattern is invalid: {}", e))
});

static CAPITALIZED_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][\w&'-]*(?:[ \t]+[A-Z][\w&'-]*)*")
        .unwrap_or_else(|e| panic!("capitalized phrase pattern is invalid: {}", e))
});

/// Strategy for finding the entities an answer refers to
pub trait ReferenceExtractor: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Reference entity names, in order of appearance
    fn extract(&self, answer: &str) -> Vec<String>;
}

/// Reads the entries of a `References` section
///
/// Each list line has its bullet or number removed, then every leading
/// bracketed tag (`[KG]`, `[DC]`, `[1]`, ...), then a trailing file
/// extension. Lines are read independently, so a change of tag type between
/// lines does not end the section.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferencesSectionExtractor;

impl ReferenceExtractor for ReferencesSectionExtractor {
    fn name(&self) -> &'static str {
        "references_section"
    }

    fn extract(&self, answer: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        split_answer(answer)
            .references
            .into_iter()
            .filter(|line| is_list_item(line) || line.trim_start().starts_with('['))
            .filter_map(|line| {
                let mut entry = strip_list_marker(line);
                while let Some(tag) = LEADING_TAG.find(entry) {
                    entry = &entry[tag.end()..];
                }
                let entry = strip_file_extension(entry.trim()).trim();
                (!entry.is_empty()).then(|| entry.to_string())
            })
            .filter(|entry| seen.insert(entry.to_lowercase()))
            .collect()
    }
}

/// Collects runs of capitalised words from the answer body
#[derive(Debug, Clone)]
pub struct CapitalizedPhraseExtractor {
    stop_words: HashSet<String>,
}

impl Default for CapitalizedPhraseExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl CapitalizedPhraseExtractor {
    /// Create an extractor trimming the default stop words
    pub fn new() -> Self {
        Self {
            stop_words: DEFAULT_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }

    fn trim_leading_stop_words<'a>(&self, phrase: &'a str) -> &'a str {
        let mut rest = phrase;
        while let Some((first, tail)) = rest.split_once(char::is_whitespace) {
            if !self.stop_words.contains(&first.to_lowercase()) {
                break;
            }
            rest = tail.trim_start();
        }
        if self.stop_words.contains(&rest.to_lowercase()) {
            ""
        } else {
            rest
        }
    }
}

impl ReferenceExtractor for CapitalizedPhraseExtractor {
    fn name(&self) -> &'static str {
        "capitalized_phrase"
    }

    fn extract(&self, answer: &str) -> Vec<String> {
        let body = split_answer(answer).body.join("\n");
        let mut seen = HashSet::new();
        CAPITALIZED_RUN
            .find_iter(&body)
            .map(|m| self.trim_leading_stop_words(m.as_str().trim()))
            .filter(|phrase| !phrase.is_empty())
            .map(str::to_string)
            .filter(|phrase| seen.insert(phrase.to_lowercase()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_tag_types_do_not_stop_the_section() {
        let answer = "Apple grew.\n\n### References\n\
                      - [KG] Apple Inc\n\
                      - [DC] Q2 Earnings Call.pdf\n\
                      - [KG] iPhone\n\
                      * [DC][2] analyst-note.txt\n\
                      1. [KG] Services";
        let refs = ReferencesSectionExtractor.extract(answer);
        assert_eq!(
            refs,
            vec!["Apple Inc", "Q2 Earnings Call", "iPhone", "analyst-note", "Services"]
        );
    }

    #[test]
    fn test_references_stop_at_next_heading() {
        let answer =
            "**References:**\n- [KG] Apple Inc\n- [kg] apple inc\n## Notes\n- [KG] Not A Reference";
        assert_eq!(ReferencesSectionExtractor.extract(answer), vec!["Apple Inc"]);
    }

    #[test]
    fn test_no_references_section() {
        assert!(ReferencesSectionExtractor.extract("Just prose. No list.").is_empty());
    }

    #[test]
    fn test_capitalized_phrases() {
        let extractor = CapitalizedPhraseExtractor::new();
        let phrases = extractor.extract(
            "The Apple Inc board met Tim Cook. In Cupertino the apple inc team agreed. The end.",
        );
        assert_eq!(phrases, vec!["Apple Inc", "Tim Cook", "Cupertino"]);
    }
}
