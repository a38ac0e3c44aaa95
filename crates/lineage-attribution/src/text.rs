//! Answer text handling: sections, sentences and tokens

use lineage_parser::strip_inline_markers;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

static REFERENCES_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:#{1,6}\s*)?(?:\*\*|__)?\s*references?\s*:?\s*(?:\*\*|__)?\s*:?\s*$")
        .unwrap_or_else(|e| panic!("references heading pattern is invalid: {}", e))
});

static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:#{1,6}\s+\S|(?:\*\*|__)[^*_]+(?:\*\*|__)\s*:?\s*$)")
        .unwrap_or_else(|e| panic!("heading pattern is invalid: {}", e))
});

static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*+•]|\d+[.)])\s+")
        .unwrap_or_else(|e| panic!("list marker pattern is invalid: {}", e))
});

static CITATION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*\[\s*(?:\^?\d+(?:\s*[,;-]\s*\^?\d+)*|kg|dc)\s*\]")
        .unwrap_or_else(|e| panic!("citation marker pattern is invalid: {}", e))
});

/// Words ignored when scoring lexical overlap
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few",
    "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "him",
    "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just", "me", "more",
    "most", "my", "no", "nor", "not", "now", "of", "off", "on", "once", "only", "or", "other",
    "our", "ours", "out", "over", "own", "same", "she", "should", "so", "some", "such", "than",
    "that", "the", "their", "theirs", "them", "then", "there", "these", "they", "this", "those",
    "through", "to", "too", "under", "until", "up", "very", "was", "we", "were", "what", "when",
    "where", "which", "while", "who", "whom", "why", "will", "with", "would", "you", "your",
];

/// Tokens whose trailing period does not end a sentence
pub const DEFAULT_ABBREVIATIONS: &[&str] = &[
    "inc", "corp", "co", "ltd", "mr", "mrs", "ms", "dr", "vs", "etc", "e.g", "i.e", "u.s", "no",
    "approx", "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec",
    "st", "jr", "sr",
];

/// File extensions stripped from reference entries
const REFERENCE_EXTENSIONS: &[&str] = &[
    ".eml", ".msg", ".pdf", ".txt", ".md", ".json", ".csv", ".html", ".htm", ".docx", ".xlsx",
];

/// An answer split into its body and its References section
#[derive(Debug, Default)]
pub(crate) struct AnswerSections<'a> {
    /// Lines outside the References section
    pub body: Vec<&'a str>,
    /// Lines inside the References section, heading excluded
    pub references: Vec<&'a str>,
}

/// Separate the References section (heading up to the next heading)
pub(crate) fn split_answer(answer: &str) -> AnswerSections<'_> {
    let mut sections = AnswerSections::default();
    let mut in_references = false;

    for line in answer.lines() {
        if REFERENCES_HEADING.is_match(line) {
            in_references = true;
            continue;
        }
        if in_references && HEADING.is_match(line) {
            in_references = false;
        }
        if in_references {
            sections.references.push(line);
        } else {
            sections.body.push(line);
        }
    }
    sections
}

/// Remove Markdown bullet, number, quote and heading markers plus emphasis
pub(crate) fn strip_markdown(line: &str) -> String {
    let line = line.trim_start().trim_start_matches('>').trim_start();
    let line = line.trim_start_matches('#').trim_start();
    let line = LIST_MARKER.replace(line, "");
    line.replace("**", "").replace("__", "").trim().to_string()
}

/// Whether the line is a list item
pub(crate) fn is_list_item(line: &str) -> bool {
    LIST_MARKER.is_match(line)
}

/// Remove the list marker from a line
pub(crate) fn strip_list_marker(line: &str) -> &str {
    match LIST_MARKER.find(line) {
        Some(m) => &line[m.end()..],
        None => line.trim_start(),
    }
}

/// Remove a known file extension from the end of a name
pub(crate) fn strip_file_extension(name: &str) -> &str {
    REFERENCE_EXTENSIONS
        .iter()
        .find_map(|ext| {
            let split = name.len().checked_sub(ext.len())?;
            let (stem, tail) = (name.get(..split)?, name.get(split..)?);
            tail.eq_ignore_ascii_case(ext).then_some(stem)
        })
        .unwrap_or(name)
}

/// Remove inline citation markers such as `[1]`, `[^2]`, `[1, 3]`, `[KG]`, `[DC]`
/// together with inline source markers such as `[EMAIL | subject: ...]`
pub fn strip_citation_markers(text: &str) -> String {
    let text = strip_inline_markers(text);
    CITATION_MARKER.replace_all(&text, "").trim().to_string()
}

/// Group body lines into prose units
///
/// Consecutive prose lines join into one paragraph; a blank line ends it.
/// List items and headings are always units of their own.
pub(crate) fn prose_units(lines: &[&str]) -> Vec<String> {
    let mut units = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();

    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            flush_paragraph(&mut units, &mut paragraph);
        } else if is_list_item(line) || HEADING.is_match(line) {
            flush_paragraph(&mut units, &mut paragraph);
            units.push(trimmed.to_string());
        } else {
            paragraph.push(trimmed);
        }
    }
    flush_paragraph(&mut units, &mut paragraph);
    units
}

fn flush_paragraph(units: &mut Vec<String>, paragraph: &mut Vec<&str>) {
    if !paragraph.is_empty() {
        units.push(paragraph.join(" "));
        paragraph.clear();
    }
}

/// Split text into sentences
///
/// `.`, `!` and `?` end a sentence when followed by whitespace or the end of
/// text. A period after a known abbreviation or a single-letter initial does
/// not; a period between digits is never followed by whitespace and so never
/// breaks either.
pub fn split_sentences(text: &str, abbreviations: &HashSet<String>) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        if chars.peek().is_some_and(|(_, next)| !next.is_whitespace()) {
            continue;
        }
        if c == '.' && is_non_terminal_period(&text[start..idx], abbreviations) {
            continue;
        }
        let end = idx + c.len_utf8();
        push_sentence(&mut sentences, &text[start..end]);
        start = end;
    }
    push_sentence(&mut sentences, &text[start..]);
    sentences
}

fn push_sentence(sentences: &mut Vec<String>, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        sentences.push(text.to_string());
    }
}

fn is_non_terminal_period(before: &str, abbreviations: &HashSet<String>) -> bool {
    let token = before.rsplit(char::is_whitespace).next().unwrap_or("");
    let token = token.trim_start_matches(|c: char| !c.is_alphanumeric());
    if token.is_empty() {
        return false;
    }
    if abbreviations.contains(&token.to_lowercase()) {
        return true;
    }
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphabetic())
}

/// Significant lowercase tokens of a text
///
/// Surrounding punctuation is stripped except `$` and `%`; stop words are
/// dropped; tokens shorter than two characters survive only if they contain
/// a digit.
pub fn tokenize(text: &str, stop_words: &HashSet<String>) -> BTreeSet<String> {
    text.split_whitespace()
        .filter_map(|raw| {
            let token = raw
                .trim_matches(|c: char| !c.is_alphanumeric() && c != '$' && c != '%')
                .to_lowercase();
            if token.is_empty() || stop_words.contains(&token) {
                return None;
            }
            let has_digit = token.chars().any(|c| c.is_ascii_digit());
            (token.chars().count() >= 2 || has_digit).then_some(token)
        })
        .collect()
}

/// Build a lowercase lookup set from a word list
pub(crate) fn word_set<S: AsRef<str>>(words: &[S]) -> HashSet<String> {
    words.iter().map(|w| w.as_ref().trim().to_lowercase()).collect()
}
