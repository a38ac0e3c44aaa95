//! Numeric claim extraction and conflict detection
//!
//! Only numbers with an explicit unit are claims: percentages, currency
//! amounts and magnitude-suffixed figures (`$5.9B`, `3.5%`, `24 million`).
//! Bare numbers such as years or quarter labels are ignored. Non-numeric
//! contradictions are not detected.

use crate::evidence::EvidenceSource;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

static NUMERIC_CLAIM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        concat!(
            r"(?i)(?P<currency>[$€£]\s?)?",
            r"\b(?P<number>\d{1,3}(?:,\d{3})+|\d+)(?P<fraction>\.\d+)?",
            r"(?:\s?(?P<suffix>%|percent\b|trillion\b|billion\b|million\b|thousand\b",
            r"|tn\b|bn\b|[tbmk]\b))?",
        ),
    )
    .unwrap_or_else(|e| panic!("numeric claim pattern is invalid: {}", e))
});

/// Words on either side of a number kept as its context
const CONTEXT_WINDOW: usize = 5;

const CONTEXT_STOP_WORDS: &[&str] = &[
    "the", "and", "for", "was", "were", "with", "from", "that", "this", "has", "had", "have",
    "are", "its", "our", "their", "about", "over", "into", "than", "per", "while", "which",
    "been", "also", "reported", "reached", "grew", "rose", "fell", "increased", "decreased",
    "approximately", "around", "nearly", "total", "year", "quarter",
];

/// Metric nouns shared by many different quantities; they never identify a
/// subject on their own
const GENERIC_METRIC_WORDS: &[&str] = &[
    "revenue", "revenues", "sales", "margin", "margins", "growth", "income", "profit",
    "profits", "earnings", "share", "shares", "price", "value", "rate", "cost", "costs",
];

/// Unit of a numeric claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericUnit {
    /// `%` or `percent`
    Percent,
    /// Currency amount, normalised by any magnitude suffix
    Currency,
    /// Magnitude-suffixed count without a currency symbol
    Scaled,
}

impl NumericUnit {
    /// Get the unit name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            NumericUnit::Percent => "percent",
            NumericUnit::Currency => "currency",
            NumericUnit::Scaled => "scaled",
        }
    }
}

/// A unit-bearing number found in a source
#[derive(Debug, Clone, PartialEq)]
pub struct NumericClaim {
    /// Normalised value (magnitude suffixes applied)
    pub value: f64,
    /// Unit of the value
    pub unit: NumericUnit,
    /// Text as written (e.g. `$5.9B`)
    pub raw: String,
    /// Significant words around the number, lowercased
    pub context: BTreeSet<String>,
}

/// One side of a conflict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictingValue {
    /// Reference id of the source
    pub reference_id: String,
    /// Normalised value
    pub value: f64,
    /// Text as written
    pub raw: String,
    /// Confidence of the source
    pub confidence: f64,
}

/// The most divergent group of same-claim numbers across sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictReport {
    /// Context words the conflicting values share
    pub subject: String,
    /// Unit shared by the values
    pub unit: NumericUnit,
    /// Conflicting values in source order
    pub values: Vec<ConflictingValue>,
    /// `(max − min) / min(|v|)`
    pub divergence: f64,
    /// Population standard deviation over |mean|
    pub coefficient_of_variation: f64,
}

/// Extract unit-bearing numeric claims from text
pub fn extract_claims(text: &str) -> Vec<NumericClaim> {
    NUMERIC_CLAIM
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let currency = caps.name("currency").is_some();
            let suffix = caps.name("suffix").map(|m| m.as_str().to_lowercase());
            if !currency && suffix.is_none() {
                return None;
            }

            let mut digits = caps.name("number")?.as_str().replace(',', "");
            if let Some(fraction) = caps.name("fraction") {
                digits.push_str(fraction.as_str());
            }
            let number: f64 = digits.parse().ok()?;

            let (unit, multiplier) = match suffix.as_deref() {
                Some("%") | Some("percent") => (NumericUnit::Percent, 1.0),
                other => {
                    let multiplier = other.map(magnitude).unwrap_or(1.0);
                    let unit = if currency {
                        NumericUnit::Currency
                    } else {
                        NumericUnit::Scaled
                    };
                    (unit, multiplier)
                }
            };

            Some(NumericClaim {
                value: number * multiplier,
                unit,
                raw: whole.as_str().trim().to_string(),
                context: context_words(&text[..whole.start()], &text[whole.end()..]),
            })
        })
        .collect()
}

fn magnitude(suffix: &str) -> f64 {
    match suffix {
        "t" | "tn" | "trillion" => 1e12,
        "b" | "bn" | "billion" => 1e9,
        "m" | "million" => 1e6,
        "k" | "thousand" => 1e3,
        _ => 1.0,
    }
}

fn context_words(before: &str, after: &str) -> BTreeSet<String> {
    let before: Vec<&str> = before.split_whitespace().collect();
    let preceding = before.iter().rev().take(CONTEXT_WINDOW);
    let following = after.split_whitespace().take(CONTEXT_WINDOW);

    preceding
        .copied()
        .chain(following)
        .filter_map(|word| {
            let word = word
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            let significant = word.len() >= 3
                && word.chars().all(char::is_alphabetic)
                && !CONTEXT_STOP_WORDS.contains(&word.as_str());
            significant.then_some(word)
        })
        .collect()
}

/// Find the most divergent numeric conflict across sources
///
/// Two claims refer to the same quantity when they come from different
/// sources, share a unit and share a context word. When both claims name a
/// specific subject (a context word that is not a generic metric noun), the
/// subjects must overlap too, so "iPhone revenue" and "Services revenue"
/// stay apart. Connected claims form a group; a group conflicts when its
/// divergence exceeds `tolerance`.
pub fn find_conflict(sources: &[EvidenceSource], tolerance: f64) -> Option<ConflictReport> {
    let claims: Vec<(usize, NumericClaim)> = sources
        .iter()
        .enumerate()
        .flat_map(|(idx, source)| {
            extract_claims(&source.content)
                .into_iter()
                .map(move |claim| (idx, claim))
        })
        .collect();

    let mut best: Option<ConflictReport> = None;
    for group in group_claims(&claims) {
        let Some(report) = report_for_group(&group, &claims, sources) else {
            continue;
        };
        if report.divergence <= tolerance {
            continue;
        }
        if best.as_ref().map_or(true, |b| report.divergence > b.divergence) {
            best = Some(report);
        }
    }
    best
}

fn same_quantity(a: &(usize, NumericClaim), b: &(usize, NumericClaim)) -> bool {
    a.0 != b.0 && a.1.unit == b.1.unit && same_subject(&a.1.context, &b.1.context)
}

fn same_subject(a: &BTreeSet<String>, b: &BTreeSet<String>) -> bool {
    if a.is_disjoint(b) {
        return false;
    }
    let specific = |words: &BTreeSet<String>| -> BTreeSet<String> {
        words
            .iter()
            .filter(|w| !GENERIC_METRIC_WORDS.contains(&w.as_str()))
            .cloned()
            .collect()
    };
    let (a, b) = (specific(a), specific(b));
    a.is_empty() || b.is_empty() || !a.is_disjoint(&b)
}

/// Connected components of the same-quantity relation, in claim order
fn group_claims(claims: &[(usize, NumericClaim)]) -> Vec<Vec<usize>> {
    let mut assigned = vec![false; claims.len()];
    let mut groups = Vec::new();

    for start in 0..claims.len() {
        if assigned[start] {
            continue;
        }
        assigned[start] = true;
        let mut group = vec![start];
        let mut cursor = 0;
        while cursor < group.len() {
            let current = group[cursor];
            for other in 0..claims.len() {
                if !assigned[other] && same_quantity(&claims[current], &claims[other]) {
                    assigned[other] = true;
                    group.push(other);
                }
            }
            cursor += 1;
        }
        if group.len() > 1 {
            group.sort_unstable();
            groups.push(group);
        }
    }
    groups
}

fn report_for_group(
    group: &[usize],
    claims: &[(usize, NumericClaim)],
    sources: &[EvidenceSource],
) -> Option<ConflictReport> {
    let values: Vec<f64> = group.iter().map(|&i| claims[i].1.value).collect();
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let min_abs = values.iter().map(|v| v.abs()).fold(f64::INFINITY, f64::min);
    if !max.is_finite() || !min.is_finite() {
        return None;
    }

    let spread = max - min;
    let divergence = if min_abs > 0.0 {
        spread / min_abs
    } else if spread > 0.0 {
        1.0
    } else {
        0.0
    };

    let first = &claims[*group.first()?].1;
    let mut shared = first.context.clone();
    for &i in group.iter().skip(1) {
        let narrowed: BTreeSet<String> =
            shared.intersection(&claims[i].1.context).cloned().collect();
        if !narrowed.is_empty() {
            shared = narrowed;
        }
    }

    Some(ConflictReport {
        subject: shared.into_iter().collect::<Vec<_>>().join(" "),
        unit: first.unit,
        values: group
            .iter()
            .map(|&i| {
                let (source_idx, claim) = &claims[i];
                let source = &sources[*source_idx];
                ConflictingValue {
                    reference_id: source.reference_id.clone(),
                    value: claim.value,
                    raw: claim.raw.clone(),
                    confidence: source.confidence,
                }
            })
            .collect(),
        divergence,
        coefficient_of_variation: coefficient_of_variation(&values),
    })
}

/// Population standard deviation over |mean|; 1.0 when the mean is zero
pub(crate) fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    if mean.abs() > 0.0 {
        variance.sqrt() / mean.abs()
    } else if variance > 0.0 {
        1.0
    } else {
        0.0
    }
}
