//! Rule-based location extraction used when the model is unavailable.
//!
//! The venue name and address are joined and split on commas. The trailing
//! segment is looked up in a small country table, falling back to its last
//! word when that word is a full country name (never an abbreviation such as
//! "us" or "gb", which also occur as ordinary words); when it
//! matches, the segment before it becomes the city candidate unless it names
//! an administrative unit ("city", "town", "municipality", ...).

use async_trait::async_trait;

use venue_core::{CandidateRecord, ExtractionResult, ExtractionStrategy, Result};

use crate::normalize::normalize_country;

/// Trailing tokens recognized as countries, matched case-insensitively.
const COUNTRY_TOKENS: &[(&str, &str)] = &[
    ("usa", "United States"),
    ("u.s.a.", "United States"),
    ("u.s.", "United States"),
    ("us", "United States"),
    ("united states", "United States"),
    ("uk", "United Kingdom"),
    ("u.k.", "United Kingdom"),
    ("gb", "United Kingdom"),
    ("england", "United Kingdom"),
    ("scotland", "United Kingdom"),
    ("wales", "United Kingdom"),
    ("united kingdom", "United Kingdom"),
    ("canada", "Canada"),
    ("australia", "Australia"),
    ("germany", "Germany"),
    ("deutschland", "Germany"),
    ("france", "France"),
    ("spain", "Spain"),
    ("españa", "Spain"),
    ("italy", "Italy"),
    ("italia", "Italy"),
    ("netherlands", "Netherlands"),
    ("ireland", "Ireland"),
    ("mexico", "Mexico"),
    ("méxico", "Mexico"),
    ("japan", "Japan"),
];

/// Words that mark a segment as an administrative unit rather than a city name.
const ADMIN_KEYWORDS: &[&str] = &[
    "city",
    "town",
    "municipality",
    "county",
    "district",
    "province",
    "state",
    "region",
];

const CONFIDENCE_CITY_AND_COUNTRY: f64 = 0.35;
const CONFIDENCE_COUNTRY_ONLY: f64 = 0.2;

/// Comma-split heuristic over name and address.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicStrategy;

impl HeuristicStrategy {
    pub fn new() -> Self {
        Self
    }

    /// Pure extraction; never fails.
    pub fn guess(record: &CandidateRecord) -> ExtractionResult {
        let text = [record.name.as_deref(), record.address.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        let segments: Vec<&str> = text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        let Some((last, rest)) = segments.split_last() else {
            return ExtractionResult::unknown();
        };

        let Some(country) = match_country(last) else {
            return ExtractionResult::unknown();
        };

        let city = rest
            .last()
            .map(|segment| city_candidate(segment))
            .unwrap_or_default();

        if city.is_empty() {
            ExtractionResult {
                city: String::new(),
                country,
                confidence: CONFIDENCE_COUNTRY_ONLY,
                evidence: format!("heuristic: trailing token '{}'", last),
            }
        } else {
            let evidence = format!("heuristic: '{}' before country token '{}'", city, last);
            ExtractionResult {
                city,
                country,
                confidence: CONFIDENCE_CITY_AND_COUNTRY,
                evidence,
            }
        }
    }
}

#[async_trait]
impl ExtractionStrategy for HeuristicStrategy {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn extract(&self, record: &CandidateRecord) -> Result<ExtractionResult> {
        Ok(Self::guess(record))
    }
}

/// Match a whole segment, then its last word, against the country table.
///
/// Abbreviations only count as a whole segment.
fn match_country(segment: &str) -> Option<String> {
    let lookup = |token: &str, allow_abbreviation: bool| {
        let lower = token.trim().to_lowercase();
        COUNTRY_TOKENS
            .iter()
            .filter(|(alias, _)| allow_abbreviation || !is_abbreviation(alias))
            .find(|(alias, _)| *alias == lower)
            .map(|(_, canonical)| normalize_country(canonical))
    };
    lookup(segment, true).or_else(|| {
        segment
            .split_whitespace()
            .last()
            .and_then(|word| lookup(word, false))
    })
}

fn is_abbreviation(alias: &str) -> bool {
    alias.chars().count() <= 3 || alias.contains('.')
}

/// Strip postal codes and reject administrative-unit names.
fn city_candidate(segment: &str) -> String {
    let words: Vec<&str> = segment
        .split_whitespace()
        .filter(|w| !w.chars().any(|c| c.is_ascii_digit()))
        .collect();
    if words.is_empty() {
        return String::new();
    }
    let is_admin = words.iter().any(|w| {
        let lower = w.to_lowercase();
        ADMIN_KEYWORDS.contains(&lower.as_str())
    });
    if is_admin {
        return String::new();
    }
    words.join(" ")
}
