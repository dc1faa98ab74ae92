//! Canonical forms for extracted locations.

use venue_core::ExtractionResult;

/// Known aliases, matched case-insensitively after trimming.
const COUNTRY_ALIASES: &[(&str, &str)] = &[
    ("usa", "United States"),
    ("u.s.a.", "United States"),
    ("u.s.a", "United States"),
    ("u.s.", "United States"),
    ("us", "United States"),
    ("united states of america", "United States"),
    ("uk", "United Kingdom"),
    ("u.k.", "United Kingdom"),
    ("england", "United Kingdom"),
];

/// Canonical display form of a country name.
///
/// Known aliases map to their canonical name; anything else is lowercased
/// and each whitespace-separated word is capitalized. Blank input stays blank.
pub fn normalize_country(country: &str) -> String {
    let trimmed = country.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let lower = trimmed.to_lowercase();
    if let Some((_, canonical)) = COUNTRY_ALIASES.iter().find(|(alias, _)| *alias == lower) {
        return canonical.to_string();
    }
    lower
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Trim text fields, canonicalize the country, and clamp confidence to `[0, 1]`.
pub fn sanitize(result: ExtractionResult) -> ExtractionResult {
    let confidence = if result.confidence.is_finite() {
        result.confidence.clamp(0.0, 1.0)
    } else {
        0.0
    };
    ExtractionResult {
        city: result.city.trim().to_string(),
        country: normalize_country(&result.country),
        confidence,
        evidence: result.evidence.trim().to_string(),
    }
}
