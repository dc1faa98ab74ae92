//! Content fingerprints used as cache keys.
//!
//! A fingerprint is the SHA-256 digest of a canonical JSON object built from a
//! fixed, sorted subset of a record's signal fields. Records that share those
//! fields share a fingerprint no matter how their ids or other fields differ.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::CandidateRecord;

/// Signal fields that participate in the fingerprint, in canonical (sorted) order.
pub const FINGERPRINT_FIELDS: [&str; 6] = [
    "alt_name",
    "domain",
    "linkedin_url",
    "name",
    "phone",
    "website_url",
];

/// Lowercase hex SHA-256 digest of a record's identifying signals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint of a record. Absent fields hash as empty strings.
    pub fn of(record: &CandidateRecord) -> Self {
        let digest = Sha256::digest(canonical_payload(record).as_bytes());
        Fingerprint(hex::encode(digest))
    }

    /// Wrap an existing hex digest (e.g. a key read back from the cache).
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Fingerprint(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex chars, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn field_value<'a>(record: &'a CandidateRecord, field: &str) -> &'a str {
    let value = match field {
        "alt_name" => &record.alt_name,
        "domain" => &record.domain,
        "linkedin_url" => &record.linkedin_url,
        "name" => &record.name,
        "phone" => &record.phone,
        "website_url" => &record.website_url,
        _ => &None,
    };
    value.as_deref().unwrap_or("")
}

/// `{"alt_name": "...", "domain": "...", ...}` with keys in sorted order and
/// JSON string escaping for values.
fn canonical_payload(record: &CandidateRecord) -> String {
    let entries: Vec<String> = FINGERPRINT_FIELDS
        .iter()
        .map(|field| {
            let value = serde_json::Value::String(field_value(record, field).to_string());
            format!("\"{}\": {}", field, value)
        })
        .collect();
    format!("{{{}}}", entries.join(", "))
}
