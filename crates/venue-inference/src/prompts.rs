//! Extraction prompt, output schema, and per-record user prompt.

use serde_json::{json, Value as JsonValue};

use venue_core::{defaults, CandidateRecord, StructuredRequest};

/// Fixed system instruction for location extraction.
pub const SYSTEM_PROMPT: &str = "You extract a venue's physical city and country from noisy metadata. \
Return strict JSON per schema. If uncertain, return empty strings and low confidence. \
Prefer the venue location over HQ. Avoid guessing.";

/// Name of the structured-output schema.
pub const SCHEMA_NAME: &str = "location_schema";

/// Strict output schema: `{city, country, confidence, evidence}`, nothing else.
pub fn location_schema() -> JsonValue {
    json!({
        "type": "object",
        "properties": {
            "city": {"type": "string"},
            "country": {"type": "string"},
            "confidence": {"type": "number"},
            "evidence": {"type": "string"}
        },
        "required": ["city", "country", "confidence", "evidence"],
        "additionalProperties": false
    })
}

/// One `key: value` line per signal field; absent fields render empty.
pub fn build_user_prompt(record: &CandidateRecord) -> String {
    let field = |v: &Option<String>| v.clone().unwrap_or_default();
    [
        format!("id: {}", record.id),
        format!("name: {}", field(&record.name)),
        format!("alt_name: {}", field(&record.alt_name)),
        format!("address: {}", field(&record.address)),
        format!("website_url: {}", field(&record.website_url)),
        format!("domain: {}", field(&record.domain)),
        format!("linkedin_url: {}", field(&record.linkedin_url)),
        format!("phone: {}", field(&record.phone)),
        format!("ticket_vendor: {}", field(&record.ticket_vendor)),
        format!("ticket_vendor_source: {}", field(&record.ticket_vendor_source)),
        format!("notes: {}", field(&record.notes)),
    ]
    .join("\n")
}

/// Deterministic (temperature 0) structured request for `record`.
pub fn extraction_request(record: &CandidateRecord, max_tokens: u32) -> StructuredRequest {
    StructuredRequest {
        system: SYSTEM_PROMPT.to_string(),
        prompt: build_user_prompt(record),
        schema_name: SCHEMA_NAME.to_string(),
        schema: location_schema(),
        temperature: 0.0,
        max_tokens,
    }
}

/// Prompt version tag reported by health endpoints.
pub fn prompt_version() -> &'static str {
    defaults::PROMPT_VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_prompt_lists_every_field() {
        let record = CandidateRecord::new("v42")
            .with_name("Paradiso")
            .with_domain("paradiso.nl");
        let prompt = build_user_prompt(&record);

        assert!(prompt.starts_with("id: v42\n"));
        assert!(prompt.contains("name: Paradiso"));
        assert!(prompt.contains("domain: paradiso.nl"));
        assert!(prompt.contains("phone: \n"));
        assert!(prompt.ends_with("notes: "));
        assert_eq!(prompt.lines().count(), 11);
    }

    #[test]
    fn test_user_prompt_includes_ticket_vendor() {
        let record = CandidateRecord::new("v7")
            .with_name("Mohawk")
            .with_ticket_vendor("Eventbrite")
            .with_ticket_vendor_source("mohawkaustin.com/calendar");
        let prompt = build_user_prompt(&record);

        assert!(prompt.contains("ticket_vendor: Eventbrite\n"));
        assert!(prompt.contains("ticket_vendor_source: mohawkaustin.com/calendar\n"));
    }

    #[test]
    fn test_schema_is_strict() {
        let schema = location_schema();
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(schema["required"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_request_is_zero_temperature() {
        let request = extraction_request(&CandidateRecord::new("a"), 160);
        assert_eq!(request.temperature, 0.0);
        assert_eq!(request.max_tokens, 160);
        assert_eq!(request.schema_name, SCHEMA_NAME);
        assert_eq!(request.system, SYSTEM_PROMPT);
    }
}
