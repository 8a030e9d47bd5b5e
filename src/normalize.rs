use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::models::{Event, Faculty, Level};

pub const UNTITLED: &str = "Untitled Event";

const TITLE_KEYS: [&str; 2] = ["title", "name"];
const DESCRIPTION_KEYS: [&str; 3] = ["description", "details", "summary"];
const FACULTY_KEYS: [&str; 2] = ["faculty", "school"];
const LEVEL_KEYS: [&str; 2] = ["level", "difficulty"];
const START_KEYS: [&str; 3] = ["start", "startDate", "date"];
const END_KEYS: [&str; 2] = ["end", "endDate"];
const LOCATION_KEYS: [&str; 2] = ["location", "venue"];
const URL_KEYS: [&str; 2] = ["url", "link"];
const ORGANIZER_KEYS: [&str; 2] = ["organizer", "host"];
const CATEGORY_KEYS: [&str; 4] = ["category", "categories", "tags", "topics"];
const TYPE_KEYS: [&str; 3] = ["type", "eventType", "format"];

/// Tokens on the left also yield the tags on the right. The token itself is
/// always kept; expansions are unioned in after it.
static SYNONYMS: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let entries: [(&str, &[&str]); 12] = [
        ("data science", &["ai"]),
        ("machine learning", &["ai"]),
        ("ml", &["ai"]),
        ("deep learning", &["ai"]),
        ("fintech", &["finance"]),
        ("quant", &["finance"]),
        ("web development", &["swe"]),
        ("software engineering", &["swe"]),
        ("coding", &["swe"]),
        ("startup", &["entrepreneurship"]),
        ("bootcamp", &["workshop"]),
        ("mixer", &["networking"]),
    ];
    entries.into_iter().collect()
});

/// Convert one heterogeneous raw record into the canonical shape. Never
/// fails: every missing or malformed field degrades to its default.
pub fn normalize(raw: &Value, source_index: usize) -> Event {
    let title = first_string(raw, &TITLE_KEYS)
        .map(|text| clean_text(&text))
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    let start = first_string(raw, &START_KEYS).and_then(|text| parse_instant(&text));
    let end = first_string(raw, &END_KEYS).and_then(|text| parse_instant(&text));

    let description = first_string(raw, &DESCRIPTION_KEYS)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| synthesize_description(raw));

    let id = explicit_id(raw)
        .unwrap_or_else(|| derived_id(&title, start.as_deref().unwrap_or(""), source_index));

    Event {
        id,
        title,
        description,
        faculty: first_string(raw, &FACULTY_KEYS)
            .map(|text| Faculty::parse(&text))
            .unwrap_or_default(),
        tags: derive_tags(raw),
        level: first_string(raw, &LEVEL_KEYS).and_then(|text| Level::from_text(&text)),
        start,
        end,
        location: first_string(raw, &LOCATION_KEYS).map(|text| clean_text(&text)),
        url: first_string(raw, &URL_KEYS),
        organizer: first_string(raw, &ORGANIZER_KEYS).map(|text| clean_text(&text)),
        is_custom: false,
        created_at: None,
        raw: raw.clone(),
    }
}

/// Collapse internal whitespace to single spaces and trim.
pub fn clean_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clean_token(input: &str) -> String {
    clean_text(input).to_lowercase()
}

fn first_string(raw: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match raw.get(key) {
            Some(Value::String(text)) if !text.trim().is_empty() => {
                return Some(text.trim().to_string())
            }
            Some(Value::Number(number)) => return Some(number.to_string()),
            _ => {}
        }
    }
    None
}

fn explicit_id(raw: &Value) -> Option<String> {
    match raw.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => Some(id.trim().to_string()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    }
}

/// Deterministic fallback id: the same record always hashes to the same id,
/// no matter how often the catalog is reloaded.
fn derived_id(title: &str, start: &str, source_index: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(b"|");
    hasher.update(start.as_bytes());
    hasher.update(b"|");
    hasher.update(source_index.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

fn derive_tags(raw: &Value) -> Vec<String> {
    let mut raw_tokens: Vec<String> = Vec::new();
    for key in &CATEGORY_KEYS {
        match raw.get(key) {
            Some(Value::Array(items)) => {
                for item in items {
                    match item {
                        Value::String(text) => raw_tokens.push(text.clone()),
                        Value::Number(number) => raw_tokens.push(number.to_string()),
                        _ => {}
                    }
                }
            }
            Some(Value::String(text)) => raw_tokens.push(text.clone()),
            _ => {}
        }
    }
    if let Some(type_text) = first_string(raw, &TYPE_KEYS) {
        for part in type_text.split('/') {
            raw_tokens.push(part.to_string());
        }
    }

    let mut tags: Vec<String> = Vec::new();
    for token in raw_tokens {
        let cleaned = clean_token(&token);
        if cleaned.is_empty() {
            continue;
        }
        if let Some(expansions) = SYNONYMS.get(cleaned.as_str()).copied() {
            push_unique(&mut tags, cleaned);
            for expansion in expansions {
                push_unique(&mut tags, expansion.to_string());
            }
        } else {
            push_unique(&mut tags, cleaned);
        }
    }
    tags
}

fn push_unique(tags: &mut Vec<String>, tag: String) {
    if !tags.iter().any(|existing| existing == &tag) {
        tags.push(tag);
    }
}

/// When the source has no description, fall back to whatever secondary
/// facts it does carry: type, price, application deadline.
fn synthesize_description(raw: &Value) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(type_text) = first_string(raw, &TYPE_KEYS) {
        let cleaned = clean_text(&type_text);
        if !cleaned.is_empty() {
            parts.push(cleaned);
        }
    }
    if let Some(price) = format_price(raw.get("price")) {
        parts.push(price);
    }
    if let Some(deadline) = first_string(raw, &["deadline"]) {
        let cleaned = clean_text(&deadline);
        if !cleaned.is_empty() {
            parts.push(format!("Deadline {cleaned}"));
        }
    }
    parts.join(" · ")
}

fn format_price(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::Number(number)) => {
            let amount = number.as_f64()?;
            if amount == 0.0 {
                Some("Free".to_string())
            } else if amount.fract() == 0.0 {
                Some(format!("${}", amount as i64))
            } else {
                Some(format!("${amount}"))
            }
        }
        Some(Value::String(text)) => {
            let cleaned = clean_text(text);
            if cleaned.is_empty() {
                None
            } else {
                Some(cleaned)
            }
        }
        _ => None,
    }
}

/// Accepts RFC 3339, naive date-times (assumed UTC), and bare dates.
/// Anything else degrades to `None`; the original text stays in `raw`.
pub fn parse_instant(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc).to_rfc3339());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(Utc.from_utc_datetime(&naive).to_rfc3339());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&midnight).to_rfc3339());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_the_workshop_record() {
        let raw = json!({
            "name": "Intro to ML",
            "difficulty": "Easy",
            "category": ["AI"],
            "type": "Workshop"
        });
        let event = normalize(&raw, 0);
        assert_eq!(event.title, "Intro to ML");
        assert_eq!(event.level, Some(Level::Beginner));
        assert_eq!(event.tags, vec!["ai".to_string(), "workshop".to_string()]);
        assert_eq!(event.description, "Workshop");
        assert_eq!(event.faculty, Faculty::All);
        assert!(!event.is_custom);
    }

    #[test]
    fn normalization_is_idempotent() {
        let raw = json!({
            "name": "Quant Night",
            "category": ["Data Science", "Finance"],
            "date": "2026-01-15T18:00:00Z"
        });
        let first = normalize(&raw, 3);
        let second = normalize(&raw, 3);
        assert_eq!(first.id, second.id);
        assert_eq!(first.tags, second.tags);
        assert_eq!(first.level, second.level);
        assert_eq!(first.start, second.start);
    }

    #[test]
    fn derived_ids_differ_by_source_index() {
        let raw = json!({"title": "Same Title"});
        assert_ne!(normalize(&raw, 0).id, normalize(&raw, 1).id);
    }

    #[test]
    fn explicit_id_is_preserved() {
        let raw = json!({"id": "evt-42", "title": "Known"});
        assert_eq!(normalize(&raw, 7).id, "evt-42");
    }

    #[test]
    fn synonyms_expand_and_dedupe_keeps_first_seen_order() {
        let raw = json!({
            "category": ["Data Science", "AI", " ai "],
            "type": "Workshop/Bootcamp"
        });
        let event = normalize(&raw, 0);
        assert_eq!(
            event.tags,
            vec![
                "data science".to_string(),
                "ai".to_string(),
                "workshop".to_string(),
                "bootcamp".to_string()
            ]
        );
    }

    #[test]
    fn description_synthesized_from_secondary_fields() {
        let raw = json!({
            "title": "Career Fair",
            "type": "Info Session",
            "price": 0,
            "deadline": "Mar 3"
        });
        let event = normalize(&raw, 0);
        assert_eq!(event.description, "Info Session · Free · Deadline Mar 3");

        let paid = json!({"title": "Gala", "price": 25});
        assert_eq!(normalize(&paid, 0).description, "$25");
    }

    #[test]
    fn malformed_record_degrades_to_defaults() {
        let event = normalize(&json!(null), 0);
        assert_eq!(event.title, UNTITLED);
        assert!(event.tags.is_empty());
        assert!(event.level.is_none());
        assert!(event.start.is_none());
        assert_eq!(event.description, "");
        assert!(!event.id.is_empty());
    }

    #[test]
    fn instants_parse_or_degrade() {
        let raw = json!({"title": "X", "start": "next tuesday", "end": "2026-02-01"});
        let event = normalize(&raw, 0);
        assert!(event.start.is_none());
        assert_eq!(event.end.as_deref(), Some("2026-02-01T00:00:00+00:00"));

        let naive = json!({"title": "Y", "start": "2026-02-01T18:30"});
        assert_eq!(
            normalize(&naive, 0).start.as_deref(),
            Some("2026-02-01T18:30:00+00:00")
        );
    }
}
