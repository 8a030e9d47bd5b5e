use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::models::{Event, Faculty, Level};
use crate::normalize::{clean_text, parse_instant};
use crate::storage::{self, KvStore, StoreError, CUSTOM_EVENTS_KEY};

/// Ids stamped on unpublished live previews; replaced at publish time.
static PREVIEW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^preview_").expect("valid preview sentinel regex"));

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct EventDraft {
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub faculty: Option<Faculty>,
    pub level: Option<Level>,
    pub tags: Vec<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
    pub organizer: Option<String>,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Required-field check for the submission flow. Returns the names of every
/// field still missing; an empty list means the draft is publishable.
pub fn missing_fields(draft: &EventDraft) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if draft.title.trim().is_empty() {
        missing.push("title");
    }
    if draft.faculty.is_none() {
        missing.push("faculty");
    }
    if draft
        .location
        .as_deref()
        .map(str::trim)
        .unwrap_or("")
        .is_empty()
    {
        missing.push("location");
    }
    if draft.start.as_deref().map(str::trim).unwrap_or("").is_empty() {
        missing.push("start");
    }
    missing
}

/// Publish a draft into the local store. Rejects incomplete drafts without
/// committing anything. A fresh id is assigned only when the draft carries
/// none or a `preview_` sentinel; a stable caller id survives republish.
pub fn add_custom_event(store: &dyn KvStore, draft: &EventDraft) -> Result<Event, SubmitError> {
    let missing = missing_fields(draft);
    if !missing.is_empty() {
        return Err(SubmitError::MissingFields(missing));
    }

    let created_at = Utc::now().to_rfc3339();
    let id = match draft.id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() && !PREVIEW_RE.is_match(id) => id.to_string(),
        _ => custom_id(&draft.title, draft.start.as_deref().unwrap_or(""), &created_at),
    };

    let event = Event {
        id,
        title: clean_text(&draft.title),
        description: draft.description.trim().to_string(),
        faculty: draft.faculty.unwrap_or_default(),
        tags: clean_tags(&draft.tags),
        level: draft.level,
        start: draft.start.as_deref().and_then(parse_instant),
        end: draft.end.as_deref().and_then(parse_instant),
        location: draft.location.as_deref().map(clean_text),
        url: draft.url.clone(),
        organizer: draft.organizer.as_deref().map(clean_text),
        is_custom: true,
        created_at: Some(created_at),
        raw: serde_json::to_value(draft).unwrap_or(Value::Null),
    };

    let mut list = list_custom_events(store);
    list.push(event.clone());
    storage::write_json(store, CUSTOM_EVENTS_KEY, &list)?;
    Ok(event)
}

pub fn list_custom_events(store: &dyn KvStore) -> Vec<Event> {
    storage::read_json_or_default(store, CUSTOM_EVENTS_KEY)
}

pub fn remove_custom_event(store: &dyn KvStore, id: &str) -> Result<(), StoreError> {
    let next: Vec<Event> = list_custom_events(store)
        .into_iter()
        .filter(|event| event.id != id)
        .collect();
    storage::write_json(store, CUSTOM_EVENTS_KEY, &next)
}

pub fn clear_custom_events(store: &dyn KvStore) -> Result<(), StoreError> {
    storage::write_json(store, CUSTOM_EVENTS_KEY, &Vec::<Event>::new())
}

fn clean_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let cleaned = clean_text(tag).to_lowercase();
        if cleaned.is_empty() || out.iter().any(|existing| existing == &cleaned) {
            continue;
        }
        out.push(cleaned);
    }
    out
}

fn custom_id(title: &str, start: &str, created_at: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(b"|");
    hasher.update(start.as_bytes());
    hasher.update(b"|");
    hasher.update(created_at.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("cust_{}", &digest[..16])
}
