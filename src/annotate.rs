use once_cell::sync::Lazy;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::models::Level;

#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error("annotation service unavailable: {0}")]
    Unavailable(String),
}

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8787/api/ai/summarize";
const MAX_TAGS: usize = 8;
const SUGGESTED_TAG_LIMIT: usize = 5;
const SUMMARY_SENTENCES: usize = 2;

/// Keyword vocabulary for the offline tag heuristic.
static TAG_KEYWORDS: Lazy<Vec<(&'static str, &'static [&'static str])>> = Lazy::new(|| {
    vec![
        (
            "ai",
            &[
                "ai",
                "artificial intelligence",
                "machine learning",
                "ml",
                "llm",
                "prompt",
                "computer vision",
                "nlp",
                "deep learning",
            ][..],
        ),
        (
            "finance",
            &[
                "finance",
                "fintech",
                "investment",
                "stocks",
                "trading",
                "portfolio",
                "quant",
                "valuation",
            ][..],
        ),
        (
            "swe",
            &[
                "software",
                "coding",
                "programming",
                "developer",
                "engineer",
                "web",
                "app",
                "fullstack",
                "frontend",
                "backend",
                "api",
            ][..],
        ),
        (
            "entrepreneurship",
            &[
                "startup",
                "founder",
                "pitch",
                "vc",
                "accelerator",
                "incubator",
                "entrepreneurship",
                "ideation",
            ][..],
        ),
        (
            "workshop",
            &["workshop", "hands-on", "tutorial", "lab", "bootcamp"][..],
        ),
        (
            "hackathon",
            &["hackathon", "hackcamp", "code sprint", "coding marathon"][..],
        ),
        (
            "networking",
            &["networking", "mixer", "meet and greet", "coffee chat"][..],
        ),
    ]
});

const CORE_TAGS: [&str; 4] = ["ai", "finance", "swe", "entrepreneurship"];
const EVENT_TYPE_TAGS: [&str; 3] = ["workshop", "hackathon", "networking"];

static LEVEL_HINTS: Lazy<Vec<(Level, &'static [&'static str])>> = Lazy::new(|| {
    vec![
        (
            Level::Advanced,
            &[
                "advanced",
                "deep dive",
                "graduate",
                "research",
                "theory-heavy",
                "rigorous",
            ][..],
        ),
        (
            Level::Intermediate,
            &[
                "intermediate",
                "some experience",
                "prior experience",
                "prerequisite",
                "familiar with",
            ][..],
        ),
        (
            Level::Beginner,
            &[
                "intro",
                "101",
                "no experience",
                "all levels",
                "getting started",
                "basics",
                "for everyone",
                "new to",
            ][..],
        ),
    ]
});

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Annotation {
    pub summary: String,
    pub tags: Vec<String>,
    pub level: Level,
    pub missing: Vec<String>,
}

impl Default for Annotation {
    fn default() -> Self {
        Self {
            summary: String::new(),
            tags: Vec::new(),
            level: Level::Beginner,
            missing: Vec::new(),
        }
    }
}

/// Client for the summarize endpoint. Purely an enrichment input to the
/// submission flow; filtering and ranking never depend on it.
pub struct AnnotationClient {
    endpoint: String,
    client: Client,
}

impl AnnotationClient {
    pub fn from_env() -> Self {
        let endpoint =
            std::env::var("ANNOTATE_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        Self {
            endpoint,
            client: Client::new(),
        }
    }

    pub async fn annotate(
        &self,
        title: &str,
        description: &str,
    ) -> Result<Annotation, AnnotateError> {
        let payload = json!({ "title": title, "description": description });
        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|err| AnnotateError::Unavailable(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| AnnotateError::Unavailable(err.to_string()))?;
        if !status.is_success() {
            return Err(AnnotateError::Unavailable(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        parse_annotation(&body)
    }

    /// Degrade to the local heuristics when the service is unreachable, so
    /// submission works with the collaborator entirely absent.
    pub async fn annotate_or_fallback(&self, title: &str, description: &str) -> Annotation {
        match self.annotate(title, description).await {
            Ok(annotation) => annotation,
            Err(err) => {
                eprintln!("annotation service unavailable, using heuristics: {err}");
                fallback_annotation(title, description)
            }
        }
    }
}

/// Sanitize a service response: tags lowercased/trimmed and capped, level
/// coerced into the closed set, missing coerced to a list.
pub fn parse_annotation(body: &str) -> Result<Annotation, AnnotateError> {
    let value: Value =
        serde_json::from_str(body).map_err(|err| AnnotateError::Unavailable(err.to_string()))?;

    let summary = value
        .get("summary")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string();

    let tags: Vec<String> = value
        .get("tags")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(|tag| tag.trim().to_lowercase())
                .filter(|tag| !tag.is_empty())
                .take(MAX_TAGS)
                .collect()
        })
        .unwrap_or_default();

    let level = value
        .get("level")
        .and_then(Value::as_str)
        .and_then(Level::from_text)
        .unwrap_or(Level::Beginner);

    let missing: Vec<String> = value
        .get("missing")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(Annotation {
        summary,
        tags,
        level,
        missing,
    })
}

pub fn fallback_annotation(title: &str, description: &str) -> Annotation {
    let combined = format!("{title} {description}");
    Annotation {
        summary: summarize(description),
        tags: suggest_tags(&combined),
        level: detect_level(&combined),
        missing: Vec::new(),
    }
}

/// Score each known tag by keyword hits; score descending, then name.
/// Core interest tags rank before event-type tags in the final pick.
pub fn suggest_tags(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut scored: Vec<(&str, usize)> = TAG_KEYWORDS
        .iter()
        .map(|(tag, words)| (*tag, words.iter().filter(|word| lower.contains(*word)).count()))
        .filter(|(_, score)| *score > 0)
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let ranked: Vec<&str> = scored.into_iter().map(|(tag, _)| tag).collect();

    let mut picked: Vec<String> = Vec::new();
    for group in [&CORE_TAGS[..], &EVENT_TYPE_TAGS[..]] {
        for tag in &ranked {
            if group.contains(tag) {
                picked.push(tag.to_string());
            }
        }
    }
    for tag in &ranked {
        if !CORE_TAGS.contains(tag) && !EVENT_TYPE_TAGS.contains(tag) {
            picked.push(tag.to_string());
        }
    }
    picked.truncate(SUGGESTED_TAG_LIMIT);
    picked
}

/// Strongest hint wins, checked most-specific first. Beginner is the
/// optimistic default when nothing matches.
pub fn detect_level(text: &str) -> Level {
    let lower = text.to_lowercase();
    for (level, hints) in LEVEL_HINTS.iter() {
        if hints.iter().any(|hint| lower.contains(hint)) {
            return *level;
        }
    }
    Level::Beginner
}

/// First couple of sentences of the text, whitespace collapsed.
pub fn summarize(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut sentences: Vec<String> = Vec::new();
    let mut current = String::new();
    for ch in collapsed.chars() {
        current.push(ch);
        if matches!(ch, '.' | '?' | '!') {
            let sentence = current.trim().to_string();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            current.clear();
        }
    }
    let tail = current.trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }

    if sentences.is_empty() {
        return "No description provided.".to_string();
    }
    sentences
        .into_iter()
        .take(SUMMARY_SENTENCES)
        .collect::<Vec<_>>()
        .join(" ")
}
