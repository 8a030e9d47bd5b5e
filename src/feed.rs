use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Event, Faculty, Level, UserProfile};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    All,
    Personalized,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Trending,
    Date,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedQuery {
    pub level: Option<Level>,
    pub tags: Vec<String>,
    pub search: String,
    pub sort: SortMode,
}

/// Custom events first (newest submissions surface on top), then catalog
/// events in source order. Ids are not deduplicated across the two sources;
/// `find_event` resolves a collision to the first, custom, occurrence.
pub fn merge(custom: Vec<Event>, catalog: Vec<Event>) -> Vec<Event> {
    let mut pool = custom;
    pool.extend(catalog);
    pool
}

/// Narrow the pool to the user's faculty and interests. Without a profile
/// there is nothing to personalize on, so the full pool comes back — same
/// as `ViewMode::All`. No date filtering in either mode: past events stay
/// visible.
pub fn personalize(pool: &[Event], profile: Option<&UserProfile>, mode: ViewMode) -> Vec<Event> {
    let profile = match (mode, profile) {
        (ViewMode::Personalized, Some(profile)) => profile,
        _ => return pool.to_vec(),
    };

    pool.iter()
        .filter(|event| {
            let faculty_ok =
                event.faculty == Faculty::All || event.faculty == profile.faculty;
            let interest_ok = event
                .tags
                .iter()
                .any(|tag| profile.interests.iter().any(|interest| interest == tag));
            faculty_ok && interest_ok
        })
        .cloned()
        .collect()
}

/// Level filter, then tag filter, then free-text search, then sort.
pub fn apply_query(pool: &[Event], query: &FeedQuery, saved: &HashSet<String>) -> Vec<Event> {
    let mut result: Vec<Event> = pool
        .iter()
        .filter(|event| query.level.map_or(true, |level| event.level == Some(level)))
        .filter(|event| {
            query.tags.is_empty()
                || event
                    .tags
                    .iter()
                    .any(|tag| query.tags.iter().any(|wanted| wanted == tag))
        })
        .filter(|event| matches_query(event, &query.search))
        .cloned()
        .collect();

    match query.sort {
        SortMode::Date => result.sort_by_key(start_sort_key),
        SortMode::Trending => result.sort_by_key(|event| !saved.contains(&event.id)),
    }
    result
}

/// Every whitespace-separated token must appear somewhere in the event's
/// searchable text. An empty query matches everything.
fn matches_query(event: &Event, query: &str) -> bool {
    if query.trim().is_empty() {
        return true;
    }
    let mut parts: Vec<&str> = vec![
        event.title.as_str(),
        event.description.as_str(),
        event.organizer.as_deref().unwrap_or(""),
        event.location.as_deref().unwrap_or(""),
    ];
    parts.extend(event.tags.iter().map(String::as_str));
    let hay = parts.join(" ").to_lowercase();

    query
        .to_lowercase()
        .split_whitespace()
        .all(|token| hay.contains(token))
}

pub fn start_instant(event: &Event) -> Option<DateTime<Utc>> {
    event
        .start
        .as_deref()
        .and_then(|start| DateTime::parse_from_rfc3339(start).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
}

// Missing or unparseable starts sort last; sort_by_key is stable so equal
// keys keep input order.
fn start_sort_key(event: &Event) -> (bool, i64) {
    match start_instant(event) {
        Some(instant) => (false, instant.timestamp_millis()),
        None => (true, 0),
    }
}

/// Single-event lookup across the merged pool (deep links).
pub fn find_event<'a>(pool: &'a [Event], id: &str) -> Option<&'a Event> {
    pool.iter().find(|event| event.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str) -> Event {
        Event {
            id: id.to_string(),
            title: format!("Event {id}"),
            ..Event::default()
        }
    }

    fn profile() -> UserProfile {
        UserProfile {
            name: "Alex".to_string(),
            faculty: Faculty::Science,
            interests: vec!["ai".to_string(), "finance".to_string()],
        }
    }

    #[test]
    fn merge_puts_custom_events_first() {
        let mut custom = event("c1");
        custom.is_custom = true;
        let merged = merge(vec![custom], vec![event("f1"), event("f2")]);
        let ids: Vec<&str> = merged.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "f1", "f2"]);
    }

    #[test]
    fn personalized_without_profile_shows_everything() {
        let pool = vec![event("a"), event("b")];
        let all = personalize(&pool, None, ViewMode::All);
        let personalized = personalize(&pool, None, ViewMode::Personalized);
        assert_eq!(all.len(), pool.len());
        assert_eq!(personalized.len(), pool.len());
    }

    #[test]
    fn personalized_filters_by_faculty_and_interest() {
        let mut match_both = event("a");
        match_both.faculty = Faculty::Science;
        match_both.tags = vec!["ai".to_string()];

        let mut sentinel_faculty = event("b");
        sentinel_faculty.faculty = Faculty::All;
        sentinel_faculty.tags = vec!["finance".to_string()];

        let mut wrong_faculty = event("c");
        wrong_faculty.faculty = Faculty::Sauder;
        wrong_faculty.tags = vec!["ai".to_string()];

        let mut no_interest_overlap = event("d");
        no_interest_overlap.faculty = Faculty::Science;
        no_interest_overlap.tags = vec!["networking".to_string()];

        let pool = vec![match_both, sentinel_faculty, wrong_faculty, no_interest_overlap];
        let kept = personalize(&pool, Some(&profile()), ViewMode::Personalized);
        let ids: Vec<&str> = kept.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn date_sort_is_stable_and_puts_missing_starts_last() {
        let mut a = event("a");
        a.start = Some("2026-01-10T09:00:00+00:00".to_string());
        let b = event("b"); // no start
        let mut c = event("c");
        c.start = Some("2025-12-01T09:00:00+00:00".to_string());
        let d = event("d"); // no start

        let pool = vec![b.clone(), a.clone(), d.clone(), c.clone()];
        let query = FeedQuery {
            sort: SortMode::Date,
            ..FeedQuery::default()
        };
        let sorted = apply_query(&pool, &query, &HashSet::new());
        let ids: Vec<&str> = sorted.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn trending_sort_partitions_saved_first() {
        let pool = vec![event("a"), event("b"), event("c")];
        let saved: HashSet<String> = ["c".to_string()].into_iter().collect();
        let sorted = apply_query(&pool, &FeedQuery::default(), &saved);
        let ids: Vec<&str> = sorted.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn search_requires_every_token() {
        let mut ai_event = event("a");
        ai_event.tags = vec!["ai".to_string()];
        ai_event.description = "Hands-on workshop".to_string();

        let mut finance_event = event("b");
        finance_event.tags = vec!["finance".to_string()];
        finance_event.description = "Workshop on markets".to_string();

        let pool = vec![ai_event, finance_event];
        let query = FeedQuery {
            search: "ai workshop".to_string(),
            ..FeedQuery::default()
        };
        let matched = apply_query(&pool, &query, &HashSet::new());
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, "a");
    }

    #[test]
    fn blank_search_matches_everything() {
        let pool = vec![event("a"), event("b")];
        let query = FeedQuery {
            search: "   ".to_string(),
            ..FeedQuery::default()
        };
        assert_eq!(apply_query(&pool, &query, &HashSet::new()).len(), 2);
    }

    #[test]
    fn level_filter_excludes_unleveled_events() {
        let mut beginner = event("a");
        beginner.level = Some(Level::Beginner);
        let unleveled = event("b");

        let pool = vec![beginner, unleveled];
        let query = FeedQuery {
            level: Some(Level::Beginner),
            ..FeedQuery::default()
        };
        let matched = apply_query(&pool, &query, &HashSet::new());
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, "a");
    }

    #[test]
    fn tag_filter_inactive_when_empty() {
        let mut tagged = event("a");
        tagged.tags = vec!["ai".to_string()];
        let untagged = event("b");

        let pool = vec![tagged, untagged];
        assert_eq!(
            apply_query(&pool, &FeedQuery::default(), &HashSet::new()).len(),
            2
        );

        let query = FeedQuery {
            tags: vec!["ai".to_string()],
            ..FeedQuery::default()
        };
        let matched = apply_query(&pool, &query, &HashSet::new());
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, "a");
    }

    #[test]
    fn find_event_returns_first_occurrence() {
        let mut custom = event("dup");
        custom.is_custom = true;
        let pool = merge(vec![custom], vec![event("dup"), event("other")]);
        let found = find_event(&pool, "dup").expect("lookup");
        assert!(found.is_custom);
        assert!(find_event(&pool, "nope").is_none());
    }
}
