use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::models::Event;

pub const TAG_CLOUD_LIMIT: usize = 10;
pub const TRENDING_LIMIT: usize = 3;

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Tag frequencies across the pool: top 10 by count descending, equal
/// counts ordered lexicographically.
pub fn tag_cloud(pool: &[Event]) -> Vec<TagCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for event in pool {
        for tag in &event.tags {
            *counts.entry(tag.as_str()).or_insert(0) += 1;
        }
    }

    let mut entries: Vec<(&str, usize)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries.truncate(TAG_CLOUD_LIMIT);
    entries
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_string(),
            count,
        })
        .collect()
}

#[derive(Serialize, Clone, Debug)]
pub struct TrendingEvent {
    pub event: Event,
    pub count: u32,
}

/// The ledger's positive entries restricted to the current pool: top 3 by
/// save count descending, equal counts ordered lexicographically by id.
pub fn trending(pool: &[Event], ledger: &BTreeMap<String, u32>) -> Vec<TrendingEvent> {
    let mut entries: Vec<TrendingEvent> = ledger
        .iter()
        .filter(|(_, count)| **count > 0)
        .filter_map(|(id, count)| {
            pool.iter()
                .find(|event| &event.id == id)
                .map(|event| TrendingEvent {
                    event: event.clone(),
                    count: *count,
                })
        })
        .collect();

    entries.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.event.id.cmp(&b.event.id))
    });
    entries.truncate(TRENDING_LIMIT);
    entries
}
