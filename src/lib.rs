pub mod annotate;
pub mod catalog;
pub mod custom;
pub mod feed;
pub mod models;
pub mod normalize;
pub mod profile;
pub mod rank;
pub mod saves;
pub mod storage;
mod utils;

use std::collections::HashSet;

use serde::Serialize;

use feed::{FeedQuery, ViewMode};
use models::Event;
use rank::{TagCount, TrendingEvent};
use storage::KvStore;

#[derive(Serialize, Clone, Debug)]
pub struct FeedPage {
    pub events: Vec<Event>,
    pub tag_cloud: Vec<TagCount>,
    pub trending: Vec<TrendingEvent>,
}

/// Assemble the view for one user: merge local submissions into the
/// catalog, narrow by profile, then aggregate and query the result.
pub fn build_feed(
    store: &dyn KvStore,
    catalog_events: Vec<Event>,
    mode: ViewMode,
    query: &FeedQuery,
) -> FeedPage {
    let user = profile::load_profile(store);
    let pool = feed::merge(custom::list_custom_events(store), catalog_events);
    let pool = feed::personalize(&pool, user.as_ref(), mode);

    let tag_cloud = rank::tag_cloud(&pool);
    let trending = rank::trending(&pool, &saves::save_counts(store));

    let saved: HashSet<String> = saves::saved_ids(store).into_iter().collect();
    let events = feed::apply_query(&pool, query, &saved);

    FeedPage {
        events,
        tag_cloud,
        trending,
    }
}

/// Fetch the catalog (empty on failure — the page still renders), then
/// build the view.
pub async fn load_feed(
    store: &dyn KvStore,
    catalog_url: &str,
    mode: ViewMode,
    query: &FeedQuery,
) -> FeedPage {
    let catalog_events = catalog::fetch_catalog_or_empty(catalog_url).await;
    build_feed(store, catalog_events, mode, query)
}
