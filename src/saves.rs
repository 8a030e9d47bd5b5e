use std::collections::BTreeMap;

use crate::storage::{self, KvStore, StoreError, SAVED_IDS_KEY, SAVE_COUNTS_KEY};

/// Ids the user currently has saved, in the order they were saved.
pub fn saved_ids(store: &dyn KvStore) -> Vec<String> {
    storage::read_json_or_default(store, SAVED_IDS_KEY)
}

/// The save-count ledger feeding the trending rank. Entries are strictly
/// positive; an id nobody has saved is absent.
pub fn save_counts(store: &dyn KvStore) -> BTreeMap<String, u32> {
    storage::read_json_or_default(store, SAVE_COUNTS_KEY)
}

pub fn is_saved(store: &dyn KvStore, id: &str) -> bool {
    saved_ids(store).iter().any(|existing| existing == id)
}

/// Flip the saved state of one id, keeping the saved-ids set and the ledger
/// paired: both new values are computed first, then written, and the first
/// write is reverted if the second fails. Returns the new saved state.
pub fn toggle_save(store: &dyn KvStore, id: &str) -> Result<bool, StoreError> {
    let previous_ids = saved_ids(store);
    let mut counts = save_counts(store);
    let was_saved = previous_ids.iter().any(|existing| existing == id);

    let next_ids: Vec<String> = if was_saved {
        previous_ids
            .iter()
            .filter(|existing| existing.as_str() != id)
            .cloned()
            .collect()
    } else {
        let mut ids = previous_ids.clone();
        ids.push(id.to_string());
        ids
    };

    if was_saved {
        let next = counts.get(id).copied().unwrap_or(0).saturating_sub(1);
        if next == 0 {
            counts.remove(id);
        } else {
            counts.insert(id.to_string(), next);
        }
    } else {
        *counts.entry(id.to_string()).or_insert(0) += 1;
    }

    storage::write_json(store, SAVED_IDS_KEY, &next_ids)?;
    if let Err(err) = storage::write_json(store, SAVE_COUNTS_KEY, &counts) {
        if let Err(revert_err) = storage::write_json(store, SAVED_IDS_KEY, &previous_ids) {
            eprintln!("failed to revert saved ids after ledger write failure: {revert_err}");
        }
        return Err(err);
    }

    Ok(!was_saved)
}

/// Wipe both the saved-ids set and the ledger.
pub fn clear_saves(store: &dyn KvStore) -> Result<(), StoreError> {
    store.remove(SAVED_IDS_KEY)?;
    store.remove(SAVE_COUNTS_KEY)
}
