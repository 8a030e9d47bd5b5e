use thiserror::Error;

use crate::models::UserProfile;
use crate::storage::{self, KvStore, StoreError, PROFILE_KEY};

pub const MIN_INTERESTS: usize = 2;
pub const MAX_INTERESTS: usize = 5;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("invalid profile: {}", .0.join(", "))]
    Invalid(Vec<&'static str>),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Problems that make a profile unsaveable; empty means valid.
pub fn validate(profile: &UserProfile) -> Vec<&'static str> {
    let mut problems = Vec::new();
    if profile.name.trim().is_empty() {
        problems.push("name is required");
    }
    if profile.interests.len() < MIN_INTERESTS || profile.interests.len() > MAX_INTERESTS {
        problems.push("pick 2-5 interests");
    }
    problems
}

/// `None` both when nothing is stored and when the payload is corrupt —
/// the filter degrades to show-everything either way.
pub fn load_profile(store: &dyn KvStore) -> Option<UserProfile> {
    storage::read_json_or_default(store, PROFILE_KEY)
}

pub fn save_profile(store: &dyn KvStore, profile: &UserProfile) -> Result<(), ProfileError> {
    let problems = validate(profile);
    if !problems.is_empty() {
        return Err(ProfileError::Invalid(problems));
    }
    storage::write_json(store, PROFILE_KEY, profile)?;
    Ok(())
}

pub fn clear_profile(store: &dyn KvStore) -> Result<(), StoreError> {
    store.remove(PROFILE_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Faculty;
    use crate::storage::MemoryStore;

    fn profile() -> UserProfile {
        UserProfile {
            name: "Alex".to_string(),
            faculty: Faculty::Engineering,
            interests: vec!["ai".to_string(), "swe".to_string()],
        }
    }

    #[test]
    fn save_and_load_round_trip() {
        let store = MemoryStore::new();
        assert!(load_profile(&store).is_none());
        save_profile(&store, &profile()).expect("save");
        let loaded = load_profile(&store).expect("profile present");
        assert_eq!(loaded, profile());
    }

    #[test]
    fn invalid_profiles_are_rejected() {
        let store = MemoryStore::new();
        let mut unnamed = profile();
        unnamed.name = "  ".to_string();
        assert!(save_profile(&store, &unnamed).is_err());

        let mut too_few = profile();
        too_few.interests = vec!["ai".to_string()];
        assert!(save_profile(&store, &too_few).is_err());

        let mut too_many = profile();
        too_many.interests = (0..6).map(|i| format!("tag{i}")).collect();
        assert!(save_profile(&store, &too_many).is_err());

        assert!(load_profile(&store).is_none());
    }

    #[test]
    fn corrupt_payload_degrades_to_none() {
        let store = MemoryStore::new();
        store.set(PROFILE_KEY, "{broken").expect("seed corrupt payload");
        assert!(load_profile(&store).is_none());
    }

    #[test]
    fn clear_removes_the_profile() {
        let store = MemoryStore::new();
        save_profile(&store, &profile()).expect("save");
        clear_profile(&store).expect("clear");
        assert!(load_profile(&store).is_none());
    }
}
