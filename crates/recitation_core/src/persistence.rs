//! crates/recitation_core/src/persistence.rs
//!
//! Maps the planner's records onto the opaque key-value port. Every record is a
//! JSON document (or a plain scalar) under a fixed key. Records that fail to parse
//! are reported and treated as absent so a damaged store never blocks startup.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::partition::{ChunkSettings, DEFAULT_CHUNK_SIZE};
use crate::ports::{KeyValueStore, PortError, PortResult};
use crate::review::ReviewQueue;
use crate::state::PlannerState;

pub const PLANNER_STATE_KEY: &str = "planner-state";
pub const CHUNK_SIZE_KEY: &str = "chunk-size";
pub const CHUNKING_ENABLED_KEY: &str = "chunking-enabled";
pub const REVIEW_ITEMS_KEY: &str = "review-items";

//=========================================================================================
// State Repository
//=========================================================================================

/// Typed access to the planner's persisted records.
#[derive(Clone)]
pub struct StateRepository {
    store: Arc<dyn KeyValueStore>,
}

impl StateRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn load_json<T: DeserializeOwned>(&self, key: &str) -> PortResult<Option<T>> {
        let Some(raw) = self.store.load(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Discarding unreadable record '{}': {}", key, e);
                Ok(None)
            }
        }
    }

    async fn save_json<T: Serialize>(&self, key: &str, value: &T) -> PortResult<()> {
        let raw = serde_json::to_string(value)
            .map_err(|e| PortError::Unexpected(format!("failed to encode '{key}': {e}")))?;
        debug!("Saving record '{}' ({} bytes)", key, raw.len());
        self.store.save(key, &raw).await
    }

    /// The stored planner state, or `None` if it is missing or unreadable.
    pub async fn load_state(&self) -> PortResult<Option<PlannerState>> {
        self.load_json(PLANNER_STATE_KEY).await
    }

    pub async fn save_state(&self, state: &PlannerState) -> PortResult<()> {
        self.save_json(PLANNER_STATE_KEY, state).await
    }

    /// Chunk settings, each scalar falling back to its default on its own.
    pub async fn load_chunk_settings(&self) -> PortResult<ChunkSettings> {
        let defaults = ChunkSettings::default();
        let chunk_size = match self.store.load(CHUNK_SIZE_KEY).await? {
            Some(raw) => raw.trim().parse::<u32>().unwrap_or_else(|_| {
                warn!("Ignoring invalid chunk size '{}'", raw);
                DEFAULT_CHUNK_SIZE
            }),
            None => defaults.chunk_size,
        };
        let chunking_enabled = match self.store.load(CHUNKING_ENABLED_KEY).await? {
            Some(raw) => raw.trim().parse::<bool>().unwrap_or_else(|_| {
                warn!("Ignoring invalid chunking flag '{}'", raw);
                defaults.chunking_enabled
            }),
            None => defaults.chunking_enabled,
        };
        Ok(ChunkSettings {
            chunking_enabled,
            ..defaults
        }
        .with_chunk_size(chunk_size))
    }

    pub async fn save_chunk_settings(&self, settings: &ChunkSettings) -> PortResult<()> {
        self.store
            .save(CHUNK_SIZE_KEY, &settings.chunk_size.to_string())
            .await?;
        self.store
            .save(CHUNKING_ENABLED_KEY, &settings.chunking_enabled.to_string())
            .await
    }

    pub async fn load_reviews(&self) -> PortResult<ReviewQueue> {
        Ok(self.load_json(REVIEW_ITEMS_KEY).await?.unwrap_or_default())
    }

    pub async fn save_reviews(&self, reviews: &ReviewQueue) -> PortResult<()> {
        self.save_json(REVIEW_ITEMS_KEY, reviews).await
    }
}

//=========================================================================================
// In-Memory Store
//=========================================================================================

/// A process-local store, used by tests and when no durable backend is wanted.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> PortResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| PortError::Unexpected("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn load(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> PortResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReviewCandidate;

    fn repository() -> (Arc<MemoryStore>, StateRepository) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), StateRepository::new(store))
    }

    #[tokio::test]
    async fn missing_records_load_as_defaults() {
        let (_, repo) = repository();
        assert!(repo.load_state().await.unwrap().is_none());
        assert_eq!(repo.load_chunk_settings().await.unwrap(), ChunkSettings::default());
        assert!(repo.load_reviews().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_state_is_treated_as_absent() {
        let (store, repo) = repository();
        store.save(PLANNER_STATE_KEY, "{not json").await.unwrap();
        assert!(repo.load_state().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn state_survives_a_save_and_load() {
        let (_, repo) = repository();
        let mut state = PlannerState::default();
        state.selected_groups = vec![29, 30];
        state.template.toggle_enabled("isya");
        repo.save_state(&state).await.unwrap();
        assert_eq!(repo.load_state().await.unwrap(), Some(state));
    }

    #[tokio::test]
    async fn chunk_scalars_fall_back_independently() {
        let (store, repo) = repository();
        store.save(CHUNK_SIZE_KEY, "abc").await.unwrap();
        store.save(CHUNKING_ENABLED_KEY, "false").await.unwrap();
        let settings = repo.load_chunk_settings().await.unwrap();
        assert_eq!(settings.chunk_size, DEFAULT_CHUNK_SIZE);
        assert!(!settings.chunking_enabled);

        store.save(CHUNK_SIZE_KEY, "400").await.unwrap();
        assert_eq!(repo.load_chunk_settings().await.unwrap().chunk_size, 50);
    }

    #[tokio::test]
    async fn chunk_settings_are_stored_as_plain_scalars() {
        let (store, repo) = repository();
        repo.save_chunk_settings(&ChunkSettings::default().with_chunk_size(15))
            .await
            .unwrap();
        assert_eq!(store.load(CHUNK_SIZE_KEY).await.unwrap().as_deref(), Some("15"));
        assert_eq!(
            store.load(CHUNKING_ENABLED_KEY).await.unwrap().as_deref(),
            Some("true")
        );
    }

    #[tokio::test]
    async fn review_queue_is_persisted() {
        let (_, repo) = repository();
        let mut reviews = ReviewQueue::default();
        reviews.add(
            ReviewCandidate {
                unit_number: 2,
                start_verse: 1,
                end_verse: 20,
                origin_session_name: "Dhuha".to_string(),
            },
            Vec::new(),
        );
        repo.save_reviews(&reviews).await.unwrap();
        assert_eq!(repo.load_reviews().await.unwrap(), reviews);
    }
}
