//! # In-Memory Estimate Store
//!
//! In-memory implementation of [`EstimateStore`] for tests and embedding.
//!
//! This implementation uses a thread-safe `HashMap` for storage and
//! enforces the same optimistic locking contract a database adapter would.

use crate::domain::entities::Estimate;
use crate::domain::value_objects::EstimateId;
use crate::infrastructure::persistence::traits::{
    EstimateStore, RepositoryError, RepositoryResult,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of [`EstimateStore`].
#[derive(Debug, Clone)]
pub struct InMemoryEstimateStore {
    storage: Arc<RwLock<HashMap<EstimateId, Estimate>>>,
}

impl InMemoryEstimateStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the number of stored estimates, waiting for any writer.
    pub async fn len(&self) -> usize {
        self.storage.read().await.len()
    }

    /// Returns true if the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Clears all estimates.
    pub async fn clear(&self) {
        let mut storage = self.storage.write().await;
        storage.clear();
    }
}

impl Default for InMemoryEstimateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EstimateStore for InMemoryEstimateStore {
    async fn insert(&self, estimate: &Estimate) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        if storage.contains_key(&estimate.id()) {
            return Err(RepositoryError::duplicate(
                "Estimate",
                estimate.id().to_string(),
            ));
        }
        storage.insert(estimate.id(), estimate.clone());
        Ok(())
    }

    async fn get(&self, id: &EstimateId) -> RepositoryResult<Option<Estimate>> {
        let storage = self.storage.read().await;
        Ok(storage.get(id).cloned())
    }

    async fn save(&self, estimate: &Estimate) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        let stored = storage
            .get_mut(&estimate.id())
            .ok_or_else(|| RepositoryError::not_found("Estimate", estimate.id().to_string()))?;

        if stored.version() != estimate.version() {
            return Err(RepositoryError::version_conflict(
                "Estimate",
                estimate.id().to_string(),
                estimate.version(),
                stored.version(),
            ));
        }

        let mut next = estimate.clone();
        next.increment_version();
        *stored = next;
        Ok(())
    }

    async fn delete(&self, id: &EstimateId) -> RepositoryResult<bool> {
        let mut storage = self.storage.write().await;
        Ok(storage.remove(id).is_some())
    }

    async fn list(&self) -> RepositoryResult<Vec<Estimate>> {
        let storage = self.storage.read().await;
        let mut all: Vec<Estimate> = storage.values().cloned().collect();
        all.sort_by_key(|e| (e.created_at(), e.id()));
        Ok(all)
    }

    async fn count(&self) -> RepositoryResult<u64> {
        let storage = self.storage.read().await;
        Ok(storage.len() as u64)
    }
}
