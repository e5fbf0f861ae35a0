//! # Unit of Work
//!
//! The transactional mutation path shared by every writer:
//!
//! ```text
//! load → mutate copy → recompute → save (version check) → invalidate cache → refetch
//! ```
//!
//! The mutation runs on an owned copy of the stored estimate, so any
//! failure before `save` leaves the store untouched. The export cache is
//! invalidated before the caller sees success.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::domain::entities::Estimate;
use crate::domain::services::AggregationEngine;
use crate::domain::value_objects::EstimateId;
use crate::infrastructure::cache::ExportCache;
use crate::infrastructure::persistence::{EstimateStore, RepositoryError};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Store, cache and engine bundled for transactional mutations.
#[derive(Clone)]
pub(crate) struct UnitOfWork {
    store: Arc<dyn EstimateStore>,
    cache: Arc<dyn ExportCache>,
    engine: AggregationEngine,
}

impl fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl UnitOfWork {
    pub(crate) fn new(
        store: Arc<dyn EstimateStore>,
        cache: Arc<dyn ExportCache>,
        engine: AggregationEngine,
    ) -> Self {
        Self {
            store,
            cache,
            engine,
        }
    }

    pub(crate) fn store(&self) -> &dyn EstimateStore {
        self.store.as_ref()
    }

    pub(crate) fn cache(&self) -> &dyn ExportCache {
        self.cache.as_ref()
    }

    pub(crate) fn engine(&self) -> &AggregationEngine {
        &self.engine
    }

    /// Loads an estimate or fails with `NotFound`.
    pub(crate) async fn load(&self, id: EstimateId) -> ApplicationResult<Estimate> {
        self.store
            .get(&id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Estimate", id))
    }

    /// Runs `mutation` inside the full transactional sequence and returns
    /// the refetched estimate with the mutation's output.
    pub(crate) async fn commit<T, F>(
        &self,
        id: EstimateId,
        operation: &'static str,
        mutation: F,
    ) -> ApplicationResult<(Estimate, T)>
    where
        F: FnOnce(&mut Estimate, &AggregationEngine) -> ApplicationResult<T>,
    {
        let loaded = self.load(id).await?;
        self.commit_loaded(loaded, operation, mutation).await
    }

    /// Like [`commit`](Self::commit) for a caller that already loaded the
    /// estimate, e.g. to prefetch catalog data for it.
    pub(crate) async fn commit_loaded<T, F>(
        &self,
        mut working: Estimate,
        operation: &'static str,
        mutation: F,
    ) -> ApplicationResult<(Estimate, T)>
    where
        F: FnOnce(&mut Estimate, &AggregationEngine) -> ApplicationResult<T>,
    {
        let output = mutation(&mut working, &self.engine)?;
        self.engine.recompute_estimate(&mut working)?;
        working.touch();

        let saved = self.persist(&working, operation).await?;
        Ok((saved, output))
    }

    /// Saves an already recomputed estimate, invalidates its cached
    /// breakdown and refetches it.
    pub(crate) async fn persist(
        &self,
        estimate: &Estimate,
        operation: &'static str,
    ) -> ApplicationResult<Estimate> {
        let id = estimate.id();
        if let Err(e) = self.store.save(estimate).await {
            if let RepositoryError::VersionConflict {
                expected, actual, ..
            } = &e
            {
                warn!(
                    estimate_id = %id,
                    operation,
                    expected,
                    actual,
                    "estimate changed concurrently, retry the whole operation"
                );
            }
            return Err(e.into());
        }
        self.cache.invalidate(&id).await;

        let saved = self.load(id).await?;
        info!(
            estimate_id = %id,
            operation,
            version = saved.version(),
            grand_total = %saved.totals().grand,
            "estimate committed"
        );
        Ok(saved)
    }
}
