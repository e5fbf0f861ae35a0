//! # In-Memory Export Cache
//!
//! Uses [`DashMap`] for thread-safe concurrent access, keyed by estimate id.

use crate::domain::services::ExportBreakdown;
use crate::domain::value_objects::EstimateId;
use crate::infrastructure::cache::traits::ExportCache;
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::trace;

/// In-memory implementation of [`ExportCache`].
#[derive(Debug, Default)]
pub struct InMemoryExportCache {
    entries: DashMap<EstimateId, ExportBreakdown>,
}

impl InMemoryExportCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[async_trait]
impl ExportCache for InMemoryExportCache {
    async fn get(&self, id: &EstimateId) -> Option<ExportBreakdown> {
        self.entries.get(id).map(|entry| entry.value().clone())
    }

    async fn put(&self, breakdown: ExportBreakdown) {
        trace!(estimate_id = %breakdown.estimate_id, "export breakdown cached");
        self.entries.insert(breakdown.estimate_id, breakdown);
    }

    async fn invalidate(&self, id: &EstimateId) -> bool {
        let removed = self.entries.remove(id).is_some();
        if removed {
            trace!(estimate_id = %id, "export breakdown invalidated");
        }
        removed
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
