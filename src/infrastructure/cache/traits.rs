//! # Export Cache Port
//!
//! A pure cache of [`ExportBreakdown`]s keyed by estimate. It is never
//! consulted for correctness: a miss means "build a fresh breakdown".
//! Every line, block, room or coefficient mutation must invalidate the
//! entry before the mutation reports success.

use crate::domain::services::ExportBreakdown;
use crate::domain::value_objects::EstimateId;
use async_trait::async_trait;
use std::fmt;

/// Cache of render-ready breakdowns.
#[async_trait]
pub trait ExportCache: Send + Sync + fmt::Debug {
    /// Returns the cached breakdown, or `None` on a miss.
    async fn get(&self, id: &EstimateId) -> Option<ExportBreakdown>;

    /// Stores (or overwrites) the breakdown for its estimate.
    async fn put(&self, breakdown: ExportBreakdown);

    /// Drops the entry for `id`. Returns true if one existed.
    async fn invalidate(&self, id: &EstimateId) -> bool;

    /// Number of cached entries.
    fn len(&self) -> usize;

    /// Returns true if nothing is cached.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
