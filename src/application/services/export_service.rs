//! # Export Service
//!
//! Read path of the document renderer. A cached breakdown is returned
//! as-is; on a miss a fresh one is built from the stored estimate and
//! cached.

use crate::application::error::ApplicationResult;
use crate::application::services::catalog_lookup::ResolvedCatalog;
use crate::application::services::unit_of_work::UnitOfWork;
use crate::domain::entities::Estimate;
use crate::domain::services::{AggregatedWorkItem, ExportBreakdown};
use crate::domain::value_objects::{CatalogItemId, EstimateId};
use crate::infrastructure::catalog::CatalogService;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Builds and caches render-ready breakdowns.
#[derive(Clone)]
pub struct ExportService {
    unit_of_work: UnitOfWork,
    catalog: Arc<dyn CatalogService>,
    money_scale: u32,
}

impl fmt::Debug for ExportService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportService")
            .field("money_scale", &self.money_scale)
            .finish_non_exhaustive()
    }
}

impl ExportService {
    pub(crate) fn new(
        unit_of_work: UnitOfWork,
        catalog: Arc<dyn CatalogService>,
        money_scale: u32,
    ) -> Self {
        Self {
            unit_of_work,
            catalog,
            money_scale,
        }
    }

    /// Returns the breakdown the renderer should print.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the estimate does not exist, or
    /// `DomainError::Arithmetic` if recomputation overflows.
    #[instrument(skip(self), fields(estimate_id = %estimate_id))]
    pub async fn breakdown_for_render(
        &self,
        estimate_id: EstimateId,
    ) -> ApplicationResult<ExportBreakdown> {
        let cache = self.unit_of_work.cache();
        if let Some(cached) = cache.get(&estimate_id).await {
            debug!(version = cached.source_version, "export cache hit");
            return Ok(cached);
        }

        let estimate = self.unit_of_work.load(estimate_id).await?;
        let prices = self.fallback_prices(&estimate).await;
        let breakdown = ExportBreakdown::build(
            &estimate,
            self.unit_of_work.engine(),
            &prices,
            self.money_scale,
        )?;
        cache.put(breakdown.clone()).await;

        // A writer may have committed while we were building; its
        // invalidation could have run before our put.
        let current = self.unit_of_work.store().get(&estimate_id).await?;
        if current.map(|e| e.version()) != Some(breakdown.source_version) {
            cache.invalidate(&estimate_id).await;
            debug!("estimate changed during build, cached breakdown dropped");
        } else {
            debug!(
                version = breakdown.source_version,
                lines = breakdown.line_count(),
                "export breakdown built"
            );
        }
        Ok(breakdown)
    }

    /// Drops the cached breakdown for an estimate changed outside this
    /// crate's services. Returns true if one was cached.
    pub async fn invalidate(&self, estimate_id: EstimateId) -> bool {
        self.unit_of_work.cache().invalidate(&estimate_id).await
    }

    /// Cross-room work summary of the stored estimate.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the estimate does not exist, or
    /// `DomainError::Arithmetic` on overflow.
    pub async fn works_summary(
        &self,
        estimate_id: EstimateId,
    ) -> ApplicationResult<Vec<AggregatedWorkItem>> {
        let estimate = self.unit_of_work.load(estimate_id).await?;
        let prices = self.fallback_prices(&estimate).await;
        Ok(self.unit_of_work.engine().build_summary(&estimate, &prices)?)
    }

    /// Cross-room material summary of the stored estimate.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the estimate does not exist, or
    /// `DomainError::Arithmetic` on overflow.
    pub async fn materials_summary(
        &self,
        estimate_id: EstimateId,
    ) -> ApplicationResult<Vec<AggregatedWorkItem>> {
        let estimate = self.unit_of_work.load(estimate_id).await?;
        let prices = self.fallback_prices(&estimate).await;
        Ok(self
            .unit_of_work
            .engine()
            .build_material_summary(&estimate, &prices)?)
    }

    /// Live prices for the zero-quantity summary fallback.
    ///
    /// Only items with a zero-quantity line can form a zero-quantity group.
    /// Catalog failures fall back to the line's own price.
    async fn fallback_prices(&self, estimate: &Estimate) -> ResolvedCatalog {
        let ids: Vec<CatalogItemId> = estimate
            .rooms()
            .iter()
            .flat_map(|room| {
                room.blocks()
                    .iter()
                    .flat_map(|block| block.lines().iter())
                    .chain(room.materials().iter())
            })
            .filter(|line| line.quantity().is_zero())
            .filter_map(|line| line.catalog_item_id().cloned())
            .collect();
        if ids.is_empty() {
            return ResolvedCatalog::default();
        }
        ResolvedCatalog::fetch_lenient(self.catalog.as_ref(), ids).await
    }
}
