//! # Estimate Service
//!
//! Transactional mutations of estimates.
//!
//! Every mutating operation loads the estimate, mutates an owned copy,
//! recomputes all denormalized totals, saves with an optimistic version
//! check, invalidates the cached export breakdown and returns the
//! refetched estimate. A failure at any step before the save leaves the
//! stored estimate untouched; a `VersionConflict` means the caller should
//! retry the whole operation.
//!
//! # Examples
//!
//! ```
//! use estimate_engine::application::services::EstimateService;
//! use estimate_engine::config::EngineConfig;
//! use estimate_engine::domain::entities::LineSpec;
//! use estimate_engine::domain::value_objects::EstimateKind;
//! use estimate_engine::infrastructure::cache::InMemoryExportCache;
//! use estimate_engine::infrastructure::catalog::{InMemoryCatalog, InMemoryCoefficientCatalog};
//! use estimate_engine::infrastructure::persistence::InMemoryEstimateStore;
//! use rust_decimal::dec;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let service = EstimateService::new(
//!     Arc::new(InMemoryEstimateStore::new()),
//!     Arc::new(InMemoryCatalog::new()),
//!     Arc::new(InMemoryCoefficientCatalog::new()),
//!     Arc::new(InMemoryExportCache::new()),
//!     &EngineConfig::default(),
//! );
//!
//! let estimate = service.create_estimate("Studio", EstimateKind::Rooms).await.unwrap();
//! let (estimate, room) = service.add_room(estimate.id(), "Hall").await.unwrap();
//! let (estimate, block) = service.add_block(estimate.id(), room, "Demolition", None).await.unwrap();
//! let spec = LineSpec::manual("Haul-away", "trip", dec!(750), dec!(1));
//! let (estimate, _) = service.add_work_line(estimate.id(), room, block, spec).await.unwrap();
//! assert_eq!(estimate.totals().grand.get(), dec!(750));
//! # });
//! ```

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::catalog_lookup::{ResolvedCatalog, resolve_pricing};
use crate::application::services::export_service::ExportService;
use crate::application::services::template_applier::{SkippedLine, TemplateApplier};
use crate::application::services::unit_of_work::UnitOfWork;
use crate::config::EngineConfig;
use crate::domain::entities::{
    AppliedCoefficient, CoefficientScope, Estimate, Line, LinePricing, LineSpec, Room, WorkBlock,
};
use crate::domain::errors::DomainError;
use crate::domain::services::{AggregationEngine, BlockTree};
use crate::domain::value_objects::{
    BlockId, CatalogItemId, CoefficientId, EstimateId, EstimateKind, LineId, Money, Quantity,
    RoomId,
};
use crate::infrastructure::cache::ExportCache;
use crate::infrastructure::catalog::{CatalogService, CoefficientCatalogService};
use crate::infrastructure::persistence::EstimateStore;
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Result of re-resolving catalog prices.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    /// The estimate as stored after the refresh.
    pub estimate: Estimate,
    /// Catalog lines whose pricing was refreshed.
    pub refreshed: usize,
    /// Lines whose catalog item vanished; they keep their last price.
    pub stale: Vec<SkippedLine>,
}

/// Transactional estimate operations.
#[derive(Clone)]
pub struct EstimateService {
    unit_of_work: UnitOfWork,
    catalog: Arc<dyn CatalogService>,
    coefficients: Arc<dyn CoefficientCatalogService>,
    default_room_name: String,
    money_scale: u32,
}

impl fmt::Debug for EstimateService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EstimateService")
            .field("unit_of_work", &self.unit_of_work)
            .field("default_room_name", &self.default_room_name)
            .field("money_scale", &self.money_scale)
            .finish_non_exhaustive()
    }
}

impl EstimateService {
    /// Creates a service over the given ports.
    #[must_use]
    pub fn new(
        store: Arc<dyn EstimateStore>,
        catalog: Arc<dyn CatalogService>,
        coefficients: Arc<dyn CoefficientCatalogService>,
        cache: Arc<dyn ExportCache>,
        config: &EngineConfig,
    ) -> Self {
        let engine = AggregationEngine::new(config.pricing_policy());
        Self {
            unit_of_work: UnitOfWork::new(store, cache, engine),
            catalog,
            coefficients,
            default_room_name: config.templates.default_room_name.clone(),
            money_scale: config.pricing.money_scale,
        }
    }

    /// Template applier sharing this service's ports.
    #[must_use]
    pub fn templates(&self) -> TemplateApplier {
        TemplateApplier::new(
            self.unit_of_work.clone(),
            Arc::clone(&self.catalog),
            self.default_room_name.clone(),
        )
    }

    /// Render read path sharing this service's ports.
    #[must_use]
    pub fn exports(&self) -> ExportService {
        ExportService::new(
            self.unit_of_work.clone(),
            Arc::clone(&self.catalog),
            self.money_scale,
        )
    }

    /// Returns the aggregation engine.
    #[must_use]
    pub fn engine(&self) -> &AggregationEngine {
        self.unit_of_work.engine()
    }

    // ---- estimates ----

    /// Creates and stores an empty estimate.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Validation` for a blank name, or
    /// `ApplicationError::Repository` if the insert fails.
    #[instrument(skip(self))]
    pub async fn create_estimate(
        &self,
        name: &str,
        kind: EstimateKind,
    ) -> ApplicationResult<Estimate> {
        let name = non_blank(name, "estimate name")?;
        let estimate = Estimate::new(name, kind);
        self.unit_of_work.store().insert(&estimate).await?;
        info!(estimate_id = %estimate.id(), %kind, "estimate created");
        self.unit_of_work.load(estimate.id()).await
    }

    /// Loads an estimate.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the estimate does not exist.
    pub async fn get_estimate(&self, estimate_id: EstimateId) -> ApplicationResult<Estimate> {
        self.unit_of_work.load(estimate_id).await
    }

    /// Lists all estimates, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Repository` if the store fails.
    pub async fn list_estimates(&self) -> ApplicationResult<Vec<Estimate>> {
        Ok(self.unit_of_work.store().list().await?)
    }

    /// Deletes an estimate with everything it owns.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the estimate does not exist.
    #[instrument(skip(self), fields(estimate_id = %estimate_id))]
    pub async fn delete_estimate(&self, estimate_id: EstimateId) -> ApplicationResult<()> {
        if !self.unit_of_work.store().delete(&estimate_id).await? {
            return Err(ApplicationError::not_found("Estimate", estimate_id));
        }
        self.unit_of_work.cache().invalidate(&estimate_id).await;
        info!("estimate deleted");
        Ok(())
    }

    /// Renames an estimate.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Validation` for a blank name, plus the
    /// errors of the transactional path.
    #[instrument(skip(self), fields(estimate_id = %estimate_id))]
    pub async fn rename_estimate(
        &self,
        estimate_id: EstimateId,
        name: &str,
    ) -> ApplicationResult<Estimate> {
        let name = non_blank(name, "estimate name")?;
        let (estimate, ()) = self
            .unit_of_work
            .commit(estimate_id, "rename_estimate", |estimate, _| {
                estimate.rename(name);
                Ok(())
            })
            .await?;
        Ok(estimate)
    }

    /// Forces a full recompute and save.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `DomainError::Arithmetic` or a repository error.
    #[instrument(skip(self), fields(estimate_id = %estimate_id))]
    pub async fn recalculate(&self, estimate_id: EstimateId) -> ApplicationResult<Estimate> {
        let (estimate, ()) = self
            .unit_of_work
            .commit(estimate_id, "recalculate", |_, _| Ok(()))
            .await?;
        Ok(estimate)
    }

    // ---- rooms ----

    /// Adds a room.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStructure` if an `apartment` estimate already has
    /// its room.
    #[instrument(skip(self), fields(estimate_id = %estimate_id))]
    pub async fn add_room(
        &self,
        estimate_id: EstimateId,
        name: &str,
    ) -> ApplicationResult<(Estimate, RoomId)> {
        let name = non_blank(name, "room name")?;
        self.unit_of_work
            .commit(estimate_id, "add_room", |estimate, _| {
                Ok(estimate.add_room(Room::new(name))?)
            })
            .await
    }

    /// Renames a room.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the room is not part of the estimate.
    #[instrument(skip(self), fields(estimate_id = %estimate_id, room_id = %room_id))]
    pub async fn rename_room(
        &self,
        estimate_id: EstimateId,
        room_id: RoomId,
        name: &str,
    ) -> ApplicationResult<Estimate> {
        let name = non_blank(name, "room name")?;
        let (estimate, ()) = self
            .unit_of_work
            .commit(estimate_id, "rename_room", |estimate, _| {
                estimate.require_room_mut(room_id)?.rename(name);
                Ok(())
            })
            .await?;
        Ok(estimate)
    }

    /// Removes a room with its blocks and lines.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the room is not part of the estimate.
    #[instrument(skip(self), fields(estimate_id = %estimate_id, room_id = %room_id))]
    pub async fn remove_room(
        &self,
        estimate_id: EstimateId,
        room_id: RoomId,
    ) -> ApplicationResult<Estimate> {
        let (estimate, _) = self
            .unit_of_work
            .commit(estimate_id, "remove_room", |estimate, _| {
                Ok(estimate.remove_room(room_id)?)
            })
            .await?;
        Ok(estimate)
    }

    // ---- blocks ----

    /// Adds a work block, as a root or under `parent`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the room or parent block does not exist.
    #[instrument(skip(self), fields(estimate_id = %estimate_id, room_id = %room_id))]
    pub async fn add_block(
        &self,
        estimate_id: EstimateId,
        room_id: RoomId,
        title: &str,
        parent: Option<BlockId>,
    ) -> ApplicationResult<(Estimate, BlockId)> {
        let title = non_blank(title, "block title")?;
        self.unit_of_work
            .commit(estimate_id, "add_block", |estimate, _| {
                let room = estimate.require_room_mut(room_id)?;
                Ok(BlockTree::insert(room, WorkBlock::new(title), parent)?)
            })
            .await
    }

    /// Renames a work block.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the room or block does not exist.
    #[instrument(skip(self), fields(estimate_id = %estimate_id, room_id = %room_id))]
    pub async fn rename_block(
        &self,
        estimate_id: EstimateId,
        room_id: RoomId,
        block_id: BlockId,
        title: &str,
    ) -> ApplicationResult<Estimate> {
        let title = non_blank(title, "block title")?;
        let (estimate, ()) = self
            .unit_of_work
            .commit(estimate_id, "rename_block", |estimate, _| {
                estimate
                    .require_room_mut(room_id)?
                    .block_mut(block_id)
                    .ok_or_else(|| DomainError::not_found("WorkBlock", block_id))?
                    .rename(title);
                Ok(())
            })
            .await?;
        Ok(estimate)
    }

    /// Moves a block (with its subtree) under another parent of the same
    /// room, or to the root.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the room or either block does not exist
    /// - `CycleDetected` if `new_parent` is the block or one of its
    ///   descendants
    #[instrument(skip(self), fields(estimate_id = %estimate_id, room_id = %room_id))]
    pub async fn move_block(
        &self,
        estimate_id: EstimateId,
        room_id: RoomId,
        block_id: BlockId,
        new_parent: Option<BlockId>,
    ) -> ApplicationResult<Estimate> {
        let (estimate, ()) = self
            .unit_of_work
            .commit(estimate_id, "move_block", |estimate, _| {
                let room = estimate.require_room_mut(room_id)?;
                Ok(BlockTree::reparent(room, block_id, new_parent)?)
            })
            .await?;
        Ok(estimate)
    }

    /// Removes a block and its subtree, dropping the removed ids from
    /// coefficient scopes and manual overrides.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the room or block does not exist.
    #[instrument(skip(self), fields(estimate_id = %estimate_id, room_id = %room_id))]
    pub async fn remove_block(
        &self,
        estimate_id: EstimateId,
        room_id: RoomId,
        block_id: BlockId,
    ) -> ApplicationResult<Estimate> {
        let (estimate, ()) = self
            .unit_of_work
            .commit(estimate_id, "remove_block", |estimate, _| {
                let room = estimate.require_room_mut(room_id)?;
                let removed = BlockTree::remove_subtree(room, block_id)?;
                estimate.forget_blocks(&removed.block_ids);
                estimate.forget_lines(&removed.line_ids);
                Ok(())
            })
            .await?;
        Ok(estimate)
    }

    // ---- lines ----

    /// Adds a work line to a block.
    ///
    /// Catalog specs are priced from the live catalog.
    ///
    /// # Errors
    ///
    /// - `InvalidStructure` if the line input has both or neither pricing source
    /// - `NotFound` if the room, block or catalog item does not exist
    #[instrument(skip(self, spec), fields(estimate_id = %estimate_id, room_id = %room_id))]
    pub async fn add_work_line(
        &self,
        estimate_id: EstimateId,
        room_id: RoomId,
        block_id: BlockId,
        spec: LineSpec,
    ) -> ApplicationResult<(Estimate, LineId)> {
        let (pricing, quantity) = self.price_spec(&spec).await?;
        self.unit_of_work
            .commit(estimate_id, "add_work_line", |estimate, _| {
                let line = Line::new(pricing, quantity)?;
                let line_id = line.id();
                estimate
                    .require_room_mut(room_id)?
                    .block_mut(block_id)
                    .ok_or_else(|| DomainError::not_found("WorkBlock", block_id))?
                    .push_line(line);
                Ok(line_id)
            })
            .await
    }

    /// Adds a material line to a room.
    ///
    /// # Errors
    ///
    /// - `InvalidStructure` if the line input has both or neither pricing source
    /// - `NotFound` if the room or catalog item does not exist
    #[instrument(skip(self, spec), fields(estimate_id = %estimate_id, room_id = %room_id))]
    pub async fn add_material_line(
        &self,
        estimate_id: EstimateId,
        room_id: RoomId,
        spec: LineSpec,
    ) -> ApplicationResult<(Estimate, LineId)> {
        let (pricing, quantity) = self.price_spec(&spec).await?;
        self.unit_of_work
            .commit(estimate_id, "add_material_line", |estimate, _| {
                let line = Line::new(pricing, quantity)?;
                let line_id = line.id();
                estimate.require_room_mut(room_id)?.push_material(line);
                Ok(line_id)
            })
            .await
    }

    /// Changes a line's quantity. An overridden line keeps its frozen total.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` for a negative quantity or `NotFound` if
    /// the line does not exist.
    #[instrument(skip(self), fields(estimate_id = %estimate_id, line_id = %line_id))]
    pub async fn update_line_quantity(
        &self,
        estimate_id: EstimateId,
        line_id: LineId,
        quantity: Decimal,
    ) -> ApplicationResult<Estimate> {
        let quantity =
            Quantity::new(quantity).map_err(|e| DomainError::InvalidQuantity(e.to_string()))?;
        let (estimate, ()) = self
            .unit_of_work
            .commit(estimate_id, "update_line_quantity", |estimate, _| {
                Ok(estimate.set_line_quantity(line_id, quantity)?)
            })
            .await?;
        Ok(estimate)
    }

    /// Removes a line.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the line does not exist.
    #[instrument(skip(self), fields(estimate_id = %estimate_id, line_id = %line_id))]
    pub async fn remove_line(
        &self,
        estimate_id: EstimateId,
        line_id: LineId,
    ) -> ApplicationResult<Estimate> {
        let (estimate, _) = self
            .unit_of_work
            .commit(estimate_id, "remove_line", |estimate, _| {
                Ok(estimate.remove_line(line_id)?)
            })
            .await?;
        Ok(estimate)
    }

    /// Freezes a line at an authored total; coefficients stop applying.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPrice` for a negative total or `NotFound` if the line
    /// does not exist.
    #[instrument(skip(self), fields(estimate_id = %estimate_id, line_id = %line_id))]
    pub async fn override_line_total(
        &self,
        estimate_id: EstimateId,
        line_id: LineId,
        total: Decimal,
    ) -> ApplicationResult<Estimate> {
        let total = Money::new(total).map_err(|e| DomainError::InvalidPrice(e.to_string()))?;
        let (estimate, ()) = self
            .unit_of_work
            .commit(estimate_id, "override_line_total", |estimate, _| {
                estimate.require_line_mut(line_id)?.set_total_price(total);
                Ok(estimate.mark_manual(line_id)?)
            })
            .await?;
        Ok(estimate)
    }

    /// Drops a manual override.
    ///
    /// Catalog lines return to `quantity × unit price × multiplier`;
    /// manual-pricing lines return to `quantity × unit price`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the line does not exist.
    #[instrument(skip(self), fields(estimate_id = %estimate_id, line_id = %line_id))]
    pub async fn clear_line_override(
        &self,
        estimate_id: EstimateId,
        line_id: LineId,
    ) -> ApplicationResult<Estimate> {
        let (estimate, ()) = self
            .unit_of_work
            .commit(estimate_id, "clear_line_override", |estimate, _| {
                let line = estimate.require_line_mut(line_id)?;
                if let LinePricing::Manual { unit_price, .. } = line.pricing() {
                    let authored = unit_price
                        .times(line.quantity())
                        .map_err(DomainError::from)?;
                    line.set_total_price(authored);
                }
                estimate.unmark_manual(line_id);
                Ok(())
            })
            .await?;
        Ok(estimate)
    }

    // ---- coefficients ----

    /// Attaches a coefficient from the coefficient catalog.
    ///
    /// Re-attaching an attached coefficient replaces its snapshot and scope.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the coefficient or a scoped block does not
    /// exist.
    #[instrument(skip(self), fields(estimate_id = %estimate_id, coefficient_id = %coefficient_id))]
    pub async fn attach_coefficient(
        &self,
        estimate_id: EstimateId,
        coefficient_id: CoefficientId,
        scope: CoefficientScope,
    ) -> ApplicationResult<Estimate> {
        let coefficient = self.coefficients.get(&coefficient_id).await?;
        let (estimate, ()) = self
            .unit_of_work
            .commit(estimate_id, "attach_coefficient", |estimate, _| {
                Ok(estimate.attach_coefficient(AppliedCoefficient::new(coefficient, scope))?)
            })
            .await?;
        Ok(estimate)
    }

    /// Changes the scope of an attached coefficient.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the coefficient is not attached or a scoped
    /// block does not exist.
    #[instrument(skip(self), fields(estimate_id = %estimate_id, coefficient_id = %coefficient_id))]
    pub async fn set_coefficient_scope(
        &self,
        estimate_id: EstimateId,
        coefficient_id: CoefficientId,
        scope: CoefficientScope,
    ) -> ApplicationResult<Estimate> {
        let (estimate, ()) = self
            .unit_of_work
            .commit(estimate_id, "set_coefficient_scope", |estimate, _| {
                Ok(estimate.set_coefficient_scope(&coefficient_id, scope)?)
            })
            .await?;
        Ok(estimate)
    }

    /// Detaches a coefficient.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the coefficient is not attached.
    #[instrument(skip(self), fields(estimate_id = %estimate_id, coefficient_id = %coefficient_id))]
    pub async fn detach_coefficient(
        &self,
        estimate_id: EstimateId,
        coefficient_id: CoefficientId,
    ) -> ApplicationResult<Estimate> {
        let (estimate, _) = self
            .unit_of_work
            .commit(estimate_id, "detach_coefficient", |estimate, _| {
                Ok(estimate.detach_coefficient(&coefficient_id)?)
            })
            .await?;
        Ok(estimate)
    }

    // ---- catalog ----

    /// Re-resolves every catalog line against the live catalog.
    ///
    /// Lines whose item vanished keep their last price and are reported as
    /// stale.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Catalog` if the catalog is unavailable,
    /// plus the errors of the transactional path.
    #[instrument(skip(self), fields(estimate_id = %estimate_id))]
    pub async fn refresh_catalog_prices(
        &self,
        estimate_id: EstimateId,
    ) -> ApplicationResult<RefreshOutcome> {
        let loaded = self.unit_of_work.load(estimate_id).await?;
        let ids = catalog_item_ids(&loaded);
        let resolved = ResolvedCatalog::fetch(self.catalog.as_ref(), ids).await?;

        let (estimate, (refreshed, stale)) = self
            .unit_of_work
            .commit_loaded(loaded, "refresh_catalog_prices", |estimate, _| {
                let mut tally = RefreshTally::new(&resolved);
                for room in estimate.rooms_mut() {
                    let room_name = room.name().to_string();
                    for block in room.blocks_mut().iter_mut() {
                        let location = format!("{room_name} / {}", block.title());
                        for line in block.lines_mut() {
                            tally.visit(line, &location)?;
                        }
                    }
                    let location = format!("{room_name} / materials");
                    for line in room.materials_mut() {
                        tally.visit(line, &location)?;
                    }
                }
                Ok((tally.refreshed, tally.stale))
            })
            .await?;

        for line in &stale {
            warn!(
                catalog_item_id = %line.catalog_item_id,
                location = %line.location,
                "catalog item vanished, keeping last price"
            );
        }
        Ok(RefreshOutcome {
            estimate,
            refreshed,
            stale,
        })
    }

    async fn price_spec(&self, spec: &LineSpec) -> ApplicationResult<(LinePricing, Quantity)> {
        let source = spec.validate()?;
        let quantity = spec.quantity()?;
        let pricing = resolve_pricing(self.catalog.as_ref(), source).await?;
        Ok((pricing, quantity))
    }
}

struct RefreshTally<'a> {
    resolved: &'a ResolvedCatalog,
    refreshed: usize,
    stale: Vec<SkippedLine>,
}

impl<'a> RefreshTally<'a> {
    fn new(resolved: &'a ResolvedCatalog) -> Self {
        Self {
            resolved,
            refreshed: 0,
            stale: Vec::new(),
        }
    }

    fn visit(&mut self, line: &mut Line, location: &str) -> ApplicationResult<()> {
        let Some(id) = line.catalog_item_id().cloned() else {
            return Ok(());
        };
        match self.resolved.get(&id) {
            Some(item) => {
                line.refresh_from_catalog(item)?;
                self.refreshed += 1;
            }
            None => self.stale.push(SkippedLine::stale(id, location)),
        }
        Ok(())
    }
}

fn non_blank(value: &str, what: &str) -> ApplicationResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApplicationError::validation(format!("{what} must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn catalog_item_ids(estimate: &Estimate) -> Vec<CatalogItemId> {
    estimate
        .rooms()
        .iter()
        .flat_map(|room| {
            room.blocks()
                .iter()
                .flat_map(|block| block.lines().iter())
                .chain(room.materials().iter())
        })
        .filter_map(|line| line.catalog_item_id().cloned())
        .collect()
}
