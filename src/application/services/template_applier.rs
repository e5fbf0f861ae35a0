//! # Template Applier
//!
//! Instantiates a [`Template`] into a room of an estimate.
//!
//! Catalog lines are priced from the live catalog, never from the price
//! stored in the template. Items that have been removed from the catalog
//! are skipped and reported; every other line is inserted. The whole
//! application is one transaction: either all surviving lines land and
//! the totals are recomputed, or nothing changes.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::catalog_lookup::ResolvedCatalog;
use crate::application::services::unit_of_work::UnitOfWork;
use crate::domain::entities::{
    Estimate, Line, Room, Template, TemplateBlock, TemplateLine, WorkBlock,
};
use crate::domain::errors::DomainResult;
use crate::domain::services::BlockTree;
use crate::domain::value_objects::{BlockId, CatalogItemId, EstimateId, EstimateKind, RoomId};
use crate::infrastructure::catalog::CatalogService;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// A template line that could not be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    /// The catalog item that no longer resolves.
    pub catalog_item_id: CatalogItemId,
    /// Where the line would have gone, e.g. `Tiling / Grouting` or
    /// `materials`.
    pub location: String,
    /// Human-readable reason.
    pub reason: String,
}

impl SkippedLine {
    pub(crate) fn stale(catalog_item_id: CatalogItemId, location: impl Into<String>) -> Self {
        Self {
            catalog_item_id,
            location: location.into(),
            reason: "catalog item is no longer available".to_string(),
        }
    }
}

/// Result of applying a template.
#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    /// Lines inserted; skipped lines are not counted.
    pub applied_line_count: usize,
    /// Lines skipped because their catalog item vanished.
    pub skipped: Vec<SkippedLine>,
    /// Room the template was applied to.
    pub room_id: RoomId,
    /// The estimate as stored after the application.
    pub estimate: Estimate,
}

/// Applies templates to estimates.
#[derive(Clone)]
pub struct TemplateApplier {
    unit_of_work: UnitOfWork,
    catalog: Arc<dyn CatalogService>,
    default_room_name: String,
}

impl fmt::Debug for TemplateApplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateApplier")
            .field("default_room_name", &self.default_room_name)
            .finish_non_exhaustive()
    }
}

impl TemplateApplier {
    pub(crate) fn new(
        unit_of_work: UnitOfWork,
        catalog: Arc<dyn CatalogService>,
        default_room_name: impl Into<String>,
    ) -> Self {
        Self {
            unit_of_work,
            catalog,
            default_room_name: default_room_name.into(),
        }
    }

    /// Applies `template` to an estimate.
    ///
    /// `rooms` estimates require `target_room`. `apartment` estimates ignore
    /// it and use their only room, creating it if needed.
    ///
    /// # Errors
    ///
    /// - `ApplicationError::Domain` if the template is invalid
    /// - `NotFound` if the estimate is missing, or the target room is
    ///   missing or belongs to another estimate
    /// - `ApplicationError::Catalog` if the catalog is unavailable
    /// - `ApplicationError::Repository` if the save fails
    #[instrument(skip(self, template), fields(template_id = %template.id, estimate_id = %estimate_id))]
    pub async fn apply(
        &self,
        template: &Template,
        estimate_id: EstimateId,
        target_room: Option<RoomId>,
    ) -> ApplicationResult<ApplyOutcome> {
        template.validate()?;
        let resolved =
            ResolvedCatalog::fetch(self.catalog.as_ref(), template.catalog_item_ids()).await?;

        let (estimate, (room_id, applied_line_count, skipped)) = self
            .unit_of_work
            .commit(estimate_id, "apply_template", |estimate, engine| {
                let room_id = self.target_room(estimate, target_room)?;
                let mut builder = RoomBuilder::new(&resolved);
                builder.fill(estimate.require_room_mut(room_id)?, template)?;
                engine.recompute_room(estimate, room_id)?;
                Ok((room_id, builder.applied, builder.skipped))
            })
            .await?;

        for line in &skipped {
            warn!(
                catalog_item_id = %line.catalog_item_id,
                location = %line.location,
                "skipped stale template line"
            );
        }

        Ok(ApplyOutcome {
            applied_line_count,
            skipped,
            room_id,
            estimate,
        })
    }

    fn target_room(
        &self,
        estimate: &mut Estimate,
        requested: Option<RoomId>,
    ) -> ApplicationResult<RoomId> {
        match estimate.kind() {
            EstimateKind::Rooms => {
                let room_id =
                    requested.ok_or_else(|| ApplicationError::not_found("Room", "<unspecified>"))?;
                if estimate.room(room_id).is_none() {
                    return Err(ApplicationError::not_found("Room", room_id));
                }
                Ok(room_id)
            }
            EstimateKind::Apartment => match estimate.first_room_id() {
                Some(room_id) => Ok(room_id),
                None => {
                    debug!(name = %self.default_room_name, "creating default room");
                    Ok(estimate.add_room(Room::new(self.default_room_name.clone()))?)
                }
            },
        }
    }
}

/// Inserts template content into one room, tracking what was skipped.
struct RoomBuilder<'a> {
    resolved: &'a ResolvedCatalog,
    applied: usize,
    skipped: Vec<SkippedLine>,
}

impl<'a> RoomBuilder<'a> {
    fn new(resolved: &'a ResolvedCatalog) -> Self {
        Self {
            resolved,
            applied: 0,
            skipped: Vec::new(),
        }
    }

    fn fill(&mut self, room: &mut Room, template: &Template) -> DomainResult<()> {
        // Reversed so the stack pops blocks in document order.
        let mut pending: Vec<(&TemplateBlock, Option<BlockId>, String)> = template
            .blocks
            .iter()
            .rev()
            .map(|block| (block, None, block.title.clone()))
            .collect();

        while let Some((template_block, parent, path)) = pending.pop() {
            let mut block = WorkBlock::new(template_block.title.clone());
            for line in &template_block.lines {
                if let Some(line) = self.instantiate(line, &path)? {
                    block.push_line(line);
                }
            }
            let block_id = BlockTree::insert(room, block, parent)?;

            for child in template_block.children.iter().rev() {
                let child_path = format!("{path} / {}", child.title);
                pending.push((child, Some(block_id), child_path));
            }
        }

        for line in &template.materials {
            if let Some(line) = self.instantiate(line, "materials")? {
                room.push_material(line);
            }
        }
        Ok(())
    }

    fn instantiate(&mut self, line: &TemplateLine, location: &str) -> DomainResult<Option<Line>> {
        let resolved = self.resolved;
        let built = match line {
            TemplateLine::Catalog {
                catalog_item_id,
                quantity,
                stored_unit_price,
            } => {
                let Some(item) = resolved.get(catalog_item_id) else {
                    self.skipped
                        .push(SkippedLine::stale(catalog_item_id.clone(), location));
                    return Ok(None);
                };
                if let Some(stored) = stored_unit_price {
                    if *stored != item.unit_price {
                        debug!(
                            %catalog_item_id,
                            stored = %stored,
                            live = %item.unit_price,
                            "template price superseded by live catalog price"
                        );
                    }
                }
                Line::from_catalog(item, *quantity)?
            }
            TemplateLine::Manual {
                name,
                unit,
                unit_price,
                quantity,
            } => Line::manual(name.clone(), unit.clone(), *unit_price, *quantity)?,
        };
        self.applied += 1;
        Ok(Some(built))
    }
}
