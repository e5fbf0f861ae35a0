//! # Export Breakdown
//!
//! Denormalized, render-ready view of an estimate. The document renderer
//! trusts a breakdown as-is, so it is always built from a freshly
//! recomputed copy of the estimate.

use crate::domain::entities::{
    Coefficient, CoefficientScope, Estimate, EstimateTotals, Line, RoomTotals,
};
use crate::domain::errors::DomainResult;
use crate::domain::services::aggregation::{
    AggregatedWorkItem, AggregationEngine, PriceLookup,
};
use crate::domain::services::block_tree::BlockTree;
use crate::domain::services::coefficient_resolver::CoefficientResolver;
use crate::domain::services::line_override::LineOverrideRegistry;
use crate::domain::value_objects::{
    BlockId, CatalogItemId, CoefficientCategory, CoefficientId, CoefficientType, EstimateId,
    EstimateKind, LineId, Money, Multiplier, Quantity, RoomId, Timestamp,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An attached coefficient as shown on the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CoefficientRow {
    /// Coefficient id.
    pub id: CoefficientId,
    /// Display title.
    pub title: String,
    /// Category.
    pub category: CoefficientCategory,
    /// Composition phase.
    #[serde(rename = "type")]
    pub coefficient_type: CoefficientType,
    /// Value.
    pub value: Multiplier,
    /// Scope.
    pub scope: CoefficientScope,
}

/// One priced line row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LineRow {
    /// Line id.
    pub line_id: LineId,
    /// Catalog reference, if catalog-priced.
    pub catalog_item_id: Option<CatalogItemId>,
    /// Display name.
    pub name: String,
    /// Unit of measure.
    pub unit: String,
    /// Quantity.
    pub quantity: Quantity,
    /// Unit price before coefficients.
    pub unit_price: Money,
    /// Multiplier applied to this line (identity for manual lines).
    pub multiplier: Multiplier,
    /// Line total.
    pub total_price: Money,
    /// Whether the total is authored rather than computed.
    pub manual: bool,
}

/// A work block with its lines, in tree order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BlockBreakdown {
    /// Block id.
    pub block_id: BlockId,
    /// Parent block, if nested.
    pub parent_id: Option<BlockId>,
    /// Title.
    pub title: String,
    /// Depth (0 for roots).
    pub level: u32,
    /// Subtree total.
    pub total: Money,
    /// Own lines.
    pub lines: Vec<LineRow>,
}

/// One room of the breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RoomBreakdown {
    /// Room id.
    pub room_id: RoomId,
    /// Room name.
    pub name: String,
    /// Blocks in depth-first pre-order.
    pub blocks: Vec<BlockBreakdown>,
    /// Material rows.
    pub materials: Vec<LineRow>,
    /// Room totals.
    pub totals: RoomTotals,
}

/// Render-ready breakdown of an estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExportBreakdown {
    /// Estimate id.
    pub estimate_id: EstimateId,
    /// Estimate name.
    pub name: String,
    /// Estimate kind.
    pub kind: EstimateKind,
    /// Version of the estimate the breakdown was built from.
    pub source_version: u64,
    /// Build time.
    pub generated_at: Timestamp,
    /// Decimal places the renderer should display.
    pub money_scale: u32,
    /// Attached coefficients.
    pub coefficients: Vec<CoefficientRow>,
    /// Per-room breakdown.
    pub rooms: Vec<RoomBreakdown>,
    /// Cross-room work summary (empty for `apartment` estimates).
    pub works_summary: Vec<AggregatedWorkItem>,
    /// Cross-room material summary (empty for `apartment` estimates).
    pub materials_summary: Vec<AggregatedWorkItem>,
    /// Estimate totals.
    pub totals: EstimateTotals,
}

impl ExportBreakdown {
    /// Builds a breakdown from a recomputed copy of `estimate`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Arithmetic` if recomputation overflows.
    pub fn build(
        estimate: &Estimate,
        engine: &AggregationEngine,
        prices: &dyn PriceLookup,
        money_scale: u32,
    ) -> DomainResult<Self> {
        let mut fresh = estimate.clone();
        let totals = engine.recompute_estimate(&mut fresh)?;
        let overrides = LineOverrideRegistry::for_estimate(&fresh);
        let material_multiplier = if engine.policy().apply_coefficients_to_materials {
            CoefficientResolver::resolve_unscoped(fresh.coefficients())?
        } else {
            Multiplier::ONE
        };

        let mut rooms = Vec::with_capacity(fresh.rooms().len());
        for room in fresh.rooms() {
            let mut blocks = Vec::with_capacity(room.blocks().len());
            for block in BlockTree::preorder(room.blocks()) {
                let multiplier = CoefficientResolver::resolve(&fresh, block.id())?;
                blocks.push(BlockBreakdown {
                    block_id: block.id(),
                    parent_id: block.parent_id(),
                    title: block.title().to_string(),
                    level: block.level(),
                    total: block.total(),
                    lines: block
                        .lines()
                        .iter()
                        .map(|line| line_row(line, multiplier, overrides))
                        .collect(),
                });
            }
            rooms.push(RoomBreakdown {
                room_id: room.id(),
                name: room.name().to_string(),
                blocks,
                materials: room
                    .materials()
                    .iter()
                    .map(|line| line_row(line, material_multiplier, overrides))
                    .collect(),
                totals: room.totals(),
            });
        }

        Ok(Self {
            estimate_id: fresh.id(),
            name: fresh.name().to_string(),
            kind: fresh.kind(),
            source_version: fresh.version(),
            generated_at: Timestamp::now(),
            money_scale,
            coefficients: fresh
                .coefficients()
                .iter()
                .map(|a| coefficient_row(&a.coefficient, &a.scope))
                .collect(),
            rooms,
            works_summary: engine.build_summary(&fresh, prices)?,
            materials_summary: engine.build_material_summary(&fresh, prices)?,
            totals,
        })
    }

    /// Serializes the breakdown for the renderer.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json` error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Total number of line rows (work and material).
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.rooms
            .iter()
            .map(|r| r.materials.len() + r.blocks.iter().map(|b| b.lines.len()).sum::<usize>())
            .sum()
    }
}

fn coefficient_row(coefficient: &Coefficient, scope: &CoefficientScope) -> CoefficientRow {
    CoefficientRow {
        id: coefficient.id().clone(),
        title: coefficient.title().to_string(),
        category: coefficient.category(),
        coefficient_type: coefficient.coefficient_type(),
        value: coefficient.value(),
        scope: scope.clone(),
    }
}

fn line_row(line: &Line, multiplier: Multiplier, overrides: LineOverrideRegistry<'_>) -> LineRow {
    let manual = overrides.is_manual(line);
    LineRow {
        line_id: line.id(),
        catalog_item_id: line.catalog_item_id().cloned(),
        name: line.name().to_string(),
        unit: line.unit().to_string(),
        quantity: line.quantity(),
        unit_price: line.unit_price(),
        multiplier: if manual { Multiplier::ONE } else { multiplier },
        total_price: line.total_price(),
        manual,
    }
}
