//! # Aggregation Engine
//!
//! Rolls line totals up the estimate tree and builds the cross-room
//! summary views.
//!
//! Pricing rules applied on every recompute:
//!
//! - Catalog work line: `quantity × unit_price × multiplier(block)`
//! - Manual line (manual pricing or registered override): stored total kept
//! - Material line: `quantity × unit_price`, multiplied by global
//!   coefficients only when [`PricingPolicy::apply_coefficients_to_materials`]
//!   is set
//!
//! Recomputation runs on a working copy and writes back only when every
//! step succeeded, so an arithmetic failure never leaves partial totals.
//!
//! # Examples
//!
//! ```
//! use estimate_engine::domain::entities::{Estimate, Line, Room, WorkBlock};
//! use estimate_engine::domain::services::AggregationEngine;
//! use estimate_engine::domain::value_objects::{EstimateKind, Money, Quantity};
//! use rust_decimal::Decimal;
//!
//! let mut estimate = Estimate::new("Studio", EstimateKind::Apartment);
//! let mut room = Room::new("Apartment");
//! let mut block = WorkBlock::new("Painting");
//! block.push_line(
//!     Line::manual(
//!         "Walls",
//!         "m2",
//!         Money::new(Decimal::new(5, 0)).unwrap(),
//!         Quantity::new(Decimal::new(40, 0)).unwrap(),
//!     )
//!     .unwrap(),
//! );
//! room.push_block(block);
//! estimate.add_room(room).unwrap();
//!
//! let totals = AggregationEngine::default().recompute_estimate(&mut estimate).unwrap();
//! assert_eq!(totals.grand.get(), Decimal::new(200, 0));
//! ```

use crate::domain::entities::{
    AppliedCoefficient, Estimate, EstimateTotals, Line, Room, RoomTotals,
};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::services::block_tree::BlockTree;
use crate::domain::services::coefficient_resolver::CoefficientResolver;
use crate::domain::services::line_override::LineOverrideRegistry;
use crate::domain::value_objects::{
    CatalogItemId, EstimateKind, Money, Multiplier, Quantity, RoomId,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Pricing switches that are business policy rather than structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Multiply material lines by globally scoped coefficients.
    pub apply_coefficients_to_materials: bool,
}

/// Current catalog prices, looked up synchronously while building summaries.
///
/// Only consulted for groups whose summed quantity is zero.
pub trait PriceLookup {
    /// Current unit price of an active catalog item.
    fn current_price(&self, id: &CatalogItemId) -> Option<Money>;
}

impl PriceLookup for HashMap<CatalogItemId, Money> {
    fn current_price(&self, id: &CatalogItemId) -> Option<Money> {
        self.get(id).copied()
    }
}

impl PriceLookup for BTreeMap<CatalogItemId, Money> {
    fn current_price(&self, id: &CatalogItemId) -> Option<Money> {
        self.get(id).copied()
    }
}

/// Lookup with no catalog prices; the fallback uses line prices only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCatalogPrices;

impl PriceLookup for NoCatalogPrices {
    fn current_price(&self, _id: &CatalogItemId) -> Option<Money> {
        None
    }
}

/// One entry of a cross-room summary.
///
/// Derived on read; never stored on the estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AggregatedWorkItem {
    /// Catalog item all merged lines share; `None` for a manual line.
    pub catalog_item_id: Option<CatalogItemId>,
    /// Display name.
    pub name: String,
    /// Unit of measure.
    pub unit: String,
    /// Summed quantity.
    pub total_quantity: Quantity,
    /// Weighted average `total_price / total_quantity`.
    pub unit_price: Money,
    /// Summed total.
    pub total_price: Money,
    /// Distinct contributing rooms, in first-appearance order.
    pub rooms: Vec<RoomId>,
}

/// Running accumulator for one summary entry.
struct SummaryGroup {
    catalog_item_id: Option<CatalogItemId>,
    name: String,
    unit: String,
    quantity: Quantity,
    total: Money,
    line_unit_price: Money,
    rooms: Vec<RoomId>,
}

impl SummaryGroup {
    fn open(room_id: RoomId, line: &Line) -> Self {
        Self {
            catalog_item_id: line.catalog_item_id().cloned(),
            name: line.name().to_string(),
            unit: line.unit().to_string(),
            quantity: line.quantity(),
            total: line.total_price(),
            line_unit_price: line.unit_price(),
            rooms: vec![room_id],
        }
    }

    fn absorb(&mut self, room_id: RoomId, line: &Line) -> DomainResult<()> {
        self.quantity = self.quantity.safe_add(line.quantity())?;
        self.total = self.total.safe_add(line.total_price())?;
        if !self.rooms.contains(&room_id) {
            self.rooms.push(room_id);
        }
        Ok(())
    }

    fn close(self, prices: &dyn PriceLookup) -> DomainResult<AggregatedWorkItem> {
        let unit_price = if self.quantity.is_zero() {
            self.catalog_item_id
                .as_ref()
                .and_then(|id| prices.current_price(id))
                .unwrap_or(self.line_unit_price)
        } else {
            self.total.per_unit(self.quantity)?
        };
        Ok(AggregatedWorkItem {
            catalog_item_id: self.catalog_item_id,
            name: self.name,
            unit: self.unit,
            total_quantity: self.quantity,
            unit_price,
            total_price: self.total,
            rooms: self.rooms,
        })
    }
}

/// Recomputes denormalized totals and builds summaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregationEngine {
    policy: PricingPolicy,
}

impl AggregationEngine {
    /// Creates an engine with the given policy.
    #[must_use]
    pub fn new(policy: PricingPolicy) -> Self {
        Self { policy }
    }

    /// Returns the pricing policy.
    #[must_use]
    pub fn policy(&self) -> PricingPolicy {
        self.policy
    }

    /// Reprices one room of `estimate` and refreshes its totals.
    ///
    /// Estimate-level totals are left alone; follow with
    /// [`recompute_estimate`](Self::recompute_estimate).
    ///
    /// # Errors
    ///
    /// - `DomainError::NotFound` if the room is not part of the estimate
    /// - `DomainError::Arithmetic` on overflow; the room is left untouched
    pub fn recompute_room(
        &self,
        estimate: &mut Estimate,
        room_id: RoomId,
    ) -> DomainResult<RoomTotals> {
        let mut working = estimate
            .room(room_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("Room", room_id))?;
        let totals = self.price_room(
            &mut working,
            estimate.coefficients(),
            LineOverrideRegistry::for_estimate(estimate),
        )?;
        *estimate.require_room_mut(room_id)? = working;
        Ok(totals)
    }

    /// Reprices every room and refreshes all denormalized totals.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Arithmetic` on overflow; the estimate is left
    /// untouched.
    pub fn recompute_estimate(&self, estimate: &mut Estimate) -> DomainResult<EstimateTotals> {
        let mut working = estimate.clone();
        let coefficients = estimate.coefficients();
        let overrides = LineOverrideRegistry::for_estimate(estimate);

        let mut room_totals = Vec::with_capacity(working.rooms().len());
        for room in working.rooms_mut() {
            room_totals.push(self.price_room(room, coefficients, overrides)?);
        }

        let totals = match working.kind() {
            EstimateKind::Rooms => EstimateTotals {
                works: Money::sum(room_totals.iter().map(|t| t.works))?,
                materials: Money::sum(room_totals.iter().map(|t| t.materials))?,
                grand: Money::sum(room_totals.iter().map(|t| t.total))?,
            },
            EstimateKind::Apartment => room_totals
                .first()
                .map(|t| EstimateTotals {
                    works: t.works,
                    materials: t.materials,
                    grand: t.total,
                })
                .unwrap_or_default(),
        };
        working.set_totals(totals);

        debug!(
            estimate_id = %working.id(),
            works = %totals.works,
            materials = %totals.materials,
            grand = %totals.grand,
            "estimate recomputed"
        );
        *estimate = working;
        Ok(totals)
    }

    /// Cross-room summary of work lines.
    ///
    /// Catalog lines merge by catalog item id; manual-pricing lines stay
    /// individual. Entries keep first-appearance order. Only `rooms`
    /// estimates have a summary; `apartment` estimates yield an empty list.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Arithmetic` on overflow.
    pub fn build_summary(
        &self,
        estimate: &Estimate,
        prices: &dyn PriceLookup,
    ) -> DomainResult<Vec<AggregatedWorkItem>> {
        if !estimate.kind().has_summary() {
            return Ok(Vec::new());
        }
        let lines = estimate.rooms().iter().flat_map(|room| {
            BlockTree::preorder(room.blocks())
                .into_iter()
                .flat_map(|block| block.lines().iter())
                .map(move |line| (room.id(), line))
        });
        Self::summarize(lines, prices)
    }

    /// Cross-room summary of material lines, grouped like
    /// [`build_summary`](Self::build_summary).
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Arithmetic` on overflow.
    pub fn build_material_summary(
        &self,
        estimate: &Estimate,
        prices: &dyn PriceLookup,
    ) -> DomainResult<Vec<AggregatedWorkItem>> {
        if !estimate.kind().has_summary() {
            return Ok(Vec::new());
        }
        let lines = estimate
            .rooms()
            .iter()
            .flat_map(|room| room.materials().iter().map(move |line| (room.id(), line)));
        Self::summarize(lines, prices)
    }

    fn summarize<'a, I>(lines: I, prices: &dyn PriceLookup) -> DomainResult<Vec<AggregatedWorkItem>>
    where
        I: Iterator<Item = (RoomId, &'a Line)>,
    {
        let mut groups: Vec<SummaryGroup> = Vec::new();
        let mut by_catalog: HashMap<CatalogItemId, usize> = HashMap::new();

        for (room_id, line) in lines {
            let Some(catalog_id) = line.catalog_item_id() else {
                groups.push(SummaryGroup::open(room_id, line));
                continue;
            };
            match by_catalog.get(catalog_id).and_then(|i| groups.get_mut(*i)) {
                Some(group) => group.absorb(room_id, line)?,
                None => {
                    by_catalog.insert(catalog_id.clone(), groups.len());
                    groups.push(SummaryGroup::open(room_id, line));
                }
            }
        }

        groups.into_iter().map(|g| g.close(prices)).collect()
    }

    fn price_room(
        &self,
        room: &mut Room,
        coefficients: &[AppliedCoefficient],
        overrides: LineOverrideRegistry<'_>,
    ) -> DomainResult<RoomTotals> {
        for block in room.blocks_mut().iter_mut() {
            let multiplier = CoefficientResolver::resolve_for(coefficients, &block.id())?;
            for line in block.lines_mut() {
                Self::price_line(line, multiplier, overrides)?;
            }
        }

        let material_multiplier = if self.policy.apply_coefficients_to_materials {
            CoefficientResolver::resolve_unscoped(coefficients)?
        } else {
            Multiplier::ONE
        };
        for line in room.materials_mut() {
            Self::price_line(line, material_multiplier, overrides)?;
        }

        let subtree = BlockTree::subtree_totals(room.blocks())?;
        for block in room.blocks_mut().iter_mut() {
            block.set_total(subtree.get(&block.id()).copied().unwrap_or(Money::ZERO));
        }

        let works = Money::sum(BlockTree::roots(room.blocks()).map(|b| b.total()))?;
        let materials = Money::sum(room.materials().iter().map(Line::total_price))?;
        let totals = RoomTotals {
            works,
            materials,
            total: works.safe_add(materials)?,
        };
        room.set_totals(totals);
        Ok(totals)
    }

    fn price_line(
        line: &mut Line,
        multiplier: Multiplier,
        overrides: LineOverrideRegistry<'_>,
    ) -> DomainResult<()> {
        if overrides.is_manual(line) {
            return Ok(());
        }
        let total = line.unit_price().times(line.quantity())?.scaled(multiplier)?;
        line.set_total_price(total);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::{CatalogItem, Coefficient, CoefficientScope, WorkBlock};
    use crate::domain::value_objects::{BlockId, CoefficientCategory, CoefficientType};
    use rust_decimal::{Decimal, dec};

    fn money(v: Decimal) -> Money {
        Money::new(v).unwrap()
    }

    fn qty(v: Decimal) -> Quantity {
        Quantity::new(v).unwrap()
    }

    fn item(id: &str, price: Decimal) -> CatalogItem {
        CatalogItem::new(id, id, "pc", money(price))
    }

    fn coefficient(id: &str, value: Decimal, kind: CoefficientType) -> Coefficient {
        Coefficient::new(id, id, value, CoefficientCategory::Custom, kind).unwrap()
    }

    /// Estimate with one room holding one block; returns ids.
    fn single_block(kind: EstimateKind) -> (Estimate, RoomId, BlockId) {
        let mut estimate = Estimate::new("Test", kind);
        let mut room = Room::new("Room");
        let block = WorkBlock::new("Works");
        let block_id = block.id();
        room.push_block(block);
        let room_id = estimate.add_room(room).unwrap();
        (estimate, room_id, block_id)
    }

    fn push_work(estimate: &mut Estimate, room: RoomId, block: BlockId, line: Line) {
        estimate
            .require_room_mut(room)
            .unwrap()
            .block_mut(block)
            .unwrap()
            .push_line(line);
    }

    mod recompute {
        use super::*;

        #[test]
        fn global_normal_and_final_compose() {
            let (mut estimate, room, block) = single_block(EstimateKind::Rooms);
            let line = Line::from_catalog(&item("tile", dec!(100)), qty(dec!(10))).unwrap();
            let line_id = line.id();
            push_work(&mut estimate, room, block, line);
            estimate
                .attach_coefficient(AppliedCoefficient::new(
                    coefficient("n", dec!(1.1), CoefficientType::Normal),
                    CoefficientScope::Global,
                ))
                .unwrap();
            estimate
                .attach_coefficient(AppliedCoefficient::new(
                    coefficient("f", dec!(1.05), CoefficientType::Final),
                    CoefficientScope::Global,
                ))
                .unwrap();

            let totals = AggregationEngine::default().recompute_estimate(&mut estimate).unwrap();
            let line = estimate.room(room).unwrap().line(line_id).unwrap();
            assert_eq!(line.total_price().get(), dec!(1155));
            assert_eq!(totals.grand.get(), dec!(1155));
        }

        #[test]
        fn manual_line_ignores_coefficients() {
            let (mut estimate, room, block) = single_block(EstimateKind::Rooms);
            push_work(
                &mut estimate,
                room,
                block,
                Line::manual("Custom shelf", "pc", money(dec!(750)), qty(dec!(1))).unwrap(),
            );
            push_work(
                &mut estimate,
                room,
                block,
                Line::from_catalog(&item("paint", dec!(10)), qty(dec!(10))).unwrap(),
            );
            estimate
                .attach_coefficient(AppliedCoefficient::new(
                    coefficient("x2", dec!(2), CoefficientType::Normal),
                    CoefficientScope::Global,
                ))
                .unwrap();

            AggregationEngine::default().recompute_estimate(&mut estimate).unwrap();
            let block = estimate.room(room).unwrap().block(block).unwrap();
            assert_eq!(block.total().get(), dec!(950));
        }

        #[test]
        fn overridden_catalog_line_keeps_total() {
            let (mut estimate, room, block) = single_block(EstimateKind::Rooms);
            let mut line = Line::from_catalog(&item("paint", dec!(10)), qty(dec!(10))).unwrap();
            line.set_total_price(money(dec!(42)));
            let line_id = line.id();
            push_work(&mut estimate, room, block, line);
            estimate.mark_manual(line_id).unwrap();

            AggregationEngine::default().recompute_estimate(&mut estimate).unwrap();
            assert_eq!(estimate.totals().grand.get(), dec!(42));

            estimate.unmark_manual(line_id);
            AggregationEngine::default().recompute_estimate(&mut estimate).unwrap();
            assert_eq!(estimate.totals().grand.get(), dec!(100));
        }

        #[test]
        fn recompute_is_idempotent() {
            let (mut estimate, room, block) = single_block(EstimateKind::Rooms);
            push_work(
                &mut estimate,
                room,
                block,
                Line::from_catalog(&item("a", dec!(3.33)), qty(dec!(7))).unwrap(),
            );
            let engine = AggregationEngine::default();
            engine.recompute_estimate(&mut estimate).unwrap();
            let first = estimate.clone();
            engine.recompute_estimate(&mut estimate).unwrap();
            assert_eq!(first, estimate);
        }

        #[test]
        fn nested_blocks_count_once_in_room_total() {
            let (mut estimate, room, parent) = single_block(EstimateKind::Rooms);
            let child = BlockTree::insert(
                estimate.require_room_mut(room).unwrap(),
                WorkBlock::new("Child"),
                Some(parent),
            )
            .unwrap();
            push_work(
                &mut estimate,
                room,
                parent,
                Line::manual("p", "pc", money(dec!(1)), qty(dec!(1))).unwrap(),
            );
            push_work(
                &mut estimate,
                room,
                child,
                Line::manual("c", "pc", money(dec!(10)), qty(dec!(1))).unwrap(),
            );

            let totals = AggregationEngine::default()
                .recompute_room(&mut estimate, room)
                .unwrap();
            assert_eq!(totals.works.get(), dec!(11));
            let room = estimate.room(room).unwrap();
            assert_eq!(room.block(parent).unwrap().total().get(), dec!(11));
            assert_eq!(room.block(child).unwrap().total().get(), dec!(10));
        }

        #[test]
        fn materials_follow_policy() {
            let (mut estimate, room, _block) = single_block(EstimateKind::Rooms);
            estimate
                .require_room_mut(room)
                .unwrap()
                .push_material(Line::from_catalog(&item("glue", dec!(10)), qty(dec!(2))).unwrap());
            estimate
                .attach_coefficient(AppliedCoefficient::new(
                    coefficient("n", dec!(1.5), CoefficientType::Normal),
                    CoefficientScope::Global,
                ))
                .unwrap();

            let plain = AggregationEngine::default().recompute_estimate(&mut estimate).unwrap();
            assert_eq!(plain.materials.get(), dec!(20));

            let engine = AggregationEngine::new(PricingPolicy {
                apply_coefficients_to_materials: true,
            });
            let scaled = engine.recompute_estimate(&mut estimate).unwrap();
            assert_eq!(scaled.materials.get(), dec!(30));
        }

        #[test]
        fn overflow_leaves_estimate_untouched() {
            let (mut estimate, room, block) = single_block(EstimateKind::Rooms);
            push_work(
                &mut estimate,
                room,
                block,
                Line::from_catalog(&item("huge", Decimal::MAX), qty(dec!(1))).unwrap(),
            );
            estimate
                .attach_coefficient(AppliedCoefficient::new(
                    coefficient("n", dec!(2), CoefficientType::Normal),
                    CoefficientScope::Global,
                ))
                .unwrap();
            let before = estimate.clone();

            let err = AggregationEngine::default()
                .recompute_estimate(&mut estimate)
                .unwrap_err();
            assert!(matches!(err, DomainError::Arithmetic(_)));
            assert_eq!(before, estimate);
        }

        #[test]
        fn recompute_unknown_room_is_not_found() {
            let (mut estimate, _room, _block) = single_block(EstimateKind::Rooms);
            let err = AggregationEngine::default()
                .recompute_room(&mut estimate, RoomId::new_v4())
                .unwrap_err();
            assert!(err.is_not_found());
        }
    }

    mod summary {
        use super::*;

        fn two_rooms_with_paint() -> Estimate {
            let mut estimate = Estimate::new("Flat", EstimateKind::Rooms);
            for (name, q) in [("Kitchen", dec!(5)), ("Hall", dec!(15))] {
                let mut room = Room::new(name);
                let mut block = WorkBlock::new("Painting");
                let mut line = Line::from_catalog(&item("paint", dec!(100)), qty(q)).unwrap();
                let total = if q == dec!(5) { dec!(500) } else { dec!(1800) };
                line.set_total_price(money(total));
                block.push_line(line);
                room.push_block(block);
                estimate.add_room(room).unwrap();
            }
            estimate
        }

        #[test]
        fn merges_catalog_lines_across_rooms() {
            let estimate = two_rooms_with_paint();
            let summary = AggregationEngine::default()
                .build_summary(&estimate, &NoCatalogPrices)
                .unwrap();
            assert_eq!(summary.len(), 1);
            let entry = &summary[0];
            assert_eq!(entry.total_quantity.get(), dec!(20));
            assert_eq!(entry.total_price.get(), dec!(2300));
            assert_eq!(entry.unit_price.get(), dec!(115));
            assert_eq!(entry.rooms.len(), 2);
        }

        #[test]
        fn manual_lines_stay_individual() {
            let (mut estimate, room, block) = single_block(EstimateKind::Rooms);
            for _ in 0..2 {
                push_work(
                    &mut estimate,
                    room,
                    block,
                    Line::manual("Shelf", "pc", money(dec!(50)), qty(dec!(1))).unwrap(),
                );
            }
            let summary = AggregationEngine::default()
                .build_summary(&estimate, &NoCatalogPrices)
                .unwrap();
            assert_eq!(summary.len(), 2);
            assert!(summary.iter().all(|e| e.catalog_item_id.is_none()));
        }

        #[test]
        fn zero_quantity_falls_back_to_catalog_price() {
            let (mut estimate, room, block) = single_block(EstimateKind::Rooms);
            push_work(
                &mut estimate,
                room,
                block,
                Line::from_catalog(&item("paint", dec!(100)), Quantity::ZERO).unwrap(),
            );
            let prices = HashMap::from([(CatalogItemId::new("paint"), money(dec!(120)))]);
            let engine = AggregationEngine::default();

            let summary = engine.build_summary(&estimate, &prices).unwrap();
            assert_eq!(summary[0].unit_price.get(), dec!(120));

            let summary = engine.build_summary(&estimate, &NoCatalogPrices).unwrap();
            assert_eq!(summary[0].unit_price.get(), dec!(100));
        }

        #[test]
        fn apartment_has_no_summary() {
            let (mut estimate, room, block) = single_block(EstimateKind::Apartment);
            push_work(
                &mut estimate,
                room,
                block,
                Line::from_catalog(&item("paint", dec!(100)), qty(dec!(1))).unwrap(),
            );
            let summary = AggregationEngine::default()
                .build_summary(&estimate, &NoCatalogPrices)
                .unwrap();
            assert!(summary.is_empty());
        }

        #[test]
        fn material_summary_groups_by_catalog_id() {
            let mut estimate = Estimate::new("Flat", EstimateKind::Rooms);
            for name in ["A", "B"] {
                let mut room = Room::new(name);
                room.push_material(
                    Line::from_catalog(&item("glue", dec!(4)), qty(dec!(3))).unwrap(),
                );
                estimate.add_room(room).unwrap();
            }
            let summary = AggregationEngine::default()
                .build_material_summary(&estimate, &NoCatalogPrices)
                .unwrap();
            assert_eq!(summary.len(), 1);
            assert_eq!(summary[0].total_quantity.get(), dec!(6));
            assert_eq!(summary[0].total_price.get(), dec!(24));
        }
    }
}
