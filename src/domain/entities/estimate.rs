//! # Estimate Aggregate Root
//!
//! An estimate is the top-level priced document for a client: either a
//! single flat surface (`apartment`) or a set of rooms (`rooms`).
//!
//! The aggregate owns its rooms, the coefficients attached to it with
//! their scopes, and the set of manually overridden line ids. Totals are
//! denormalized and refreshed by the aggregation engine after every
//! line-affecting mutation.
//!
//! # Examples
//!
//! ```
//! use estimate_engine::domain::entities::{Estimate, Room};
//! use estimate_engine::domain::value_objects::EstimateKind;
//!
//! let mut estimate = Estimate::new("Flat on Lenina 5", EstimateKind::Rooms);
//! let kitchen = estimate.add_room(Room::new("Kitchen")).unwrap();
//! assert!(estimate.room(kitchen).is_some());
//!
//! let mut flat = Estimate::new("Studio", EstimateKind::Apartment);
//! flat.add_room(Room::new("Apartment")).unwrap();
//! assert!(flat.add_room(Room::new("Second")).is_err());
//! ```

use crate::domain::entities::coefficient::{AppliedCoefficient, CoefficientScope};
use crate::domain::entities::line::Line;
use crate::domain::entities::room::{LinePlacement, Room};
use crate::domain::entities::totals::EstimateTotals;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{
    BlockId, CoefficientId, EstimateId, EstimateKind, LineId, Quantity, RoomId, Timestamp,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Estimate aggregate root.
///
/// # Invariants
///
/// - `apartment` estimates hold at most one room
/// - Coefficient ids are unique within the estimate
/// - Every id in `manual_line_ids` refers to a line of this estimate
/// - Denormalized totals equal a fresh recompute of the children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estimate {
    id: EstimateId,
    name: String,
    kind: EstimateKind,
    rooms: Vec<Room>,
    coefficients: Vec<AppliedCoefficient>,
    manual_line_ids: BTreeSet<LineId>,
    totals: EstimateTotals,
    /// Version for optimistic locking.
    version: u64,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Estimate {
    /// Creates an empty estimate.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: EstimateKind) -> Self {
        let now = Timestamp::now();
        Self {
            id: EstimateId::new_v4(),
            name: name.into(),
            kind,
            rooms: Vec::new(),
            coefficients: Vec::new(),
            manual_line_ids: BTreeSet::new(),
            totals: EstimateTotals::default(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the estimate ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> EstimateId {
        self.id
    }

    /// Returns the estimate name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the estimate kind.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> EstimateKind {
        self.kind
    }

    /// Returns the rooms in order.
    #[inline]
    #[must_use]
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Returns the attached coefficients.
    #[inline]
    #[must_use]
    pub fn coefficients(&self) -> &[AppliedCoefficient] {
        &self.coefficients
    }

    /// Returns the ids of manually overridden lines.
    #[inline]
    #[must_use]
    pub fn manual_line_ids(&self) -> &BTreeSet<LineId> {
        &self.manual_line_ids
    }

    /// Returns the denormalized totals.
    #[inline]
    #[must_use]
    pub fn totals(&self) -> EstimateTotals {
        self.totals
    }

    /// Returns the optimistic-locking version.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns when the estimate was created.
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns when the estimate was last changed.
    #[inline]
    #[must_use]
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Renames the estimate.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Bumps the version; called by stores on a successful save.
    pub fn increment_version(&mut self) {
        self.version = self.version.saturating_add(1);
    }

    // ---- rooms ----

    /// Finds a room by ID.
    #[must_use]
    pub fn room(&self, room_id: RoomId) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id() == room_id)
    }

    /// Finds a room by ID, mutably.
    pub fn room_mut(&mut self, room_id: RoomId) -> Option<&mut Room> {
        self.rooms.iter_mut().find(|r| r.id() == room_id)
    }

    /// Finds a room or fails with `NotFound`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the room is not part of this estimate.
    pub fn require_room_mut(&mut self, room_id: RoomId) -> DomainResult<&mut Room> {
        self.room_mut(room_id)
            .ok_or_else(|| DomainError::not_found("Room", room_id))
    }

    /// Adds a room.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStructure` if the estimate kind cannot
    /// hold another room.
    pub fn add_room(&mut self, room: Room) -> DomainResult<RoomId> {
        if let Some(max) = self.kind.max_rooms() {
            if self.rooms.len() >= max {
                return Err(DomainError::invalid_structure(format!(
                    "{} estimates hold at most {max} room",
                    self.kind
                )));
            }
        }
        let id = room.id();
        self.rooms.push(room);
        Ok(id)
    }

    /// Removes a room and every reference to its blocks and lines.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the room is not part of this estimate.
    pub fn remove_room(&mut self, room_id: RoomId) -> DomainResult<Room> {
        let index = self
            .rooms
            .iter()
            .position(|r| r.id() == room_id)
            .ok_or_else(|| DomainError::not_found("Room", room_id))?;
        let room = self.rooms.remove(index);

        let block_ids: Vec<BlockId> = room.blocks().iter().map(|b| b.id()).collect();
        self.forget_blocks(&block_ids);
        self.forget_lines(&room.line_ids());
        Ok(room)
    }

    /// Returns the first room, if any.
    #[must_use]
    pub fn first_room_id(&self) -> Option<RoomId> {
        self.rooms.first().map(Room::id)
    }

    // ---- lines ----

    /// Locates a line anywhere in the estimate.
    #[must_use]
    pub fn locate_line(&self, line_id: LineId) -> Option<(RoomId, LinePlacement)> {
        self.rooms
            .iter()
            .find_map(|r| r.placement_of(line_id).map(|p| (r.id(), p)))
    }

    /// Finds a line anywhere in the estimate, mutably.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if no room holds the line.
    pub fn require_line_mut(&mut self, line_id: LineId) -> DomainResult<&mut Line> {
        self.rooms
            .iter_mut()
            .find_map(|r| r.line_mut(line_id))
            .ok_or_else(|| DomainError::not_found("Line", line_id))
    }

    /// Changes a line's quantity. A line registered as manually priced keeps
    /// its frozen total.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if no room holds the line, or an
    /// arithmetic error if the authored total overflows.
    pub fn set_line_quantity(&mut self, line_id: LineId, quantity: Quantity) -> DomainResult<()> {
        let frozen = self.manual_line_ids.contains(&line_id);
        let line = self.require_line_mut(line_id)?;
        let total = line.total_price();
        line.set_quantity(quantity)?;
        if frozen {
            line.set_total_price(total);
        }
        Ok(())
    }

    /// Removes a line anywhere in the estimate.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if no room holds the line.
    pub fn remove_line(&mut self, line_id: LineId) -> DomainResult<Line> {
        let line = self
            .rooms
            .iter_mut()
            .find_map(|r| r.remove_line(line_id))
            .ok_or_else(|| DomainError::not_found("Line", line_id))?;
        self.manual_line_ids.remove(&line_id);
        Ok(line)
    }

    /// Returns true if any room holds a block with this ID.
    #[must_use]
    pub fn contains_block(&self, block_id: BlockId) -> bool {
        self.rooms.iter().any(|r| r.block(block_id).is_some())
    }

    // ---- manual overrides ----

    /// Registers a line as manually priced.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the line is not part of this estimate.
    pub fn mark_manual(&mut self, line_id: LineId) -> DomainResult<()> {
        if self.locate_line(line_id).is_none() {
            return Err(DomainError::not_found("Line", line_id));
        }
        self.manual_line_ids.insert(line_id);
        Ok(())
    }

    /// Unregisters a manual override. Returns true if it was registered.
    pub fn unmark_manual(&mut self, line_id: LineId) -> bool {
        self.manual_line_ids.remove(&line_id)
    }

    // ---- coefficients ----

    /// Finds an attached coefficient.
    #[must_use]
    pub fn coefficient(&self, id: &CoefficientId) -> Option<&AppliedCoefficient> {
        self.coefficients.iter().find(|c| c.coefficient.id() == id)
    }

    /// Attaches a coefficient, replacing an existing attachment with the same id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the scope names a block that is not
    /// part of this estimate.
    pub fn attach_coefficient(&mut self, applied: AppliedCoefficient) -> DomainResult<()> {
        self.validate_scope(&applied.scope)?;
        match self
            .coefficients
            .iter_mut()
            .find(|c| c.coefficient.id() == applied.coefficient.id())
        {
            Some(existing) => *existing = applied,
            None => self.coefficients.push(applied),
        }
        Ok(())
    }

    /// Changes the scope of an attached coefficient.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the coefficient is not attached or
    /// the scope names an unknown block.
    pub fn set_coefficient_scope(
        &mut self,
        id: &CoefficientId,
        scope: CoefficientScope,
    ) -> DomainResult<()> {
        self.validate_scope(&scope)?;
        let applied = self
            .coefficients
            .iter_mut()
            .find(|c| c.coefficient.id() == id)
            .ok_or_else(|| DomainError::not_found("Coefficient", id))?;
        applied.scope = scope;
        Ok(())
    }

    /// Detaches a coefficient.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the coefficient is not attached.
    pub fn detach_coefficient(&mut self, id: &CoefficientId) -> DomainResult<AppliedCoefficient> {
        let index = self
            .coefficients
            .iter()
            .position(|c| c.coefficient.id() == id)
            .ok_or_else(|| DomainError::not_found("Coefficient", id))?;
        Ok(self.coefficients.remove(index))
    }

    fn validate_scope(&self, scope: &CoefficientScope) -> DomainResult<()> {
        if let CoefficientScope::Blocks(ids) = scope {
            if let Some(missing) = ids.iter().find(|id| !self.contains_block(**id)) {
                return Err(DomainError::not_found("WorkBlock", missing));
            }
        }
        Ok(())
    }

    // ---- crate-internal bookkeeping ----

    pub(crate) fn rooms_mut(&mut self) -> &mut [Room] {
        &mut self.rooms
    }

    pub(crate) fn forget_blocks(&mut self, removed: &[BlockId]) {
        for applied in &mut self.coefficients {
            applied.scope.forget_blocks(removed);
        }
    }

    pub(crate) fn forget_lines(&mut self, removed: &[LineId]) {
        for id in removed {
            self.manual_line_ids.remove(id);
        }
    }

    pub(crate) fn set_totals(&mut self, totals: EstimateTotals) {
        self.totals = totals;
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::coefficient::Coefficient;
    use crate::domain::entities::work_block::WorkBlock;
    use crate::domain::value_objects::{CoefficientCategory, CoefficientType, Money, Quantity};
    use rust_decimal::dec;

    fn coefficient(id: &str) -> Coefficient {
        Coefficient::new(
            id,
            id,
            dec!(1.1),
            CoefficientCategory::Region,
            CoefficientType::Normal,
        )
        .unwrap()
    }

    fn estimate_with_line() -> (Estimate, RoomId, BlockId, LineId) {
        let mut estimate = Estimate::new("Test", EstimateKind::Rooms);
        let mut room = Room::new("Kitchen");
        let mut block = WorkBlock::new("Walls");
        let line = Line::manual(
            "Prep",
            "m2",
            Money::new(dec!(5)).unwrap(),
            Quantity::new(dec!(2)).unwrap(),
        )
        .unwrap();
        let line_id = line.id();
        block.push_line(line);
        let block_id = block.id();
        room.blocks_mut().push(block);
        let room_id = estimate.add_room(room).unwrap();
        (estimate, room_id, block_id, line_id)
    }

    mod rooms {
        use super::*;

        #[test]
        fn rooms_kind_is_unbounded() {
            let mut estimate = Estimate::new("Big", EstimateKind::Rooms);
            for i in 0..5 {
                estimate.add_room(Room::new(format!("Room {i}"))).unwrap();
            }
            assert_eq!(estimate.rooms().len(), 5);
        }

        #[test]
        fn remove_room_cleans_references() {
            let (mut estimate, room_id, block_id, line_id) = estimate_with_line();
            estimate
                .attach_coefficient(AppliedCoefficient::new(
                    coefficient("r"),
                    CoefficientScope::blocks([block_id]),
                ))
                .unwrap();
            estimate.mark_manual(line_id).unwrap();

            estimate.remove_room(room_id).unwrap();

            assert!(estimate.manual_line_ids().is_empty());
            assert_eq!(
                estimate.coefficients()[0].scope,
                CoefficientScope::blocks([])
            );
        }

        #[test]
        fn remove_unknown_room_is_not_found() {
            let mut estimate = Estimate::new("Empty", EstimateKind::Rooms);
            assert!(estimate.remove_room(RoomId::new_v4()).unwrap_err().is_not_found());
        }
    }

    mod lines {
        use super::*;

        #[test]
        fn locate_and_remove_line() {
            let (mut estimate, room_id, block_id, line_id) = estimate_with_line();
            assert_eq!(
                estimate.locate_line(line_id),
                Some((room_id, LinePlacement::Work(block_id)))
            );
            estimate.mark_manual(line_id).unwrap();

            estimate.remove_line(line_id).unwrap();
            assert!(estimate.locate_line(line_id).is_none());
            assert!(!estimate.manual_line_ids().contains(&line_id));
        }

        #[test]
        fn quantity_change_keeps_frozen_total() {
            let (mut estimate, room_id, _, line_id) = estimate_with_line();
            let total = |e: &Estimate| {
                e.room(room_id).unwrap().line(line_id).unwrap().total_price().get()
            };
            estimate
                .require_line_mut(line_id)
                .unwrap()
                .set_total_price(Money::new(dec!(750)).unwrap());
            estimate.mark_manual(line_id).unwrap();

            estimate
                .set_line_quantity(line_id, Quantity::new(dec!(3)).unwrap())
                .unwrap();
            assert_eq!(total(&estimate), dec!(750));
            assert!(estimate.manual_line_ids().contains(&line_id));

            estimate.unmark_manual(line_id);
            estimate
                .set_line_quantity(line_id, Quantity::new(dec!(4)).unwrap())
                .unwrap();
            assert_eq!(total(&estimate), dec!(20));
        }

        #[test]
        fn mark_manual_requires_existing_line() {
            let (mut estimate, ..) = estimate_with_line();
            assert!(estimate.mark_manual(LineId::new_v4()).is_err());
        }
    }

    mod coefficients {
        use super::*;

        #[test]
        fn attach_replaces_same_id() {
            let (mut estimate, _, block_id, _) = estimate_with_line();
            estimate
                .attach_coefficient(AppliedCoefficient::new(
                    coefficient("a"),
                    CoefficientScope::Global,
                ))
                .unwrap();
            estimate
                .attach_coefficient(AppliedCoefficient::new(
                    coefficient("a"),
                    CoefficientScope::blocks([block_id]),
                ))
                .unwrap();

            assert_eq!(estimate.coefficients().len(), 1);
            assert!(matches!(
                estimate.coefficients()[0].scope,
                CoefficientScope::Blocks(_)
            ));
        }

        #[test]
        fn scope_with_unknown_block_rejected() {
            let (mut estimate, ..) = estimate_with_line();
            let err = estimate
                .attach_coefficient(AppliedCoefficient::new(
                    coefficient("a"),
                    CoefficientScope::blocks([BlockId::new_v4()]),
                ))
                .unwrap_err();
            assert!(err.is_not_found());
        }

        #[test]
        fn detach_unknown_is_not_found() {
            let (mut estimate, ..) = estimate_with_line();
            assert!(
                estimate
                    .detach_coefficient(&CoefficientId::new("missing"))
                    .unwrap_err()
                    .is_not_found()
            );
        }
    }
}
