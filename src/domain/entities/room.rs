//! # Room
//!
//! A room owns its work blocks (a flat list forming a strict tree) and its
//! material lines. Rooms are exclusively owned by one estimate.

use crate::domain::entities::line::{Line, MaterialLine};
use crate::domain::entities::totals::RoomTotals;
use crate::domain::entities::work_block::WorkBlock;
use crate::domain::value_objects::{BlockId, LineId, RoomId};
use serde::{Deserialize, Serialize};

/// Where a line lives inside a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinePlacement {
    /// Work line inside the given block.
    Work(BlockId),
    /// Material line.
    Material,
}

/// A room of an estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    id: RoomId,
    name: String,
    blocks: Vec<WorkBlock>,
    materials: Vec<MaterialLine>,
    totals: RoomTotals,
}

impl Room {
    /// Creates an empty room.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RoomId::new_v4(),
            name: name.into(),
            blocks: Vec::new(),
            materials: Vec::new(),
            totals: RoomTotals::default(),
        }
    }

    /// Returns the room ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> RoomId {
        self.id
    }

    /// Returns the room name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns all blocks in insertion order.
    #[inline]
    #[must_use]
    pub fn blocks(&self) -> &[WorkBlock] {
        &self.blocks
    }

    /// Returns the material lines.
    #[inline]
    #[must_use]
    pub fn materials(&self) -> &[MaterialLine] {
        &self.materials
    }

    /// Returns the denormalized totals.
    #[inline]
    #[must_use]
    pub fn totals(&self) -> RoomTotals {
        self.totals
    }

    /// Renames the room.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Finds a block by ID.
    #[must_use]
    pub fn block(&self, block_id: BlockId) -> Option<&WorkBlock> {
        self.blocks.iter().find(|b| b.id() == block_id)
    }

    /// Finds a block by ID, mutably.
    pub fn block_mut(&mut self, block_id: BlockId) -> Option<&mut WorkBlock> {
        self.blocks.iter_mut().find(|b| b.id() == block_id)
    }

    /// Appends `block` as a root block.
    ///
    /// Nesting goes through [`BlockTree`](crate::domain::services::BlockTree).
    pub fn push_block(&mut self, mut block: WorkBlock) {
        block.set_parent(None, 0);
        self.blocks.push(block);
    }

    /// Appends a material line.
    pub fn push_material(&mut self, line: MaterialLine) {
        self.materials.push(line);
    }

    /// Locates a line (work or material) by ID.
    #[must_use]
    pub fn placement_of(&self, line_id: LineId) -> Option<LinePlacement> {
        if let Some(block) = self.blocks.iter().find(|b| b.line(line_id).is_some()) {
            return Some(LinePlacement::Work(block.id()));
        }
        self.materials
            .iter()
            .any(|m| m.id() == line_id)
            .then_some(LinePlacement::Material)
    }

    /// Finds any line by ID.
    #[must_use]
    pub fn line(&self, line_id: LineId) -> Option<&Line> {
        self.blocks
            .iter()
            .find_map(|b| b.line(line_id))
            .or_else(|| self.materials.iter().find(|m| m.id() == line_id))
    }

    /// Finds any line by ID, mutably.
    pub fn line_mut(&mut self, line_id: LineId) -> Option<&mut Line> {
        if let Some(line) = self.blocks.iter_mut().find_map(|b| b.line_mut(line_id)) {
            return Some(line);
        }
        self.materials.iter_mut().find(|m| m.id() == line_id)
    }

    /// Removes any line by ID, returning it if present.
    pub fn remove_line(&mut self, line_id: LineId) -> Option<Line> {
        if let Some(line) = self.blocks.iter_mut().find_map(|b| b.remove_line(line_id)) {
            return Some(line);
        }
        let index = self.materials.iter().position(|m| m.id() == line_id)?;
        Some(self.materials.remove(index))
    }

    /// Returns the IDs of every line in the room.
    #[must_use]
    pub fn line_ids(&self) -> Vec<LineId> {
        self.blocks
            .iter()
            .flat_map(|b| b.lines().iter().map(Line::id))
            .chain(self.materials.iter().map(Line::id))
            .collect()
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<WorkBlock> {
        &mut self.blocks
    }

    pub(crate) fn materials_mut(&mut self) -> &mut [MaterialLine] {
        &mut self.materials
    }

    pub(crate) fn set_totals(&mut self, totals: RoomTotals) {
        self.totals = totals;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{Money, Quantity};
    use rust_decimal::dec;

    fn line() -> Line {
        Line::manual(
            "Tile adhesive",
            "bag",
            Money::new(dec!(12)).unwrap(),
            Quantity::new(dec!(4)).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn placement_distinguishes_work_and_material() {
        let mut room = Room::new("Bathroom");
        let mut block = WorkBlock::new("Tiling");
        let work = line();
        let work_id = work.id();
        block.push_line(work);
        let block_id = block.id();
        room.blocks_mut().push(block);

        let material = line();
        let material_id = material.id();
        room.push_material(material);

        assert_eq!(room.placement_of(work_id), Some(LinePlacement::Work(block_id)));
        assert_eq!(room.placement_of(material_id), Some(LinePlacement::Material));
        assert_eq!(room.placement_of(LineId::new_v4()), None);
        assert_eq!(room.line_ids().len(), 2);
    }

    #[test]
    fn remove_line_finds_materials() {
        let mut room = Room::new("Hall");
        let material = line();
        let id = material.id();
        room.push_material(material);

        assert!(room.remove_line(id).is_some());
        assert!(room.materials().is_empty());
        assert!(room.line(id).is_none());
    }
}
