//! # Work Block
//!
//! Named grouping of work lines ("demolition", "electrical").
//!
//! Blocks form a strict tree inside a room: each block records its
//! `parent_id` and an explicit `level` (roots are level 0). Tree-shaping
//! operations live in [`crate::domain::services::block_tree`].

use crate::domain::entities::line::WorkLine;
use crate::domain::value_objects::{BlockId, LineId, Money};
use serde::{Deserialize, Serialize};

/// A work block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkBlock {
    id: BlockId,
    title: String,
    parent_id: Option<BlockId>,
    level: u32,
    lines: Vec<WorkLine>,
    /// Own lines plus all descendant blocks.
    total: Money,
}

impl WorkBlock {
    /// Creates a root block.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: BlockId::new_v4(),
            title: title.into(),
            parent_id: None,
            level: 0,
            lines: Vec::new(),
            total: Money::ZERO,
        }
    }

    /// Returns the block ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Returns the title.
    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the parent block, if nested.
    #[inline]
    #[must_use]
    pub fn parent_id(&self) -> Option<BlockId> {
        self.parent_id
    }

    /// Returns the depth (0 for roots).
    #[inline]
    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Returns the block's own lines.
    #[inline]
    #[must_use]
    pub fn lines(&self) -> &[WorkLine] {
        &self.lines
    }

    /// Returns the denormalized subtree total.
    #[inline]
    #[must_use]
    pub fn total(&self) -> Money {
        self.total
    }

    /// Returns true if this is a root block.
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Renames the block.
    pub fn rename(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Appends a line.
    pub fn push_line(&mut self, line: WorkLine) {
        self.lines.push(line);
    }

    /// Removes a line, returning it if present.
    pub fn remove_line(&mut self, line_id: LineId) -> Option<WorkLine> {
        let index = self.lines.iter().position(|l| l.id() == line_id)?;
        Some(self.lines.remove(index))
    }

    /// Finds a line by ID.
    #[must_use]
    pub fn line(&self, line_id: LineId) -> Option<&WorkLine> {
        self.lines.iter().find(|l| l.id() == line_id)
    }

    /// Finds a line by ID, mutably.
    pub fn line_mut(&mut self, line_id: LineId) -> Option<&mut WorkLine> {
        self.lines.iter_mut().find(|l| l.id() == line_id)
    }

    pub(crate) fn lines_mut(&mut self) -> &mut [WorkLine] {
        &mut self.lines
    }

    pub(crate) fn set_parent(&mut self, parent_id: Option<BlockId>, level: u32) {
        self.parent_id = parent_id;
        self.level = level;
    }

    pub(crate) fn set_level(&mut self, level: u32) {
        self.level = level;
    }

    pub(crate) fn set_total(&mut self, total: Money) {
        self.total = total;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Quantity;
    use rust_decimal::dec;

    fn manual_line(price: rust_decimal::Decimal) -> WorkLine {
        WorkLine::manual(
            "Manual",
            "job",
            Money::new(price).unwrap(),
            Quantity::new(dec!(1)).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn new_block_is_empty_root() {
        let block = WorkBlock::new("Demolition");
        assert!(block.is_root());
        assert_eq!(block.level(), 0);
        assert!(block.lines().is_empty());
        assert_eq!(block.total(), Money::ZERO);
    }

    #[test]
    fn push_and_remove_line() {
        let mut block = WorkBlock::new("Electrical");
        let line = manual_line(dec!(10));
        let id = line.id();
        block.push_line(line);

        assert!(block.line(id).is_some());
        assert!(block.remove_line(id).is_some());
        assert!(block.remove_line(id).is_none());
    }
}
