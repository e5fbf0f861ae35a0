//! # Block Tree
//!
//! Strict-tree operations over a room's work blocks.
//!
//! Blocks are stored flat with `parent_id` and `level`. Every operation
//! here keeps the tree acyclic and the levels consistent; re-parenting is
//! validated against the moved block's own subtree.

use crate::domain::entities::{Room, WorkBlock};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{BlockId, LineId, Money};
use std::collections::{HashMap, HashSet};

/// Ids removed together with a block subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovedSubtree {
    /// The removed block and all its descendants.
    pub block_ids: Vec<BlockId>,
    /// Every line those blocks held.
    pub line_ids: Vec<LineId>,
}

/// Tree operations over one room.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockTree;

impl BlockTree {
    /// Inserts `block` under `parent` (or as a root), fixing its level.
    ///
    /// # Errors
    ///
    /// - `DomainError::NotFound` if `parent` is not a block of `room`
    /// - `DomainError::InvalidStructure` if the tree would grow past `u32::MAX` levels
    pub fn insert(
        room: &mut Room,
        mut block: WorkBlock,
        parent: Option<BlockId>,
    ) -> DomainResult<BlockId> {
        let level = match parent {
            Some(parent_id) => {
                let parent = room
                    .block(parent_id)
                    .ok_or_else(|| DomainError::not_found("WorkBlock", parent_id))?;
                Self::child_level(parent.level())?
            }
            None => 0,
        };
        block.set_parent(parent, level);
        let id = block.id();
        room.blocks_mut().push(block);
        Ok(id)
    }

    /// Moves `block_id` under `new_parent` (or to the root).
    ///
    /// # Errors
    ///
    /// - `DomainError::NotFound` if either block is not part of `room`
    /// - `DomainError::CycleDetected` if `new_parent` is the block itself or
    ///   one of its descendants
    /// - `DomainError::InvalidStructure` if the moved subtree would grow past
    ///   `u32::MAX` levels; the room is left unchanged
    pub fn reparent(
        room: &mut Room,
        block_id: BlockId,
        new_parent: Option<BlockId>,
    ) -> DomainResult<()> {
        if room.block(block_id).is_none() {
            return Err(DomainError::not_found("WorkBlock", block_id));
        }
        let level = match new_parent {
            Some(parent_id) => {
                if parent_id == block_id
                    || Self::descendants(room.blocks(), block_id).contains(&parent_id)
                {
                    return Err(DomainError::cycle(block_id, parent_id));
                }
                let parent = room
                    .block(parent_id)
                    .ok_or_else(|| DomainError::not_found("WorkBlock", parent_id))?;
                Self::child_level(parent.level())?
            }
            None => 0,
        };

        let levels = Self::subtree_levels(room.blocks(), block_id, level)?;
        if let Some(block) = room.block_mut(block_id) {
            block.set_parent(new_parent, level);
        }
        for block in room.blocks_mut().iter_mut() {
            if let Some(level) = levels.get(&block.id()) {
                block.set_level(*level);
            }
        }
        Ok(())
    }

    /// Removes `block_id` and its whole subtree.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the block is not part of `room`.
    pub fn remove_subtree(room: &mut Room, block_id: BlockId) -> DomainResult<RemovedSubtree> {
        if room.block(block_id).is_none() {
            return Err(DomainError::not_found("WorkBlock", block_id));
        }
        let mut doomed: HashSet<BlockId> = Self::descendants(room.blocks(), block_id)
            .into_iter()
            .collect();
        doomed.insert(block_id);

        let mut removed = RemovedSubtree::default();
        room.blocks_mut().retain(|block| {
            if !doomed.contains(&block.id()) {
                return true;
            }
            removed.block_ids.push(block.id());
            removed.line_ids.extend(block.lines().iter().map(|l| l.id()));
            false
        });
        Ok(removed)
    }

    /// All descendants of `block_id`, excluding itself.
    #[must_use]
    pub fn descendants(blocks: &[WorkBlock], block_id: BlockId) -> Vec<BlockId> {
        let children = Self::children_index(blocks);
        let mut out = Vec::new();
        let mut frontier = vec![block_id];
        while let Some(current) = frontier.pop() {
            if let Some(kids) = children.get(&current) {
                for kid in kids {
                    // A corrupted tree must not loop forever.
                    if *kid != block_id && !out.contains(kid) {
                        out.push(*kid);
                        frontier.push(*kid);
                    }
                }
            }
        }
        out
    }

    /// Blocks in depth-first pre-order: each root followed by its subtree,
    /// siblings in insertion order.
    ///
    /// Blocks whose parent is missing are treated as roots.
    #[must_use]
    pub fn preorder(blocks: &[WorkBlock]) -> Vec<&WorkBlock> {
        let by_id: HashMap<BlockId, &WorkBlock> = blocks.iter().map(|b| (b.id(), b)).collect();
        let children = Self::children_index(blocks);
        let mut out = Vec::with_capacity(blocks.len());
        let mut seen = HashSet::with_capacity(blocks.len());

        let mut stack: Vec<BlockId> = Self::roots(blocks).rev().map(WorkBlock::id).collect();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(block) = by_id.get(&id) {
                out.push(*block);
            }
            if let Some(kids) = children.get(&id) {
                stack.extend(kids.iter().rev());
            }
        }
        out
    }

    /// Root blocks in insertion order.
    pub fn roots(blocks: &[WorkBlock]) -> impl DoubleEndedIterator<Item = &WorkBlock> {
        let ids: HashSet<BlockId> = blocks.iter().map(WorkBlock::id).collect();
        blocks
            .iter()
            .filter(move |b| b.parent_id().is_none_or(|p| !ids.contains(&p)))
    }

    /// Subtree total of every block: own line totals plus descendants.
    ///
    /// Computed bottom-up without recursion so depth is unbounded.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Arithmetic` on overflow.
    pub fn subtree_totals(blocks: &[WorkBlock]) -> DomainResult<HashMap<BlockId, Money>> {
        let order = Self::preorder(blocks);
        let known: HashSet<BlockId> = blocks.iter().map(WorkBlock::id).collect();
        let mut totals: HashMap<BlockId, Money> = HashMap::with_capacity(order.len());
        for block in order.iter().rev() {
            let own = Money::sum(block.lines().iter().map(|l| l.total_price()))?;
            let subtotal = totals.get(&block.id()).copied().unwrap_or(Money::ZERO);
            let total = own.safe_add(subtotal)?;
            totals.insert(block.id(), total);
            if let Some(parent) = block.parent_id().filter(|p| known.contains(p)) {
                let acc = totals.entry(parent).or_insert(Money::ZERO);
                *acc = acc.safe_add(total)?;
            }
        }
        Ok(totals)
    }

    fn children_index(blocks: &[WorkBlock]) -> HashMap<BlockId, Vec<BlockId>> {
        let mut index: HashMap<BlockId, Vec<BlockId>> = HashMap::new();
        for block in blocks {
            if let Some(parent) = block.parent_id() {
                index.entry(parent).or_default().push(block.id());
            }
        }
        index
    }

    fn child_level(parent_level: u32) -> DomainResult<u32> {
        parent_level
            .checked_add(1)
            .ok_or_else(|| DomainError::invalid_structure("work block tree is too deep"))
    }

    /// Levels of every descendant of `root` once `root` sits at `root_level`.
    fn subtree_levels(
        blocks: &[WorkBlock],
        root: BlockId,
        root_level: u32,
    ) -> DomainResult<HashMap<BlockId, u32>> {
        let children = Self::children_index(blocks);
        let mut levels: HashMap<BlockId, u32> = HashMap::new();
        let mut frontier = vec![(root, root_level)];
        while let Some((id, level)) = frontier.pop() {
            if let Some(kids) = children.get(&id) {
                let kid_level = Self::child_level(level)?;
                for kid in kids {
                    if levels.insert(*kid, kid_level).is_none() {
                        frontier.push((*kid, kid_level));
                    }
                }
            }
        }
        Ok(levels)
    }
}
