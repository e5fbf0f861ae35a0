//! # Coefficients
//!
//! Multiplicative pricing adjustments and their per-estimate scoping.
//!
//! A [`Coefficient`] is immutable shared reference data. An estimate
//! attaches coefficients as [`AppliedCoefficient`] snapshots, each carrying
//! a [`CoefficientScope`] that decides which work blocks it reaches.
//!
//! # Examples
//!
//! ```
//! use estimate_engine::domain::entities::coefficient::{Coefficient, CoefficientScope};
//! use estimate_engine::domain::value_objects::{BlockId, CoefficientCategory, CoefficientType};
//! use rust_decimal::Decimal;
//!
//! let urgency = Coefficient::new(
//!     "urgent",
//!     "Urgent works",
//!     Decimal::new(12, 1),
//!     CoefficientCategory::Urgency,
//!     CoefficientType::Normal,
//! ).unwrap();
//! assert!(urgency.is_normal());
//!
//! let kitchen = BlockId::new_v4();
//! let scope = CoefficientScope::blocks([kitchen]);
//! assert!(scope.covers(&kitchen));
//! assert!(!scope.covers(&BlockId::new_v4()));
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{
    BlockId, CoefficientCategory, CoefficientId, CoefficientType, Multiplier,
};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A pricing coefficient definition.
///
/// # Invariants
///
/// - `value` is non-negative (zero is valid)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Coefficient {
    id: CoefficientId,
    title: String,
    value: Multiplier,
    category: CoefficientCategory,
    #[serde(rename = "type")]
    coefficient_type: CoefficientType,
}

impl Coefficient {
    /// Creates a coefficient definition.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidCoefficient` if `value` is negative.
    pub fn new(
        id: impl Into<CoefficientId>,
        title: impl Into<String>,
        value: Decimal,
        category: CoefficientCategory,
        coefficient_type: CoefficientType,
    ) -> DomainResult<Self> {
        let value =
            Multiplier::new(value).map_err(|e| DomainError::InvalidCoefficient(e.to_string()))?;
        Ok(Self {
            id: id.into(),
            title: title.into(),
            value,
            category,
            coefficient_type,
        })
    }

    /// Returns the coefficient ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &CoefficientId {
        &self.id
    }

    /// Returns the display title.
    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the multiplicative value.
    #[inline]
    #[must_use]
    pub fn value(&self) -> Multiplier {
        self.value
    }

    /// Returns the business category.
    #[inline]
    #[must_use]
    pub fn category(&self) -> CoefficientCategory {
        self.category
    }

    /// Returns the composition phase.
    #[inline]
    #[must_use]
    pub fn coefficient_type(&self) -> CoefficientType {
        self.coefficient_type
    }

    /// Returns true if applied in the normal phase.
    #[inline]
    #[must_use]
    pub fn is_normal(&self) -> bool {
        self.coefficient_type == CoefficientType::Normal
    }
}

/// Which work blocks a coefficient reaches.
///
/// An empty `Blocks` set reaches nothing. Membership is exact: listing a
/// parent block does not cover its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "target", content = "block_ids", rename_all = "snake_case")]
pub enum CoefficientScope {
    /// Every work line of the estimate.
    Global,
    /// Only work lines in the listed blocks.
    Blocks(BTreeSet<BlockId>),
}

impl CoefficientScope {
    /// Builds a block-set scope.
    #[must_use]
    pub fn blocks(ids: impl IntoIterator<Item = BlockId>) -> Self {
        Self::Blocks(ids.into_iter().collect())
    }

    /// Returns true if the scope reaches `block_id`.
    #[must_use]
    pub fn covers(&self, block_id: &BlockId) -> bool {
        match self {
            Self::Global => true,
            Self::Blocks(ids) => ids.contains(block_id),
        }
    }

    /// Drops references to deleted blocks.
    ///
    /// Returns true if anything was removed.
    pub fn forget_blocks(&mut self, removed: &[BlockId]) -> bool {
        match self {
            Self::Global => false,
            Self::Blocks(ids) => {
                let before = ids.len();
                ids.retain(|id| !removed.contains(id));
                ids.len() != before
            }
        }
    }
}

/// A coefficient attached to an estimate together with its scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AppliedCoefficient {
    /// Snapshot of the definition at attach time.
    pub coefficient: Coefficient,
    /// Where it applies.
    pub scope: CoefficientScope,
}

impl AppliedCoefficient {
    /// Attaches `coefficient` with `scope`.
    #[must_use]
    pub fn new(coefficient: Coefficient, scope: CoefficientScope) -> Self {
        Self { coefficient, scope }
    }

    /// Returns true if this coefficient reaches `block_id`.
    #[must_use]
    pub fn applies_to(&self, block_id: &BlockId) -> bool {
        self.scope.covers(block_id)
    }
}
