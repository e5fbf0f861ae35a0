//! # Coefficient Resolver
//!
//! Computes the effective pricing multiplier for a work block.
//!
//! Coefficients are resolved in two phases: the product of applicable
//! `normal` coefficients, then the product of applicable `final` ones.
//! The effective multiplier is `normal × final`. Duplicates within a
//! category all apply; there is no implicit max/min selection.
//!
//! # Examples
//!
//! ```
//! use estimate_engine::domain::entities::{AppliedCoefficient, Coefficient, CoefficientScope};
//! use estimate_engine::domain::services::CoefficientResolver;
//! use estimate_engine::domain::value_objects::{BlockId, CoefficientCategory, CoefficientType};
//! use rust_decimal::Decimal;
//!
//! let region = Coefficient::new(
//!     "msk",
//!     "Moscow",
//!     Decimal::new(11, 1),
//!     CoefficientCategory::Region,
//!     CoefficientType::Normal,
//! )
//! .unwrap();
//! let applied = vec![AppliedCoefficient::new(region, CoefficientScope::Global)];
//!
//! let multiplier = CoefficientResolver::resolve_for(&applied, &BlockId::new_v4()).unwrap();
//! assert_eq!(multiplier.get(), Decimal::new(11, 1));
//! ```

use crate::domain::entities::{AppliedCoefficient, CoefficientScope, Estimate};
use crate::domain::errors::DomainResult;
use crate::domain::value_objects::{
    ArithmeticResult, BlockId, CoefficientType, Multiplier,
};

/// Multiplier split into its two composition phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedMultiplier {
    /// Product of applicable `normal` coefficients.
    pub normal: Multiplier,
    /// Product of applicable `final` coefficients.
    pub final_group: Multiplier,
}

impl ResolvedMultiplier {
    /// Identity for both phases.
    pub const IDENTITY: Self = Self {
        normal: Multiplier::ONE,
        final_group: Multiplier::ONE,
    };

    /// Combines both phases into the effective multiplier.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Overflow` on overflow.
    pub fn effective(self) -> ArithmeticResult<Multiplier> {
        self.normal.then(self.final_group)
    }
}

/// Stateless resolver over an estimate's attached coefficients.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoefficientResolver;

impl CoefficientResolver {
    /// Effective multiplier for lines in `block_id` of `estimate`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Arithmetic` on overflow.
    pub fn resolve(estimate: &Estimate, block_id: BlockId) -> DomainResult<Multiplier> {
        Self::resolve_for(estimate.coefficients(), &block_id)
    }

    /// Effective multiplier for `block_id` given an explicit coefficient list.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Arithmetic` on overflow.
    pub fn resolve_for(
        coefficients: &[AppliedCoefficient],
        block_id: &BlockId,
    ) -> DomainResult<Multiplier> {
        Ok(Self::phases(coefficients, |scope| scope.covers(block_id))?.effective()?)
    }

    /// Multiplier for lines outside any block (material lines).
    ///
    /// Only globally scoped coefficients reach them.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Arithmetic` on overflow.
    pub fn resolve_unscoped(coefficients: &[AppliedCoefficient]) -> DomainResult<Multiplier> {
        Ok(Self::phases(coefficients, |scope| matches!(scope, CoefficientScope::Global))?
            .effective()?)
    }

    /// Both phase products for coefficients whose scope passes `reaches`.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Overflow` on overflow.
    pub fn phases<F>(
        coefficients: &[AppliedCoefficient],
        reaches: F,
    ) -> ArithmeticResult<ResolvedMultiplier>
    where
        F: Fn(&CoefficientScope) -> bool,
    {
        coefficients
            .iter()
            .filter(|applied| reaches(&applied.scope))
            .try_fold(ResolvedMultiplier::IDENTITY, |mut acc, applied| {
                let value = applied.coefficient.value();
                match applied.coefficient.coefficient_type() {
                    CoefficientType::Normal => acc.normal = acc.normal.then(value)?,
                    CoefficientType::Final => acc.final_group = acc.final_group.then(value)?,
                }
                Ok(acc)
            })
    }
}
