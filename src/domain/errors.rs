//! # Domain Errors
//!
//! Business rule violations raised by entities and domain services.
//!
//! `NotFound` and `InvalidStructure` are user-visible failures; the
//! remaining variants guard entity invariants and numeric safety.
//!
//! # Examples
//!
//! ```
//! use estimate_engine::domain::errors::DomainError;
//!
//! let err = DomainError::not_found("Room", "3f2c");
//! assert!(err.is_not_found());
//! assert_eq!(err.to_string(), "Room not found: 3f2c");
//! ```

use crate::domain::value_objects::arithmetic::ArithmeticError;
use thiserror::Error;

/// Error type for domain operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A referenced entity does not exist (or belongs to another parent).
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity.
        entity: &'static str,
        /// Identifier that failed to resolve.
        id: String,
    },

    /// The shape of the estimate tree or of a line is invalid.
    #[error("invalid structure: {0}")]
    InvalidStructure(String),

    /// A re-parent operation would create a cycle in the block tree.
    #[error("block {block} cannot be moved under {parent}: cycle detected")]
    CycleDetected {
        /// Block being moved.
        block: String,
        /// Requested new parent.
        parent: String,
    },

    /// Quantity failed validation.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Price or total failed validation.
    #[error("invalid price: {0}")]
    InvalidPrice(String),

    /// Coefficient value or scope failed validation.
    #[error("invalid coefficient: {0}")]
    InvalidCoefficient(String),

    /// Checked arithmetic failed during recomputation.
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),
}

impl DomainError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates an invalid structure error.
    #[must_use]
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure(message.into())
    }

    /// Creates a cycle error.
    #[must_use]
    pub fn cycle(block: impl ToString, parent: impl ToString) -> Self {
        Self::CycleDetected {
            block: block.to_string(),
            parent: parent.to_string(),
        }
    }

    /// Returns true if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this is an invalid structure error.
    #[must_use]
    pub fn is_invalid_structure(&self) -> bool {
        matches!(self, Self::InvalidStructure(_) | Self::CycleDetected { .. })
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
