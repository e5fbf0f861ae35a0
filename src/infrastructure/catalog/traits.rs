//! # Catalog Ports
//!
//! The engine never caches catalog prices in module state; every lookup
//! goes through these traits so the live price is always used.

use crate::domain::entities::{CatalogItem, Coefficient};
use crate::domain::value_objects::{CatalogItemId, CoefficientId};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Error type for catalog lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Item is unknown, deleted or inactive.
    #[error("catalog entry not found: {entity} {id}")]
    NotFound {
        /// Kind of entry.
        entity: &'static str,
        /// Requested identifier.
        id: String,
    },

    /// The catalog backend could not be reached.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

impl CatalogError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates an unavailable error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Returns true if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if the lookup may succeed on retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Result type for catalog lookups.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Live catalog of priced items.
#[async_trait]
pub trait CatalogService: Send + Sync + fmt::Debug {
    /// Resolves the current price, unit and title of an active item.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for unknown or inactive items.
    async fn get_price(&self, id: &CatalogItemId) -> CatalogResult<CatalogItem>;
}

/// Read-only catalog of coefficient definitions.
#[async_trait]
pub trait CoefficientCatalogService: Send + Sync + fmt::Debug {
    /// Resolves an active coefficient definition.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for unknown or inactive coefficients.
    async fn get(&self, id: &CoefficientId) -> CatalogResult<Coefficient>;

    /// Lists every active coefficient.
    async fn list_active(&self) -> CatalogResult<Vec<Coefficient>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_not_retryable() {
        let err = CatalogError::not_found("CatalogItem", "paint");
        assert!(err.is_not_found());
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "catalog entry not found: CatalogItem paint");
    }

    #[test]
    fn unavailable_is_retryable() {
        assert!(CatalogError::unavailable("timeout").is_retryable());
    }
}
