//! # Store Traits
//!
//! Port definitions for estimate persistence.
//!
//! The engine never talks to a database directly. Application services go
//! through [`EstimateStore`], which provides optimistic locking on the
//! estimate's `version` so a load → mutate → save sequence either commits
//! as a whole or fails with [`RepositoryError::VersionConflict`].
//!
//! # Examples
//!
//! ```ignore
//! use estimate_engine::infrastructure::persistence::traits::EstimateStore;
//!
//! async fn names(store: &impl EstimateStore) {
//!     for estimate in store.list().await.unwrap() {
//!         println!("{}", estimate.name());
//!     }
//! }
//! ```

use crate::domain::entities::Estimate;
use crate::domain::value_objects::EstimateId;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Error type for store operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Entity not found.
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity identifier.
        id: String,
    },

    /// Duplicate entity.
    #[error("Duplicate entity: {entity_type} with id {id} already exists")]
    Duplicate {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity identifier.
        id: String,
    },

    /// Optimistic locking conflict.
    #[error("Version conflict: {entity_type} with id {id} has been modified")]
    VersionConflict {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity identifier.
        id: String,
        /// Expected version.
        expected: u64,
        /// Actual version.
        actual: u64,
    },

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RepositoryError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a duplicate error.
    #[must_use]
    pub fn duplicate(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::Duplicate {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a version conflict error.
    #[must_use]
    pub fn version_conflict(
        entity_type: &'static str,
        id: impl Into<String>,
        expected: u64,
        actual: u64,
    ) -> Self {
        Self::VersionConflict {
            entity_type,
            id: id.into(),
            expected,
            actual,
        }
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this is a duplicate error.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    /// Returns true if this is a version conflict error.
    #[must_use]
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }

    /// Returns true if retrying the whole mutate sequence may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::VersionConflict { .. } | Self::Connection(_))
    }
}

/// Result type for store operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Store for estimate aggregates.
///
/// An estimate is persisted as a whole, rooms, blocks and lines included,
/// so deleting it cascades to everything it owns.
#[async_trait]
pub trait EstimateStore: Send + Sync + fmt::Debug {
    /// Inserts a new estimate.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Duplicate` if the id is already stored.
    async fn insert(&self, estimate: &Estimate) -> RepositoryResult<()>;

    /// Gets an estimate by ID.
    ///
    /// Returns `None` if the estimate does not exist.
    async fn get(&self, id: &EstimateId) -> RepositoryResult<Option<Estimate>>;

    /// Saves a modified estimate.
    ///
    /// `estimate.version()` must equal the stored version; the store bumps
    /// the version on success.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NotFound` if the estimate was never inserted
    /// - `RepositoryError::VersionConflict` if it was modified since loaded
    async fn save(&self, estimate: &Estimate) -> RepositoryResult<()>;

    /// Deletes an estimate and everything it owns.
    ///
    /// Returns `true` if the estimate existed.
    async fn delete(&self, id: &EstimateId) -> RepositoryResult<bool>;

    /// Lists all estimates, oldest first.
    async fn list(&self) -> RepositoryResult<Vec<Estimate>>;

    /// Counts stored estimates.
    async fn count(&self) -> RepositoryResult<u64>;
}
