//! # Application Errors
//!
//! Error types for the application layer.
//!
//! These errors represent failures of a use case: business rule violations
//! from the domain, store and catalog failures, and input validation.
//!
//! # Error Hierarchy
//!
//! ```text
//! ApplicationError
//! ├── Domain(DomainError)         - Business rule violations
//! ├── Repository(RepositoryError) - Store failures, version conflicts
//! ├── Catalog(CatalogError)       - Live catalog failures
//! ├── Validation(String)          - Input validation failures
//! ├── NotFound                    - Resource not found
//! ├── Configuration(String)       - Invalid engine configuration
//! └── Internal(String)            - Unexpected failures
//! ```
//!
//! # Examples
//!
//! ```
//! use estimate_engine::application::error::ApplicationError;
//! use estimate_engine::domain::errors::DomainError;
//!
//! let err = ApplicationError::validation("quantity must not be negative");
//! assert!(err.is_validation());
//!
//! let err: ApplicationError = DomainError::not_found("Room", "r-1").into();
//! assert!(err.is_not_found());
//! ```

use crate::domain::errors::DomainError;
use crate::infrastructure::catalog::CatalogError;
use crate::infrastructure::persistence::RepositoryError;
use thiserror::Error;

/// Application layer error.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain error from business logic.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// Store error.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Catalog lookup error.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Request validation failed.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("not found: {resource_type} with id {id}")]
    NotFound {
        /// Type of resource.
        resource_type: String,
        /// Resource identifier.
        id: String,
    },

    /// Engine configuration is invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(resource_type: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if retrying the whole operation may succeed.
    ///
    /// The engine never retries internally.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Repository(e) => e.is_retryable(),
            Self::Catalog(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Returns true if this is a not found error at any layer.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Domain(e) => e.is_not_found(),
            Self::Repository(e) => e.is_not_found(),
            Self::Catalog(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// Returns true if the estimate structure was rejected.
    #[must_use]
    pub fn is_invalid_structure(&self) -> bool {
        matches!(self, Self::Domain(e) if e.is_invalid_structure())
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if the save lost an optimistic locking race.
    #[must_use]
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::Repository(e) if e.is_version_conflict())
    }
}

/// Result type for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
