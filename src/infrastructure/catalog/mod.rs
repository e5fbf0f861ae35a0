//! # Catalog Services
//!
//! Read-through access to live reference data: catalog item prices and
//! coefficient definitions.
//!
//! ## Ports
//!
//! - [`CatalogService`]: Current unit price, unit and title of a catalog item
//! - [`CoefficientCatalogService`]: Active coefficient definitions
//!
//! ## Implementations
//!
//! - [`InMemoryCatalog`], [`InMemoryCoefficientCatalog`]

pub mod in_memory;
pub mod traits;

pub use in_memory::{InMemoryCatalog, InMemoryCoefficientCatalog};
pub use traits::{CatalogError, CatalogResult, CatalogService, CoefficientCatalogService};
