//! # Catalog Item
//!
//! Current price record for a catalog item, as returned by the catalog
//! collaborator.

use crate::domain::value_objects::{CatalogItemId, Money};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Live catalog price for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CatalogItem {
    /// Catalog identifier.
    pub id: CatalogItemId,
    /// Display title.
    pub title: String,
    /// Unit of measure (m², pcs, ...).
    pub unit: String,
    /// Current unit price.
    pub unit_price: Money,
}

impl CatalogItem {
    /// Creates a catalog item.
    #[must_use]
    pub fn new(
        id: impl Into<CatalogItemId>,
        title: impl Into<String>,
        unit: impl Into<String>,
        unit_price: Money,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            unit: unit.into(),
            unit_price,
        }
    }
}
