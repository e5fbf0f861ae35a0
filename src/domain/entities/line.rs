//! # Estimate Lines
//!
//! Priced lines of an estimate. Work lines live inside work blocks,
//! material lines live directly in a room; both share the [`Line`] shape.
//!
//! A line is priced either from the catalog or manually, never both and
//! never neither. [`LinePricing`] makes that structural; [`LineSpec`] is
//! the raw input form where the rule has to be checked.
//!
//! # Examples
//!
//! ```
//! use estimate_engine::domain::entities::line::{LineSource, LineSpec};
//! use rust_decimal::Decimal;
//!
//! let spec = LineSpec::manual("Haul-away", "trip", Decimal::new(750, 0), Decimal::ONE);
//! assert!(matches!(spec.validate().unwrap(), LineSource::Manual { .. }));
//!
//! let mut broken = spec.clone();
//! broken.catalog_item_id = Some("paint".into());
//! assert!(broken.validate().is_err());
//! ```

use crate::domain::entities::catalog_item::CatalogItem;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{CatalogItemId, LineId, Money, Quantity};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How a line is priced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum LinePricing {
    /// Priced from the catalog; the unit price is the catalog price at
    /// resolution time.
    Catalog {
        /// Catalog item reference.
        catalog_item_id: CatalogItemId,
        /// Title copied from the catalog.
        title: String,
        /// Unit copied from the catalog.
        unit: String,
        /// Resolved catalog unit price, before coefficients.
        unit_price: Money,
    },
    /// Authored by hand; coefficients never apply.
    Manual {
        /// Free-form name.
        name: String,
        /// Free-form unit.
        unit: String,
        /// Fixed unit price.
        unit_price: Money,
    },
}

impl LinePricing {
    /// Builds catalog pricing from a resolved catalog item.
    #[must_use]
    pub fn from_catalog(item: &CatalogItem) -> Self {
        Self::Catalog {
            catalog_item_id: item.id.clone(),
            title: item.title.clone(),
            unit: item.unit.clone(),
            unit_price: item.unit_price,
        }
    }

    /// Returns the unit price carried by this pricing.
    #[must_use]
    pub fn unit_price(&self) -> Money {
        match self {
            Self::Catalog { unit_price, .. } | Self::Manual { unit_price, .. } => *unit_price,
        }
    }
}

/// Validated source of a new line, before catalog resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineSource {
    /// Needs a live catalog lookup.
    Catalog(CatalogItemId),
    /// Ready to build.
    Manual {
        /// Free-form name.
        name: String,
        /// Free-form unit.
        unit: String,
        /// Fixed unit price.
        unit_price: Money,
    },
}

/// Raw line input with optional catalog and manual fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct LineSpec {
    /// Catalog reference (catalog lines only).
    #[serde(default)]
    pub catalog_item_id: Option<CatalogItemId>,
    /// Manual name (manual lines only).
    #[serde(default)]
    pub name: Option<String>,
    /// Manual unit (manual lines only).
    #[serde(default)]
    pub unit: Option<String>,
    /// Manual fixed unit price (manual lines only).
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    /// Ordered quantity.
    pub quantity: Decimal,
}

impl LineSpec {
    /// Spec for a catalog-linked line.
    #[must_use]
    pub fn catalog(catalog_item_id: impl Into<CatalogItemId>, quantity: Decimal) -> Self {
        Self {
            catalog_item_id: Some(catalog_item_id.into()),
            quantity,
            ..Self::default()
        }
    }

    /// Spec for a manual line.
    #[must_use]
    pub fn manual(
        name: impl Into<String>,
        unit: impl Into<String>,
        unit_price: Decimal,
        quantity: Decimal,
    ) -> Self {
        Self {
            catalog_item_id: None,
            name: Some(name.into()),
            unit: Some(unit.into()),
            unit_price: Some(unit_price),
            quantity,
        }
    }

    /// Checks the catalog/manual exclusivity rule and the numeric fields.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidStructure` if both or neither of the catalog
    ///   and manual fields are set
    /// - `DomainError::InvalidQuantity` / `DomainError::InvalidPrice` for
    ///   negative values
    pub fn validate(&self) -> DomainResult<LineSource> {
        self.quantity()?;
        let has_manual = self.name.is_some() || self.unit.is_some() || self.unit_price.is_some();

        match (&self.catalog_item_id, has_manual) {
            (Some(_), true) => Err(DomainError::invalid_structure(
                "line has both a catalog reference and manual pricing",
            )),
            (Some(id), false) => Ok(LineSource::Catalog(id.clone())),
            (None, true) => {
                let name = self
                    .name
                    .clone()
                    .filter(|n| !n.trim().is_empty())
                    .ok_or_else(|| DomainError::invalid_structure("manual line requires a name"))?;
                let unit_price = self.unit_price.ok_or_else(|| {
                    DomainError::invalid_structure("manual line requires a unit price")
                })?;
                let unit_price = Money::new(unit_price)
                    .map_err(|e| DomainError::InvalidPrice(e.to_string()))?;
                Ok(LineSource::Manual {
                    name,
                    unit: self.unit.clone().unwrap_or_default(),
                    unit_price,
                })
            }
            (None, false) => Err(DomainError::invalid_structure(
                "line has neither a catalog reference nor manual pricing",
            )),
        }
    }

    /// Returns the validated quantity.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidQuantity` if the quantity is negative.
    pub fn quantity(&self) -> DomainResult<Quantity> {
        Quantity::new(self.quantity).map_err(|e| DomainError::InvalidQuantity(e.to_string()))
    }
}

/// A priced line of an estimate.
///
/// # Invariants
///
/// - Exactly one pricing source (enforced by [`LinePricing`])
/// - `total_price` of a manual-pricing line equals `quantity × unit_price`
///   at authoring time and is never touched by coefficients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    id: LineId,
    quantity: Quantity,
    pricing: LinePricing,
    total_price: Money,
}

/// A line inside a work block; coefficients may apply to it.
pub type WorkLine = Line;

/// A material line inside a room.
pub type MaterialLine = Line;

impl Line {
    /// Creates a line from resolved pricing.
    ///
    /// Catalog lines start with `total_price = quantity × unit_price`; the
    /// aggregation engine applies coefficients on the next recompute.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Arithmetic` on overflow.
    pub fn new(pricing: LinePricing, quantity: Quantity) -> DomainResult<Self> {
        let total_price = pricing.unit_price().times(quantity)?;
        Ok(Self {
            id: LineId::new_v4(),
            quantity,
            pricing,
            total_price,
        })
    }

    /// Creates a catalog-priced line from a live catalog item.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Arithmetic` on overflow.
    pub fn from_catalog(item: &CatalogItem, quantity: Quantity) -> DomainResult<Self> {
        Self::new(LinePricing::from_catalog(item), quantity)
    }

    /// Creates a manual line.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Arithmetic` on overflow.
    pub fn manual(
        name: impl Into<String>,
        unit: impl Into<String>,
        unit_price: Money,
        quantity: Quantity,
    ) -> DomainResult<Self> {
        Self::new(
            LinePricing::Manual {
                name: name.into(),
                unit: unit.into(),
                unit_price,
            },
            quantity,
        )
    }

    /// Returns the line ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> LineId {
        self.id
    }

    /// Returns the quantity.
    #[inline]
    #[must_use]
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Returns the pricing source.
    #[inline]
    #[must_use]
    pub fn pricing(&self) -> &LinePricing {
        &self.pricing
    }

    /// Returns the current total price.
    #[inline]
    #[must_use]
    pub fn total_price(&self) -> Money {
        self.total_price
    }

    /// Returns the unit price before coefficients.
    #[must_use]
    pub fn unit_price(&self) -> Money {
        self.pricing.unit_price()
    }

    /// Returns the catalog reference, if catalog-priced.
    #[must_use]
    pub fn catalog_item_id(&self) -> Option<&CatalogItemId> {
        match &self.pricing {
            LinePricing::Catalog {
                catalog_item_id, ..
            } => Some(catalog_item_id),
            LinePricing::Manual { .. } => None,
        }
    }

    /// Returns true if priced from the catalog.
    #[must_use]
    pub fn is_catalog(&self) -> bool {
        matches!(self.pricing, LinePricing::Catalog { .. })
    }

    /// Returns the display name (catalog title or manual name).
    #[must_use]
    pub fn name(&self) -> &str {
        match &self.pricing {
            LinePricing::Catalog { title, .. } => title,
            LinePricing::Manual { name, .. } => name,
        }
    }

    /// Returns the unit of measure.
    #[must_use]
    pub fn unit(&self) -> &str {
        match &self.pricing {
            LinePricing::Catalog { unit, .. } | LinePricing::Manual { unit, .. } => unit,
        }
    }

    /// Changes the quantity.
    ///
    /// Manual-pricing lines re-author their total immediately; catalog lines
    /// are repriced by the next recompute.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Arithmetic` on overflow.
    pub fn set_quantity(&mut self, quantity: Quantity) -> DomainResult<()> {
        self.quantity = quantity;
        if let LinePricing::Manual { unit_price, .. } = &self.pricing {
            self.total_price = unit_price.times(quantity)?;
        }
        Ok(())
    }

    /// Replaces catalog pricing with a fresh catalog record.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStructure` for manual lines.
    pub fn refresh_from_catalog(&mut self, item: &CatalogItem) -> DomainResult<()> {
        if !self.is_catalog() {
            return Err(DomainError::invalid_structure(
                "manual lines are not linked to the catalog",
            ));
        }
        self.pricing = LinePricing::from_catalog(item);
        Ok(())
    }

    /// Stores a computed or authored total.
    pub(crate) fn set_total_price(&mut self, total: Money) {
        self.total_price = total;
    }
}
