//! # Templates
//!
//! Reusable predefined room structure: nested work blocks with lines, plus
//! material lines. Catalog lines carry the price seen when the template was
//! authored, but that price is informational only; applying a template
//! always re-resolves the live catalog price.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{CatalogItemId, Money, Quantity, TemplateId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A reusable estimate template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Template {
    /// Template identifier.
    pub id: TemplateId,
    /// Display name.
    pub name: String,
    /// Top-level work blocks.
    #[serde(default)]
    pub blocks: Vec<TemplateBlock>,
    /// Material lines added to the target room.
    #[serde(default)]
    pub materials: Vec<TemplateLine>,
}

/// A template work block, possibly nested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TemplateBlock {
    /// Block title.
    pub title: String,
    /// Lines of this block.
    #[serde(default)]
    pub lines: Vec<TemplateLine>,
    /// Nested child blocks.
    #[serde(default)]
    pub children: Vec<TemplateBlock>,
}

/// A template line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemplateLine {
    /// Resolved against the live catalog on apply.
    Catalog {
        /// Catalog reference.
        catalog_item_id: CatalogItemId,
        /// Quantity to insert.
        quantity: Quantity,
        /// Price seen at authoring time; never used for pricing.
        #[serde(default)]
        stored_unit_price: Option<Money>,
    },
    /// Copied verbatim.
    Manual {
        /// Line name.
        name: String,
        /// Unit of measure.
        #[serde(default)]
        unit: String,
        /// Fixed unit price.
        unit_price: Money,
        /// Quantity to insert.
        quantity: Quantity,
    },
}

impl TemplateLine {
    /// Returns the quantity to insert.
    #[must_use]
    pub fn quantity(&self) -> Quantity {
        match self {
            Self::Catalog { quantity, .. } | Self::Manual { quantity, .. } => *quantity,
        }
    }
}

impl TemplateBlock {
    fn line_count(&self) -> usize {
        self.lines.len() + self.children.iter().map(Self::line_count).sum::<usize>()
    }

    fn validate(&self) -> DomainResult<()> {
        if self.title.trim().is_empty() {
            return Err(DomainError::invalid_structure("template block title is empty"));
        }
        self.lines.iter().try_for_each(validate_line)?;
        self.children.iter().try_for_each(Self::validate)
    }
}

impl Template {
    /// Total number of lines (work and material) the template would insert.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.blocks.iter().map(TemplateBlock::line_count).sum::<usize>() + self.materials.len()
    }

    /// Every catalog item referenced anywhere in the template, with repeats.
    #[must_use]
    pub fn catalog_item_ids(&self) -> Vec<CatalogItemId> {
        let mut ids = Vec::new();
        let mut pending: Vec<&TemplateBlock> = self.blocks.iter().collect();
        let mut lines: Vec<&TemplateLine> = self.materials.iter().collect();
        while let Some(block) = pending.pop() {
            lines.extend(&block.lines);
            pending.extend(&block.children);
        }
        for line in lines {
            if let TemplateLine::Catalog {
                catalog_item_id, ..
            } = line
            {
                ids.push(catalog_item_id.clone());
            }
        }
        ids
    }

    /// Validates values that bypass constructors when deserialized.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidStructure` for empty titles or manual names
    /// - `DomainError::InvalidQuantity` / `DomainError::InvalidPrice` for
    ///   negative values
    pub fn validate(&self) -> DomainResult<()> {
        self.blocks.iter().try_for_each(TemplateBlock::validate)?;
        self.materials.iter().try_for_each(validate_line)
    }
}

fn validate_line(line: &TemplateLine) -> DomainResult<()> {
    Quantity::new(line.quantity().get())
        .map_err(|e| DomainError::InvalidQuantity(e.to_string()))?;
    if let TemplateLine::Manual {
        name, unit_price, ..
    } = line
    {
        if name.trim().is_empty() {
            return Err(DomainError::invalid_structure("manual template line has no name"));
        }
        Money::new(unit_price.get()).map_err(|e| DomainError::InvalidPrice(e.to_string()))?;
    }
    Ok(())
}
