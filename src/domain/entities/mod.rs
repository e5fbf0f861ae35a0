//! # Domain Entities
//!
//! Aggregate roots and entities representing the estimate structure.
//!
//! ## Aggregates
//!
//! - [`Estimate`]: Estimate aggregate owning rooms, coefficients and overrides
//!
//! ## Entities
//!
//! - [`Room`]: Room with work blocks and material lines
//! - [`WorkBlock`]: Node of the per-room block tree
//! - [`Line`] ([`WorkLine`], [`MaterialLine`]): Priced lines
//! - [`Coefficient`]: Pricing coefficient reference data
//! - [`Template`]: Reusable room structure

pub mod catalog_item;
pub mod coefficient;
pub mod estimate;
pub mod line;
pub mod room;
pub mod template;
pub mod totals;
pub mod work_block;

pub use catalog_item::CatalogItem;
pub use coefficient::{AppliedCoefficient, Coefficient, CoefficientScope};
pub use estimate::Estimate;
pub use line::{Line, LinePricing, LineSource, LineSpec, MaterialLine, WorkLine};
pub use room::{LinePlacement, Room};
pub use template::{Template, TemplateBlock, TemplateLine};
pub use totals::{EstimateTotals, RoomTotals};
pub use work_block::WorkBlock;
