//! # Domain Services
//!
//! Pricing and aggregation logic that spans several entities.
//!
//! ## Services
//!
//! - [`CoefficientResolver`]: Effective multiplier per work block
//! - [`LineOverrideRegistry`]: Manual-line detection
//! - [`BlockTree`]: Strict-tree operations over a room's blocks
//! - [`AggregationEngine`]: Recompute and cross-room summaries
//! - [`ExportBreakdown`]: Render-ready estimate view

pub mod aggregation;
pub mod block_tree;
pub mod coefficient_resolver;
pub mod export;
pub mod line_override;

pub use aggregation::{
    AggregatedWorkItem, AggregationEngine, NoCatalogPrices, PriceLookup, PricingPolicy,
};
pub use block_tree::{BlockTree, RemovedSubtree};
pub use coefficient_resolver::{CoefficientResolver, ResolvedMultiplier};
pub use export::{BlockBreakdown, CoefficientRow, ExportBreakdown, LineRow, RoomBreakdown};
pub use line_override::LineOverrideRegistry;
