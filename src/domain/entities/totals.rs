//! # Denormalized Totals
//!
//! Totals stored on rooms and estimates. They always equal a fresh
//! recompute of the children; only the aggregation engine writes them.

use crate::domain::value_objects::Money;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Totals of one room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct RoomTotals {
    /// Sum of root work block totals.
    pub works: Money,
    /// Sum of material line totals.
    pub materials: Money,
    /// `works + materials`.
    pub total: Money,
}

/// Totals of a whole estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct EstimateTotals {
    /// Works total across rooms.
    pub works: Money,
    /// Materials total across rooms.
    pub materials: Money,
    /// `works + materials`.
    pub grand: Money,
}
