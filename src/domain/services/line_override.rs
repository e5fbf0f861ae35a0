//! # Line Override Registry
//!
//! Decides whether a line is manual, i.e. keeps its authored total and is
//! never multiplied by a coefficient.

use crate::domain::entities::{Estimate, Line};
use crate::domain::value_objects::LineId;
use std::collections::BTreeSet;

/// Read view over an estimate's manual-override set.
#[derive(Debug, Clone, Copy)]
pub struct LineOverrideRegistry<'a> {
    overridden: &'a BTreeSet<LineId>,
}

impl<'a> LineOverrideRegistry<'a> {
    /// Wraps an explicit override set.
    #[must_use]
    pub fn new(overridden: &'a BTreeSet<LineId>) -> Self {
        Self { overridden }
    }

    /// Registry of `estimate`.
    #[must_use]
    pub fn for_estimate(estimate: &'a Estimate) -> Self {
        Self::new(estimate.manual_line_ids())
    }

    /// Returns true if the line is manual: either manually priced or a
    /// catalog line whose total was frozen by an override.
    #[must_use]
    pub fn is_manual(&self, line: &Line) -> bool {
        !line.is_catalog() || self.is_overridden(line.id())
    }

    /// Returns true if the line id is in the override set.
    #[must_use]
    pub fn is_overridden(&self, line_id: LineId) -> bool {
        self.overridden.contains(&line_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::CatalogItem;
    use crate::domain::value_objects::{Money, Quantity};
    use rust_decimal::dec;

    fn catalog_line() -> Line {
        let item = CatalogItem::new("paint", "Paint", "l", Money::new(dec!(10)).unwrap());
        Line::from_catalog(&item, Quantity::new(dec!(3)).unwrap()).unwrap()
    }

    #[test]
    fn manual_pricing_is_always_manual() {
        let set = BTreeSet::new();
        let registry = LineOverrideRegistry::new(&set);
        let line = Line::manual(
            "Haul debris",
            "trip",
            Money::new(dec!(50)).unwrap(),
            Quantity::new(dec!(1)).unwrap(),
        )
        .unwrap();
        assert!(registry.is_manual(&line));
    }

    #[test]
    fn catalog_line_is_manual_only_when_overridden() {
        let line = catalog_line();
        let empty = BTreeSet::new();
        assert!(!LineOverrideRegistry::new(&empty).is_manual(&line));

        let set = BTreeSet::from([line.id()]);
        assert!(LineOverrideRegistry::new(&set).is_manual(&line));
    }
}
