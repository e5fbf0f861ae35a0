//! # Catalog Lookups
//!
//! Concurrent live-price resolution shared by the application services.

use crate::domain::entities::{CatalogItem, LinePricing, LineSource};
use crate::domain::services::PriceLookup;
use crate::domain::value_objects::{CatalogItemId, Money};
use crate::infrastructure::catalog::{CatalogError, CatalogResult, CatalogService};
use futures::future::join_all;
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

/// Outcome of resolving a batch of catalog ids.
///
/// `None` marks items that are unknown, deleted or inactive.
#[derive(Debug, Clone, Default)]
pub struct ResolvedCatalog {
    items: HashMap<CatalogItemId, Option<CatalogItem>>,
}

impl ResolvedCatalog {
    /// Resolves every distinct id concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first non-`NotFound` catalog error (e.g. the backend is
    /// unavailable); missing items are recorded, not raised.
    pub async fn fetch<I>(catalog: &dyn CatalogService, ids: I) -> CatalogResult<Self>
    where
        I: IntoIterator<Item = CatalogItemId>,
    {
        let ids: BTreeSet<CatalogItemId> = ids.into_iter().collect();
        let lookups = ids.iter().map(|id| catalog.get_price(id));
        let results = join_all(lookups).await;

        let mut items = HashMap::with_capacity(ids.len());
        for (id, result) in ids.into_iter().zip(results) {
            match result {
                Ok(item) => {
                    items.insert(id, Some(item));
                }
                Err(CatalogError::NotFound { .. }) => {
                    items.insert(id, None);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(Self { items })
    }

    /// Like [`fetch`](Self::fetch) but tolerant of backend failures, which
    /// are logged and treated as missing items.
    pub async fn fetch_lenient<I>(catalog: &dyn CatalogService, ids: I) -> Self
    where
        I: IntoIterator<Item = CatalogItemId>,
    {
        let ids: BTreeSet<CatalogItemId> = ids.into_iter().collect();
        let results = join_all(ids.iter().map(|id| catalog.get_price(id))).await;

        let items = ids
            .into_iter()
            .zip(results)
            .map(|(id, result)| {
                let item = result
                    .inspect_err(|e| {
                        if !e.is_not_found() {
                            warn!(catalog_item_id = %id, error = %e, "catalog lookup failed");
                        }
                    })
                    .ok();
                (id, item)
            })
            .collect();
        Self { items }
    }

    /// Returns the live item, or `None` if it could not be resolved.
    #[must_use]
    pub fn get(&self, id: &CatalogItemId) -> Option<&CatalogItem> {
        self.items.get(id).and_then(Option::as_ref)
    }
}

impl PriceLookup for ResolvedCatalog {
    fn current_price(&self, id: &CatalogItemId) -> Option<Money> {
        self.get(id).map(|item| item.unit_price)
    }
}

/// Turns a validated line source into pricing, resolving catalog
/// references live.
///
/// # Errors
///
/// Returns `CatalogError::NotFound` if the catalog item is unknown or
/// inactive.
pub async fn resolve_pricing(
    catalog: &dyn CatalogService,
    source: LineSource,
) -> CatalogResult<LinePricing> {
    match source {
        LineSource::Catalog(id) => Ok(LinePricing::from_catalog(&catalog.get_price(&id).await?)),
        LineSource::Manual {
            name,
            unit,
            unit_price,
        } => Ok(LinePricing::Manual {
            name,
            unit,
            unit_price,
        }),
    }
}
