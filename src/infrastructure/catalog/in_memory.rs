//! # In-Memory Catalogs
//!
//! Catalog and coefficient catalog backed by `parking_lot` locks. Entries
//! can be deactivated to simulate items removed from sale; inactive
//! entries resolve as not found.

use crate::domain::entities::{CatalogItem, Coefficient};
use crate::domain::value_objects::{CatalogItemId, CoefficientId};
use crate::infrastructure::catalog::traits::{
    CatalogError, CatalogResult, CatalogService, CoefficientCatalogService,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    active: bool,
}

/// In-memory implementation of [`CatalogService`].
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    items: RwLock<HashMap<CatalogItemId, Entry<CatalogItem>>>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding `items`, all active.
    #[must_use]
    pub fn with_items(items: impl IntoIterator<Item = CatalogItem>) -> Self {
        let catalog = Self::new();
        for item in items {
            catalog.upsert(item);
        }
        catalog
    }

    /// Inserts or replaces an item and marks it active.
    pub fn upsert(&self, item: CatalogItem) {
        self.items.write().insert(
            item.id.clone(),
            Entry {
                value: item,
                active: true,
            },
        );
    }

    /// Marks an item inactive. Returns false if unknown.
    pub fn deactivate(&self, id: &CatalogItemId) -> bool {
        self.set_active(id, false)
    }

    /// Marks an item active again. Returns false if unknown.
    pub fn activate(&self, id: &CatalogItemId) -> bool {
        self.set_active(id, true)
    }

    /// Number of known items, active or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Returns true if the catalog holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn set_active(&self, id: &CatalogItemId, active: bool) -> bool {
        match self.items.write().get_mut(id) {
            Some(entry) => {
                entry.active = active;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl CatalogService for InMemoryCatalog {
    async fn get_price(&self, id: &CatalogItemId) -> CatalogResult<CatalogItem> {
        self.items
            .read()
            .get(id)
            .filter(|entry| entry.active)
            .map(|entry| entry.value.clone())
            .ok_or_else(|| CatalogError::not_found("CatalogItem", id))
    }
}

/// In-memory implementation of [`CoefficientCatalogService`].
#[derive(Debug, Default)]
pub struct InMemoryCoefficientCatalog {
    coefficients: RwLock<Vec<Entry<Coefficient>>>,
}

impl InMemoryCoefficientCatalog {
    /// Creates an empty coefficient catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding `coefficients`, all active.
    #[must_use]
    pub fn with_coefficients(coefficients: impl IntoIterator<Item = Coefficient>) -> Self {
        let catalog = Self::new();
        for coefficient in coefficients {
            catalog.upsert(coefficient);
        }
        catalog
    }

    /// Inserts or replaces a coefficient and marks it active.
    pub fn upsert(&self, coefficient: Coefficient) {
        let mut guard = self.coefficients.write();
        let entry = Entry {
            value: coefficient,
            active: true,
        };
        match guard.iter_mut().find(|e| e.value.id() == entry.value.id()) {
            Some(existing) => *existing = entry,
            None => guard.push(entry),
        }
    }

    /// Marks a coefficient inactive. Returns false if unknown.
    pub fn deactivate(&self, id: &CoefficientId) -> bool {
        match self.coefficients.write().iter_mut().find(|e| e.value.id() == id) {
            Some(entry) => {
                entry.active = false;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl CoefficientCatalogService for InMemoryCoefficientCatalog {
    async fn get(&self, id: &CoefficientId) -> CatalogResult<Coefficient> {
        self.coefficients
            .read()
            .iter()
            .find(|e| e.active && e.value.id() == id)
            .map(|e| e.value.clone())
            .ok_or_else(|| CatalogError::not_found("Coefficient", id))
    }

    async fn list_active(&self) -> CatalogResult<Vec<Coefficient>> {
        Ok(self
            .coefficients
            .read()
            .iter()
            .filter(|e| e.active)
            .map(|e| e.value.clone())
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{CoefficientCategory, CoefficientType, Money};
    use rust_decimal::dec;

    fn paint() -> CatalogItem {
        CatalogItem::new("paint", "Wall paint", "l", Money::new(dec!(12.5)).unwrap())
    }

    mod catalog {
        use super::*;

        #[tokio::test]
        async fn resolves_active_items() {
            let catalog = InMemoryCatalog::with_items([paint()]);
            let item = catalog.get_price(&CatalogItemId::new("paint")).await.unwrap();
            assert_eq!(item.unit_price.get(), dec!(12.5));
            assert_eq!(item.title, "Wall paint");
        }

        #[tokio::test]
        async fn inactive_items_are_not_found() {
            let catalog = InMemoryCatalog::with_items([paint()]);
            let id = CatalogItemId::new("paint");
            assert!(catalog.deactivate(&id));
            assert!(catalog.get_price(&id).await.unwrap_err().is_not_found());

            assert!(catalog.activate(&id));
            assert!(catalog.get_price(&id).await.is_ok());
        }

        #[tokio::test]
        async fn unknown_items_are_not_found() {
            let catalog = InMemoryCatalog::new();
            assert!(catalog.is_empty());
            let err = catalog
                .get_price(&CatalogItemId::new("ghost"))
                .await
                .unwrap_err();
            assert!(err.is_not_found());
        }

        #[tokio::test]
        async fn upsert_replaces_price() {
            let catalog = InMemoryCatalog::with_items([paint()]);
            catalog.upsert(CatalogItem::new(
                "paint",
                "Wall paint",
                "l",
                Money::new(dec!(14)).unwrap(),
            ));
            let item = catalog.get_price(&CatalogItemId::new("paint")).await.unwrap();
            assert_eq!(item.unit_price.get(), dec!(14));
            assert_eq!(catalog.len(), 1);
        }
    }

    mod coefficients {
        use super::*;

        fn region() -> Coefficient {
            Coefficient::new(
                "msk",
                "Moscow",
                dec!(1.2),
                CoefficientCategory::Region,
                CoefficientType::Normal,
            )
            .unwrap()
        }

        #[tokio::test]
        async fn lists_only_active() {
            let catalog = InMemoryCoefficientCatalog::with_coefficients([region()]);
            assert_eq!(catalog.list_active().await.unwrap().len(), 1);

            assert!(catalog.deactivate(&CoefficientId::new("msk")));
            assert!(catalog.list_active().await.unwrap().is_empty());
            assert!(
                catalog
                    .get(&CoefficientId::new("msk"))
                    .await
                    .unwrap_err()
                    .is_not_found()
            );
        }
    }
}
