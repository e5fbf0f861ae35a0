//! Shared fixtures for integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use estimate_engine::config::EngineConfig;
use estimate_engine::domain::entities::{CatalogItem, Coefficient};
use estimate_engine::domain::value_objects::{
    BlockId, CoefficientCategory, CoefficientType, EstimateId, EstimateKind, Money, RoomId,
};
use estimate_engine::infrastructure::cache::InMemoryExportCache;
use estimate_engine::infrastructure::catalog::{InMemoryCatalog, InMemoryCoefficientCatalog};
use estimate_engine::infrastructure::persistence::{EstimateStore, InMemoryEstimateStore};
use estimate_engine::EstimateService;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Service wired to in-memory adapters, with handles to each adapter.
pub struct Harness {
    pub store: Arc<dyn EstimateStore>,
    pub catalog: Arc<InMemoryCatalog>,
    pub coefficients: Arc<InMemoryCoefficientCatalog>,
    pub cache: Arc<InMemoryExportCache>,
    pub service: EstimateService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        Self::with_store(Arc::new(InMemoryEstimateStore::new()), config)
    }

    /// Harness whose service writes through `store`.
    pub fn with_store(store: Arc<dyn EstimateStore>, config: &EngineConfig) -> Self {
        let catalog = Arc::new(InMemoryCatalog::with_items([
            item("plaster", "Wall plastering", "m2", "100"),
            item("paint", "Wall painting", "m2", "100"),
            item("tile", "Tiling", "m2", "45"),
            item("socket", "Socket install", "pc", "20"),
        ]));
        let coefficients = Arc::new(InMemoryCoefficientCatalog::with_coefficients([
            coefficient("region", "1.1", CoefficientType::Normal),
            coefficient("complex", "1.2", CoefficientType::Normal),
            coefficient("urgent", "1.05", CoefficientType::Final),
        ]));
        let cache = Arc::new(InMemoryExportCache::new());
        let service = EstimateService::new(
            store.clone(),
            catalog.clone(),
            coefficients.clone(),
            cache.clone(),
            config,
        );
        Self {
            store,
            catalog,
            coefficients,
            cache,
            service,
        }
    }

    /// Creates an estimate with one room holding one root block.
    pub async fn room_with_block(&self, kind: EstimateKind) -> (EstimateId, RoomId, BlockId) {
        let estimate = self.service.create_estimate("Flat", kind).await.unwrap();
        let (_, room) = self.service.add_room(estimate.id(), "Living room").await.unwrap();
        let (_, block) = self
            .service
            .add_block(estimate.id(), room, "Walls", None)
            .await
            .unwrap();
        (estimate.id(), room, block)
    }

    pub fn set_price(&self, id: &str, price: &str) {
        self.catalog.upsert(item(id, id, "m2", price));
    }
}

pub fn item(id: &str, title: &str, unit: &str, price: &str) -> CatalogItem {
    CatalogItem::new(id, title, unit, money(price))
}

pub fn coefficient(id: &str, value: &str, kind: CoefficientType) -> Coefficient {
    Coefficient::new(id, id, dec(value), CoefficientCategory::Custom, kind).unwrap()
}

pub fn dec(value: &str) -> Decimal {
    value.parse().unwrap()
}

pub fn money(value: &str) -> Money {
    Money::new(dec(value)).unwrap()
}
