//! Commit semantics: optimistic locking, all-or-nothing recompute and
//! export cache invalidation.

#![allow(clippy::unwrap_used)]

mod common;

use async_trait::async_trait;
use common::{Harness, dec};
use estimate_engine::config::EngineConfig;
use estimate_engine::domain::entities::{CoefficientScope, Estimate, LineSpec};
use estimate_engine::domain::value_objects::{CoefficientId, EstimateId, EstimateKind};
use estimate_engine::infrastructure::cache::ExportCache;
use estimate_engine::infrastructure::persistence::{
    EstimateStore, InMemoryEstimateStore, RepositoryResult,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Store whose next save loses a race against a concurrent writer.
#[derive(Debug)]
struct RacingStore {
    inner: InMemoryEstimateStore,
    armed: AtomicBool,
}

impl RacingStore {
    fn new() -> Self {
        Self {
            inner: InMemoryEstimateStore::new(),
            armed: AtomicBool::new(false),
        }
    }

    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl EstimateStore for RacingStore {
    async fn insert(&self, estimate: &Estimate) -> RepositoryResult<()> {
        self.inner.insert(estimate).await
    }

    async fn get(&self, id: &EstimateId) -> RepositoryResult<Option<Estimate>> {
        self.inner.get(id).await
    }

    async fn save(&self, estimate: &Estimate) -> RepositoryResult<()> {
        if self.armed.swap(false, Ordering::SeqCst) {
            if let Some(mut competitor) = self.inner.get(&estimate.id()).await? {
                competitor.rename("Renamed elsewhere");
                self.inner.save(&competitor).await?;
            }
        }
        self.inner.save(estimate).await
    }

    async fn delete(&self, id: &EstimateId) -> RepositoryResult<bool> {
        self.inner.delete(id).await
    }

    async fn list(&self) -> RepositoryResult<Vec<Estimate>> {
        self.inner.list().await
    }

    async fn count(&self) -> RepositoryResult<u64> {
        self.inner.count().await
    }
}

mod locking {
    use super::*;

    #[tokio::test]
    async fn concurrent_writer_wins_and_caller_sees_conflict() {
        let store = Arc::new(RacingStore::new());
        let h = Harness::with_store(store.clone(), &EngineConfig::default());
        let (id, room, block) = h.room_with_block(EstimateKind::Rooms).await;
        let before = h.service.get_estimate(id).await.unwrap();

        store.arm();
        let err = h
            .service
            .add_work_line(id, room, block, LineSpec::catalog("plaster", dec("3")))
            .await
            .unwrap_err();

        assert!(err.is_version_conflict());
        assert!(err.is_retryable());

        let after = h.service.get_estimate(id).await.unwrap();
        assert_eq!(after.name(), "Renamed elsewhere");
        assert_eq!(after.version(), before.version() + 1);
        assert!(after.room(room).unwrap().block(block).unwrap().lines().is_empty());
    }

    #[tokio::test]
    async fn retry_after_conflict_commits() {
        let store = Arc::new(RacingStore::new());
        let h = Harness::with_store(store.clone(), &EngineConfig::default());
        let (id, room, block) = h.room_with_block(EstimateKind::Rooms).await;

        store.arm();
        let spec = LineSpec::catalog("plaster", dec("3"));
        assert!(
            h.service
                .add_work_line(id, room, block, spec.clone())
                .await
                .is_err()
        );
        let (estimate, _) = h.service.add_work_line(id, room, block, spec).await.unwrap();

        assert_eq!(estimate.totals().grand.get(), dec("300"));
        assert_eq!(estimate.name(), "Renamed elsewhere");
    }
}

mod atomicity {
    use super::*;

    #[tokio::test]
    async fn overflowing_recompute_leaves_store_untouched() {
        let h = Harness::new();
        let (id, room, block) = h.room_with_block(EstimateKind::Rooms).await;
        let huge = LineSpec::manual("Bulk", "pc", Decimal::ONE, Decimal::MAX);
        h.service
            .add_work_line(id, room, block, huge.clone())
            .await
            .unwrap();
        let before = h.service.get_estimate(id).await.unwrap();

        let err = h
            .service
            .add_work_line(id, room, block, huge)
            .await
            .unwrap_err();

        assert!(!err.is_retryable());
        let after = h.service.get_estimate(id).await.unwrap();
        assert_eq!(after.version(), before.version());
        assert_eq!(after.room(room).unwrap().block(block).unwrap().lines().len(), 1);
        assert_eq!(after.totals(), before.totals());
    }

    #[tokio::test]
    async fn unknown_catalog_item_commits_nothing() {
        let h = Harness::new();
        let (id, room, block) = h.room_with_block(EstimateKind::Rooms).await;
        let before = h.service.get_estimate(id).await.unwrap();

        let err = h
            .service
            .add_work_line(id, room, block, LineSpec::catalog("ghost", dec("1")))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(h.service.get_estimate(id).await.unwrap().version(), before.version());
    }
}

mod invalidation {
    use super::*;

    async fn prime(h: &Harness, id: EstimateId) {
        h.service.exports().breakdown_for_render(id).await.unwrap();
        assert!(h.cache.get(&id).await.is_some());
    }

    #[tokio::test]
    async fn every_mutation_drops_the_cached_breakdown() {
        let h = Harness::new();
        let (id, room, block) = h.room_with_block(EstimateKind::Rooms).await;

        prime(&h, id).await;
        let (_, line) = h
            .service
            .add_work_line(id, room, block, LineSpec::catalog("plaster", dec("2")))
            .await
            .unwrap();
        assert!(h.cache.get(&id).await.is_none());

        prime(&h, id).await;
        h.service.update_line_quantity(id, line, dec("4")).await.unwrap();
        assert!(h.cache.get(&id).await.is_none());

        prime(&h, id).await;
        h.service.override_line_total(id, line, dec("500")).await.unwrap();
        assert!(h.cache.get(&id).await.is_none());

        prime(&h, id).await;
        h.service
            .attach_coefficient(id, CoefficientId::new("region"), CoefficientScope::Global)
            .await
            .unwrap();
        assert!(h.cache.get(&id).await.is_none());

        prime(&h, id).await;
        h.service.rename_block(id, room, block, "Ceiling").await.unwrap();
        assert!(h.cache.get(&id).await.is_none());

        prime(&h, id).await;
        h.service.rename_room(id, room, "Bedroom").await.unwrap();
        assert!(h.cache.get(&id).await.is_none());

        prime(&h, id).await;
        h.service.refresh_catalog_prices(id).await.unwrap();
        assert!(h.cache.get(&id).await.is_none());

        prime(&h, id).await;
        h.service.remove_line(id, line).await.unwrap();
        assert!(h.cache.get(&id).await.is_none());
    }

    #[tokio::test]
    async fn cached_breakdown_matches_fresh_build_until_mutation() {
        let h = Harness::new();
        let (id, room, block) = h.room_with_block(EstimateKind::Rooms).await;
        h.service
            .add_work_line(id, room, block, LineSpec::catalog("tile", dec("2")))
            .await
            .unwrap();

        let first = h.service.exports().breakdown_for_render(id).await.unwrap();
        let second = h.service.exports().breakdown_for_render(id).await.unwrap();
        assert_eq!(first.source_version, second.source_version);

        h.service.recalculate(id).await.unwrap();
        let third = h.service.exports().breakdown_for_render(id).await.unwrap();
        assert_eq!(third.source_version, first.source_version + 1);
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn delete_cascades_and_clears_cache() {
        let h = Harness::new();
        let (id, room, block) = h.room_with_block(EstimateKind::Rooms).await;
        h.service
            .add_work_line(id, room, block, LineSpec::catalog("paint", dec("1")))
            .await
            .unwrap();
        h.service.exports().breakdown_for_render(id).await.unwrap();

        h.service.delete_estimate(id).await.unwrap();

        assert!(h.service.get_estimate(id).await.unwrap_err().is_not_found());
        assert!(h.cache.get(&id).await.is_none());
        assert_eq!(h.store.count().await.unwrap(), 0);
        assert!(h.service.delete_estimate(id).await.unwrap_err().is_not_found());
    }
}
