//! Property tests for pricing and aggregation.

#![allow(clippy::unwrap_used)]

use estimate_engine::domain::entities::{
    AppliedCoefficient, CatalogItem, Coefficient, CoefficientScope, Estimate, Line, Room,
    WorkBlock,
};
use estimate_engine::domain::services::{AggregationEngine, BlockTree, NoCatalogPrices};
use estimate_engine::domain::value_objects::{
    BlockId, CoefficientCategory, CoefficientType, EstimateKind, Money, Quantity, RoomId,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn cents() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000).prop_map(|c| Decimal::new(c, 2))
}

fn factor() -> impl Strategy<Value = Decimal> {
    (50i64..300).prop_map(|c| Decimal::new(c, 2))
}

fn item(index: usize, price: Decimal) -> CatalogItem {
    CatalogItem::new(
        format!("item-{index}").as_str(),
        format!("Item {index}"),
        "m2",
        Money::new(price).unwrap(),
    )
}

fn coefficient(id: &str, value: Decimal, kind: CoefficientType) -> Coefficient {
    Coefficient::new(id, id, value, CoefficientCategory::Custom, kind).unwrap()
}

/// One room with sibling root blocks `a` and `b`.
struct Fixture {
    estimate: Estimate,
    room: RoomId,
    a: BlockId,
    b: BlockId,
}

fn fixture(a_lines: &[(Decimal, Decimal)], b_lines: &[(Decimal, Decimal)]) -> Fixture {
    let mut estimate = Estimate::new("Property", EstimateKind::Rooms);
    let mut room = Room::new("Room");
    let a = BlockTree::insert(&mut room, WorkBlock::new("A"), None).unwrap();
    let b = BlockTree::insert(&mut room, WorkBlock::new("B"), None).unwrap();

    for (block, lines) in [(a, a_lines), (b, b_lines)] {
        let block = room.block_mut(block).unwrap();
        for (index, (price, quantity)) in lines.iter().enumerate() {
            let line =
                Line::from_catalog(&item(index, *price), Quantity::new(*quantity).unwrap())
                    .unwrap();
            block.push_line(line);
        }
    }
    let room = estimate.add_room(room).unwrap();
    Fixture {
        estimate,
        room,
        a,
        b,
    }
}

fn block_total(estimate: &Estimate, room: RoomId, block: BlockId) -> Decimal {
    estimate.room(room).unwrap().block(block).unwrap().total().get()
}

proptest! {
    #[test]
    fn catalog_line_total_is_price_times_quantity_times_multiplier(
        price in cents(),
        quantity in cents(),
        normal in factor(),
        last in factor(),
    ) {
        let mut f = fixture(&[(price, quantity)], &[]);
        f.estimate
            .attach_coefficient(AppliedCoefficient::new(
                coefficient("normal", normal, CoefficientType::Normal),
                CoefficientScope::Global,
            ))
            .unwrap();
        f.estimate
            .attach_coefficient(AppliedCoefficient::new(
                coefficient("final", last, CoefficientType::Final),
                CoefficientScope::Global,
            ))
            .unwrap();

        AggregationEngine::default().recompute_estimate(&mut f.estimate).unwrap();

        let expected = price * quantity * (normal * last);
        prop_assert_eq!(block_total(&f.estimate, f.room, f.a), expected);
        prop_assert_eq!(f.estimate.totals().grand.get(), expected);
    }

    #[test]
    fn manual_lines_ignore_coefficients(
        price in cents(),
        quantity in cents(),
        values in prop::collection::vec(factor(), 0..4),
    ) {
        let mut estimate = Estimate::new("Manual", EstimateKind::Rooms);
        let mut room = Room::new("Room");
        let block = BlockTree::insert(&mut room, WorkBlock::new("A"), None).unwrap();
        let line = Line::manual(
            "Haul-away",
            "trip",
            Money::new(price).unwrap(),
            Quantity::new(quantity).unwrap(),
        )
        .unwrap();
        let authored = line.total_price();
        room.block_mut(block).unwrap().push_line(line);
        let room = estimate.add_room(room).unwrap();
        for (i, value) in values.into_iter().enumerate() {
            estimate
                .attach_coefficient(AppliedCoefficient::new(
                    coefficient(&format!("c{i}"), value, CoefficientType::Normal),
                    CoefficientScope::Global,
                ))
                .unwrap();
        }

        AggregationEngine::default().recompute_estimate(&mut estimate).unwrap();

        prop_assert_eq!(block_total(&estimate, room, block), authored.get());
    }

    #[test]
    fn recompute_is_idempotent(
        a_lines in prop::collection::vec((cents(), cents()), 0..6),
        b_lines in prop::collection::vec((cents(), cents()), 0..6),
        value in factor(),
    ) {
        let mut f = fixture(&a_lines, &b_lines);
        f.estimate
            .attach_coefficient(AppliedCoefficient::new(
                coefficient("scoped", value, CoefficientType::Normal),
                CoefficientScope::blocks([f.a]),
            ))
            .unwrap();
        let engine = AggregationEngine::default();

        engine.recompute_estimate(&mut f.estimate).unwrap();
        let once = f.estimate.clone();
        engine.recompute_estimate(&mut f.estimate).unwrap();
        prop_assert_eq!(&f.estimate, &once);

        engine.recompute_room(&mut f.estimate, f.room).unwrap();
        prop_assert_eq!(f.estimate.room(f.room), once.room(f.room));
    }

    #[test]
    fn scoped_coefficient_never_reaches_sibling_block(
        a_lines in prop::collection::vec((cents(), cents()), 1..4),
        b_lines in prop::collection::vec((cents(), cents()), 1..4),
        value in factor(),
    ) {
        let engine = AggregationEngine::default();
        let mut plain = fixture(&a_lines, &b_lines);
        engine.recompute_estimate(&mut plain.estimate).unwrap();
        let unscaled_b = block_total(&plain.estimate, plain.room, plain.b);

        let mut scoped = fixture(&a_lines, &b_lines);
        scoped
            .estimate
            .attach_coefficient(AppliedCoefficient::new(
                coefficient("scoped", value, CoefficientType::Normal),
                CoefficientScope::blocks([scoped.a]),
            ))
            .unwrap();
        engine.recompute_estimate(&mut scoped.estimate).unwrap();

        prop_assert_eq!(block_total(&scoped.estimate, scoped.room, scoped.b), unscaled_b);
    }

    #[test]
    fn single_room_summary_accounts_for_every_line(
        a_lines in prop::collection::vec((cents(), cents()), 0..6),
        b_lines in prop::collection::vec((cents(), cents()), 0..6),
    ) {
        let engine = AggregationEngine::default();
        let mut f = fixture(&a_lines, &b_lines);
        engine.recompute_estimate(&mut f.estimate).unwrap();

        let summary = engine.build_summary(&f.estimate, &NoCatalogPrices).unwrap();

        prop_assert_eq!(summary.len(), a_lines.len().max(b_lines.len()));
        let summed: Decimal = summary.iter().map(|entry| entry.total_price.get()).sum();
        prop_assert_eq!(summed, f.estimate.totals().works.get());
        let quantity: Decimal = summary.iter().map(|entry| entry.total_quantity.get()).sum();
        let expected: Decimal = a_lines.iter().chain(&b_lines).map(|(_, q)| *q).sum();
        prop_assert_eq!(quantity, expected);
        for entry in &summary {
            prop_assert_eq!(entry.rooms.as_slice(), &[f.room]);
        }
    }
}
