//! # Estimate Engine
//!
//! Cost-estimate computation and aggregation for renovation estimates.
//!
//! An [`Estimate`](domain::entities::Estimate) holds rooms; rooms hold a
//! tree of work blocks with priced lines, plus material lines. Catalog
//! lines are priced as `quantity × unit price × multiplier`, where the
//! multiplier is the product of the coefficients reaching the line's
//! block. Manual lines keep their authored total.
//!
//! # Layers
//!
//! - [`domain`]: value objects, the estimate aggregate, and the pure
//!   pricing services (coefficient resolution, recompute, summaries,
//!   export breakdowns)
//! - [`application`]: transactional mutations, template application and
//!   the cached render read path
//! - [`infrastructure`]: store, catalog and cache ports with in-memory
//!   adapters, plus the TOML template loader
//! - [`config`] and [`logging`]: engine configuration and tracing setup
//!
//! # Examples
//!
//! ```
//! use estimate_engine::domain::entities::{Estimate, Line, Room, WorkBlock};
//! use estimate_engine::domain::services::AggregationEngine;
//! use estimate_engine::domain::value_objects::{EstimateKind, Money, Quantity};
//! use rust_decimal::dec;
//!
//! let mut estimate = Estimate::new("Flat", EstimateKind::Rooms);
//! let mut room = Room::new("Hall");
//! let mut block = WorkBlock::new("Demolition");
//! block.push_line(
//!     Line::manual("Haul-away", "trip", Money::new(dec!(750)).unwrap(), Quantity::new(dec!(1)).unwrap())
//!         .unwrap(),
//! );
//! room.push_block(block);
//! estimate.add_room(room).unwrap();
//!
//! let totals = AggregationEngine::default().recompute_estimate(&mut estimate).unwrap();
//! assert_eq!(totals.grand.get(), dec!(750));
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;

pub use application::{ApplicationError, ApplicationResult, EstimateService};
pub use config::EngineConfig;
