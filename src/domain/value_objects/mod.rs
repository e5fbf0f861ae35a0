//! # Value Objects
//!
//! Immutable types with validation and domain semantics.
//!
//! ## Identity Types
//!
//! - [`EstimateId`], [`RoomId`], [`BlockId`], [`LineId`]: UUID-based identifiers
//! - [`CatalogItemId`], [`CoefficientId`], [`TemplateId`]: String-based identifiers
//!
//! ## Numeric Types
//!
//! - [`Money`]: Non-negative decimal amount
//! - [`Quantity`]: Non-negative decimal quantity
//! - [`Multiplier`]: Non-negative pricing factor
//!
//! ## Arithmetic
//!
//! - [`ArithmeticError`]: Error type for arithmetic failures
//! - [`CheckedArithmetic`]: Trait for safe arithmetic operations
//!
//! ## Domain Enums
//!
//! - [`EstimateKind`]: Apartment or multi-room estimate
//! - [`CoefficientCategory`], [`CoefficientType`]: Coefficient metadata

pub mod arithmetic;
pub mod enums;
pub mod ids;
pub mod money;
pub mod multiplier;
pub mod quantity;
pub mod timestamp;

pub use arithmetic::{ArithmeticError, ArithmeticResult, CheckedArithmetic};
pub use enums::{CoefficientCategory, CoefficientType, EstimateKind, ParseEnumError};
pub use ids::{BlockId, CatalogItemId, CoefficientId, EstimateId, LineId, RoomId, TemplateId};
pub use money::Money;
pub use multiplier::Multiplier;
pub use quantity::Quantity;
pub use timestamp::Timestamp;
