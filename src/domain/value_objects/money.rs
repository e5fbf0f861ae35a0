//! # Money Value Object
//!
//! Non-negative decimal amount with checked arithmetic.
//!
//! Every price and total in an estimate is a [`Money`] value. Amounts are
//! kept exact; no intermediate rounding happens inside the engine.
//!
//! # Examples
//!
//! ```
//! use estimate_engine::domain::value_objects::{Money, Multiplier, Quantity};
//! use rust_decimal::Decimal;
//!
//! let unit_price = Money::new(Decimal::new(100, 0)).unwrap();
//! let quantity = Quantity::new(Decimal::new(10, 0)).unwrap();
//! let multiplier = Multiplier::new(Decimal::new(1155, 3)).unwrap();
//!
//! let total = unit_price.times(quantity).unwrap().scaled(multiplier).unwrap();
//! assert_eq!(total.get(), Decimal::new(1155, 0));
//! ```

use crate::domain::value_objects::arithmetic::{ArithmeticError, ArithmeticResult, CheckedArithmetic};
use crate::domain::value_objects::multiplier::Multiplier;
use crate::domain::value_objects::quantity::Quantity;
use rust_decimal::{Decimal, RoundingStrategy};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-negative monetary amount.
///
/// # Invariants
///
/// - Never negative
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
    JsonSchema,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a money amount.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::InvalidValue` if `value` is negative.
    pub fn new(value: Decimal) -> ArithmeticResult<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(ArithmeticError::InvalidValue("money must not be negative"));
        }
        Ok(Self(value))
    }

    /// Returns the underlying decimal.
    #[inline]
    #[must_use]
    pub const fn get(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Adds two amounts.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Overflow` on overflow.
    pub fn safe_add(self, rhs: Self) -> ArithmeticResult<Self> {
        self.0.safe_add(rhs.0).map(Self)
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Overflow` on overflow.
    pub fn times(self, quantity: Quantity) -> ArithmeticResult<Self> {
        self.0.safe_mul(quantity.get()).map(Self)
    }

    /// Applies a pricing multiplier.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Overflow` on overflow.
    pub fn scaled(self, multiplier: Multiplier) -> ArithmeticResult<Self> {
        self.0.safe_mul(multiplier.get()).map(Self)
    }

    /// Divides a total by a quantity, yielding a per-unit amount.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::DivisionByZero` if `quantity` is zero.
    pub fn per_unit(self, quantity: Quantity) -> ArithmeticResult<Self> {
        self.0.safe_div(quantity.get()).map(Self)
    }

    /// Sums a sequence of amounts.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Overflow` if the sum overflows.
    pub fn sum<I>(amounts: I) -> ArithmeticResult<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, |acc, amount| acc.safe_add(amount))
    }

    /// Rounds half away from zero to `scale` decimal places, for display.
    #[must_use]
    pub fn rounded(self, scale: u32) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero),
        )
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
