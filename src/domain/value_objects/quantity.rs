//! # Quantity Value Object
//!
//! Non-negative decimal amount of work or material (m², pcs, hours...).

use crate::domain::value_objects::arithmetic::{ArithmeticError, ArithmeticResult, CheckedArithmetic};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-negative quantity.
///
/// Zero is allowed: a line may be kept in an estimate with nothing
/// ordered yet.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
    JsonSchema,
)]
#[serde(transparent)]
pub struct Quantity(Decimal);

impl Quantity {
    /// Zero quantity.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a quantity.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::InvalidValue` if `value` is negative.
    pub fn new(value: Decimal) -> ArithmeticResult<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(ArithmeticError::InvalidValue("quantity must not be negative"));
        }
        Ok(Self(value))
    }

    /// Returns the underlying decimal.
    #[inline]
    #[must_use]
    pub const fn get(&self) -> Decimal {
        self.0
    }

    /// Returns true if the quantity is zero.
    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Adds two quantities.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Overflow` on overflow.
    pub fn safe_add(self, rhs: Self) -> ArithmeticResult<Self> {
        self.0.safe_add(rhs.0).map(Self)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
