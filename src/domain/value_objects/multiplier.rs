//! # Multiplier Value Object
//!
//! Non-negative factor produced by coefficient resolution.

use crate::domain::value_objects::arithmetic::{ArithmeticError, ArithmeticResult, CheckedArithmetic};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-negative pricing multiplier.
///
/// `Multiplier::ONE` is the identity; a zero multiplier legitimately
/// zeroes a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Multiplier(Decimal);

impl Multiplier {
    /// Identity multiplier.
    pub const ONE: Self = Self(Decimal::ONE);

    /// Creates a multiplier.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::InvalidValue` if `value` is negative.
    pub fn new(value: Decimal) -> ArithmeticResult<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(ArithmeticError::InvalidValue(
                "multiplier must not be negative",
            ));
        }
        Ok(Self(value))
    }

    /// Returns the underlying decimal.
    #[inline]
    #[must_use]
    pub const fn get(&self) -> Decimal {
        self.0
    }

    /// Returns true if this multiplier leaves prices unchanged.
    #[inline]
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.0 == Decimal::ONE
    }

    /// Composes two multipliers.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Overflow` on overflow.
    pub fn then(self, rhs: Self) -> ArithmeticResult<Self> {
        self.0.safe_mul(rhs.0).map(Self)
    }
}

impl Default for Multiplier {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "×{}", self.0)
    }
}
