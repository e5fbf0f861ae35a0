//! # Domain Enums
//!
//! Enumeration types for estimate concepts:
//!
//! - [`EstimateKind`] - Single flat surface or multi-room estimate
//! - [`CoefficientCategory`] - What a pricing coefficient represents
//! - [`CoefficientType`] - Composition phase of a coefficient
//!
//! All enums implement `Display`, `FromStr`, and Serde traits.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shape of an estimate.
///
/// # Examples
///
/// ```
/// use estimate_engine::domain::value_objects::enums::EstimateKind;
///
/// let kind: EstimateKind = "rooms".parse().unwrap();
/// assert!(kind.has_summary());
/// assert_eq!(EstimateKind::Apartment.to_string(), "apartment");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum EstimateKind {
    /// One flat priced surface (a single implicit room).
    Apartment,
    /// Any number of named rooms.
    Rooms,
}

impl EstimateKind {
    /// Returns true if the cross-room summary view applies to this kind.
    #[inline]
    #[must_use]
    pub const fn has_summary(self) -> bool {
        matches!(self, Self::Rooms)
    }

    /// Returns the maximum number of rooms, if bounded.
    #[inline]
    #[must_use]
    pub const fn max_rooms(self) -> Option<usize> {
        match self {
            Self::Apartment => Some(1),
            Self::Rooms => None,
        }
    }
}

impl fmt::Display for EstimateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apartment => write!(f, "apartment"),
            Self::Rooms => write!(f, "rooms"),
        }
    }
}

impl FromStr for EstimateKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "apartment" => Ok(Self::Apartment),
            "rooms" => Ok(Self::Rooms),
            _ => Err(ParseEnumError::InvalidValue("EstimateKind", s.to_string())),
        }
    }
}

/// Business category of a coefficient.
///
/// Categories are descriptive only: two coefficients of the same
/// category both apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CoefficientCategory {
    /// Regional price index.
    Region,
    /// Work complexity surcharge.
    Complexity,
    /// Urgency surcharge.
    Urgency,
    /// Seasonal adjustment.
    Season,
    /// Anything else.
    Custom,
}

impl fmt::Display for CoefficientCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Region => write!(f, "region"),
            Self::Complexity => write!(f, "complexity"),
            Self::Urgency => write!(f, "urgency"),
            Self::Season => write!(f, "season"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

impl FromStr for CoefficientCategory {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "region" => Ok(Self::Region),
            "complexity" => Ok(Self::Complexity),
            "urgency" => Ok(Self::Urgency),
            "season" => Ok(Self::Season),
            "custom" => Ok(Self::Custom),
            _ => Err(ParseEnumError::InvalidValue(
                "CoefficientCategory",
                s.to_string(),
            )),
        }
    }
}

/// Composition phase of a coefficient.
///
/// `Normal` coefficients are multiplied first, `Final` coefficients are
/// applied to the result of the normal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CoefficientType {
    /// Applied in the first phase.
    Normal,
    /// Applied after all normal coefficients.
    Final,
}

impl fmt::Display for CoefficientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Final => write!(f, "final"),
        }
    }
}

impl FromStr for CoefficientType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "final" => Ok(Self::Final),
            _ => Err(ParseEnumError::InvalidValue(
                "CoefficientType",
                s.to_string(),
            )),
        }
    }
}

/// Error type for parsing enum values from strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEnumError {
    /// The provided string value is not valid for the enum.
    InvalidValue(&'static str, String),
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue(enum_name, value) => {
                write!(f, "invalid {} value: '{}'", enum_name, value)
            }
        }
    }
}

impl std::error::Error for ParseEnumError {}
