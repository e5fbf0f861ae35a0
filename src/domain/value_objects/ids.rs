//! # Identifiers
//!
//! Strongly typed identifiers for estimate entities and reference data.
//!
//! - UUID-based: [`EstimateId`], [`RoomId`], [`BlockId`], [`LineId`]
//! - String-based (owned by external catalogs): [`CatalogItemId`],
//!   [`CoefficientId`], [`TemplateId`]
//!
//! # Examples
//!
//! ```
//! use estimate_engine::domain::value_objects::{CatalogItemId, RoomId};
//!
//! let room = RoomId::new_v4();
//! let parsed: RoomId = room.to_string().parse().unwrap();
//! assert_eq!(room, parsed);
//!
//! let item = CatalogItemId::new("paint-white");
//! assert_eq!(item.as_str(), "paint-white");
//! ```

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
            JsonSchema,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new_v4() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            #[inline]
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }
    };
}

uuid_id!(
    /// Identifier of an [`Estimate`](crate::domain::entities::Estimate).
    EstimateId
);
uuid_id!(
    /// Identifier of a [`Room`](crate::domain::entities::Room).
    RoomId
);
uuid_id!(
    /// Identifier of a [`WorkBlock`](crate::domain::entities::WorkBlock).
    BlockId
);
uuid_id!(
    /// Identifier shared by work lines and material lines.
    LineId
);

string_id!(
    /// Identifier of a priced item in the external catalog.
    CatalogItemId
);
string_id!(
    /// Identifier of a coefficient definition.
    CoefficientId
);
string_id!(
    /// Identifier of a reusable estimate template.
    TemplateId
);
