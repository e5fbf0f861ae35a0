//! # Domain Layer
//!
//! Pure estimate model and pricing rules. Nothing in this layer performs
//! I/O; every operation works over an already-loaded estimate tree.

pub mod entities;
pub mod errors;
pub mod services;
pub mod value_objects;
