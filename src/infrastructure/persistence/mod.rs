//! # Persistence Layer
//!
//! Store ports and adapters.
//!
//! ## Store Traits (Ports)
//!
//! - [`EstimateStore`]: Persistence for estimate aggregates
//!
//! ## Implementations
//!
//! - `in_memory`: In-memory implementation for tests and embedding

pub mod in_memory;
pub mod traits;

pub use in_memory::InMemoryEstimateStore;
pub use traits::{EstimateStore, RepositoryError, RepositoryResult};
