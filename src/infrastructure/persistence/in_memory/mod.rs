//! # In-Memory Stores
//!
//! In-memory implementations for tests and embedding without a database.
//!
//! ## Thread Safety
//!
//! All implementations use `Arc<RwLock<HashMap>>` for thread-safe access.

pub mod estimate_store;

pub use estimate_store::InMemoryEstimateStore;
