//! # Export Cache
//!
//! Denormalized breakdowns kept for the document renderer.
//!
//! - [`ExportCache`]: Port
//! - [`InMemoryExportCache`]: `DashMap`-backed adapter

pub mod in_memory;
pub mod traits;

pub use in_memory::InMemoryExportCache;
pub use traits::ExportCache;
