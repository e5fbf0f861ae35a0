//! # Infrastructure Layer
//!
//! Adapters for the engine's external collaborators.
//!
//! - [`persistence`]: Estimate store
//! - [`catalog`]: Live catalog and coefficient catalog
//! - [`cache`]: Export breakdown cache
//! - [`templates`]: TOML template documents

pub mod cache;
pub mod catalog;
pub mod persistence;
pub mod templates;
