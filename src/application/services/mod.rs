//! # Application Services
//!
//! Services that orchestrate domain logic and infrastructure.
//!
//! This module provides application-level services including:
//! - [`EstimateService`]: Transactional estimate mutations
//! - [`TemplateApplier`]: Template instantiation with live catalog pricing
//! - [`ExportService`]: Cached render-ready breakdowns

pub mod catalog_lookup;
pub mod estimate_service;
pub mod export_service;
pub mod template_applier;
mod unit_of_work;

pub use catalog_lookup::ResolvedCatalog;
pub use estimate_service::{EstimateService, RefreshOutcome};
pub use export_service::ExportService;
pub use template_applier::{ApplyOutcome, SkippedLine, TemplateApplier};
