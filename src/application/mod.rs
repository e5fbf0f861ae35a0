//! # Application Layer
//!
//! Use cases over the domain model: transactional estimate mutations,
//! template application and the render read path.

pub mod error;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
pub use services::{
    ApplyOutcome, EstimateService, ExportService, RefreshOutcome, SkippedLine, TemplateApplier,
};
