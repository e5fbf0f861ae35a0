//! # Template Documents
//!
//! Loads [`Template`]s from TOML documents.
//!
//! ```toml
//! id = "bathroom"
//! name = "Standard bathroom"
//!
//! [[blocks]]
//! title = "Tiling"
//!
//! [[blocks.lines]]
//! kind = "catalog"
//! catalog_item_id = "tile-30x60"
//! quantity = "12.5"
//!
//! [[blocks.children]]
//! title = "Grouting"
//!
//! [[materials]]
//! kind = "manual"
//! name = "Silicone"
//! unit = "tube"
//! unit_price = "4.20"
//! quantity = "3"
//! ```

use crate::domain::entities::Template;
use crate::domain::errors::DomainError;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Error type for template loading.
#[derive(Debug, Error)]
pub enum TemplateLoadError {
    /// File could not be read.
    #[error("failed to read template {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Document is not valid TOML for a template.
    #[error("failed to parse template: {0}")]
    Parse(#[from] toml::de::Error),

    /// Document parsed but violates template rules.
    #[error("invalid template: {0}")]
    Invalid(#[from] DomainError),
}

/// Parses and validates a TOML template document.
///
/// # Errors
///
/// - `TemplateLoadError::Parse` for malformed documents
/// - `TemplateLoadError::Invalid` for negative quantities or prices and
///   empty titles
pub fn parse_template(document: &str) -> Result<Template, TemplateLoadError> {
    let template: Template = toml::from_str(document)?;
    template.validate()?;
    debug!(
        template_id = %template.id,
        lines = template.line_count(),
        "template parsed"
    );
    Ok(template)
}

/// Reads and parses a TOML template file.
///
/// # Errors
///
/// Returns `TemplateLoadError::Io` if the file cannot be read, otherwise
/// the errors of [`parse_template`].
pub fn load_template(path: impl AsRef<Path>) -> Result<Template, TemplateLoadError> {
    let path = path.as_ref();
    let document = std::fs::read_to_string(path).map_err(|source| TemplateLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_template(&document)
}
