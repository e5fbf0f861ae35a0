//! # Engine Configuration
//!
//! Layered configuration built with the `config` crate. Later sources
//! override earlier ones:
//!
//! 1. Built-in defaults
//! 2. TOML file: the path in `ESTIMATE_ENGINE_CONFIG`, else
//!    `estimate-engine.toml` in the working directory (optional)
//! 3. Environment variables prefixed `ESTIMATE_ENGINE_`, with `__`
//!    between nested keys (`ESTIMATE_ENGINE_PRICING__MONEY_SCALE=3`)
//!
//! A `.env` file is loaded into the process environment first.
//!
//! ```toml
//! [pricing]
//! apply_coefficients_to_materials = false
//! money_scale = 2
//!
//! [templates]
//! default_room_name = "Apartment"
//!
//! [logging]
//! level = "info"
//! json = false
//! ```

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::domain::services::PricingPolicy;
use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "ESTIMATE_ENGINE_CONFIG";

/// Config file looked up when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_FILE: &str = "estimate-engine.toml";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "ESTIMATE_ENGINE";

/// Largest accepted `pricing.money_scale`.
pub const MAX_MONEY_SCALE: u32 = 10;

/// Pricing policy switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Multiply material lines by globally scoped coefficients.
    pub apply_coefficients_to_materials: bool,
    /// Decimal places the renderer should display.
    pub money_scale: u32,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            apply_coefficients_to_materials: false,
            money_scale: 2,
        }
    }
}

/// Template application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Name of the room auto-created for `apartment` estimates.
    pub default_room_name: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            default_room_name: "Apartment".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` overrides it.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pricing policy.
    pub pricing: PricingConfig,
    /// Template application.
    pub templates: TemplateConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Loads configuration from `.env`, the config file and the environment.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Configuration` if a source is malformed
    /// or the result fails validation.
    pub fn load() -> ApplicationResult<Self> {
        // A missing .env is normal.
        let _ = dotenvy::dotenv();
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path)
    }

    /// Loads configuration from an optional file plus the environment.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Configuration` if a source is malformed
    /// or the result fails validation.
    pub fn load_from(path: &Path) -> ApplicationResult<Self> {
        let builder = defaults()?
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        finish(builder)
    }

    /// Parses configuration from a TOML document layered over defaults.
    ///
    /// The environment is not consulted.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Configuration` if the document is
    /// malformed or fails validation.
    pub fn from_toml_str(document: &str) -> ApplicationResult<Self> {
        finish(defaults()?.add_source(File::from_str(document, FileFormat::Toml)))
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Configuration` on the first invalid value.
    pub fn validate(&self) -> ApplicationResult<()> {
        if self.pricing.money_scale > MAX_MONEY_SCALE {
            return Err(ApplicationError::configuration(format!(
                "pricing.money_scale must be at most {MAX_MONEY_SCALE}, got {}",
                self.pricing.money_scale
            )));
        }
        if self.templates.default_room_name.trim().is_empty() {
            return Err(ApplicationError::configuration(
                "templates.default_room_name must not be empty",
            ));
        }
        Ok(())
    }

    /// Pricing policy handed to the aggregation engine.
    #[must_use]
    pub fn pricing_policy(&self) -> PricingPolicy {
        PricingPolicy {
            apply_coefficients_to_materials: self.pricing.apply_coefficients_to_materials,
        }
    }
}

fn defaults() -> ApplicationResult<ConfigBuilder<DefaultState>> {
    let defaults = EngineConfig::default();
    Config::builder()
        .set_default(
            "pricing.apply_coefficients_to_materials",
            defaults.pricing.apply_coefficients_to_materials,
        )
        .and_then(|b| {
            b.set_default(
                "pricing.money_scale",
                i64::from(defaults.pricing.money_scale),
            )
        })
        .and_then(|b| {
            b.set_default(
                "templates.default_room_name",
                defaults.templates.default_room_name,
            )
        })
        .and_then(|b| b.set_default("logging.level", defaults.logging.level))
        .and_then(|b| b.set_default("logging.json", defaults.logging.json))
        .map_err(config_error)
}

fn finish(builder: ConfigBuilder<DefaultState>) -> ApplicationResult<EngineConfig> {
    let config: EngineConfig = builder
        .build()
        .and_then(Config::try_deserialize)
        .map_err(config_error)?;
    config.validate()?;
    Ok(config)
}

fn config_error(err: config::ConfigError) -> ApplicationError {
    ApplicationError::configuration(err.to_string())
}
