//! # Logging
//!
//! `tracing` subscriber setup. `RUST_LOG` overrides the configured level,
//! e.g. `RUST_LOG=estimate_engine=debug` to see recompute results.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::config::LoggingConfig;
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns `ApplicationError::Configuration` if the level directive is
/// invalid or a global subscriber is already installed.
pub fn init(config: &LoggingConfig) -> ApplicationResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            ApplicationError::configuration(format!("invalid log level {:?}: {e}", config.level))
        })?,
    };

    let builder = fmt().with_env_filter(filter).with_target(true);
    let installed = if config.json {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.with_line_number(true).try_init()
    };
    installed.map_err(|e| ApplicationError::configuration(format!("logging already set up: {e}")))
}

/// Installs a verbose subscriber writing through the test harness.
///
/// Safe to call from every test; only the first call takes effect.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_test_is_repeatable() {
        init_test();
        init_test();
        tracing::debug!("still logging");
    }

    #[test]
    fn invalid_level_is_rejected_when_rust_log_unset() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LoggingConfig {
            level: "estimate_engine=[".to_string(),
            json: false,
        };
        assert!(init(&config).is_err());
    }
}
