//! Logging setup.
//!
//! Resolver and driver events are emitted under the `tablegate` target. The
//! configured level applies to that target only; anything else stays at
//! `warn` unless `RUST_LOG` says otherwise. Both entry points refuse to
//! replace a subscriber that is already installed, so an application that
//! embeds the crate keeps its own logging.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::{GatewayError, Result};

const TARGET: &str = env!("CARGO_CRATE_NAME");

fn parse_level(level: &str) -> Level {
    match level.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// `tablegate=<level>` directive for the configured level.
fn crate_directive(level: &str) -> Result<Directive> {
    let level = parse_level(level).to_string().to_lowercase();
    format!("{TARGET}={level}")
        .parse()
        .map_err(|e| GatewayError::Configuration(format!("invalid log level '{level}': {e}")))
}

fn filter_for(level: &str) -> Result<EnvFilter> {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::WARN.into())
        .from_env_lossy();
    Ok(filter.add_directive(crate_directive(level)?))
}

fn already_installed(e: impl std::fmt::Display) -> GatewayError {
    GatewayError::Configuration(format!("logging already initialized: {e}"))
}

/// Log to stdout and to `config.file`. An empty file path logs to stdout only.
pub fn init(config: &LoggingConfig) -> Result<()> {
    if config.file.is_empty() {
        return init_console_only(&config.level);
    }

    if let Some(dir) = Path::new(&config.file).parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    let log_file = Arc::new(File::create(&config.file)?);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout.and(log_file))
                .with_ansi(false)
                .with_target(true),
        )
        .with(filter_for(&config.level)?)
        .try_init()
        .map_err(already_installed)
}

/// Log to stdout only.
pub fn init_console_only(level: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(filter_for(level)?)
        .try_init()
        .map_err(already_installed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level(" Info "), Level::INFO);
        assert_eq!(parse_level("warning"), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
    }

    #[test]
    fn test_parse_level_default() {
        assert_eq!(parse_level("invalid"), Level::INFO);
        assert_eq!(parse_level(""), Level::INFO);
    }

    #[test]
    fn test_crate_directive_targets_crate() {
        let directive = crate_directive("debug").unwrap();
        assert_eq!(directive.to_string().to_lowercase(), "tablegate=debug");

        let directive = crate_directive("nonsense").unwrap();
        assert_eq!(directive.to_string().to_lowercase(), "tablegate=info");
    }

    #[test]
    fn test_second_init_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            level: "debug".to_string(),
            file: dir.path().join("logs/tablegate.log").display().to_string(),
        };

        // The first call may lose to another test; the second always fails.
        let _ = init(&config);
        assert!(matches!(
            init_console_only("info"),
            Err(GatewayError::Configuration(_))
        ));
    }
}
