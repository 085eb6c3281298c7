//! Tracing subscriber setup.
//!
//! Logs never go to stdout, which carries the MCP protocol. They go to
//! stderr, or are appended to `logging.file` when one is configured.
//! `RUST_LOG` overrides the configured level.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing::Subscriber;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{ConfigError, LoggingConfig};
use crate::error::Error;

/// Map a configured level name (Python-style names accepted, any case) to
/// an `EnvFilter` directive. `None` for names that are not levels.
pub fn level_directive(level: &str) -> Option<&'static str> {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => Some("trace"),
        "DEBUG" => Some("debug"),
        "INFO" => Some("info"),
        "WARNING" | "WARN" => Some("warn"),
        "ERROR" | "CRITICAL" => Some("error"),
        _ => None,
    }
}

/// Install the global subscriber. Call once, after configuration is resolved.
pub fn init(config: &LoggingConfig) -> Result<(), Error> {
    subscriber(config)?.init();
    Ok(())
}

/// Build the subscriber without installing it.
fn subscriber(config: &LoggingConfig) -> Result<impl Subscriber + Send + Sync + 'static, Error> {
    let directive = level_directive(&config.level).ok_or_else(|| ConfigError::InvalidField {
        field: "logging.level",
        value: config.level.clone(),
    })?;
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| directive.to_string());

    Ok(tracing_subscriber::fmt()
        .with_env_filter(log_filter)
        .with_ansi(false)
        .with_writer(writer(config)?)
        .finish())
}

fn writer(config: &LoggingConfig) -> Result<BoxMakeWriter, Error> {
    let Some(path) = &config.file else {
        return Ok(BoxMakeWriter::new(std::io::stderr));
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| Error::LogFile {
            path: path.clone(),
            source,
        })?;
    Ok(BoxMakeWriter::new(Mutex::new(file)))
}
