//! `env_logger` backend configured from `LOG_CONFIG`.
//!
//! Level names follow the familiar `DEBUG`/`INFO`/`WARNING`/`ERROR`/`CRITICAL`
//! vocabulary; anything else is handed to `env_logger` as a filter directive
//! (`coopdoor=debug,warn`).  `RUST_LOG`, when set, wins over the file.

use std::io::Write;

use env_logger::{Builder, Target};
use log::SetLoggerError;

use crate::config::{LogConfig, LogHandler};

/// Translate a configured level into an `env_logger` filter string.
pub fn filter_directive(level: &str) -> String {
    match level.trim().to_ascii_uppercase().as_str() {
        "" | "INFO" => "info".into(),
        "NOTSET" | "TRACE" => "trace".into(),
        "DEBUG" => "debug".into(),
        "WARNING" | "WARN" => "warn".into(),
        "ERROR" | "CRITICAL" | "FATAL" => "error".into(),
        _ => level.trim().to_string(),
    }
}

/// Substitute the record fields into a format pattern.
pub fn render(pattern: &str, timestamp: &str, level: &str, target: &str, message: &str) -> String {
    pattern
        .replace("{timestamp}", timestamp)
        .replace("{level}", level)
        .replace("{target}", target)
        .replace("{message}", message)
}

/// Install the global logger.  Fails if one is already installed.
pub fn init(cfg: &LogConfig) -> Result<(), SetLoggerError> {
    let mut builder = Builder::new();
    match std::env::var("RUST_LOG") {
        Ok(filters) if !filters.trim().is_empty() => builder.parse_filters(&filters),
        _ => builder.parse_filters(&filter_directive(&cfg.level)),
    };
    builder.target(match cfg.handler {
        LogHandler::Stderr => Target::Stderr,
        LogHandler::Stdout => Target::Stdout,
    });

    let pattern = cfg.format.clone();
    builder.format(move |buf, record| {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string();
        let line = render(
            &pattern,
            &timestamp,
            record.level().as_str(),
            record.target(),
            &record.args().to_string(),
        );
        writeln!(buf, "{line}")
    });
    builder.try_init()
}
