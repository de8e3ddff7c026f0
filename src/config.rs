//! Controller configuration.
//!
//! Read once at startup from a JSON document with upper-case keys, then
//! validated into an immutable [`Configuration`].  Nothing downstream of
//! [`RawConfig::validate`] re-checks ranges.

use core::time::Duration;
use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use chrono::{NaiveTime, TimeDelta};
use log::info;
use serde::{Deserialize, Serialize};

use crate::app::commands::Direction;
use crate::error::ConfigError;
use crate::pins::PinMap;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/door_controller/door_controller.conf";

/// Largest accepted `|BUFFER_AFTER_SUNSET|` in seconds (one day).
pub const MAX_BUFFER_SECS: i64 = 86_400;

/// Observer position for sunset calculations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Where log records are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogHandler {
    #[default]
    #[serde(alias = "console")]
    Stderr,
    Stdout,
}

/// `LOG_CONFIG` block.
///
/// Accepts either the flat `{level, handler, format}` object or a Python
/// `logging.config.dictConfig` document (`root`, `handlers`, `formatters`),
/// see [`LogDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LogDocument")]
pub struct LogConfig {
    /// Python-style level name or an `env_logger` filter string.
    pub level: String,
    pub handler: LogHandler,
    /// Pattern with `{timestamp}`, `{level}`, `{target}`, `{message}`.
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "INFO".into(),
            handler: LogHandler::Stderr,
            format: "{timestamp} {level} {target}: {message}".into(),
        }
    }
}

/// `LOG_CONFIG` as written.  Flat keys win over the dictConfig sections;
/// anything neither shape sets keeps its default.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LogDocument {
    level: Option<String>,
    handler: Option<LogHandler>,
    format: Option<String>,
    root: Option<DictLogger>,
    loggers: BTreeMap<String, DictLogger>,
    handlers: BTreeMap<String, DictHandler>,
    formatters: BTreeMap<String, DictFormatter>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DictLogger {
    level: Option<String>,
    handlers: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DictHandler {
    /// `ext://sys.stdout` or `ext://sys.stderr`.
    stream: Option<String>,
    formatter: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DictFormatter {
    format: Option<String>,
}

impl From<LogDocument> for LogConfig {
    fn from(doc: LogDocument) -> Self {
        let defaults = LogConfig::default();
        let root = doc.root.as_ref().or_else(|| doc.loggers.get(""));

        // The root logger's first known handler, else any handler.
        let handler = root
            .and_then(|r| r.handlers.iter().find_map(|name| doc.handlers.get(name)))
            .or_else(|| doc.handlers.values().next());

        let dict_format = handler
            .and_then(|h| h.formatter.as_ref())
            .and_then(|name| doc.formatters.get(name))
            .or_else(|| doc.formatters.values().next())
            .and_then(|f| f.format.as_deref())
            .map(python_format);

        LogConfig {
            level: doc
                .level
                .or_else(|| root.and_then(|r| r.level.clone()))
                .unwrap_or(defaults.level),
            handler: doc.handler.unwrap_or_else(|| match handler.and_then(|h| h.stream.as_deref()) {
                Some("ext://sys.stdout") => LogHandler::Stdout,
                _ => LogHandler::Stderr,
            }),
            format: doc.format.or(dict_format).unwrap_or(defaults.format),
        }
    }
}

/// Rewrite a `%(name)s` logging pattern into `{placeholder}` form.
///
/// Width and flag specifiers are dropped.  Attributes with no counterpart
/// (`%(lineno)d`, `%(process)d`, ...) are removed.
pub fn python_format(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + 1..];
        if let Some(tail) = rest.strip_prefix('%') {
            out.push('%');
            rest = tail;
            continue;
        }
        let Some(close) = rest.strip_prefix('(').and_then(|r| r.find(')')) else {
            out.push('%');
            continue;
        };
        let name = &rest[1..=close];
        let after = &rest[close + 2..];
        // Flags and width, then the one-letter conversion.
        let spec_len = after
            .char_indices()
            .find(|(_, c)| !matches!(c, '-' | '+' | ' ' | '#' | '.' | '0'..='9'))
            .map_or(after.len(), |(i, c)| i + c.len_utf8());
        rest = &after[spec_len..];
        out.push_str(match name {
            "asctime" => "{timestamp}",
            "levelname" => "{level}",
            "name" | "module" | "funcName" => "{target}",
            "message" => "{message}",
            _ => "",
        });
    }
    out.push_str(rest);
    out
}

/// Validated controller configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub pins: PinMap,
    /// PWM frequency on the enable line.
    pub frequency_hz: u32,
    /// PWM duty cycle while opening (0-100 %).
    pub duty_cycle: u8,
    /// Poll interval of the daemon loop.
    pub sleep_duration: Duration,
    /// How long the motor runs per actuation.
    pub time_to_open: Duration,
    /// Local time before which the door never opens.
    pub earliest_open: NaiveTime,
    /// Signed offset added to sunset.
    pub buffer_after_sunset: TimeDelta,
    pub location: Location,
    pub open_direction: Direction,
    pub log: LogConfig,
}

impl Configuration {
    /// Log every effective value, one line each.
    pub fn log_summary(&self) {
        info!("Config: IN1={} IN2={} EN={}", self.pins.in1, self.pins.in2, self.pins.en);
        info!("Config: frequency {} Hz", self.frequency_hz);
        info!("Config: duty cycle {}%", self.duty_cycle);
        info!("Config: sleep duration {}s", self.sleep_duration.as_secs());
        info!("Config: time to open {}s", self.time_to_open.as_secs());
        info!("Config: earliest open {}", self.earliest_open.format("%H:%M:%S"));
        info!("Config: buffer after sunset {}s", self.buffer_after_sunset.num_seconds());
        info!(
            "Config: location lat={:.4} lon={:.4}",
            self.location.latitude, self.location.longitude
        );
        info!("Config: open direction {}", self.open_direction);
    }
}

/// The document as written on disk.  Every field is optional here so that
/// a missing key is reported by name instead of as a serde error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct RawConfig {
    pub in1: Option<i64>,
    pub in2: Option<i64>,
    pub en: Option<i64>,
    pub frequency: Option<i64>,
    pub duty_cycle: Option<i64>,
    pub sleep_duration: Option<i64>,
    pub time_to_open: Option<i64>,
    pub earliest_open: Option<String>,
    pub buffer_after_sunset: Option<i64>,
    pub location: Option<Location>,
    pub open_direction: Option<Direction>,
    pub log_config: Option<LogConfig>,
}

impl RawConfig {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn validate(self) -> Result<Configuration, ConfigError> {
        let in1 = pin(self.in1, "IN1")?;
        let in2 = pin(self.in2, "IN2")?;
        let en = pin(self.en, "EN")?;
        let pins = PinMap::new(in1, in2, en)?;

        let frequency = self.frequency.ok_or(ConfigError::Missing("FREQUENCY"))?;
        let frequency_hz = u32::try_from(frequency)
            .ok()
            .filter(|f| *f > 0)
            .ok_or(ConfigError::ValidationFailed("FREQUENCY must be a positive integer"))?;

        let duty = self.duty_cycle.ok_or(ConfigError::Missing("DUTY_CYCLE"))?;
        if !(0..=100).contains(&duty) {
            return Err(ConfigError::ValidationFailed("DUTY_CYCLE must be 0-100"));
        }

        let sleep = self.sleep_duration.ok_or(ConfigError::Missing("SLEEP_DURATION"))?;
        if sleep <= 0 {
            return Err(ConfigError::ValidationFailed("SLEEP_DURATION must be > 0"));
        }

        let open_for = self.time_to_open.ok_or(ConfigError::Missing("TIME_TO_OPEN"))?;
        if open_for <= 0 {
            return Err(ConfigError::ValidationFailed("TIME_TO_OPEN must be > 0"));
        }

        let earliest_open = match self.earliest_open.as_deref().map(str::trim) {
            None | Some("") => NaiveTime::MIN,
            Some(text) => NaiveTime::parse_from_str(text, "%H:%M:%S").map_err(|_| {
                ConfigError::ValidationFailed("EARLIEST_OPEN must be formatted HH:MM:SS")
            })?,
        };

        let buffer = self.buffer_after_sunset.unwrap_or(0);
        if buffer.abs() > MAX_BUFFER_SECS {
            return Err(ConfigError::ValidationFailed(
                "BUFFER_AFTER_SUNSET must be within one day",
            ));
        }

        let location = self.location.ok_or(ConfigError::Missing("LOCATION"))?;
        if !(-90.0..=90.0).contains(&location.latitude) {
            return Err(ConfigError::ValidationFailed("LOCATION.LATITUDE must be -90..90"));
        }
        if !(-180.0..=180.0).contains(&location.longitude) {
            return Err(ConfigError::ValidationFailed("LOCATION.LONGITUDE must be -180..180"));
        }

        Ok(Configuration {
            pins,
            frequency_hz,
            duty_cycle: duty as u8,
            sleep_duration: Duration::from_secs(sleep as u64),
            time_to_open: Duration::from_secs(open_for as u64),
            earliest_open,
            buffer_after_sunset: TimeDelta::seconds(buffer),
            location,
            open_direction: self.open_direction.unwrap_or(Direction::Reverse),
            log: self.log_config.unwrap_or_default(),
        })
    }
}

fn pin(value: Option<i64>, key: &'static str) -> Result<u8, ConfigError> {
    let value = value.ok_or(ConfigError::Missing(key))?;
    // Range is checked by `PinMap::new`; only reject what cannot fit a u8.
    u8::try_from(value).map_err(|_| ConfigError::ValidationFailed("GPIO pins must be 0-27"))
}

/// Read, parse and validate the configuration file.
pub fn load(path: &Path) -> anyhow::Result<Configuration> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let raw = RawConfig::from_json(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    raw.validate()
        .with_context(|| format!("validating config {}", path.display()))
}
