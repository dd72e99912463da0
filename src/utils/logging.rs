//! Logging setup.
//!
//! Everything goes to stderr so that `--format json` output on stdout stays
//! machine-readable. `RANSOM_SENTRY_LOG` accepts an env_logger filter string
//! and overrides the configured level.

use crate::core::config::Config;
use chrono::Local;
use env_logger::Builder;
use log::{Level, LevelFilter};
use std::io::{IsTerminal, Write};

/// Environment variable holding an optional filter override.
pub const LOG_ENV: &str = "RANSOM_SENTRY_LOG";

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    pub level: LevelFilter,
    /// Prefix lines with a local timestamp
    pub timestamps: bool,
    /// Include the emitting module
    pub module_path: bool,
    /// Color the level tag
    pub color: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            timestamps: true,
            module_path: false,
            color: std::io::stderr().is_terminal(),
        }
    }
}

impl LogConfig {
    /// Derive settings from the `[logging]` section.
    pub fn from_config(config: &Config) -> Self {
        let level = parse_level(&config.logging.log_level).unwrap_or(LevelFilter::Info);
        Self {
            level,
            module_path: level >= LevelFilter::Debug,
            ..Self::default()
        }
    }

    /// Debug output with module paths, for `--verbose`.
    pub fn verbose() -> Self {
        Self {
            level: LevelFilter::Debug,
            module_path: true,
            ..Self::default()
        }
    }

    /// Errors only, without timestamps.
    pub fn quiet() -> Self {
        Self {
            level: LevelFilter::Error,
            timestamps: false,
            ..Self::default()
        }
    }
}

/// Parse a level name as used in the config file.
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "trace" => Some(LevelFilter::Trace),
        "debug" => Some(LevelFilter::Debug),
        "info" => Some(LevelFilter::Info),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "error" => Some(LevelFilter::Error),
        _ => None,
    }
}

/// Fixed-width level tag, optionally wrapped in ANSI color.
fn level_tag(level: Level, color: bool) -> String {
    let (name, code) = match level {
        Level::Error => ("ERROR", 31),
        Level::Warn => ("WARN ", 33),
        Level::Info => ("INFO ", 32),
        Level::Debug => ("DEBUG", 34),
        Level::Trace => ("TRACE", 35),
    };
    if color {
        format!("\x1b[{}m{}\x1b[0m", code, name)
    } else {
        name.to_string()
    }
}

/// Install the global logger. A second call is a no-op.
pub fn init_logging(config: LogConfig) {
    let mut builder = Builder::new();
    builder
        .filter_level(config.level)
        .target(env_logger::Target::Stderr);

    if let Ok(filters) = std::env::var(LOG_ENV) {
        builder.parse_filters(&filters);
    }

    builder.format(move |buf, record| {
        if config.timestamps {
            write!(buf, "{} ", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
        }
        write!(buf, "[{}] ", level_tag(record.level(), config.color))?;
        if config.module_path {
            if let Some(module) = record.module_path() {
                write!(buf, "{}: ", module)?;
            }
        }
        writeln!(buf, "{}", record.args())
    });

    if builder.try_init().is_err() {
        return;
    }

    log::debug!("Logging initialized at {:?}", config.level);
}
