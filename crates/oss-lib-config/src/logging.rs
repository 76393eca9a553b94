//! Process-wide logging bootstrap.
//!
//! A single `log` facade logger is installed on first use; every call to
//! [`setup_logging`] builds a fresh `env_logger` and swaps it in, so the most
//! recent configuration fully replaces the previous one.

use crate::ConfigError;
use crate::loader::read_yaml;
use chrono::Local;
use chrono::format::{Item, StrftimeItems};
use env_logger::{Builder, Target};
use log::{Level, LevelFilter, Log, Metadata, Record, info, warn};
use parking_lot::{RwLock, const_rwlock};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::OnceLock;

/// Default record layout.
pub const LOG_FORMAT: &str = "{asctime} - {name} - {levelname} - {message}";
/// Default timestamp layout (`YYYY-MM-DD HH:MM:SS`).
pub const LOG_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static LOGGER: ReloadableLogger = ReloadableLogger {
    inner: const_rwlock(None),
};
static INSTALLED: OnceLock<bool> = OnceLock::new();

/// Logging configuration file contents.
///
/// ```yaml
/// level: info
/// loggers:
///   oss_lib_config: debug
/// format: "{asctime} - {name} - {levelname} - {message}"
/// datefmt: "%Y-%m-%d %H:%M:%S"
/// output: stderr
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Root level: off, error, warn(ing), info, debug, trace.
    #[serde(default = "default_level")]
    pub level: String,
    /// Per-target levels keyed by logger name (module path).
    #[serde(default)]
    pub loggers: BTreeMap<String, String>,
    /// Record template; see [`LogTemplate`].
    #[serde(default = "default_format")]
    pub format: String,
    /// strftime layout for `{asctime}`.
    #[serde(default = "default_datefmt")]
    pub datefmt: String,
    #[serde(default)]
    pub output: LogOutput,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            loggers: BTreeMap::new(),
            format: default_format(),
            datefmt: default_datefmt(),
            output: LogOutput::default(),
        }
    }
}

fn default_level() -> String {
    "warn".to_string()
}

fn default_format() -> String {
    LOG_FORMAT.to_string()
}

fn default_datefmt() -> String {
    LOG_DATE_FORMAT.to_string()
}

/// Stream log records are written to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stderr,
    Stdout,
}

impl LoggingConfig {
    /// Load a YAML logging configuration. An empty file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match read_yaml(path)? {
            Value::Null => Ok(Self::default()),
            value => serde_json::from_value(value).map_err(|err| {
                ConfigError::Logging(format!("invalid logging config {}: {err}", path.display()))
            }),
        }
    }

    /// Build an `env_logger` for this configuration.
    ///
    /// `debug` forces the root level to DEBUG; per-logger levels are kept.
    pub fn build_logger(&self, debug: bool) -> Result<env_logger::Logger, ConfigError> {
        let root = if debug {
            LevelFilter::Debug
        } else {
            parse_level(&self.level)?
        };
        let template = LogTemplate::parse(&self.format)?;
        check_datefmt(&self.datefmt)?;
        let datefmt = self.datefmt.clone();

        let mut builder = Builder::new();
        builder.filter_level(root);
        for (name, level) in &self.loggers {
            builder.filter_module(name, parse_level(level)?);
        }
        builder
            .target(match self.output {
                LogOutput::Stderr => Target::Stderr,
                LogOutput::Stdout => Target::Stdout,
            })
            .format(move |buf, record| {
                let asctime = Local::now().format(&datefmt).to_string();
                writeln!(buf, "{}", template.render(record, &asctime))
            });
        Ok(builder.build())
    }
}

/// Configure process-wide logging.
///
/// Without a path, records go to stderr as
/// `<timestamp> - <logger-name> - <level> - <message>` at WARN. With a path,
/// the YAML logging configuration is loaded; any failure is returned.
///
/// When the host already installed its own `log` logger, that logger keeps
/// receiving records and only the level from this configuration applies.
pub fn setup_logging(log_config_path: Option<&Path>, debug: bool) -> Result<(), ConfigError> {
    let config = match log_config_path {
        Some(path) => LoggingConfig::load(path)?,
        None => LoggingConfig::default(),
    };
    install(config.build_logger(debug)?);

    if let Some(path) = log_config_path {
        info!("logging configuration file is specified: {}", path.display());
    }
    if debug {
        info!("setting up the DEBUG logging level");
    }
    Ok(())
}

fn install(logger: env_logger::Logger) {
    let max_level = logger.filter();
    *LOGGER.inner.write() = Some(logger);
    let installed = *INSTALLED.get_or_init(|| log::set_logger(&LOGGER).is_ok());
    log::set_max_level(max_level);
    if !installed {
        warn!("another logger is already installed; keeping it at level {max_level}");
    }
}

/// Parse a level name; accepts `warning` and `critical` aliases.
pub fn parse_level(name: &str) -> Result<LevelFilter, ConfigError> {
    match name.to_ascii_lowercase().as_str() {
        "warning" => Ok(LevelFilter::Warn),
        "critical" | "fatal" => Ok(LevelFilter::Error),
        "notset" => Ok(LevelFilter::Trace),
        other => other
            .parse()
            .map_err(|_| ConfigError::Logging(format!("unknown log level \"{name}\""))),
    }
}

fn check_datefmt(datefmt: &str) -> Result<(), ConfigError> {
    if StrftimeItems::new(datefmt).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::Logging(format!(
            "invalid date format \"{datefmt}\""
        )));
    }
    Ok(())
}

/// Delegates to the most recently configured logger.
struct ReloadableLogger {
    inner: RwLock<Option<env_logger::Logger>>,
}

impl Log for ReloadableLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.inner
            .read()
            .as_ref()
            .is_some_and(|logger| logger.enabled(metadata))
    }

    fn log(&self, record: &Record) {
        if let Some(logger) = self.inner.read().as_ref() {
            logger.log(record);
        }
    }

    fn flush(&self) {
        if let Some(logger) = self.inner.read().as_ref() {
            logger.flush();
        }
    }
}

/// Pre-parsed record template.
///
/// Placeholders: `{asctime}`, `{name}` (log target), `{levelname}`,
/// `{message}`, `{module}`, `{lineno}`. Anything else is copied verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTemplate {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    AscTime,
    Name,
    LevelName,
    Message,
    Module,
    LineNo,
}

impl LogTemplate {
    pub fn parse(format: &str) -> Result<Self, ConfigError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = format;
        while let Some(start) = rest.find('{') {
            literal.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let Some(end) = after.find('}') else {
                return Err(ConfigError::Logging(format!(
                    "unterminated placeholder in log format \"{format}\""
                )));
            };
            let segment = match &after[..end] {
                "asctime" => Segment::AscTime,
                "name" => Segment::Name,
                "levelname" => Segment::LevelName,
                "message" => Segment::Message,
                "module" => Segment::Module,
                "lineno" => Segment::LineNo,
                other => {
                    return Err(ConfigError::Logging(format!(
                        "unknown placeholder {{{other}}} in log format"
                    )));
                }
            };
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(segment);
            rest = &after[end + 1..];
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    /// Render a record with a preformatted timestamp.
    pub fn render(&self, record: &Record, asctime: &str) -> String {
        let mut line = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => line.push_str(text),
                Segment::AscTime => line.push_str(asctime),
                Segment::Name => line.push_str(record.target()),
                Segment::LevelName => line.push_str(level_name(record.level())),
                Segment::Message => line.push_str(&record.args().to_string()),
                Segment::Module => line.push_str(record.module_path().unwrap_or("")),
                Segment::LineNo => {
                    if let Some(lineno) = record.line() {
                        line.push_str(&lineno.to_string());
                    }
                }
            }
        }
        line
    }
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARNING",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}
