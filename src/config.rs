//! Key/value settings for the queue and the log writer.
//!
//! Settings come from rc-file text or any iterator of pairs, and later
//! sources override earlier ones key by key. The rc-file syntax is one
//! `key = value` per line; blank lines and lines starting with `#` are
//! skipped, and only the first whitespace-delimited token after `=` is the
//! value, so `key = value # note` works.
//!
//! ```text
//! # gateway.rc
//! log.path  = /var/log/gateway
//! log.name  = access
//! log.app   = gateway
//! log.level = debug
//! queue.capacity = 4096
//! ```

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use crate::level::Level;
use crate::logger::{FlushInterval, RotatingLogWriter, RotatingLogWriterBuilder};
use crate::queue::{BoundedBlockingQueue, Capacity};

pub const LOG_PATH: &str = "log.path";
pub const LOG_NAME: &str = "log.name";
pub const LOG_APP: &str = "log.app";
pub const LOG_LEVEL: &str = "log.level";
pub const LOG_ECHO: &str = "log.echo";
pub const LOG_SEPARATOR: &str = "log.separator";
/// Seconds.
pub const LOG_FLUSH_INTERVAL: &str = "log.flush_interval";
/// Seconds.
pub const LOG_ROTATION_INTERVAL: &str = "log.rotation_interval";
/// Bytes.
pub const LOG_MAX_FILE_SIZE: &str = "log.max_file_size";
/// Positive integer or `unbounded`.
pub const QUEUE_CAPACITY: &str = "queue.capacity";

const COMMENT: char = '#';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("line {line}: expected `key = value`, got {text:?}")]
    Syntax { line: usize, text: String },
    #[error("missing required option `{0}`")]
    Missing(&'static str),
    #[error("invalid value {value:?} for `{key}`: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut settings = Self::new();
        settings.extend(pairs);
        settings
    }

    /// Parses rc-file text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut settings = Self::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(COMMENT) {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| ConfigError::Syntax {
                line: idx + 1,
                text: raw.to_owned(),
            })?;
            let key = key.trim();
            if key.is_empty() || key.contains(char::is_whitespace) {
                return Err(ConfigError::Syntax {
                    line: idx + 1,
                    text: raw.to_owned(),
                });
            }
            let value = value.split_whitespace().next().unwrap_or_default();
            settings.set(key, value);
        }
        Ok(settings)
    }

    /// Overrides keys with the given pairs.
    pub fn extend<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in pairs {
            self.set(key, value);
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// A writer builder from the `log.*` keys. `log.path`, `log.name` and
    /// `log.app` are required; the rest fall back to the writer defaults.
    pub fn log_writer(&self) -> Result<RotatingLogWriterBuilder, ConfigError> {
        let mut builder = RotatingLogWriter::builder(
            self.require(LOG_PATH)?,
            self.require(LOG_NAME)?,
            self.require(LOG_APP)?,
        );

        if let Some(level) = self.parsed::<Level>(LOG_LEVEL)? {
            builder = builder.with_threshold(level);
        }
        if let Some(echo) = self.get(LOG_ECHO) {
            builder = builder.with_echo(parse_bool(LOG_ECHO, echo)?);
        }
        if let Some(sep) = self.get(LOG_SEPARATOR) {
            let mut chars = sep.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => builder = builder.with_separator(c),
                _ => return Err(invalid(LOG_SEPARATOR, sep, "expected a single character")),
            }
        }
        if let Some(secs) = self.positive(LOG_FLUSH_INTERVAL)? {
            builder = builder.with_flush_interval(FlushInterval::new(Duration::from_secs(secs)));
        }
        if let Some(secs) = self.positive(LOG_ROTATION_INTERVAL)? {
            builder = builder.with_rotation_interval(Duration::from_secs(secs));
        }
        if let Some(bytes) = self.positive(LOG_MAX_FILE_SIZE)? {
            builder = builder.with_max_file_size(bytes);
        }
        Ok(builder)
    }

    pub fn queue_capacity(&self) -> Result<Capacity, ConfigError> {
        let value = self.require(QUEUE_CAPACITY)?;
        if value.eq_ignore_ascii_case("unbounded") {
            return Ok(Capacity::Unbounded);
        }
        match value.parse::<usize>() {
            Ok(n) => std::num::NonZeroUsize::new(n)
                .map(Capacity::Bounded)
                .ok_or_else(|| invalid(QUEUE_CAPACITY, value, "capacity must be positive")),
            Err(err) => Err(invalid(QUEUE_CAPACITY, value, err)),
        }
    }

    pub fn queue<T>(&self) -> Result<BoundedBlockingQueue<T>, ConfigError> {
        Ok(BoundedBlockingQueue::with_capacity(self.queue_capacity()?))
    }

    fn require(&self, key: &'static str) -> Result<&str, ConfigError> {
        match self.get(key) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(ConfigError::Missing(key)),
        }
    }

    fn parsed<T>(&self, key: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: ToString,
    {
        self.get(key)
            .map(|value| value.parse::<T>().map_err(|err| invalid(key, value, err)))
            .transpose()
    }

    fn positive(&self, key: &'static str) -> Result<Option<u64>, ConfigError> {
        match self.parsed::<u64>(key)? {
            Some(0) => Err(invalid(key, "0", "must be positive")),
            other => Ok(other),
        }
    }
}

impl FromStr for Settings {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value, "expected a boolean")),
    }
}

fn invalid(key: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_owned(),
        reason: reason.to_string(),
    }
}
