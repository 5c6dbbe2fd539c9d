use std::fmt;
use std::str::FromStr;

/// Ordered record severity. `Off` is the most restrictive threshold, `All` the
/// most permissive; a record is kept when `level <= threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Level {
    Off = 0,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    All,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid level name -- {0}")]
pub struct ParseLevelError(pub String);

impl Level {
    pub const NAMES: [&'static str; 6] = ["OFF", "ERROR", "WARN", "INFO", "DEBUG", "ALL"];

    /// The literal name written into log lines.
    pub const fn as_str(self) -> &'static str {
        Self::NAMES[self as usize]
    }

    /// Whether a record at `self` passes `threshold`.
    #[inline(always)]
    pub fn passes(self, threshold: Level) -> bool {
        self != Level::Off && self <= threshold
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ParseLevelError;

    /// Case-insensitive match on the level names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const LEVELS: [Level; 6] = [
            Level::Off,
            Level::Error,
            Level::Warn,
            Level::Info,
            Level::Debug,
            Level::All,
        ];
        LEVELS
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseLevelError(s.to_owned()))
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Level::Error,
            log::Level::Warn => Level::Warn,
            log::Level::Info => Level::Info,
            log::Level::Debug => Level::Debug,
            log::Level::Trace => Level::All,
        }
    }
}

impl From<Level> for log::LevelFilter {
    fn from(level: Level) -> Self {
        match level {
            Level::Off => log::LevelFilter::Off,
            Level::Error => log::LevelFilter::Error,
            Level::Warn => log::LevelFilter::Warn,
            Level::Info => log::LevelFilter::Info,
            Level::Debug => log::LevelFilter::Debug,
            Level::All => log::LevelFilter::Trace,
        }
    }
}
