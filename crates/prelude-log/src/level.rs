//! Severity levels.

use std::fmt;
use std::str::FromStr;

/// Names indexed by `Level as usize`.
const NAMES: [&str; 6] = ["FATAL", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"];

/// How important a record is.
///
/// Lower values are more severe; a logger set to some level emits that level
/// and everything more severe than it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    /// Unrecoverable; the logging call panics after emitting the record.
    Fatal = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    /// Per-operation detail such as allocator exhaustion.
    Trace = 5,
}

impl Level {
    /// Every level, most severe first.
    pub const ALL: [Level; 6] = [
        Level::Fatal,
        Level::Error,
        Level::Warn,
        Level::Info,
        Level::Debug,
        Level::Trace,
    ];

    /// Upper-case name, as printed in records.
    #[must_use]
    pub const fn name(self) -> &'static str {
        NAMES[self as usize]
    }

    pub(crate) const fn from_u8(value: u8) -> Option<Self> {
        if (value as usize) < Self::ALL.len() {
            Some(Self::ALL[value as usize])
        } else {
            None
        }
    }

    /// Terminal color escape used by the console sink.
    pub(crate) const fn ansi_color(self) -> &'static str {
        match self {
            Level::Fatal => "\x1b[1;31m",
            Level::Error => "\x1b[31m",
            Level::Warn => "\x1b[33m",
            Level::Info => "\x1b[32m",
            Level::Debug => "\x1b[36m",
            Level::Trace => "\x1b[35m",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Returned when a string names no [`Level`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLevelError {
    input: String,
}

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown log level {:?}, expected one of fatal, error, warn, info, debug, trace",
            self.input
        )
    }
}

impl std::error::Error for ParseLevelError {}

impl FromStr for Level {
    type Err = ParseLevelError;

    /// Case-insensitive; surrounding whitespace is ignored.
    ///
    /// ```
    /// use prelude_log::Level;
    ///
    /// assert_eq!("warn".parse(), Ok(Level::Warn));
    /// assert_eq!(" TRACE ".parse(), Ok(Level::Trace));
    /// assert!("loud".parse::<Level>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Level::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseLevelError {
                input: s.to_owned(),
            })
    }
}
