//! The level filter and the process-wide instance.

use std::fmt::Arguments;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::level::{Level, ParseLevelError};
use crate::sink::{ConsoleSink, Location, Record, Sink};

/// Environment variable read for the starting level of the global logger.
pub const LEVEL_ENV_VAR: &str = "PRELUDE_LOG";

/// Level used when `PRELUDE_LOG` is unset or unparsable.
pub const DEFAULT_LEVEL: Level = Level::Info;

/// Filters records by level and forwards the rest to a sink.
///
/// Level changes are lock-free; swapping the sink takes a write lock.
pub struct Logger {
    max_level: AtomicU8,
    /// Installed sink; `None` routes to [`ConsoleSink`].
    sink: RwLock<Option<Arc<dyn Sink>>>,
}

impl Logger {
    #[must_use]
    pub const fn new(max_level: Level) -> Self {
        Self {
            max_level: AtomicU8::new(max_level as u8),
            sink: RwLock::new(None),
        }
    }

    /// Least severe level that is still emitted.
    pub fn level(&self) -> Level {
        Level::from_u8(self.max_level.load(Ordering::Relaxed)).unwrap_or(DEFAULT_LEVEL)
    }

    pub fn set_level(&self, level: Level) {
        self.max_level.store(level as u8, Ordering::Relaxed);
    }

    /// Whether a record at `level` would reach the sink.
    pub fn enabled(&self, level: Level) -> bool {
        level <= self.level()
    }

    pub fn set_sink(&self, sink: Arc<dyn Sink>) {
        *self.sink.write().unwrap_or_else(PoisonError::into_inner) = Some(sink);
    }

    /// Goes back to the console sink.
    pub fn reset_sink(&self) {
        *self.sink.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Emits `message` if `level` passes the filter.
    ///
    /// # Panics
    ///
    /// Always panics for [`Level::Fatal`], after the record is written.
    pub fn log(&self, level: Level, location: Location, message: Arguments<'_>) {
        if self.enabled(level) {
            let sink = self
                .sink
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            let record = Record {
                level,
                location,
                message,
            };
            match sink {
                Some(sink) => sink.write(&record),
                None => ConsoleSink.write(&record),
            }
        }

        if level == Level::Fatal {
            panic!("fatal error: {message}");
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL)
    }
}

static GLOBAL: OnceLock<Logger> = OnceLock::new();

/// The process-wide logger used by the macros.
///
/// Created on first use with the level from `PRELUDE_LOG`.
pub fn get_logger() -> &'static Logger {
    GLOBAL.get_or_init(|| {
        let level = std::env::var(LEVEL_ENV_VAR)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_LEVEL);
        Logger::new(level)
    })
}

/// Sets the level of the global logger.
///
/// ```
/// prelude_log::set_level(prelude_log::Level::Debug);
/// assert!(prelude_log::get_logger().enabled(prelude_log::Level::Debug));
/// ```
pub fn set_level(level: Level) {
    get_logger().set_level(level);
}

/// Parses `name` and sets the level of the global logger.
///
/// # Errors
///
/// Returns [`ParseLevelError`] and leaves the level unchanged if `name` is
/// not a level.
pub fn set_level_from_str(name: &str) -> Result<(), ParseLevelError> {
    set_level(name.parse()?);
    Ok(())
}

/// Installs `sink` on the global logger.
pub fn set_sink(sink: Arc<dyn Sink>) {
    get_logger().set_sink(sink);
}

#[doc(hidden)]
pub fn __log_at(level: Level, location: Location, message: Arguments<'_>) {
    get_logger().log(level, location, message);
}
