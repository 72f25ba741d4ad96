//! Leveled logging for the prelude crates.
//!
//! Records carry a [`Level`], a formatted message and the [`Location`] of
//! the call (file, line and module path). They go to a pluggable [`Sink`];
//! without one installed, lines are printed to stdout in color.
//!
//! The global logger starts at the level named by the `PRELUDE_LOG`
//! environment variable, or `Info`.
//!
//! ```
//! use prelude_log::{Level, debug, info, warn};
//!
//! prelude_log::set_level(Level::Debug);
//!
//! let capacity = 4096;
//! info!("arena created with {capacity} bytes");
//! debug!("free list: {:?}", [0, 32, 64]);
//! warn!("free_all is not supported here");
//! ```

pub mod level;
pub mod logger;
pub mod sink;

pub use level::{Level, ParseLevelError};
pub use logger::{
    DEFAULT_LEVEL, LEVEL_ENV_VAR, Logger, __log_at, get_logger, set_level, set_level_from_str,
    set_sink,
};
pub use sink::{ConsoleSink, Location, Record, Sink, WriterSink};

/// Logs at an explicit level.
///
/// ```
/// use prelude_log::{Level, log};
///
/// let level = Level::Info;
/// log!(level: level, "{} nodes linked", 64);
/// ```
#[macro_export]
macro_rules! log {
    (level: $level:expr, $($arg:tt)+) => {{
        let level: $crate::Level = $level;
        if $crate::get_logger().enabled(level) || level == $crate::Level::Fatal {
            $crate::__log_at(level, $crate::here!(), format_args!($($arg)+));
        }
    }};
}

/// Logs at [`Level::Fatal`] and panics.
///
/// ```should_panic
/// prelude_log::fatal!("backing buffer lost");
/// ```
#[macro_export]
macro_rules! fatal {
    ($($arg:tt)+) => {
        $crate::log!(level: $crate::Level::Fatal, $($arg)+)
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)+) => {
        $crate::log!(level: $crate::Level::Error, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)+) => {
        $crate::log!(level: $crate::Level::Warn, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => {
        $crate::log!(level: $crate::Level::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)+) => {
        $crate::log!(level: $crate::Level::Debug, $($arg)+)
    };
}

/// Logs at [`Level::Trace`]; the allocators use it for exhaustion.
#[macro_export]
macro_rules! trace {
    ($($arg:tt)+) => {
        $crate::log!(level: $crate::Level::Trace, $($arg)+)
    };
}
