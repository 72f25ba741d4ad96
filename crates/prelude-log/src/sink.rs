//! Records and the destinations they are written to.

use std::fmt::{self, Arguments};
use std::io::Write;
use std::sync::{Mutex, PoisonError};

use crate::level::Level;

/// Source position of a logging call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub file: &'static str,
    pub line: u32,
    /// `module_path!()` of the caller, standing in for the calling function.
    pub module: &'static str,
}

/// Expands to the [`Location`] of the call site.
#[macro_export]
macro_rules! here {
    () => {
        $crate::Location {
            file: file!(),
            line: line!(),
            module: module_path!(),
        }
    };
}

/// One message on its way to a [`Sink`].
///
/// Renders as `[LEVEL file:line module] message`, the level padded to five
/// columns.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub level: Level,
    pub location: Location,
    pub message: Arguments<'a>,
}

impl fmt::Display for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Location { file, line, module } = self.location;
        write!(f, "[{:<5} {file}:{line} {module}] {}", self.level, self.message)
    }
}

/// A destination for records that passed the level filter.
///
/// Sinks are shared by every thread that logs.
pub trait Sink: Send + Sync {
    fn write(&self, record: &Record<'_>);
}

/// Colored output on stdout. Used when no other sink is installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl Sink for ConsoleSink {
    fn write(&self, record: &Record<'_>) {
        const RESET: &str = "\x1b[0m";
        println!("{}{record}{RESET}", record.level.ansi_color());
    }
}

/// Plain text output to any [`std::io::Write`].
///
/// ```
/// use prelude_log::{Level, Record, Sink, WriterSink, here};
///
/// let sink = WriterSink::new(Vec::new());
/// sink.write(&Record {
///     level: Level::Warn,
///     location: here!(),
///     message: format_args!("pool {} exhausted", 7),
/// });
///
/// let text = String::from_utf8(sink.into_inner()).unwrap();
/// assert!(text.starts_with("[WARN  "));
/// assert!(text.ends_with("pool 7 exhausted\n"));
/// ```
#[derive(Debug)]
pub struct WriterSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Unwraps the writer, e.g. to inspect a `Vec<u8>` buffer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> Sink for WriterSink<W> {
    fn write(&self, record: &Record<'_>) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        // Write errors are dropped; logging never fails the caller.
        let _ = writeln!(writer, "{record}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_rendering() {
        let location = Location {
            file: "src/pool.rs",
            line: 118,
            module: "prelude_mem::pool",
        };
        let rendered = Record {
            level: Level::Warn,
            location,
            message: format_args!("{} of {} nodes free", 0, 8),
        }
        .to_string();
        assert_eq!(rendered, "[WARN  src/pool.rs:118 prelude_mem::pool] 0 of 8 nodes free");
    }

    #[test]
    fn test_here_points_at_this_module() {
        let location = here!();
        assert!(location.file.ends_with("sink.rs"));
        assert_eq!(location.module, "prelude_log::sink::tests");
    }

    #[test]
    fn test_writer_sink_is_uncolored() {
        let sink = WriterSink::new(Vec::new());
        for level in [Level::Error, Level::Debug] {
            sink.write(&Record {
                level,
                location: here!(),
                message: format_args!("line"),
            });
        }
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(!text.contains('\x1b'));
    }
}
