use std::fmt;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use logging::{Handler, Level, Record};

use crate::formatter::{Formatter, LineFormatter};
use crate::line_mode::LineMode;

/// Handler that writes formatted records to an [`io::Write`] implementor.
///
/// The writer sits behind a mutex so one handler can be shared by several
/// channels and threads. Records below the handler's minimum level are
/// dropped.
///
/// # Examples
///
/// ```
/// use logging::{Context, Handler, Level, Record};
/// use logging_sink::{LineFormatter, StreamHandler};
///
/// let handler = StreamHandler::new(Vec::new(), Level::INFO)
///     .with_formatter(LineFormatter::with_formats(Some("%level_name%: %message%"), None)?);
///
/// handler.handle(&Record::new("app", Level::DEBUG, "DEBUG", "hidden", Context::new()))?;
/// handler.handle(&Record::new("app", Level::ERROR, "ERROR", "shown", Context::new()))?;
///
/// assert_eq!(handler.into_inner(), b"ERROR: shown\n");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct StreamHandler<W> {
    writer: Mutex<W>,
    level: Level,
    formatter: Box<dyn Formatter>,
    line_mode: LineMode,
}

impl<W> StreamHandler<W> {
    /// Creates a handler writing to `writer` with the default line formatter.
    pub fn new(writer: W, level: Level) -> Self {
        Self {
            writer: Mutex::new(writer),
            level,
            formatter: Box::new(LineFormatter::new()),
            line_mode: LineMode::default(),
        }
    }

    /// Replaces the formatter.
    #[must_use]
    pub fn with_formatter(mut self, formatter: impl Formatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    /// Replaces the line mode.
    #[must_use]
    pub fn with_line_mode(mut self, line_mode: LineMode) -> Self {
        self.line_mode = line_mode;
        self
    }

    /// Minimum level handled.
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }

    /// Current line mode.
    #[must_use]
    pub const fn line_mode(&self) -> LineMode {
        self.line_mode
    }

    /// Consumes the handler and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl StreamHandler<io::Stderr> {
    /// Handler writing to the process's standard error.
    #[must_use]
    pub fn stderr(level: Level) -> Self {
        Self::new(io::stderr(), level)
    }
}

impl StreamHandler<io::Stdout> {
    /// Handler writing to the process's standard output.
    #[must_use]
    pub fn stdout(level: Level) -> Self {
        Self::new(io::stdout(), level)
    }
}

impl<W> Handler for StreamHandler<W>
where
    W: Write + Send,
{
    fn is_handling(&self, level: Level) -> bool {
        level >= self.level
    }

    fn handle(&self, record: &Record) -> io::Result<()> {
        if !self.is_handling(record.level) {
            return Ok(());
        }

        let mut line = self.formatter.format(record);
        self.line_mode.terminate(&mut line);

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(line.as_bytes())
    }

    fn flush(&self) -> io::Result<()> {
        self.writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()
    }

    fn kind(&self) -> &'static str {
        "stream"
    }
}

impl<W> fmt::Debug for StreamHandler<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandler")
            .field("level", &self.level)
            .field("line_mode", &self.line_mode)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logging::Context;

    fn record(level: Level, name: &str, message: &str) -> Record {
        Record::new("test", level, name, message, Context::new())
    }

    fn plain() -> LineFormatter {
        LineFormatter::with_formats(Some("%channel%.%level_name% %message%"), None).unwrap()
    }

    #[test]
    fn writes_records_at_or_above_level() {
        let handler = StreamHandler::new(Vec::new(), Level::WARNING).with_formatter(plain());
        handler.handle(&record(Level::INFO, "INFO", "quiet")).unwrap();
        handler.handle(&record(Level::WARNING, "WARNING", "loud")).unwrap();
        handler.handle(&record(Level::ALERT, "ALERT", "louder")).unwrap();

        let output = String::from_utf8(handler.into_inner()).unwrap();
        assert_eq!(output, "test.WARNING loud\ntest.ALERT louder\n");
    }

    #[test]
    fn without_newline_mode_concatenates() {
        let handler = StreamHandler::new(Vec::new(), Level::DEBUG)
            .with_formatter(plain())
            .with_line_mode(LineMode::WithoutNewline);
        handler.handle(&record(Level::INFO, "INFO", "a")).unwrap();
        handler.handle(&record(Level::INFO, "INFO", "b")).unwrap();

        assert_eq!(handler.into_inner(), b"test.INFO atest.INFO b");
    }

    #[test]
    fn is_handling_compares_against_minimum() {
        let handler = StreamHandler::new(Vec::new(), Level::SUCCESS);
        assert!(!handler.is_handling(Level::INFO));
        assert!(handler.is_handling(Level::SUCCESS));
        assert!(handler.is_handling(Level::NOTICE));
        assert_eq!(handler.kind(), "stream");
    }

    #[test]
    fn write_errors_are_returned() {
        struct Broken;

        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::other("disk on fire"))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let handler = StreamHandler::new(Broken, Level::DEBUG);
        let error = handler.handle(&record(Level::ERROR, "ERROR", "x")).unwrap_err();
        assert_eq!(error.to_string(), "disk on fire");
    }
}
