use std::io;

use logging::{Handler, Level, Record};

/// Handler that swallows records at or above its level.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullHandler {
    level: Level,
}

impl NullHandler {
    /// Creates a handler discarding records at or above `level`.
    #[must_use]
    pub const fn new(level: Level) -> Self {
        Self { level }
    }
}

impl Handler for NullHandler {
    fn is_handling(&self, level: Level) -> bool {
        level >= self.level
    }

    fn handle(&self, _record: &Record) -> io::Result<()> {
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "null"
    }
}
