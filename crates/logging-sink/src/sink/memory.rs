use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use logging::{Handler, Level, Record};

/// Handler that keeps records in memory.
///
/// Clones share the same buffer, so a test can keep one clone and install
/// the other on a channel.
#[derive(Clone, Debug, Default)]
pub struct MemoryHandler {
    records: Arc<Mutex<Vec<Record>>>,
    level: Level,
}

impl MemoryHandler {
    /// Creates an empty handler accepting records at or above `level`.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self {
            records: Arc::default(),
            level,
        }
    }

    /// Snapshot of the captured records in arrival order.
    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        self.lock().clone()
    }

    /// Captured messages in arrival order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.lock().iter().map(|record| record.message.clone()).collect()
    }

    /// Number of captured records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Reports whether nothing has been captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops every captured record.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Record>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Handler for MemoryHandler {
    fn is_handling(&self, level: Level) -> bool {
        level >= self.level
    }

    fn handle(&self, record: &Record) -> io::Result<()> {
        if self.is_handling(record.level) {
            self.lock().push(record.clone());
        }
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}
