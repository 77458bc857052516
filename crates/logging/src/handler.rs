//! crates/logging/src/handler.rs
//! The handler capability implemented by every log destination.

use std::io;
use std::sync::Arc;

use crate::levels::Level;
use crate::record::Record;

/// A destination that accepts log records.
///
/// Handlers are shared between a channel's installed list and its cache of
/// default handlers, so they are used through `&self` and must synchronise
/// their own writes.
pub trait Handler: Send + Sync {
    /// Reports whether a record of `level` would be handled.
    fn is_handling(&self, level: Level) -> bool;

    /// Formats and writes `record`.
    ///
    /// Records below the handler's level are accepted and dropped.
    fn handle(&self, record: &Record) -> io::Result<()>;

    /// Flushes buffered output.
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }

    /// Short name used in diagnostics.
    fn kind(&self) -> &'static str {
        "handler"
    }
}

/// Reference-counted handler as stored by channels.
pub type SharedHandler = Arc<dyn Handler>;
