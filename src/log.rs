//! src/log.rs
//!
//! The narrow emission interface shared by channels and the registry.

use logging::{Context, Level};
use serde_json::Value;

use crate::error::Result;

/// Emits records at graded severity levels.
///
/// Implemented by [`Channel`](crate::Channel), which writes to its handlers,
/// and by [`LogManager`](crate::LogManager), which forwards every call to its
/// default channel.
pub trait Log {
    /// Emits `message` at `level`.
    fn emit(&self, level: Level, message: &str, context: Context) -> Result<()>;

    /// Emits `message` at a level given as a name, numeric string or integer.
    ///
    /// Unknown names fail with [`Error::Level`](crate::Error::Level) before
    /// any handler runs.
    fn log(&self, level: &Value, message: &str, context: Context) -> Result<()>;

    /// Emits at [`Level::DEBUG`].
    fn debug(&self, message: &str, context: Context) -> Result<()> {
        self.emit(Level::DEBUG, message, context)
    }

    /// Emits at [`Level::INFO`].
    fn info(&self, message: &str, context: Context) -> Result<()> {
        self.emit(Level::INFO, message, context)
    }

    /// Emits at [`Level::SUCCESS`].
    fn success(&self, message: &str, context: Context) -> Result<()> {
        self.emit(Level::SUCCESS, message, context)
    }

    /// Emits at [`Level::NOTICE`].
    fn notice(&self, message: &str, context: Context) -> Result<()> {
        self.emit(Level::NOTICE, message, context)
    }

    /// Emits at [`Level::WARNING`].
    fn warning(&self, message: &str, context: Context) -> Result<()> {
        self.emit(Level::WARNING, message, context)
    }

    /// Emits at [`Level::ERROR`].
    fn error(&self, message: &str, context: Context) -> Result<()> {
        self.emit(Level::ERROR, message, context)
    }

    /// Emits at [`Level::CRITICAL`].
    fn critical(&self, message: &str, context: Context) -> Result<()> {
        self.emit(Level::CRITICAL, message, context)
    }

    /// Emits at [`Level::ALERT`].
    fn alert(&self, message: &str, context: Context) -> Result<()> {
        self.emit(Level::ALERT, message, context)
    }

    /// Emits at [`Level::EMERGENCY`].
    fn emergency(&self, message: &str, context: Context) -> Result<()> {
        self.emit(Level::EMERGENCY, message, context)
    }
}
