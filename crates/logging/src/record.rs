//! crates/logging/src/record.rs
//! Log records handed to handlers.

use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::levels::Level;
use crate::timezone;

/// Structured key/value data attached to a record.
pub type Context = Map<String, Value>;

/// A single log record.
///
/// Records are built by a channel at emission time and passed by reference
/// to each of its handlers in turn.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// Moment the record was created, in the process timezone.
    pub datetime: OffsetDateTime,
    /// Name of the emitting channel.
    pub channel: String,
    /// Severity of the record.
    pub level: Level,
    /// Name of the level as known to the emitting channel.
    pub level_name: String,
    /// The log message.
    pub message: String,
    /// Caller supplied context.
    pub context: Context,
    /// Data added by processors or bridges.
    pub extra: Context,
}

impl Record {
    /// Creates a record stamped with the current time.
    pub fn new(
        channel: impl Into<String>,
        level: Level,
        level_name: impl Into<String>,
        message: impl Into<String>,
        context: Context,
    ) -> Self {
        Self {
            datetime: timezone::now(),
            channel: channel.into(),
            level,
            level_name: level_name.into(),
            message: message.into(),
            context,
            extra: Context::new(),
        }
    }

    /// Replaces the timestamp.
    #[must_use]
    pub fn with_datetime(mut self, datetime: OffsetDateTime) -> Self {
        self.datetime = datetime;
        self
    }

    /// Replaces the extra data.
    #[must_use]
    pub fn with_extra(mut self, extra: Context) -> Self {
        self.extra = extra;
        self
    }
}
