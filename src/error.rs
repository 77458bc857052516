//! src/error.rs
//!
//! Error types for channels and the channel registry.

use std::io;

use logging::LevelError;
use thiserror::Error;

/// Boxed error returned by fallback strategies and handler construction.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for channel and registry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by channels and the channel registry.
#[derive(Debug, Error)]
pub enum Error {
    /// A level could not be resolved or registered.
    #[error(transparent)]
    Level(#[from] LevelError),
    /// No channel is registered under the requested name.
    #[error("log channel [{name}] unresolvable")]
    ChannelNotFound {
        /// Requested channel name.
        name: String,
    },
    /// The fallback handler of a channel could not be built.
    #[error("default handler of log channel [{channel}] could not be built: {source}")]
    HandlerConstructionFailed {
        /// Channel whose fallback failed.
        channel: String,
        /// Underlying failure.
        #[source]
        source: BoxError,
    },
    /// A configured handler description does not name a known handler.
    #[error("log channel [{channel}] has an invalid default handler: {found}")]
    InvalidHandlerType {
        /// Channel being configured.
        channel: String,
        /// The offending handler description.
        found: String,
    },
    /// A handler failed to accept a record.
    #[error("log channel [{channel}] handler failed: {source}")]
    Handler {
        /// Emitting channel.
        channel: String,
        /// Write failure reported by the handler.
        #[source]
        source: io::Error,
    },
    /// The registry configuration could not be parsed.
    #[error("invalid log configuration: {0}")]
    Config(
        #[from]
        #[source]
        serde_json::Error,
    ),
    /// A call forwarded to the default channel failed unexpectedly.
    #[error("default log channel call [{operation}] failed: {source}")]
    DelegatedOperationFailed {
        /// Name of the forwarded operation.
        operation: &'static str,
        /// The original failure.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Reports whether the error is one of the configuration or lookup kinds
    /// that the registry forwards unchanged.
    ///
    /// Only handler write failures are unrecognized; the registry wraps them
    /// into [`Error::DelegatedOperationFailed`].
    #[must_use]
    pub const fn is_recognized(&self) -> bool {
        !matches!(self, Self::Handler { .. })
    }

    /// Name of the channel involved, when the error concerns one.
    #[must_use]
    pub fn channel(&self) -> Option<&str> {
        match self {
            Self::ChannelNotFound { name } => Some(name.as_str()),
            Self::HandlerConstructionFailed { channel, .. }
            | Self::InvalidHandlerType { channel, .. }
            | Self::Handler { channel, .. } => Some(channel.as_str()),
            Self::DelegatedOperationFailed { source, .. } => source.channel(),
            Self::Level(_) | Self::Config(_) => None,
        }
    }
}
