//! Lifecycle tracing for channels and the registry.
//!
//! Events are emitted through `tracing` when the `tracing` feature is
//! enabled and compile to inline no-ops otherwise. The tracing bridge skips
//! these targets so forwarding events into a channel never feeds back into
//! the same channel.

/// Target for channel events.
#[cfg(feature = "tracing")]
pub(crate) const CHANNEL_TARGET: &str = "logbook::channel";

/// Target for registry events.
#[cfg(feature = "tracing")]
pub(crate) const MANAGER_TARGET: &str = "logbook::manager";

// ============================================================================
// Registry events
// ============================================================================

/// Traces a channel being stored in the registry.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn trace_channel_registered(name: &str) {
    tracing::debug!(target: MANAGER_TARGET, channel = %name, "channel_registered");
}

/// No-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn trace_channel_registered(_name: &str) {}

/// Traces the lazy creation of the default channel.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn trace_default_channel_created(name: &str) {
    tracing::debug!(target: MANAGER_TARGET, channel = %name, "default_channel_created");
}

/// No-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn trace_default_channel_created(_name: &str) {}

/// Traces a forwarded call that failed with an unrecognized error.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn trace_delegated_failure(operation: &str, error: &dyn std::error::Error) {
    tracing::warn!(
        target: MANAGER_TARGET,
        operation = %operation,
        error = %error,
        "delegated_failure"
    );
}

/// No-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn trace_delegated_failure(_operation: &str, _error: &dyn std::error::Error) {}

// ============================================================================
// Channel events
// ============================================================================

/// Traces a successful fallback handler construction.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn trace_fallback_built(channel: &str, kind: &str) {
    tracing::debug!(target: CHANNEL_TARGET, channel = %channel, handler = %kind, "fallback_built");
}

/// No-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn trace_fallback_built(_channel: &str, _kind: &str) {}

/// Traces a failed fallback handler construction.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn trace_fallback_failed(channel: &str, error: &dyn std::error::Error) {
    tracing::warn!(target: CHANNEL_TARGET, channel = %channel, error = %error, "fallback_failed");
}

/// No-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn trace_fallback_failed(_channel: &str, _error: &dyn std::error::Error) {}

/// Traces a handler refusing a record.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn trace_handler_failed(channel: &str, kind: &str, error: &std::io::Error) {
    tracing::warn!(
        target: CHANNEL_TARGET,
        channel = %channel,
        handler = %kind,
        error = %error,
        "handler_failed"
    );
}

/// No-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn trace_handler_failed(_channel: &str, _kind: &str, _error: &std::io::Error) {}
