//! src/tracing_bridge.rs
//! Bridge between the tracing crate and logbook channels.
//!
//! [`ChannelLayer`] is a tracing-subscriber layer that turns every tracing
//! event into a record on a channel. It lets code instrumented with the
//! standard macros (`trace!`, `debug!`, `info!`, `warn!`, `error!`) write
//! through the channel's handlers.
//!
//! # Mapping
//!
//! | tracing         | logbook            |
//! |-----------------|--------------------|
//! | `TRACE`/`DEBUG` | [`Level::DEBUG`]   |
//! | `INFO`          | [`Level::INFO`]    |
//! | `WARN`          | [`Level::WARNING`] |
//! | `ERROR`         | [`Level::ERROR`]   |
//!
//! The `message` field becomes the record message; every other field is
//! stored in the record context. Events whose target starts with `logbook`
//! are ignored so the crate's own diagnostics never loop back into a channel.
//!
//! # Usage
//!
//! ```rust,ignore
//! use logbook::{LogManager, init_tracing};
//!
//! let manager = LogManager::new();
//! init_tracing(manager.get_default())?;
//!
//! tracing::info!(order = 42, "order shipped");
//! ```

use std::fmt;
use std::sync::Arc;

use logging::{Context as RecordContext, Level};
use serde_json::{Number, Value};
use tracing::Subscriber;
use tracing::field::{Field, Visit};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

use crate::channel::Channel;
use crate::log::Log;

const OWN_TARGET_PREFIX: &str = "logbook";

/// A tracing layer forwarding events to a channel.
pub struct ChannelLayer {
    channel: Arc<Channel>,
}

impl ChannelLayer {
    /// Creates a layer writing to `channel`.
    #[must_use]
    pub const fn new(channel: Arc<Channel>) -> Self {
        Self { channel }
    }

    /// The channel receiving events.
    #[must_use]
    pub const fn channel(&self) -> &Arc<Channel> {
        &self.channel
    }

    /// Map a tracing level to a channel level.
    const fn map_level(level: &tracing::Level) -> Level {
        match *level {
            tracing::Level::ERROR => Level::ERROR,
            tracing::Level::WARN => Level::WARNING,
            tracing::Level::INFO => Level::INFO,
            tracing::Level::DEBUG | tracing::Level::TRACE => Level::DEBUG,
        }
    }
}

impl<S> Layer<S> for ChannelLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if metadata.target().starts_with(OWN_TARGET_PREFIX) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let level = Self::map_level(metadata.level());
        let message = visitor.message.unwrap_or_default();
        if let Err(error) = self.channel.emit(level, &message, visitor.fields) {
            // A layer cannot report failures to the caller of the macro.
            eprintln!("logbook: failed to forward tracing event: {error}");
        }
    }
}

/// Collects the message and the structured fields of an event.
#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: RecordContext,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(text) => text,
                other => other.to_string(),
            });
        } else {
            self.fields.insert(field.name().to_owned(), value);
        }
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::String(value.to_owned()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::Bool(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Number::from_f64(value).map_or(Value::Null, Value::Number));
    }
}

/// Installs a global subscriber forwarding tracing events to `channel`.
///
/// Events are filtered by `RUST_LOG` when it is set, and at `info` and above
/// otherwise. Fails when a global subscriber is already installed.
pub fn init_tracing(channel: Arc<Channel>) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    init_tracing_with_filter(channel, filter)
}

/// Installs a global subscriber forwarding tracing events to `channel`
/// after `filter`.
///
/// # Example
///
/// ```rust,ignore
/// use logbook::{Channel, init_tracing_with_filter};
/// use tracing_subscriber::EnvFilter;
///
/// let channel = std::sync::Arc::new(Channel::new("app"));
/// init_tracing_with_filter(channel, EnvFilter::new("debug"))?;
/// ```
pub fn init_tracing_with_filter<F>(channel: Arc<Channel>, filter: F) -> Result<(), TryInitError>
where
    F: Layer<tracing_subscriber::Registry> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(filter)
        .with(ChannelLayer::new(channel))
        .try_init()
}
