#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logbook` provides named, independently configured log [`Channel`]s and a
//! [`LogManager`] registry that owns them. Each channel writes records at
//! graded severity levels to an ordered list of handlers. A channel without
//! handlers builds a fallback handler the first time it emits, by default a
//! daily rotating file named after the channel, and caches it.
//!
//! # Design
//!
//! - Levels come from the [`logging`] crate: the RFC 5424 set plus
//!   `SUCCESS` (225). Custom levels are registered on a shared
//!   [`LevelTable`](logging::LevelTable) owned by the registry.
//! - Handlers come from the [`logging_sink`] crate and implement
//!   [`logging::Handler`].
//! - Fallback construction is a [`FallbackStrategy`] held by each channel;
//!   [`RotatingFileFallback`] reads the channel parameters described on
//!   [`FallbackDescriptor`].
//! - [`LogManager`] implements [`Log`] by forwarding to its default channel,
//!   which it creates lazily under the name [`DEFAULT_CHANNEL`].
//!
//! # Concurrency
//!
//! Channels and the registry are `Send + Sync`. The channel map sits behind
//! an `RwLock`; lazy creation of the default channel and installation of a
//! channel's fallback handlers each happen under a single lock so concurrent
//! first callers observe the same instances. Handlers serialise their own
//! writes.
//!
//! # Errors
//!
//! All fallible operations return [`Error`]. Handler failures abort dispatch
//! at the first failing handler.
//!
//! # Examples
//!
//! ```
//! use logbook::{Log, LogManager};
//! use logging::Context;
//! use serde_json::json;
//!
//! let dir = tempfile::tempdir()?;
//! let manager = LogManager::new();
//! manager.set_default_storage_path(dir.path());
//!
//! let params = json!({"rotate": 3}).as_object().cloned().unwrap_or_default();
//! let billing = manager.register_channel("billing", params);
//! billing.success("invoice paid", Context::new())?;
//! billing.flush()?;
//!
//! assert!(manager.has_channel("billing"));
//! assert_eq!(std::fs::read_dir(dir.path())?.count(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod channel;
mod config;
mod debug_trace;
mod error;
mod fallback;
mod handler_spec;
mod log;
mod manager;
mod params;
#[cfg(feature = "tracing")]
mod tracing_bridge;

pub use channel::Channel;
pub use config::{HANDLERS_PARAM, ManagerConfig};
pub use error::{BoxError, Error, Result};
pub use fallback::{
    DEFAULT_ROTATION, FallbackDescriptor, FallbackStrategy, RotatingFileFallback, resolve_filename,
};
pub use handler_spec::{FileSpec, HandlerSpec, LineSpec, NullSpec, StreamSpec, StreamTarget};
pub use log::Log;
pub use manager::{DEFAULT_CHANNEL, LogManager};
pub use params::ParamBag;
#[cfg(feature = "tracing")]
pub use tracing_bridge::{ChannelLayer, init_tracing, init_tracing_with_filter};
