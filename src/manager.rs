//! src/manager.rs
//!
//! The channel registry.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use logging::{Context, Level, LevelTable};
use serde_json::{Map, Value};

use crate::channel::Channel;
use crate::config::{HANDLERS_PARAM, ManagerConfig};
use crate::debug_trace::{
    trace_channel_registered, trace_default_channel_created, trace_delegated_failure,
};
use crate::error::{Error, Result};
use crate::log::Log;

/// Name of the lazily created default channel.
pub const DEFAULT_CHANNEL: &str = "default";

/// Registry of named channels with a lazily created default channel.
///
/// The registry is always held in an [`Arc`]; channels it registers keep a
/// weak reference back to it to look up the default storage path. Every
/// channel registered here shares the registry's [`LevelTable`].
///
/// The registry also implements [`Log`] by forwarding each call to
/// [`get_default`](Self::get_default).
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use logbook::{Log, LogManager};
/// use logging::{Context, Level};
/// use logging_sink::MemoryHandler;
///
/// let manager = LogManager::new();
/// let memory = MemoryHandler::new(Level::DEBUG);
/// manager.get_default().push_handler(Arc::new(memory.clone()));
///
/// manager.info("ready", Context::new())?;
/// assert_eq!(memory.messages(), vec!["ready".to_owned()]);
/// assert!(Arc::ptr_eq(&manager.channel(None)?, &manager.get_default()));
/// # Ok::<(), logbook::Error>(())
/// ```
pub struct LogManager {
    this: Weak<Self>,
    channels: RwLock<HashMap<String, Arc<Channel>>>,
    // Lock order: `default` before `channels`.
    default: Mutex<Option<Arc<Channel>>>,
    default_storage_path: RwLock<Option<PathBuf>>,
    levels: Arc<LevelTable>,
}

impl LogManager {
    /// Creates an empty registry with the base level table.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Self::with_levels(Arc::new(LevelTable::new()))
    }

    /// Creates an empty registry sharing `levels` with its channels.
    #[must_use]
    pub fn with_levels(levels: Arc<LevelTable>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            channels: RwLock::new(HashMap::new()),
            default: Mutex::new(None),
            default_storage_path: RwLock::new(None),
            levels,
        })
    }

    /// Creates a registry from configuration.
    ///
    /// Custom levels are registered first, then the storage path is set,
    /// then channels are registered, and finally the default channel is
    /// selected. Without a `default` key, a configured channel named
    /// [`DEFAULT_CHANNEL`] becomes the default.
    pub fn from_config(config: ManagerConfig) -> Result<Arc<Self>> {
        let manager = Self::new();

        for (name, value) in &config.levels {
            manager.levels.register(name, *value)?;
        }

        if let Some(path) = config.default_storage_path {
            manager.set_default_storage_path(path);
        }

        for (name, mut params) in config.channels {
            let handlers = params.remove(HANDLERS_PARAM);
            let channel = manager.register_channel(&name, params);
            match handlers {
                Some(Value::Array(specs)) => channel.set_default_handlers_from_config(&specs)?,
                Some(Value::Null) | None => {}
                Some(other) => {
                    return Err(Error::InvalidHandlerType {
                        channel: name,
                        found: other.to_string(),
                    });
                }
            }
        }

        // A configured "default" channel is the default unless another is named.
        let default = config
            .default
            .as_deref()
            .or_else(|| manager.has_channel(DEFAULT_CHANNEL).then_some(DEFAULT_CHANNEL));
        if let Some(name) = default {
            let channel = manager.channel(Some(name))?;
            manager.set_default(channel);
        }

        Ok(manager)
    }

    /// Parses a JSON configuration and builds a registry from it.
    pub fn from_json_str(text: &str) -> Result<Arc<Self>> {
        Self::from_config(ManagerConfig::from_json_str(text)?)
    }

    /// The level table shared with registered channels.
    #[must_use]
    pub const fn levels(&self) -> &Arc<LevelTable> {
        &self.levels
    }

    /// Registers a custom level on the shared table.
    pub fn register_level(&self, name: &str, value: u32) -> Result<Level> {
        Ok(self.levels.register(name, value)?)
    }

    // ------------------------------------------------------------------------
    // Channels
    // ------------------------------------------------------------------------

    /// Creates a channel named `name`, points it at this registry, merges
    /// `params` into it and stores it, replacing any channel of that name.
    pub fn register_channel(&self, name: &str, params: Map<String, Value>) -> Arc<Channel> {
        let channel = Channel::with_levels(name, Arc::clone(&self.levels));
        channel.attach(self.this.clone());
        channel.set_params(params);

        let channel = Arc::new(channel);
        self.add_channel(Arc::clone(&channel));
        channel
    }

    /// Stores a pre-built channel under its own name, replacing any channel
    /// of that name.
    pub fn add_channel(&self, channel: Arc<Channel>) {
        trace_channel_registered(channel.name());
        self.channels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(channel.name().to_owned(), channel);
    }

    /// Returns the channel named `name`, or the default channel for `None`.
    pub fn channel(&self, name: Option<&str>) -> Result<Arc<Channel>> {
        let Some(name) = name else {
            return Ok(self.get_default());
        };

        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ChannelNotFound {
                name: name.to_owned(),
            })
    }

    /// Returns the default channel, registering a channel named
    /// [`DEFAULT_CHANNEL`] on first use.
    ///
    /// Every call returns the same instance until
    /// [`set_default`](Self::set_default) replaces it.
    pub fn get_default(&self) -> Arc<Channel> {
        let mut default = self.default.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(channel) = default.as_ref() {
            return Arc::clone(channel);
        }

        let channel = self.register_channel(DEFAULT_CHANNEL, Map::new());
        trace_default_channel_created(channel.name());
        *default = Some(Arc::clone(&channel));
        channel
    }

    /// Replaces the default channel and stores it under its name.
    pub fn set_default(&self, channel: Arc<Channel>) {
        let mut default = self.default.lock().unwrap_or_else(PoisonError::into_inner);
        self.add_channel(Arc::clone(&channel));
        *default = Some(channel);
    }

    /// Reports whether a channel named `name` is registered.
    #[must_use]
    pub fn has_channel(&self, name: &str) -> bool {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Names of the registered channels, sorted.
    #[must_use]
    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort_unstable();
        names
    }

    // ------------------------------------------------------------------------
    // Storage path
    // ------------------------------------------------------------------------

    /// Directory used for channel log files without an explicit filename.
    #[must_use]
    pub fn default_storage_path(&self) -> Option<PathBuf> {
        self.default_storage_path
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Sets the directory used for channel log files.
    ///
    /// Channels that already built their fallback handler keep their file.
    pub fn set_default_storage_path(&self, path: impl Into<PathBuf>) {
        *self
            .default_storage_path
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(path.into());
    }

    // ------------------------------------------------------------------------
    // Delegation
    // ------------------------------------------------------------------------

    /// Flushes the handlers of the default channel.
    pub fn flush(&self) -> Result<()> {
        self.delegate("flush", Channel::flush)
    }

    fn delegate<T>(
        &self,
        operation: &'static str,
        call: impl FnOnce(&Channel) -> Result<T>,
    ) -> Result<T> {
        let channel = self.get_default();
        call(&channel).map_err(|error| {
            if error.is_recognized() {
                error
            } else {
                trace_delegated_failure(operation, &error);
                Error::DelegatedOperationFailed {
                    operation,
                    source: Box::new(error),
                }
            }
        })
    }
}

impl Log for LogManager {
    fn emit(&self, level: Level, message: &str, context: Context) -> Result<()> {
        self.delegate("emit", |channel| channel.emit(level, message, context))
    }

    fn log(&self, level: &Value, message: &str, context: Context) -> Result<()> {
        self.delegate("log", |channel| channel.log(level, message, context))
    }

    fn debug(&self, message: &str, context: Context) -> Result<()> {
        self.delegate("debug", |channel| channel.debug(message, context))
    }

    fn info(&self, message: &str, context: Context) -> Result<()> {
        self.delegate("info", |channel| channel.info(message, context))
    }

    fn success(&self, message: &str, context: Context) -> Result<()> {
        self.delegate("success", |channel| channel.success(message, context))
    }

    fn notice(&self, message: &str, context: Context) -> Result<()> {
        self.delegate("notice", |channel| channel.notice(message, context))
    }

    fn warning(&self, message: &str, context: Context) -> Result<()> {
        self.delegate("warning", |channel| channel.warning(message, context))
    }

    fn error(&self, message: &str, context: Context) -> Result<()> {
        self.delegate("error", |channel| channel.error(message, context))
    }

    fn critical(&self, message: &str, context: Context) -> Result<()> {
        self.delegate("critical", |channel| channel.critical(message, context))
    }

    fn alert(&self, message: &str, context: Context) -> Result<()> {
        self.delegate("alert", |channel| channel.alert(message, context))
    }

    fn emergency(&self, message: &str, context: Context) -> Result<()> {
        self.delegate("emergency", |channel| channel.emergency(message, context))
    }
}

impl fmt::Debug for LogManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogManager")
            .field("channels", &self.channel_names())
            .field("default_storage_path", &self.default_storage_path())
            .finish_non_exhaustive()
    }
}
