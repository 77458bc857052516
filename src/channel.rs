//! src/channel.rs
//!
//! Named log channels.

use std::fmt;
use std::path::PathBuf;
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak,
};

use logging::{Context, Level, LevelTable, Record, SharedHandler};
use serde_json::{Map, Value};

use crate::debug_trace::{trace_fallback_built, trace_fallback_failed, trace_handler_failed};
use crate::error::{Error, Result};
use crate::fallback::{FallbackStrategy, RotatingFileFallback};
use crate::handler_spec::HandlerSpec;
use crate::log::Log;
use crate::manager::LogManager;
use crate::params::ParamBag;

/// A named logger with its own handlers and parameters.
///
/// Records are dispatched to the installed handlers in insertion order. A
/// channel that has no handler when it first emits builds its default
/// handlers, caches them and installs them. Unless explicit default handlers
/// were configured, the default is a single handler produced by the
/// channel's [`FallbackStrategy`], a daily rotating file by default.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use logbook::{Channel, Log};
/// use logging::{Context, Level};
/// use logging_sink::MemoryHandler;
///
/// let channel = Channel::new("payments");
/// let memory = MemoryHandler::new(Level::INFO);
/// channel.push_handler(Arc::new(memory.clone()));
///
/// channel.success("captured", Context::new())?;
/// channel.debug("too quiet", Context::new())?;
///
/// let records = memory.records();
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].level_name, "SUCCESS");
/// # Ok::<(), logbook::Error>(())
/// ```
pub struct Channel {
    name: String,
    levels: Arc<LevelTable>,
    handlers: RwLock<Vec<SharedHandler>>,
    default_handlers: Mutex<Vec<SharedHandler>>,
    fallback: RwLock<Option<Arc<dyn FallbackStrategy>>>,
    params: RwLock<ParamBag>,
    manager: RwLock<Weak<LogManager>>,
}

impl Channel {
    /// Creates a channel with its own level table.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_levels(name, Arc::new(LevelTable::new()))
    }

    /// Creates a channel resolving level names through `levels`.
    #[must_use]
    pub fn with_levels(name: impl Into<String>, levels: Arc<LevelTable>) -> Self {
        Self {
            name: name.into(),
            levels,
            handlers: RwLock::new(Vec::new()),
            default_handlers: Mutex::new(Vec::new()),
            fallback: RwLock::new(None),
            params: RwLock::new(ParamBag::new()),
            manager: RwLock::new(Weak::new()),
        }
    }

    /// The channel name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The level table used to resolve level names.
    #[must_use]
    pub const fn levels(&self) -> &Arc<LevelTable> {
        &self.levels
    }

    // ------------------------------------------------------------------------
    // Registry back-reference
    // ------------------------------------------------------------------------

    /// Points the channel at `manager` for default storage path lookups.
    ///
    /// The reference does not keep the registry alive. Setting it again only
    /// affects fallback construction that has not happened yet.
    pub fn set_log_manager(&self, manager: &Arc<LogManager>) {
        self.attach(Arc::downgrade(manager));
    }

    pub(crate) fn attach(&self, manager: Weak<LogManager>) {
        *self.manager.write().unwrap_or_else(PoisonError::into_inner) = manager;
    }

    /// The registry the channel belongs to, if it is still alive.
    #[must_use]
    pub fn log_manager(&self) -> Option<Arc<LogManager>> {
        self.manager
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .upgrade()
    }

    /// Default storage path of the owning registry.
    #[must_use]
    pub fn default_storage_path(&self) -> Option<PathBuf> {
        self.log_manager()
            .and_then(|manager| manager.default_storage_path())
    }

    // ------------------------------------------------------------------------
    // Parameters
    // ------------------------------------------------------------------------

    /// Merges `params` into the parameter bag; incoming keys win.
    pub fn set_params(&self, params: Map<String, Value>) {
        self.params
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .merge(params);
    }

    /// Stores a single parameter.
    pub fn set_param(&self, key: impl Into<String>, value: Value) {
        self.params
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set(key, value);
    }

    /// Reads a parameter, returning `default` when it is absent.
    #[must_use]
    pub fn params(&self, key: &str, default: Value) -> Value {
        self.read_params().get_or(key, default)
    }

    /// Reads a parameter.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<Value> {
        self.read_params().get(key).cloned()
    }

    /// Snapshot of every parameter.
    #[must_use]
    pub fn all_params(&self) -> ParamBag {
        self.read_params().clone()
    }

    pub(crate) fn truthy_param(&self, key: &str) -> Option<Value> {
        self.read_params().truthy(key).cloned()
    }

    pub(crate) fn param_str(&self, key: &str) -> Option<String> {
        self.read_params().non_empty_str(key).map(str::to_owned)
    }

    fn read_params(&self) -> RwLockReadGuard<'_, ParamBag> {
        self.params.read().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------------
    // Handlers
    // ------------------------------------------------------------------------

    /// Appends a handler; it runs after those already installed.
    pub fn push_handler(&self, handler: SharedHandler) {
        self.write_handlers().push(handler);
    }

    /// Removes and returns the most recently installed handler.
    pub fn pop_handler(&self) -> Option<SharedHandler> {
        self.write_handlers().pop()
    }

    /// Replaces every installed handler.
    pub fn set_handlers(&self, handlers: Vec<SharedHandler>) {
        *self.write_handlers() = handlers;
    }

    /// Snapshot of the installed handlers in invocation order.
    #[must_use]
    pub fn handlers(&self) -> Vec<SharedHandler> {
        self.read_handlers().clone()
    }

    /// Replaces the cached default handlers.
    ///
    /// A non-empty list is installed instead of the fallback the next time
    /// the channel emits without handlers.
    pub fn set_default_handlers(&self, handlers: Vec<SharedHandler>) {
        *self.lock_defaults() = handlers;
    }

    /// Builds the cached default handlers from configuration descriptions.
    ///
    /// Every description must be an object with a known `type`; otherwise
    /// nothing is replaced and [`Error::InvalidHandlerType`] is returned.
    pub fn set_default_handlers_from_config(&self, specs: &[Value]) -> Result<()> {
        let storage_path = self.default_storage_path();
        let handlers = specs
            .iter()
            .map(|value| {
                HandlerSpec::parse(&self.name, value)?.build(
                    &self.name,
                    &self.levels,
                    storage_path.as_deref(),
                )
            })
            .collect::<Result<Vec<_>>>()?;

        self.set_default_handlers(handlers);
        Ok(())
    }

    /// Snapshot of the cached default handlers.
    #[must_use]
    pub fn default_handlers(&self) -> Vec<SharedHandler> {
        self.lock_defaults().clone()
    }

    /// Replaces the strategy used to build the fallback handler.
    pub fn set_fallback(&self, strategy: impl FallbackStrategy + 'static) {
        *self.fallback.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(strategy));
    }

    /// Builds the default handlers if none are cached, then appends them to
    /// the installed handlers.
    pub fn register_default_handlers(&self) -> Result<()> {
        let mut handlers = self.write_handlers();
        let defaults = self.cached_default_handlers()?;
        handlers.extend(defaults);
        Ok(())
    }

    /// Flushes every installed handler, stopping at the first failure.
    pub fn flush(&self) -> Result<()> {
        for handler in self.handlers() {
            handler.flush().map_err(|source| self.handler_error(handler.kind(), source))?;
        }
        Ok(())
    }

    fn ensure_handlers(&self) -> Result<()> {
        if !self.read_handlers().is_empty() {
            return Ok(());
        }

        let mut handlers = self.write_handlers();
        if handlers.is_empty() {
            let defaults = self.cached_default_handlers()?;
            handlers.extend(defaults);
        }
        Ok(())
    }

    /// Returns the cached default handlers, building the fallback first when
    /// the cache is empty. Failures are not cached.
    fn cached_default_handlers(&self) -> Result<Vec<SharedHandler>> {
        let mut defaults = self.lock_defaults();
        if defaults.is_empty() {
            let strategy = self
                .fallback
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            let built = match strategy {
                Some(strategy) => strategy.build(self),
                None => RotatingFileFallback.build(self),
            };

            match built {
                Ok(handler) => {
                    trace_fallback_built(&self.name, handler.kind());
                    defaults.push(handler);
                }
                Err(source) => {
                    trace_fallback_failed(&self.name, source.as_ref());
                    return Err(Error::HandlerConstructionFailed {
                        channel: self.name.clone(),
                        source,
                    });
                }
            }
        }
        Ok(defaults.clone())
    }

    fn handler_error(&self, kind: &str, source: std::io::Error) -> Error {
        trace_handler_failed(&self.name, kind, &source);
        Error::Handler {
            channel: self.name.clone(),
            source,
        }
    }

    fn read_handlers(&self) -> RwLockReadGuard<'_, Vec<SharedHandler>> {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_handlers(&self) -> RwLockWriteGuard<'_, Vec<SharedHandler>> {
        self.handlers.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_defaults(&self) -> MutexGuard<'_, Vec<SharedHandler>> {
        self.default_handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Log for Channel {
    fn emit(&self, level: Level, message: &str, context: Context) -> Result<()> {
        self.ensure_handlers()?;

        let handlers = self.handlers();
        if !handlers.iter().any(|handler| handler.is_handling(level)) {
            return Ok(());
        }

        let record = Record::new(
            self.name.as_str(),
            level,
            self.levels.display_name(level),
            message,
            context,
        );
        for handler in handlers.iter().filter(|handler| handler.is_handling(level)) {
            handler
                .handle(&record)
                .map_err(|source| self.handler_error(handler.kind(), source))?;
        }
        Ok(())
    }

    fn log(&self, level: &Value, message: &str, context: Context) -> Result<()> {
        let level = self.levels.resolve(level)?;
        self.emit(level, message, context)
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("handlers", &self.read_handlers().len())
            .field("params", &*self.read_params())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logging_sink::{MemoryHandler, NullHandler};
    use serde_json::json;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Failing;

    impl logging::Handler for Failing {
        fn is_handling(&self, _level: Level) -> bool {
            true
        }

        fn handle(&self, _record: &Record) -> io::Result<()> {
            Err(io::Error::other("refused"))
        }
    }

    #[test]
    fn handlers_run_in_insertion_order() {
        let channel = Channel::new("ordered");
        let first = MemoryHandler::new(Level::DEBUG);
        let second = MemoryHandler::new(Level::DEBUG);
        channel.push_handler(Arc::new(first.clone()));
        channel.push_handler(Arc::new(second.clone()));

        channel.info("hello", Context::new()).unwrap();
        assert_eq!(first.messages(), vec!["hello".to_owned()]);
        assert_eq!(second.messages(), vec!["hello".to_owned()]);
        assert_eq!(channel.handlers()[0].kind(), "memory");
    }

    #[test]
    fn first_failure_stops_dispatch() {
        let channel = Channel::new("broken");
        let before = MemoryHandler::new(Level::DEBUG);
        let after = MemoryHandler::new(Level::DEBUG);
        channel.set_handlers(vec![
            Arc::new(before.clone()),
            Arc::new(Failing),
            Arc::new(after.clone()),
        ]);

        let error = channel.error("boom", Context::new()).unwrap_err();
        assert!(matches!(error, Error::Handler { ref channel, .. } if channel == "broken"));
        assert_eq!(before.len(), 1);
        assert!(after.is_empty());
    }

    #[test]
    fn installed_handlers_skip_fallback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let channel = Channel::new("explicit");
        channel.set_fallback(
            move |_: &Channel| -> std::result::Result<SharedHandler, crate::BoxError> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(NullHandler::default()))
            },
        );
        channel.push_handler(Arc::new(NullHandler::default()));

        channel.notice("no fallback", Context::new()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(channel.default_handlers().is_empty());
    }

    #[test]
    fn explicit_defaults_replace_fallback() {
        let channel = Channel::new("defaults");
        channel.set_fallback(|_: &Channel| -> std::result::Result<SharedHandler, crate::BoxError> {
            Err("fallback must not run".into())
        });
        let memory = MemoryHandler::new(Level::DEBUG);
        channel.set_default_handlers(vec![Arc::new(memory.clone())]);

        channel.warning("uses defaults", Context::new()).unwrap();
        assert_eq!(memory.len(), 1);
        assert_eq!(channel.handlers().len(), 1);
    }

    #[test]
    fn register_default_handlers_appends() {
        let channel = Channel::new("append");
        let memory = MemoryHandler::new(Level::DEBUG);
        channel.set_default_handlers(vec![Arc::new(memory.clone())]);
        channel.push_handler(Arc::new(NullHandler::default()));

        channel.register_default_handlers().unwrap();
        let kinds: Vec<_> = channel.handlers().iter().map(|handler| handler.kind()).collect();
        assert_eq!(kinds, vec!["null", "memory"]);
    }

    #[test]
    fn params_merge_and_default() {
        let channel = Channel::new("params");
        channel.set_params(json!({"rotate": 3, "level": "INFO"}).as_object().unwrap().clone());
        channel.set_params(json!({"rotate": 5}).as_object().unwrap().clone());

        assert_eq!(channel.params("rotate", json!(10)), json!(5));
        assert_eq!(channel.params("level", json!("DEBUG")), json!("INFO"));
        assert_eq!(channel.params("format", json!(null)), json!(null));
        assert_eq!(channel.param("missing"), None);
        assert_eq!(channel.all_params().len(), 2);
    }

    #[test]
    fn log_resolves_levels_by_name() {
        let channel = Channel::new("named");
        let memory = MemoryHandler::new(Level::DEBUG);
        channel.push_handler(Arc::new(memory.clone()));

        channel.log(&json!("Success"), "by name", Context::new()).unwrap();
        channel.log(&json!(650), "unnamed", Context::new()).unwrap();
        let error = channel.log(&json!("LOUD"), "nope", Context::new()).unwrap_err();

        assert!(matches!(error, Error::Level(_)));
        let records = memory.records();
        assert_eq!(records[0].level, Level::SUCCESS);
        assert_eq!(records[1].level_name, "650");
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn unhandled_levels_are_skipped() {
        let channel = Channel::new("quiet");
        let memory = MemoryHandler::new(Level::ERROR);
        channel.push_handler(Arc::new(memory.clone()));
        channel.push_handler(Arc::new(Failing));

        // The failing handler still sees the record because it handles every level.
        assert!(channel.info("x", Context::new()).is_err());
        assert!(memory.is_empty());
    }

    #[test]
    fn manager_reference_is_weak() {
        let channel = Channel::new("orphan");
        {
            let manager = LogManager::new();
            manager.set_default_storage_path("/srv/logs");
            channel.set_log_manager(&manager);
            assert_eq!(channel.default_storage_path(), Some(PathBuf::from("/srv/logs")));
        }
        assert!(channel.log_manager().is_none());
        assert_eq!(channel.default_storage_path(), None);
    }
}
