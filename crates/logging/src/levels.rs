//! crates/logging/src/levels.rs
//! Severity levels and the shared level table used to resolve them.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{PoisonError, RwLock};

use serde_json::Value;
use thiserror::Error;

/// Severity of a log record.
///
/// Levels are plain integers: a larger value is more severe. The base set
/// mirrors the RFC 5424 severities with the extra [`Level::SUCCESS`] inserted
/// between [`Level::INFO`] and [`Level::NOTICE`]. Additional levels can be
/// declared at runtime through [`LevelTable::register`].
///
/// # Examples
///
/// ```
/// use logging::Level;
///
/// assert!(Level::SUCCESS > Level::INFO);
/// assert!(Level::SUCCESS < Level::NOTICE);
/// assert_eq!(Level::SUCCESS.value(), 225);
/// assert_eq!(Level::SUCCESS.to_string(), "SUCCESS");
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Level(u32);

impl Level {
    /// Detailed debug information.
    pub const DEBUG: Self = Self(100);
    /// Interesting events.
    pub const INFO: Self = Self(200);
    /// Successful completion of an operation.
    pub const SUCCESS: Self = Self(225);
    /// Normal but significant events.
    pub const NOTICE: Self = Self(250);
    /// Exceptional occurrences that are not errors.
    pub const WARNING: Self = Self(300);
    /// Runtime errors that do not require immediate action.
    pub const ERROR: Self = Self(400);
    /// Critical conditions.
    pub const CRITICAL: Self = Self(500);
    /// Action must be taken immediately.
    pub const ALERT: Self = Self(550);
    /// System is unusable.
    pub const EMERGENCY: Self = Self(600);

    /// Base levels in ascending order together with their canonical names.
    pub const BASE: [(Self, &'static str); 9] = [
        (Self::DEBUG, "DEBUG"),
        (Self::INFO, "INFO"),
        (Self::SUCCESS, "SUCCESS"),
        (Self::NOTICE, "NOTICE"),
        (Self::WARNING, "WARNING"),
        (Self::ERROR, "ERROR"),
        (Self::CRITICAL, "CRITICAL"),
        (Self::ALERT, "ALERT"),
        (Self::EMERGENCY, "EMERGENCY"),
    ];

    /// Wraps a raw integer without checking it against any table.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the integer value of the level.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Returns the canonical name when the level is one of the base levels.
    #[must_use]
    pub fn base_name(self) -> Option<&'static str> {
        Self::BASE
            .iter()
            .find(|(level, _)| *level == self)
            .map(|(_, name)| *name)
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::DEBUG
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.base_name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.0),
        }
    }
}

impl From<Level> for Value {
    fn from(level: Level) -> Self {
        Self::from(level.0)
    }
}

/// Errors produced while resolving or registering levels.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum LevelError {
    /// The input is neither a known name nor an integer.
    #[error("level \"{value}\" is not defined, use one of: {}", known.join(", "))]
    Unrecognized {
        /// The offending input, or a diagnostic dump when it was not a string.
        value: String,
        /// Names known to the table when resolution failed.
        known: Vec<String>,
    },
    /// A base level cannot be renumbered.
    #[error("level {name} is a base level and cannot be renumbered to {value}")]
    Reserved {
        /// Name of the base level.
        name: String,
        /// Value that was requested.
        value: u32,
    },
    /// Another level already owns the integer value.
    #[error("level value {value} is already registered as {existing}")]
    Duplicate {
        /// Requested value.
        value: u32,
        /// Name currently bound to the value.
        existing: String,
    },
    /// The name is empty or numeric and could never be resolved by name.
    #[error("\"{0}\" is not a valid level name")]
    InvalidName(String),
}

#[derive(Debug)]
struct TableInner {
    by_value: BTreeMap<u32, String>,
    by_name: HashMap<String, u32>,
}

/// Mutable table mapping level names to their integer values.
///
/// A table starts with the nine base levels. Custom levels added through
/// [`register`](Self::register) are visible to every holder of the table, so
/// the table is normally shared behind an [`Arc`](std::sync::Arc) by the
/// channel registry and all of its channels. Base levels can never be removed
/// or renumbered.
///
/// # Examples
///
/// ```
/// use logging::{Level, LevelTable};
/// use serde_json::json;
///
/// let table = LevelTable::new();
/// assert_eq!(table.resolve_name("success")?, Level::SUCCESS);
/// assert_eq!(table.resolve(&json!("300"))?, Level::WARNING);
///
/// table.register("TRACE", 50)?;
/// assert_eq!(table.resolve_name("trace")?, Level::new(50));
/// assert_eq!(table.names().first().map(String::as_str), Some("TRACE"));
/// # Ok::<(), logging::LevelError>(())
/// ```
#[derive(Debug)]
pub struct LevelTable {
    inner: RwLock<TableInner>,
}

impl LevelTable {
    /// Creates a table holding only the base levels.
    #[must_use]
    pub fn new() -> Self {
        let mut by_value = BTreeMap::new();
        let mut by_name = HashMap::new();
        for (level, name) in Level::BASE {
            by_value.insert(level.value(), name.to_owned());
            by_name.insert(name.to_owned(), level.value());
        }

        Self {
            inner: RwLock::new(TableInner { by_value, by_name }),
        }
    }

    /// Registers `name` with the given integer value.
    ///
    /// Names are stored uppercased. Re-registering a base level with its own
    /// value is accepted; renumbering it is not. A custom level may be moved to
    /// a new value as long as no other level owns that value.
    pub fn register(&self, name: &str, value: u32) -> Result<Level, LevelError> {
        let upper = name.trim().to_ascii_uppercase();
        if upper.is_empty() || is_numeric(&upper) {
            return Err(LevelError::InvalidName(name.to_owned()));
        }

        if let Some((base, _)) = Level::BASE.iter().find(|(_, base)| *base == upper) {
            if base.value() == value {
                return Ok(*base);
            }
            return Err(LevelError::Reserved { name: upper, value });
        }

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = inner.by_value.get(&value) {
            if *existing == upper {
                return Ok(Level::new(value));
            }
            return Err(LevelError::Duplicate {
                value,
                existing: existing.clone(),
            });
        }

        if let Some(previous) = inner.by_name.insert(upper.clone(), value) {
            inner.by_value.remove(&previous);
        }
        inner.by_value.insert(value, upper);
        Ok(Level::new(value))
    }

    /// Resolves a level expressed as a JSON value.
    ///
    /// Integers pass through unchanged, strings go through
    /// [`resolve_name`](Self::resolve_name), and any other value is rejected
    /// with a dump of the value in the error message.
    pub fn resolve(&self, input: &Value) -> Result<Level, LevelError> {
        match input {
            Value::String(text) => self.resolve_name(text),
            Value::Number(number) => number
                .as_u64()
                .and_then(|value| u32::try_from(value).ok())
                .map(Level::new)
                .ok_or_else(|| self.unrecognized(format!("{input:?}"))),
            other => Err(self.unrecognized(format!("{other:?}"))),
        }
    }

    /// Resolves a level name or a numeric string.
    ///
    /// Digit strings are parsed without checking the table. Other strings are
    /// matched case-insensitively against the registered names.
    pub fn resolve_name(&self, name: &str) -> Result<Level, LevelError> {
        let trimmed = name.trim();
        if is_numeric(trimmed) {
            return trimmed
                .parse::<u32>()
                .map(Level::new)
                .map_err(|_| self.unrecognized(name.to_owned()));
        }

        let upper = trimmed.to_ascii_uppercase();
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        match inner.by_name.get(&upper) {
            Some(value) => Ok(Level::new(*value)),
            None => {
                drop(inner);
                Err(self.unrecognized(name.to_owned()))
            }
        }
    }

    /// Returns the registered name of `level`, if any.
    #[must_use]
    pub fn name_of(&self, level: Level) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_value
            .get(&level.value())
            .cloned()
    }

    /// Returns the display name for `level`: its registered name or its value.
    #[must_use]
    pub fn display_name(&self, level: Level) -> String {
        self.name_of(level)
            .unwrap_or_else(|| level.value().to_string())
    }

    /// Reports whether `level` is registered in the table.
    #[must_use]
    pub fn contains(&self, level: Level) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_value
            .contains_key(&level.value())
    }

    /// Returns every known name in ascending level order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_value
            .values()
            .cloned()
            .collect()
    }

    /// Returns every known level paired with its name, in ascending order.
    #[must_use]
    pub fn levels(&self) -> Vec<(Level, String)> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_value
            .iter()
            .map(|(value, name)| (Level::new(*value), name.clone()))
            .collect()
    }

    fn unrecognized(&self, value: String) -> LevelError {
        LevelError::Unrecognized {
            value,
            known: self.names(),
        }
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self::new()
    }
}

fn is_numeric(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|byte| byte.is_ascii_digit())
}
