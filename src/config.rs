//! src/config.rs
//!
//! Registry configuration.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Channel parameter holding explicit default handler descriptions.
pub const HANDLERS_PARAM: &str = "handlers";

/// Configuration applied by [`LogManager::from_config`](crate::LogManager::from_config).
///
/// Every field is optional. Channel entries are parameter objects merged into
/// the channel; a `handlers` array in them is taken out and installed as the
/// channel's default handlers instead of the rotating file fallback.
///
/// # Examples
///
/// ```
/// use logbook::ManagerConfig;
///
/// let config = ManagerConfig::from_json_str(r#"{
///     "default_storage_path": "/var/log/shop",
///     "levels": { "AUDIT": 260 },
///     "channels": {
///         "orders": { "rotate": 3, "level": "audit" },
///         "console": { "handlers": [ { "type": "stderr", "level": "warning" } ] }
///     },
///     "default": "orders"
/// }"#)?;
///
/// assert_eq!(config.levels["AUDIT"], 260);
/// assert_eq!(config.default.as_deref(), Some("orders"));
/// assert_eq!(config.channels.len(), 2);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ManagerConfig {
    /// Directory used for channel log files without an explicit filename.
    pub default_storage_path: Option<PathBuf>,
    /// Custom levels by name.
    pub levels: BTreeMap<String, u32>,
    /// Channel parameters by channel name.
    pub channels: BTreeMap<String, Map<String, Value>>,
    /// Name of the channel used as default.
    pub default: Option<String>,
}

impl ManagerConfig {
    /// Parses a configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Parses a configuration from a JSON value.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}
