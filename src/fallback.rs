//! src/fallback.rs
//!
//! Construction of the handler a channel falls back to when it has none.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use logging::timezone::{self, Timezone};
use logging::{Level, SharedHandler};
use logging_sink::{LineFormatter, RotatingFileHandler};
use serde_json::Value;
use thiserror::Error;

use crate::channel::Channel;
use crate::error::BoxError;

/// Rotation count used when the `rotate` parameter is missing or empty.
pub const DEFAULT_ROTATION: usize = 10;

/// Builds the fallback handler of a channel.
///
/// A strategy configured on a channel fully determines the handler; the
/// built-in parameter resolution is skipped. Closures taking a channel
/// implement the trait directly.
///
/// Strategies run while the channel's handler list is locked for writing and
/// must not read or modify that list.
pub trait FallbackStrategy: Send + Sync {
    /// Builds the handler for `channel`.
    fn build(&self, channel: &Channel) -> Result<SharedHandler, BoxError>;
}

impl<F> FallbackStrategy for F
where
    F: Fn(&Channel) -> Result<SharedHandler, BoxError> + Send + Sync,
{
    fn build(&self, channel: &Channel) -> Result<SharedHandler, BoxError> {
        self(channel)
    }
}

/// The fallback used when a channel has no strategy of its own: a daily
/// rotating file described by the channel parameters.
#[derive(Clone, Copy, Debug, Default)]
pub struct RotatingFileFallback;

impl FallbackStrategy for RotatingFileFallback {
    fn build(&self, channel: &Channel) -> Result<SharedHandler, BoxError> {
        let descriptor = FallbackDescriptor::resolve(channel)?;
        let handler = descriptor.build()?;
        timezone::set_timezone(descriptor.timezone);
        Ok(Arc::new(handler))
    }
}

/// Resolved settings of a channel's fallback handler.
///
/// Parameters read from the channel:
///
/// | key           | meaning                          | when missing or empty          |
/// |---------------|----------------------------------|--------------------------------|
/// | `filename`    | log file path                    | storage path + `<name>.log`    |
/// | `rotate`      | number of dated files kept       | [`DEFAULT_ROTATION`]           |
/// | `level`       | minimum level, name or integer   | [`Level::DEBUG`]               |
/// | `format`      | line layout                      | formatter default              |
/// | `date_format` | timestamp layout                 | formatter default              |
/// | `timezone`    | zone applied to all timestamps   | local offset                   |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FallbackDescriptor {
    /// Base log file path.
    pub filename: PathBuf,
    /// Number of dated files kept.
    pub max_files: usize,
    /// Minimum level handled.
    pub level: Level,
    /// Line layout override.
    pub format: Option<String>,
    /// Timestamp layout override.
    pub date_format: Option<String>,
    /// Zone installed as the process timezone after construction.
    pub timezone: Timezone,
}

impl FallbackDescriptor {
    /// Resolves the descriptor from the channel parameters and the registry
    /// storage path.
    pub fn resolve(channel: &Channel) -> Result<Self, BoxError> {
        let filename = match channel.param_str("filename") {
            Some(filename) => PathBuf::from(filename),
            None => resolve_filename(channel.name(), channel.default_storage_path().as_deref()),
        };

        let max_files = match channel.truthy_param("rotate") {
            Some(value) => {
                parse_count(&value).ok_or_else(|| InvalidParam::new("rotate", &value))?
            }
            None => DEFAULT_ROTATION,
        };

        let level = match channel.truthy_param("level") {
            Some(value) => channel.levels().resolve(&value)?,
            None => Level::DEBUG,
        };

        let timezone = match channel.param_str("timezone") {
            Some(name) => timezone::parse_timezone(&name)?,
            None => Timezone::Fixed(timezone::local_offset()),
        };

        Ok(Self {
            filename,
            max_files,
            level,
            format: channel.param_str("format"),
            date_format: channel.param_str("date_format"),
            timezone,
        })
    }

    /// Builds the rotating file handler described by `self`.
    ///
    /// Does not touch the process timezone.
    pub fn build(&self) -> Result<RotatingFileHandler, BoxError> {
        let formatter =
            LineFormatter::with_formats(self.format.as_deref(), self.date_format.as_deref())?;
        let handler = RotatingFileHandler::new(&self.filename, self.max_files, self.level)?
            .with_formatter(formatter);
        Ok(handler)
    }
}

/// Default log file of channel `name`: `<storage>/<name>.log`, or a bare
/// `<name>.log` relative to the working directory without a storage path.
///
/// # Examples
///
/// ```
/// use std::path::{Path, PathBuf};
/// use logbook::resolve_filename;
///
/// assert_eq!(
///     resolve_filename("billing", Some(Path::new("/var/log/app"))),
///     PathBuf::from("/var/log/app/billing.log")
/// );
/// assert_eq!(resolve_filename("billing", None), PathBuf::from("billing.log"));
/// ```
#[must_use]
pub fn resolve_filename(name: &str, storage_path: Option<&Path>) -> PathBuf {
    let file = format!("{name}.log");
    match storage_path {
        Some(directory) if !directory.as_os_str().is_empty() => directory.join(file),
        _ => PathBuf::from(file),
    }
}

fn parse_count(value: &Value) -> Option<usize> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|count| usize::try_from(count).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// A fallback parameter holds a value of the wrong shape.
#[derive(Debug, Error)]
#[error("parameter \"{key}\" has an invalid value: {value}")]
struct InvalidParam {
    key: &'static str,
    value: String,
}

impl InvalidParam {
    fn new(key: &'static str, value: &Value) -> Self {
        Self {
            key,
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::UtcOffset;

    #[test]
    fn storage_path_is_joined_with_channel_name() {
        assert_eq!(
            resolve_filename("app", Some(Path::new("/srv/logs/"))),
            PathBuf::from("/srv/logs/app.log")
        );
        assert_eq!(resolve_filename("app", Some(Path::new(""))), PathBuf::from("app.log"));
    }

    #[test]
    fn counts_accept_numbers_and_digit_strings() {
        assert_eq!(parse_count(&json!(3)), Some(3));
        assert_eq!(parse_count(&json!("7")), Some(7));
        assert_eq!(parse_count(&json!(-1)), None);
        assert_eq!(parse_count(&json!("seven")), None);
        assert_eq!(parse_count(&json!([3])), None);
    }

    #[test]
    fn descriptor_defaults() {
        let channel = Channel::new("orders");
        let descriptor = FallbackDescriptor::resolve(&channel).unwrap();

        assert_eq!(descriptor.filename, PathBuf::from("orders.log"));
        assert_eq!(descriptor.max_files, DEFAULT_ROTATION);
        assert_eq!(descriptor.level, Level::DEBUG);
        assert_eq!(descriptor.format, None);
        assert_eq!(descriptor.date_format, None);
    }

    #[test]
    fn descriptor_reads_parameters() {
        let channel = Channel::new("orders");
        channel.set_param("filename", json!("/var/log/shop/custom.log"));
        channel.set_param("rotate", json!("4"));
        channel.set_param("level", json!("warning"));
        channel.set_param("format", json!("%message%"));
        channel.set_param("date_format", json!("[year]"));
        channel.set_param("timezone", json!("+02:00"));

        let descriptor = FallbackDescriptor::resolve(&channel).unwrap();
        assert_eq!(descriptor.filename, PathBuf::from("/var/log/shop/custom.log"));
        assert_eq!(descriptor.max_files, 4);
        assert_eq!(descriptor.level, Level::WARNING);
        assert_eq!(descriptor.format.as_deref(), Some("%message%"));
        assert_eq!(descriptor.date_format.as_deref(), Some("[year]"));
        assert_eq!(
            descriptor.timezone,
            Timezone::Fixed(UtcOffset::from_hms(2, 0, 0).unwrap())
        );
    }

    #[test]
    fn empty_parameters_use_defaults() {
        let channel = Channel::new("orders");
        channel.set_param("filename", json!(""));
        channel.set_param("rotate", json!(0));
        channel.set_param("level", json!(null));

        let descriptor = FallbackDescriptor::resolve(&channel).unwrap();
        assert_eq!(descriptor.filename, PathBuf::from("orders.log"));
        assert_eq!(descriptor.max_files, DEFAULT_ROTATION);
        assert_eq!(descriptor.level, Level::DEBUG);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let channel = Channel::new("orders");
        channel.set_param("rotate", json!("many"));
        let error = FallbackDescriptor::resolve(&channel).unwrap_err();
        assert!(error.to_string().contains("\"rotate\""));

        let channel = Channel::new("orders");
        channel.set_param("level", json!("LOUD"));
        let error = FallbackDescriptor::resolve(&channel).unwrap_err();
        assert!(error.to_string().contains("use one of"));

        let channel = Channel::new("orders");
        channel.set_param("timezone", json!("Mars/Olympus"));
        assert!(FallbackDescriptor::resolve(&channel).is_err());

        let channel = Channel::new("orders");
        channel.set_param("timezone", json!("+1é1"));
        let error = FallbackDescriptor::resolve(&channel).unwrap_err();
        assert!(error.to_string().contains("+1é1"));
    }

    #[test]
    fn descriptor_reads_zone_names() {
        let channel = Channel::new("orders");
        channel.set_param("timezone", json!("Europe/Paris"));

        let descriptor = FallbackDescriptor::resolve(&channel).unwrap();
        assert!(matches!(descriptor.timezone, Timezone::Named(_)));
        assert_eq!(descriptor.timezone, timezone::parse_timezone("Europe/Paris").unwrap());
    }

    #[test]
    fn invalid_param_message_names_the_key() {
        let error = InvalidParam::new("rotate", &json!([1, 2]));
        assert_eq!(error.to_string(), "parameter \"rotate\" has an invalid value: [1,2]");
    }
}
