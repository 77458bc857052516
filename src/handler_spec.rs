//! src/handler_spec.rs
//!
//! Handler descriptions accepted in channel configuration.

use std::path::PathBuf;
use std::sync::Arc;

use logging::{Level, LevelTable, SharedHandler};
use logging_sink::{LineFormatter, LineMode, NullHandler, RotatingFileHandler, StreamHandler};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::fallback::{DEFAULT_ROTATION, resolve_filename};

/// A handler described in configuration.
///
/// The `type` key selects the handler:
///
/// ```json
/// { "type": "stderr", "level": "warning" }
/// { "type": "stream", "target": "stdout", "format": "%level_name%: %message%" }
/// { "type": "rotating_file", "filename": "/var/log/app/jobs.log", "max_files": 3 }
/// { "type": "null" }
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HandlerSpec {
    /// Standard error or standard output, selected by `target`.
    Stream(StreamSpec),
    /// Standard error.
    Stderr(LineSpec),
    /// Standard output.
    Stdout(LineSpec),
    /// Daily rotating file.
    RotatingFile(FileSpec),
    /// Discards records.
    Null(NullSpec),
}

/// Output stream of a [`HandlerSpec::Stream`].
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StreamTarget {
    /// Standard error.
    #[default]
    Stderr,
    /// Standard output.
    Stdout,
}

/// Settings shared by line based handlers.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct LineSpec {
    /// Minimum level, as a name or an integer.
    pub level: Option<Value>,
    /// Line layout.
    pub format: Option<String>,
    /// Timestamp layout.
    pub date_format: Option<String>,
    /// Whether each record ends with a newline. Defaults to `true`.
    pub newline: Option<bool>,
}

impl LineSpec {
    fn line_mode(&self) -> LineMode {
        self.newline.map_or_else(LineMode::default, LineMode::from)
    }
}

/// Settings of a [`HandlerSpec::Stream`].
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct StreamSpec {
    /// Stream written to.
    #[serde(default)]
    pub target: StreamTarget,
    /// Level and layout settings.
    #[serde(flatten)]
    pub line: LineSpec,
}

/// Settings of a [`HandlerSpec::RotatingFile`].
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct FileSpec {
    /// Base log file. Defaults to the channel's default file.
    #[serde(default)]
    pub filename: Option<PathBuf>,
    /// Number of dated files kept.
    #[serde(default)]
    pub max_files: Option<usize>,
    /// Level and layout settings.
    #[serde(flatten)]
    pub line: LineSpec,
}

/// Settings of a [`HandlerSpec::Null`].
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct NullSpec {
    /// Minimum level, as a name or an integer.
    pub level: Option<Value>,
}

impl HandlerSpec {
    /// Parses one handler description.
    ///
    /// Anything that is not an object with a known `type` fails with
    /// [`Error::InvalidHandlerType`].
    pub fn parse(channel: &str, value: &Value) -> Result<Self> {
        Self::deserialize(value).map_err(|_| Error::InvalidHandlerType {
            channel: channel.to_owned(),
            found: value.to_string(),
        })
    }

    /// Builds the described handler.
    ///
    /// `levels` resolves level names and `storage_path` supplies the
    /// directory of rotating files without an explicit filename.
    pub fn build(
        &self,
        channel: &str,
        levels: &LevelTable,
        storage_path: Option<&std::path::Path>,
    ) -> Result<SharedHandler> {
        let handler: SharedHandler = match self {
            Self::Stream(spec) => match spec.target {
                StreamTarget::Stderr => stream(StreamHandler::stderr, &spec.line, channel, levels)?,
                StreamTarget::Stdout => stream(StreamHandler::stdout, &spec.line, channel, levels)?,
            },
            Self::Stderr(spec) => stream(StreamHandler::stderr, spec, channel, levels)?,
            Self::Stdout(spec) => stream(StreamHandler::stdout, spec, channel, levels)?,
            Self::RotatingFile(spec) => {
                let filename = spec
                    .filename
                    .clone()
                    .unwrap_or_else(|| resolve_filename(channel, storage_path));
                let level = min_level(spec.line.level.as_ref(), levels)?;
                let formatter = formatter(&spec.line, channel)?;
                let handler = RotatingFileHandler::new(
                    filename,
                    spec.max_files.unwrap_or(DEFAULT_ROTATION),
                    level,
                )
                .map_err(|source| construction_failed(channel, source))?
                .with_formatter(formatter)
                .with_line_mode(spec.line.line_mode());
                Arc::new(handler)
            }
            Self::Null(spec) => Arc::new(NullHandler::new(min_level(spec.level.as_ref(), levels)?)),
        };
        Ok(handler)
    }
}

fn stream<W>(
    open: fn(Level) -> StreamHandler<W>,
    spec: &LineSpec,
    channel: &str,
    levels: &LevelTable,
) -> Result<SharedHandler>
where
    W: std::io::Write + Send + 'static,
{
    let level = min_level(spec.level.as_ref(), levels)?;
    let formatter = formatter(spec, channel)?;
    Ok(Arc::new(
        open(level)
            .with_formatter(formatter)
            .with_line_mode(spec.line_mode()),
    ))
}

fn min_level(level: Option<&Value>, levels: &LevelTable) -> Result<Level> {
    match level {
        Some(value) => Ok(levels.resolve(value)?),
        None => Ok(Level::DEBUG),
    }
}

fn formatter(spec: &LineSpec, channel: &str) -> Result<LineFormatter> {
    LineFormatter::with_formats(spec.format.as_deref(), spec.date_format.as_deref())
        .map_err(|source| construction_failed(channel, source))
}

fn construction_failed(channel: &str, source: logging_sink::SinkError) -> Error {
    Error::HandlerConstructionFailed {
        channel: channel.to_owned(),
        source: Box::new(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_every_type() {
        let cases = [
            json!({"type": "stderr"}),
            json!({"type": "stdout", "level": "error"}),
            json!({"type": "stream", "target": "stdout"}),
            json!({"type": "rotating_file", "max_files": 2}),
            json!({"type": "null", "level": 300}),
        ];
        for case in cases {
            assert!(HandlerSpec::parse("app", &case).is_ok(), "{case}");
        }
    }

    #[test]
    fn stream_defaults_to_stderr() {
        let spec = HandlerSpec::parse("app", &json!({"type": "stream"})).unwrap();
        assert_eq!(
            spec,
            HandlerSpec::Stream(StreamSpec {
                target: StreamTarget::Stderr,
                line: LineSpec::default(),
            })
        );
    }

    #[test]
    fn unknown_types_are_invalid() {
        for case in [
            json!({"type": "syslog"}),
            json!({"level": "info"}),
            json!("stderr"),
            json!(42),
            json!({"type": "rotating_file", "max_files": "many"}),
        ] {
            let error = HandlerSpec::parse("app", &case).unwrap_err();
            match error {
                Error::InvalidHandlerType { channel, found } => {
                    assert_eq!(channel, "app");
                    assert_eq!(found, case.to_string());
                }
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn build_resolves_levels_through_the_table() {
        let levels = LevelTable::new();
        levels.register("AUDIT", 260).unwrap();

        let spec = HandlerSpec::parse("app", &json!({"type": "null", "level": "audit"})).unwrap();
        let handler = spec.build("app", &levels, None).unwrap();
        assert!(!handler.is_handling(Level::NOTICE));
        assert!(handler.is_handling(Level::new(260)));
        assert_eq!(handler.kind(), "null");

        let spec = HandlerSpec::parse("app", &json!({"type": "stderr", "level": "loud"})).unwrap();
        assert!(matches!(spec.build("app", &levels, None), Err(Error::Level(_))));
    }

    #[test]
    fn bad_date_format_fails_construction() {
        let spec =
            HandlerSpec::parse("app", &json!({"type": "stdout", "date_format": "[year"})).unwrap();
        let error = spec.build("app", &LevelTable::new(), None).err().unwrap();
        assert!(matches!(error, Error::HandlerConstructionFailed { .. }));
    }

    #[test]
    fn rotating_file_defaults_to_storage_path() {
        let dir = tempfile::tempdir().unwrap();
        let spec = HandlerSpec::parse("jobs", &json!({"type": "rotating_file"})).unwrap();
        let handler = spec.build("jobs", &LevelTable::new(), Some(dir.path())).unwrap();
        assert_eq!(handler.kind(), "rotating_file");
    }

    #[test]
    fn newline_setting_controls_line_mode() {
        let dir = tempfile::tempdir().unwrap();
        let spec = HandlerSpec::parse(
            "jobs",
            &json!({"type": "rotating_file", "format": "%message%", "newline": false}),
        )
        .unwrap();
        let handler = spec.build("jobs", &LevelTable::new(), Some(dir.path())).unwrap();

        for message in ["a", "b\n"] {
            let record = logging::Record::new(
                "jobs",
                Level::INFO,
                "INFO",
                message,
                logging::Context::new(),
            );
            handler.handle(&record).unwrap();
        }
        handler.flush().unwrap();

        let entry = std::fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap();
        assert_eq!(std::fs::read_to_string(entry.path()).unwrap(), "ab\n");
    }
}
