//! Line formatting of records.

use logging::{Context, Record};
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::{BorrowedFormatItem, OwnedFormatItem};
use time::macros::format_description;

use crate::error::SinkError;

/// Default line layout.
pub const DEFAULT_FORMAT: &str = "[%datetime%] %channel%.%level_name%: %message% %context% %extra%";

/// Default timestamp layout, expressed as a `time` format description.
pub const DEFAULT_DATE_FORMAT: &str =
    "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]";

const DEFAULT_DATE_ITEMS: &[BorrowedFormatItem<'_>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
);

/// Turns a record into a line of text.
pub trait Formatter: Send + Sync {
    /// Formats `record` without a trailing newline.
    fn format(&self, record: &Record) -> String;
}

/// Placeholder based formatter.
///
/// The layout may reference `%datetime%`, `%channel%`, `%level_name%`,
/// `%level%`, `%message%`, `%context%` and `%extra%`. Unknown placeholders are
/// copied verbatim. Empty context and extra maps render as `[]`, populated
/// ones as compact JSON.
///
/// # Examples
///
/// ```
/// use logging::{Context, Level, Record};
/// use logging_sink::{Formatter, LineFormatter};
/// use time::macros::datetime;
///
/// let formatter = LineFormatter::new();
/// let record = Record::new("app", Level::INFO, "INFO", "ready", Context::new())
///     .with_datetime(datetime!(2024-05-01 08:30:00 UTC));
///
/// assert_eq!(
///     formatter.format(&record),
///     "[2024-05-01T08:30:00+00:00] app.INFO: ready [] []"
/// );
/// ```
#[derive(Clone, Debug)]
pub struct LineFormatter {
    format: String,
    date_format: Option<OwnedFormatItem>,
}

impl LineFormatter {
    /// Creates a formatter using [`DEFAULT_FORMAT`] and [`DEFAULT_DATE_FORMAT`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            format: DEFAULT_FORMAT.to_owned(),
            date_format: None,
        }
    }

    /// Creates a formatter from optional layouts, using the defaults for
    /// missing ones.
    pub fn with_formats(
        format: Option<&str>,
        date_format: Option<&str>,
    ) -> Result<Self, SinkError> {
        let date_format = date_format
            .map(|text| {
                time::format_description::parse_owned::<2>(text).map_err(|source| {
                    SinkError::InvalidDateFormat {
                        format: text.to_owned(),
                        source,
                    }
                })
            })
            .transpose()?;

        Ok(Self {
            format: format.unwrap_or(DEFAULT_FORMAT).to_owned(),
            date_format,
        })
    }

    /// Returns the line layout.
    #[must_use]
    pub fn layout(&self) -> &str {
        &self.format
    }

    fn format_datetime(&self, datetime: OffsetDateTime) -> String {
        let rendered = match &self.date_format {
            Some(items) => datetime.format(items),
            None => datetime.format(DEFAULT_DATE_ITEMS),
        };
        rendered.unwrap_or_else(|_| datetime.to_string())
    }
}

impl Default for LineFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for LineFormatter {
    fn format(&self, record: &Record) -> String {
        let mut output = String::with_capacity(self.format.len() + record.message.len());
        let mut rest = self.format.as_str();

        while let Some(start) = rest.find('%') {
            output.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let Some(end) = after.find('%') else {
                rest = &rest[start..];
                break;
            };

            let name = &after[..end];
            match name {
                "datetime" => output.push_str(&self.format_datetime(record.datetime)),
                "channel" => output.push_str(&record.channel),
                "level_name" => output.push_str(&record.level_name),
                "level" => output.push_str(&record.level.value().to_string()),
                "message" => output.push_str(&record.message),
                "context" => output.push_str(&render_map(&record.context)),
                "extra" => output.push_str(&render_map(&record.extra)),
                _ => {
                    // Keep the closing '%' available as the start of the next token.
                    output.push('%');
                    output.push_str(name);
                    rest = &after[end..];
                    continue;
                }
            }
            rest = &after[end + 1..];
        }

        output.push_str(rest);
        output
    }
}

fn render_map(map: &Context) -> String {
    if map.is_empty() {
        return "[]".to_owned();
    }
    Value::Object(map.clone()).to_string()
}
