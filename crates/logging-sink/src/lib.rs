#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! crates/logging-sink/src/lib.rs
//!
//! # Overview
//!
//! `logging-sink` provides the concrete [`logging::Handler`] implementations
//! used by logbook channels: a [`StreamHandler`] over any
//! [`std::io::Write`] implementor, a daily [`RotatingFileHandler`], and the
//! [`MemoryHandler`] and [`NullHandler`] helpers. Handlers render records
//! through a [`Formatter`], by default the placeholder based
//! [`LineFormatter`].
//!
//! # Design
//!
//! Every handler is used through `&self` so one instance can be shared by
//! several channels. Writers and open files live behind a mutex. Callers can
//! control whether rendered records end with a newline by selecting a
//! [`LineMode`].
//!
//! # Invariants
//!
//! - Records below a handler's minimum level are accepted and dropped.
//! - [`RotatingFileHandler`] opens its file lazily in append mode and never
//!   truncates existing content.
//! - `LineMode::WithNewline` is the default, printing each record on its own
//!   line.
//!
//! # Errors
//!
//! Construction failures are reported as [`SinkError`]. Writes surface
//! [`std::io::Error`] values from the underlying writer or file unchanged.
//!
//! # Examples
//!
//! Stream two records into an in-memory buffer and inspect the output:
//!
//! ```
//! use logging::{Context, Handler, Level, Record};
//! use logging_sink::{LineFormatter, StreamHandler};
//!
//! let handler = StreamHandler::new(Vec::new(), Level::DEBUG)
//!     .with_formatter(LineFormatter::with_formats(
//!         Some("%channel%.%level_name%: %message%"),
//!         None,
//!     )?);
//!
//! let record = Record::new(
//!     "app",
//!     Level::WARNING,
//!     "WARNING",
//!     "some files vanished",
//!     Context::new(),
//! );
//! handler.handle(&record)?;
//! handler.handle(&Record::new("app", Level::ERROR, "ERROR", "transfer failed", Context::new()))?;
//!
//! let output = String::from_utf8(handler.into_inner())?;
//! assert_eq!(output, "app.WARNING: some files vanished\napp.ERROR: transfer failed\n");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # See also
//!
//! - [`logging::Record`] for the data handed to every handler.

mod error;
mod formatter;
mod line_mode;
mod sink;

pub use error::SinkError;
pub use formatter::{DEFAULT_DATE_FORMAT, DEFAULT_FORMAT, Formatter, LineFormatter};
pub use line_mode::LineMode;
pub use sink::{MemoryHandler, NullHandler, RotatingFileHandler, StreamHandler};
