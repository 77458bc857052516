#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` holds the vocabulary shared by every part of logbook: severity
//! [`Level`]s, the [`LevelTable`] that resolves level names and integers, the
//! [`Record`] passed to destinations, and the [`Handler`] capability those
//! destinations implement.
//!
//! # Design
//!
//! Levels are integers wrapped in [`Level`]. The base set follows RFC 5424
//! with an additional `SUCCESS` level between `INFO` and `NOTICE`. Custom
//! levels are added to a [`LevelTable`], an explicit object that callers share
//! behind an [`Arc`](std::sync::Arc) and inject wherever level names must be
//! resolved. There is no hidden global level table.
//!
//! The only process-wide setting is the record timezone held by
//! [`timezone`]. Changing it affects every record created afterwards.
//!
//! # Invariants
//!
//! - Base levels are never removed or renumbered.
//! - Every registered level has a unique integer and a unique uppercase name.
//! - Numeric input resolves to its integer without consulting the table.
//!
//! # Errors
//!
//! Resolution and registration failures are reported as [`LevelError`].
//! Handlers report write failures as [`std::io::Error`].
//!
//! # Examples
//!
//! ```
//! use logging::{Level, LevelTable};
//!
//! let table = LevelTable::new();
//! assert_eq!(table.resolve_name("warning")?, Level::WARNING);
//! assert!(table.resolve_name("loud").is_err());
//! # Ok::<(), logging::LevelError>(())
//! ```

mod handler;
mod levels;
mod record;
pub mod timezone;

pub use handler::{Handler, SharedHandler};
pub use levels::{Level, LevelError, LevelTable};
pub use record::{Context, Record};
