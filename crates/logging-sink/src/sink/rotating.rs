use std::ffi::OsStr;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use logging::{Handler, Level, Record};
use time::Date;

use crate::error::SinkError;
use crate::formatter::{Formatter, LineFormatter};
use crate::line_mode::LineMode;

/// Handler writing to one file per day and pruning old files.
///
/// Records go to `<stem>-<YYYY-MM-DD>.<ext>` next to the configured
/// filename, dated by the record's timestamp. The file is opened in append
/// mode on the first record of each day. When a new file is opened, dated
/// siblings beyond `max_files` are removed, oldest first. A `max_files` of
/// zero keeps every file.
pub struct RotatingFileHandler {
    filename: PathBuf,
    max_files: usize,
    level: Level,
    formatter: Box<dyn Formatter>,
    line_mode: LineMode,
    state: Mutex<OpenFile>,
}

#[derive(Default)]
struct OpenFile {
    date: Option<Date>,
    path: Option<PathBuf>,
    file: Option<File>,
}

impl RotatingFileHandler {
    /// Creates the handler and the directory that will hold its files.
    ///
    /// No file is opened until the first record arrives.
    pub fn new(
        filename: impl Into<PathBuf>,
        max_files: usize,
        level: Level,
    ) -> Result<Self, SinkError> {
        let filename = filename.into();
        if filename.as_os_str().is_empty() {
            return Err(SinkError::EmptyPath);
        }

        if let Some(parent) = filename.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| SinkError::Directory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        Ok(Self {
            filename,
            max_files,
            level,
            formatter: Box::new(LineFormatter::new()),
            line_mode: LineMode::default(),
            state: Mutex::new(OpenFile::default()),
        })
    }

    /// Replaces the formatter.
    #[must_use]
    pub fn with_formatter(mut self, formatter: impl Formatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    /// Replaces the line mode.
    #[must_use]
    pub fn with_line_mode(mut self, line_mode: LineMode) -> Self {
        self.line_mode = line_mode;
        self
    }

    /// Undated base filename.
    #[must_use]
    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// Number of dated files kept, zero meaning unlimited.
    #[must_use]
    pub const fn max_files(&self) -> usize {
        self.max_files
    }

    /// Minimum level handled.
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }

    /// Path of the file currently open, if any.
    #[must_use]
    pub fn current_path(&self) -> Option<PathBuf> {
        self.lock().path.clone()
    }

    /// Dated path used for records of `date`.
    #[must_use]
    pub fn dated_path(&self, date: Date) -> PathBuf {
        let stamp = format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            u8::from(date.month()),
            date.day()
        );
        let stem = self.stem();
        let name = match self.filename.extension().and_then(OsStr::to_str) {
            Some(extension) => format!("{stem}-{stamp}.{extension}"),
            None => format!("{stem}-{stamp}"),
        };
        self.filename.with_file_name(name)
    }

    fn stem(&self) -> String {
        self.filename
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, OpenFile> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open(&self, state: &mut OpenFile, date: Date) -> io::Result<()> {
        let path = self.dated_path(date);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        if let Some(mut previous) = state.file.replace(file) {
            previous.flush()?;
        }
        state.date = Some(date);
        state.path = Some(path);

        if self.max_files > 0 {
            self.prune();
        }
        Ok(())
    }

    /// Removes the oldest dated files beyond `max_files`.
    ///
    /// Removal failures are ignored; a file that cannot be deleted now is
    /// retried on the next rotation.
    fn prune(&self) {
        let directory = match self.filename.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let Ok(entries) = fs::read_dir(&directory) else {
            return;
        };

        let stem = self.stem();
        let extension = self
            .filename
            .extension()
            .map(|extension| extension.to_string_lossy().into_owned());

        let mut dated: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(OsStr::to_str)
                    .is_some_and(|name| is_dated_sibling(name, &stem, extension.as_deref()))
            })
            .collect();

        if dated.len() <= self.max_files {
            return;
        }

        // Date stamps sort lexically, newest first after the reverse.
        dated.sort_unstable_by(|a, b| b.cmp(a));
        for stale in &dated[self.max_files..] {
            let _ = fs::remove_file(stale);
        }
    }
}

fn is_dated_sibling(name: &str, stem: &str, extension: Option<&str>) -> bool {
    let Some(rest) = name.strip_prefix(stem).and_then(|rest| rest.strip_prefix('-')) else {
        return false;
    };
    let stamp = match extension {
        Some(extension) => match rest
            .strip_suffix(extension)
            .and_then(|rest| rest.strip_suffix('.'))
        {
            Some(stamp) => stamp,
            None => return false,
        },
        None => rest,
    };
    is_date_stamp(stamp)
}

fn is_date_stamp(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(index, byte)| match index {
            4 | 7 => *byte == b'-',
            _ => byte.is_ascii_digit(),
        })
}

impl Handler for RotatingFileHandler {
    fn is_handling(&self, level: Level) -> bool {
        level >= self.level
    }

    fn handle(&self, record: &Record) -> io::Result<()> {
        if !self.is_handling(record.level) {
            return Ok(());
        }

        let mut line = self.formatter.format(record);
        self.line_mode.terminate(&mut line);

        let date = record.datetime.date();
        let mut state = self.lock();
        if state.file.is_none() || state.date != Some(date) {
            self.open(&mut state, date)?;
        }

        match state.file.as_mut() {
            Some(file) => file.write_all(line.as_bytes()),
            None => Err(io::Error::other("log file is not open")),
        }
    }

    fn flush(&self) -> io::Result<()> {
        match self.lock().file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }

    fn kind(&self) -> &'static str {
        "rotating_file"
    }
}

impl fmt::Debug for RotatingFileHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotatingFileHandler")
            .field("filename", &self.filename)
            .field("max_files", &self.max_files)
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}
