/// Controls whether a handler appends a trailing newline after each formatted record.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LineMode {
    /// Append a newline terminator after each record.
    #[default]
    WithNewline,
    /// Write the formatted record as is.
    WithoutNewline,
}

impl LineMode {
    /// Reports whether the mode appends a trailing newline.
    ///
    /// # Examples
    ///
    /// ```
    /// use logging_sink::LineMode;
    ///
    /// assert!(LineMode::WithNewline.append_newline());
    /// assert!(!LineMode::WithoutNewline.append_newline());
    /// ```
    #[must_use]
    pub const fn append_newline(self) -> bool {
        matches!(self, Self::WithNewline)
    }

    /// Terminates a formatted record according to the mode.
    ///
    /// With [`LineMode::WithNewline`], trailing line breaks already present
    /// in `line` (for example from a message ending in `\n`) are collapsed so
    /// every record occupies exactly one terminated line. With
    /// [`LineMode::WithoutNewline`] the text is left untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use logging_sink::LineMode;
    ///
    /// let mut line = String::from("disk full\r\n\n");
    /// LineMode::WithNewline.terminate(&mut line);
    /// assert_eq!(line, "disk full\n");
    ///
    /// let mut line = String::from("partial");
    /// LineMode::WithoutNewline.terminate(&mut line);
    /// assert_eq!(line, "partial");
    /// ```
    pub fn terminate(self, line: &mut String) {
        if !self.append_newline() {
            return;
        }
        let kept = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(kept);
        line.push('\n');
    }
}

impl From<bool> for LineMode {
    /// `true` selects [`LineMode::WithNewline`], `false` selects [`LineMode::WithoutNewline`].
    fn from(append_newline: bool) -> Self {
        if append_newline {
            Self::WithNewline
        } else {
            Self::WithoutNewline
        }
    }
}

impl From<LineMode> for bool {
    fn from(mode: LineMode) -> Self {
        mode.append_newline()
    }
}
