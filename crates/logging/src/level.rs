/// Severity of a logged message, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// An operation failed outright.
    Error,
    /// A benign condition a caller chose to continue past.
    Warn,
    /// Session-level milestones: chain assembly, volume boundaries.
    Info,
    /// Per-file or per-block detail.
    Debug,
    /// Wire- and block-level tracing.
    Trace,
}

impl LogLevel {
    /// Maps a numeric verbosity (0 = quietest) to the level it should
    /// enable, mirroring the original's "higher means more verbose" scale
    /// with `termverbosity` as the comparison threshold: 0–2 map to
    /// `Error`/`Warn`, 3 to `Info`, 4 to `Debug`, 5 and above to `Trace`.
    #[must_use]
    pub fn from_verbosity(verbosity: u8) -> Self {
        match verbosity {
            0 => LogLevel::Error,
            1..=2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}
