use std::path::PathBuf;

use logging::{Logger, TracingLogger};
use time::OffsetDateTime;
use volume::CipherParams;

use crate::error::SessionConfigError;

/// Separator characters the naming grammar reserves for itself; rejected
/// as a [`SessionConfigBuilder::time_separator`] choice.
const RESERVED_SEPARATORS: [char; 3] = ['.', '+', '-'];

/// Everything the original threaded through `duplicity.globals`, gathered
/// into one immutable value built once by the CLI entry point (or a test)
/// and passed by shared reference into every call site that needs it.
///
/// Construction validates invariants the original left implicit — see
/// [`SessionConfigBuilder::build`].
pub struct SessionConfig {
    verbosity: u8,
    archive_dir: PathBuf,
    current_time: OffsetDateTime,
    restore_time: Option<OffsetDateTime>,
    time_separator: char,
    volume_size: u64,
    cipher_params: CipherParams,
    logger: Box<dyn Logger>,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("verbosity", &self.verbosity)
            .field("archive_dir", &self.archive_dir)
            .field("current_time", &self.current_time)
            .field("restore_time", &self.restore_time)
            .field("time_separator", &self.time_separator)
            .field("volume_size", &self.volume_size)
            .finish_non_exhaustive()
    }
}

impl SessionConfig {
    /// Starts a [`SessionConfigBuilder`] with the same defaults the
    /// original applies before argument parsing overrides them: verbosity
    /// 3 (`Info`), `current_time` set to `now`, no `restore_time` (restore
    /// the latest chain), `:` as the time separator, and
    /// [`volume::DEFAULT_VOLUME_SIZE`].
    #[must_use]
    pub fn builder(archive_dir: impl Into<PathBuf>, current_time: OffsetDateTime) -> SessionConfigBuilder {
        SessionConfigBuilder {
            verbosity: 3,
            archive_dir: archive_dir.into(),
            current_time,
            restore_time: None,
            time_separator: ':',
            volume_size: volume::DEFAULT_VOLUME_SIZE,
            cipher_params: CipherParams::default(),
            logger: None,
        }
    }

    /// Terminal verbosity, 0 (quietest) upward. Drives [`logging::LogLevel::from_verbosity`].
    #[must_use]
    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    /// Where local signature archives and other session-local metadata live.
    #[must_use]
    pub fn archive_dir(&self) -> &std::path::Path {
        &self.archive_dir
    }

    /// The time this session considers "now" — used to stamp new backup
    /// filenames. Threaded explicitly rather than read from the system
    /// clock everywhere so a test can hold it fixed.
    #[must_use]
    pub fn current_time(&self) -> OffsetDateTime {
        self.current_time
    }

    /// The time a restore should reconstruct the tree as of, if set.
    /// `None` means "the latest available chain".
    #[must_use]
    pub fn restore_time(&self) -> Option<OffsetDateTime> {
        self.restore_time
    }

    /// The delimiter used between the hour/minute/second fields of a
    /// formatted filename timestamp.
    #[must_use]
    pub fn time_separator(&self) -> char {
        self.time_separator
    }

    /// The target size, in bytes, of each volume.
    #[must_use]
    pub fn volume_size(&self) -> u64 {
        self.volume_size
    }

    /// Encryption parameters passed to the volume writer's cipher stream.
    #[must_use]
    pub fn cipher_params(&self) -> &CipherParams {
        &self.cipher_params
    }

    /// The session's logger.
    #[must_use]
    pub fn logger(&self) -> &dyn Logger {
        self.logger.as_ref()
    }
}

/// Builds a [`SessionConfig`], validating invariants construction left
/// implicit in the original.
pub struct SessionConfigBuilder {
    verbosity: u8,
    archive_dir: PathBuf,
    current_time: OffsetDateTime,
    restore_time: Option<OffsetDateTime>,
    time_separator: char,
    volume_size: u64,
    cipher_params: CipherParams,
    logger: Option<Box<dyn Logger>>,
}

impl SessionConfigBuilder {
    /// Sets the terminal verbosity.
    #[must_use]
    pub fn verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Sets the time a restore should target.
    #[must_use]
    pub fn restore_time(mut self, restore_time: OffsetDateTime) -> Self {
        self.restore_time = Some(restore_time);
        self
    }

    /// Overrides the default `:` time separator.
    #[must_use]
    pub fn time_separator(mut self, sep: char) -> Self {
        self.time_separator = sep;
        self
    }

    /// Overrides the default volume size, in bytes.
    #[must_use]
    pub fn volume_size(mut self, volume_size: u64) -> Self {
        self.volume_size = volume_size;
        self
    }

    /// Sets the encryption parameters passed to the volume writer.
    #[must_use]
    pub fn cipher_params(mut self, cipher_params: CipherParams) -> Self {
        self.cipher_params = cipher_params;
        self
    }

    /// Overrides the default [`TracingLogger`].
    #[must_use]
    pub fn logger(mut self, logger: Box<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Validates and produces the [`SessionConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionConfigError::BadTimeSeparator`] if the separator is
    /// `.`, `+`, or `-` (these collide with the naming grammar's own
    /// delimiters); [`SessionConfigError::ZeroVolumeSize`] if the volume
    /// size is zero; [`SessionConfigError::RestoreTimeAfterCurrentTime`] if
    /// `restore_time` is set later than `current_time`.
    pub fn build(self) -> Result<SessionConfig, SessionConfigError> {
        if RESERVED_SEPARATORS.contains(&self.time_separator) {
            return Err(SessionConfigError::BadTimeSeparator(self.time_separator));
        }
        if self.volume_size == 0 {
            return Err(SessionConfigError::ZeroVolumeSize);
        }
        if let Some(restore_time) = self.restore_time {
            if restore_time > self.current_time {
                return Err(SessionConfigError::RestoreTimeAfterCurrentTime);
            }
        }

        Ok(SessionConfig {
            verbosity: self.verbosity,
            archive_dir: self.archive_dir,
            current_time: self.current_time,
            restore_time: self.restore_time,
            time_separator: self.time_separator,
            volume_size: self.volume_size,
            cipher_params: self.cipher_params,
            logger: self.logger.unwrap_or_else(|| Box::new(TracingLogger)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_time() -> OffsetDateTime {
        use time::{Date, Month, PrimitiveDateTime, Time};
        let date = Date::from_calendar_date(2026, Month::July, 29).unwrap();
        let time = Time::from_hms(0, 0, 0).unwrap();
        PrimitiveDateTime::new(date, time).assume_utc()
    }

    #[test]
    fn defaults_build_successfully() {
        let config = SessionConfig::builder("/var/backups/archive", sample_time())
            .build()
            .unwrap();
        assert_eq!(config.time_separator(), ':');
        assert_eq!(config.volume_size(), volume::DEFAULT_VOLUME_SIZE);
        assert_eq!(config.verbosity(), 3);
    }

    #[test]
    fn rejects_reserved_time_separators() {
        for sep in ['.', '+', '-'] {
            let err = SessionConfig::builder("/tmp/archive", sample_time())
                .time_separator(sep)
                .build()
                .unwrap_err();
            assert!(matches!(err, SessionConfigError::BadTimeSeparator(s) if s == sep));
        }
    }

    #[test]
    fn rejects_zero_volume_size() {
        let err = SessionConfig::builder("/tmp/archive", sample_time())
            .volume_size(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, SessionConfigError::ZeroVolumeSize));
    }

    #[test]
    fn rejects_restore_time_after_current_time() {
        let current = sample_time();
        let later = current + time::Duration::days(1);
        let err = SessionConfig::builder("/tmp/archive", current)
            .restore_time(later)
            .build()
            .unwrap_err();
        assert!(matches!(err, SessionConfigError::RestoreTimeAfterCurrentTime));
    }

    #[test]
    fn custom_logger_is_used() {
        let logger = std::sync::Arc::new(logging::CapturingLogger::new());
        let config = SessionConfig::builder("/tmp/archive", sample_time())
            .logger(Box::new(logger.clone()))
            .build()
            .unwrap();
        config.logger().log(logging::LogLevel::Info, "hello");
        assert_eq!(logger.events(), vec![(logging::LogLevel::Info, "hello".to_string())]);
    }
}
