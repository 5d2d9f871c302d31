/// Errors raised validating a [`crate::SessionConfigBuilder`].
#[derive(Debug, thiserror::Error)]
pub enum SessionConfigError {
    /// The time separator was empty, or one of the characters that would
    /// collide with the naming grammar's own ISO-8601-ish delimiters
    /// (`.` separates filename fields, `+`/`-` introduce a UTC offset).
    #[error("time separator {0:?} is not usable (must be a single character, not one of '.', '+', '-')")]
    BadTimeSeparator(char),

    /// The requested volume size was zero.
    #[error("volume size must be greater than zero")]
    ZeroVolumeSize,

    /// `restore_time` was set to a time strictly before the epoch of
    /// `current_time`'s corresponding backup — callers should not need to
    /// construct a config for a restore that precedes any reachable chain.
    #[error("restore_time must not be later than current_time")]
    RestoreTimeAfterCurrentTime,
}
