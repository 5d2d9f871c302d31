use std::fmt;

use crate::level::LogLevel;

/// A message logged via [`Logger::fatal`], carried as a typed value so a
/// caller's umbrella error type can wrap it with `#[from]` rather than
/// inspecting a string.
#[derive(Debug, Clone)]
pub struct Fatal(pub String);

impl fmt::Display for Fatal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Fatal {}

/// Generalizes the original's `duplicity.log.Log`/`FatalError` pair: a
/// session logs through this trait rather than through free functions over
/// hidden global state.
pub trait Logger: Send + Sync {
    /// Emits `message` at `level`.
    fn log(&self, level: LogLevel, message: &str);

    /// Logs `message` at [`LogLevel::Error`] and returns a [`Fatal`] for
    /// the caller to propagate (via `?` or an umbrella error's `#[from]`)
    /// up to the process boundary.
    fn fatal(&self, message: &str) -> Fatal {
        self.log(LogLevel::Error, message);
        Fatal(message.to_string())
    }
}

impl<T: Logger + ?Sized> Logger for std::sync::Arc<T> {
    fn log(&self, level: LogLevel, message: &str) {
        (**self).log(level, message);
    }
}

/// The default [`Logger`]: emits every message through `tracing::event!` at
/// a level derived from [`LogLevel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Error => tracing::error!("{message}"),
            LogLevel::Warn => tracing::warn!("{message}"),
            LogLevel::Info => tracing::info!("{message}"),
            LogLevel::Debug => tracing::debug!("{message}"),
            LogLevel::Trace => tracing::trace!("{message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_carries_the_message() {
        let logger = TracingLogger;
        let fatal = logger.fatal("manifest is corrupt");
        assert_eq!(fatal.0, "manifest is corrupt");
        assert_eq!(fatal.to_string(), "manifest is corrupt");
    }
}
