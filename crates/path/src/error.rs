use thiserror::Error;

/// Errors raised by the path model: stat failures, unrecognized or
/// unsupported entry types, and malformed tar-derived metadata.
///
/// Per §7 of the engine's error handling design, every variant here is a
/// `path_error`: benign from the pipeline's point of view (skip the record,
/// warn), never fatal on its own.
#[derive(Debug, Error)]
pub enum PathError {
    /// The underlying filesystem call failed.
    #[error("stat failed for {path}: {source}")]
    Stat {
        /// Path that could not be stat'ed.
        path: std::path::PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// A `libc` stat mode did not correspond to any known entry type.
    #[error("unknown file type for {path}")]
    UnknownType {
        /// Offending path.
        path: std::path::PathBuf,
    },

    /// Hard links are not supported; a `LNKTYPE` tar entry was decoded.
    #[error("hard links are not supported (index {index})")]
    HardLinkUnsupported {
        /// Display form of the index the hard link entry was found at.
        index: String,
    },

    /// A tar header could not be translated into a path entry.
    #[error("malformed tar header for {index}: {reason}")]
    BadTarHeader {
        /// Display form of the offending index.
        index: String,
        /// Human-readable reason.
        reason: String,
    },

    /// An attribute-copy or write operation failed.
    #[error("operation on {path} failed: {source}")]
    Io {
        /// Path the operation targeted.
        path: std::path::PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
}

impl PathError {
    /// The raw `errno`, if this error wraps a syscall failure.
    #[must_use]
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Stat { source, .. } | Self::Io { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }
}
