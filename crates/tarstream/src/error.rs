use thiserror::Error;

/// Errors raised translating between [`path::PathEntry`] and tar headers,
/// or while driving the underlying tar stream.
#[derive(Debug, Error)]
pub enum TarError {
    /// Underlying tar/IO failure.
    #[error("tar I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A `LNKTYPE` (hard link) entry was decoded. Hard links are not
    /// supported by this engine.
    #[error("hard links are not supported (entry {name:?})")]
    HardLink {
        /// Raw tar entry name.
        name: String,
    },

    /// The entry's tar type byte did not correspond to any type this
    /// engine recognizes.
    #[error("unrecognized tar entry type for {name:?}")]
    UnknownType {
        /// Raw tar entry name.
        name: String,
    },

    /// A `PathEntry` kind ustar cannot represent (sockets have no ustar
    /// type byte).
    #[error("{kind} entries cannot be represented in a ustar archive")]
    UnsupportedEntryKind {
        /// Human-readable kind name.
        kind: &'static str,
    },

    /// A symlink target or path was too long for a ustar header field.
    #[error("path too long for ustar header: {path}")]
    PathTooLong {
        /// The offending path or link target.
        path: String,
    },
}
