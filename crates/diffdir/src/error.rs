use std::path::PathBuf;

use thiserror::Error;

/// Errors raised assembling, writing, reading, or applying a delta archive.
#[derive(Debug, Error)]
pub enum DiffDirError {
    /// An I/O failure reading or writing a real file at `path`.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The real filesystem path involved, when one is known.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// Translating a [`path::PathEntry`] to or from a tar header failed.
    #[error(transparent)]
    Tar(#[from] tarstream::TarError),

    /// A filesystem operation on the path model failed.
    #[error(transparent)]
    Path(#[from] path::PathError),

    /// The signature/delta engine failed to compute or apply a delta.
    #[error(transparent)]
    Rdiff(#[from] rdiff::RdiffError),

    /// A delta archive entry's name did not match any recognized framing
    /// prefix (`deleted/`, `snapshot/`, `diff/`, `multivol_diff/.../<n>`).
    #[error("unrecognized delta archive entry {name:?}")]
    UnrecognizedFrame {
        /// The offending raw tar entry name.
        name: String,
    },

    /// A `diff` record's basis was not a regular file — the rsync delta it
    /// carries cannot be reconstructed without basis bytes that actually
    /// correspond to it.
    #[error("cannot apply an rsync delta at {path}: basis is not a regular file")]
    DiffAgainstNonRegularBasis {
        /// The real path the delta targeted.
        path: PathBuf,
    },

    /// A `diff` record had no corresponding basis entry at all.
    #[error("cannot apply an rsync delta at {path}: no basis file exists")]
    DiffWithoutBasis {
        /// The real path the delta targeted.
        path: PathBuf,
    },
}
