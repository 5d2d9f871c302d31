use std::path::PathBuf;

use thiserror::Error;

/// Errors raised spawning, driving, or closing a cipher process, or writing
/// a volume.
#[derive(Debug, Error)]
pub enum VolumeError {
    /// Failed to spawn, write to, or read from the cipher subprocess.
    #[error("cipher process I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The cipher subprocess exited with a non-zero status.
    #[error("cipher process exited with {status}")]
    CipherProcessFailed {
        /// The process's reported exit status, when one was observed.
        status: std::process::ExitStatus,
    },

    /// `recipients` was non-empty for a decrypt direction, or `sign_key` was
    /// set without `recipients` — invalid combinations the cipher
    /// constructor rejects rather than passing to the subprocess.
    #[error("invalid cipher parameters: {reason}")]
    InvalidParams {
        /// Human-readable reason.
        reason: &'static str,
    },

    /// Stat'ing the target file to measure on-disk progress failed.
    #[error("could not stat volume file {path}: {source}")]
    Stat {
        /// The volume file path.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
}
