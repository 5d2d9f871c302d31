use std::path::PathBuf;

/// Errors raised building, parsing, or hashing a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// Two [`crate::VolumeInfo`] entries were added under the same volume
    /// number.
    #[error("volume {volume_number} already present in manifest")]
    DuplicateVolume {
        /// The repeated volume number.
        volume_number: u32,
    },

    /// A volume block's header line did not match `Volume <N>:`.
    #[error("bad volume header line: {line:?}")]
    BadVolumeHeader {
        /// The offending line.
        line: String,
    },

    /// A volume block was missing `StartingPath` or `EndingPath`.
    #[error("volume {volume_number} is missing its {field} field")]
    MissingField {
        /// The volume number whose block is incomplete.
        volume_number: u32,
        /// Which field was missing.
        field: &'static str,
    },

    /// An index token's `\xHH` escape was malformed.
    #[error("malformed escape in index token: {token:?}")]
    BadEscape {
        /// The offending token.
        token: String,
    },

    /// Failed to read a volume's payload while computing its hashes.
    #[error("failed to hash {path}: {source}")]
    Hash {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
