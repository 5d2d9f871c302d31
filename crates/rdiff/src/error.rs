use thiserror::Error;

/// Errors raised by signature generation, delta computation, or patch
/// application.
#[derive(Debug, Error)]
pub enum RdiffError {
    /// Underlying I/O failure reading a basis or new-file stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A signature was requested with a zero block length.
    #[error("block length must be non-zero")]
    ZeroBlockLength,

    /// A delta referenced a block index the signature does not have.
    #[error("delta references out-of-range block index {index}")]
    InvalidBlockIndex {
        /// The offending index.
        index: u64,
    },

    /// A serialized signature or delta stream ended mid-record or carried
    /// an unrecognized opcode.
    #[error("malformed rdiff stream: {reason}")]
    Malformed {
        /// What was wrong with the stream.
        reason: &'static str,
    },
}
