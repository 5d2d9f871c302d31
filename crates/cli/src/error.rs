//! The umbrella error every subcommand returns, composing each lower
//! crate's own error type. Only [`crate::main`] turns one of these into a
//! process exit; everywhere else it is propagated with `?`.

/// Anything that can go wrong while driving an engine operation to
/// completion.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A filesystem walk or stat failed in a way [`robust::is_benign`]
    /// does not excuse.
    #[error(transparent)]
    Walk(#[from] walk::WalkError),

    /// A path operation (stat, symlink, mknod, attribute application)
    /// failed.
    #[error(transparent)]
    Path(#[from] path::PathError),

    /// Signature or delta encoding/decoding failed.
    #[error(transparent)]
    Rdiff(#[from] rdiff::RdiffError),

    /// Diffing, patching, or archive framing failed.
    #[error(transparent)]
    DiffDir(#[from] diffdir::DiffDirError),

    /// Volume writing or the GPG cipher subprocess failed.
    #[error(transparent)]
    Volume(#[from] volume::VolumeError),

    /// Manifest parsing, rendering, or hashing failed.
    #[error(transparent)]
    Manifest(#[from] manifest::ManifestError),

    /// Assembling backup or signature chains failed, or no chain covers
    /// the requested restore time.
    #[error(transparent)]
    Collections(#[from] collections::CollectionsError),

    /// The session configuration was invalid.
    #[error(transparent)]
    Session(#[from] session::SessionConfigError),

    /// A backend `put`/`get`/`list`/`delete` call failed.
    #[error(transparent)]
    Backend(#[from] backend::BackendError),

    /// Something about the request itself makes it impossible to satisfy,
    /// independent of any lower crate: an empty archive directory, a
    /// restore time with no covering chain resolved before `collections`
    /// is even consulted, a `verify` mismatch, and the like.
    #[error("{0}")]
    Message(String),
}

impl EngineError {
    /// Builds a [`EngineError::Message`] from a `format!`-style message.
    pub fn message(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }
}
