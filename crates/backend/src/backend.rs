use std::path::Path;

use crate::error::BackendError;

/// Where and how backup files are stored, independent of the engine that
/// produces them.
///
/// Mirrors `backends.py`'s `Backend` base class: `put`/`get`/`list`/
/// `delete`, with errors surfaced through a single [`BackendError`] kind
/// rather than per-transport exception hierarchies.
pub trait Backend: Send + Sync {
    /// Copies `local_path` to the backend, named `remote_name` if given,
    /// otherwise the local file's own name.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the transfer fails.
    fn put(&self, local_path: &Path, remote_name: Option<&str>) -> Result<(), BackendError>;

    /// Copies `remote_name` from the backend to `local_path`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the transfer fails.
    fn get(&self, remote_name: &str, local_path: &Path) -> Result<(), BackendError>;

    /// Lists every filename currently stored on the backend.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the listing fails.
    fn list(&self) -> Result<Vec<String>, BackendError>;

    /// Deletes every filename in `names`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if any deletion fails; earlier, already-applied
    /// deletions in the same call are not rolled back.
    fn delete(&self, names: &[String]) -> Result<(), BackendError>;
}
