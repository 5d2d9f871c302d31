//! The types a diff pass produces and a patch pass consumes.

use path::{Index, PathEntry};
use rdiff::{Delta, Signature};

use crate::collate::Indexed;

/// What kind of change a [`DeltaRecord`] instructs the patch side to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffType {
    /// The entry present in the old tree no longer exists.
    Deleted,
    /// Replace the entry wholesale: new path, a type change, or any
    /// non-regular content (directories, symlinks, fifos, devices).
    Snapshot,
    /// Apply an rsync delta to the existing regular file.
    Diff,
}

/// The content half of a [`DeltaRecord`].
#[derive(Debug, Clone)]
pub enum DeltaPayload {
    /// No payload: deletions, and snapshots of entries with no content of
    /// their own (directories, symlinks, fifos, sockets, devices).
    None,
    /// Full content of a new or replaced regular file.
    Bytes(Vec<u8>),
    /// An rsync delta against the basis file.
    Diff(Delta),
}

/// One instruction in a delta stream: "at this index, do this".
#[derive(Debug, Clone)]
pub struct DeltaRecord {
    /// The affected index.
    pub index: Index,
    /// What kind of change this is.
    pub difftype: DiffType,
    /// The new entry's kind and attributes; `None` only for `Deleted`.
    pub new_entry: Option<PathEntry>,
    /// The change's content, if any.
    pub payload: DeltaPayload,
    /// This index's signature after the change, for regular files — lets a
    /// session assemble its next signature archive straight from the delta
    /// stream instead of re-reading every changed file a second time.
    pub next_signature: Option<Signature>,
}

impl Indexed for DeltaRecord {
    fn index(&self) -> &Index {
        &self.index
    }
}

/// One entry from a previous session's signature archive: the recorded
/// kind/attributes, plus the signature when it was a regular file.
#[derive(Debug, Clone)]
pub struct SigEntry {
    /// The recorded entry, as of the previous session.
    pub entry: PathEntry,
    /// The previous signature, present iff `entry` was a regular file.
    pub signature: Option<Signature>,
}

impl Indexed for SigEntry {
    fn index(&self) -> &Index {
        &self.entry.index
    }
}

/// Either a change worth recording in the delta archive, or a path that
/// carried forward unchanged — emitted by [`crate::diff::DiffIter`] so a
/// caller can assemble the next signature archive from every surviving
/// path, not only the ones that changed.
#[derive(Debug, Clone)]
pub enum DiffStep {
    /// A change to record in the delta archive.
    Change(DeltaRecord),
    /// A path whose new state equals its previous signature-side state
    /// (per [`PathEntry::matches`]): no delta record, but still present in
    /// the next signature archive.
    Unchanged {
        /// The entry, observed on the live tree.
        entry: PathEntry,
        /// The previous signature, carried forward untouched.
        signature: Option<Signature>,
    },
}

impl DiffStep {
    /// This step's index.
    #[must_use]
    pub fn index(&self) -> &Index {
        match self {
            DiffStep::Change(record) => &record.index,
            DiffStep::Unchanged { entry, .. } => &entry.index,
        }
    }
}
