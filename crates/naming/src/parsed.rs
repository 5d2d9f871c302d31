//! The parsed representation of a remote backup filename.

use time::OffsetDateTime;

use crate::kind::FileKind;

/// Either a single timestamp (full sets and signature archives) or a
/// `(start, end)` pair (incremental sets and new-signature archives),
/// matching how each kind of artifact is stamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupTime {
    /// The one timestamp a full set or full-signature archive carries.
    Single(OffsetDateTime),
    /// The range an incremental set or new-signature archive carries:
    /// `start` is the chain position it extends, `end` is its own.
    Range {
        /// Start of the covered range.
        start: OffsetDateTime,
        /// End of the covered range.
        end: OffsetDateTime,
    },
}

impl BackupTime {
    /// The chain-extension point: `start` for a range, the single
    /// timestamp otherwise.
    #[must_use]
    pub fn start(self) -> OffsetDateTime {
        match self {
            Self::Single(t) | Self::Range { start: t, .. } => t,
        }
    }

    /// The time that orders this artifact among others of its chain: `end`
    /// for a range, the single timestamp otherwise.
    #[must_use]
    pub fn end(self) -> OffsetDateTime {
        match self {
            Self::Single(t) | Self::Range { end: t, .. } => t,
        }
    }
}

/// A remote backup filename's structure, as produced by
/// [`crate::parse_filename`] or consumed by [`crate::format_filename`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedFilename {
    /// What kind of artifact this filename names.
    pub kind: FileKind,
    /// The timestamp(s) this artifact is stamped with.
    pub when: BackupTime,
    /// The volume number, present iff `kind.is_volume()`.
    pub volume_number: Option<u32>,
    /// Whether the filename carries a trailing `.gpg` extension.
    pub encrypted: bool,
}
