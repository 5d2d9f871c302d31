use std::path::PathBuf;

use crate::index::Index;

/// Which kind of device special file an entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// Character device.
    Char,
    /// Block device.
    Block,
}

/// A tagged sum over every filesystem entry type the engine recognizes,
/// including the first-class `Absent` variant used on the signature side to
/// represent a deletion.
///
/// This replaces the source's runtime string tag (`"reg"`, `"dir"`, ...)
/// with an exhaustive match, per the REDESIGN FLAGS in the engine's design
/// notes: equality and tar translation become exhaustive matches instead of
/// string comparisons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file of the given size in bytes.
    Regular {
        /// Size in bytes. Ignored by equality — sig-side entries only ever
        /// store a signature, not a size, so comparing sizes would compare
        /// apples to oranges.
        size: u64,
    },
    /// Directory.
    Directory,
    /// Symbolic link pointing at `target`.
    Symlink {
        /// Raw link target, as returned by `readlink`.
        target: PathBuf,
    },
    /// Named pipe.
    Fifo,
    /// Unix domain socket.
    Socket,
    /// Device special file.
    Device {
        /// Major device number.
        major: u32,
        /// Minor device number.
        minor: u32,
        /// Character or block.
        kind: DeviceKind,
    },
    /// No entry exists at this index. A sig-side `Absent` entry paired
    /// against a present new-side entry produces a `snapshot` delta record;
    /// the reverse produces a `deleted` record.
    Absent,
}

/// Ownership, permission and timestamp bits shared by every non-absent
/// entry kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attrs {
    /// Permission bits (the low 12 bits of `st_mode`, i.e. `S_IMODE`).
    pub mode: u32,
    /// Owning user id.
    pub uid: u32,
    /// Owning group id.
    pub gid: u32,
    /// Modification time, seconds since the Unix epoch.
    pub mtime: i64,
}

/// A single entry in a directory tree: its position (`index`), its kind,
/// and — unless `kind` is `Absent` — its attributes.
///
/// May represent a real, on-disk path (constructed via [`PathEntry::from_metadata`])
/// or a read-only entry materialized from a tar header or synthesized while
/// diffing; only explicit write operations (elsewhere in the engine) ever
/// touch disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    /// This entry's position in the tree.
    pub index: Index,
    /// The entry's type and type-specific data.
    pub kind: EntryKind,
    /// Ownership/permission/timestamp bits, absent iff `kind` is `Absent`.
    pub attrs: Option<Attrs>,
}

impl PathEntry {
    /// Builds an `Absent` entry at `index`, representing "nothing here".
    #[must_use]
    pub fn absent(index: Index) -> Self {
        Self {
            index,
            kind: EntryKind::Absent,
            attrs: None,
        }
    }

    /// `true` if `kind` is `Absent`.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self.kind, EntryKind::Absent)
    }

    /// `true` if `kind` is `Regular`.
    #[must_use]
    pub fn is_regular(&self) -> bool {
        matches!(self.kind, EntryKind::Regular { .. })
    }

    /// `true` if `kind` is `Directory`.
    #[must_use]
    pub fn is_directory(&self) -> bool {
        matches!(self.kind, EntryKind::Directory)
    }

    /// `true` if `kind` is `Symlink`.
    #[must_use]
    pub fn is_symlink(&self) -> bool {
        matches!(self.kind, EntryKind::Symlink { .. })
    }

    /// Size in bytes, for regular entries only.
    #[must_use]
    pub fn size(&self) -> Option<u64> {
        match self.kind {
            EntryKind::Regular { size } => Some(size),
            _ => None,
        }
    }

    /// Returns `true` iff `self` and `other` are §3-equal: same type, and
    /// per-type the fields the spec designates as significant.
    ///
    /// Regular-file equality deliberately ignores `size`: the sig side only
    /// ever holds a signature, never the file's length, so comparing sizes
    /// would compare unrelated quantities. Content is likewise never
    /// compared here — that is what the rsync delta stream is for.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (EntryKind::Absent, EntryKind::Absent) => true,
            (EntryKind::Regular { .. }, EntryKind::Regular { .. }) => {
                perms_equal(self.attrs, other.attrs) && mtime_equal(self.attrs, other.attrs)
            }
            (EntryKind::Directory, EntryKind::Directory)
            | (EntryKind::Fifo, EntryKind::Fifo) => perms_equal(self.attrs, other.attrs),
            (EntryKind::Symlink { target: a }, EntryKind::Symlink { target: b }) => a == b,
            (EntryKind::Socket, EntryKind::Socket) => true,
            (
                EntryKind::Device {
                    major: ma,
                    minor: mi,
                    kind: ka,
                },
                EntryKind::Device {
                    major: mb,
                    minor: ni,
                    kind: kb,
                },
            ) => perms_equal(self.attrs, other.attrs) && ma == mb && mi == ni && ka == kb,
            _ => false,
        }
    }
}

fn perms_equal(a: Option<Attrs>, b: Option<Attrs>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.mode == b.mode && a.uid == b.uid && a.gid == b.gid,
        _ => false,
    }
}

fn mtime_equal(a: Option<Attrs>, b: Option<Attrs>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a.mtime == b.mtime)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(mode: u32, uid: u32, gid: u32, mtime: i64) -> Attrs {
        Attrs {
            mode,
            uid,
            gid,
            mtime,
        }
    }

    fn regular(size: u64, a: Attrs) -> PathEntry {
        PathEntry {
            index: Index::root().join("f"),
            kind: EntryKind::Regular { size },
            attrs: Some(a),
        }
    }

    #[test]
    fn regular_equality_ignores_size() {
        let a = regular(100, attrs(0o644, 1, 1, 1000));
        let b = regular(9999, attrs(0o644, 1, 1, 1000));
        assert!(a.matches(&b));
    }

    #[test]
    fn regular_equality_requires_matching_mtime() {
        let a = regular(100, attrs(0o644, 1, 1, 1000));
        let b = regular(100, attrs(0o644, 1, 1, 1001));
        assert!(!a.matches(&b));
    }

    #[test]
    fn absent_entries_always_match() {
        let a = PathEntry::absent(Index::root().join("gone"));
        let b = PathEntry::absent(Index::root().join("gone"));
        assert!(a.matches(&b));
    }

    #[test]
    fn absent_never_matches_present() {
        let a = PathEntry::absent(Index::root());
        let b = regular(0, attrs(0o644, 0, 0, 0));
        assert!(!a.matches(&b));
        assert!(!b.matches(&a));
    }

    #[test]
    fn symlink_equality_is_target_only_ignoring_mtime() {
        let mk = |target: &str, mtime: i64| PathEntry {
            index: Index::root().join("l"),
            kind: EntryKind::Symlink {
                target: PathBuf::from(target),
            },
            attrs: Some(attrs(0o777, 0, 0, mtime)),
        };
        assert!(mk("../x", 1).matches(&mk("../x", 999)));
        assert!(!mk("../x", 1).matches(&mk("../y", 1)));
    }

    #[test]
    fn device_equality_requires_matching_major_minor_and_kind() {
        let mk = |major: u32, minor: u32, kind: DeviceKind| PathEntry {
            index: Index::root().join("d"),
            kind: EntryKind::Device { major, minor, kind },
            attrs: Some(attrs(0o600, 0, 0, 0)),
        };
        assert!(mk(8, 1, DeviceKind::Block).matches(&mk(8, 1, DeviceKind::Block)));
        assert!(!mk(8, 1, DeviceKind::Block).matches(&mk(8, 2, DeviceKind::Block)));
        assert!(!mk(8, 1, DeviceKind::Block).matches(&mk(8, 1, DeviceKind::Char)));
    }

    #[test]
    fn directory_equality_ignores_mtime() {
        let mk = |mtime: i64| PathEntry {
            index: Index::root().join("d"),
            kind: EntryKind::Directory,
            attrs: Some(attrs(0o755, 0, 0, mtime)),
        };
        assert!(mk(1).matches(&mk(2)));
    }

    #[test]
    fn different_kinds_never_match() {
        let dir = PathEntry {
            index: Index::root(),
            kind: EntryKind::Directory,
            attrs: Some(attrs(0o755, 0, 0, 0)),
        };
        let fifo = PathEntry {
            index: Index::root(),
            kind: EntryKind::Fifo,
            attrs: Some(attrs(0o755, 0, 0, 0)),
        };
        assert!(!dir.matches(&fifo));
    }
}
