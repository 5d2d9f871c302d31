//! Conversion between [`path::PathEntry`] and [`tar::Header`].
//!
//! Grounded on `path.py`'s `ROPath.init_from_tarinfo`/`get_tarinfo`: the
//! same type-by-type mapping, the same refusal to translate hard links or
//! sockets, just as an exhaustive match over [`EntryKind`] instead of a
//! chain of `isreg()`/`isdir()`/... predicates and a string `type` field.

use tar::{EntryType, Header};

use path::{Attrs, DeviceKind, EntryKind, PathEntry};

use crate::error::TarError;
use crate::naming::{index_to_tar_name, tar_name_to_index};

/// Builds a ustar header for `entry`, using its index (with a trailing `/`
/// for directories) as the entry name.
///
/// # Errors
///
/// Returns [`TarError::UnsupportedEntryKind`] for `Socket` and `Absent`
/// entries — sockets have no ustar type byte, and an absent entry has
/// nothing to archive. Returns [`TarError::PathTooLong`] if the name or
/// symlink target overflows the ustar header's fixed-width fields.
pub fn path_entry_to_header(entry: &PathEntry) -> Result<Header, TarError> {
    let mut header = Header::new_ustar();
    let name = index_to_tar_name(&entry.index, entry.is_directory());
    header
        .set_path(&name)
        .map_err(|_| TarError::PathTooLong { path: name.clone() })?;

    match &entry.kind {
        EntryKind::Regular { size } => {
            header.set_entry_type(EntryType::Regular);
            header.set_size(*size);
        }
        EntryKind::Directory => {
            header.set_entry_type(EntryType::Directory);
            header.set_size(0);
        }
        EntryKind::Symlink { target } => {
            header.set_entry_type(EntryType::Symlink);
            header.set_size(0);
            header.set_link_name(target).map_err(|_| TarError::PathTooLong {
                path: target.to_string_lossy().into_owned(),
            })?;
        }
        EntryKind::Fifo => {
            header.set_entry_type(EntryType::Fifo);
            header.set_size(0);
        }
        EntryKind::Socket => {
            return Err(TarError::UnsupportedEntryKind { kind: "socket" });
        }
        EntryKind::Device { major, minor, kind } => {
            header.set_entry_type(match kind {
                DeviceKind::Char => EntryType::Char,
                DeviceKind::Block => EntryType::Block,
            });
            header.set_size(0);
            header.set_device_major(*major).map_err(TarError::Io)?;
            header.set_device_minor(*minor).map_err(TarError::Io)?;
        }
        EntryKind::Absent => {
            return Err(TarError::UnsupportedEntryKind { kind: "absent" });
        }
    }

    if let Some(attrs) = entry.attrs {
        header.set_mode(attrs.mode);
        header.set_uid(u64::from(attrs.uid));
        header.set_gid(u64::from(attrs.gid));
        header.set_mtime(attrs.mtime.max(0) as u64);
    }

    header.set_cksum();
    Ok(header)
}

/// Recovers a [`PathEntry`] from a decoded tar `name`/header pair.
///
/// # Errors
///
/// Returns [`TarError::HardLink`] for `LNKTYPE` entries — this engine does
/// not support hard links, matching `init_from_tarinfo`'s refusal to decode
/// them. Returns [`TarError::UnknownType`] for any tar entry type with no
/// corresponding [`EntryKind`] (pax headers, GNU long-name continuations,
/// and anything else `path.py`'s `get_tarinfo`/`init_from_tarinfo` falls
/// through to its `else: raise` branch for).
pub fn header_to_path_entry(name: &str, header: &Header) -> Result<PathEntry, TarError> {
    let index = tar_name_to_index(name);
    let entry_type = header.entry_type();

    if entry_type == EntryType::Link {
        return Err(TarError::HardLink {
            name: name.to_string(),
        });
    }

    let kind = match entry_type {
        EntryType::Regular | EntryType::Continuous => EntryKind::Regular {
            size: header.size().map_err(TarError::Io)?,
        },
        EntryType::Directory => EntryKind::Directory,
        EntryType::Symlink => {
            let target = header
                .link_name()
                .map_err(TarError::Io)?
                .map(std::borrow::Cow::into_owned)
                .unwrap_or_default();
            EntryKind::Symlink { target }
        }
        EntryType::Fifo => EntryKind::Fifo,
        EntryType::Char => EntryKind::Device {
            major: header.device_major().map_err(TarError::Io)?.unwrap_or(0),
            minor: header.device_minor().map_err(TarError::Io)?.unwrap_or(0),
            kind: DeviceKind::Char,
        },
        EntryType::Block => EntryKind::Device {
            major: header.device_major().map_err(TarError::Io)?.unwrap_or(0),
            minor: header.device_minor().map_err(TarError::Io)?.unwrap_or(0),
            kind: DeviceKind::Block,
        },
        _ => {
            return Err(TarError::UnknownType {
                name: name.to_string(),
            });
        }
    };

    let attrs = Some(Attrs {
        mode: header.mode().map_err(TarError::Io)?,
        uid: u32::try_from(header.uid().map_err(TarError::Io)?).unwrap_or(u32::MAX),
        gid: u32::try_from(header.gid().map_err(TarError::Io)?).unwrap_or(u32::MAX),
        mtime: i64::try_from(header.mtime().map_err(TarError::Io)?).unwrap_or(i64::MAX),
    });

    Ok(PathEntry { index, kind, attrs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use path::Index;
    use std::path::PathBuf;

    fn attrs() -> Attrs {
        Attrs {
            mode: 0o644,
            uid: 1000,
            gid: 1000,
            mtime: 1_700_000_000,
        }
    }

    #[test]
    fn regular_entry_round_trips() {
        let entry = PathEntry {
            index: Index::root().join("f"),
            kind: EntryKind::Regular { size: 42 },
            attrs: Some(attrs()),
        };
        let header = path_entry_to_header(&entry).unwrap();
        let name = index_to_tar_name(&entry.index, false);
        let back = header_to_path_entry(&name, &header).unwrap();
        assert_eq!(back.index, entry.index);
        assert_eq!(back.kind, EntryKind::Regular { size: 42 });
        assert_eq!(back.attrs.unwrap().mode, 0o644);
        assert_eq!(back.attrs.unwrap().mtime, 1_700_000_000);
    }

    #[test]
    fn directory_entry_round_trips_with_trailing_slash() {
        let entry = PathEntry {
            index: Index::root().join("d"),
            kind: EntryKind::Directory,
            attrs: Some(attrs()),
        };
        let header = path_entry_to_header(&entry).unwrap();
        assert!(header.path().unwrap().to_string_lossy().ends_with('/'));
        let back = header_to_path_entry("d/", &header).unwrap();
        assert_eq!(back.index, entry.index);
        assert!(back.kind == EntryKind::Directory);
    }

    #[test]
    fn symlink_entry_round_trips() {
        let entry = PathEntry {
            index: Index::root().join("l"),
            kind: EntryKind::Symlink {
                target: PathBuf::from("../target"),
            },
            attrs: Some(attrs()),
        };
        let header = path_entry_to_header(&entry).unwrap();
        let back = header_to_path_entry("l", &header).unwrap();
        assert_eq!(
            back.kind,
            EntryKind::Symlink {
                target: PathBuf::from("../target")
            }
        );
    }

    #[test]
    fn socket_entries_are_rejected() {
        let entry = PathEntry {
            index: Index::root().join("s"),
            kind: EntryKind::Socket,
            attrs: Some(attrs()),
        };
        assert!(matches!(
            path_entry_to_header(&entry),
            Err(TarError::UnsupportedEntryKind { kind: "socket" })
        ));
    }

    #[test]
    fn hard_link_headers_are_rejected() {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Link);
        header.set_path("hardlinked").unwrap();
        header.set_size(0);
        header.set_cksum();

        let err = header_to_path_entry("hardlinked", &header).unwrap_err();
        assert!(matches!(err, TarError::HardLink { .. }));
    }

    #[test]
    fn root_name_decodes_to_root_index() {
        let header = {
            let mut h = Header::new_ustar();
            h.set_path("./").unwrap();
            h.set_entry_type(EntryType::Directory);
            h.set_size(0);
            h.set_cksum();
            h
        };
        let back = header_to_path_entry("./", &header).unwrap();
        assert!(back.index.is_root());
    }
}
