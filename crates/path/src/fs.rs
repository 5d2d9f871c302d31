//! Filesystem-facing operations: stat snapshots, attribute copy, and the
//! handful of special-file syscalls `std` doesn't expose (`mkfifo`,
//! `mknod`, `chown`).

use std::ffi::CString;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};

use crate::entry::{Attrs, DeviceKind, EntryKind, PathEntry};
use crate::error::PathError;
use crate::index::Index;

fn path_to_c(path: &Path) -> Result<CString, PathError> {
    CString::new(path.as_os_str().as_bytes()).map_err(|_| PathError::Io {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "path contains NUL byte"),
    })
}

/// Stats `path` (via `lstat`, so symlinks are reported as symlinks, not
/// followed) and builds the corresponding [`PathEntry`] at `index`.
///
/// Returns an `Absent` entry, not an error, when the path does not exist —
/// mirroring `Path.setdata`'s handling of `ENOENT`/`ENOTDIR`. Any other stat
/// failure is a [`PathError::Stat`].
pub fn stat_entry(index: Index, path: &Path) -> Result<PathEntry, PathError> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err)
            if matches!(
                err.raw_os_error(),
                Some(code) if code == libc::ENOENT || code == libc::ENOTDIR
            ) =>
        {
            return Ok(PathEntry::absent(index));
        }
        Err(err) => {
            return Err(PathError::Stat {
                path: path.to_path_buf(),
                source: err,
            });
        }
    };

    let file_type = metadata.file_type();
    let attrs = Attrs {
        mode: metadata.mode() & 0o7777,
        uid: metadata.uid(),
        gid: metadata.gid(),
        mtime: metadata.mtime(),
    };

    let kind = if file_type.is_file() {
        EntryKind::Regular {
            size: metadata.len(),
        }
    } else if file_type.is_dir() {
        EntryKind::Directory
    } else if file_type.is_symlink() {
        let target = fs::read_link(path).map_err(|source| PathError::Stat {
            path: path.to_path_buf(),
            source,
        })?;
        EntryKind::Symlink { target }
    } else if file_type.is_fifo() {
        EntryKind::Fifo
    } else if file_type.is_socket() {
        EntryKind::Socket
    } else if file_type.is_char_device() {
        device_kind(&metadata, DeviceKind::Char)
    } else if file_type.is_block_device() {
        device_kind(&metadata, DeviceKind::Block)
    } else {
        return Err(PathError::UnknownType {
            path: path.to_path_buf(),
        });
    };

    Ok(PathEntry {
        index,
        kind,
        attrs: Some(attrs),
    })
}

fn device_kind(metadata: &fs::Metadata, kind: DeviceKind) -> EntryKind {
    let rdev = metadata.rdev();
    EntryKind::Device {
        // Classic major/minor decomposition, matching glibc's major()/minor() macros.
        major: ((rdev >> 8) & 0xfff) as u32,
        minor: (rdev & 0xff) as u32,
        kind,
    }
}

/// Creates an empty directory at `path`.
pub fn mkdir(path: &Path) -> Result<(), PathError> {
    fs::create_dir(path).map_err(|source| PathError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Creates a symlink at `path` pointing at `target`.
pub fn symlink(target: &Path, path: &Path) -> Result<(), PathError> {
    std::os::unix::fs::symlink(target, path).map_err(|source| PathError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Creates a named pipe at `path` with the given permission bits.
pub fn mkfifo(path: &Path, mode: u32) -> Result<(), PathError> {
    let c_path = path_to_c(path)?;
    // SAFETY: `c_path` is a NUL-terminated, valid representation of `path`
    // for the lifetime of this call; `mkfifo` writes no data through it.
    let result = unsafe { libc::mkfifo(c_path.as_ptr(), mode as libc::mode_t) };
    if result == 0 {
        Ok(())
    } else {
        Err(PathError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::last_os_error(),
        })
    }
}

/// Creates a device special file at `path` (`S_IFCHR`/`S_IFBLK` OR'd into
/// `mode`) with the given major/minor numbers.
pub fn mknod(path: &Path, mode: u32, kind: DeviceKind, major: u32, minor: u32) -> Result<(), PathError> {
    let c_path = path_to_c(path)?;
    let type_bit = match kind {
        DeviceKind::Char => libc::S_IFCHR,
        DeviceKind::Block => libc::S_IFBLK,
    };
    // makedev() is a macro in glibc headers, not a linkable symbol; libc's
    // dev_t layout on Linux matches this shift-and-or construction.
    let dev = (u64::from(major) << 8) | u64::from(minor);
    // SAFETY: `c_path` is a NUL-terminated, valid representation of `path`
    // for the lifetime of this call.
    let result = unsafe {
        libc::mknod(
            c_path.as_ptr(),
            (mode as libc::mode_t) | type_bit,
            dev as libc::dev_t,
        )
    };
    if result == 0 {
        Ok(())
    } else {
        Err(PathError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::last_os_error(),
        })
    }
}

/// Creates a Unix-domain socket special file at `path` (bound but never
/// connected — this is only used to recreate the placeholder during a
/// restore, never to actually communicate).
pub fn mksocket(path: &Path) -> Result<(), PathError> {
    use std::os::unix::net::UnixListener;
    // Binding immediately drops the listener, which is enough to leave the
    // socket file in place without holding it open past this call.
    UnixListener::bind(path)
        .map(|_| ())
        .map_err(|source| PathError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Applies `attrs` (ownership, permissions, mtime) to the real file at
/// `path`.
///
/// Mirrors `copy_attribs` when the destination is a live `Path`: `chown`,
/// `chmod`, then `utime`. Symlinks are never passed to this function —
/// their attributes are not independently meaningful (see §3).
pub fn apply_attrs(path: &Path, attrs: &Attrs) -> Result<(), PathError> {
    let c_path = path_to_c(path)?;
    // SAFETY: `c_path` is a NUL-terminated, valid representation of `path`
    // for the lifetime of this call.
    let result = unsafe { libc::chown(c_path.as_ptr(), attrs.uid, attrs.gid) };
    if result != 0 {
        return Err(PathError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::last_os_error(),
        });
    }

    fs::set_permissions(path, fs::Permissions::from_mode(attrs.mode)).map_err(|source| {
        PathError::Io {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let mtime = filetime::FileTime::from_unix_time(attrs.mtime, 0);
    filetime::set_symlink_file_times(path, filetime::FileTime::now(), mtime).map_err(|source| {
        PathError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Removes the file or empty directory at `path`.
pub fn remove(path: &Path, is_dir: bool) -> Result<(), PathError> {
    let result = if is_dir {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|source| PathError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Renames `from` to `to`, both real filesystem paths.
pub fn rename(from: &Path, to: &Path) -> Result<(), PathError> {
    fs::rename(from, to).map_err(|source| PathError::Io {
        path: from.to_path_buf(),
        source,
    })
}

/// Finds an unused `duplicity_temp.<n>` path in `dir`, probing at most
/// 10,000 names before giving up, matching `Path.get_temp_in_same_dir`.
pub fn temp_path_in(dir: &Path) -> Result<PathBuf, PathError> {
    for counter in 1..10_000u32 {
        let candidate = dir.join(format!("duplicity_temp.{counter}"));
        match fs::symlink_metadata(&candidate) {
            Ok(_) => continue,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(candidate),
            Err(err) => {
                return Err(PathError::Stat {
                    path: candidate,
                    source: err,
                });
            }
        }
    }
    Err(PathError::Io {
        path: dir.to_path_buf(),
        source: std::io::Error::new(
            std::io::ErrorKind::Other,
            "too many temp files in target directory",
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_entry_reports_absent_for_missing_path() {
        let tmp = tempfile::tempdir().unwrap();
        let entry = stat_entry(Index::root(), &tmp.path().join("nope")).unwrap();
        assert!(entry.is_absent());
    }

    #[test]
    fn stat_entry_reports_regular_file_size() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("f");
        fs::write(&file, b"hello").unwrap();
        let entry = stat_entry(Index::root().join("f"), &file).unwrap();
        assert_eq!(entry.size(), Some(5));
        assert!(entry.is_regular());
    }

    #[test]
    fn stat_entry_reports_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("d");
        fs::create_dir(&dir).unwrap();
        let entry = stat_entry(Index::root().join("d"), &dir).unwrap();
        assert!(entry.is_directory());
    }

    #[test]
    fn stat_entry_reports_symlink_target() {
        let tmp = tempfile::tempdir().unwrap();
        let link = tmp.path().join("l");
        std::os::unix::fs::symlink("../x", &link).unwrap();
        let entry = stat_entry(Index::root().join("l"), &link).unwrap();
        assert!(entry.is_symlink());
        match entry.kind {
            crate::entry::EntryKind::Symlink { target } => {
                assert_eq!(target, PathBuf::from("../x"));
            }
            _ => panic!("expected symlink"),
        }
    }

    #[test]
    fn apply_attrs_sets_mode_and_mtime() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("f");
        fs::write(&file, b"x").unwrap();
        let attrs = Attrs {
            mode: 0o640,
            uid: metadata_uid(&file),
            gid: metadata_gid(&file),
            mtime: 12345,
        };
        apply_attrs(&file, &attrs).unwrap();
        let meta = fs::symlink_metadata(&file).unwrap();
        assert_eq!(meta.mode() & 0o7777, 0o640);
        assert_eq!(meta.mtime(), 12345);
    }

    #[test]
    fn temp_path_in_finds_unused_name() {
        let tmp = tempfile::tempdir().unwrap();
        let candidate = temp_path_in(tmp.path()).unwrap();
        assert_eq!(candidate.file_name().unwrap(), "duplicity_temp.1");
    }

    #[test]
    fn temp_path_in_skips_existing_names() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("duplicity_temp.1"), b"").unwrap();
        let candidate = temp_path_in(tmp.path()).unwrap();
        assert_eq!(candidate.file_name().unwrap(), "duplicity_temp.2");
    }

    fn metadata_uid(path: &Path) -> u32 {
        fs::symlink_metadata(path).unwrap().uid()
    }

    fn metadata_gid(path: &Path) -> u32 {
        fs::symlink_metadata(path).unwrap().gid()
    }
}
