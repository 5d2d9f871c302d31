#![deny(unsafe_code)]
#![deny(missing_docs)]

//! Classifies filesystem errors encountered while walking or patching a
//! directory tree into "benign" (log and skip the offending path, keep
//! going) and everything else (propagate and abort the run).
//!
//! A long-running backup touches thousands of paths; a permission error on
//! one socket file or a file that vanished between `readdir` and `stat`
//! should not abort the whole backup. [`check_common_error`] is the single
//! place that draws that line so the rest of the engine never has to
//! special-case `io::ErrorKind` itself.

use std::io;
use std::path::Path;

/// `errno` values considered recoverable: the path itself is unusable (gone,
/// permission denied, too deep, a stale handle) but the run as a whole
/// should continue.
///
/// Mirrors the set duplicity's `robust.py` checks against: `EPERM`, `ENOENT`,
/// `EACCES`, `EBUSY`, `EEXIST`, `ENOTDIR`, `ENAMETOOLONG`, `EINTR`,
/// `ENOTEMPTY`, `EIO`, `ETXTBSY`, `ESRCH`, `EINVAL`.
const BENIGN_ERRNOS: &[i32] = &[
    libc::EPERM,
    libc::ENOENT,
    libc::EACCES,
    libc::EBUSY,
    libc::EEXIST,
    libc::ENOTDIR,
    libc::ENAMETOOLONG,
    libc::EINTR,
    libc::ENOTEMPTY,
    libc::EIO,
    libc::ETXTBSY,
    libc::ESRCH,
    libc::EINVAL,
];

/// Returns `true` if `err` carries an `errno` from the benign set.
///
/// Errors with no raw OS error code (e.g. ones synthesized inside this
/// codebase) are never benign: only genuine syscall failures get the
/// skip-and-continue treatment.
#[must_use]
pub fn is_benign(err: &io::Error) -> bool {
    err.raw_os_error()
        .is_some_and(|code| BENIGN_ERRNOS.contains(&code))
}

/// Runs `f`. If it fails with a benign error, calls `on_error` with the
/// offending path and error, then returns `Ok(None)` so the caller can skip
/// that path and continue. Any other error is propagated.
///
/// This is the Rust shape of duplicity's `check_common_error`: rather than
/// catching-and-rethrowing around every filesystem call, call sites wrap the
/// fallible operation and decide locally what "skip" means for them (omit an
/// entry from a listing, leave a file unpatched, etc).
pub fn check_common_error<T>(
    path: &Path,
    on_error: impl FnOnce(&Path, &io::Error),
    f: impl FnOnce() -> io::Result<T>,
) -> io::Result<Option<T>> {
    match f() {
        Ok(value) => Ok(Some(value)),
        Err(err) if is_benign(&err) => {
            on_error(path, &err);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Lists the entries of `path` in sorted byte order, swallowing any error by
/// returning an empty list.
///
/// Grounded on `robust.listpath`: directories that disappear or become
/// unreadable between being discovered and being listed should not abort a
/// walk, they should just contribute no children.
#[must_use]
pub fn list_dir_sorted(path: &Path) -> Vec<std::ffi::OsString> {
    let Ok(entries) = std::fs::read_dir(path) else {
        return Vec::new();
    };
    let mut names: Vec<std::ffi::OsString> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name())
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn io_err(errno: i32) -> io::Error {
        io::Error::from_raw_os_error(errno)
    }

    #[test]
    fn benign_errnos_are_recognised() {
        for &errno in BENIGN_ERRNOS {
            assert!(is_benign(&io_err(errno)), "errno {errno} should be benign");
        }
    }

    #[test]
    fn unlisted_errno_is_not_benign() {
        assert!(!is_benign(&io_err(libc::ENOSPC)));
    }

    #[test]
    fn synthetic_error_without_errno_is_not_benign() {
        let err = io::Error::new(io::ErrorKind::Other, "synthetic");
        assert!(!is_benign(&err));
    }

    #[test]
    fn check_common_error_passes_through_success() {
        let seen = RefCell::new(Vec::new());
        let result = check_common_error(
            Path::new("/tmp/whatever"),
            |path, _err| seen.borrow_mut().push(path.to_owned()),
            || Ok::<_, io::Error>(42),
        )
        .unwrap();
        assert_eq!(result, Some(42));
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn check_common_error_swallows_benign_and_calls_handler() {
        let seen = RefCell::new(Vec::new());
        let path = Path::new("/some/gone/file");
        let result = check_common_error(
            path,
            |p, _err| seen.borrow_mut().push(p.to_owned()),
            || Err::<(), _>(io_err(libc::ENOENT)),
        )
        .unwrap();
        assert_eq!(result, None);
        assert_eq!(seen.into_inner(), vec![path.to_owned()]);
    }

    #[test]
    fn check_common_error_propagates_non_benign() {
        let result = check_common_error(
            Path::new("/some/file"),
            |_, _| panic!("handler should not run"),
            || Err::<(), _>(io_err(libc::ENOSPC)),
        );
        assert!(result.is_err());
    }

    #[test]
    fn list_dir_sorted_on_missing_dir_is_empty() {
        assert!(list_dir_sorted(Path::new("/definitely/does/not/exist/xyz")).is_empty());
    }

    #[test]
    fn list_dir_sorted_orders_entries() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["b", "a", "c"] {
            std::fs::write(tmp.path().join(name), b"").unwrap();
        }
        let names: Vec<String> = list_dir_sorted(tmp.path())
            .into_iter()
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
