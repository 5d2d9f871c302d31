#![deny(missing_docs)]

//! A deterministic, depth-first, lazily-expanded filesystem walker.
//!
//! [`Walker`] emits [`path::PathEntry`] values in strictly increasing
//! [`path::Index`] order: each directory is emitted before its children,
//! and children are visited in sorted-name order — the invariant every
//! other component in this engine (collation, tar framing, manifest
//! coverage) depends on.
//!
//! Benign filesystem errors (a file vanishing between listing and stat,
//! permission denied on one entry) are reported through a caller-supplied
//! handler and the offending entry is omitted from the sequence, rather
//! than aborting the walk — the [`robust`] crate classifies which errors
//! qualify. Anything else stops the walk with an error.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::PathBuf;

use path::{Index, PathEntry};
use thiserror::Error;

/// Errors that abort a walk outright (non-benign filesystem failures).
#[derive(Debug, Error)]
pub enum WalkError {
    /// The path model rejected an entry (unknown type, hard link, ...).
    #[error(transparent)]
    Path(#[from] path::PathError),
}

/// Lazily walks the tree rooted at a filesystem path, yielding entries in
/// index order.
///
/// `on_benign` is called with the offending path and error whenever a
/// benign error (per [`robust::is_benign`]) is encountered while listing or
/// stat'ing; the entry is then skipped. Construct with [`Walker::new`].
pub struct Walker<F: FnMut(&std::path::Path, &std::io::Error)> {
    root: PathBuf,
    on_benign: F,
    frames: Vec<Frame>,
    started: bool,
    done: bool,
}

struct Frame {
    index: Index,
    dir_path: PathBuf,
    children: VecDeque<OsString>,
}

impl<F: FnMut(&std::path::Path, &std::io::Error)> Walker<F> {
    /// Builds a walker rooted at `root`, reporting benign errors to
    /// `on_benign`.
    pub fn new(root: impl Into<PathBuf>, on_benign: F) -> Self {
        Self {
            root: root.into(),
            on_benign,
            frames: Vec::new(),
            started: false,
            done: false,
        }
    }

    fn stat_or_skip(
        &mut self,
        index: Index,
        real_path: &std::path::Path,
    ) -> Result<Option<PathEntry>, WalkError> {
        match robust::check_common_error(
            real_path,
            &mut self.on_benign,
            || path_stat(index.clone(), real_path),
        ) {
            Ok(Some(entry)) => Ok(Some(entry)),
            Ok(None) => Ok(None),
            Err(err) => Err(path::PathError::Stat {
                path: real_path.to_path_buf(),
                source: err,
            }
            .into()),
        }
    }
}

fn path_stat(index: Index, real_path: &std::path::Path) -> std::io::Result<PathEntry> {
    path::fs::stat_entry(index, real_path).map_err(|err| match err {
        path::PathError::Stat { source, .. } | path::PathError::Io { source, .. } => source,
        other => std::io::Error::new(std::io::ErrorKind::Other, other.to_string()),
    })
}

impl<F: FnMut(&std::path::Path, &std::io::Error)> Iterator for Walker<F> {
    type Item = Result<PathEntry, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if !self.started {
            self.started = true;
            let root = self.root.clone();
            match self.stat_or_skip(Index::root(), &root) {
                Ok(Some(entry)) => {
                    if entry.is_directory() {
                        let children = robust::list_dir_sorted(&root).into();
                        self.frames.push(Frame {
                            index: Index::root(),
                            dir_path: root,
                            children,
                        });
                    } else {
                        self.done = true;
                    }
                    return Some(Ok(entry));
                }
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }

        loop {
            let Some(frame) = self.frames.last_mut() else {
                self.done = true;
                return None;
            };

            let Some(name) = frame.children.pop_front() else {
                self.frames.pop();
                continue;
            };

            let child_index = frame.index.join(&name);
            let child_path = frame.dir_path.join(&name);

            match self.stat_or_skip(child_index.clone(), &child_path) {
                Ok(Some(entry)) => {
                    if entry.is_directory() {
                        let children = robust::list_dir_sorted(&child_path).into();
                        self.frames.push(Frame {
                            index: child_index,
                            dir_path: child_path,
                            children,
                        });
                    }
                    return Some(Ok(entry));
                }
                Ok(None) => continue,
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn names(entries: &[PathEntry]) -> Vec<String> {
        entries.iter().map(|e| e.index.display_lossy()).collect()
    }

    fn collect(root: &std::path::Path) -> Vec<PathEntry> {
        Walker::new(root, |_, _| {})
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn emits_root_then_children_in_sorted_order() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("b"), b"").unwrap();
        fs::write(tmp.path().join("a"), b"").unwrap();
        fs::create_dir(tmp.path().join("c")).unwrap();
        fs::write(tmp.path().join("c").join("z"), b"").unwrap();

        let entries = collect(tmp.path());
        assert_eq!(names(&entries), vec![".", "a", "b", "c", "c/z"]);
    }

    #[test]
    fn indices_are_strictly_increasing() {
        let tmp = tempfile::tempdir().unwrap();
        for top in ["x", "y"] {
            fs::create_dir(tmp.path().join(top)).unwrap();
            for leaf in ["1", "2"] {
                fs::write(tmp.path().join(top).join(leaf), b"").unwrap();
            }
        }
        let entries = collect(tmp.path());
        for pair in entries.windows(2) {
            assert!(pair[0].index < pair[1].index, "{:?} !< {:?}", pair[0].index, pair[1].index);
        }
    }

    #[test]
    fn missing_root_yields_empty_sequence() {
        let entries = collect(std::path::Path::new("/definitely/not/here/xyz"));
        assert!(entries.is_empty());
    }

    #[test]
    fn non_directory_root_yields_single_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("solo");
        fs::write(&file, b"data").unwrap();
        let entries = collect(&file);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_regular());
    }

    #[test]
    fn benign_errors_are_reported_and_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("d")).unwrap();
        fs::write(tmp.path().join("d").join("f"), b"").unwrap();

        let mut seen = Vec::new();
        // Remove the child out from under the walker's listing by racily
        // deleting right after listing isn't reproducible in a unit test,
        // so instead we just assert the handler wiring compiles and is
        // never invoked on a clean tree.
        let entries = Walker::new(tmp.path(), |p, e| seen.push((p.to_owned(), e.to_string())))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(entries.len(), 3);
        assert!(seen.is_empty());
    }
}
