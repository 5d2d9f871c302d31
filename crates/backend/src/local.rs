use std::fs;
use std::path::{Path, PathBuf};

use crate::backend::Backend;
use crate::error::BackendError;

/// Stores backup files as ordinary files in a directory on local disk.
///
/// Mirrors `backends.py`'s `LocalBackend`: `put` copies in (trying a rename
/// first when the source and destination share a filesystem), `get` and
/// `list` read the directory directly, `delete` removes named files.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    /// Uses `root` as the backend's storage directory. The directory must
    /// already exist; this constructor does not create it.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Backend for LocalBackend {
    fn put(&self, local_path: &Path, remote_name: Option<&str>) -> Result<(), BackendError> {
        let filename = match remote_name {
            Some(name) => name.to_string(),
            None => local_path
                .file_name()
                .ok_or_else(|| BackendError(format!("{} has no filename component", local_path.display())))?
                .to_string_lossy()
                .into_owned(),
        };
        let target = self.root.join(&filename);

        match fs::rename(local_path, &target) {
            Ok(()) => Ok(()),
            Err(_) => fs::copy(local_path, &target)
                .map(|_| ())
                .map_err(|e| BackendError::io(&format!("copying to {}", target.display()), e)),
        }
    }

    fn get(&self, remote_name: &str, local_path: &Path) -> Result<(), BackendError> {
        let source = self.root.join(remote_name);
        fs::copy(&source, local_path)
            .map(|_| ())
            .map_err(|e| BackendError::io(&format!("reading {}", source.display()), e))
    }

    fn list(&self) -> Result<Vec<String>, BackendError> {
        let entries = fs::read_dir(&self.root)
            .map_err(|e| BackendError::io(&format!("listing {}", self.root.display()), e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| BackendError::io(&format!("listing {}", self.root.display()), e))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    fn delete(&self, names: &[String]) -> Result<(), BackendError> {
        for name in names {
            let target = self.root.join(name);
            fs::remove_file(&target).map_err(|e| BackendError::io(&format!("deleting {}", target.display()), e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_list_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path());

        let src = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(src.path(), b"volume payload").unwrap();
        backend.put(src.path(), Some("duplicity-full.vol1.difftar")).unwrap();

        let listed = backend.list().unwrap();
        assert_eq!(listed, vec!["duplicity-full.vol1.difftar".to_string()]);

        let out = dir.path().join("roundtrip.out");
        backend.get("duplicity-full.vol1.difftar", &out).unwrap();
        assert_eq!(std::fs::read(out).unwrap(), b"volume payload");
    }

    #[test]
    fn put_without_remote_name_uses_source_filename() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path());

        let src_dir = tempfile::tempdir().unwrap();
        let src = src_dir.path().join("duplicity-full.manifest");
        std::fs::write(&src, b"manifest text").unwrap();
        backend.put(&src, None).unwrap();

        assert_eq!(backend.list().unwrap(), vec!["duplicity-full.manifest".to_string()]);
    }

    #[test]
    fn delete_removes_named_files() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path());
        std::fs::write(dir.path().join("a"), b"x").unwrap();
        std::fs::write(dir.path().join("b"), b"y").unwrap();

        backend.delete(&["a".to_string()]).unwrap();
        let listed = backend.list().unwrap();
        assert_eq!(listed, vec!["b".to_string()]);
    }

    #[test]
    fn get_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path());
        let out = dir.path().join("out");
        assert!(backend.get("missing", &out).is_err());
    }
}
