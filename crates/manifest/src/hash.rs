//! Whole-file content hashes recorded in a manifest's `Hash` lines,
//! grounded on `gpg.get_hash`: read the file in fixed-size blocks, feeding
//! each into SHA-1 and MD5, then render both as lowercase hex.

use std::io::Read;
use std::path::Path;

use checksums::strong::{Md5, Sha1, StrongDigest};
use checksums::strong::to_hex;

use crate::error::ManifestError;

const BLOCK_SIZE: usize = 64 * 1024;

/// The two hash algorithms a manifest volume records, matching `gpg.py`'s
/// `get_hash` callers (`"SHA1"`, `"MD5"`).
pub const HASH_NAMES: [&str; 2] = ["SHA1", "MD5"];

/// Hashes `path`'s full contents with both SHA-1 and MD5, returning
/// `(name, lowercase hex)` pairs suitable for [`crate::VolumeInfo::set_hash`].
///
/// # Errors
///
/// Returns [`ManifestError::Hash`] if `path` cannot be opened or read.
pub fn hash_file(path: &Path) -> Result<Vec<(&'static str, String)>, ManifestError> {
    let mut file = std::fs::File::open(path).map_err(|source| ManifestError::Hash {
        path: path.to_path_buf(),
        source,
    })?;

    let mut sha1 = Sha1::new();
    let mut md5 = Md5::new();
    let mut buf = [0u8; BLOCK_SIZE];
    loop {
        let n = file.read(&mut buf).map_err(|source| ManifestError::Hash {
            path: path.to_path_buf(),
            source,
        })?;
        if n == 0 {
            break;
        }
        sha1.update(&buf[..n]);
        md5.update(&buf[..n]);
    }

    Ok(vec![
        ("SHA1", to_hex(sha1.finalize().as_ref())),
        ("MD5", to_hex(md5.finalize().as_ref())),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn hashes_known_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"hello world")
            .unwrap();

        let hashes = hash_file(&path).unwrap();
        let as_map: std::collections::BTreeMap<_, _> = hashes.into_iter().collect();

        // sha1("hello world"), md5("hello world")
        assert_eq!(
            as_map["SHA1"],
            "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed"
        );
        assert_eq!(as_map["MD5"], "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }
}
