//! Tar framing for a signature archive: one entry per [`SigEntry`], its
//! payload the opaque rsync signature blob for regular files and empty for
//! everything else.
//!
//! Grounded on `diffdir.py`'s signature-iterator-to-tar helper; unlike
//! [`crate::write_delta_archive`] entry names carry no framing prefix, per
//! §6's external-interfaces note that signature archives don't use the
//! delta prefixes.

use std::io::{self, Read, Write};

use path::{Index, PathEntry};

use crate::error::DiffDirError;
use crate::record::SigEntry;

fn io_err(source: io::Error) -> DiffDirError {
    DiffDirError::Io {
        path: std::path::PathBuf::new(),
        source,
    }
}

/// Writes `entries` as a tar-framed signature archive.
///
/// # Errors
///
/// Returns [`DiffDirError`] if an entry cannot be translated to a tar
/// header, or if writing the underlying stream fails.
pub fn write_sig_archive<W: Write>(
    writer: W,
    entries: impl IntoIterator<Item = SigEntry>,
) -> Result<W, DiffDirError> {
    let mut builder = tar::Builder::new(writer);
    for entry in entries {
        write_sig_entry(&mut builder, entry)?;
    }
    builder.into_inner().map_err(io_err)
}

fn write_sig_entry<W: Write>(builder: &mut tar::Builder<W>, entry: SigEntry) -> Result<(), DiffDirError> {
    let name = tarstream::index_to_tar_name(&entry.entry.index, entry.entry.is_directory());
    let mut header = tarstream::path_entry_to_header(&entry.entry)?;
    header.set_path(&name).map_err(io_err)?;

    match entry.signature {
        Some(sig) => {
            let bytes = sig.to_bytes();
            header.set_size(bytes.len() as u64);
            header.set_cksum();
            builder.append(&header, io::Cursor::new(bytes)).map_err(io_err)
        }
        None => {
            header.set_size(0);
            header.set_cksum();
            builder.append(&header, io::empty()).map_err(io_err)
        }
    }
}

/// Reads a signature archive back into its full sequence of [`SigEntry`]s.
///
/// # Errors
///
/// Returns [`DiffDirError`] if an entry name, header, or signature payload
/// cannot be decoded.
pub fn read_sig_archive<R: Read>(reader: R) -> Result<Vec<SigEntry>, DiffDirError> {
    let mut archive = tar::Archive::new(reader);
    let raw = archive.entries().map_err(io_err)?;

    let mut entries = Vec::new();
    for result in raw {
        let mut tar_entry = result.map_err(io_err)?;
        let name = tar_entry.path().map_err(io_err)?.to_string_lossy().into_owned();
        let header = tar_entry.header().clone();
        let index: Index = tarstream::tar_name_to_index(&name);
        let path_entry = tarstream::header_to_path_entry(&name, &header)?;

        let mut bytes = Vec::new();
        tar_entry.read_to_end(&mut bytes).map_err(io_err)?;
        let signature = if bytes.is_empty() {
            None
        } else {
            Some(rdiff::Signature::from_bytes(&bytes)?)
        };

        debug_assert_eq!(index, path_entry.index);
        entries.push(SigEntry {
            entry: path_entry,
            signature,
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use path::{Attrs, EntryKind};
    use std::io::Cursor;

    fn regular_entry(name: &str, size: u64) -> PathEntry {
        PathEntry {
            index: Index::root().join(name),
            kind: EntryKind::Regular { size },
            attrs: Some(Attrs {
                mode: 0o644,
                uid: 0,
                gid: 0,
                mtime: 1_700_000_000,
            }),
        }
    }

    fn dir_entry(name: &str) -> PathEntry {
        PathEntry {
            index: Index::root().join(name),
            kind: EntryKind::Directory,
            attrs: Some(Attrs {
                mode: 0o755,
                uid: 0,
                gid: 0,
                mtime: 1_700_000_000,
            }),
        }
    }

    #[test]
    fn round_trips_regular_and_directory_entries() {
        let sig = rdiff::signature_of(Cursor::new(b"hello world".to_vec()), 8).unwrap();
        let entries = vec![
            SigEntry {
                entry: dir_entry("d"),
                signature: None,
            },
            SigEntry {
                entry: regular_entry("d/file.txt", 11),
                signature: Some(sig.clone()),
            },
        ];

        let buf = write_sig_archive(Vec::new(), entries).unwrap();
        let back = read_sig_archive(Cursor::new(buf)).unwrap();

        assert_eq!(back.len(), 2);
        assert!(back[0].signature.is_none());
        assert_eq!(back[1].signature.as_ref().unwrap().to_bytes(), sig.to_bytes());
    }
}
