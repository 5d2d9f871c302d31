#![deny(missing_docs)]

//! Tar multiplexing: the wire format underneath delta archives and
//! manifests alike.
//!
//! The engine never writes a directory tree directly to an archive; every
//! archive — signature, delta, full — is a tar stream whose entries carry
//! either a [`path::PathEntry`] with no payload (directories, symlinks,
//! deletions) or a `PathEntry` plus a byte stream (regular file content, an
//! rdiff signature, an rdiff delta). [`TarWriter`] builds such a stream
//! lazily from a caller-driven sequence of entries; [`TarReader`] walks one
//! back, handing out a bounded reader per entry, same as the tar crate
//! itself already bounds every [`tar::Entry`] to its declared size.
//!
//! Grounded on `path.py`'s `get_tarinfo`/`init_from_tarinfo`: see
//! [`bridge`] for the exact type-by-type mapping, including its refusal to
//! represent hard links or Unix sockets.

mod bridge;
mod error;
mod naming;

pub use bridge::{header_to_path_entry, path_entry_to_header};
pub use error::TarError;
pub use naming::{index_to_tar_name, tar_name_to_index};

use std::io::{self, Read, Write};

use path::PathEntry;

/// Builds a ustar tar stream from a caller-driven sequence of entries.
///
/// Each entry is written with [`TarWriter::write_entry`]; directories,
/// symlinks, fifos, devices and deletions carry no payload, regular files
/// carry one. Call [`TarWriter::finish`] to flush the closing blocks and
/// recover the underlying writer.
pub struct TarWriter<W: Write> {
    builder: tar::Builder<W>,
}

impl<W: Write> TarWriter<W> {
    /// Wraps `inner` in a new tar writer.
    pub fn new(inner: W) -> Self {
        Self {
            builder: tar::Builder::new(inner),
        }
    }

    /// Writes one entry, with an optional payload reader.
    ///
    /// `payload` is required (and its bytes written verbatim) for
    /// `Regular` entries; passing `None` for a `Regular` entry writes a
    /// zero-length body regardless of the entry's declared `size`, which
    /// will desync the archive for a downstream reader expecting `size`
    /// bytes — callers must supply a payload whose length matches `size`.
    ///
    /// # Errors
    ///
    /// Returns [`TarError::UnsupportedEntryKind`] for entries
    /// [`path_entry_to_header`] cannot translate, or [`TarError::Io`] if
    /// writing to the underlying stream fails.
    pub fn write_entry(
        &mut self,
        entry: &PathEntry,
        payload: Option<&mut dyn Read>,
    ) -> Result<(), TarError> {
        let header = path_entry_to_header(entry)?;
        match payload {
            Some(reader) => self.builder.append(&header, reader)?,
            None => self.builder.append(&header, io::empty())?,
        }
        Ok(())
    }

    /// Flushes the closing blocks and returns the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns [`TarError::Io`] if the final flush fails.
    pub fn finish(mut self) -> Result<W, TarError> {
        self.builder.finish()?;
        self.builder.into_inner().map_err(TarError::Io)
    }
}

/// Reads a ustar tar stream back into `(PathEntry, payload reader)` pairs.
pub struct TarReader<R: Read> {
    archive: tar::Archive<R>,
}

impl<R: Read> TarReader<R> {
    /// Wraps `inner` in a new tar reader.
    pub fn new(inner: R) -> Self {
        Self {
            archive: tar::Archive::new(inner),
        }
    }

    /// Iterates the archive's entries in stream order, pairing each
    /// decoded [`PathEntry`] with a reader bounded to that entry's payload
    /// (a zero-length read for entries with no content).
    ///
    /// # Errors
    ///
    /// The returned iterator yields [`TarError::HardLink`] for a hard-link
    /// entry, [`TarError::UnknownType`] for an unrecognized tar entry type,
    /// or [`TarError::Io`] for an underlying stream failure; iteration
    /// stops at the first error.
    pub fn entries(
        &mut self,
    ) -> Result<impl Iterator<Item = Result<(PathEntry, tar::Entry<'_, R>), TarError>>, TarError>
    {
        let entries = self.archive.entries()?;
        Ok(entries.map(|result| {
            let entry = result?;
            let name = entry.path()?.to_string_lossy().into_owned();
            let header = entry.header().clone();
            let path_entry = header_to_path_entry(&name, &header)?;
            Ok((path_entry, entry))
        }))
    }
}
