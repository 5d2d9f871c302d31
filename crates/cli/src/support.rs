//! Shared plumbing the subcommands lean on: walking a live tree into a
//! `Vec`, reconstructing a signature overlay from a chain's files, and the
//! record-aligned split between a rendered delta archive and the volume
//! files a backend actually stores.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;

use backend::Backend;
use collections::{BackupSet, SignatureChain};
use diffdir::{DeltaRecord, SigEntry};
use naming::{BackupTime, FileKind, ParsedFilename};
use path::{Index, PathEntry};
use session::SessionConfig;
use volume::{Block, BlockSource, CipherDirection, CipherStream, GpgCipher, VecBlockSource};

use crate::error::EngineError;

/// The two zero-filled 512-byte blocks every tar stream ends with. A
/// per-record rendering (see [`render_record_bytes`]) always carries one of
/// these at its tail; only the last volume of a set needs to keep it.
const TAR_TRAILER: [u8; 1024] = [0u8; 1024];

/// Walks `root` to completion, logging (rather than aborting on) any benign
/// error the walk itself excuses.
pub(crate) fn walk_all(root: &Path) -> Result<Vec<PathEntry>, EngineError> {
    let mut entries = Vec::new();
    for result in walk::Walker::new(root, |path, err| {
        tracing::warn!(path = %path.display(), error = %err, "skipped while walking");
    }) {
        entries.push(result?);
    }
    Ok(entries)
}

/// Fetches every file in `chain` and overlays their decoded signature
/// entries by index, later files in the chain winning over earlier ones —
/// the same precedence [`collections::SignatureChain::filenames`] documents
/// applying order for.
pub(crate) fn load_sig_entries(
    backend: &dyn Backend,
    chain: &SignatureChain,
    stage: &Path,
) -> Result<Vec<SigEntry>, EngineError> {
    let mut overlay: BTreeMap<Index, SigEntry> = BTreeMap::new();

    for name in chain.filenames() {
        let local = stage.join(name);
        backend.get(name, &local)?;
        let bytes = std::fs::read(&local)
            .map_err(|source| EngineError::message(format!("reading {}: {source}", local.display())))?;
        let _ = std::fs::remove_file(&local);

        for entry in diffdir::read_sig_archive(Cursor::new(bytes))? {
            overlay.insert(entry.entry.index.clone(), entry);
        }
    }

    Ok(overlay.into_values().collect())
}

/// Downloads and decrypts every volume `set` names, in ascending volume
/// order, and decodes the concatenated plaintext as a delta archive.
pub(crate) fn restore_delta_records(
    backend: &dyn Backend,
    set: &BackupSet,
    session: &SessionConfig,
    stage: &Path,
) -> Result<Vec<DeltaRecord>, EngineError> {
    let mut plaintext = Vec::new();

    for (_, name) in set.volumes() {
        let local = stage.join(name);
        backend.get(name, &local)?;

        let cipher = GpgCipher::spawn(CipherDirection::Decrypt, &local, session.cipher_params())?;
        let mut cipher: Box<dyn CipherStream> = Box::new(cipher);
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = cipher.read(&mut buf)?;
            if n == 0 {
                break;
            }
            plaintext.extend_from_slice(&buf[..n]);
        }
        cipher.close()?;
        let _ = std::fs::remove_file(&local);
    }

    Ok(diffdir::read_delta_archive(Cursor::new(plaintext))?)
}

/// Renders `records` into one or more GPG-encrypted volume files, each
/// holding a whole number of complete tar entries, uploads them through
/// `backend`, and returns the manifest describing which index range and
/// content hashes each volume carries.
///
/// Volumes are packed greedily up to `session.volume_size()`; the final
/// tar end-of-archive trailer is appended only to the last volume, so
/// concatenating every volume's plaintext back together in volume-number
/// order reproduces exactly what [`diffdir::write_delta_archive`] would
/// have produced for the whole sequence in one pass.
pub(crate) fn write_volumes(
    records: &[DeltaRecord],
    when: BackupTime,
    volume_kind: FileKind,
    session: &SessionConfig,
    backend: &dyn Backend,
    stage: &Path,
) -> Result<manifest::Manifest, EngineError> {
    let budget = session.volume_size() as usize;

    let mut manifest = manifest::Manifest::new();
    let mut volume_number: u32 = 0;
    let mut current_bytes: Vec<u8> = Vec::new();
    let mut current_start: Option<Index> = None;
    let mut current_end: Option<Index> = None;

    for record in records {
        let entry_bytes = render_record_bytes(record)?;

        if !current_bytes.is_empty() && current_bytes.len() + entry_bytes.len() > budget {
            volume_number += 1;
            flush_volume(
                volume_number,
                current_start.take().expect("a non-empty volume has a start index"),
                current_end.take().expect("a non-empty volume has an end index"),
                std::mem::take(&mut current_bytes),
                when,
                volume_kind,
                session,
                backend,
                stage,
                &mut manifest,
            )?;
        }

        if current_start.is_none() {
            current_start = Some(record.index.clone());
        }
        current_end = Some(record.index.clone());
        current_bytes.extend_from_slice(&entry_bytes);
    }

    current_bytes.extend_from_slice(&TAR_TRAILER);
    volume_number += 1;
    flush_volume(
        volume_number,
        current_start.unwrap_or_else(Index::root),
        current_end.unwrap_or_else(Index::root),
        current_bytes,
        when,
        volume_kind,
        session,
        backend,
        stage,
        &mut manifest,
    )?;

    Ok(manifest)
}

/// Renders a single record as its own standalone delta archive and strips
/// the trailing tar end marker, leaving just that record's header(s) and
/// payload — always a whole multiple of 512 bytes, so concatenating these
/// slices back to back reproduces the same bytes a single archive-wide
/// render would, tar entries carrying no cross-entry state.
fn render_record_bytes(record: &DeltaRecord) -> Result<Vec<u8>, EngineError> {
    let full = diffdir::write_delta_archive(Vec::new(), std::iter::once(record.clone()))?;
    let cut = full.len() - TAR_TRAILER.len();
    Ok(full[..cut].to_vec())
}

#[allow(clippy::too_many_arguments)]
fn flush_volume(
    volume_number: u32,
    start: Index,
    end: Index,
    bytes: Vec<u8>,
    when: BackupTime,
    volume_kind: FileKind,
    session: &SessionConfig,
    backend: &dyn Backend,
    stage: &Path,
    manifest: &mut manifest::Manifest,
) -> Result<(), EngineError> {
    let local_path = stage.join(format!("volume-{volume_number}.tmp"));
    let cipher = GpgCipher::spawn(CipherDirection::Encrypt, &local_path, session.cipher_params())?;

    // One block sized exactly to this volume's content and an empty footer:
    // `size` is chosen so the admission check always accepts that single
    // block, and with nothing left to peek at afterwards `write_volume`
    // never tops the file off with filler past it.
    let size = bytes.len() as u64 + volume::FUDGE_MARGIN;
    let mut source = VecBlockSource::new(vec![Block::new(bytes)], Vec::new());
    volume::write_volume(&mut source, Box::new(cipher), &local_path, size, 0)?;

    let hashes = manifest::hash_file(&local_path)?;
    let remote_name = naming::format_filename(
        &ParsedFilename {
            kind: volume_kind,
            when,
            volume_number: Some(volume_number),
            encrypted: true,
        },
        session.time_separator(),
    );
    backend.put(&local_path, Some(&remote_name))?;
    let _ = std::fs::remove_file(&local_path);

    let mut info = manifest::VolumeInfo::new(volume_number, start, end);
    for (hash_name, value) in hashes {
        info.set_hash(hash_name, value);
    }
    manifest.add_volume_info(info)?;

    Ok(())
}
