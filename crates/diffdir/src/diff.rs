//! Compares a live tree walk against a previous session's signature stream,
//! lazily producing the sequence a delta archive is built from.
//!
//! Grounded on `diffdir.py`'s `get_delta_iter`/`delta_iter2delta_ropath`:
//! for each collated `(new, sig)` pair, absence on one side means a
//! deletion or a snapshot, §3 equality on both sides means no change, and
//! an unequal pair of two regular files means an rsync delta — anything
//! else falls back to a full snapshot. A single file's stat/read/diff
//! failure is reported to `on_error` and skipped, never aborting the rest
//! of the walk, matching `get_delta_iter`'s `check_common_error` wrapper.

use std::path::{Path, PathBuf};

use path::{EntryKind, Index, PathEntry};
use rdiff::{Signature, SignatureTee};

use crate::collate::{collate, Collate};
use crate::error::DiffDirError;
use crate::record::{DeltaPayload, DeltaRecord, DiffStep, DiffType, SigEntry};

/// Block length used when hashing a file with no previous signature to
/// compare against (a brand-new path). An implementation choice, not a
/// negotiated wire value — there is no peer to negotiate a block size with.
pub const DEFAULT_BLOCK_LEN: u32 = 2048;

/// Lazily compares `new_iter` (a live tree walk) against `sig_iter` (a
/// previous session's decoded signature archive), yielding one [`DiffStep`]
/// per index either side mentions.
pub struct DiffIter<N, S, F>
where
    N: Iterator<Item = PathEntry>,
    S: Iterator<Item = SigEntry>,
    F: FnMut(&Index, &DiffDirError),
{
    collated: Collate<N, S>,
    base_dir: PathBuf,
    on_error: F,
}

impl<N, S, F> DiffIter<N, S, F>
where
    N: Iterator<Item = PathEntry>,
    S: Iterator<Item = SigEntry>,
    F: FnMut(&Index, &DiffDirError),
{
    /// Builds a diff iterator over `new_iter` and `sig_iter`, resolving
    /// indices to real paths under `base_dir`.
    pub fn new(new_iter: N, sig_iter: S, base_dir: impl Into<PathBuf>, on_error: F) -> Self {
        Self {
            collated: collate(new_iter, sig_iter),
            base_dir: base_dir.into(),
            on_error,
        }
    }
}

impl<N, S, F> Iterator for DiffIter<N, S, F>
where
    N: Iterator<Item = PathEntry>,
    S: Iterator<Item = SigEntry>,
    F: FnMut(&Index, &DiffDirError),
{
    type Item = DiffStep;

    fn next(&mut self) -> Option<DiffStep> {
        loop {
            let (new, sig) = self.collated.next()?;

            let Some(new) = new else {
                let sig = sig.expect("collate never yields (None, None)");
                return Some(DiffStep::Change(deleted_record(sig.entry.index)));
            };

            if new.is_absent() {
                if let Some(sig) = sig {
                    return Some(DiffStep::Change(deleted_record(sig.entry.index)));
                }
                // Neither side has anything real at this index; nothing to report.
                continue;
            }

            match diff_one(&self.base_dir, new, sig) {
                Ok(step) => return Some(step),
                Err((index, err)) => {
                    (self.on_error)(&index, &err);
                }
            }
        }
    }
}

fn deleted_record(index: Index) -> DeltaRecord {
    DeltaRecord {
        index,
        difftype: DiffType::Deleted,
        new_entry: None,
        payload: DeltaPayload::None,
        next_signature: None,
    }
}

fn diff_one(
    base_dir: &Path,
    new: PathEntry,
    sig: Option<SigEntry>,
) -> Result<DiffStep, (Index, DiffDirError)> {
    let index = new.index.clone();

    if let Some(sig) = &sig {
        if new.matches(&sig.entry) {
            return Ok(DiffStep::Unchanged {
                entry: new,
                signature: sig.signature.clone(),
            });
        }
    }

    let old_signature = sig.as_ref().and_then(|s| s.signature.as_ref());
    let real_path = new.index.to_path(base_dir);

    let (payload, next_signature) = match (&new.kind, old_signature) {
        (EntryKind::Regular { .. }, Some(old_sig)) => {
            diff_regular(&real_path, old_sig).map_err(|e| (index.clone(), e))?
        }
        (EntryKind::Regular { .. }, None) => {
            snapshot_regular(&real_path).map_err(|e| (index.clone(), e))?
        }
        _ => (DeltaPayload::None, None),
    };

    let difftype = if sig.is_some() && matches!(payload, DeltaPayload::Diff(_)) {
        DiffType::Diff
    } else {
        DiffType::Snapshot
    };

    Ok(DiffStep::Change(DeltaRecord {
        index,
        difftype,
        new_entry: Some(new),
        payload,
        next_signature,
    }))
}

fn diff_regular(
    real_path: &Path,
    old_sig: &Signature,
) -> Result<(DeltaPayload, Option<Signature>), DiffDirError> {
    let file = std::fs::File::open(real_path).map_err(|source| DiffDirError::Io {
        path: real_path.to_path_buf(),
        source,
    })?;
    let mut tee = SignatureTee::new(file, old_sig.block_len());
    let delta = rdiff::delta_against(old_sig, &mut tee)?;
    let sig = tee.finish();
    Ok((DeltaPayload::Diff(delta), Some(sig)))
}

fn snapshot_regular(real_path: &Path) -> Result<(DeltaPayload, Option<Signature>), DiffDirError> {
    let file = std::fs::File::open(real_path).map_err(|source| DiffDirError::Io {
        path: real_path.to_path_buf(),
        source,
    })?;
    let mut tee = SignatureTee::new(file, DEFAULT_BLOCK_LEN);
    let mut bytes = Vec::new();
    std::io::Read::read_to_end(&mut tee, &mut bytes).map_err(|source| DiffDirError::Io {
        path: real_path.to_path_buf(),
        source,
    })?;
    let sig = tee.finish();
    Ok((DeltaPayload::Bytes(bytes), Some(sig)))
}

/// Runs a full diff pass to completion, returning the delta records to
/// archive and the signature entries the next session's signature archive
/// should be built from (every surviving regular-or-not path, changed or
/// not — matching `Tar_WriteSig`'s behavior of writing a signature line for
/// every path, reusing the previous signature verbatim when nothing
/// changed).
pub fn run_diff_session<N, S, F>(
    new_iter: N,
    sig_iter: S,
    base_dir: impl Into<PathBuf>,
    mut on_error: F,
) -> (Vec<DeltaRecord>, Vec<SigEntry>)
where
    N: Iterator<Item = PathEntry>,
    S: Iterator<Item = SigEntry>,
    F: FnMut(&Index, &DiffDirError),
{
    let mut records = Vec::new();
    let mut sig_entries = Vec::new();

    for step in DiffIter::new(new_iter, sig_iter, base_dir, &mut on_error) {
        match step {
            DiffStep::Change(record) => {
                if record.difftype != DiffType::Deleted {
                    if let Some(new_entry) = &record.new_entry {
                        sig_entries.push(SigEntry {
                            entry: new_entry.clone(),
                            signature: record.next_signature.clone(),
                        });
                    }
                }
                records.push(record);
            }
            DiffStep::Unchanged { entry, signature } => {
                sig_entries.push(SigEntry { entry, signature });
            }
        }
    }

    (records, sig_entries)
}
