//! The block-to-volume splitting algorithm.
//!
//! Grounded directly on `gpg.py`'s `GPGWriteFile`: the fudge margin, footer
//! reserve, and top-off constants below are that function's literal values.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::block::BlockSource;
use crate::cipher::CipherStream;
use crate::error::VolumeError;

/// Compensates for the cipher layer's own internal buffering, so a volume's
/// on-disk size stays safely under the target even though blocks are
/// admitted by a size check performed before encryption inflates them.
pub const FUDGE_MARGIN: u64 = 18 * 1024;

/// Default reserve left for the footer write after the block-admission loop
/// stops, so the footer is never the thing that pushes a volume over size.
pub const DEFAULT_FOOTER_RESERVE: u64 = 16 * 1024;

/// Default target volume size.
pub const DEFAULT_VOLUME_SIZE: u64 = 50 * 1024 * 1024;

fn current_size(path: &Path) -> Result<u64, VolumeError> {
    std::fs::metadata(path)
        .map(|m| m.len())
        .map_err(|source| VolumeError::Stat {
            path: path.to_path_buf(),
            source,
        })
}

/// Writes as many blocks from `source` as fit under `size` into the cipher
/// sink backing `target_path`, then the footer, then tops the file off with
/// incompressible data (bytes re-read from the file's own already-written
/// ciphertext prefix) if blocks remain and the file landed under target.
///
/// `target_path` must be the same path the cipher sink (already spawned,
/// passed as `cipher`) is writing its ciphertext to — the top-off step reads
/// that file back to source its filler bytes, exactly as `gpg.py` does.
///
/// # Errors
///
/// Returns [`VolumeError`] if the cipher sink's `write`/`close` fails, or if
/// `target_path` cannot be stat'ed or re-read for the top-off step.
pub fn write_volume(
    source: &mut dyn BlockSource,
    cipher: Box<dyn CipherStream>,
    target_path: &Path,
    size: u64,
    max_footer_size: u64,
) -> Result<(), VolumeError> {
    let mut cipher = cipher;
    let target_size = size.saturating_sub(FUDGE_MARGIN);
    let check_size = target_size.saturating_sub(max_footer_size);

    while let Some(next) = source.peek() {
        let projected = current_size(target_path)? + next.data.len() as u64;
        if projected > check_size {
            break;
        }
        let block = source.next_block();
        cipher.write(&block.data)?;
    }

    cipher.write(&source.get_footer())?;

    if source.peek().is_some() {
        let cursize = current_size(target_path)?;
        if cursize < target_size {
            top_off(target_path, target_size - cursize, cipher.as_mut())?;
        }
    }

    cipher.close()
}

/// Feeds `bytes` of incompressible filler data, sourced by re-reading
/// `target_path`'s own already-written ciphertext prefix, into `cipher`.
fn top_off(target_path: &Path, bytes: u64, cipher: &mut dyn CipherStream) -> Result<(), VolumeError> {
    let mut file = File::open(target_path)?;
    let mut remaining = bytes;
    let mut buf = [0u8; 64 * 1024];
    while remaining > 0 {
        let want = remaining.min(buf.len() as u64) as usize;
        let n = file.read(&mut buf[..want])?;
        if n == 0 {
            break;
        }
        cipher.write(&buf[..n])?;
        remaining -= n as u64;
    }
    Ok(())
}
