//! Diff/patch pipeline over a directory tree.
//!
//! Three pieces compose into a full backup session:
//!
//! - [`diff`] compares a live tree walk against a previous session's
//!   signature stream and lazily produces a sequence of changes.
//! - [`archive`] frames that sequence as a tar archive (and reads one back).
//! - [`patch`] applies a decoded delta stream onto a real base directory.
//!
//! [`collate`] and [`record`] hold the shared merge primitive and the wire
//! types connecting the three.

mod archive;
mod collate;
mod diff;
mod error;
mod patch;
mod record;
mod sigarchive;

pub use archive::{read_delta_archive, write_delta_archive, VOLUME_SIZE};
pub use collate::{collate, Collate, Indexed};
pub use diff::{run_diff_session, DiffIter, DEFAULT_BLOCK_LEN};
pub use error::DiffDirError;
pub use patch::patch_tree;
pub use record::{DeltaPayload, DeltaRecord, DiffStep, DiffType, SigEntry};
pub use sigarchive::{read_sig_archive, write_sig_archive};
