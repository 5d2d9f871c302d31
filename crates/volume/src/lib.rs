#![deny(missing_docs)]

//! Splits an encrypted blob stream into fixed-size volumes.
//!
//! [`cipher`] defines the cipher stream trait boundary the spec treats as an
//! external collaborator, plus a `gpg`-subprocess implementation of it.
//! [`block`] defines the block/footer source the writer pulls from.
//! [`writer`] is the splitting algorithm itself: fill each volume as close
//! to its target size as the cipher layer's own buffering allows, then
//! "top off" with incompressible filler rather than leave a short volume.

mod block;
mod cipher;
mod error;
mod writer;

pub use block::{Block, BlockSource, VecBlockSource};
pub use cipher::{CipherDirection, CipherParams, CipherStream, GpgCipher};
pub use error::VolumeError;
pub use writer::{
    write_volume, DEFAULT_FOOTER_RESERVE, DEFAULT_VOLUME_SIZE, FUDGE_MARGIN,
};
