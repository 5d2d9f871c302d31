#![deny(unsafe_code)]
#![deny(missing_docs)]

//! Rolling and strong checksum primitives backing the signature/delta engine.
//!
//! [`rolling`] implements the Adler-32-style weak checksum used to find
//! candidate block boundaries while scanning a new file against a prior
//! signature. [`strong`] exposes MD5 and SHA-1 streaming digests behind a
//! common [`strong::StrongDigest`] trait so the manifest and signature layers
//! can select an algorithm by name rather than hard-coding one.
//!
//! # Invariants
//!
//! - [`rolling::RollingChecksum`] truncates both state halves to 16 bits
//!   after every update, matching the classic rsync rolling checksum.
//! - Rolling `roll` rejects empty windows rather than silently wrapping.
//!
//! # Examples
//!
//! ```
//! use checksums::RollingChecksum;
//!
//! let mut rolling = RollingChecksum::new();
//! rolling.update(b"abcd");
//! assert_eq!(rolling.len(), 4);
//! rolling.roll(b'a', b'e').unwrap();
//! assert_eq!(rolling.len(), 4);
//! ```

pub mod rolling;
pub mod strong;

pub use rolling::{RollingChecksum, RollingError};
