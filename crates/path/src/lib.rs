#![deny(missing_docs)]
#![deny(clippy::undocumented_unsafe_blocks)]

//! The typed filesystem entry model shared by every other component: an
//! [`Index`] keys a tree position, an [`EntryKind`] tags what's there (or
//! that nothing is, via `Absent`), and [`fs`] bridges entries to real
//! filesystem state.
//!
//! # Examples
//!
//! ```
//! use path::{Index, PathEntry};
//!
//! let root = Index::root();
//! let child = root.join("a").join("b");
//! assert!(root < child);
//! assert_eq!(child.display_lossy(), "a/b");
//!
//! let gone = PathEntry::absent(child);
//! assert!(gone.is_absent());
//! ```

mod entry;
mod error;
pub mod fs;
mod index;

pub use entry::{Attrs, DeviceKind, EntryKind, PathEntry};
pub use error::PathError;
pub use index::Index;
