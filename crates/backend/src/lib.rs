//! The storage trait boundary: a `Backend` trait the engine calls through,
//! plus a local-filesystem implementation.
#![deny(missing_docs)]

mod backend;
mod error;
mod local;

pub use backend::Backend;
pub use error::BackendError;
pub use local::LocalBackend;
