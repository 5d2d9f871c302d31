//! Grouping remote and local filenames into backup sets and chains, and
//! answering "which chain covers this time" queries.
#![deny(missing_docs)]

mod chain;
mod error;
mod set;
mod sigchain;
mod status;

pub use chain::{assemble_backup_chains, BackupChain};
pub use error::CollectionsError;
pub use set::{assemble_backup_sets, BackupSet, SetFamily};
pub use sigchain::{assemble_signature_chains, SignatureChain};
pub use status::CollectionsStatus;
