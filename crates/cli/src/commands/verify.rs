//! `verify <source> <target>`: restores to a scratch directory and
//! compares the result against the live tree using the same equality a
//! diff pass uses to decide whether a path changed at all.

use std::path::Path;

use backend::Backend;
use session::SessionConfig;

use crate::error::EngineError;
use crate::support;

pub(crate) fn run(source: &Path, session: &SessionConfig, backend: &dyn Backend) -> Result<(), EngineError> {
    let scratch = tempfile::tempdir()
        .map_err(|err| EngineError::message(format!("creating scratch directory: {err}")))?;
    let restored = scratch.path().join("restored");
    std::fs::create_dir_all(&restored)
        .map_err(|err| EngineError::message(format!("creating {}: {err}", restored.display())))?;

    super::restore::run(&restored, session, backend)?;

    let live_entries = support::walk_all(source)?;
    let restored_entries = support::walk_all(&restored)?;

    for pair in diffdir::collate(live_entries, restored_entries) {
        match pair {
            (Some(live), Some(copy)) => {
                if !live.matches(&copy) {
                    return Err(EngineError::message(format!(
                        "verify failed: {} differs between source and restore",
                        live.index.display_lossy()
                    )));
                }
            }
            (Some(live), None) => {
                return Err(EngineError::message(format!(
                    "verify failed: {} is missing from the restore",
                    live.index.display_lossy()
                )));
            }
            (None, Some(copy)) => {
                return Err(EngineError::message(format!(
                    "verify failed: {} exists in the restore but not in the source",
                    copy.index.display_lossy()
                )));
            }
            (None, None) => unreachable!("collate never yields (None, None)"),
        }
    }

    println!("verify: {} matches the restored backup", source.display());
    Ok(())
}
