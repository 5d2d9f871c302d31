//! `restore <target> <dest> [--time T]`: replays the full set and every
//! incremental set up to the requested time onto `dest`.

use std::path::Path;

use backend::Backend;
use collections::CollectionsStatus;
use logging::LogLevel;
use session::SessionConfig;

use crate::error::EngineError;
use crate::support;

pub(crate) fn run(dest: &Path, session: &SessionConfig, backend: &dyn Backend) -> Result<(), EngineError> {
    let sep = session.time_separator();
    let names = backend.list()?;
    let status = CollectionsStatus::collect(&names, &names, sep);
    status.warn();

    let target_time = session.restore_time().unwrap_or_else(|| session.current_time());
    let chain = status.get_backup_chain_at_time(target_time)?;
    let sets = chain.get_sets_at_time(target_time);

    std::fs::create_dir_all(dest)
        .map_err(|err| EngineError::message(format!("creating {}: {err}", dest.display())))?;

    let stage = tempfile::tempdir()
        .map_err(|err| EngineError::message(format!("creating scratch directory: {err}")))?;

    for set in sets {
        session.logger().log(
            LogLevel::Info,
            &format!("applying {:?} set ending {}", set.family(), set.when().end()),
        );
        let records = support::restore_delta_records(backend, set, session, stage.path())?;
        let basis = support::walk_all(dest)?;
        diffdir::patch_tree(dest, basis.into_iter(), records.into_iter(), |index, err| {
            session
                .logger()
                .log(LogLevel::Warn, &format!("skipping {}: {err}", index.display_lossy()));
        })?;
    }

    session.logger().log(LogLevel::Info, &format!("restore complete: {}", dest.display()));

    Ok(())
}
