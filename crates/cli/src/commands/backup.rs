//! `backup <source> <target>`: a full backup if the target carries no
//! matched chain yet, an incremental extending it otherwise.

use std::path::Path;

use backend::Backend;
use collections::CollectionsStatus;
use logging::LogLevel;
use naming::{BackupTime, FileKind, ParsedFilename};
use session::SessionConfig;

use crate::error::EngineError;
use crate::support;

pub(crate) fn run(source: &Path, session: &SessionConfig, backend: &dyn Backend) -> Result<(), EngineError> {
    let sep = session.time_separator();
    let names = backend.list()?;
    let status = CollectionsStatus::collect(&names, &names, sep);
    status.warn();

    let stage = tempfile::tempdir()
        .map_err(|err| EngineError::message(format!("creating scratch directory: {err}")))?;

    let new_entries = support::walk_all(source)?;

    let (prior_sig_entries, when, manifest_kind, sig_kind, volume_kind) = match status.matched_chain_pair() {
        Some((sigchain, _backchain)) => {
            session
                .logger()
                .log(LogLevel::Info, "matched chain found, running an incremental backup");
            let loaded = support::load_sig_entries(backend, sigchain, stage.path())?;
            let when = BackupTime::Range {
                start: sigchain.end_time,
                end: session.current_time(),
            };
            (loaded, when, FileKind::IncManifest, FileKind::NewSig, FileKind::IncVolume)
        }
        None => {
            session
                .logger()
                .log(LogLevel::Info, "no matched chain found, running a full backup");
            let when = BackupTime::Single(session.current_time());
            (Vec::new(), when, FileKind::FullManifest, FileKind::FullSig, FileKind::FullVolume)
        }
    };

    let (records, sig_entries) = diffdir::run_diff_session(
        new_entries.into_iter(),
        prior_sig_entries.into_iter(),
        source,
        |index, err| {
            session
                .logger()
                .log(LogLevel::Warn, &format!("skipping {}: {err}", index.display_lossy()));
        },
    );

    let manifest = support::write_volumes(&records, when, volume_kind, session, backend, stage.path())?;

    let sig_bytes = diffdir::write_sig_archive(Vec::new(), sig_entries)?;
    let sig_local = stage.path().join("signatures.tmp");
    std::fs::write(&sig_local, &sig_bytes)
        .map_err(|err| EngineError::message(format!("writing {}: {err}", sig_local.display())))?;
    let sig_remote_name = naming::format_filename(
        &ParsedFilename {
            kind: sig_kind,
            when,
            volume_number: None,
            encrypted: false,
        },
        sep,
    );
    backend.put(&sig_local, Some(&sig_remote_name))?;

    let manifest_local = stage.path().join("manifest.tmp");
    std::fs::write(&manifest_local, manifest.to_string_repr())
        .map_err(|err| EngineError::message(format!("writing {}: {err}", manifest_local.display())))?;
    let manifest_remote_name = naming::format_filename(
        &ParsedFilename {
            kind: manifest_kind,
            when,
            volume_number: None,
            encrypted: false,
        },
        sep,
    );
    backend.put(&manifest_local, Some(&manifest_remote_name))?;

    session.logger().log(
        LogLevel::Info,
        &format!("backup complete: {} volume(s) written", manifest.volumes().count()),
    );

    Ok(())
}
