//! `collection-status <target>`: prints the assembled chains and any
//! orphans or anomalies a real `duplicity collection-status` invocation
//! would warn about.

use backend::Backend;
use collections::CollectionsStatus;
use session::SessionConfig;

use crate::error::EngineError;

pub(crate) fn run(session: &SessionConfig, backend: &dyn Backend) -> Result<(), EngineError> {
    let sep = session.time_separator();
    let names = backend.list()?;
    let status = CollectionsStatus::collect(&names, &names, sep);
    status.warn();

    match status.matched_chain_pair() {
        Some((sig, chain)) => {
            println!(
                "current chain: {} .. {} ({} incremental set(s)); signature chain {} .. {} matches",
                chain.start_time,
                chain.end_time,
                chain.incsets().len(),
                sig.start_time,
                sig.end_time,
            );
        }
        None => println!("no fully signed chain available; the next backup will be a full backup"),
    }

    for chain in status.other_backup_chains() {
        println!("other backup chain: {} .. {}", chain.start_time, chain.end_time);
    }
    for sig in status.other_sig_chains() {
        println!("orphaned signature chain: {} .. {}", sig.start_time, sig.end_time);
    }
    if !status.incomplete_backup_sets().is_empty() {
        println!(
            "{} incomplete backup set(s), probably from an aborted session",
            status.incomplete_backup_sets().len()
        );
    }
    if !status.orphaned_backup_sets().is_empty() {
        println!("{} orphaned backup set(s) not part of any chain", status.orphaned_backup_sets().len());
    }
    if !status.orphaned_sig_filenames().is_empty() {
        println!("{} orphaned signature file(s)", status.orphaned_sig_filenames().len());
    }

    Ok(())
}
