//! Linking [`BackupSet`]s produced by [`crate::assemble_backup_sets`] into
//! full+incremental chains.

use time::OffsetDateTime;

use crate::set::{BackupSet, SetFamily};

/// A full backup set followed by zero or more incremental sets that chain
/// off it, each one's `start_time` matching the previous end.
///
/// Grounded on `collections.py`'s `BackupChain`.
#[derive(Debug)]
pub struct BackupChain {
    fullset: BackupSet,
    incsets: Vec<BackupSet>,
    /// The full set's own timestamp.
    pub start_time: OffsetDateTime,
    /// The latest increment's `end_time`, or `start_time` if there are none
    /// yet.
    pub end_time: OffsetDateTime,
}

impl BackupChain {
    fn new(fullset: BackupSet) -> Self {
        let t = fullset.when().start();
        Self {
            fullset,
            incsets: Vec::new(),
            start_time: t,
            end_time: t,
        }
    }

    /// Appends `incset` if its `start_time` matches this chain's current
    /// `end_time`, advancing `end_time`. Otherwise returns it unchanged.
    fn try_add_inc(&mut self, incset: BackupSet) -> Result<(), BackupSet> {
        if incset.when().start() == self.end_time {
            self.end_time = incset.when().end();
            self.incsets.push(incset);
            Ok(())
        } else {
            Err(incset)
        }
    }

    /// The chain's seeding full backup set.
    #[must_use]
    pub fn fullset(&self) -> &BackupSet {
        &self.fullset
    }

    /// The chain's incremental sets, in the order they were appended
    /// (increasing `end_time`).
    #[must_use]
    pub fn incsets(&self) -> &[BackupSet] {
        &self.incsets
    }

    /// The full set plus every incremental set whose `end_time` is at or
    /// before `t` — replaying these in order reconstructs the tree as of
    /// `t`.
    #[must_use]
    pub fn get_sets_at_time(&self, t: OffsetDateTime) -> Vec<&BackupSet> {
        let mut sets = vec![&self.fullset];
        sets.extend(self.incsets.iter().filter(|s| s.sort_time() <= t));
        sets
    }
}

/// Links `sets` (expected to all be [`BackupSet::is_complete`]) into
/// chains: each full set seeds a new chain, each incremental set is
/// appended to the unique chain whose `end_time` equals its `start_time`.
///
/// Sets are tried against chains in chain-creation order, first match
/// wins, matching `collections.py`'s `get_backup_chains`. Returns
/// `(chains, orphaned_incremental_sets)` for sets matching no chain.
#[must_use]
pub fn assemble_backup_chains(mut sets: Vec<BackupSet>) -> (Vec<BackupChain>, Vec<BackupSet>) {
    sets.sort_by_key(BackupSet::sort_time);

    let mut chains: Vec<BackupChain> = Vec::new();
    let mut orphaned = Vec::new();

    for set in sets {
        if set.family() == SetFamily::Full {
            chains.push(BackupChain::new(set));
            continue;
        }

        let mut remaining = Some(set);
        for chain in &mut chains {
            if let Some(s) = remaining.take() {
                match chain.try_add_inc(s) {
                    Ok(()) => break,
                    Err(s) => remaining = Some(s),
                }
            }
        }
        if let Some(s) = remaining {
            orphaned.push(s);
        }
    }

    (chains, orphaned)
}
