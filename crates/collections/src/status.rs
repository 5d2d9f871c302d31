//! Assembling backup chains and signature chains, matching them, and
//! answering time-based chain lookups.

use time::OffsetDateTime;

use crate::chain::{assemble_backup_chains, BackupChain};
use crate::error::CollectionsError;
use crate::set::{assemble_backup_sets, BackupSet};
use crate::sigchain::{assemble_signature_chains, SignatureChain};

/// Everything known about the available backup and signature chains after
/// listing a backend and an archive directory.
///
/// Grounded on `collections.py`'s `CollectionsStatus`. `all_backup_chains`
/// always holds every chain found, including whichever one ends up
/// [`Self::matched_chain_pair`] — mirroring the original, which computes
/// `all_backup_chains` before removing the matched pair from the "other"
/// lists used only for [`Self::warn`].
#[derive(Debug)]
pub struct CollectionsStatus {
    all_backup_chains: Vec<BackupChain>,
    sig_chains: Vec<SignatureChain>,
    matched: Option<(usize, usize)>,
    orphaned_sig_filenames: Vec<String>,
    orphaned_backup_sets: Vec<BackupSet>,
    incomplete_backup_sets: Vec<BackupSet>,
}

impl CollectionsStatus {
    /// Builds a `CollectionsStatus` from a backend filename listing and an
    /// archive-directory filename listing, both parsed with `sep`.
    #[must_use]
    pub fn collect(backend_filenames: &[String], archive_filenames: &[String], sep: char) -> Self {
        let (sets, _unparsed) = assemble_backup_sets(backend_filenames, sep);
        let (complete, incomplete): (Vec<_>, Vec<_>) =
            sets.into_iter().partition(BackupSet::is_complete);

        let (mut all_backup_chains, orphaned_backup_sets) = assemble_backup_chains(complete);
        all_backup_chains.sort_by_key(|c| c.end_time);

        let (mut sig_chains, orphaned_sig_filenames) =
            assemble_signature_chains(archive_filenames, sep);
        sig_chains.sort_by_key(|c| c.end_time);

        let matched = match (sig_chains.last(), all_backup_chains.last()) {
            (Some(sig), Some(bak))
                if sig.start_time == bak.start_time && sig.end_time == bak.end_time =>
            {
                Some((sig_chains.len() - 1, all_backup_chains.len() - 1))
            }
            _ => None,
        };

        Self {
            all_backup_chains,
            sig_chains,
            matched,
            orphaned_sig_filenames,
            orphaned_backup_sets,
            incomplete_backup_sets: incomplete,
        }
    }

    /// The most recent signature chain and backup chain, if their
    /// `(start_time, end_time)` windows agree — the pair future
    /// incremental backups extend.
    #[must_use]
    pub fn matched_chain_pair(&self) -> Option<(&SignatureChain, &BackupChain)> {
        self.matched
            .map(|(si, bi)| (&self.sig_chains[si], &self.all_backup_chains[bi]))
    }

    /// Backup chains other than the matched one, if any.
    pub fn other_backup_chains(&self) -> impl Iterator<Item = &BackupChain> {
        let matched_bi = self.matched.map(|(_, bi)| bi);
        self.all_backup_chains
            .iter()
            .enumerate()
            .filter(move |(i, _)| Some(*i) != matched_bi)
            .map(|(_, c)| c)
    }

    /// Signature chains other than the matched one, if any.
    pub fn other_sig_chains(&self) -> impl Iterator<Item = &SignatureChain> {
        let matched_si = self.matched.map(|(si, _)| si);
        self.sig_chains
            .iter()
            .enumerate()
            .filter(move |(i, _)| Some(*i) != matched_si)
            .map(|(_, c)| c)
    }

    /// Signature archive filenames that matched no chain.
    #[must_use]
    pub fn orphaned_sig_filenames(&self) -> &[String] {
        &self.orphaned_sig_filenames
    }

    /// Backup sets missing files, probably from an aborted session.
    #[must_use]
    pub fn incomplete_backup_sets(&self) -> &[BackupSet] {
        &self.incomplete_backup_sets
    }

    /// Incremental backup sets that matched no chain.
    #[must_use]
    pub fn orphaned_backup_sets(&self) -> &[BackupSet] {
        &self.orphaned_backup_sets
    }

    /// Logs warnings for every anomaly this status carries, matching
    /// `collections.py`'s `warn`.
    pub fn warn(&self) {
        if !self.orphaned_sig_filenames.is_empty() {
            tracing::warn!(
                files = ?self.orphaned_sig_filenames,
                "found orphaned signature files with no matching backup set"
            );
        }

        let other_sig_count = self.other_sig_chains().count();
        if other_sig_count > 0 {
            if self.matched.is_some() {
                tracing::warn!(count = other_sig_count, "found unnecessary signature chain(s)");
            } else {
                tracing::error!("found signatures but no corresponding backup files");
            }
        }

        if !self.incomplete_backup_sets.is_empty() {
            tracing::warn!(
                count = self.incomplete_backup_sets.len(),
                "found incomplete backup sets, probably from an aborted session"
            );
        }

        if !self.orphaned_backup_sets.is_empty() {
            tracing::warn!(
                count = self.orphaned_backup_sets.len(),
                "found orphaned backup sets not part of any chain"
            );
        }
    }

    /// Returns the backup chain whose `[start_time, end_time]` window
    /// contains `t`. Falls back to the most recent chain ending before
    /// `t`, then to the oldest chain.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionsError::NoBackupChains`] if no chains exist, or
    /// [`CollectionsError::AmbiguousTime`] if more than one chain's window
    /// covers `t` — which construction should make unreachable.
    pub fn get_backup_chain_at_time(&self, t: OffsetDateTime) -> Result<&BackupChain, CollectionsError> {
        if self.all_backup_chains.is_empty() {
            return Err(CollectionsError::NoBackupChains);
        }

        let mut covering = self
            .all_backup_chains
            .iter()
            .filter(|c| c.start_time <= t && t <= c.end_time);
        let first = covering.next();
        if covering.next().is_some() {
            return Err(CollectionsError::AmbiguousTime);
        }
        if let Some(chain) = first {
            return Ok(chain);
        }

        if let Some(chain) = self.all_backup_chains.iter().filter(|c| c.end_time < t).last() {
            return Ok(chain);
        }

        Ok(&self.all_backup_chains[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_sig_and_backup_chains_with_equal_windows() {
        let backend = vec![
            "duplicity-full.2009-01-01T00:00:00Z.manifest".to_string(),
            "duplicity-full.2009-01-01T00:00:00Z.vol1.difftar".to_string(),
        ];
        let archive = vec!["duplicity-full-signatures.2009-01-01T00:00:00Z.sigtar".to_string()];

        let status = CollectionsStatus::collect(&backend, &archive, ':');
        assert!(status.matched_chain_pair().is_some());
        assert_eq!(status.other_backup_chains().count(), 0);
        assert_eq!(status.other_sig_chains().count(), 0);
    }

    #[test]
    fn no_backup_chains_is_an_error() {
        let status = CollectionsStatus::collect(&[], &[], ':');
        let err = status
            .get_backup_chain_at_time(naming::parse_time("2009-01-01T00:00:00Z", ':').unwrap())
            .unwrap_err();
        assert!(matches!(err, CollectionsError::NoBackupChains));
    }

    #[test]
    fn falls_back_to_most_recent_chain_before_time() {
        let backend = vec!["duplicity-full.2009-01-01T00:00:00Z.manifest".to_string()];
        let status = CollectionsStatus::collect(&backend, &[], ':');

        let later = naming::parse_time("2020-01-01T00:00:00Z", ':').unwrap();
        let chain = status.get_backup_chain_at_time(later).unwrap();
        assert_eq!(chain.start_time, naming::parse_time("2009-01-01T00:00:00Z", ':').unwrap());
    }
}
