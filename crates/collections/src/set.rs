//! Grouping remote filenames into per-session [`BackupSet`]s.

use std::collections::BTreeMap;

use naming::{BackupTime, FileKind};
use time::OffsetDateTime;

/// Whether a [`BackupSet`] is a full backup or an increment over one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetFamily {
    /// A full backup: seeds a new [`crate::BackupChain`].
    Full,
    /// An increment: extends an existing chain whose `end_time` matches
    /// this set's `start_time`.
    Inc,
}

/// All the files produced by one backup session: a manifest plus the
/// numbered volumes it describes.
///
/// Grounded on `collections.py`'s `BackupSet`: filenames are assigned by
/// matching `(family, time)` (or `(family, start_time, end_time)` for
/// increments) against the first filename seen for the set.
#[derive(Debug, Clone)]
pub struct BackupSet {
    family: SetFamily,
    when: BackupTime,
    manifest_filename: Option<String>,
    volumes: BTreeMap<u32, String>,
}

impl BackupSet {
    pub(crate) fn new(family: SetFamily, when: BackupTime) -> Self {
        Self {
            family,
            when,
            manifest_filename: None,
            volumes: BTreeMap::new(),
        }
    }

    /// Whether a manifest filename has been assigned to this set — the
    /// same "is this session complete" test the original uses.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.manifest_filename.is_some()
    }

    /// Whether this is a full or incremental set.
    #[must_use]
    pub fn family(&self) -> SetFamily {
        self.family
    }

    /// The timestamp(s) this set is stamped with.
    #[must_use]
    pub fn when(&self) -> BackupTime {
        self.when
    }

    /// The time used to order sets among each other: a full set's single
    /// timestamp, or an incremental set's `end_time`.
    #[must_use]
    pub fn sort_time(&self) -> OffsetDateTime {
        self.when.end()
    }

    /// The remote manifest filename, once assigned.
    #[must_use]
    pub fn manifest_filename(&self) -> Option<&str> {
        self.manifest_filename.as_deref()
    }

    /// Volume numbers and their filenames, in increasing volume-number
    /// order.
    pub fn volumes(&self) -> impl Iterator<Item = (u32, &str)> {
        self.volumes.iter().map(|(&n, f)| (n, f.as_str()))
    }

    /// All filenames belonging to this set (manifest first, then volumes),
    /// for a delete operation.
    pub fn all_filenames(&self) -> impl Iterator<Item = &str> {
        self.manifest_filename
            .as_deref()
            .into_iter()
            .chain(self.volumes.values().map(String::as_str))
    }

    pub(crate) fn set_manifest(&mut self, filename: String) {
        self.manifest_filename = Some(filename);
    }

    pub(crate) fn add_volume(&mut self, volume_number: u32, filename: String) {
        if self.volumes.insert(volume_number, filename).is_some() {
            tracing::warn!(
                volume_number,
                "duplicate volume number within a single backup set"
            );
        }
    }
}

/// Groups `filenames` into [`BackupSet`]s by `(family, time)`, parsing each
/// with `sep` as the naming grammar's time separator.
///
/// Returns `(sets, unparsed_filenames)` — filenames `naming::parse_filename`
/// does not recognize are reported separately rather than silently dropped,
/// so a caller can log them. Signature-chain artifacts (`FullSig`/`NewSig`)
/// are parsed but do not belong to a `BackupSet`, so they are skipped here.
#[must_use]
pub fn assemble_backup_sets(filenames: &[String], sep: char) -> (Vec<BackupSet>, Vec<String>) {
    let mut groups: BTreeMap<SetKey, BackupSet> = BTreeMap::new();
    let mut unparsed = Vec::new();

    for filename in filenames {
        let Some(parsed) = naming::parse_filename(filename, sep) else {
            unparsed.push(filename.clone());
            continue;
        };

        if matches!(parsed.kind, FileKind::FullSig | FileKind::NewSig) {
            continue;
        }

        let family = if parsed.kind.is_incremental() {
            SetFamily::Inc
        } else {
            SetFamily::Full
        };
        let key = SetKey::new(family, parsed.when);
        let set = groups
            .entry(key)
            .or_insert_with(|| BackupSet::new(family, parsed.when));

        if parsed.kind.is_manifest() {
            set.set_manifest(filename.clone());
        } else if let Some(n) = parsed.volume_number {
            set.add_volume(n, filename.clone());
        }
    }

    (groups.into_values().collect(), unparsed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct SetKey {
    is_full: bool,
    start: i64,
    end: i64,
}

impl SetKey {
    fn new(family: SetFamily, when: BackupTime) -> Self {
        Self {
            is_full: family == SetFamily::Full,
            start: when.start().unix_timestamp(),
            end: when.end().unix_timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_manifest_and_volumes_into_one_set() {
        let filenames = vec![
            "duplicity-full.2009-01-01T00:00:00Z.vol1.difftar".to_string(),
            "duplicity-full.2009-01-01T00:00:00Z.vol2.difftar".to_string(),
            "duplicity-full.2009-01-01T00:00:00Z.manifest".to_string(),
        ];
        let (sets, unparsed) = assemble_backup_sets(&filenames, ':');
        assert!(unparsed.is_empty());
        assert_eq!(sets.len(), 1);
        assert!(sets[0].is_complete());
        assert_eq!(sets[0].volumes().count(), 2);
    }

    #[test]
    fn separate_timestamps_become_separate_sets() {
        let filenames = vec![
            "duplicity-full.2009-01-01T00:00:00Z.manifest".to_string(),
            "duplicity-full.2009-01-02T00:00:00Z.manifest".to_string(),
        ];
        let (sets, _) = assemble_backup_sets(&filenames, ':');
        assert_eq!(sets.len(), 2);
    }

    #[test]
    fn unrecognized_filenames_are_reported_not_dropped() {
        let filenames = vec!["readme.txt".to_string()];
        let (sets, unparsed) = assemble_backup_sets(&filenames, ':');
        assert!(sets.is_empty());
        assert_eq!(unparsed, filenames);
    }

    #[test]
    fn incomplete_set_without_manifest_is_not_complete() {
        let filenames = vec!["duplicity-full.2009-01-01T00:00:00Z.vol1.difftar".to_string()];
        let (sets, _) = assemble_backup_sets(&filenames, ':');
        assert!(!sets[0].is_complete());
    }
}
