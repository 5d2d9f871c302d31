//! Linking signature archive filenames into [`SignatureChain`]s, the
//! analog of [`crate::BackupChain`] for the local signature store.

use naming::{parse_filename, FileKind, ParsedFilename};
use time::OffsetDateTime;

/// A full signature archive followed by zero or more new-signature
/// archives chaining off it.
///
/// Grounded on `collections.py`'s `SignatureChain`.
#[derive(Debug, Clone)]
pub struct SignatureChain {
    fullsig_filename: String,
    incsig_filenames: Vec<String>,
    /// The full signature's own timestamp.
    pub start_time: OffsetDateTime,
    /// The latest increment's `end_time`, or `start_time` if there are
    /// none yet.
    pub end_time: OffsetDateTime,
}

impl SignatureChain {
    fn new(fullsig_filename: String, time: OffsetDateTime) -> Self {
        Self {
            fullsig_filename,
            incsig_filenames: Vec::new(),
            start_time: time,
            end_time: time,
        }
    }

    /// Appends `filename` if `parsed` is a `NewSig` whose `start_time`
    /// matches this chain's current `end_time`.
    fn try_add(&mut self, filename: String, parsed: &ParsedFilename) -> bool {
        if parsed.kind != FileKind::NewSig || parsed.when.start() != self.end_time {
            return false;
        }
        self.end_time = parsed.when.end();
        self.incsig_filenames.push(filename);
        true
    }

    /// The chain's seeding full-signature filename.
    #[must_use]
    pub fn fullsig_filename(&self) -> &str {
        &self.fullsig_filename
    }

    /// The chain's new-signature filenames, oldest first.
    #[must_use]
    pub fn incsig_filenames(&self) -> &[String] {
        &self.incsig_filenames
    }

    /// Every filename in the chain, in the order a reader must apply them:
    /// the full signature first, then each increment.
    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.fullsig_filename.as_str())
            .chain(self.incsig_filenames.iter().map(String::as_str))
    }
}

/// Links `filenames` into [`SignatureChain`]s: each `FullSig` filename
/// seeds a new chain; `NewSig` filenames are then tried against existing
/// chains in filename order, first match wins.
///
/// Matches `collections.py`'s `get_signature_chains`. Returns
/// `(chains, orphaned_new_sig_filenames)`.
#[must_use]
pub fn assemble_signature_chains(filenames: &[String], sep: char) -> (Vec<SignatureChain>, Vec<String>) {
    let mut chains = Vec::new();
    let mut new_sigs: Vec<(String, ParsedFilename)> = Vec::new();

    for filename in filenames {
        let Some(parsed) = parse_filename(filename, sep) else {
            continue;
        };
        match parsed.kind {
            FileKind::FullSig => chains.push(SignatureChain::new(filename.clone(), parsed.when.start())),
            FileKind::NewSig => new_sigs.push((filename.clone(), parsed)),
            _ => {}
        }
    }

    new_sigs.sort_by(|a, b| a.0.cmp(&b.0));

    let mut orphaned = Vec::new();
    for (filename, parsed) in new_sigs {
        let mut added = false;
        for chain in &mut chains {
            if chain.try_add(filename.clone(), &parsed) {
                added = true;
                break;
            }
        }
        if !added {
            orphaned.push(filename);
        }
    }

    (chains, orphaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sig_chains_off_matching_full_sig() {
        let filenames = vec![
            "duplicity-full-signatures.2009-01-01T00:00:00Z.sigtar".to_string(),
            "duplicity-new-signatures.2009-01-01T00:00:00Z.to.2009-01-02T00:00:00Z.sigtar"
                .to_string(),
        ];
        let (chains, orphaned) = assemble_signature_chains(&filenames, ':');
        assert_eq!(chains.len(), 1);
        assert!(orphaned.is_empty());
        assert_eq!(chains[0].incsig_filenames().len(), 1);
    }

    #[test]
    fn unmatched_new_sig_is_orphaned() {
        let filenames = vec![
            "duplicity-new-signatures.2009-06-01T00:00:00Z.to.2009-06-02T00:00:00Z.sigtar"
                .to_string(),
        ];
        let (chains, orphaned) = assemble_signature_chains(&filenames, ':');
        assert!(chains.is_empty());
        assert_eq!(orphaned.len(), 1);
    }
}
