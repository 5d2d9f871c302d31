//! A single volume's coverage record: which indices it starts and ends on,
//! plus the content hashes taken over its plaintext payload.

use std::collections::BTreeMap;

use path::Index;

use crate::error::ManifestError;
use crate::index_fmt::{index_to_string, string_to_index};

/// Coverage and hash information for one volume of a backup set.
///
/// Grounded on `manifest.py`'s `VolumeInfo`; `hashes` uses a [`BTreeMap`]
/// rather than the original's unordered dict so [`VolumeInfo::to_string`]
/// renders `Hash` lines in a stable order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeInfo {
    /// This volume's number within its manifest.
    pub volume_number: u32,
    /// The first index whose data (or whose continuation, for a multivol
    /// diff split across volumes) this volume contains.
    pub start_index: Index,
    /// The last such index.
    pub end_index: Index,
    hashes: BTreeMap<String, String>,
}

impl VolumeInfo {
    /// Builds a `VolumeInfo` covering `[start_index, end_index]`, with no
    /// hashes recorded yet.
    #[must_use]
    pub fn new(volume_number: u32, start_index: Index, end_index: Index) -> Self {
        Self {
            volume_number,
            start_index,
            end_index,
            hashes: BTreeMap::new(),
        }
    }

    /// Records `value` (already hex-encoded) under `hash_name` (e.g.
    /// `"SHA1"`).
    pub fn set_hash(&mut self, hash_name: &str, value: impl Into<String>) {
        self.hashes.insert(hash_name.to_string(), value.into());
    }

    /// Looks up a previously recorded hash by name.
    #[must_use]
    pub fn hash(&self, hash_name: &str) -> Option<&str> {
        self.hashes.get(hash_name).map(String::as_str)
    }

    /// All recorded `(name, hex)` hashes, in name order.
    pub fn hashes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.hashes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns `true` if this volume might contain `prefix`.
    ///
    /// When `recursive` is set (the usual case — "does this volume hold
    /// anything under this directory prefix"), `prefix` is compared against
    /// `start_index` truncated to `prefix`'s own length, so a volume
    /// starting mid-directory still matches a query for that directory.
    /// Otherwise both bounds are compared at full width, for an exact-index
    /// lookup.
    #[must_use]
    pub fn contains(&self, prefix: &Index, recursive: bool) -> bool {
        if recursive {
            let n = prefix
                .components()
                .len()
                .min(self.start_index.components().len());
            let truncated_start =
                Index::from_components(self.start_index.components()[..n].to_vec());
            truncated_start <= *prefix && *prefix <= self.end_index
        } else {
            self.start_index <= *prefix && *prefix <= self.end_index
        }
    }

    /// Renders this volume as the `Volume <N>: ...` block `manifest.py`
    /// produces, without a trailing blank line.
    #[must_use]
    pub fn to_block_string(&self) -> String {
        let mut lines = vec![format!("Volume {}:", self.volume_number)];
        lines.push(format!(
            "    StartingPath   {}",
            index_to_string(&self.start_index)
        ));
        lines.push(format!(
            "    EndingPath     {}",
            index_to_string(&self.end_index)
        ));
        for (name, value) in &self.hashes {
            lines.push(format!("    Hash {name} {value}"));
        }
        lines.join("\n")
    }

    /// Parses a single `Volume <N>: ...` block (as produced by
    /// [`Self::to_block_string`]) back into a `VolumeInfo`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] if the header line is malformed, an index
    /// token's escape is malformed, or `StartingPath`/`EndingPath` is
    /// missing.
    pub fn parse_block(block: &str) -> Result<Self, ManifestError> {
        let mut lines = block.trim().lines();
        let header = lines.next().ok_or_else(|| ManifestError::BadVolumeHeader {
            line: String::new(),
        })?;
        let volume_number = header
            .trim()
            .strip_prefix("Volume ")
            .and_then(|rest| rest.strip_suffix(':'))
            .and_then(|n| n.trim().parse::<u32>().ok())
            .ok_or_else(|| ManifestError::BadVolumeHeader {
                line: header.to_string(),
            })?;

        let mut start_index = None;
        let mut end_index = None;
        let mut hashes = BTreeMap::new();

        for line in lines {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let mut fields = trimmed.split_whitespace();
            let Some(field_name) = fields.next() else {
                continue;
            };
            match field_name {
                "StartingPath" => {
                    let token = fields.next().unwrap_or(".");
                    start_index = Some(string_to_index(token)?);
                }
                "EndingPath" => {
                    let token = fields.next().unwrap_or(".");
                    end_index = Some(string_to_index(token)?);
                }
                "Hash" => {
                    if let (Some(name), Some(value)) = (fields.next(), fields.next()) {
                        hashes.insert(name.to_string(), value.to_string());
                    }
                }
                _ => {}
            }
        }

        let start_index = start_index.ok_or(ManifestError::MissingField {
            volume_number,
            field: "StartingPath",
        })?;
        let end_index = end_index.ok_or(ManifestError::MissingField {
            volume_number,
            field: "EndingPath",
        })?;

        Ok(Self {
            volume_number,
            start_index,
            end_index,
            hashes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_block_string() {
        let mut vi = VolumeInfo::new(
            3,
            Index::from_components(["a", "b"]),
            Index::from_components(["a", "c"]),
        );
        vi.set_hash("SHA1", "deadbeef");
        vi.set_hash("MD5", "cafef00d");

        let block = vi.to_block_string();
        let parsed = VolumeInfo::parse_block(&block).unwrap();
        assert_eq!(parsed, vi);
    }

    #[test]
    fn contains_recursive_truncates_start_to_prefix_length() {
        let vi = VolumeInfo::new(
            1,
            Index::from_components(["dir", "mid", "file1"]),
            Index::from_components(["dir", "zzz"]),
        );
        // "dir" alone is shorter than start_index; truncated start becomes
        // ("dir",), which is <= ("dir",) <= end_index ("dir","zzz").
        assert!(vi.contains(&Index::from_components(["dir"]), true));
        assert!(!vi.contains(&Index::from_components(["aaa"]), true));
    }

    #[test]
    fn contains_non_recursive_compares_full_width() {
        let vi = VolumeInfo::new(
            1,
            Index::from_components(["a"]),
            Index::from_components(["c"]),
        );
        assert!(vi.contains(&Index::from_components(["b"]), false));
        assert!(!vi.contains(&Index::from_components(["d"]), false));
    }

    #[test]
    fn missing_field_is_rejected() {
        let err = VolumeInfo::parse_block("Volume 1:\n    StartingPath .\n").unwrap_err();
        assert!(matches!(err, ManifestError::MissingField { field: "EndingPath", .. }));
    }
}
