//! The full per-session manifest: every volume's coverage and hashes.

use std::collections::BTreeMap;

use path::Index;

use crate::error::ManifestError;
use crate::volume_info::VolumeInfo;

/// The list of volumes making up one backup set, keyed by volume number.
///
/// Grounded on `manifest.py`'s `Manifest`. Two manifests are equal iff they
/// hold the same set of volume numbers and each corresponding
/// [`VolumeInfo`] is field-equal — which is exactly what deriving
/// [`PartialEq`] over a [`BTreeMap`] gives for free.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    volumes: BTreeMap<u32, VolumeInfo>,
}

impl Manifest {
    /// Builds an empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `vi` to the manifest.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::DuplicateVolume`] if a `VolumeInfo` is
    /// already registered under the same volume number.
    pub fn add_volume_info(&mut self, vi: VolumeInfo) -> Result<(), ManifestError> {
        if self.volumes.contains_key(&vi.volume_number) {
            return Err(ManifestError::DuplicateVolume {
                volume_number: vi.volume_number,
            });
        }
        self.volumes.insert(vi.volume_number, vi);
        Ok(())
    }

    /// Looks up a volume's info by number.
    #[must_use]
    pub fn volume_info(&self, volume_number: u32) -> Option<&VolumeInfo> {
        self.volumes.get(&volume_number)
    }

    /// Iterates over volumes in increasing volume-number order.
    pub fn volumes(&self) -> impl Iterator<Item = &VolumeInfo> {
        self.volumes.values()
    }

    /// The volume numbers that might contain `prefix`, in increasing order.
    #[must_use]
    pub fn get_containing_volumes(&self, prefix: &Index, recursive: bool) -> Vec<u32> {
        self.volumes
            .values()
            .filter(|vi| vi.contains(prefix, recursive))
            .map(|vi| vi.volume_number)
            .collect()
    }

    /// Renders the manifest as the concatenation of each volume's block,
    /// separated by blank lines, matching `manifest.py`'s `to_string`.
    #[must_use]
    pub fn to_string_repr(&self) -> String {
        let blocks: Vec<String> = self.volumes.values().map(VolumeInfo::to_block_string).collect();
        let mut out = blocks.join("\n");
        out.push('\n');
        out
    }

    /// Parses a manifest rendered by [`Self::to_string_repr`].
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] if any volume block fails to parse, or two
    /// blocks share a volume number.
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let mut manifest = Self::new();
        for block in split_volume_blocks(text) {
            manifest.add_volume_info(VolumeInfo::parse_block(block)?)?;
        }
        Ok(manifest)
    }
}

/// Splits manifest text into per-volume blocks, each starting at a line
/// beginning with `Volume `.
fn split_volume_blocks(text: &str) -> Vec<&str> {
    let mut starts = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.trim_start().starts_with("Volume ") {
            starts.push(offset);
        }
        offset += line.len();
    }
    starts.push(text.len());
    starts
        .windows(2)
        .map(|pair| text[pair[0]..pair[1]].trim_end())
        .filter(|block| !block.is_empty())
        .collect()
}
