//! The six filename "kinds" this grammar recognizes.

/// What a remote backup filename names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// Manifest of a full backup set.
    FullManifest,
    /// Manifest of an incremental backup set.
    IncManifest,
    /// One volume of a full backup set's payload.
    FullVolume,
    /// One volume of an incremental backup set's payload.
    IncVolume,
    /// Signature archive for a full backup set.
    FullSig,
    /// Signature archive covering the increment between two points in a
    /// signature chain.
    NewSig,
}

impl FileKind {
    /// True for the two manifest kinds.
    #[must_use]
    pub fn is_manifest(self) -> bool {
        matches!(self, Self::FullManifest | Self::IncManifest)
    }

    /// True for the three kinds that belong to an incremental set rather
    /// than a full one, and are therefore stamped with a `(start, end)`
    /// time range instead of a single timestamp.
    #[must_use]
    pub fn is_incremental(self) -> bool {
        matches!(self, Self::IncManifest | Self::IncVolume | Self::NewSig)
    }

    /// True for the two kinds that carry a volume number.
    #[must_use]
    pub fn is_volume(self) -> bool {
        matches!(self, Self::FullVolume | Self::IncVolume)
    }

    pub(crate) fn file_prefix(self) -> &'static str {
        match self {
            Self::FullManifest | Self::FullVolume => "duplicity-full",
            Self::IncManifest | Self::IncVolume => "duplicity-inc",
            Self::FullSig => "duplicity-full-signatures",
            Self::NewSig => "duplicity-new-signatures",
        }
    }

    pub(crate) fn file_suffix(self) -> &'static str {
        match self {
            Self::FullManifest | Self::IncManifest => "manifest",
            Self::FullVolume | Self::IncVolume => "difftar",
            Self::FullSig | Self::NewSig => "sigtar",
        }
    }
}
