#![deny(missing_docs)]

//! Bidirectional grammar between remote backup filenames and structured
//! `(kind, time, volume, encrypted)` records.
//!
//! [`parse_filename`] never errors: an unrecognized filename yields `None`
//! so a collection-building caller can log and skip it rather than abort
//! the whole listing.

mod kind;
mod parsed;
mod time_fmt;

pub use kind::FileKind;
pub use parsed::{BackupTime, ParsedFilename};
pub use time_fmt::{format_time, parse_time};

/// Renders `parsed` as a remote filename, using `sep` as the time-of-day
/// separator.
#[must_use]
pub fn format_filename(parsed: &ParsedFilename, sep: char) -> String {
    let mut fields = vec![parsed.kind.file_prefix().to_string()];

    match parsed.when {
        BackupTime::Single(t) => fields.push(format_time(t, sep)),
        BackupTime::Range { start, end } => {
            fields.push(format_time(start, sep));
            fields.push("to".to_string());
            fields.push(format_time(end, sep));
        }
    }

    if let Some(n) = parsed.volume_number {
        fields.push(format!("vol{n}"));
    }

    fields.push(parsed.kind.file_suffix().to_string());

    if parsed.encrypted {
        fields.push("gpg".to_string());
    }

    fields.join(".")
}

/// Parses a remote filename into its structured form, or `None` if it does
/// not match any recognized kind.
#[must_use]
pub fn parse_filename(name: &str, sep: char) -> Option<ParsedFilename> {
    let mut fields: Vec<&str> = name.split('.').collect();

    let encrypted = if fields.last() == Some(&"gpg") {
        fields.pop();
        true
    } else {
        false
    };

    let suffix = fields.pop()?;
    if fields.is_empty() {
        return None;
    }
    let prefix = fields[0];
    let rest = &fields[1..];

    let is_incremental = prefix == "duplicity-inc" || prefix == "duplicity-new-signatures";
    let is_full_sig = prefix == "duplicity-full-signatures";
    let is_full = prefix == "duplicity-full";
    if !is_incremental && !is_full_sig && !is_full {
        return None;
    }

    let (when, rest) = if is_incremental {
        let start_tok = *rest.first()?;
        if rest.get(1).copied() != Some("to") {
            return None;
        }
        let end_tok = *rest.get(2)?;
        let start = parse_time(start_tok, sep)?;
        let end = parse_time(end_tok, sep)?;
        (BackupTime::Range { start, end }, &rest[3..])
    } else {
        let tok = *rest.first()?;
        let time = parse_time(tok, sep)?;
        (BackupTime::Single(time), &rest[1..])
    };

    let (volume_number, kind) = if let Some(vol_tok) = rest.first() {
        if rest.len() != 1 {
            return None;
        }
        if suffix != "difftar" {
            return None;
        }
        let n: u32 = vol_tok.strip_prefix("vol")?.parse().ok()?;
        let kind = if is_incremental {
            FileKind::IncVolume
        } else {
            FileKind::FullVolume
        };
        (Some(n), kind)
    } else {
        let kind = match (suffix, is_incremental, is_full_sig) {
            ("manifest", true, false) => FileKind::IncManifest,
            ("manifest", false, false) => FileKind::FullManifest,
            ("sigtar", true, false) => FileKind::NewSig,
            ("sigtar", false, true) => FileKind::FullSig,
            _ => return None,
        };
        (None, kind)
    };

    Some(ParsedFilename {
        kind,
        when,
        volume_number,
        encrypted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Month, PrimitiveDateTime, Time, UtcOffset};

    fn utc(y: i32, mo: Month, d: u8, h: u8, mi: u8, s: u8) -> time::OffsetDateTime {
        let date = Date::from_calendar_date(y, mo, d).unwrap();
        let time = Time::from_hms(h, mi, s).unwrap();
        PrimitiveDateTime::new(date, time).assume_offset(UtcOffset::UTC)
    }

    #[test]
    fn round_trips_full_manifest() {
        let parsed = ParsedFilename {
            kind: FileKind::FullManifest,
            when: BackupTime::Single(utc(2009, Month::January, 1, 0, 0, 0)),
            volume_number: None,
            encrypted: true,
        };
        let name = format_filename(&parsed, ':');
        assert_eq!(name, "duplicity-full.2009-01-01T00:00:00Z.manifest.gpg");
        assert_eq!(parse_filename(&name, ':'), Some(parsed));
    }

    #[test]
    fn round_trips_full_volume() {
        let parsed = ParsedFilename {
            kind: FileKind::FullVolume,
            when: BackupTime::Single(utc(2009, Month::January, 1, 0, 0, 0)),
            volume_number: Some(3),
            encrypted: false,
        };
        let name = format_filename(&parsed, ':');
        assert_eq!(name, "duplicity-full.2009-01-01T00:00:00Z.vol3.difftar");
        assert_eq!(parse_filename(&name, ':'), Some(parsed));
    }

    #[test]
    fn round_trips_incremental_manifest() {
        let parsed = ParsedFilename {
            kind: FileKind::IncManifest,
            when: BackupTime::Range {
                start: utc(2009, Month::January, 1, 0, 0, 0),
                end: utc(2009, Month::January, 2, 0, 0, 0),
            },
            volume_number: None,
            encrypted: true,
        };
        let name = format_filename(&parsed, ':');
        assert_eq!(
            name,
            "duplicity-inc.2009-01-01T00:00:00Z.to.2009-01-02T00:00:00Z.manifest.gpg"
        );
        assert_eq!(parse_filename(&name, ':'), Some(parsed));
    }

    #[test]
    fn round_trips_new_signatures() {
        let parsed = ParsedFilename {
            kind: FileKind::NewSig,
            when: BackupTime::Range {
                start: utc(2009, Month::January, 1, 0, 0, 0),
                end: utc(2009, Month::January, 2, 0, 0, 0),
            },
            volume_number: None,
            encrypted: true,
        };
        let name = format_filename(&parsed, ':');
        assert_eq!(parse_filename(&name, ':'), Some(parsed));
    }

    #[test]
    fn round_trips_custom_separator() {
        let parsed = ParsedFilename {
            kind: FileKind::FullSig,
            when: BackupTime::Single(utc(2009, Month::January, 1, 12, 30, 5)),
            volume_number: None,
            encrypted: false,
        };
        let name = format_filename(&parsed, '_');
        assert_eq!(name, "duplicity-full-signatures.2009-01-01T12_30_05Z.sigtar");
        assert_eq!(parse_filename(&name, '_'), Some(parsed));
    }

    #[test]
    fn unrecognized_filenames_yield_none() {
        assert_eq!(parse_filename("readme.txt", ':'), None);
        assert_eq!(parse_filename("duplicity-full.manifest", ':'), None);
        assert_eq!(
            parse_filename("duplicity-inc.2009-01-01T00:00:00Z.manifest", ':'),
            None,
            "incremental filename missing its .to.<end> pair"
        );
    }

    #[test]
    fn volume_number_requires_difftar_suffix() {
        assert_eq!(
            parse_filename("duplicity-full.2009-01-01T00:00:00Z.vol1.manifest", ':'),
            None
        );
    }
}
