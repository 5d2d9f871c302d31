//! Quoting scheme for rendering an [`Index`] inside manifest text, grounded
//! on `manifest.py`'s `index_to_string`/`string_to_index`: components are
//! joined with `/`, and if the joined form contains whitespace or any of
//! `\ " '` the whole thing is double-quoted with those bytes escaped as
//! `\xHH`.
//!
//! Unlike the original (which manipulates raw bytes throughout), this
//! renders to a Rust `String`: a component whose bytes are not valid UTF-8
//! is lossily replaced rather than carried through exactly. Manifests are
//! a restore aid, not the backup's source of truth for names, so this
//! trades perfect byte fidelity for an idiomatic text-processing API.

use std::ffi::OsString;
use std::os::unix::ffi::{OsStrExt, OsStringExt};

use path::Index;

use crate::error::ManifestError;

fn needs_quoting(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .any(|&b| b.is_ascii_whitespace() || matches!(b, b'\\' | b'"' | b'\''))
}

fn quote(bytes: &[u8]) -> String {
    let mut out = Vec::with_capacity(bytes.len());
    for &b in bytes {
        if b.is_ascii_whitespace() || matches!(b, b'\\' | b'"' | b'\'') {
            out.extend_from_slice(format!("\\x{b:02x}").as_bytes());
        } else {
            out.push(b);
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn unquote(token: &str) -> Result<Vec<u8>, ManifestError> {
    let bytes = token.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            if bytes.get(i + 1) != Some(&b'x') || i + 4 > bytes.len() {
                return Err(ManifestError::BadEscape {
                    token: token.to_string(),
                });
            }
            let hex = std::str::from_utf8(&bytes[i + 2..i + 4]).map_err(|_| {
                ManifestError::BadEscape {
                    token: token.to_string(),
                }
            })?;
            let byte = u8::from_str_radix(hex, 16).map_err(|_| ManifestError::BadEscape {
                token: token.to_string(),
            })?;
            out.push(byte);
            i += 4;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

/// Renders `index` as it appears in a manifest's `StartingPath`/`EndingPath`
/// line: `.` at the root, otherwise the `/`-joined components, quoted and
/// escaped if any component contains whitespace or `\ " '`.
#[must_use]
pub fn index_to_string(index: &Index) -> String {
    if index.is_root() {
        return ".".to_string();
    }

    let joined = index
        .components()
        .iter()
        .map(|c| c.as_bytes())
        .collect::<Vec<_>>()
        .join(&b'/');

    if needs_quoting(&joined) {
        format!("\"{}\"", quote(&joined))
    } else {
        String::from_utf8_lossy(&joined).into_owned()
    }
}

/// Parses a token produced by [`index_to_string`] back into an [`Index`].
pub fn string_to_index(token: &str) -> Result<Index, ManifestError> {
    if token == "." {
        return Ok(Index::root());
    }

    let joined = if let Some(inner) = token
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| token.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
    {
        unquote(inner)?
    } else {
        token.as_bytes().to_vec()
    };

    let components = joined
        .split(|&b| b == b'/')
        .map(|bytes| OsString::from_vec(bytes.to_vec()))
        .collect::<Vec<_>>();
    Ok(Index::from_components(components))
}
