//! The cipher stream trait boundary and its `gpg`-subprocess implementation.
//!
//! The wire format GPG itself produces is explicitly out of scope here: this
//! module never parses or emits OpenPGP packets. It only drives the real
//! `gpg` binary as a subprocess exactly as `gpg.py`'s `GPGFile`/`GPGWriteFile`
//! do — piping plaintext into its stdin (encrypt) or its stdout into our
//! caller (decrypt) — so the actual encryption framing stays the external
//! collaborator's responsibility.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use crate::error::VolumeError;

/// Which direction a [`CipherStream`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherDirection {
    /// Plaintext in, ciphertext out.
    Encrypt,
    /// Ciphertext in, plaintext out.
    Decrypt,
}

/// Construction parameters for a [`CipherStream`].
///
/// Mirrors `GPGFile.__init__`'s parameter list: symmetric encryption when
/// `recipients` is empty, public-key encryption to `recipients` otherwise;
/// `sign_key` is only meaningful alongside a non-empty `recipients` on
/// encrypt.
#[derive(Debug, Clone, Default)]
pub struct CipherParams {
    /// Passphrase for symmetric encryption, or the secret keyring passphrase
    /// for signing. `None` lets `gpg` prompt interactively.
    pub passphrase: Option<String>,
    /// 8-character hex signing key id, encrypt-with-recipients only.
    pub sign_key: Option<String>,
    /// Public-key recipients. Empty means symmetric mode.
    pub recipients: Vec<String>,
}

impl CipherParams {
    fn validate(&self, direction: CipherDirection) -> Result<(), VolumeError> {
        if direction == CipherDirection::Decrypt && !self.recipients.is_empty() {
            return Err(VolumeError::InvalidParams {
                reason: "recipients are meaningless when decrypting",
            });
        }
        if self.sign_key.is_some() && self.recipients.is_empty() {
            return Err(VolumeError::InvalidParams {
                reason: "sign_key requires at least one recipient",
            });
        }
        Ok(())
    }
}

/// A stream that encrypts or decrypts bytes passing through it.
///
/// The volume writer in [`crate::writer`] only depends on this trait, never
/// on `gpg` directly — any conforming implementation (a different cipher
/// binary, an in-process AEAD, a test double) can stand in for it.
pub trait CipherStream {
    /// Writes plaintext (encrypt direction) into the cipher.
    fn write(&mut self, buf: &[u8]) -> Result<(), VolumeError>;

    /// Reads decrypted plaintext (decrypt direction) out of the cipher.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, VolumeError>;

    /// Finishes the cipher stream, waiting for the underlying process (if
    /// any) to exit cleanly.
    fn close(self: Box<Self>) -> Result<(), VolumeError>;

    /// The signing key id that verified, for a decrypt stream whose content
    /// was signed. `None` if unsigned or not yet closed.
    fn signature(&self) -> Option<&str> {
        None
    }
}

/// A [`CipherStream`] backed by a real `gpg` subprocess, grounded directly
/// on `gpg.py`'s `GPGFile`.
pub struct GpgCipher {
    direction: CipherDirection,
    child: Child,
    signature: Option<String>,
    status_path: Option<PathBuf>,
}

impl GpgCipher {
    /// Spawns `gpg`, attaching `target_path` as its ciphertext side (stdout
    /// on encrypt, stdin on decrypt) and a status-fd file collecting
    /// `GOODSIG` lines for [`CipherStream::signature`].
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::InvalidParams`] for a direction/parameter
    /// combination `gpg.py` itself asserts against, or [`VolumeError::Io`] if
    /// spawning the subprocess fails.
    pub fn spawn(
        direction: CipherDirection,
        target_path: &Path,
        params: &CipherParams,
    ) -> Result<Self, VolumeError> {
        params.validate(direction)?;

        let mut cmd = Command::new("gpg");
        cmd.arg("--batch").arg("--no-secmem-warning");
        if let Some(key) = &params.sign_key {
            cmd.arg("--default-key").arg(key);
        }

        let status_path = match direction {
            CipherDirection::Decrypt => {
                let path = std::env::temp_dir().join(format!("duplirs-gpg-status-{}", std::process::id()));
                cmd.arg("--status-file").arg(&path);
                Some(path)
            }
            CipherDirection::Encrypt => None,
        };

        if let Some(passphrase) = &params.passphrase {
            cmd.arg("--passphrase").arg(passphrase);
        }

        match direction {
            CipherDirection::Encrypt => {
                if params.recipients.is_empty() {
                    cmd.arg("--symmetric");
                } else {
                    for recipient in &params.recipients {
                        cmd.arg("--recipient").arg(recipient);
                    }
                    cmd.arg("--encrypt");
                    if params.sign_key.is_some() {
                        cmd.arg("--sign");
                    }
                }
                cmd.arg("--output").arg(target_path);
                cmd.stdin(Stdio::piped()).stdout(Stdio::null());
            }
            CipherDirection::Decrypt => {
                cmd.arg("--decrypt").arg(target_path);
                cmd.stdin(Stdio::null()).stdout(Stdio::piped());
            }
        }

        let child = cmd.spawn()?;
        Ok(Self {
            direction,
            child,
            signature: None,
            status_path,
        })
    }
}

impl CipherStream for GpgCipher {
    fn write(&mut self, buf: &[u8]) -> Result<(), VolumeError> {
        debug_assert_eq!(self.direction, CipherDirection::Encrypt);
        let stdin = self
            .child
            .stdin
            .as_mut()
            .expect("encrypt direction always pipes stdin");
        stdin.write_all(buf)?;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, VolumeError> {
        debug_assert_eq!(self.direction, CipherDirection::Decrypt);
        let stdout = self
            .child
            .stdout
            .as_mut()
            .expect("decrypt direction always pipes stdout");
        Ok(stdout.read(buf)?)
    }

    fn close(mut self: Box<Self>) -> Result<(), VolumeError> {
        match self.direction {
            CipherDirection::Encrypt => {
                drop(self.child.stdin.take());
            }
            CipherDirection::Decrypt => {
                // Discard any unread output so gpg does not block on a full pipe.
                if let Some(mut stdout) = self.child.stdout.take() {
                    let mut sink = Vec::new();
                    let _ = stdout.read_to_end(&mut sink);
                }
            }
        }

        let status = self.child.wait()?;
        if !status.success() {
            return Err(VolumeError::CipherProcessFailed { status });
        }

        if let Some(path) = &self.status_path {
            if let Ok(contents) = std::fs::read_to_string(path) {
                self.signature = parse_goodsig(&contents);
            }
            let _ = std::fs::remove_file(path);
        }

        Ok(())
    }

    fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }
}

/// Extracts the trailing 8-character key id from a `[GNUPG:] GOODSIG <id>
/// ...` status line, matching `GPGFile.get_signature`'s regex.
fn parse_goodsig(status_buf: &str) -> Option<String> {
    for line in status_buf.lines() {
        if let Some(rest) = line.strip_prefix("[GNUPG:] GOODSIG ") {
            let keyid = rest.split_whitespace().next()?;
            if keyid.len() >= 8 {
                return Some(keyid[keyid.len() - 8..].to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipients_on_decrypt_are_rejected() {
        let params = CipherParams {
            recipients: vec!["ABCDEF".to_string()],
            ..Default::default()
        };
        let err = params.validate(CipherDirection::Decrypt).unwrap_err();
        assert!(matches!(err, VolumeError::InvalidParams { .. }));
    }

    #[test]
    fn sign_key_without_recipients_is_rejected() {
        let params = CipherParams {
            sign_key: Some("AA0E73D2".to_string()),
            ..Default::default()
        };
        let err = params.validate(CipherDirection::Encrypt).unwrap_err();
        assert!(matches!(err, VolumeError::InvalidParams { .. }));
    }

    #[test]
    fn symmetric_params_validate() {
        let params = CipherParams {
            passphrase: Some("hunter2".to_string()),
            ..Default::default()
        };
        params.validate(CipherDirection::Encrypt).unwrap();
    }

    #[test]
    fn goodsig_status_line_yields_last_eight_chars() {
        let status = "[GNUPG:] NEWSIG\n[GNUPG:] GOODSIG 1234567890ABCDEF Alice <a@example.invalid>\n";
        assert_eq!(parse_goodsig(status).as_deref(), Some("90ABCDEF"));
    }

    #[test]
    fn no_goodsig_line_yields_none() {
        assert_eq!(parse_goodsig("[GNUPG:] BADSIG DEADBEEF\n"), None);
    }
}
