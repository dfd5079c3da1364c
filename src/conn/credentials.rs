//! Credential resolution
//!
//! Resolves the password for a server's connection properties. An explicit
//! plain-text value always wins; otherwise an encrypted password is decoded
//! through the [`Decryptor`] capability; otherwise the password is the empty
//! default, which means "no credential configured" and is not an error.

use anyhow::{ensure, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::config::ServerSpec;
use crate::error::TargetError;

/// Capability for turning stored ciphertext back into a plaintext password.
///
/// The cryptography itself lives outside this crate; implementations are
/// supplied by the embedding system.
pub trait Decryptor: Send + Sync {
    /// Decrypt `ciphertext` using `key`, returning the plaintext password.
    fn decrypt(&self, ciphertext: &str, key: &str) -> Result<String>;
}

/// Resolve the password for one server.
///
/// Precedence: a non-empty `inline` value is returned unchanged; otherwise,
/// when both `encryption_key` and `encrypted_password` are present, the
/// decryptor output is returned; otherwise the empty default. A decryption
/// failure is fatal for this server only.
pub fn resolve_password(
    server: &ServerSpec,
    inline: &str,
    decryptor: &dyn Decryptor,
) -> Result<String, TargetError> {
    if !inline.is_empty() {
        return Ok(inline.to_string());
    }

    let key = server.encryption_key.as_deref().unwrap_or_default();
    let ciphertext = server.encrypted_password.as_deref().unwrap_or_default();
    if key.is_empty() || ciphertext.is_empty() {
        return Ok(String::new());
    }

    decryptor
        .decrypt(ciphertext, key)
        .map_err(|err| TargetError::Credential {
            server: server.label().to_string(),
            reason: format!("{err:#}"),
        })
}

/// Decryptor for deployments that store passwords base64-obfuscated.
///
/// Deployments with real encryption plug in their own [`Decryptor`]; this one
/// only reverses the obfuscation and requires a non-empty key.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Decryptor;

impl Decryptor for Base64Decryptor {
    fn decrypt(&self, ciphertext: &str, key: &str) -> Result<String> {
        ensure!(!key.is_empty(), "encryption key is empty");
        let bytes = STANDARD
            .decode(ciphertext)
            .context("ciphertext is not valid base64")?;
        String::from_utf8(bytes).context("decrypted password is not valid UTF-8")
    }
}
