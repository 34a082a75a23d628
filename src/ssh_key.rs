//! Ephemeral SSH key material for the build guest.
//!
//! Keys are ed25519: the public half is rendered in OpenSSH `authorized_keys`
//! format for upload, and the private half is kept as a PKCS#8 PEM document
//! for whichever communicator connects to the guest.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ed25519_dalek::SigningKey;
use ed25519_dalek::pkcs8::EncodePrivateKey;
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use rand_core::OsRng;
use thiserror::Error;

const KEY_TYPE: &str = "ssh-ed25519";

/// Errors raised while producing key material.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SshKeyError {
    /// The private key could not be serialised.
    #[error("failed to encode private key: {0}")]
    Encode(String),
    /// The public key blob grew past the SSH wire format limits.
    #[error("public key blob too large")]
    Oversized,
}

/// Freshly generated key pair.
#[derive(Clone)]
pub struct GeneratedKey {
    public_key: String,
    private_key_pem: String,
}

impl std::fmt::Debug for GeneratedKey {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("GeneratedKey")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

impl GeneratedKey {
    /// Generates a new key pair whose public half carries `comment`.
    ///
    /// # Errors
    ///
    /// Returns [`SshKeyError`] when the key cannot be encoded.
    pub fn generate(comment: &str) -> Result<Self, SshKeyError> {
        let signing_key = SigningKey::generate(&mut OsRng);
        let public_key = encode_public_key(signing_key.verifying_key().as_bytes(), comment)?;
        let private_key_pem = signing_key
            .to_pkcs8_pem(LineEnding::LF)
            .map(|pem| pem.as_str().to_owned())
            .map_err(|err| SshKeyError::Encode(err.to_string()))?;
        Ok(Self {
            public_key,
            private_key_pem,
        })
    }

    /// OpenSSH public key line (`ssh-ed25519 <base64> <comment>`).
    #[must_use]
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// PKCS#8 PEM encoding of the private key.
    #[must_use]
    pub fn private_key_pem(&self) -> &str {
        &self.private_key_pem
    }

    /// Consumes the key, returning the private PEM.
    #[must_use]
    pub fn into_private_key_pem(self) -> String {
        self.private_key_pem
    }
}

/// Renders raw ed25519 public key bytes as an OpenSSH public key line.
///
/// # Errors
///
/// Returns [`SshKeyError::Oversized`] if a field exceeds the `u32` length
/// prefix.
pub fn encode_public_key(key: &[u8], comment: &str) -> Result<String, SshKeyError> {
    let mut blob = Vec::with_capacity(KEY_TYPE.len() + key.len() + 8);
    push_field(&mut blob, KEY_TYPE.as_bytes())?;
    push_field(&mut blob, key)?;
    let encoded = STANDARD.encode(blob);
    if comment.is_empty() {
        Ok(format!("{KEY_TYPE} {encoded}"))
    } else {
        Ok(format!("{KEY_TYPE} {encoded} {comment}"))
    }
}

#[expect(
    clippy::big_endian_bytes,
    reason = "the SSH wire format mandates big-endian length prefixes"
)]
fn push_field(blob: &mut Vec<u8>, field: &[u8]) -> Result<(), SshKeyError> {
    let len = u32::try_from(field.len()).map_err(|_| SshKeyError::Oversized)?;
    blob.extend_from_slice(&len.to_be_bytes());
    blob.extend_from_slice(field);
    Ok(())
}
