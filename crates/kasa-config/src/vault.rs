//! Passphrase-keyed AES-256-GCM vault for the cloud credential.
//!
//! Stored form is standard base64 of `nonce || ciphertext || tag`, with a
//! fresh random 96-bit nonce per seal. The key is the 32 ASCII bytes of
//! the lowercase hex MD5 digest of the passphrase, which is what blobs
//! written by earlier releases use. That derivation is fast and unsalted:
//! it protects the file at rest, not against offline guessing.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use md5::{Digest, Md5};
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Length of the derived AES-256 key.
pub const KEY_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum VaultError {
    /// Wrong passphrase, tampered blob, truncated blob, or bad base64.
    /// Never partially succeeds.
    #[error("decryption failed -- wrong passphrase or corrupted credentials")]
    DecryptionFailed,

    #[error("encryption failed: {0}")]
    Encryption(&'static str),

    #[error("credential encoding failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Cloud account username and password. Plaintext lives only in memory.
#[derive(Debug, Clone)]
pub struct Credential {
    pub username: String,
    pub password: SecretString,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.username == other.username
            && self.password.expose_secret() == other.password.expose_secret()
    }
}

impl Eq for Credential {}

/// On-disk plaintext layout: `{"username": ..., "password": ...}`.
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct CredentialRecord {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

// ── Credential API ──────────────────────────────────────────────────

/// Encrypt a credential under `passphrase` into a storable base64 blob.
pub fn encrypt(passphrase: &SecretString, credential: &Credential) -> Result<String, VaultError> {
    let record = CredentialRecord {
        username: credential.username.clone(),
        password: credential.password.expose_secret().to_owned(),
    };
    let plaintext = Zeroizing::new(serde_json::to_vec(&record)?);
    encrypt_bytes(passphrase, &plaintext)
}

/// Decrypt a blob produced by [`encrypt`].
pub fn decrypt(passphrase: &SecretString, blob: &str) -> Result<Credential, VaultError> {
    let plaintext = decrypt_bytes(passphrase, blob)?;
    let mut record: CredentialRecord = serde_json::from_slice(&plaintext)?;
    Ok(Credential {
        username: std::mem::take(&mut record.username),
        password: SecretString::from(std::mem::take(&mut record.password)),
    })
}

// ── Byte-level API ──────────────────────────────────────────────────

/// Seal arbitrary bytes (including an empty slice) into a base64 blob.
pub fn encrypt_bytes(passphrase: &SecretString, plaintext: &[u8]) -> Result<String, VaultError> {
    let key = derive_key(passphrase)?;
    let sealed = seal(&key, plaintext)?;
    Ok(STANDARD.encode(sealed))
}

/// Open a base64 blob produced by [`encrypt_bytes`].
pub fn decrypt_bytes(passphrase: &SecretString, blob: &str) -> Result<Zeroizing<Vec<u8>>, VaultError> {
    let data = STANDARD
        .decode(blob.trim())
        .map_err(|_| VaultError::DecryptionFailed)?;
    let key = derive_key(passphrase)?;
    open(&key, &data)
}

/// Derive the AES key: lowercase hex of `md5(passphrase)`, as ASCII bytes.
pub fn derive_key(passphrase: &SecretString) -> Result<Zeroizing<[u8; KEY_LEN]>, VaultError> {
    let mut digest = Md5::digest(passphrase.expose_secret().as_bytes());
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    let encoded = hex::encode_to_slice(digest.as_slice(), &mut key[..]);
    digest.as_mut_slice().zeroize();
    encoded.map_err(|_| VaultError::Encryption("key derivation produced wrong length"))?;
    Ok(key)
}

/// AES-256-GCM seal with a random nonce. Returns `nonce || ciphertext || tag`.
fn seal(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<Vec<u8>, VaultError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| VaultError::Encryption("failed to create AES-256-GCM key"))?;
    let key = LessSafeKey::new(unbound);

    let mut nonce_bytes = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce_bytes)
        .map_err(|_| VaultError::Encryption("failed to generate random nonce"))?;

    let mut in_out = plaintext.to_vec();
    key.seal_in_place_append_tag(
        Nonce::assume_unique_for_key(nonce_bytes),
        Aad::empty(),
        &mut in_out,
    )
    .map_err(|_| VaultError::Encryption("AES-256-GCM seal failed"))?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + in_out.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&in_out);
    in_out.zeroize();
    Ok(sealed)
}

/// Split off the nonce and open. Any failure is `DecryptionFailed`.
fn open(key: &[u8; KEY_LEN], data: &[u8]) -> Result<Zeroizing<Vec<u8>>, VaultError> {
    if data.len() < NONCE_LEN + AES_256_GCM.tag_len() {
        return Err(VaultError::DecryptionFailed);
    }
    let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
    let nonce =
        Nonce::try_assume_unique_for_key(nonce_bytes).map_err(|_| VaultError::DecryptionFailed)?;

    let unbound = UnboundKey::new(&AES_256_GCM, key).map_err(|_| VaultError::DecryptionFailed)?;
    let key = LessSafeKey::new(unbound);

    let mut in_out = Zeroizing::new(ciphertext.to_vec());
    let plaintext_len = key
        .open_in_place(nonce, Aad::empty(), in_out.as_mut_slice())
        .map_err(|_| VaultError::DecryptionFailed)?
        .len();
    in_out.truncate(plaintext_len);
    Ok(in_out)
}
