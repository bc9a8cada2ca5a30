//! Password-protected container for one secret
//!
//! Encrypt: fresh salt + IV → KDF → AES-128-CTR → MAC.
//! Decrypt: cipher check → KDF → constant-time MAC check → AES-128-CTR.
//! Nothing is decrypted until the MAC matches.

use zeroize::Zeroizing;

use super::cipher::{self, CIPHER_AES_128_CTR};
use super::kdf::{self, KdfAlgorithm, KdfParams, KdfProfile};
use super::KeystoreOptions;
use crate::error::{KeyError, KeyResult};

/// An encrypted secret plus everything needed to decrypt it, except the
/// password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeystoreContainer {
    /// Cipher identifier; only `aes-128-ctr` decrypts
    pub cipher: String,
    pub cipher_text: Vec<u8>,
    pub iv: Vec<u8>,
    pub kdf: KdfParams,
    /// HMAC-SHA256 over `cipher_text`
    pub mac: Vec<u8>,
}

impl KeystoreContainer {
    /// Identifier of the recorded KDF (`scrypt` or `pbkdf2`).
    pub fn kdf_name(&self) -> &'static str {
        self.kdf.algorithm().name()
    }
}

/// Encrypt `key` with scrypt under `profile`.
pub fn encrypt(key: &[u8], password: &[u8], profile: KdfProfile) -> KeyResult<KeystoreContainer> {
    encrypt_with(
        key,
        password,
        KeystoreOptions {
            algorithm: KdfAlgorithm::Scrypt,
            profile,
        },
    )
}

/// Encrypt `key` with the KDF and cost profile in `options`.
pub fn encrypt_with(
    key: &[u8],
    password: &[u8],
    options: KeystoreOptions,
) -> KeyResult<KeystoreContainer> {
    if key.is_empty() {
        return Err(KeyError::InvalidPrivateKey(
            "refusing to encrypt an empty key".into(),
        ));
    }

    let salt = kdf::generate_salt()?;
    let iv = cipher::generate_iv()?;
    let params = KdfParams::for_profile(options.algorithm, options.profile, salt);

    seal(key, password, params, iv)
}

/// Encrypt with caller-chosen salt (inside `params`) and IV.
pub(crate) fn seal(
    key: &[u8],
    password: &[u8],
    params: KdfParams,
    iv: Vec<u8>,
) -> KeyResult<KeystoreContainer> {
    let derived = params.derive_key(password)?;
    let cipher_text = cipher::apply_keystream(&derived, &iv, key)?;
    let mac = cipher::compute_mac(&derived, &cipher_text)?;

    tracing::debug!(
        kdf = params.algorithm().name(),
        len = key.len(),
        "sealed keystore"
    );

    Ok(KeystoreContainer {
        cipher: CIPHER_AES_128_CTR.to_string(),
        cipher_text,
        iv,
        kdf: params,
        mac,
    })
}

/// Recover the secret from `container`.
///
/// A wrong password and a modified ciphertext or MAC both surface as
/// [`KeyError::InvalidMac`].
pub fn decrypt(container: &KeystoreContainer, password: &[u8]) -> KeyResult<Zeroizing<Vec<u8>>> {
    if container.cipher != CIPHER_AES_128_CTR {
        return Err(KeyError::UnsupportedCipher(container.cipher.clone()));
    }

    let derived = container.kdf.derive_key(password)?;

    if let Err(e) = cipher::verify_mac(&derived, &container.cipher_text, &container.mac) {
        tracing::warn!(kdf = container.kdf_name(), "keystore MAC mismatch");
        return Err(e);
    }

    let plaintext = cipher::apply_keystream(&derived, &container.iv, &container.cipher_text)?;
    Ok(Zeroizing::new(plaintext))
}
