//! Ed25519 key entities: private key, public key, keypair
//!
//! A [`PrivateKey`] uses the standard 64-byte expanded layout
//! `seed (32) || public key (32)`. The public half is always recomputed from
//! the seed, so a [`Keypair`] can never hold mismatched halves.

use std::path::Path;

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::ecdh::{self, EcdhKeypair};
use crate::error::{KeyError, KeyResult};
use crate::hd::{derive_from_seed, ExtendedKey};
use crate::keystore::{file, KeystoreOptions};
use crate::path::DerivationPath;
use crate::{PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE, SEED_SIZE};

/// Ed25519 verification key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    /// Wrap trusted external bytes. Point validity is checked at `verify`.
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse a public key from hex, with or without a `0x` prefix.
    pub fn from_hex(hex: &str) -> KeyResult<Self> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let mut buff = [0u8; PUBLIC_KEY_SIZE];
        hex::decode_to_slice(hex, &mut buff)
            .map_err(|e| KeyError::InvalidPublicKey(format!("hex decode: {e}")))?;
        Ok(Self(buff))
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Verify a detached signature (strict: rejects small-order keys and
    /// malleable signatures).
    pub fn verify(&self, msg: &[u8], signature: &Signature) -> KeyResult<()> {
        let verifying_key = VerifyingKey::from_bytes(&self.0)
            .map_err(|e| KeyError::InvalidPublicKey(e.to_string()))?;
        verifying_key
            .verify_strict(msg, signature)
            .map_err(|_| KeyError::InvalidSignature)
    }
}

impl From<[u8; PUBLIC_KEY_SIZE]> for PublicKey {
    fn from(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = KeyError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; PUBLIC_KEY_SIZE] = bytes.try_into().map_err(|_| {
            KeyError::InvalidPublicKey(format!(
                "expected {PUBLIC_KEY_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

/// Ed25519 signing key in the 64-byte expanded layout. Zeroized on drop.
#[derive(Clone)]
pub struct PrivateKey {
    seed: [u8; SEED_SIZE],
    public: PublicKey,
}

impl PrivateKey {
    /// Build the expanded key from a 32-byte seed.
    pub fn from_seed(seed: &[u8; SEED_SIZE]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self {
            seed: *seed,
            public: PublicKey(signing_key.verifying_key().to_bytes()),
        }
    }

    /// Generate a key from the operating system's secure random source.
    ///
    /// Fails rather than falling back to a weaker source.
    pub fn generate() -> KeyResult<Self> {
        let mut seed = [0u8; SEED_SIZE];
        OsRng
            .try_fill_bytes(&mut seed)
            .map_err(|e| KeyError::Entropy(e.to_string()))?;
        let key = Self::from_seed(&seed);
        seed.zeroize();
        Ok(key)
    }

    /// Load a 64-byte `seed || public key` buffer. The public half must match
    /// the one the seed produces.
    pub fn from_bytes(bytes: &[u8; PRIVATE_KEY_SIZE]) -> KeyResult<Self> {
        let signing_key = SigningKey::from_keypair_bytes(bytes)
            .map_err(|_| KeyError::InvalidPrivateKey("public half does not match seed".into()))?;
        Ok(Self {
            seed: signing_key.to_bytes(),
            public: PublicKey(signing_key.verifying_key().to_bytes()),
        })
    }

    /// Parse the 64-byte layout from hex, with or without a `0x` prefix.
    pub fn from_hex(hex: &str) -> KeyResult<Self> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let mut buff = [0u8; PRIVATE_KEY_SIZE];
        hex::decode_to_slice(hex, &mut buff)
            .map_err(|_| KeyError::InvalidPrivateKey("private key hex decode error".into()))?;
        let key = Self::from_bytes(&buff);
        buff.zeroize();
        key
    }

    /// The 32-byte seed half.
    pub fn seed(&self) -> &[u8; SEED_SIZE] {
        &self.seed
    }

    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    /// The 64-byte `seed || public key` layout.
    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_SIZE] {
        let mut out = [0u8; PRIVATE_KEY_SIZE];
        out[..SEED_SIZE].copy_from_slice(&self.seed);
        out[SEED_SIZE..].copy_from_slice(self.public.as_bytes());
        out
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn sign(&self, msg: &[u8]) -> Signature {
        self.signing_key().sign(msg)
    }

    pub(crate) fn signing_key(&self) -> SigningKey {
        SigningKey::from_bytes(&self.seed)
    }
}

impl TryFrom<&[u8]> for PrivateKey {
    type Error = KeyError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: &[u8; PRIVATE_KEY_SIZE] = bytes.try_into().map_err(|_| {
            KeyError::InvalidPrivateKey(format!(
                "expected {PRIVATE_KEY_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Self::from_bytes(bytes)
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.seed.zeroize();
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.seed == other.seed
    }
}

impl Eq for PrivateKey {}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("seed", &"[REDACTED]")
            .field("public", &self.public.to_hex())
            .finish()
    }
}

/// Sign `msg` with `private_key`.
pub fn sign_message(private_key: &PrivateKey, msg: &[u8]) -> Signature {
    private_key.sign(msg)
}

/// `true` when `signature` is a valid signature of `msg` under `public_key`.
pub fn verify_message(public_key: &PublicKey, msg: &[u8], signature: &Signature) -> bool {
    public_key.verify(msg, signature).is_ok()
}

/// A private key together with its public key.
///
/// Every constructor and mutator goes through [`PrivateKey`], which derives
/// the public half, so the two halves cannot drift apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keypair {
    private_key: PrivateKey,
}

impl Keypair {
    pub fn generate() -> KeyResult<Self> {
        Ok(Self::from_private_key(PrivateKey::generate()?))
    }

    pub fn from_seed(seed: &[u8; SEED_SIZE]) -> Self {
        Self::from_private_key(PrivateKey::from_seed(seed))
    }

    pub fn from_private_key(private_key: PrivateKey) -> Self {
        Self { private_key }
    }

    /// Restore from the 64-byte `seed || public key` layout.
    pub fn from_private_key_bytes(bytes: &[u8]) -> KeyResult<Self> {
        Ok(Self::from_private_key(PrivateKey::try_from(bytes)?))
    }

    /// Materialize an HD node: its key material becomes the Ed25519 seed.
    pub fn from_extended_key(key: &ExtendedKey) -> Self {
        Self::from_seed(key.key_material())
    }

    /// Derive the keypair at `path` below the master key of `seed`.
    pub fn derive(seed: &[u8], path: &DerivationPath) -> KeyResult<Self> {
        let node = derive_from_seed(seed, path)?;
        Ok(Self::from_extended_key(&node))
    }

    /// Decrypt a keystore file and restore the keypair it holds.
    pub fn from_keystore(path: impl AsRef<Path>, password: &[u8]) -> KeyResult<Self> {
        let secret = file::load_keystore(path, password)?;
        Self::from_private_key_bytes(&secret)
    }

    /// Encrypt the 64-byte private key into a keystore file.
    pub fn export_keystore(
        &self,
        path: impl AsRef<Path>,
        password: &[u8],
        options: KeystoreOptions,
    ) -> KeyResult<()> {
        let mut secret = self.private_key.to_bytes();
        let result = file::save_keystore(path, &secret, password, options);
        secret.zeroize();
        result
    }

    /// Replace the private key; the public key follows automatically.
    pub fn set_private_key(&mut self, private_key: PrivateKey) {
        self.private_key = private_key;
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn public_key(&self) -> PublicKey {
        self.private_key.public_key()
    }

    pub fn sign(&self, msg: &[u8]) -> Signature {
        self.private_key.sign(msg)
    }

    pub fn verify(&self, msg: &[u8], signature: &Signature) -> KeyResult<()> {
        self.public_key().verify(msg, signature)
    }

    pub fn export_ecdh_keypair(&self) -> EcdhKeypair {
        ecdh::export_ecdh_keypair(&self.private_key)
    }

    /// Hashed X25519 shared secret with a peer's X25519 public key.
    pub fn ecdh(&self, peer_public: &[u8; 32]) -> KeyResult<[u8; 32]> {
        ecdh::ecdh(&self.private_key, peer_public)
    }
}
