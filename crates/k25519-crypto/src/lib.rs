//! k25519-crypto: Ed25519 identities for wallet-style applications
//!
//! Pipeline: mnemonic → seed → master key → hardened children → Ed25519 keypair → keystore file
//!
//! Key hierarchy:
//! ```text
//! Seed (BIP-39 mnemonic or raw entropy, >= 16 bytes)
//!   └── Master ExtendedKey = HMAC-SHA512("ed25519 seed", seed)
//!       └── Child ExtendedKey = HMAC-SHA512(chain_code, 0x00 || key || ser32(i | 2^31))
//!           └── Ed25519 PrivateKey (64 bytes: seed || public key)
//!               ├── X25519 keypair (ECDH, SHA-256 of the shared point)
//!               └── Keystore (scrypt | pbkdf2 → AES-128-CTR + HMAC-SHA256)
//! ```

pub mod ecdh;
pub mod error;
pub mod hd;
pub mod keys;
pub mod keystore;
pub mod mnemonic;
pub mod path;

pub use ecdh::{ecdh, export_ecdh_keypair, EcdhKeypair};
pub use ed25519_dalek::Signature;
pub use error::{KeyError, KeyResult};
pub use hd::{derive_from_seed, ExtendedKey};
pub use keys::{sign_message, verify_message, Keypair, PrivateKey, PublicKey};
pub use keystore::{
    decrypt, encrypt, encrypt_with, KdfAlgorithm, KdfParams, KdfProfile, KeystoreContainer,
    KeystoreOptions,
};
pub use mnemonic::{generate_mnemonic, mnemonic_to_seed, MnemonicLanguage, MnemonicLength};
pub use path::{DerivationPath, HARDENED_OFFSET};

/// Size of an Ed25519 seed and of HD key material (256-bit)
pub const SEED_SIZE: usize = 32;

/// Size of an expanded Ed25519 private key (seed || public key)
pub const PRIVATE_KEY_SIZE: usize = 64;

/// Size of an Ed25519 public key
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of an HD chain code
pub const CHAIN_CODE_SIZE: usize = 32;
