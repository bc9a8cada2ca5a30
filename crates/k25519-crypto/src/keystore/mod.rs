//! Password-based keystore: encrypted containers and their JSON files

mod cipher;
mod container;
pub mod file;
pub mod kdf;

pub use cipher::{CIPHER_AES_128_CTR, IV_SIZE, MAC_SIZE};
pub use container::{decrypt, encrypt, encrypt_with, KeystoreContainer};
pub use kdf::{KdfAlgorithm, KdfParams, KdfProfile, Pbkdf2Params, ScryptParams};

/// How a new container is encrypted. Decryption ignores this and reads the
/// parameters recorded in the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeystoreOptions {
    pub algorithm: KdfAlgorithm,
    pub profile: KdfProfile,
}

impl KeystoreOptions {
    pub fn new(algorithm: KdfAlgorithm, profile: KdfProfile) -> Self {
        Self { algorithm, profile }
    }

    /// scrypt with the light profile.
    pub fn light() -> Self {
        Self::new(KdfAlgorithm::Scrypt, KdfProfile::Light)
    }
}
