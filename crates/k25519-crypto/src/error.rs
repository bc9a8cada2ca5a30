use std::path::PathBuf;

use thiserror::Error;

pub type KeyResult<T> = Result<T, KeyError>;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid seed: {0}")]
    InvalidSeed(String),

    #[error("invalid derivation path: {0}")]
    InvalidPathFormat(String),

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("signature verification failed")]
    InvalidSignature,

    /// The peer's X25519 point is low-order and yields a non-contributory secret.
    #[error("invalid peer public key: {0}")]
    InvalidPeerKey(String),

    #[error("unsupported cipher: {0}")]
    UnsupportedCipher(String),

    #[error("unsupported KDF: {0}")]
    UnsupportedKdf(String),

    #[error("unsupported PBKDF2 PRF: {0}")]
    UnsupportedPrf(String),

    #[error("invalid KDF parameters: {0}")]
    InvalidKdfParams(String),

    /// Wrong password or tampered container. Deliberately carries no detail.
    #[error("invalid MAC: wrong password or corrupted keystore")]
    InvalidMac,

    #[error("malformed keystore: {0}")]
    MalformedKeystore(String),

    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("secure random source failed: {0}")]
    Entropy(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl KeyError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        KeyError::Io {
            path: path.into(),
            source,
        }
    }
}
