//! Ed25519 → X25519 bridge and hashed Diffie-Hellman
//!
//! The X25519 scalar is the RFC 8032 signing scalar of the Ed25519 seed
//! (low half of SHA-512(seed), clamped by X25519). The raw shared point is
//! never returned: callers get `SHA-256(shared_point)`.

use sha2::{Digest, Sha256};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use crate::error::{KeyError, KeyResult};
use crate::keys::PrivateKey;

/// Size of X25519 scalars, points and hashed shared secrets
pub const X25519_KEY_SIZE: usize = 32;

/// X25519 keypair derived from an Ed25519 private key. Recomputed on demand,
/// never persisted. The secret half zeroizes itself on drop.
#[derive(Clone)]
pub struct EcdhKeypair {
    secret: StaticSecret,
    public: X25519PublicKey,
}

impl EcdhKeypair {
    /// X25519 public key to hand to peers.
    pub fn public_key(&self) -> [u8; X25519_KEY_SIZE] {
        self.public.to_bytes()
    }

    /// The unclamped X25519 private scalar bytes.
    pub fn private_key(&self) -> [u8; X25519_KEY_SIZE] {
        self.secret.to_bytes()
    }

    /// SHA-256 of the X25519 shared point with `peer_public`.
    ///
    /// Fails with `InvalidPeerKey` when the peer point is low-order, since
    /// the resulting secret would not depend on our key.
    pub fn diffie_hellman(&self, peer_public: &[u8; X25519_KEY_SIZE]) -> KeyResult<[u8; 32]> {
        let peer = X25519PublicKey::from(*peer_public);
        let shared = self.secret.diffie_hellman(&peer);
        if !shared.was_contributory() {
            return Err(KeyError::InvalidPeerKey(
                "low-order point yields a non-contributory secret".into(),
            ));
        }
        Ok(Sha256::digest(shared.as_bytes()).into())
    }
}

impl std::fmt::Debug for EcdhKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EcdhKeypair")
            .field("secret", &"[REDACTED]")
            .field("public", &hex::encode(self.public.as_bytes()))
            .finish()
    }
}

/// Convert an Ed25519 private key into its X25519 keypair.
pub fn export_ecdh_keypair(private_key: &PrivateKey) -> EcdhKeypair {
    let secret = StaticSecret::from(private_key.signing_key().to_scalar_bytes());
    let public = X25519PublicKey::from(&secret);
    EcdhKeypair { secret, public }
}

/// Hashed shared secret between `local` and a peer's X25519 public key.
pub fn ecdh(local: &PrivateKey, peer_public: &[u8; X25519_KEY_SIZE]) -> KeyResult<[u8; 32]> {
    export_ecdh_keypair(local).diffie_hellman(peer_public)
}
