//! SLIP-0010 hierarchical deterministic derivation for Ed25519
//!
//! ```text
//! master:  I = HMAC-SHA512(key = "ed25519 seed", data = seed)
//! child:   I = HMAC-SHA512(key = parent.chain_code, data = 0x00 || parent.key || ser32(index))
//!          key = I[0..32], chain_code = I[32..64]
//! ```
//!
//! Only hardened children exist for this curve; indices come out of
//! [`DerivationPath`] already offset by 2^31.

use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::Zeroize;

use crate::error::{KeyError, KeyResult};
use crate::path::DerivationPath;
use crate::{CHAIN_CODE_SIZE, SEED_SIZE};

type HmacSha512 = Hmac<Sha512>;

const MASTER_SECRET: &[u8] = b"ed25519 seed";

/// Shortest accepted seed (128 bits)
pub const MIN_SEED_LEN: usize = 16;

/// A node in the derivation tree. Never mutated after construction; both
/// halves are zeroized on drop.
#[derive(Clone)]
pub struct ExtendedKey {
    key_material: [u8; SEED_SIZE],
    chain_code: [u8; CHAIN_CODE_SIZE],
}

impl ExtendedKey {
    /// Generate the master node from a seed.
    pub fn master(seed: &[u8]) -> KeyResult<Self> {
        if seed.len() < MIN_SEED_LEN {
            return Err(KeyError::InvalidSeed(format!(
                "seed is {} bytes, need at least {MIN_SEED_LEN}",
                seed.len()
            )));
        }
        Ok(hmac_split(MASTER_SECRET, &[seed]))
    }

    /// Derive the child at `index` (used as given; pass hardened indices).
    pub fn derive_child(&self, index: u32) -> Self {
        hmac_split(
            &self.chain_code,
            &[&[0x00u8][..], &self.key_material[..], &index.to_be_bytes()[..]],
        )
    }

    /// Walk every index of `path` starting from this node.
    pub fn derive_path(&self, path: &DerivationPath) -> Self {
        let mut node = self.clone();
        for index in path.indices() {
            node = node.derive_child(index);
        }
        tracing::debug!(depth = path.depth(), "derived extended key");
        node
    }

    /// The private scalar seed material; becomes an Ed25519 seed.
    pub fn key_material(&self) -> &[u8; SEED_SIZE] {
        &self.key_material
    }

    pub fn chain_code(&self) -> &[u8; CHAIN_CODE_SIZE] {
        &self.chain_code
    }
}

/// `GenerateMasterKey(seed)` followed by the path walk.
pub fn derive_from_seed(seed: &[u8], path: &DerivationPath) -> KeyResult<ExtendedKey> {
    Ok(ExtendedKey::master(seed)?.derive_path(path))
}

fn hmac_split(key: &[u8], data: &[&[u8]]) -> ExtendedKey {
    let mut mac = HmacSha512::new_from_slice(key).expect("HMAC takes any key length");
    for part in data {
        mac.update(part);
    }
    let mut out = mac.finalize().into_bytes();

    let mut key_material = [0u8; SEED_SIZE];
    let mut chain_code = [0u8; CHAIN_CODE_SIZE];
    key_material.copy_from_slice(&out[..SEED_SIZE]);
    chain_code.copy_from_slice(&out[SEED_SIZE..]);
    out.as_mut_slice().zeroize();

    ExtendedKey {
        key_material,
        chain_code,
    }
}

impl Drop for ExtendedKey {
    fn drop(&mut self) {
        self.key_material.zeroize();
        self.chain_code.zeroize();
    }
}

impl PartialEq for ExtendedKey {
    fn eq(&self, other: &Self) -> bool {
        self.key_material == other.key_material && self.chain_code == other.chain_code
    }
}

impl Eq for ExtendedKey {}

impl std::fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtendedKey")
            .field("key_material", &"[REDACTED]")
            .field("chain_code", &"[REDACTED]")
            .finish()
    }
}
