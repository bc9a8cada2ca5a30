//! AES-128-CTR keystream and the HMAC-SHA256 integrity tag
//!
//! The 32-byte KDF output is split in two: the low half keys AES, the high
//! half keys the MAC. The MAC covers only the ciphertext.

use aes::Aes128;
use ctr::cipher::{KeyIvInit, StreamCipher};
use ctr::Ctr128BE;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use crate::error::{KeyError, KeyResult};

/// Cipher identifier stored in containers
pub const CIPHER_AES_128_CTR: &str = "aes-128-ctr";

/// IV length for AES-128-CTR
pub const IV_SIZE: usize = 16;

/// AES-128 key length; also the offset of the MAC key in the derived key
pub const AES_KEY_SIZE: usize = 16;

/// HMAC-SHA256 tag length
pub const MAC_SIZE: usize = 32;

type Aes128Ctr = Ctr128BE<Aes128>;
type HmacSha256 = Hmac<Sha256>;

/// XOR `data` with the AES-128-CTR keystream. Encryption and decryption are
/// the same operation.
pub(crate) fn apply_keystream(derived_key: &[u8], iv: &[u8], data: &[u8]) -> KeyResult<Vec<u8>> {
    let key: [u8; AES_KEY_SIZE] = derived_key
        .get(..AES_KEY_SIZE)
        .and_then(|k| k.try_into().ok())
        .ok_or_else(|| KeyError::InvalidKdfParams("derived key too short".into()))?;
    let iv: [u8; IV_SIZE] = iv.try_into().map_err(|_| {
        KeyError::MalformedKeystore(format!("IV must be {IV_SIZE} bytes, got {}", iv.len()))
    })?;

    let mut buffer = data.to_vec();
    let mut cipher = Aes128Ctr::new(&key.into(), &iv.into());
    cipher.apply_keystream(&mut buffer);
    Ok(buffer)
}

fn mac_for(derived_key: &[u8], ciphertext: &[u8]) -> KeyResult<HmacSha256> {
    let mac_key = derived_key
        .get(AES_KEY_SIZE..2 * AES_KEY_SIZE)
        .ok_or_else(|| KeyError::InvalidKdfParams("derived key too short".into()))?;
    let mut mac = HmacSha256::new_from_slice(mac_key)
        .map_err(|e| KeyError::InvalidKdfParams(e.to_string()))?;
    mac.update(ciphertext);
    Ok(mac)
}

/// `HMAC-SHA256(derived_key[16..32], ciphertext)`
pub(crate) fn compute_mac(derived_key: &[u8], ciphertext: &[u8]) -> KeyResult<Vec<u8>> {
    Ok(mac_for(derived_key, ciphertext)?.finalize().into_bytes().to_vec())
}

/// Constant-time check of a stored tag.
pub(crate) fn verify_mac(derived_key: &[u8], ciphertext: &[u8], tag: &[u8]) -> KeyResult<()> {
    mac_for(derived_key, ciphertext)?
        .verify_slice(tag)
        .map_err(|_| KeyError::InvalidMac)
}

pub(crate) fn generate_iv() -> KeyResult<Vec<u8>> {
    let mut iv = vec![0u8; IV_SIZE];
    OsRng
        .try_fill_bytes(&mut iv)
        .map_err(|e| KeyError::Entropy(e.to_string()))?;
    Ok(iv)
}
