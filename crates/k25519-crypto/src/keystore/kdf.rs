//! Password → 32-byte key derivation: scrypt or PBKDF2-HMAC-SHA256
//!
//! Two cost profiles exist side by side. Containers record their own
//! parameters, so a file written under either profile decrypts no matter
//! which profile is the current default.

use std::fmt;
use std::str::FromStr;

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{KeyError, KeyResult};

/// Salt length in bytes
pub const SALT_SIZE: usize = 32;

/// Derived key length written by `encrypt` (16-byte AES key + 16-byte MAC key)
pub const DKLEN: u32 = 32;

/// scrypt block size, shared by both profiles
pub const SCRYPT_R: u32 = 8;

pub const STANDARD_SCRYPT_N: u32 = 1 << 18;
pub const STANDARD_SCRYPT_P: u32 = 1;

pub const LIGHT_SCRYPT_N: u32 = 1 << 12;
pub const LIGHT_SCRYPT_P: u32 = 6;

pub const STANDARD_PBKDF2_C: u32 = 262_144;
pub const LIGHT_PBKDF2_C: u32 = 4096;

/// Largest accepted derived key length. scrypt itself rejects anything longer.
pub const MAX_DKLEN: u32 = 64;

/// Largest accepted scrypt `n`; four times the standard profile.
pub const MAX_SCRYPT_N: u32 = 1 << 20;

/// Upper bound on scrypt `r * p`.
pub const MAX_SCRYPT_RP: u64 = 1 << 30;

/// Upper bound on scrypt working memory (`128 * r * n` bytes).
pub const MAX_SCRYPT_MEMORY: u64 = 1 << 30;

/// Largest accepted PBKDF2 iteration count; 64 times the standard profile.
pub const MAX_PBKDF2_C: u32 = 1 << 24;

/// The only PBKDF2 pseudorandom function accepted
pub const PRF_HMAC_SHA256: &str = "hmac-sha256";

/// KDF cost profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KdfProfile {
    /// Expensive; for keys that live on disk
    #[default]
    Standard,
    /// Cheap; for quick round trips and tests
    Light,
}

impl KdfProfile {
    pub fn name(self) -> &'static str {
        match self {
            KdfProfile::Standard => "standard",
            KdfProfile::Light => "light",
        }
    }
}

impl fmt::Display for KdfProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KdfProfile {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(KdfProfile::Standard),
            "light" => Ok(KdfProfile::Light),
            other => Err(KeyError::InvalidKdfParams(format!(
                "unknown KDF profile '{other}' (expected standard or light)"
            ))),
        }
    }
}

/// KDF selected when encrypting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KdfAlgorithm {
    #[default]
    Scrypt,
    Pbkdf2,
}

impl KdfAlgorithm {
    /// Identifier stored in the container's `kdf` field.
    pub fn name(self) -> &'static str {
        match self {
            KdfAlgorithm::Scrypt => "scrypt",
            KdfAlgorithm::Pbkdf2 => "pbkdf2",
        }
    }
}

impl fmt::Display for KdfAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KdfAlgorithm {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scrypt" => Ok(KdfAlgorithm::Scrypt),
            "pbkdf2" => Ok(KdfAlgorithm::Pbkdf2),
            other => Err(KeyError::UnsupportedKdf(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScryptParams {
    /// CPU/memory cost, a power of two
    pub n: u32,
    pub r: u32,
    pub p: u32,
    pub dklen: u32,
    pub salt: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pbkdf2Params {
    /// Iteration count
    pub c: u32,
    pub dklen: u32,
    pub salt: Vec<u8>,
    pub prf: String,
}

/// KDF parameters, one variant per supported `kdf` identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KdfParams {
    Scrypt(ScryptParams),
    Pbkdf2(Pbkdf2Params),
}

impl KdfParams {
    /// Parameters for a fresh encryption under `profile`.
    pub fn for_profile(algorithm: KdfAlgorithm, profile: KdfProfile, salt: Vec<u8>) -> Self {
        match algorithm {
            KdfAlgorithm::Scrypt => {
                let (n, p) = match profile {
                    KdfProfile::Standard => (STANDARD_SCRYPT_N, STANDARD_SCRYPT_P),
                    KdfProfile::Light => (LIGHT_SCRYPT_N, LIGHT_SCRYPT_P),
                };
                KdfParams::Scrypt(ScryptParams {
                    n,
                    r: SCRYPT_R,
                    p,
                    dklen: DKLEN,
                    salt,
                })
            }
            KdfAlgorithm::Pbkdf2 => {
                let c = match profile {
                    KdfProfile::Standard => STANDARD_PBKDF2_C,
                    KdfProfile::Light => LIGHT_PBKDF2_C,
                };
                KdfParams::Pbkdf2(Pbkdf2Params {
                    c,
                    dklen: DKLEN,
                    salt,
                    prf: PRF_HMAC_SHA256.to_string(),
                })
            }
        }
    }

    pub fn algorithm(&self) -> KdfAlgorithm {
        match self {
            KdfParams::Scrypt(_) => KdfAlgorithm::Scrypt,
            KdfParams::Pbkdf2(_) => KdfAlgorithm::Pbkdf2,
        }
    }

    pub fn salt(&self) -> &[u8] {
        match self {
            KdfParams::Scrypt(params) => &params.salt,
            KdfParams::Pbkdf2(params) => &params.salt,
        }
    }

    pub fn dklen(&self) -> u32 {
        match self {
            KdfParams::Scrypt(params) => params.dklen,
            KdfParams::Pbkdf2(params) => params.dklen,
        }
    }

    /// Reject parameters outside the accepted cost bounds. Containers come
    /// from untrusted files, so this runs before any allocation.
    pub fn check_bounds(&self) -> KeyResult<()> {
        let dklen = self.dklen();
        if !(DKLEN..=MAX_DKLEN).contains(&dklen) {
            return Err(KeyError::InvalidKdfParams(format!(
                "dklen must be between {DKLEN} and {MAX_DKLEN}, got {dklen}"
            )));
        }

        match self {
            KdfParams::Scrypt(params) => {
                if params.n < 2 || !params.n.is_power_of_two() {
                    return Err(KeyError::InvalidKdfParams(format!(
                        "scrypt n must be a power of two greater than 1, got {}",
                        params.n
                    )));
                }
                if params.n > MAX_SCRYPT_N {
                    return Err(KeyError::InvalidKdfParams(format!(
                        "scrypt n must be at most {MAX_SCRYPT_N}, got {}",
                        params.n
                    )));
                }
                if params.r == 0 || params.p == 0 {
                    return Err(KeyError::InvalidKdfParams(
                        "scrypt r and p must be positive".into(),
                    ));
                }
                let rp = u64::from(params.r) * u64::from(params.p);
                if rp >= MAX_SCRYPT_RP {
                    return Err(KeyError::InvalidKdfParams(format!(
                        "scrypt r * p must be below {MAX_SCRYPT_RP}, got {rp}"
                    )));
                }
                let memory = 128 * u64::from(params.r) * u64::from(params.n);
                if memory > MAX_SCRYPT_MEMORY {
                    return Err(KeyError::InvalidKdfParams(format!(
                        "scrypt needs {memory} bytes of memory, limit is {MAX_SCRYPT_MEMORY}"
                    )));
                }
            }
            KdfParams::Pbkdf2(params) => {
                if params.c == 0 || params.c > MAX_PBKDF2_C {
                    return Err(KeyError::InvalidKdfParams(format!(
                        "pbkdf2 iteration count must be between 1 and {MAX_PBKDF2_C}, got {}",
                        params.c
                    )));
                }
            }
        }
        Ok(())
    }

    /// Run the KDF over `password` with the recorded salt and cost.
    ///
    /// The output is between [`DKLEN`] and [`MAX_DKLEN`] bytes long.
    pub fn derive_key(&self, password: &[u8]) -> KeyResult<Zeroizing<Vec<u8>>> {
        if let KdfParams::Pbkdf2(params) = self {
            if params.prf != PRF_HMAC_SHA256 {
                return Err(KeyError::UnsupportedPrf(params.prf.clone()));
            }
        }
        self.check_bounds()?;
        let mut output = Zeroizing::new(vec![0u8; self.dklen() as usize]);

        match self {
            KdfParams::Scrypt(params) => {
                let log_n = params.n.trailing_zeros() as u8;
                let scrypt_params = scrypt::Params::new(log_n, params.r, params.p, output.len())
                    .map_err(|e| KeyError::InvalidKdfParams(format!("scrypt: {e}")))?;
                scrypt::scrypt(password, &params.salt, &scrypt_params, &mut output)
                    .map_err(|e| KeyError::InvalidKdfParams(format!("scrypt: {e}")))?;
            }
            KdfParams::Pbkdf2(params) => {
                pbkdf2::pbkdf2_hmac::<Sha256>(password, &params.salt, params.c, &mut output);
            }
        }

        tracing::debug!(kdf = self.algorithm().name(), "derived keystore key");
        Ok(output)
    }
}

/// Draw a fresh salt from the OS random source.
pub(crate) fn generate_salt() -> KeyResult<Vec<u8>> {
    let mut salt = vec![0u8; SALT_SIZE];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| KeyError::Entropy(e.to_string()))?;
    Ok(salt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light_scrypt(salt: Vec<u8>) -> KdfParams {
        KdfParams::for_profile(KdfAlgorithm::Scrypt, KdfProfile::Light, salt)
    }

    #[test]
    fn test_kdf_deterministic() {
        let params = light_scrypt(vec![0xAA; SALT_SIZE]);
        let a = params.derive_key(b"test-passphrase").unwrap();
        let b = params.derive_key(b"test-passphrase").unwrap();
        assert_eq!(*a, *b, "KDF must be deterministic");
        assert_eq!(a.len(), DKLEN as usize);
    }

    #[test]
    fn test_kdf_different_passwords() {
        let params = light_scrypt(vec![0xAA; SALT_SIZE]);
        let a = params.derive_key(b"passphrase-a").unwrap();
        let b = params.derive_key(b"passphrase-b").unwrap();
        assert_ne!(*a, *b);
    }

    #[test]
    fn test_kdf_different_salts() {
        let a = light_scrypt(vec![1; SALT_SIZE]).derive_key(b"same").unwrap();
        let b = light_scrypt(vec![2; SALT_SIZE]).derive_key(b"same").unwrap();
        assert_ne!(*a, *b);
    }

    #[test]
    fn test_profile_constants() {
        match KdfParams::for_profile(KdfAlgorithm::Scrypt, KdfProfile::Standard, vec![]) {
            KdfParams::Scrypt(p) => {
                assert_eq!((p.n, p.r, p.p, p.dklen), (1 << 18, 8, 1, 32));
            }
            other => panic!("unexpected params: {other:?}"),
        }
        match KdfParams::for_profile(KdfAlgorithm::Pbkdf2, KdfProfile::Light, vec![]) {
            KdfParams::Pbkdf2(p) => {
                assert_eq!((p.c, p.dklen), (LIGHT_PBKDF2_C, 32));
                assert_eq!(p.prf, PRF_HMAC_SHA256);
            }
            other => panic!("unexpected params: {other:?}"),
        }
    }

    #[test]
    fn test_pbkdf2_rejects_other_prf() {
        let params = KdfParams::Pbkdf2(Pbkdf2Params {
            c: 1,
            dklen: 32,
            salt: vec![0; SALT_SIZE],
            prf: "hmac-sha512".into(),
        });
        assert!(matches!(
            params.derive_key(b"pw"),
            Err(KeyError::UnsupportedPrf(prf)) if prf == "hmac-sha512"
        ));
    }

    #[test]
    fn test_scrypt_rejects_bad_cost() {
        for n in [0, 1, 1000] {
            let params = KdfParams::Scrypt(ScryptParams {
                n,
                r: 8,
                p: 1,
                dklen: 32,
                salt: vec![0; SALT_SIZE],
            });
            assert!(matches!(
                params.derive_key(b"pw"),
                Err(KeyError::InvalidKdfParams(_))
            ));
        }
    }

    #[test]
    fn test_short_dklen_rejected() {
        let params = KdfParams::Pbkdf2(Pbkdf2Params {
            c: 1,
            dklen: 16,
            salt: vec![0; SALT_SIZE],
            prf: PRF_HMAC_SHA256.into(),
        });
        assert!(matches!(
            params.derive_key(b"pw"),
            Err(KeyError::InvalidKdfParams(_))
        ));
    }

    #[test]
    fn test_hostile_costs_rejected() {
        let scrypt = |n, r, p, dklen| {
            KdfParams::Scrypt(ScryptParams {
                n,
                r,
                p,
                dklen,
                salt: vec![0; SALT_SIZE],
            })
        };
        let pbkdf2 = |c, dklen| {
            KdfParams::Pbkdf2(Pbkdf2Params {
                c,
                dklen,
                salt: vec![0; SALT_SIZE],
                prf: PRF_HMAC_SHA256.into(),
            })
        };

        for params in [
            scrypt(1 << 31, 8, 1, 32),
            scrypt(1 << 21, 1, 1, 32),
            scrypt(1 << 20, 16, 1, 32),
            scrypt(1 << 12, 1 << 15, 1 << 15, 32),
            scrypt(1 << 12, 0, 1, 32),
            scrypt(1 << 12, 8, 1, u32::MAX),
            scrypt(1 << 12, 8, 1, 65),
            pbkdf2(1, u32::MAX),
            pbkdf2(1, 4_000_000_000),
            pbkdf2(u32::MAX, 32),
            pbkdf2(0, 32),
        ] {
            assert!(
                matches!(params.derive_key(b"pw"), Err(KeyError::InvalidKdfParams(_))),
                "accepted {params:?}"
            );
        }
    }

    #[test]
    fn test_bounds_admit_both_profiles() {
        for algorithm in [KdfAlgorithm::Scrypt, KdfAlgorithm::Pbkdf2] {
            for profile in [KdfProfile::Standard, KdfProfile::Light] {
                KdfParams::for_profile(algorithm, profile, vec![0; SALT_SIZE])
                    .check_bounds()
                    .unwrap();
            }
        }
        let widest = KdfParams::Pbkdf2(Pbkdf2Params {
            c: 1,
            dklen: MAX_DKLEN,
            salt: vec![0; SALT_SIZE],
            prf: PRF_HMAC_SHA256.into(),
        });
        assert_eq!(widest.derive_key(b"pw").unwrap().len(), MAX_DKLEN as usize);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("light".parse::<KdfProfile>().unwrap(), KdfProfile::Light);
        assert_eq!("Standard".parse::<KdfProfile>().unwrap(), KdfProfile::Standard);
        assert!("heavy".parse::<KdfProfile>().is_err());

        assert_eq!("pbkdf2".parse::<KdfAlgorithm>().unwrap(), KdfAlgorithm::Pbkdf2);
        assert!(matches!(
            "argon2id".parse::<KdfAlgorithm>(),
            Err(KeyError::UnsupportedKdf(_))
        ));
    }

    #[test]
    fn test_generate_salt() {
        let a = generate_salt().unwrap();
        let b = generate_salt().unwrap();
        assert_eq!(a.len(), SALT_SIZE);
        assert_ne!(a, b);
    }
}
