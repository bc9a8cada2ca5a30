//! JSON encoding and on-disk persistence of keystore containers
//!
//! ```json
//! { "crypto": { "cipher": "aes-128-ctr", "ciphertext": "<hex>",
//!               "cipherparams": { "iv": "<hex>" },
//!               "kdf": "scrypt", "kdfparams": { "n": 262144, "r": 8, "p": 1, "dklen": 32, "salt": "<hex>" },
//!               "mac": "<hex>" } }
//! ```
//!
//! Unknown top-level fields (`id`, `version`, `address`, ...) are ignored on
//! load so files written by other wallets still open. The section is also
//! read under `Crypto` and the misspelled `crtpto` used by older writers.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::container::{decrypt, encrypt_with, KeystoreContainer};
use super::kdf::{KdfAlgorithm, KdfParams, Pbkdf2Params, ScryptParams};
use super::KeystoreOptions;
use crate::error::{KeyError, KeyResult};

#[derive(Debug, Serialize, Deserialize)]
struct KeystoreFile {
    #[serde(alias = "Crypto", alias = "crtpto")]
    crypto: CryptoJson,
}

#[derive(Debug, Serialize, Deserialize)]
struct CryptoJson {
    cipher: String,
    ciphertext: String,
    cipherparams: CipherParamsJson,
    kdf: String,
    kdfparams: serde_json::Value,
    mac: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CipherParamsJson {
    iv: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ScryptParamsJson {
    n: u32,
    r: u32,
    p: u32,
    dklen: u32,
    salt: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Pbkdf2ParamsJson {
    c: u32,
    dklen: u32,
    prf: String,
    salt: String,
}

fn decode_hex(field: &str, value: &str) -> KeyResult<Vec<u8>> {
    hex::decode(value)
        .map_err(|e| KeyError::MalformedKeystore(format!("invalid hex in {field}: {e}")))
}

fn params_from_json(kdf: &str, value: serde_json::Value) -> KeyResult<KdfParams> {
    let algorithm: KdfAlgorithm = kdf.parse()?;
    let malformed = |e: serde_json::Error| KeyError::MalformedKeystore(format!("kdfparams: {e}"));

    Ok(match algorithm {
        KdfAlgorithm::Scrypt => {
            let p: ScryptParamsJson = serde_json::from_value(value).map_err(malformed)?;
            KdfParams::Scrypt(ScryptParams {
                n: p.n,
                r: p.r,
                p: p.p,
                dklen: p.dklen,
                salt: decode_hex("salt", &p.salt)?,
            })
        }
        KdfAlgorithm::Pbkdf2 => {
            let p: Pbkdf2ParamsJson = serde_json::from_value(value).map_err(malformed)?;
            KdfParams::Pbkdf2(Pbkdf2Params {
                c: p.c,
                dklen: p.dklen,
                salt: decode_hex("salt", &p.salt)?,
                prf: p.prf,
            })
        }
    })
}

fn params_to_json(params: &KdfParams) -> KeyResult<serde_json::Value> {
    let value = match params {
        KdfParams::Scrypt(p) => serde_json::to_value(ScryptParamsJson {
            n: p.n,
            r: p.r,
            p: p.p,
            dklen: p.dklen,
            salt: hex::encode(&p.salt),
        })?,
        KdfParams::Pbkdf2(p) => serde_json::to_value(Pbkdf2ParamsJson {
            c: p.c,
            dklen: p.dklen,
            prf: p.prf.clone(),
            salt: hex::encode(&p.salt),
        })?,
    };
    Ok(value)
}

/// Encode a container as pretty-printed JSON.
pub fn to_json(container: &KeystoreContainer) -> KeyResult<String> {
    let file = KeystoreFile {
        crypto: CryptoJson {
            cipher: container.cipher.clone(),
            ciphertext: hex::encode(&container.cipher_text),
            cipherparams: CipherParamsJson {
                iv: hex::encode(&container.iv),
            },
            kdf: container.kdf_name().to_string(),
            kdfparams: params_to_json(&container.kdf)?,
            mac: hex::encode(&container.mac),
        },
    };
    Ok(serde_json::to_string_pretty(&file)?)
}

/// Parse a container from JSON. An unrecognized `kdf` fails with
/// [`KeyError::UnsupportedKdf`].
pub fn from_json(json: &str) -> KeyResult<KeystoreContainer> {
    let file: KeystoreFile = serde_json::from_str(json)?;
    let crypto = file.crypto;

    Ok(KeystoreContainer {
        kdf: params_from_json(&crypto.kdf, crypto.kdfparams)?,
        cipher: crypto.cipher,
        cipher_text: decode_hex("ciphertext", &crypto.ciphertext)?,
        iv: decode_hex("iv", &crypto.cipherparams.iv)?,
        mac: decode_hex("mac", &crypto.mac)?,
    })
}

/// Write a container to `path`, replacing any previous file. The file is
/// readable by the owner only.
pub fn save(path: impl AsRef<Path>, container: &KeystoreContainer) -> KeyResult<()> {
    let path = path.as_ref();
    let json = to_json(container)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| KeyError::io(parent, e))?;
    }

    // write-then-rename so a crash never leaves a half-written keystore
    let file_name = path.file_name().ok_or_else(|| {
        let source = io::Error::new(io::ErrorKind::InvalidInput, "path has no file name");
        KeyError::io(path, source)
    })?;
    let tmp = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));

    if let Err(e) = write_private(&tmp, json.as_bytes()) {
        let _ = fs::remove_file(&tmp);
        return Err(KeyError::io(&tmp, e));
    }

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(KeyError::io(path, e));
    }
    tracing::debug!(path = %path.display(), kdf = container.kdf_name(), "keystore written");
    Ok(())
}

/// Create (or truncate) `path` with owner-only permissions and write `bytes`.
fn write_private(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    // mode() only applies on creation; an existing file keeps its old bits
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

/// Read and parse a container from `path`.
pub fn load(path: impl AsRef<Path>) -> KeyResult<KeystoreContainer> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|e| KeyError::io(path, e))?;
    let container = from_json(&json)?;
    tracing::debug!(path = %path.display(), kdf = container.kdf_name(), "keystore loaded");
    Ok(container)
}

/// Encrypt `key` and write it to `path`.
pub fn save_keystore(
    path: impl AsRef<Path>,
    key: &[u8],
    password: &[u8],
    options: KeystoreOptions,
) -> KeyResult<()> {
    let container = encrypt_with(key, password, options)?;
    save(path, &container)
}

/// Load the container at `path` and decrypt it.
pub fn load_keystore(path: impl AsRef<Path>, password: &[u8]) -> KeyResult<Zeroizing<Vec<u8>>> {
    let container = load(path)?;
    decrypt(&container, password)
}
