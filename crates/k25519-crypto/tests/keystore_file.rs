//! Keystore persistence: keypairs exported to disk and restored.

use std::fs;

use k25519_crypto::keystore::file;
use k25519_crypto::{
    DerivationPath, KdfAlgorithm, KdfProfile, KeyError, Keypair, KeystoreOptions,
};
use tempfile::TempDir;

fn light(algorithm: KdfAlgorithm) -> KeystoreOptions {
    KeystoreOptions::new(algorithm, KdfProfile::Light)
}

#[test]
fn keypair_export_import_roundtrip() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("wallet.json");

    let keypair = Keypair::generate().unwrap();
    keypair
        .export_keystore(&path, b"kaixin", light(KdfAlgorithm::Scrypt))
        .unwrap();

    let restored = Keypair::from_keystore(&path, b"kaixin").unwrap();
    assert_eq!(restored.public_key(), keypair.public_key());
    assert_eq!(restored.private_key(), keypair.private_key());

    let sig = restored.sign(b"hello");
    assert!(keypair.verify(b"hello", &sig).is_ok());
}

#[test]
fn derived_keypair_survives_pbkdf2_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("derived.json");

    let seed = [0x11u8; 64];
    let keypair = Keypair::derive(&seed, &DerivationPath::bip44(501, 0).unwrap()).unwrap();
    keypair
        .export_keystore(&path, b"kaixin", light(KdfAlgorithm::Pbkdf2))
        .unwrap();

    let restored = Keypair::from_keystore(&path, b"kaixin").unwrap();
    assert_eq!(restored.public_key(), keypair.public_key());
}

#[test]
fn wrong_password_is_invalid_mac() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("wallet.json");
    Keypair::generate()
        .unwrap()
        .export_keystore(&path, b"kaixin", KeystoreOptions::light())
        .unwrap();

    assert!(matches!(
        Keypair::from_keystore(&path, b"wrong"),
        Err(KeyError::InvalidMac)
    ));
}

#[test]
fn tampered_file_is_invalid_mac() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("wallet.json");
    Keypair::generate()
        .unwrap()
        .export_keystore(&path, b"kaixin", KeystoreOptions::light())
        .unwrap();

    let mut value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let ciphertext = value["crypto"]["ciphertext"].as_str().unwrap().to_string();
    let flipped = if ciphertext.starts_with('0') { "1" } else { "0" };
    value["crypto"]["ciphertext"] = format!("{flipped}{}", &ciphertext[1..]).into();
    fs::write(&path, value.to_string()).unwrap();

    assert!(matches!(
        Keypair::from_keystore(&path, b"kaixin"),
        Err(KeyError::InvalidMac)
    ));
}

#[test]
fn resave_replaces_previous_container() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("wallet.json");

    let first = Keypair::generate().unwrap();
    let second = Keypair::generate().unwrap();
    first
        .export_keystore(&path, b"one", KeystoreOptions::light())
        .unwrap();
    second
        .export_keystore(&path, b"two", KeystoreOptions::light())
        .unwrap();

    assert!(Keypair::from_keystore(&path, b"one").is_err());
    let restored = Keypair::from_keystore(&path, b"two").unwrap();
    assert_eq!(restored.public_key(), second.public_key());
}

#[cfg(unix)]
#[test]
fn keystore_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("wallet.json");
    file::save_keystore(&path, &[7u8; 64], b"pw", KeystoreOptions::light()).unwrap();

    let mode = fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn unknown_kdf_in_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("argon.json");
    fs::write(
        &path,
        r#"{"crypto":{"cipher":"aes-128-ctr","ciphertext":"00","cipherparams":{"iv":"00"},"kdf":"argon2id","kdfparams":{"m":65536},"mac":"00"}}"#,
    )
    .unwrap();

    assert!(matches!(
        file::load(&path),
        Err(KeyError::UnsupportedKdf(kdf)) if kdf == "argon2id"
    ));
}

#[test]
fn garbage_file_is_json_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("garbage.json");
    fs::write(&path, "not json").unwrap();
    assert!(matches!(file::load(&path), Err(KeyError::Json(_))));
}

#[test]
fn missing_file_reports_path() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("missing.json");
    let err = Keypair::from_keystore(&path, b"pw").unwrap_err();
    assert!(err.to_string().contains("missing.json"), "{err}");
}
