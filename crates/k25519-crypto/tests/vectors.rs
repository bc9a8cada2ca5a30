//! Fixed vectors: published SLIP-0010 Ed25519 data, a Solana-path
//! cross-check, and keystore documents that other wallets must agree on.

use k25519_crypto::keystore::file;
use k25519_crypto::{
    decrypt, derive_from_seed, DerivationPath, KdfParams, KeyError, Keypair, HARDENED_OFFSET,
};

/// SLIP-0010 test vector 1 for ed25519
const SLIP10_SEED: &str = "000102030405060708090a0b0c0d0e0f";

struct Node {
    path: &'static str,
    chain_code: &'static str,
    private: &'static str,
    public: &'static str,
}

const SLIP10_NODES: &[Node] = &[
    Node {
        path: "m",
        chain_code: "90046a93de5380a72b5e45010748567d5ea02bbf6522f979e05c0d8d8ca9fffb",
        private: "2b4be7f19ee27bbf30c667b642d5f4aa69fd169872f8fc3059c08ebae2eb19e7",
        public: "a4b2856bfec510abab89753fac1ac0e1112364e7d250545963f135f2a33188ed",
    },
    Node {
        path: "m/0'",
        chain_code: "8b59aa11380b624e81507a27fedda59fea6d0b779a778918a2fd3590e16e9c69",
        private: "68e0fe46dfb67e368c75379acec591dad19df3cde26e63b93a8e704f1dade7a3",
        public: "8c8a13df77a28f3445213a0f432fde644acaa215fc72dcdf300d5efaa85d350c",
    },
    Node {
        path: "m/0'/1'",
        chain_code: "a320425f77d1b5c2505a6b1b27382b37368ee640e3557c315416801243552f14",
        private: "b1d0bad404bf35da785a64ca1ac54b2617211d2777696fbffaf208f746ae84f2",
        public: "1932a5270f335bed617d5b935c80aedb1a35bd9fc1e31acafd5372c30f5c1187",
    },
];

#[test]
fn slip10_vector_one() {
    let seed = hex::decode(SLIP10_SEED).unwrap();
    for node in SLIP10_NODES {
        let path = DerivationPath::parse(node.path).unwrap();
        let key = derive_from_seed(&seed, &path).unwrap();
        assert_eq!(hex::encode(key.chain_code()), node.chain_code, "{}", node.path);
        assert_eq!(hex::encode(key.key_material()), node.private, "{}", node.path);

        let keypair = Keypair::from_extended_key(&key);
        assert_eq!(keypair.public_key().to_hex(), node.public, "{}", node.path);
    }
}

#[test]
fn unmarked_segments_match_marked() {
    let seed = hex::decode(SLIP10_SEED).unwrap();
    let marked = derive_from_seed(&seed, &"m/0'/1'".parse().unwrap()).unwrap();
    let bare = derive_from_seed(&seed, &"m/0/1".parse().unwrap()).unwrap();
    assert_eq!(marked, bare);
}

#[test]
fn zero_seed_solana_path() {
    let seed = [0u8; 64];
    let path: DerivationPath = "m/44'/501'/0'/0'".parse().unwrap();
    assert_eq!(
        path.indices(),
        vec![
            44 + HARDENED_OFFSET,
            501 + HARDENED_OFFSET,
            HARDENED_OFFSET,
            HARDENED_OFFSET
        ]
    );

    let key = derive_from_seed(&seed, &path).unwrap();
    assert_eq!(
        hex::encode(key.key_material()),
        "7d184306a8452a59ec35de35de703658252743e31f8aaa5491d8b08c1c8f1904"
    );
    assert_eq!(
        hex::encode(key.chain_code()),
        "8e1f0532d51490460bd298340c637ced05c2b46533c28f4880229f1bfbd116ae"
    );

    let keypair = Keypair::derive(&seed, &path).unwrap();
    assert_eq!(
        keypair.public_key().to_hex(),
        "8f009f298a07e1f832ba20082570a0ea7c59b19ec7d2b514cc29a6694b333ba6"
    );
}

fn interop_key() -> Vec<u8> {
    (0u8..64).collect()
}

const SCRYPT_KEYSTORE: &str = r#"{
  "version": 3,
  "crypto": {
    "cipher": "aes-128-ctr",
    "ciphertext": "3adff476c5bf59bbdba817053c1aecf387dcbaa461fc779709966ce8b60108027089df10d25f1c14dd119d536dfaabe65d11fb8311764ecbd83feb545c1012a4",
    "cipherparams": { "iv": "01010101010101010101010101010101" },
    "kdf": "scrypt",
    "kdfparams": {
      "dklen": 32,
      "n": 4096,
      "p": 6,
      "r": 8,
      "salt": "abababababababababababababababababababababababababababababababab"
    },
    "mac": "40ff24fc82b5e732233096dbefdd60a26abd0d8e24439cd4df193043b98146e2"
  }
}"#;

const PBKDF2_KEYSTORE: &str = r#"{
  "crypto": {
    "cipher": "aes-128-ctr",
    "ciphertext": "e864b18d19ff405e2cbbabaca8d5a7a2f19dff8d9f997a9abf26f289396416a12117187b9c8b68e6193e35044bb4b1e8872d4dd7b916b54ff125383537b2275e",
    "cipherparams": { "iv": "01010101010101010101010101010101" },
    "kdf": "pbkdf2",
    "kdfparams": {
      "c": 4096,
      "dklen": 32,
      "prf": "hmac-sha256",
      "salt": "abababababababababababababababababababababababababababababababab"
    },
    "mac": "d339a6751750945b6ea57ec943236d2272be9bc2c71dbe32fead1efdd9834e01"
  }
}"#;

#[test]
fn scrypt_keystore_interop() {
    let container = file::from_json(SCRYPT_KEYSTORE).unwrap();
    assert!(matches!(&container.kdf, KdfParams::Scrypt(p) if p.n == 4096 && p.p == 6));
    let secret = decrypt(&container, b"kaixin").unwrap();
    assert_eq!(&secret[..], &interop_key()[..]);
}

#[test]
fn pbkdf2_keystore_interop() {
    let container = file::from_json(PBKDF2_KEYSTORE).unwrap();
    assert_eq!(container.kdf_name(), "pbkdf2");
    let secret = decrypt(&container, b"kaixin").unwrap();
    assert_eq!(&secret[..], &interop_key()[..]);
}

#[test]
fn interop_keystores_reject_wrong_password() {
    for json in [SCRYPT_KEYSTORE, PBKDF2_KEYSTORE] {
        let container = file::from_json(json).unwrap();
        assert!(matches!(
            decrypt(&container, b"kaixin!"),
            Err(KeyError::InvalidMac)
        ));
    }
}

#[test]
fn interop_keystore_reencodes_losslessly() {
    let container = file::from_json(PBKDF2_KEYSTORE).unwrap();
    let again = file::from_json(&file::to_json(&container).unwrap()).unwrap();
    assert_eq!(container, again);
}
