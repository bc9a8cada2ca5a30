//! BIP-39 mnemonic phrases: generation and phrase → 64-byte seed
//!
//! The phrase feeds [`crate::hd::ExtendedKey::master`] through
//! [`mnemonic_to_seed`]. Nothing here is stored; the caller shows the phrase
//! once and drops it.

use std::fmt;
use std::str::FromStr;

use bip39::{Language, Mnemonic};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

use crate::error::{KeyError, KeyResult};

/// Length of the seed produced by [`mnemonic_to_seed`]
pub const MNEMONIC_SEED_SIZE: usize = 64;

/// Phrase length; each step of three words adds 32 bits of entropy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MnemonicLength {
    Words12,
    Words15,
    Words18,
    Words21,
    #[default]
    Words24,
}

impl MnemonicLength {
    pub fn from_word_count(words: usize) -> KeyResult<Self> {
        match words {
            12 => Ok(Self::Words12),
            15 => Ok(Self::Words15),
            18 => Ok(Self::Words18),
            21 => Ok(Self::Words21),
            24 => Ok(Self::Words24),
            other => Err(KeyError::InvalidMnemonic(format!(
                "unsupported word count {other} (expected 12, 15, 18, 21 or 24)"
            ))),
        }
    }

    pub fn word_count(self) -> usize {
        match self {
            Self::Words12 => 12,
            Self::Words15 => 15,
            Self::Words18 => 18,
            Self::Words21 => 21,
            Self::Words24 => 24,
        }
    }

    /// Entropy bytes behind a phrase of this length (128..=256 bits).
    pub fn entropy_bytes(self) -> usize {
        self.word_count() * 4 / 3
    }
}

/// Wordlists available for generation and parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MnemonicLanguage {
    #[default]
    English,
    ChineseSimplified,
    ChineseTraditional,
}

impl MnemonicLanguage {
    pub const ALL: [MnemonicLanguage; 3] = [
        MnemonicLanguage::English,
        MnemonicLanguage::ChineseSimplified,
        MnemonicLanguage::ChineseTraditional,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::English => "english",
            Self::ChineseSimplified => "chinese-simplified",
            Self::ChineseTraditional => "chinese-traditional",
        }
    }

    fn wordlist(self) -> Language {
        match self {
            Self::English => Language::English,
            Self::ChineseSimplified => Language::SimplifiedChinese,
            Self::ChineseTraditional => Language::TraditionalChinese,
        }
    }
}

impl fmt::Display for MnemonicLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MnemonicLanguage {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|lang| lang.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| KeyError::InvalidMnemonic(format!("unknown wordlist '{s}'")))
    }
}

/// Generate a new phrase from OS entropy.
pub fn generate_mnemonic(length: MnemonicLength, language: MnemonicLanguage) -> KeyResult<String> {
    let mut entropy = [0u8; 32];
    let entropy = &mut entropy[..length.entropy_bytes()];
    OsRng
        .try_fill_bytes(entropy)
        .map_err(|e| KeyError::Entropy(e.to_string()))?;

    let result = Mnemonic::from_entropy_in(language.wordlist(), entropy)
        .map(|m| m.to_string())
        .map_err(|e| KeyError::InvalidMnemonic(e.to_string()));
    entropy.zeroize();
    result
}

/// Validate `phrase` against every supported wordlist and stretch it into a
/// 64-byte seed with the optional `passphrase`.
pub fn mnemonic_to_seed(
    phrase: &str,
    passphrase: &str,
) -> KeyResult<Zeroizing<[u8; MNEMONIC_SEED_SIZE]>> {
    let mnemonic = parse_any(phrase)?;
    Ok(Zeroizing::new(mnemonic.to_seed(passphrase)))
}

// Simplified and traditional Chinese share characters, so the first
// wordlist whose checksum validates wins.
fn parse_any(phrase: &str) -> KeyResult<Mnemonic> {
    let mut last_error = None;
    for language in MnemonicLanguage::ALL {
        match Mnemonic::parse_in(language.wordlist(), phrase) {
            Ok(mnemonic) => return Ok(mnemonic),
            Err(e) => last_error = Some(e),
        }
    }
    Err(KeyError::InvalidMnemonic(
        last_error.map_or_else(|| "empty phrase".to_string(), |e| e.to_string()),
    ))
}
