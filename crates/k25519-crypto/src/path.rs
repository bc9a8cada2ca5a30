//! Derivation path parsing: `m/44'/501'/0'/0'` → hardened child indices
//!
//! Ed25519 only supports hardened derivation, so every index is moved into
//! the hardened range whether or not its segment carries an apostrophe.
//! `m/44/501` and `m/44'/501'` therefore select the same key. The marker is
//! kept only so the path prints back the way it was written.

use std::fmt;
use std::str::FromStr;

use crate::error::{KeyError, KeyResult};

/// Offset added to every child index (2^31)
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// One `/`-separated component of a derivation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Segment {
    /// Index as written, always below 2^31
    pub index: u32,
    /// Whether the text carried a trailing apostrophe
    pub marked_hardened: bool,
}

impl Segment {
    /// The index actually fed to child derivation.
    pub fn hardened_index(&self) -> u32 {
        self.index | HARDENED_OFFSET
    }
}

/// A parsed derivation path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DerivationPath {
    segments: Vec<Segment>,
}

impl DerivationPath {
    /// Parse `m ("/" digits ["'"])*`.
    pub fn parse(path: &str) -> KeyResult<Self> {
        if path.is_empty() {
            return Err(KeyError::InvalidPathFormat("empty path".into()));
        }

        let mut tokens = path.split('/');
        if tokens.next() != Some("m") {
            return Err(KeyError::InvalidPathFormat(format!(
                "path must start with 'm': {path}"
            )));
        }

        let segments = tokens
            .map(parse_segment)
            .collect::<KeyResult<Vec<_>>>()?;

        Ok(Self { segments })
    }

    /// The root path `m`.
    pub fn master() -> Self {
        Self::default()
    }

    /// BIP-44 style account path for a SLIP-0044 coin type, e.g.
    /// `bip44(501, 0)` → `m/44'/501'/0'/0'`.
    pub fn bip44(coin_type: u32, account: u32) -> KeyResult<Self> {
        Self::parse(&format!("m/44'/{coin_type}'/{account}'/0'"))
    }

    /// Finalized child indices, all `>= 2^31`, in derivation order.
    pub fn indices(&self) -> Vec<u32> {
        self.segments.iter().map(Segment::hardened_index).collect()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

fn parse_segment(token: &str) -> KeyResult<Segment> {
    let (digits, marked_hardened) = match token.strip_suffix('\'') {
        Some(digits) => (digits, true),
        None => (token, false),
    };

    // u32::from_str would also accept a leading '+'
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(KeyError::InvalidPathFormat(format!(
            "invalid segment '{token}'"
        )));
    }

    let index: u32 = digits
        .parse()
        .map_err(|e| KeyError::InvalidPathFormat(format!("invalid index '{digits}': {e}")))?;

    if index >= HARDENED_OFFSET {
        return Err(KeyError::InvalidPathFormat(format!(
            "index {index} does not fit in 31 bits"
        )));
    }

    Ok(Segment {
        index,
        marked_hardened,
    })
}

impl FromStr for DerivationPath {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for segment in &self.segments {
            write!(f, "/{}", segment.index)?;
            if segment.marked_hardened {
                f.write_str("'")?;
            }
        }
        Ok(())
    }
}
