use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::StateLogError;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
/// Separates label names from values in the hashed byte stream. Never valid UTF-8.
const SEPARATOR_BYTE: u8 = 0xff;
const FINGERPRINT_DIGITS: usize = 16;

/// Stable identifier of an alert, derived from its label set.
///
/// Rendered as 16 lowercase hex digits, which is also the form persisted
/// in the `fingerprint` column of every state event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$x}", self.0, width = FINGERPRINT_DIGITS)
    }
}

impl FromStr for Fingerprint {
    type Err = StateLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let well_formed = s.len() == FINGERPRINT_DIGITS
            && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if !well_formed {
            return Err(StateLogError::InvalidFingerprint(format!(
                "'{s}': expected {FINGERPRINT_DIGITS} lowercase hex digits"
            )));
        }
        u64::from_str_radix(s, 16)
            .map(Self)
            .map_err(|e| StateLogError::InvalidFingerprint(format!("'{s}': {e}")))
    }
}

impl From<Fingerprint> for String {
    fn from(fp: Fingerprint) -> Self {
        fp.to_string()
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = StateLogError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Label name → value pairs identifying an alert, kept sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet(BTreeMap<String, String>);

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a label, returning the set for chaining.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Parse a `name=value` pair as accepted on the command line.
    pub fn parse_pair(pair: &str) -> Result<(String, String), StateLogError> {
        match pair.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok((name.trim().to_string(), value.to_string()))
            }
            _ => Err(StateLogError::InvalidLabel(format!(
                "'{pair}': expected name=value"
            ))),
        }
    }

    /// 64-bit FNV-1a over `name 0xff value 0xff` for every label in name order.
    ///
    /// The empty set hashes to the FNV offset basis.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hash = FNV_OFFSET_BASIS;
        for (name, value) in &self.0 {
            hash = fnv1a(hash, name.as_bytes());
            hash = fnv1a(hash, &[SEPARATOR_BYTE]);
            hash = fnv1a(hash, value.as_bytes());
            hash = fnv1a(hash, &[SEPARATOR_BYTE]);
        }
        Fingerprint(hash)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

fn fnv1a(mut hash: u64, bytes: &[u8]) -> u64 {
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
