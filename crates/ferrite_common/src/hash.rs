//! Content hashing for netlist fingerprints.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 128-bit content hash computed using XXH3.
///
/// Two netlists with the same structural fingerprint are assumed to have
/// identical connectivity and cell bindings. Used to verify that a journal
/// rollback restored the design exactly.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Computes a content hash from a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }

    /// Computes a content hash over an ordered sequence of text records.
    ///
    /// Records are separated by a NUL byte so `["ab", "c"]` and `["a", "bc"]`
    /// hash differently.
    pub fn from_records<I, S>(records: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut hasher = xxhash_rust::xxh3::Xxh3::new();
        for record in records {
            hasher.update(record.as_ref().as_bytes());
            hasher.update(&[0]);
        }
        Self(hasher.digest128().to_le_bytes())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = ContentHash::from_bytes(b"u1/A net1");
        let b = ContentHash::from_bytes(b"u1/A net1");
        assert_eq!(a, b);
    }

    #[test]
    fn record_boundaries_matter() {
        let a = ContentHash::from_records(["ab", "c"]);
        let b = ContentHash::from_records(["a", "bc"]);
        assert_ne!(a, b);
    }

    #[test]
    fn display_is_hex() {
        let h = ContentHash::from_records(["net1"]);
        let s = format!("{h}");
        assert_eq!(s.len(), 32);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn serde_roundtrip() {
        let h = ContentHash::from_bytes(b"serde test");
        let json = serde_json::to_string(&h).unwrap();
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }
}
