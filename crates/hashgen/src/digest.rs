use core::fmt;

/// Size in bytes of the random seed hashed into every [`Digest`].
pub const SEED_SIZE: usize = 32;

/// Length of a hex-encoded SHA-512 output.
pub const DIGEST_HEX_LEN: usize = 128;

/// The lowercase hex encoding of a SHA-512 hash over random bytes.
///
/// A `Digest` carries no meaning beyond being unique by chance; it is never
/// derived from request content.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct Digest(String);

impl Digest {
    /// Hex-encodes a raw hash output.
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Self {
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

/// A completed batch: the requested count and exactly that many digests.
///
/// The order of `hashes` is **not** meaningful. Batches built by the
/// [`Distributor`](crate::Distributor) hold digests in the order workers
/// happened to deliver them, and callers must not rely on any ordering.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DigestBatch {
    pub count: usize,
    pub hashes: Vec<Digest>,
}

impl DigestBatch {
    /// Wraps a collected set of digests, echoing its length as the count.
    pub fn new(hashes: Vec<Digest>) -> Self {
        Self {
            count: hashes.len(),
            hashes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bytes_is_lowercase_hex() {
        let digest = Digest::from_bytes([0xAB, 0x01, 0xFF]);
        assert_eq!(digest.as_str(), "ab01ff");
        assert_eq!(digest.to_string(), "ab01ff");
    }

    #[test]
    fn batch_echoes_count() {
        let batch = DigestBatch::new(vec![Digest::from_bytes([1]), Digest::from_bytes([2])]);
        assert_eq!(batch.count, 2);
        assert_eq!(batch.hashes.len(), batch.count);

        let empty = DigestBatch::new(Vec::new());
        assert_eq!(empty.count, 0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn batch_serializes_to_envelope() {
        let batch = DigestBatch::new(vec![Digest::from_bytes([0x0f])]);
        let json = serde_json::to_string(&batch).unwrap();
        assert_eq!(json, r#"{"count":1,"hashes":["0f"]}"#);
    }
}
