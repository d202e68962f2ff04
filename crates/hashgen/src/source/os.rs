use crate::{Digest, DigestSource, Error, Result, SEED_SIZE};
use rand::{TryRngCore, rngs::OsRng};
use sha2::{Digest as _, Sha512};

/// A `DigestSource` that hashes 32 bytes from the operating system's CSPRNG
/// with SHA-512.
///
/// This type does not store any RNG state: every call reads straight from
/// [`OsRng`], so it is trivially `Send + Sync` and contention-free across
/// workers. A failed read is reported as [`Error::EntropyUnavailable`] rather
/// than hashing a partially filled buffer.
#[derive(Default, Clone, Copy, Debug)]
pub struct OsDigest;

impl DigestSource for OsDigest {
    fn generate(&self) -> Result<Digest> {
        let mut seed = [0_u8; SEED_SIZE];
        OsRng
            .try_fill_bytes(&mut seed)
            .map_err(|e| Error::EntropyUnavailable {
                reason: e.to_string(),
            })?;

        Ok(Digest::from_bytes(Sha512::digest(seed)))
    }
}

/// Generates a single digest from [`OsDigest`].
pub fn generate() -> Result<Digest> {
    OsDigest.generate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DIGEST_HEX_LEN;
    use std::collections::HashSet;

    fn is_digest_format(s: &str) -> bool {
        s.len() == DIGEST_HEX_LEN
            && s.bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }

    #[test]
    fn generates_128_lowercase_hex_chars() {
        for _ in 0..64 {
            let digest = generate().unwrap();
            assert!(is_digest_format(digest.as_str()), "bad digest: {digest}");
        }
    }

    #[test]
    fn no_duplicates_in_ten_thousand() {
        const N: usize = 10_000;
        let mut seen = HashSet::with_capacity(N);
        for _ in 0..N {
            assert!(seen.insert(OsDigest.generate().unwrap()));
        }
        assert_eq!(seen.len(), N);
    }

    #[test]
    fn safe_to_share_across_threads() {
        let source = OsDigest;
        let digests: Vec<Digest> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| source.generate().unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let unique: HashSet<_> = digests.iter().collect();
        assert_eq!(unique.len(), digests.len());
    }
}
