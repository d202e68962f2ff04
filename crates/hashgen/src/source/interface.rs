use crate::{Digest, Result};
use std::sync::Arc;

/// A strategy that produces one [`Digest`] per call.
///
/// This abstraction allows you to plug in the real OS-backed source or a
/// deterministic fake in tests. Implementations are shared by every worker of
/// a batch, so they must be `Send + Sync`; any reseeding or internal state is
/// the implementation's own business.
///
/// # Example
/// ```
/// use hashgen::{Digest, DigestSource, Result};
///
/// struct FixedDigest;
/// impl DigestSource for FixedDigest {
///     fn generate(&self) -> Result<Digest> {
///         Ok(Digest::from_bytes([0u8; 64]))
///     }
/// }
///
/// let digest = FixedDigest.generate().unwrap();
/// assert_eq!(digest.as_str().len(), 128);
/// ```
pub trait DigestSource: Send + Sync {
    /// Returns a fresh digest, or the reason one could not be produced.
    fn generate(&self) -> Result<Digest>;
}

impl<T: DigestSource + ?Sized> DigestSource for Arc<T> {
    fn generate(&self) -> Result<Digest> {
        (**self).generate()
    }
}

impl<T: DigestSource + ?Sized> DigestSource for &T {
    fn generate(&self) -> Result<Digest> {
        (**self).generate()
    }
}
