mod interface;
mod os;

pub use interface::*;
pub use os::*;

use crate::{Digest, Result};

/// Invokes `source` exactly `count` times, in order, on the calling thread.
///
/// Stops at the first failure and returns it; no partial batch is ever
/// returned.
#[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(source)))]
pub fn generate_sequential<G>(source: &G, count: usize) -> Result<Vec<Digest>>
where
    G: DigestSource + ?Sized,
{
    let mut hashes = Vec::with_capacity(count);
    for _ in 0..count {
        hashes.push(source.generate()?);
    }
    Ok(hashes)
}
