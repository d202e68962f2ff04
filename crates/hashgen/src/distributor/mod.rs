//! Fan-out digest generation over a fixed pool of Tokio tasks.
//!
//! A batch of `count` digests is split by [`Partition`] into one remainder
//! share and `workers` equal base shares. Each share runs on its own task and
//! pushes results into a single bounded [`mpsc`] channel whose capacity equals
//! the batch size, so producers never wait on the consumer. The distributor
//! drains exactly `count` results and returns them in arrival order.
//!
//! The drain loop races three signals: the next result, the caller's
//! [`CancellationToken`], and the channel closing. A failing worker, a
//! cancelled caller, or a vanished worker therefore always ends the batch
//! instead of leaving it waiting for digests that will never arrive.

mod partition;
mod worker;


pub use partition::Partition;

use crate::{Digest, DigestSource, Error, OsDigest, Result};
use core::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use worker::worker_loop;

/// Fallback worker count when the available parallelism cannot be detected.
pub const DEFAULT_WORKERS: NonZeroUsize = NonZeroUsize::new(8).unwrap();

/// Returns the platform's available parallelism, or [`DEFAULT_WORKERS`].
pub fn default_workers() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(DEFAULT_WORKERS)
}

/// Splits digest batches across a fixed number of worker tasks.
///
/// Cloning a `Distributor` is cheap: the digest source is shared behind an
/// [`Arc`].
///
/// # Ordering
///
/// Batches carry **no ordering guarantee**. Digests appear in whatever order
/// the workers deliver them, and that order may change between runs.
pub struct Distributor<G: ?Sized = OsDigest> {
    source: Arc<G>,
    workers: NonZeroUsize,
}

impl<G: ?Sized> Clone for Distributor<G> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            workers: self.workers,
        }
    }
}

impl<G: ?Sized> core::fmt::Debug for Distributor<G> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Distributor")
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}

impl Default for Distributor<OsDigest> {
    fn default() -> Self {
        Self::with_default_workers(OsDigest)
    }
}

impl<G: DigestSource + 'static> Distributor<G> {
    pub fn new(source: G, workers: NonZeroUsize) -> Self {
        Self::from_arc(Arc::new(source), workers)
    }

    /// Creates a distributor sized by [`default_workers`].
    pub fn with_default_workers(source: G) -> Self {
        Self::new(source, default_workers())
    }
}

impl<G: DigestSource + ?Sized + 'static> Distributor<G> {
    /// Creates a distributor around an already shared source, e.g. an
    /// `Arc<dyn DigestSource>`.
    pub fn from_arc(source: Arc<G>, workers: NonZeroUsize) -> Self {
        Self { source, workers }
    }

    /// Number of base workers per batch. Each batch also spawns one remainder
    /// worker.
    pub const fn workers(&self) -> NonZeroUsize {
        self.workers
    }

    pub fn source(&self) -> &Arc<G> {
        &self.source
    }

    /// Generates exactly `count` digests across the worker pool.
    ///
    /// A `count` of zero returns immediately without spawning any task or
    /// drawing any entropy.
    ///
    /// # Errors
    ///
    /// - [`Error::GenerationFailed`] if any worker's source fails. The other
    ///   workers are cancelled and no partial batch is returned.
    /// - [`Error::WorkerLost`] if every worker exits (e.g. panics) before the
    ///   batch is complete.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn distribute(&self, count: usize) -> Result<Vec<Digest>> {
        self.distribute_with_cancel(count, &CancellationToken::new())
            .await
    }

    /// Like [`distribute`](Self::distribute), but abandons the batch with
    /// [`Error::Cancelled`] as soon as `cancel` fires.
    ///
    /// On cancellation the workers stop before their next digest and any
    /// results already queued are discarded.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all, fields(count = count, workers = self.workers.get())))]
    pub async fn distribute_with_cancel(
        &self,
        count: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<Digest>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let partition = Partition::new(count, self.workers);

        // Every worker sends at most its share, so `count` slots are enough
        // for all digests and any failure report.
        let (tx, mut rx) = mpsc::channel::<Result<Digest>>(count);

        // Workers observe a child token: cancelled by the caller, or by the
        // guard below whenever this function returns.
        let batch_token = cancel.child_token();
        let _batch_guard = batch_token.clone().drop_guard();

        for (worker_id, share) in partition.shares().enumerate() {
            tokio::spawn(worker_loop(
                worker_id,
                share,
                Arc::clone(&self.source),
                tx.clone(),
                batch_token.clone(),
            ));
        }
        // Only workers hold senders now; the channel closes when they all
        // exit.
        drop(tx);

        let mut hashes = Vec::with_capacity(count);
        while hashes.len() < count {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("Batch cancelled after {} of {count} digests", hashes.len());
                    return Err(Error::Cancelled);
                }
                msg = rx.recv() => match msg {
                    Some(Ok(digest)) => hashes.push(digest),
                    Some(Err(e)) => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!("Aborting batch: {e}");
                        return Err(e);
                    }
                    None => {
                        return Err(Error::WorkerLost {
                            context: format!(
                                "result channel closed after {} of {count} digests",
                                hashes.len()
                            ),
                        });
                    }
                },
            }
        }

        Ok(hashes)
    }
}

/// Generates exactly `count` digests from [`OsDigest`] across `workers` base
/// workers plus one remainder worker.
///
/// The returned digests carry no ordering guarantee.
pub async fn distribute(count: usize, workers: NonZeroUsize) -> Result<Vec<Digest>> {
    Distributor::new(OsDigest, workers).distribute(count).await
}
