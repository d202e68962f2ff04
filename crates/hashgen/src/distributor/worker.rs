use crate::{Digest, DigestSource, Error, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Worker task responsible for producing one share of a batch.
///
/// Invokes `source` up to `share` times and pushes every result into `tx`.
/// The worker checks `cancelled` before each digest, so a failed or cancelled
/// batch stops consuming entropy promptly.
///
/// # Arguments
///
/// - `worker_id`: Index of this worker within the batch (`0` is the remainder
///   worker). Used in logs and attached to failures.
/// - `share`: Number of digests this worker owes the batch. May be zero, in
///   which case the worker returns without touching `source` or `tx`.
/// - `source`: The digest strategy shared by every worker of the batch.
/// - `tx`: Result channel drained by the distributor.
/// - `cancelled`: Batch-scoped token; set when the batch fails, completes or
///   is cancelled by the caller.
///
/// # Behavior
///
/// - Sends at most `share` messages in total, so a channel with capacity equal
///   to the batch size never blocks a producer.
/// - On a generation error, sends a single [`Error::GenerationFailed`] tagged
///   with `worker_id` and exits.
/// - Exits early if the receiver has been dropped.
pub(crate) async fn worker_loop<G>(
    worker_id: usize,
    share: usize,
    source: Arc<G>,
    tx: mpsc::Sender<Result<Digest>>,
    cancelled: CancellationToken,
) where
    G: DigestSource + ?Sized,
{
    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {worker_id} started with share {share}");

    for _ in 0..share {
        if cancelled.is_cancelled() {
            #[cfg(feature = "tracing")]
            tracing::debug!("Worker {worker_id} exiting on cancellation");
            return;
        }

        match source.generate() {
            Ok(digest) => {
                if let Err(_e) = tx.send(Ok(digest)).await {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("Worker {worker_id} failed to send digest: {_e}");
                    return;
                }
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Worker {worker_id} failed to generate digest: {e}");

                let err = Error::GenerationFailed {
                    worker: worker_id,
                    source: Box::new(e),
                };
                if let Err(_e) = tx.send(Err(err)).await {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("Worker {worker_id} failed to send error: {_e}");
                }
                return;
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {worker_id} stopped");
}
