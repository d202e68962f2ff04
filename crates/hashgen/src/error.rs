//! Error types for digest generation and work distribution.
//!
//! ## Error Cases
//! - `EntropyUnavailable`: The OS entropy source failed to deliver bytes.
//! - `GenerationFailed`: A worker's digest source failed while a batch was in
//!   flight. Wraps the worker's own error.
//! - `Cancelled`: The caller cancelled the batch before it completed.
//! - `WorkerLost`: Every producer went away before the batch was complete.

/// A result type defaulting to [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All possible errors that `hashgen` can produce.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The entropy source could not fill the seed buffer.
    #[error("Entropy unavailable: {reason}")]
    EntropyUnavailable { reason: String },

    /// A worker failed to produce one of its digests.
    #[error("Digest generation failed in worker {worker}: {source}")]
    GenerationFailed {
        worker: usize,
        #[source]
        source: Box<Error>,
    },

    /// The batch was cancelled by the caller.
    #[error("Batch cancelled")]
    Cancelled,

    /// The result channel closed before the batch was complete.
    #[error("Worker lost: {context}")]
    WorkerLost { context: String },
}

impl Error {
    /// Returns the innermost error, unwrapping any `GenerationFailed` layers.
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::GenerationFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
