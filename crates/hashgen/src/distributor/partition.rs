use core::num::NonZeroUsize;

/// How a batch of `count` items is split across a worker pool.
///
/// Every batch is decomposed as `base * workers + remainder == count`. One
/// remainder worker takes the `remainder` items and each of the `workers` base
/// workers takes `base` items. Either share may be zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Partition {
    pub base: usize,
    pub remainder: usize,
    pub workers: NonZeroUsize,
}

impl Partition {
    pub const fn new(count: usize, workers: NonZeroUsize) -> Self {
        Self {
            base: count / workers.get(),
            remainder: count % workers.get(),
            workers,
        }
    }

    /// Total number of items covered by this partition.
    pub const fn total(&self) -> usize {
        self.base * self.workers.get() + self.remainder
    }

    /// Number of tasks a batch spawns: the base workers plus the remainder
    /// worker.
    pub const fn tasks(&self) -> usize {
        self.workers.get() + 1
    }

    /// Per-task item counts, remainder worker first.
    pub fn shares(&self) -> impl Iterator<Item = usize> + '_ {
        core::iter::once(self.remainder)
            .chain(core::iter::repeat_n(self.base, self.workers.get()))
    }
}
