use std::num::NonZeroUsize;

use crate::error::ConfigError;

/// Number of records grouped into one insert + publish cycle. Always at
/// least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSize(NonZeroUsize);

impl BatchSize {
    pub const DEFAULT: BatchSize = BatchSize(NonZeroUsize::MIN.saturating_add(9));

    #[must_use]
    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i64> for BatchSize {
    type Error = ConfigError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(BatchSize)
            .ok_or(ConfigError::InvalidBatchSize(value))
    }
}

impl From<NonZeroUsize> for BatchSize {
    fn from(value: NonZeroUsize) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for BatchSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Contiguous batches of `items`, each `size` long except possibly the last.
/// Lazy: nothing is copied.
pub fn batches<T>(items: &[T], size: BatchSize) -> std::slice::Chunks<'_, T> {
    items.chunks(size.get())
}

/// Number of batches [`batches`] yields for `len` items.
#[must_use]
pub fn batch_count(len: usize, size: BatchSize) -> usize {
    len.div_ceil(size.get())
}
