//! Failover-ordered pool of upstream provider keys.

use std::sync::atomic::{AtomicUsize, Ordering};

use caseprep_core::error::DomainError;
use secrecy::SecretString;

/// An ordered, non-empty list of upstream keys with a shared
/// "last-known-good" cursor.
///
/// The cursor is owned by the pool. [`KeyPool::advance`] is its only mutator
/// and moves it with a single compare-and-swap, so racing failovers never
/// skip past a healthy key nor land on an index outside the pool.
#[derive(Debug)]
pub struct KeyPool {
    keys: Vec<SecretString>,
    cursor: AtomicUsize,
}

impl KeyPool {
    /// Creates a pool starting at the first key.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `keys` is empty.
    pub fn new(keys: Vec<SecretString>) -> Result<Self, DomainError> {
        if keys.is_empty() {
            return Err(DomainError::Validation(
                "the upstream key pool needs at least one key".to_owned(),
            ));
        }
        Ok(Self {
            keys,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Number of keys in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always false; a pool cannot be built empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Index the next call will use.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    /// Returns the current key together with its index.
    #[must_use]
    pub fn current(&self) -> (usize, &SecretString) {
        let index = self.cursor() % self.keys.len();
        (index, &self.keys[index])
    }

    /// Marks the key at `failed_index` as failed and moves the cursor to the
    /// next key, wrapping at the end. Returns the cursor after the call.
    ///
    /// If another caller already moved the cursor away from `failed_index`,
    /// the cursor is left where it is.
    pub fn advance(&self, failed_index: usize) -> usize {
        let next = (failed_index + 1) % self.keys.len();
        match self.cursor.compare_exchange(
            failed_index,
            next,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => next,
            Err(moved) => moved,
        }
    }
}
