//! The mutual-exclusion boundary around the live index.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use kn_index::IndexAdapter;

/// Cloneable handle to the one [`IndexAdapter`] shared by the render path,
/// the motion loop, and user actions.
#[derive(Clone)]
pub struct SharedIndex(Arc<Mutex<IndexAdapter>>);

impl SharedIndex {
    pub fn new(adapter: IndexAdapter) -> Self {
        Self(Arc::new(Mutex::new(adapter)))
    }

    /// Exclusive access.  A panic in another holder does not lock everyone
    /// out: every adapter operation leaves the index consistent before it
    /// can panic, so the poisoned guard is taken as is.
    pub fn lock(&self) -> MutexGuard<'_, IndexAdapter> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
