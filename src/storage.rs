//! Persisted client storage seam.
//!
//! The session core treats browser-style storage as a collaborator: a flat
//! key/value space that logout wipes wholesale. The only key the core
//! itself maintains is the cached profile-image URL, which survives reloads
//! faster than a full profile refetch would.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

/// Storage key of the cached profile-image URL.
pub const PROFILE_IMAGE_KEY: &str = "profile_image_url";

/// Flat key/value client storage.
///
/// Implementations must tolerate concurrent access; the session controller
/// and the HTTP pipeline both write to it during teardown.
pub trait ClientStorage: Send + Sync {
    /// Stores a value under a key, overwriting any previous value.
    fn set(&self, key: &str, value: &str);

    /// Returns the value for a key, if set.
    fn get(&self, key: &str) -> Option<String>;

    /// Removes a single key.
    fn remove(&self, key: &str);

    /// Wipes the entire storage. Called on logout and hard 403.
    fn clear(&self);
}

/// In-memory [`ClientStorage`], the default for native hosts and tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Creates an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the storage holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl ClientStorage for MemoryStorage {
    fn set(&self, key: &str, value: &str) {
        self.lock().insert(key.to_owned(), value.to_owned());
    }

    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn remove(&self, key: &str) {
        self.lock().remove(key);
    }

    fn clear(&self) {
        self.lock().clear();
    }
}
