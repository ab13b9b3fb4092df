//! Tag-invalidated query cache shared by the data services.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

/// Groups of cached queries; a mutation invalidates its whole tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheTag {
    Assessment,
    Session,
    User,
    Question,
}

type Entry = Arc<dyn Any + Send + Sync>;

#[derive(Clone, Default)]
pub struct QueryCache {
    entries: Arc<Mutex<HashMap<(CacheTag, String), Entry>>>,
}

impl QueryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock leaves the map itself intact.
    fn entries(&self) -> MutexGuard<'_, HashMap<(CacheTag, String), Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached value for `(tag, key)` if one of type `T` is present.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self, tag: CacheTag, key: &str) -> Option<Arc<T>> {
        let entry = self.entries().get(&(tag, key.to_string())).cloned()?;
        entry.downcast::<T>().ok()
    }

    pub fn put<T: Any + Send + Sync>(&self, tag: CacheTag, key: &str, value: T) -> Arc<T> {
        let value = Arc::new(value);
        self.entries()
            .insert((tag, key.to_string()), Arc::clone(&value) as Entry);
        value
    }

    pub fn invalidate(&self, tag: CacheTag) {
        self.entries().retain(|(entry_tag, _), _| *entry_tag != tag);
        debug!(?tag, "cache invalidated");
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Return the cached value, or run `fetch` and cache its success.
    ///
    /// `force` skips the lookup, like a manual refetch.
    ///
    /// # Errors
    ///
    /// Propagates the error from `fetch`; failures are not cached.
    pub async fn get_or_fetch<T, E, F, Fut>(
        &self,
        tag: CacheTag,
        key: &str,
        force: bool,
        fetch: F,
    ) -> Result<Arc<T>, E>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !force {
            if let Some(hit) = self.get::<T>(tag, key) {
                return Ok(hit);
            }
        }
        let value = fetch().await?;
        Ok(self.put(tag, key, value))
    }
}
