//! # Sample Cache
//!
//! Bounded pool of decoded samples keyed by resource id, with least
//! recently used eviction.
//!
//! The cache owns the residency bookkeeping only; decoding and memory live
//! behind the [`SampleLoader`] bridge. Resolving a missing resource at
//! capacity evicts exactly one entry (the least recently used) before
//! loading, so residency never exceeds the configured bound. A failed load
//! leaves no partial entry behind.

use crate::error::{PlaybackError, Result};
use bridge_traits::{ResourceId, SampleHandle, SampleLoader};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Capacity-bounded map from resource ids to resident sample handles.
///
/// Not internally synchronized; callers that share a cache across
/// controllers wrap it in a mutex and serialize access.
pub struct SampleCache {
    entries: LruCache<ResourceId, SampleHandle>,
    loader: Arc<dyn SampleLoader>,
}

impl SampleCache {
    /// Create a cache holding at most `capacity` samples.
    ///
    /// A zero capacity can never admit an entry and is rejected with
    /// [`PlaybackError::CacheExhausted`].
    pub fn new(capacity: usize, loader: Arc<dyn SampleLoader>) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or(PlaybackError::CacheExhausted)?;
        Ok(Self {
            entries: LruCache::new(capacity),
            loader,
        })
    }

    /// Return a handle for `id`, loading it if necessary.
    ///
    /// A hit promotes the entry to most recently used and returns the
    /// existing handle without touching the loader. A miss evicts the least
    /// recently used entry when full, then loads and inserts `id` as most
    /// recently used.
    pub async fn resolve(&mut self, id: &ResourceId) -> Result<SampleHandle> {
        if let Some(handle) = self.entries.get(id) {
            let handle = *handle;
            debug!(resource = %id, sample = %handle, "sample cache hit");
            return Ok(handle);
        }

        if self.entries.len() == self.capacity() {
            if let Some((evicted_id, evicted_handle)) = self.entries.pop_lru() {
                debug!(
                    resource = %evicted_id,
                    sample = %evicted_handle,
                    "evicting least recently used sample"
                );
                if let Err(error) = self.loader.unload(evicted_handle).await {
                    warn!(resource = %evicted_id, %error, "failed to unload evicted sample");
                }
            }
        }

        let handle = self
            .loader
            .load(id)
            .await
            .map_err(|error| PlaybackError::LoadFailed {
                id: id.clone(),
                reason: error.to_string(),
            })?;

        self.entries.put(id.clone(), handle);
        debug!(resource = %id, sample = %handle, "sample loaded into cache");
        Ok(handle)
    }

    /// Warm the cache through the regular resolve path.
    pub async fn preload(&mut self, ids: &[ResourceId]) -> Result<()> {
        for id in ids {
            self.resolve(id).await?;
        }
        Ok(())
    }

    /// Remove and unload the entry for `id`. Returns `true` if an entry was
    /// resident; absent ids are a no-op.
    pub async fn invalidate(&mut self, id: &ResourceId) -> bool {
        match self.entries.pop(id) {
            Some(handle) => {
                debug!(resource = %id, sample = %handle, "invalidating cached sample");
                if let Err(error) = self.loader.unload(handle).await {
                    warn!(resource = %id, %error, "failed to unload invalidated sample");
                }
                true
            }
            None => false,
        }
    }

    /// Unload and drop every entry. Returns the number of entries removed.
    pub async fn clear(&mut self) -> usize {
        let mut removed = 0;
        while let Some((id, handle)) = self.entries.pop_lru() {
            if let Err(error) = self.loader.unload(handle).await {
                warn!(resource = %id, %error, "failed to unload sample during clear");
            }
            removed += 1;
        }
        debug!(removed, "sample cache cleared");
        removed
    }

    /// Whether `id` is resident, without promoting it.
    pub fn contains(&self, id: &ResourceId) -> bool {
        self.entries.peek(id).is_some()
    }

    /// Number of resident samples.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured residency bound.
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::mock::MockSampleLoader;

    #[test]
    fn zero_capacity_is_rejected() {
        let loader = Arc::new(MockSampleLoader::new());
        assert!(matches!(
            SampleCache::new(0, loader).err(),
            Some(PlaybackError::CacheExhausted)
        ));
    }

    #[tokio::test]
    async fn hit_reuses_handle_without_loading() {
        let loader = Arc::new(MockSampleLoader::new());
        let mut cache = SampleCache::new(4, loader.clone()).unwrap();

        let id = ResourceId::from("click");
        let first = cache.resolve(&id).await.unwrap();
        let second = cache.resolve(&id).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(loader.load_count(&id), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn failed_load_leaves_no_entry() {
        let loader = Arc::new(MockSampleLoader::new());
        loader.fail_on("broken");
        let mut cache = SampleCache::new(4, loader.clone()).unwrap();

        let err = cache.resolve(&"broken".into()).await.unwrap_err();
        assert!(matches!(err, PlaybackError::LoadFailed { .. }));
        assert!(cache.is_empty());
        assert!(!cache.contains(&"broken".into()));
    }

    #[tokio::test]
    async fn preload_fills_in_order() {
        let loader = Arc::new(MockSampleLoader::new());
        let mut cache = SampleCache::new(4, loader.clone()).unwrap();

        let ids: Vec<ResourceId> = ["a", "b", "c"].iter().map(|s| (*s).into()).collect();
        cache.preload(&ids).await.unwrap();

        assert_eq!(cache.len(), 3);
        assert_eq!(loader.loads(), ids);
    }
}
