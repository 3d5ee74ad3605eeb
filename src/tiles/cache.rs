use crate::{constants::DEFAULT_TILE_CACHE_SIZE, core::geo::TileCoord};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(DEFAULT_TILE_CACHE_SIZE) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};

/// Identifies a tile of a particular base layer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileKey {
    /// Id of the tile layer
    pub source: String,
    pub coord: TileCoord,
}

impl TileKey {
    pub fn new(source: impl Into<String>, coord: TileCoord) -> Self {
        Self {
            source: source.into(),
            coord,
        }
    }
}

/// In-memory tile cache using LRU eviction; clones share storage
#[derive(Debug, Clone)]
pub struct TileCache {
    cache: Arc<Mutex<LruCache<TileKey, Arc<Vec<u8>>>>>,
}

impl TileCache {
    /// A zero capacity falls back to the default size
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(DEFAULT_CAPACITY);
        Self {
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    pub fn get(&self, key: &TileKey) -> Option<Arc<Vec<u8>>> {
        self.cache.lock().ok()?.get(key).cloned()
    }

    pub fn insert(&self, key: TileKey, data: Vec<u8>) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key, Arc::new(data));
        }
    }

    pub fn contains(&self, key: &TileKey) -> bool {
        self.cache
            .lock()
            .map(|cache| cache.contains(key))
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.cache
            .lock()
            .map(|cache| cache.cap().get())
            .unwrap_or(0)
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY.get())
    }
}
