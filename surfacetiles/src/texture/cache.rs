//! Memory-bounded texture cache keyed by tile.
//!
//! Backed by `moka::sync::Cache` weighed by each texture's estimated size, so
//! the least recently used textures are evicted once the byte budget is
//! exceeded. An evicted texture is simply re-created and redrawn the next
//! time its tile is visible.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use moka::sync::Cache;

use crate::tiling::TileKey;

use super::TileTexture;

/// Default texture budget: 256 MiB.
pub const DEFAULT_TEXTURE_CACHE_BYTES: u64 = 256 * 1024 * 1024;

/// Point-in-time texture cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entry_count: u64,
    pub size_bytes: u64,
}

impl TextureCacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache of tile textures bounded by estimated bytes.
pub struct TileTextureCache {
    cache: Cache<TileKey, Arc<TileTexture>>,
    max_size_bytes: u64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TileTextureCache {
    pub fn new(max_size_bytes: u64) -> Self {
        let cache = Cache::builder()
            .weigher(|_key: &TileKey, texture: &Arc<TileTexture>| -> u32 {
                texture.estimated_memory_size().min(u32::MAX as u64) as u32
            })
            .max_capacity(max_size_bytes)
            .build();

        Self {
            cache,
            max_size_bytes,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Texture for `key`, refreshing its recency.
    pub fn get(&self, key: &TileKey) -> Option<Arc<TileTexture>> {
        let texture = self.cache.get(key);
        if texture.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        texture
    }

    pub fn put(&self, key: TileKey, texture: Arc<TileTexture>) {
        self.cache.insert(key, texture);
    }

    pub fn remove(&self, key: &TileKey) {
        self.cache.invalidate(key);
    }

    pub fn contains(&self, key: &TileKey) -> bool {
        self.cache.contains_key(key)
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks();
    }

    /// Apply pending evictions so that counts and sizes are current.
    pub fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks();
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    pub fn size_bytes(&self) -> u64 {
        self.cache.weighted_size()
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    pub fn stats(&self) -> TextureCacheStats {
        TextureCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: self.entry_count(),
            size_bytes: self.size_bytes(),
        }
    }
}

impl Default for TileTextureCache {
    fn default() -> Self {
        Self::new(DEFAULT_TEXTURE_CACHE_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::{TextureFormat, TextureParams};
    use crate::tiling::CacheNamespace;

    fn texture(size: u32) -> Arc<TileTexture> {
        Arc::new(
            TileTexture::new(TextureParams {
                width: size,
                height: size,
                format: TextureFormat::Rgba8,
                linear_filter: true,
                mipmaps: false,
            })
            .unwrap(),
        )
    }

    fn key(column: i32) -> TileKey {
        TileKey::new(0, 0, column, CacheNamespace(1))
    }

    #[test]
    fn test_put_and_get() {
        let cache = TileTextureCache::default();
        let t = texture(16);
        cache.put(key(0), Arc::clone(&t));

        let found = cache.get(&key(0)).unwrap();
        assert!(Arc::ptr_eq(&found, &t));
        assert!(cache.get(&key(1)).is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_remove() {
        let cache = TileTextureCache::default();
        cache.put(key(0), texture(16));
        assert!(cache.contains(&key(0)));
        cache.remove(&key(0));
        assert!(!cache.contains(&key(0)));
    }

    #[test]
    fn test_size_tracks_estimated_bytes() {
        let cache = TileTextureCache::default();
        cache.put(key(0), texture(16));
        cache.put(key(1), texture(32));
        cache.run_pending_tasks();

        assert_eq!(cache.entry_count(), 2);
        assert_eq!(cache.size_bytes(), 16 * 16 * 4 + 32 * 32 * 4);
    }

    #[test]
    fn test_eviction_respects_budget() {
        // Room for four 16×16 RGBA textures.
        let cache = TileTextureCache::new(4 * 16 * 16 * 4);
        for column in 0..10 {
            cache.put(key(column), texture(16));
        }
        cache.run_pending_tasks();

        assert!(cache.size_bytes() <= cache.max_size_bytes());
        assert!(cache.entry_count() <= 4);
    }

    #[test]
    fn test_clear() {
        let cache = TileTextureCache::default();
        cache.put(key(0), texture(16));
        cache.clear();
        assert_eq!(cache.entry_count(), 0);
        assert!(cache.get(&key(0)).is_none());
    }
}
