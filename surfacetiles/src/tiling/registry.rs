//! Shared tiling state: level sets, the tile pool, textures and namespaces.
//!
//! A [`TilingRegistry`] is created by the application and shared by `Arc`
//! between every tile builder that should reuse the same level sets and
//! caches. Dropping the last reference releases all pooled tiles and textures.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::builder::TilePool;
use crate::config::CacheConfig;
use crate::texture::TileTextureCache;

use super::{CacheNamespace, LevelSet, LevelSetParams, TileDimension, TilingError};

/// Registry of level sets and tile caches shared across builders.
pub struct TilingRegistry {
    params: LevelSetParams,
    level_sets: DashMap<TileDimension, Arc<LevelSet>>,
    tile_pool: TilePool,
    texture_cache: TileTextureCache,
    next_namespace: AtomicU64,
}

impl TilingRegistry {
    /// Create a registry after validating the level set parameters.
    pub fn new(params: LevelSetParams, cache: &CacheConfig) -> Result<Self, TilingError> {
        params.validate()?;
        debug!(
            num_levels = params.num_levels,
            texture_cache_bytes = cache.texture_cache_bytes,
            tile_pool_capacity = cache.tile_pool_capacity,
            "Creating tiling registry"
        );
        Ok(Self {
            params,
            level_sets: DashMap::new(),
            tile_pool: TilePool::new(cache.tile_pool_capacity),
            texture_cache: TileTextureCache::new(cache.texture_cache_bytes),
            next_namespace: AtomicU64::new(1),
        })
    }

    /// Registry with default tiling parameters and cache sizes.
    pub fn with_defaults() -> Self {
        Self {
            params: LevelSetParams::default(),
            level_sets: DashMap::new(),
            tile_pool: TilePool::new(CacheConfig::default().tile_pool_capacity),
            texture_cache: TileTextureCache::new(CacheConfig::default().texture_cache_bytes),
            next_namespace: AtomicU64::new(1),
        }
    }

    pub fn params(&self) -> &LevelSetParams {
        &self.params
    }

    /// The level set for `dimension`, created on first request.
    ///
    /// Repeated calls with the same dimension return the same instance.
    pub fn level_set(&self, dimension: TileDimension) -> Result<Arc<LevelSet>, TilingError> {
        match self.level_sets.entry(dimension) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let level_set = Arc::new(LevelSet::new(&self.params, dimension)?);
                debug!(dimension = %dimension, "Created level set");
                entry.insert(Arc::clone(&level_set));
                Ok(level_set)
            }
        }
    }

    pub fn level_set_count(&self) -> usize {
        self.level_sets.len()
    }

    /// Allocate a namespace no other caller has received from this registry.
    pub fn allocate_namespace(&self) -> CacheNamespace {
        CacheNamespace(self.next_namespace.fetch_add(1, Ordering::Relaxed))
    }

    pub fn tile_pool(&self) -> &TilePool {
        &self.tile_pool
    }

    pub fn texture_cache(&self) -> &TileTextureCache {
        &self.texture_cache
    }
}

impl Default for TilingRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for TilingRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TilingRegistry")
            .field("params", &self.params)
            .field("level_sets", &self.level_sets.len())
            .field("pooled_tiles", &self.tile_pool.entry_count())
            .field("cached_textures", &self.texture_cache.entry_count())
            .finish()
    }
}
