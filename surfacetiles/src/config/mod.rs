//! Configuration for tile building, tiling and caches.
//!
//! The typed structs here are what the library consumes. [`ConfigFile`]
//! persists them as INI with `[tiles]`, `[tiling]` and `[cache]` sections,
//! and [`ConfigKey`] addresses individual settings as `section.key`.

mod file;
mod keys;

pub use file::{config_file_path, ConfigFile};
pub use keys::ConfigKey;

use thiserror::Error;

use crate::builder::{DEFAULT_SPLIT_SCALE, DEFAULT_TILE_POOL_CAPACITY};
use crate::geo::{LatLon, Sector};
use crate::texture::{TextureFormat, DEFAULT_TEXTURE_CACHE_BYTES};
use crate::tiling::{
    LevelSetParams, DEFAULT_LEVEL_ZERO_DELTA, DEFAULT_NUM_LEVELS, DEFAULT_TILE_ORIGIN,
};

/// Default tile width and height in pixels.
pub const DEFAULT_TILE_DIMENSION: u32 = 512;

/// Errors from loading, saving or editing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Settings for a [`SurfaceObjectTileBuilder`](crate::builder::SurfaceObjectTileBuilder).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBuilderConfig {
    /// Requested tile width in pixels, floored to a power of two at build time.
    pub tile_width: u32,
    /// Requested tile height in pixels.
    pub tile_height: u32,
    pub texture_format: TextureFormat,
    pub use_linear_filter: bool,
    pub use_mipmaps: bool,
    /// Redraw every visible tile each frame, ignoring state keys.
    pub force_tile_updates: bool,
    /// Level of detail exponent; larger values refine further.
    pub split_scale: f64,
}

impl Default for TileBuilderConfig {
    fn default() -> Self {
        Self {
            tile_width: DEFAULT_TILE_DIMENSION,
            tile_height: DEFAULT_TILE_DIMENSION,
            texture_format: TextureFormat::default(),
            use_linear_filter: true,
            use_mipmaps: true,
            force_tile_updates: false,
            split_scale: DEFAULT_SPLIT_SCALE,
        }
    }
}

impl TileBuilderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tile_dimension(mut self, width: u32, height: u32) -> Self {
        self.tile_width = width;
        self.tile_height = height;
        self
    }

    pub fn with_texture_format(mut self, format: TextureFormat) -> Self {
        self.texture_format = format;
        self
    }

    pub fn with_linear_filter(mut self, enabled: bool) -> Self {
        self.use_linear_filter = enabled;
        self
    }

    pub fn with_mipmaps(mut self, enabled: bool) -> Self {
        self.use_mipmaps = enabled;
        self
    }

    pub fn with_force_tile_updates(mut self, enabled: bool) -> Self {
        self.force_tile_updates = enabled;
        self
    }

    pub fn with_split_scale(mut self, split_scale: f64) -> Self {
        self.split_scale = split_scale;
        self
    }
}

/// Quadtree geometry shared by every level set of a registry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilingConfig {
    pub level_zero_delta_lat: f64,
    pub level_zero_delta_lon: f64,
    pub num_levels: u32,
    pub origin_lat: f64,
    pub origin_lon: f64,
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            level_zero_delta_lat: DEFAULT_LEVEL_ZERO_DELTA,
            level_zero_delta_lon: DEFAULT_LEVEL_ZERO_DELTA,
            num_levels: DEFAULT_NUM_LEVELS,
            origin_lat: DEFAULT_TILE_ORIGIN.lat,
            origin_lon: DEFAULT_TILE_ORIGIN.lon,
        }
    }
}

impl TilingConfig {
    pub fn with_level_zero_delta(mut self, lat: f64, lon: f64) -> Self {
        self.level_zero_delta_lat = lat;
        self.level_zero_delta_lon = lon;
        self
    }

    pub fn with_num_levels(mut self, num_levels: u32) -> Self {
        self.num_levels = num_levels;
        self
    }

    pub fn with_origin(mut self, lat: f64, lon: f64) -> Self {
        self.origin_lat = lat;
        self.origin_lon = lon;
        self
    }

    pub fn level_set_params(&self) -> LevelSetParams {
        LevelSetParams {
            level_zero_delta: LatLon::from_degrees(
                self.level_zero_delta_lat,
                self.level_zero_delta_lon,
            ),
            num_levels: self.num_levels,
            tile_origin: LatLon::from_degrees(self.origin_lat, self.origin_lon),
            sector: Sector::FULL_SPHERE,
        }
    }
}

/// Cache budgets held by a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Texture cache budget in bytes.
    pub texture_cache_bytes: u64,
    /// Maximum number of pooled tile entries.
    pub tile_pool_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            texture_cache_bytes: DEFAULT_TEXTURE_CACHE_BYTES,
            tile_pool_capacity: DEFAULT_TILE_POOL_CAPACITY,
        }
    }
}

impl CacheConfig {
    pub fn with_texture_cache_bytes(mut self, bytes: u64) -> Self {
        self.texture_cache_bytes = bytes;
        self
    }

    pub fn with_tile_pool_capacity(mut self, capacity: u64) -> Self {
        self.tile_pool_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let tiles = TileBuilderConfig::default();
        assert_eq!(tiles.tile_width, 512);
        assert_eq!(tiles.tile_height, 512);
        assert_eq!(tiles.texture_format, TextureFormat::Rgba8);
        assert!(tiles.use_linear_filter);
        assert!(tiles.use_mipmaps);
        assert!(!tiles.force_tile_updates);
        assert_eq!(tiles.split_scale, 2.9);

        let cache = CacheConfig::default();
        assert_eq!(cache.texture_cache_bytes, 256 * 1024 * 1024);
        assert_eq!(cache.tile_pool_capacity, 20_000);
    }

    #[test]
    fn test_cache_defaults_match_texture_cache() {
        assert_eq!(
            CacheConfig::default().texture_cache_bytes,
            crate::texture::DEFAULT_TEXTURE_CACHE_BYTES
        );
        let registry = crate::tiling::TilingRegistry::with_defaults();
        assert_eq!(
            registry.texture_cache().max_size_bytes(),
            DEFAULT_TEXTURE_CACHE_BYTES
        );
    }

    #[test]
    fn test_tiling_defaults_match_level_set_defaults() {
        assert_eq!(
            TilingConfig::default().level_set_params(),
            LevelSetParams::default()
        );
    }

    #[test]
    fn test_builder_setters() {
        let config = TileBuilderConfig::new()
            .with_tile_dimension(256, 128)
            .with_texture_format(TextureFormat::Rgb8)
            .with_linear_filter(false)
            .with_mipmaps(false)
            .with_force_tile_updates(true)
            .with_split_scale(3.2);

        assert_eq!(config.tile_width, 256);
        assert_eq!(config.tile_height, 128);
        assert_eq!(config.texture_format, TextureFormat::Rgb8);
        assert!(!config.use_linear_filter);
        assert!(!config.use_mipmaps);
        assert!(config.force_tile_updates);
        assert_eq!(config.split_scale, 3.2);
    }
}
