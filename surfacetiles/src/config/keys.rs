//! Addressable configuration settings.

use std::fmt;
use std::str::FromStr;

use crate::texture::TextureFormat;

use super::{ConfigError, ConfigFile};

const BYTES_PER_MIB: u64 = 1024 * 1024;

/// A single setting, addressed as `section.key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    TilesTileWidth,
    TilesTileHeight,
    TilesTextureFormat,
    TilesLinearFilter,
    TilesMipmaps,
    TilesForceUpdates,
    TilesSplitScale,
    TilingLevelZeroDeltaLat,
    TilingLevelZeroDeltaLon,
    TilingNumLevels,
    TilingOriginLat,
    TilingOriginLon,
    CacheTextureCacheMb,
    CacheTilePoolCapacity,
}

impl ConfigKey {
    /// Every key, grouped by section in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::TilesTileWidth,
            ConfigKey::TilesTileHeight,
            ConfigKey::TilesTextureFormat,
            ConfigKey::TilesLinearFilter,
            ConfigKey::TilesMipmaps,
            ConfigKey::TilesForceUpdates,
            ConfigKey::TilesSplitScale,
            ConfigKey::TilingLevelZeroDeltaLat,
            ConfigKey::TilingLevelZeroDeltaLon,
            ConfigKey::TilingNumLevels,
            ConfigKey::TilingOriginLat,
            ConfigKey::TilingOriginLon,
            ConfigKey::CacheTextureCacheMb,
            ConfigKey::CacheTilePoolCapacity,
        ]
    }

    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::TilesTileWidth
            | ConfigKey::TilesTileHeight
            | ConfigKey::TilesTextureFormat
            | ConfigKey::TilesLinearFilter
            | ConfigKey::TilesMipmaps
            | ConfigKey::TilesForceUpdates
            | ConfigKey::TilesSplitScale => "tiles",
            ConfigKey::TilingLevelZeroDeltaLat
            | ConfigKey::TilingLevelZeroDeltaLon
            | ConfigKey::TilingNumLevels
            | ConfigKey::TilingOriginLat
            | ConfigKey::TilingOriginLon => "tiling",
            ConfigKey::CacheTextureCacheMb | ConfigKey::CacheTilePoolCapacity => "cache",
        }
    }

    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::TilesTileWidth => "tile_width",
            ConfigKey::TilesTileHeight => "tile_height",
            ConfigKey::TilesTextureFormat => "texture_format",
            ConfigKey::TilesLinearFilter => "linear_filter",
            ConfigKey::TilesMipmaps => "mipmaps",
            ConfigKey::TilesForceUpdates => "force_updates",
            ConfigKey::TilesSplitScale => "split_scale",
            ConfigKey::TilingLevelZeroDeltaLat => "level_zero_delta_lat",
            ConfigKey::TilingLevelZeroDeltaLon => "level_zero_delta_lon",
            ConfigKey::TilingNumLevels => "num_levels",
            ConfigKey::TilingOriginLat => "origin_lat",
            ConfigKey::TilingOriginLon => "origin_lon",
            ConfigKey::CacheTextureCacheMb => "texture_cache_mb",
            ConfigKey::CacheTilePoolCapacity => "tile_pool_capacity",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value formatted as it is written to the file.
    pub fn get(&self, config: &ConfigFile) -> String {
        let tiles = &config.tiles;
        let tiling = &config.tiling;
        let cache = &config.cache;
        match self {
            ConfigKey::TilesTileWidth => tiles.tile_width.to_string(),
            ConfigKey::TilesTileHeight => tiles.tile_height.to_string(),
            ConfigKey::TilesTextureFormat => tiles.texture_format.to_string(),
            ConfigKey::TilesLinearFilter => tiles.use_linear_filter.to_string(),
            ConfigKey::TilesMipmaps => tiles.use_mipmaps.to_string(),
            ConfigKey::TilesForceUpdates => tiles.force_tile_updates.to_string(),
            ConfigKey::TilesSplitScale => tiles.split_scale.to_string(),
            ConfigKey::TilingLevelZeroDeltaLat => tiling.level_zero_delta_lat.to_string(),
            ConfigKey::TilingLevelZeroDeltaLon => tiling.level_zero_delta_lon.to_string(),
            ConfigKey::TilingNumLevels => tiling.num_levels.to_string(),
            ConfigKey::TilingOriginLat => tiling.origin_lat.to_string(),
            ConfigKey::TilingOriginLon => tiling.origin_lon.to_string(),
            ConfigKey::CacheTextureCacheMb => (cache.texture_cache_bytes / BYTES_PER_MIB).to_string(),
            ConfigKey::CacheTilePoolCapacity => cache.tile_pool_capacity.to_string(),
        }
    }

    /// Parse and validate `value`, then store it in `config`.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match self {
            ConfigKey::TilesTileWidth => config.tiles.tile_width = self.parse_positive(value)?,
            ConfigKey::TilesTileHeight => config.tiles.tile_height = self.parse_positive(value)?,
            ConfigKey::TilesTextureFormat => {
                config.tiles.texture_format = value
                    .parse::<TextureFormat>()
                    .map_err(|e| self.invalid(value, e.to_string()))?
            }
            ConfigKey::TilesLinearFilter => config.tiles.use_linear_filter = self.parse_bool(value)?,
            ConfigKey::TilesMipmaps => config.tiles.use_mipmaps = self.parse_bool(value)?,
            ConfigKey::TilesForceUpdates => config.tiles.force_tile_updates = self.parse_bool(value)?,
            ConfigKey::TilesSplitScale => {
                config.tiles.split_scale = self.parse_f64_in(value, 0.0, 10.0)?
            }
            ConfigKey::TilingLevelZeroDeltaLat => {
                config.tiling.level_zero_delta_lat = self.parse_delta(value, 180.0)?
            }
            ConfigKey::TilingLevelZeroDeltaLon => {
                config.tiling.level_zero_delta_lon = self.parse_delta(value, 360.0)?
            }
            ConfigKey::TilingNumLevels => {
                let levels: u32 = self.parse_positive(value)?;
                if levels > 30 {
                    return Err(self.invalid(value, "must be at most 30"));
                }
                config.tiling.num_levels = levels;
            }
            ConfigKey::TilingOriginLat => {
                config.tiling.origin_lat = self.parse_f64_in(value, -90.0, 90.0)?
            }
            ConfigKey::TilingOriginLon => {
                config.tiling.origin_lon = self.parse_f64_in(value, -180.0, 180.0)?
            }
            ConfigKey::CacheTextureCacheMb => {
                let mb: u64 = self.parse_positive(value)?;
                config.cache.texture_cache_bytes = mb.saturating_mul(BYTES_PER_MIB);
            }
            ConfigKey::CacheTilePoolCapacity => {
                config.cache.tile_pool_capacity = self.parse_positive(value)?
            }
        }
        Ok(())
    }

    fn invalid(&self, value: &str, reason: impl Into<String>) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    fn parse_positive<T>(&self, value: &str) -> Result<T, ConfigError>
    where
        T: FromStr + PartialOrd + Default,
    {
        let parsed: T = value
            .parse()
            .map_err(|_| self.invalid(value, "expected a positive integer"))?;
        if parsed <= T::default() {
            return Err(self.invalid(value, "must be greater than zero"));
        }
        Ok(parsed)
    }

    fn parse_bool(&self, value: &str) -> Result<bool, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(self.invalid(value, "expected true or false")),
        }
    }

    fn parse_f64_in(&self, value: &str, min: f64, max: f64) -> Result<f64, ConfigError> {
        let parsed: f64 = value
            .parse()
            .map_err(|_| self.invalid(value, "expected a number"))?;
        if !(min..=max).contains(&parsed) {
            return Err(self.invalid(value, format!("must be between {} and {}", min, max)));
        }
        Ok(parsed)
    }

    fn parse_delta(&self, value: &str, max: f64) -> Result<f64, ConfigError> {
        let parsed = self.parse_f64_in(value, 0.0, max)?;
        if parsed <= 0.0 {
            return Err(self.invalid(value, "must be greater than zero"));
        }
        Ok(parsed)
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key_name())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}
