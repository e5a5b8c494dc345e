//! INI configuration file.
//!
//! ```ini
//! [tiles]
//! tile_width = 512
//! tile_height = 512
//! texture_format = rgba8
//! linear_filter = true
//! mipmaps = true
//! force_updates = false
//! split_scale = 2.9
//!
//! [tiling]
//! level_zero_delta_lat = 36
//! level_zero_delta_lon = 36
//! num_levels = 17
//! origin_lat = -90
//! origin_lon = -180
//!
//! [cache]
//! texture_cache_mb = 256
//! tile_pool_capacity = 20000
//! ```
//!
//! Missing sections and keys keep their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use ini::Ini;
use tracing::debug;

use super::{CacheConfig, ConfigError, ConfigKey, TileBuilderConfig, TilingConfig};

/// Default configuration file location: `<config dir>/surfacetiles/config.ini`.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("surfacetiles")
        .join("config.ini")
}

/// Everything stored in the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConfigFile {
    pub tiles: TileBuilderConfig,
    pub tiling: TilingConfig,
    pub cache: CacheConfig,
}

impl ConfigFile {
    /// Load from the default location, falling back to defaults if it does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file_path();
        if !path.exists() {
            debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse INI text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let mut config = Self::default();
        for key in ConfigKey::all() {
            let value = ini
                .section(Some(key.section()))
                .and_then(|section| section.get(key.key_name()));
            if let Some(value) = value {
                key.set(&mut config, value)?;
            }
        }
        Ok(config)
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        self.to_ini().write_to_file(path)?;
        debug!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }
        ini
    }

    pub fn to_ini_string(&self) -> String {
        let mut buffer = Vec::new();
        // Writing into memory cannot fail.
        let _ = self.to_ini().write_to(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}
