//! Geographic quadtree tiling.
//!
//! The globe is divided into a fixed grid of level-zero tiles (36° × 36° by
//! default), each of which splits into four children at the next level. Tiles
//! are addressed by `(level, row, column)` where row 0 is the southernmost
//! row and column 0 the westernmost column of the grid's origin.
//!
//! # Row and column math
//!
//! ```
//! use surfacetiles::tiling::{compute_column, compute_row};
//!
//! // 36° tiles starting at (-90°, -180°)
//! assert_eq!(compute_row(36.0, 10.0, -90.0).unwrap(), 2);
//! assert_eq!(compute_column(36.0, 100.0, -180.0).unwrap(), 7);
//!
//! // The last grid edge belongs to the last row/column
//! assert_eq!(compute_row(36.0, 90.0, -90.0).unwrap(), 4);
//! assert_eq!(compute_column(36.0, 180.0, -180.0).unwrap(), 9);
//! ```

mod key;
mod level;
pub mod registry;

pub use key::{CacheNamespace, TileDimension, TileKey};
pub use level::{
    Level, LevelSet, LevelSetParams, TileRange, DEFAULT_LEVEL_ZERO_DELTA, DEFAULT_NUM_LEVELS,
    DEFAULT_TILE_ORIGIN,
};
pub use registry::TilingRegistry;

use thiserror::Error;

/// Errors from tile addressing and level set construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TilingError {
    /// Latitude outside [-90°, 90°].
    #[error("Invalid latitude: {0}° (must be between -90° and 90°)")]
    InvalidLatitude(f64),

    /// Longitude outside [-180°, 180°].
    #[error("Invalid longitude: {0}° (must be between -180° and 180°)")]
    InvalidLongitude(f64),

    /// Tile delta that is zero, negative or not finite.
    #[error("Invalid tile delta: {0}° (must be positive)")]
    InvalidDelta(f64),

    /// Level set with no levels.
    #[error("Level set must contain at least one level")]
    NoLevels,

    /// Tile dimensions of zero pixels.
    #[error("Invalid tile dimension: {width}x{height}")]
    InvalidTileDimension { width: u32, height: u32 },

    /// Level number not present in the level set.
    #[error("Level {level} out of range (level set has {num_levels} levels)")]
    LevelOutOfRange { level: u32, num_levels: u32 },

    /// Level-zero grid whose edges do not fall on the poles and the antimeridian.
    #[error("Tile origin {origin}° is not aligned to {delta}° tiles spanning the globe")]
    MisalignedGrid { origin: f64, delta: f64 },
}

fn check_delta(delta: f64) -> Result<(), TilingError> {
    if delta.is_finite() && delta > 0.0 {
        Ok(())
    } else {
        Err(TilingError::InvalidDelta(delta))
    }
}

/// Row containing `latitude` in a grid of `delta`-degree rows starting at `origin`.
///
/// A latitude exactly 180° above the origin (the north edge of the grid)
/// belongs to the last row rather than to a row past the end.
pub fn compute_row(delta: f64, latitude: f64, origin: f64) -> Result<i32, TilingError> {
    check_delta(delta)?;
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(TilingError::InvalidLatitude(latitude));
    }

    let offset = latitude - origin;
    let mut row = (offset / delta).floor() as i32;
    if offset == 180.0 && row > 0 {
        row -= 1;
    }
    Ok(row)
}

/// Column containing `longitude` in a grid of `delta`-degree columns starting at `origin`.
///
/// Longitudes west of the origin wrap around by 360°. A longitude exactly
/// 360° east of the origin belongs to the last column.
pub fn compute_column(delta: f64, longitude: f64, origin: f64) -> Result<i32, TilingError> {
    check_delta(delta)?;
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(TilingError::InvalidLongitude(longitude));
    }

    let mut offset = longitude - origin;
    if offset < 0.0 {
        offset += 360.0;
    }
    let mut column = (offset / delta).floor() as i32;
    if offset == 360.0 && column > 0 {
        column -= 1;
    }
    Ok(column)
}

/// Southern edge latitude of `row`.
pub fn compute_row_latitude(row: i32, delta: f64, origin: f64) -> f64 {
    origin + row as f64 * delta
}

/// Western edge longitude of `column`.
pub fn compute_column_longitude(column: i32, delta: f64, origin: f64) -> f64 {
    origin + column as f64 * delta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_at_grid_edges() {
        assert_eq!(compute_row(36.0, -90.0, -90.0).unwrap(), 0);
        assert_eq!(compute_row(36.0, 90.0, -90.0).unwrap(), 4);
        assert_eq!(compute_row(36.0, -54.0, -90.0).unwrap(), 1);
    }

    #[test]
    fn test_column_at_grid_edges() {
        assert_eq!(compute_column(36.0, -180.0, -180.0).unwrap(), 0);
        assert_eq!(compute_column(36.0, 180.0, -180.0).unwrap(), 9);
        assert_eq!(compute_column(36.0, 0.0, -180.0).unwrap(), 5);
    }

    #[test]
    fn test_column_wraps_west_of_origin() {
        // Origin at 0° puts -10° in the column that starts at 324°.
        assert_eq!(compute_column(36.0, -10.0, 0.0).unwrap(), 9);
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(
            compute_row(36.0, 91.0, -90.0),
            Err(TilingError::InvalidLatitude(91.0))
        );
        assert_eq!(
            compute_column(36.0, -181.0, -180.0),
            Err(TilingError::InvalidLongitude(-181.0))
        );
        assert_eq!(
            compute_row(0.0, 0.0, -90.0),
            Err(TilingError::InvalidDelta(0.0))
        );
        assert!(compute_column(f64::NAN, 0.0, -180.0).is_err());
    }

    #[test]
    fn test_edge_helpers_invert_row_and_column() {
        let delta = 36.0 / 8.0;
        let row = compute_row(delta, 10.3, -90.0).unwrap();
        let column = compute_column(delta, 100.7, -180.0).unwrap();
        let lat = compute_row_latitude(row, delta, -90.0);
        let lon = compute_column_longitude(column, delta, -180.0);
        assert!(lat <= 10.3 && 10.3 < lat + delta);
        assert!(lon <= 100.7 && 100.7 < lon + delta);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Every valid latitude maps into the grid and into a row whose
            /// span contains it.
            #[test]
            fn prop_row_contains_latitude(lat in -90.0_f64..=90.0, level in 0u32..17) {
                let delta = 36.0 / (1u64 << level) as f64;
                let row = compute_row(delta, lat, -90.0).unwrap();
                let rows = (180.0 / delta).round() as i32;
                prop_assert!(row >= 0 && row < rows);

                let south = compute_row_latitude(row, delta, -90.0);
                prop_assert!(south <= lat + 1e-9);
                prop_assert!(lat <= south + delta + 1e-9);
            }

            /// Every valid longitude maps into the grid and into a column whose
            /// span contains it.
            #[test]
            fn prop_column_contains_longitude(lon in -180.0_f64..=180.0, level in 0u32..17) {
                let delta = 36.0 / (1u64 << level) as f64;
                let column = compute_column(delta, lon, -180.0).unwrap();
                let columns = (360.0 / delta).round() as i32;
                prop_assert!(column >= 0 && column < columns);

                let west = compute_column_longitude(column, delta, -180.0);
                prop_assert!(west <= lon + 1e-9);
                prop_assert!(lon <= west + delta + 1e-9);
            }
        }
    }
}
