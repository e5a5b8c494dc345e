//! Quadtree levels and level sets.

use crate::geo::{LatLon, Sector};

use super::{
    compute_column, compute_column_longitude, compute_row, compute_row_latitude, TileDimension,
    TilingError,
};

/// Default level-zero tile size in degrees.
pub const DEFAULT_LEVEL_ZERO_DELTA: f64 = 36.0;

/// Default number of levels in a level set.
pub const DEFAULT_NUM_LEVELS: u32 = 17;

/// Default grid origin: the south-west corner of the globe.
pub const DEFAULT_TILE_ORIGIN: LatLon = LatLon::from_degrees(-90.0, -180.0);

/// Parameters shared by every level set created from a registry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelSetParams {
    pub level_zero_delta: LatLon,
    pub num_levels: u32,
    pub tile_origin: LatLon,
    pub sector: Sector,
}

impl Default for LevelSetParams {
    fn default() -> Self {
        Self {
            level_zero_delta: LatLon::from_degrees(
                DEFAULT_LEVEL_ZERO_DELTA,
                DEFAULT_LEVEL_ZERO_DELTA,
            ),
            num_levels: DEFAULT_NUM_LEVELS,
            tile_origin: DEFAULT_TILE_ORIGIN,
            sector: Sector::FULL_SPHERE,
        }
    }
}

impl LevelSetParams {
    /// Check that the parameters describe a usable quadtree.
    pub fn validate(&self) -> Result<(), TilingError> {
        for delta in [self.level_zero_delta.lat, self.level_zero_delta.lon] {
            if !(delta.is_finite() && delta > 0.0) {
                return Err(TilingError::InvalidDelta(delta));
            }
        }
        if self.num_levels == 0 {
            return Err(TilingError::NoLevels);
        }

        // Every tile edge must land on ±90° and ±180° so that no tile crosses
        // a pole or the antimeridian.
        let axes = [
            (self.tile_origin.lat, self.level_zero_delta.lat, 90.0, 180.0),
            (self.tile_origin.lon, self.level_zero_delta.lon, 180.0, 360.0),
        ];
        for (origin, delta, edge, span) in axes {
            if !is_multiple(origin + edge, delta) || !is_multiple(span, delta) {
                return Err(TilingError::MisalignedGrid { origin, delta });
            }
        }
        Ok(())
    }
}

fn is_multiple(value: f64, delta: f64) -> bool {
    let steps = value / delta;
    (steps - steps.round()).abs() < 1e-9
}

/// One level of the quadtree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Level {
    level_number: u32,
    tile_delta: LatLon,
    tile_width: u32,
    tile_height: u32,
    texel_size: f64,
}

impl Level {
    fn new(level_number: u32, tile_delta: LatLon, dimension: TileDimension) -> Self {
        Self {
            level_number,
            tile_delta,
            tile_width: dimension.width,
            tile_height: dimension.height,
            texel_size: tile_delta.lat_radians() / dimension.height as f64,
        }
    }

    pub fn level_number(&self) -> u32 {
        self.level_number
    }

    /// Tile size in degrees at this level.
    pub fn tile_delta(&self) -> LatLon {
        self.tile_delta
    }

    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    /// Angular size of one texel in radians.
    pub fn texel_size(&self) -> f64 {
        self.texel_size
    }
}

/// Closed range of tile rows and columns at one level.
///
/// A range that crosses the grid's seam has `last_column` past the last
/// grid column. Iteration wraps such columns back into `0..grid_columns`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub first_row: i32,
    pub last_row: i32,
    pub first_column: i32,
    pub last_column: i32,
    pub grid_columns: i32,
}

impl TileRange {
    pub fn len(&self) -> usize {
        let rows = (self.last_row - self.first_row + 1).max(0) as usize;
        let columns = (self.last_column - self.first_column + 1).max(0) as usize;
        rows * columns
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the range continues past the seam into column 0.
    pub fn wraps(&self) -> bool {
        self.last_column >= self.grid_columns
    }

    /// `(row, column)` pairs in row-major order, south to north, west to east.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32)> {
        let (first_column, last_column) = (self.first_column, self.last_column);
        let grid_columns = self.grid_columns.max(1);
        (self.first_row..=self.last_row).flat_map(move |row| {
            (first_column..=last_column).map(move |column| (row, column.rem_euclid(grid_columns)))
        })
    }
}

/// The quadtree levels for one tile dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSet {
    levels: Vec<Level>,
    tile_origin: LatLon,
    sector: Sector,
    dimension: TileDimension,
}

impl LevelSet {
    /// Build `params.num_levels` levels, each halving the previous tile delta.
    pub fn new(params: &LevelSetParams, dimension: TileDimension) -> Result<Self, TilingError> {
        params.validate()?;
        if dimension.width == 0 || dimension.height == 0 {
            return Err(TilingError::InvalidTileDimension {
                width: dimension.width,
                height: dimension.height,
            });
        }

        let mut levels = Vec::with_capacity(params.num_levels as usize);
        let mut delta = params.level_zero_delta;
        for level_number in 0..params.num_levels {
            levels.push(Level::new(level_number, delta, dimension));
            delta = LatLon::from_degrees(delta.lat / 2.0, delta.lon / 2.0);
        }

        Ok(Self {
            levels,
            tile_origin: params.tile_origin,
            sector: params.sector,
            dimension,
        })
    }

    pub fn level(&self, level_number: u32) -> Option<&Level> {
        self.levels.get(level_number as usize)
    }

    pub fn first_level(&self) -> &Level {
        &self.levels[0]
    }

    pub fn last_level(&self) -> &Level {
        &self.levels[self.levels.len() - 1]
    }

    pub fn is_final_level(&self, level_number: u32) -> bool {
        level_number as usize + 1 >= self.levels.len()
    }

    pub fn num_levels(&self) -> u32 {
        self.levels.len() as u32
    }

    pub fn tile_origin(&self) -> LatLon {
        self.tile_origin
    }

    pub fn sector(&self) -> Sector {
        self.sector
    }

    pub fn dimension(&self) -> TileDimension {
        self.dimension
    }

    /// Tiles at `level_number` that cover `sector`.
    ///
    /// Columns are counted eastward from the origin, so a sector that
    /// straddles the origin's meridian yields a range that wraps.
    pub fn tile_range(&self, sector: &Sector, level_number: u32) -> Result<TileRange, TilingError> {
        let level = self.checked_level(level_number)?;
        let delta = level.tile_delta();
        let origin = self.tile_origin;

        let first_row = self.below_north_pole(
            compute_row(delta.lat, sector.min_lat, origin.lat)?,
            delta.lat,
        );
        let last_row = self.below_north_pole(
            compute_row(delta.lat, sector.max_lat, origin.lat)?,
            delta.lat,
        );

        let grid_columns = (360.0 / delta.lon).round() as i32;
        let first_column = compute_column(delta.lon, sector.min_lon, origin.lon)?;
        let last_column = if sector.max_lon > sector.min_lon {
            // Rejects an east edge outside ±180°.
            compute_column(delta.lon, sector.max_lon, origin.lon)?;
            let mut west = sector.min_lon - origin.lon;
            if west < 0.0 {
                west += 360.0;
            }
            let east = west + sector.delta_lon();
            let mut column = (east / delta.lon).floor() as i32;
            // The east edge of the grid belongs to the last column.
            if east > 0.0 && east % 360.0 == 0.0 {
                column -= 1;
            }
            column.clamp(first_column, first_column + grid_columns - 1)
        } else {
            first_column
        };

        Ok(TileRange {
            first_row,
            last_row: last_row.max(first_row),
            first_column,
            last_column,
            grid_columns,
        })
    }

    /// Geographic bounds of the tile at `(level_number, row, column)`,
    /// within ±90° and ±180°.
    pub fn tile_sector(
        &self,
        level_number: u32,
        row: i32,
        column: i32,
    ) -> Result<Sector, TilingError> {
        let delta = self.checked_level(level_number)?.tile_delta();
        let min_lat = compute_row_latitude(row, delta.lat, self.tile_origin.lat);
        let mut min_lon = compute_column_longitude(column, delta.lon, self.tile_origin.lon);
        if min_lon >= 180.0 {
            min_lon -= 360.0;
        }
        Ok(Sector::from_degrees(
            min_lat.max(-90.0),
            (min_lat + delta.lat).min(90.0),
            min_lon,
            (min_lon + delta.lon).min(180.0),
        ))
    }

    /// `row`, or the row below it when `row` starts at the north pole.
    fn below_north_pole(&self, row: i32, delta_lat: f64) -> i32 {
        if compute_row_latitude(row, delta_lat, self.tile_origin.lat) >= 90.0 {
            row - 1
        } else {
            row
        }
    }

    fn checked_level(&self, level_number: u32) -> Result<&Level, TilingError> {
        self.level(level_number)
            .ok_or(TilingError::LevelOutOfRange {
                level: level_number,
                num_levels: self.num_levels(),
            })
    }
}
