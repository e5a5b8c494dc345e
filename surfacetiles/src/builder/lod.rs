//! Level-of-detail selection.
//!
//! A tile is refined while one of its texels, in meters, is larger than a
//! fraction of the eye distance. The fraction is `10^-split_scale`, scaled by
//! how much narrower the field of view is than 45°. Tiles near the poles use a
//! slightly smaller split scale because their longitude span shrinks on the
//! ground.

use crate::geo::{Globe, Sector};
use crate::tiling::{Level, LevelSet};
use crate::view::ViewState;

/// Default split scale: tiles refine until a texel is 10^-2.9 of the eye distance.
pub const DEFAULT_SPLIT_SCALE: f64 = 2.9;

/// Tiles with `min_lat >= POLAR_LATITUDE` or `max_lat <= -POLAR_LATITUDE`
/// use a damped split scale.
pub const POLAR_LATITUDE: f64 = 75.0;

/// Multiplier applied to the split scale for polar tiles.
pub const POLAR_SPLIT_DAMPING: f64 = 0.85;

/// Field of view at which the field of view scale is 1.
const REFERENCE_FIELD_OF_VIEW_DEGREES: f64 = 45.0;

/// Decides whether a tile is detailed enough to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelOfDetailPolicy {
    split_scale: f64,
}

impl LevelOfDetailPolicy {
    pub fn new(split_scale: f64) -> Self {
        Self { split_scale }
    }

    pub fn split_scale(&self) -> f64 {
        self.split_scale
    }

    pub fn set_split_scale(&mut self, split_scale: f64) {
        self.split_scale = split_scale;
    }

    /// `tan(fov/2) / tan(22.5°)` clamped to `[0, 1]`.
    pub fn field_of_view_scale(field_of_view_degrees: f64) -> f64 {
        let half = (0.5 * field_of_view_degrees).to_radians().tan();
        let reference = (0.5 * REFERENCE_FIELD_OF_VIEW_DEGREES).to_radians().tan();
        (half / reference).clamp(0.0, 1.0)
    }

    /// Split scale in effect for `sector`.
    pub fn effective_split_scale(&self, sector: &Sector) -> f64 {
        if sector.min_lat >= POLAR_LATITUDE || sector.max_lat <= -POLAR_LATITUDE {
            self.split_scale * POLAR_SPLIT_DAMPING
        } else {
            self.split_scale
        }
    }

    /// Size of one texel of `level` in meters on `globe`.
    pub fn texel_size_meters(globe: &Globe, level: &Level) -> f64 {
        globe.radius() * level.texel_size()
    }

    /// Whether a tile covering `sector` at `level` is too coarse for the view.
    pub fn needs_refinement(&self, view: &ViewState, sector: &Sector, level: &Level) -> bool {
        let texel_size = Self::texel_size_meters(&view.globe, level);

        let detail_scale = 10f64.powf(-self.effective_split_scale(sector));
        let fov_scale = Self::field_of_view_scale(view.field_of_view_degrees);

        let eye_distance = sector.distance_to(&view.globe, view.eye_point);
        texel_size > eye_distance * detail_scale * fov_scale
    }

    /// Whether a tile should be drawn as-is rather than refined.
    ///
    /// Tiles at the final level always qualify.
    pub fn meets_render_criteria(
        &self,
        view: &ViewState,
        level_set: &LevelSet,
        level_number: u32,
        sector: &Sector,
    ) -> bool {
        if level_set.is_final_level(level_number) {
            return true;
        }
        match level_set.level(level_number) {
            Some(level) => !self.needs_refinement(view, sector, level),
            None => true,
        }
    }
}

impl Default for LevelOfDetailPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_SPLIT_SCALE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LatLon;
    use crate::tiling::{LevelSetParams, TileDimension};
    use crate::view::Viewport;

    fn level_set() -> LevelSet {
        LevelSet::new(&LevelSetParams::default(), TileDimension::square(512)).unwrap()
    }

    fn view_above(location: LatLon, altitude: f64, fov: f64) -> ViewState {
        let globe = Globe::spherical(6_378_137.0);
        let mut view =
            ViewState::looking_down(globe, location, altitude, 60.0, Viewport::new(512, 512))
                .unwrap();
        view.field_of_view_degrees = fov;
        view
    }

    #[test]
    fn test_field_of_view_scale() {
        assert!((LevelOfDetailPolicy::field_of_view_scale(45.0) - 1.0).abs() < 1e-12);
        assert_eq!(LevelOfDetailPolicy::field_of_view_scale(90.0), 1.0);
        assert!(LevelOfDetailPolicy::field_of_view_scale(10.0) < 0.25);
        assert_eq!(LevelOfDetailPolicy::field_of_view_scale(0.0), 0.0);
    }

    #[test]
    fn test_polar_damping() {
        let policy = LevelOfDetailPolicy::default();
        let north = Sector::from_degrees(75.0, 90.0, 0.0, 10.0);
        let south = Sector::from_degrees(-90.0, -75.0, 0.0, 10.0);
        let mid = Sector::from_degrees(0.0, 10.0, 0.0, 10.0);
        assert!((policy.effective_split_scale(&north) - 2.9 * 0.85).abs() < 1e-12);
        assert!((policy.effective_split_scale(&south) - 2.9 * 0.85).abs() < 1e-12);
        assert_eq!(policy.effective_split_scale(&mid), 2.9);
    }

    #[test]
    fn test_level_five_splits_and_level_six_does_not() {
        // 120 km above (11°, 101°) with a 45° field of view: level 5 texels are
        // about 245 m against a ~190 km threshold distance, level 6 texels about
        // 122 m against ~97 km.
        let policy = LevelOfDetailPolicy::default();
        let levels = level_set();
        let view = view_above(LatLon::from_degrees(11.0, 101.0), 120_000.0, 45.0);

        let level5 = levels.level(5).unwrap();
        let tile5 = levels.tile_sector(5, 89, 249).unwrap();
        assert!(tile5.contains_location(LatLon::from_degrees(10.5, 100.5)));
        assert!(policy.needs_refinement(&view, &tile5, level5));

        let level6 = levels.level(6).unwrap();
        let tile6 = levels.tile_sector(6, 179, 499).unwrap();
        assert!(!policy.needs_refinement(&view, &tile6, level6));
    }

    #[test]
    fn test_final_level_always_meets_criteria() {
        let policy = LevelOfDetailPolicy::default();
        let levels = level_set();
        let view = view_above(LatLon::from_degrees(0.0, 0.0), 1.0, 45.0);
        let last = levels.num_levels() - 1;
        let sector = levels.tile_sector(last, 0, 0).unwrap();
        assert!(policy.meets_render_criteria(&view, &levels, last, &sector));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Moving the eye closer never turns a split into a non-split.
            #[test]
            fn prop_refinement_monotonic_in_distance(
                lat in -70.0_f64..70.0,
                lon in -170.0_f64..170.0,
                near in 1_000.0_f64..1_000_000.0,
                factor in 1.0_f64..20.0,
                level_number in 0u32..16,
            ) {
                let policy = LevelOfDetailPolicy::default();
                let levels = level_set();
                let level = levels.level(level_number).unwrap();
                let delta = level.tile_delta();
                let sector = Sector::from_degrees(lat, lat + delta.lat.min(20.0), lon, lon + delta.lon.min(10.0));

                let close = view_above(sector.centroid(), near, 45.0);
                let far = view_above(sector.centroid(), near * factor, 45.0);

                if policy.needs_refinement(&far, &sector, level) {
                    prop_assert!(policy.needs_refinement(&close, &sector, level));
                }
            }

            /// A larger split scale never refines less.
            #[test]
            fn prop_refinement_monotonic_in_split_scale(
                altitude in 1_000.0_f64..5_000_000.0,
                low in 1.0_f64..4.0,
                bump in 0.0_f64..2.0,
                level_number in 0u32..16,
            ) {
                let levels = level_set();
                let level = levels.level(level_number).unwrap();
                let sector = levels.tile_range(&Sector::from_degrees(10.0, 10.0, 100.0, 100.0), level_number)
                    .map(|r| levels.tile_sector(level_number, r.first_row, r.first_column).unwrap())
                    .unwrap();
                let view = view_above(LatLon::from_degrees(10.0, 100.0), altitude, 45.0);

                let coarse = LevelOfDetailPolicy::new(low);
                let fine = LevelOfDetailPolicy::new(low + bump);
                if coarse.needs_refinement(&view, &sector, level) {
                    prop_assert!(fine.needs_refinement(&view, &sector, level));
                }
            }
        }
    }
}
