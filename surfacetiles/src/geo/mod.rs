//! Geographic primitives used by the tile builder.
//!
//! Everything here is plain value geometry with no rendering state:
//!
//! - [`LatLon`] and [`Sector`] describe locations and axis-aligned
//!   latitude/longitude rectangles in degrees
//! - [`Globe`] maps geographic locations to model (Cartesian) coordinates
//! - [`BoundingSphere`] is the model-space extent of a sector
//! - [`Frustum`] culls extents against the view or pick volumes

mod extent;
mod frustum;
mod globe;
mod sector;

pub use extent::BoundingSphere;
pub use frustum::{Frustum, Plane};
pub use globe::Globe;
pub use sector::Sector;

use std::fmt;

/// A geographic location in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LatLon {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lon: f64,
}

impl LatLon {
    /// Create a location from latitude and longitude in degrees.
    pub const fn from_degrees(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Latitude in radians.
    pub fn lat_radians(&self) -> f64 {
        self.lat.to_radians()
    }

    /// Longitude in radians.
    pub fn lon_radians(&self) -> f64 {
        self.lon.to_radians()
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}°, {:.6}°)", self.lat, self.lon)
    }
}

/// Returns the angle halfway between two angles in degrees.
#[inline]
pub(crate) fn mid_angle(a: f64, b: f64) -> f64 {
    0.5 * (a + b)
}
