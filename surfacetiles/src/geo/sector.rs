//! Axis-aligned latitude/longitude rectangles.

use std::fmt;

use super::{mid_angle, BoundingSphere, Globe, LatLon};

/// Number of sample points per side used when bounding a sector.
const EXTENT_SAMPLES_PER_SIDE: usize = 5;

/// An axis-aligned geographic rectangle in degrees.
///
/// Sectors are assumed to be normalized to ±90° latitude and ±180° longitude.
/// A shape that crosses the antimeridian is described by two sectors, one on
/// each side, rather than by a single sector whose minimum longitude exceeds
/// its maximum.
///
/// All predicates use closed intervals: two sectors that share only an edge
/// intersect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sector {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Sector {
    /// The whole globe.
    pub const FULL_SPHERE: Sector = Sector {
        min_lat: -90.0,
        max_lat: 90.0,
        min_lon: -180.0,
        max_lon: 180.0,
    };

    /// Create a sector from its bounds in degrees.
    pub const fn from_degrees(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    /// Smallest sector containing every location, or `None` for an empty slice.
    pub fn bounding(locations: &[LatLon]) -> Option<Self> {
        let first = locations.first()?;
        let mut sector = Sector::from_degrees(first.lat, first.lat, first.lon, first.lon);
        for location in &locations[1..] {
            sector.min_lat = sector.min_lat.min(location.lat);
            sector.max_lat = sector.max_lat.max(location.lat);
            sector.min_lon = sector.min_lon.min(location.lon);
            sector.max_lon = sector.max_lon.max(location.lon);
        }
        Some(sector)
    }

    pub fn delta_lat(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn delta_lon(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Whether the bounds lie within ±90°/±180° and are ordered.
    pub fn is_normalized(&self) -> bool {
        (-90.0..=90.0).contains(&self.min_lat)
            && (-90.0..=90.0).contains(&self.max_lat)
            && (-180.0..=180.0).contains(&self.min_lon)
            && (-180.0..=180.0).contains(&self.max_lon)
            && self.min_lat <= self.max_lat
            && self.min_lon <= self.max_lon
    }

    /// The geographic center of the sector.
    pub fn centroid(&self) -> LatLon {
        LatLon::from_degrees(
            mid_angle(self.min_lat, self.max_lat),
            mid_angle(self.min_lon, self.max_lon),
        )
    }

    /// Corner locations in SW, SE, NE, NW order.
    pub fn corners(&self) -> [LatLon; 4] {
        [
            LatLon::from_degrees(self.min_lat, self.min_lon),
            LatLon::from_degrees(self.min_lat, self.max_lon),
            LatLon::from_degrees(self.max_lat, self.max_lon),
            LatLon::from_degrees(self.max_lat, self.min_lon),
        ]
    }

    /// Whether a location lies inside or on the boundary of this sector.
    pub fn contains_location(&self, location: LatLon) -> bool {
        location.lat >= self.min_lat
            && location.lat <= self.max_lat
            && location.lon >= self.min_lon
            && location.lon <= self.max_lon
    }

    /// Whether `that` lies entirely within this sector.
    pub fn contains(&self, that: &Sector) -> bool {
        that.min_lon >= self.min_lon
            && that.max_lon <= self.max_lon
            && that.min_lat >= self.min_lat
            && that.max_lat <= self.max_lat
    }

    /// Whether the two sectors share at least one point.
    pub fn intersects(&self, that: &Sector) -> bool {
        !(that.max_lon < self.min_lon
            || that.min_lon > self.max_lon
            || that.max_lat < self.min_lat
            || that.min_lat > self.max_lat)
    }

    /// The overlapping region, or `None` when the sectors are disjoint.
    pub fn intersection(&self, that: &Sector) -> Option<Sector> {
        if !self.intersects(that) {
            return None;
        }
        Some(Sector::from_degrees(
            self.min_lat.max(that.min_lat),
            self.max_lat.min(that.max_lat),
            self.min_lon.max(that.min_lon),
            self.max_lon.min(that.max_lon),
        ))
    }

    /// Smallest sector containing both sectors.
    pub fn union(&self, that: &Sector) -> Sector {
        Sector::from_degrees(
            self.min_lat.min(that.min_lat),
            self.max_lat.max(that.max_lat),
            self.min_lon.min(that.min_lon),
            self.max_lon.max(that.max_lon),
        )
    }

    /// Minimum distance in meters from `point` to the sector's corners and centroid
    /// on the globe surface.
    pub fn distance_to(&self, globe: &Globe, point: glam::DVec3) -> f64 {
        let centroid = self.centroid();
        self.corners()
            .iter()
            .chain(std::iter::once(&centroid))
            .map(|location| globe.compute_point(*location, 0.0).distance(point))
            .fold(f64::INFINITY, f64::min)
    }

    /// Model-space bounding sphere of the sector's surface at zero elevation.
    ///
    /// The sector is sampled on a regular grid and the radius is padded by the
    /// sagitta of the sampling step, so the sphere still encloses the globe's
    /// curvature between samples.
    pub fn compute_bounding_sphere(&self, globe: &Globe) -> BoundingSphere {
        let n = EXTENT_SAMPLES_PER_SIDE;
        let mut points = Vec::with_capacity(n * n);
        for i in 0..n {
            let lat = self.min_lat + self.delta_lat() * i as f64 / (n - 1) as f64;
            for j in 0..n {
                let lon = self.min_lon + self.delta_lon() * j as f64 / (n - 1) as f64;
                points.push(globe.compute_point(LatLon::from_degrees(lat, lon), 0.0));
            }
        }

        let step = self.delta_lat().max(self.delta_lon()) / (n - 1) as f64;
        let sagitta = globe.radius() * (1.0 - (0.5 * step).to_radians().cos());

        let sphere = BoundingSphere::from_points(&points);
        BoundingSphere::new(sphere.center, sphere.radius + sagitta)
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.6}°, {:.6}°] × [{:.6}°, {:.6}°]",
            self.min_lat, self.max_lat, self.min_lon, self.max_lon
        )
    }
}
