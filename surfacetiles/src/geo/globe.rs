//! Globe model: geographic to Cartesian conversion.

use glam::DVec3;

use super::LatLon;

/// An ellipsoidal globe centered at the origin.
///
/// Model coordinates follow the usual virtual-globe convention: +Y through the
/// north pole, +Z through (0°, 0°) and +X through (0°, 90°E).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Globe {
    equatorial_radius: f64,
    polar_radius: f64,
    eccentricity_squared: f64,
}

impl Globe {
    /// The WGS84 ellipsoid.
    pub const WGS84: Globe = Globe {
        equatorial_radius: 6_378_137.0,
        polar_radius: 6_356_752.314_245,
        eccentricity_squared: 0.006_694_379_990_14,
    };

    /// Create an ellipsoid from its equatorial and polar radii in meters.
    pub fn ellipsoid(equatorial_radius: f64, polar_radius: f64) -> Self {
        let a2 = equatorial_radius * equatorial_radius;
        let b2 = polar_radius * polar_radius;
        Self {
            equatorial_radius,
            polar_radius,
            eccentricity_squared: (a2 - b2) / a2,
        }
    }

    /// Create a perfect sphere with the given radius in meters.
    pub fn spherical(radius: f64) -> Self {
        Self {
            equatorial_radius: radius,
            polar_radius: radius,
            eccentricity_squared: 0.0,
        }
    }

    /// The equatorial radius in meters, used to convert angular sizes to meters.
    pub fn radius(&self) -> f64 {
        self.equatorial_radius
    }

    pub fn equatorial_radius(&self) -> f64 {
        self.equatorial_radius
    }

    pub fn polar_radius(&self) -> f64 {
        self.polar_radius
    }

    /// Cartesian model point for a location at `elevation` meters above the ellipsoid.
    pub fn compute_point(&self, location: LatLon, elevation: f64) -> DVec3 {
        let (sin_lat, cos_lat) = location.lat_radians().sin_cos();
        let (sin_lon, cos_lon) = location.lon_radians().sin_cos();

        let rpm = self.equatorial_radius
            / (1.0 - self.eccentricity_squared * sin_lat * sin_lat).sqrt();

        DVec3::new(
            (rpm + elevation) * cos_lat * sin_lon,
            (rpm * (1.0 - self.eccentricity_squared) + elevation) * sin_lat,
            (rpm + elevation) * cos_lat * cos_lon,
        )
    }

    /// Outward surface normal at a location.
    pub fn surface_normal(&self, location: LatLon) -> DVec3 {
        let (sin_lat, cos_lat) = location.lat_radians().sin_cos();
        let (sin_lon, cos_lon) = location.lon_radians().sin_cos();
        DVec3::new(cos_lat * sin_lon, sin_lat, cos_lat * cos_lon)
    }
}

impl Default for Globe {
    fn default() -> Self {
        Self::WGS84
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equator_prime_meridian_on_z_axis() {
        let globe = Globe::WGS84;
        let p = globe.compute_point(LatLon::from_degrees(0.0, 0.0), 0.0);
        assert!((p.z - 6_378_137.0).abs() < 1e-6);
        assert!(p.x.abs() < 1e-6);
        assert!(p.y.abs() < 1e-6);
    }

    #[test]
    fn test_north_pole_on_polar_axis() {
        let globe = Globe::WGS84;
        let p = globe.compute_point(LatLon::from_degrees(90.0, 0.0), 0.0);
        assert!((p.y - globe.polar_radius()).abs() < 1e-3);
        assert!(p.x.abs() < 1e-6);
    }

    #[test]
    fn test_spherical_elevation_is_radial() {
        let globe = Globe::spherical(1_000.0);
        let p = globe.compute_point(LatLon::from_degrees(30.0, 45.0), 10.0);
        assert!((p.length() - 1_010.0).abs() < 1e-9);
    }

    #[test]
    fn test_ellipsoid_matches_wgs84_constants() {
        let globe = Globe::ellipsoid(6_378_137.0, 6_356_752.314_245);
        assert!((globe.eccentricity_squared - Globe::WGS84.eccentricity_squared).abs() < 1e-9);
    }
}
