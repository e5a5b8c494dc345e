use glam::DVec3;

/// A model-space bounding sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: DVec3,
    pub radius: f64,
}

impl BoundingSphere {
    pub fn new(center: DVec3, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Sphere centered on the points' average, large enough to hold every point.
    ///
    /// Returns a zero-radius sphere at the origin for an empty slice.
    pub fn from_points(points: &[DVec3]) -> Self {
        if points.is_empty() {
            return Self::new(DVec3::ZERO, 0.0);
        }

        let center = points.iter().copied().sum::<DVec3>() / points.len() as f64;
        let radius = points
            .iter()
            .map(|p| p.distance(center))
            .fold(0.0_f64, f64::max);

        Self::new(center, radius)
    }

    pub fn contains_point(&self, point: DVec3) -> bool {
        point.distance(self.center) <= self.radius
    }
}
