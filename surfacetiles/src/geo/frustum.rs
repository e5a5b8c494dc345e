//! View frustum culling.

use glam::{DMat4, DVec3, DVec4};

use super::BoundingSphere;

/// A plane `n·p + d = 0` with a unit normal pointing into the kept half-space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: DVec3,
    pub distance: f64,
}

impl Plane {
    /// Build a plane from homogeneous coefficients, normalizing them.
    ///
    /// Returns `None` for a degenerate (zero-length) normal.
    pub fn from_coefficients(v: DVec4) -> Option<Self> {
        let normal = v.truncate();
        let length = normal.length();
        if length <= f64::EPSILON {
            return None;
        }
        Some(Self {
            normal: normal / length,
            distance: v.w / length,
        })
    }

    /// Signed distance from the plane; positive on the kept side.
    pub fn signed_distance(&self, point: DVec3) -> f64 {
        self.normal.dot(point) + self.distance
    }
}

/// Six planes bounding a view volume, ordered left, right, bottom, top, near, far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    planes: [Plane; 6],
}

impl Frustum {
    pub fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Extract the frustum planes from a combined projection × view matrix.
    ///
    /// Expects a right-handed projection with clip depth in `[0, 1]`, as
    /// produced by [`DMat4::perspective_rh`].
    pub fn from_view_projection(m: &DMat4) -> Option<Self> {
        let r0 = m.row(0);
        let r1 = m.row(1);
        let r2 = m.row(2);
        let r3 = m.row(3);

        Some(Self::new([
            Plane::from_coefficients(r3 + r0)?,
            Plane::from_coefficients(r3 - r0)?,
            Plane::from_coefficients(r3 + r1)?,
            Plane::from_coefficients(r3 - r1)?,
            Plane::from_coefficients(r2)?,
            Plane::from_coefficients(r3 - r2)?,
        ]))
    }

    /// Perspective frustum for a camera at `eye` looking at `target`.
    #[allow(clippy::too_many_arguments)]
    pub fn perspective(
        eye: DVec3,
        target: DVec3,
        up: DVec3,
        field_of_view_degrees: f64,
        aspect_ratio: f64,
        near: f64,
        far: f64,
    ) -> Option<Self> {
        let view = DMat4::look_at_rh(eye, target, up);
        let projection =
            DMat4::perspective_rh(field_of_view_degrees.to_radians(), aspect_ratio, near, far);
        Self::from_view_projection(&(projection * view))
    }

    pub fn planes(&self) -> &[Plane; 6] {
        &self.planes
    }

    pub fn contains_point(&self, point: DVec3) -> bool {
        self.planes.iter().all(|p| p.signed_distance(point) >= 0.0)
    }

    /// Conservative sphere test: never rejects a sphere that overlaps the volume.
    pub fn intersects(&self, sphere: &BoundingSphere) -> bool {
        self.planes
            .iter()
            .all(|p| p.signed_distance(sphere.center) >= -sphere.radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn looking_down_negative_z() -> Frustum {
        Frustum::perspective(
            DVec3::ZERO,
            DVec3::new(0.0, 0.0, -1.0),
            DVec3::Y,
            90.0,
            1.0,
            1.0,
            100.0,
        )
        .unwrap()
    }

    #[test]
    fn test_point_in_front_is_inside() {
        let frustum = looking_down_negative_z();
        assert!(frustum.contains_point(DVec3::new(0.0, 0.0, -10.0)));
        assert!(!frustum.contains_point(DVec3::new(0.0, 0.0, 10.0)));
        assert!(!frustum.contains_point(DVec3::new(0.0, 0.0, -200.0)));
    }

    #[test]
    fn test_side_planes() {
        let frustum = looking_down_negative_z();
        // 90° vertical FOV with aspect 1 gives a 45° half-angle on each side.
        assert!(frustum.contains_point(DVec3::new(9.0, 0.0, -10.0)));
        assert!(!frustum.contains_point(DVec3::new(11.0, 0.0, -10.0)));
        assert!(!frustum.contains_point(DVec3::new(0.0, -11.0, -10.0)));
    }

    #[test]
    fn test_sphere_straddling_plane_intersects() {
        let frustum = looking_down_negative_z();
        let outside = BoundingSphere::new(DVec3::new(15.0, 0.0, -10.0), 3.0);
        let straddling = BoundingSphere::new(DVec3::new(12.0, 0.0, -10.0), 3.0);
        assert!(!frustum.intersects(&outside));
        assert!(frustum.intersects(&straddling));
    }
}
