//! The per-frame view inputs the tile builder reads.

use glam::DVec3;

use crate::geo::{Frustum, Globe, LatLon, Sector};

/// Pixel rectangle of the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    pub fn has_area(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f64 / self.height as f64
        }
    }
}

/// Whether a frame is being drawn or picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullingMode {
    #[default]
    Rendering,
    /// Tiles are culled against the pick frustums and each emitted tile
    /// produces a pick candidate.
    Picking,
}

/// Camera and frame state for one `build_tiles` call.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub globe: Globe,
    pub eye_point: DVec3,
    pub field_of_view_degrees: f64,
    pub viewport: Viewport,
    pub frustum: Frustum,
    pub pick_frustums: Vec<Frustum>,
    /// Visible portion of the globe; `None` when nothing is visible.
    pub visible_sector: Option<Sector>,
    pub mode: CullingMode,
    /// Index of the 2D globe copy being drawn; 0 for a 3D globe.
    pub globe_offset: i32,
}

impl ViewState {
    /// A rendering view of the whole globe.
    pub fn new(
        globe: Globe,
        eye_point: DVec3,
        field_of_view_degrees: f64,
        viewport: Viewport,
        frustum: Frustum,
    ) -> Self {
        Self {
            globe,
            eye_point,
            field_of_view_degrees,
            viewport,
            frustum,
            pick_frustums: Vec::new(),
            visible_sector: Some(Sector::FULL_SPHERE),
            mode: CullingMode::Rendering,
            globe_offset: 0,
        }
    }

    /// A camera `altitude` meters above `target` looking straight down.
    ///
    /// Returns `None` if the frustum cannot be built (e.g. zero altitude).
    pub fn looking_down(
        globe: Globe,
        target: LatLon,
        altitude: f64,
        field_of_view_degrees: f64,
        viewport: Viewport,
    ) -> Option<Self> {
        let frustum = nadir_frustum(&globe, target, altitude, field_of_view_degrees, viewport)?;
        let eye_point = globe.compute_point(target, altitude);
        Some(Self::new(
            globe,
            eye_point,
            field_of_view_degrees,
            viewport,
            frustum,
        ))
    }

    pub fn with_visible_sector(mut self, visible_sector: Option<Sector>) -> Self {
        self.visible_sector = visible_sector;
        self
    }

    /// Switch to picking mode, culling against `pick_frustums`.
    pub fn with_pick_frustums(mut self, pick_frustums: Vec<Frustum>) -> Self {
        self.pick_frustums = pick_frustums;
        self.mode = CullingMode::Picking;
        self
    }

    pub fn with_globe_offset(mut self, globe_offset: i32) -> Self {
        self.globe_offset = globe_offset;
        self
    }

    pub fn is_picking(&self) -> bool {
        self.mode == CullingMode::Picking
    }
}

/// Frustum of a camera `altitude` meters above `target` looking at it.
pub fn nadir_frustum(
    globe: &Globe,
    target: LatLon,
    altitude: f64,
    field_of_view_degrees: f64,
    viewport: Viewport,
) -> Option<Frustum> {
    if altitude.is_nan() || altitude <= 0.0 {
        return None;
    }
    let eye = globe.compute_point(target, altitude);
    let center = globe.compute_point(target, 0.0);

    // Keep north up unless looking along the polar axis.
    let forward = (center - eye).normalize();
    let up = if forward.dot(DVec3::Y).abs() > 0.999 {
        DVec3::Z
    } else {
        DVec3::Y
    };

    let near = (altitude * 1e-3).max(1.0);
    let far = altitude + 2.0 * globe.radius();
    Frustum::perspective(
        eye,
        center,
        up,
        field_of_view_degrees,
        viewport.aspect_ratio(),
        near,
        far,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_area() {
        assert!(Viewport::new(800, 600).has_area());
        assert!(!Viewport::new(0, 600).has_area());
        assert!(!Viewport::new(800, 0).has_area());
    }

    #[test]
    fn test_looking_down_sees_target() {
        let globe = Globe::WGS84;
        let target = LatLon::from_degrees(45.0, 7.0);
        let view =
            ViewState::looking_down(globe, target, 50_000.0, 60.0, Viewport::new(800, 600))
                .unwrap();
        assert!(view.frustum.contains_point(globe.compute_point(target, 0.0)));

        let beside = globe.compute_point(LatLon::from_degrees(45.0, 97.0), 0.0);
        assert!(!view.frustum.contains_point(beside));
    }

    #[test]
    fn test_looking_down_at_pole() {
        let view = ViewState::looking_down(
            Globe::WGS84,
            LatLon::from_degrees(90.0, 0.0),
            1_000_000.0,
            60.0,
            Viewport::new(512, 512),
        );
        assert!(view.is_some());
    }

    #[test]
    fn test_zero_altitude_rejected() {
        assert!(ViewState::looking_down(
            Globe::WGS84,
            LatLon::default(),
            0.0,
            60.0,
            Viewport::new(512, 512)
        )
        .is_none());
    }

    #[test]
    fn test_pick_mode() {
        let view = ViewState::looking_down(
            Globe::WGS84,
            LatLon::default(),
            10_000.0,
            45.0,
            Viewport::new(512, 512),
        )
        .unwrap();
        assert!(!view.is_picking());
        let frustum = view.frustum;
        let view = view.with_pick_frustums(vec![frustum]);
        assert!(view.is_picking());
    }
}
