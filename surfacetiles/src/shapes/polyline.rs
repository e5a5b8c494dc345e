use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tiny_skia::{Color, LineCap, LineJoin, Paint, PathBuilder, Stroke, Transform};

use crate::geo::{LatLon, Sector};
use crate::render::{RenderError, TileDrawContext};
use crate::renderable::{StateToken, SurfaceRenderable};
use crate::view::ViewState;

use super::{next_shape_id, DEFAULT_SHAPE_COLOR};

/// Default stroke width in tile pixels.
pub const DEFAULT_LINE_WIDTH: f32 = 2.0;

/// A line drawn along a sequence of locations.
///
/// Segments are straight in latitude/longitude; the line is not split at the
/// antimeridian.
pub struct SurfacePolyline {
    id: u64,
    revision: AtomicU64,
    locations: RwLock<Vec<LatLon>>,
    color: RwLock<Color>,
    width: RwLock<f32>,
}

impl SurfacePolyline {
    pub fn new(locations: Vec<LatLon>) -> Self {
        Self {
            id: next_shape_id(),
            revision: AtomicU64::new(0),
            locations: RwLock::new(locations),
            color: RwLock::new(DEFAULT_SHAPE_COLOR),
            width: RwLock::new(DEFAULT_LINE_WIDTH),
        }
    }

    pub fn with_color(self, color: Color) -> Self {
        *self.color.write() = color;
        self
    }

    pub fn with_width(self, width: f32) -> Self {
        *self.width.write() = width;
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    pub fn locations(&self) -> Vec<LatLon> {
        self.locations.read().clone()
    }

    pub fn set_locations(&self, locations: Vec<LatLon>) {
        *self.locations.write() = locations;
        self.touch();
    }

    pub fn set_color(&self, color: Color) {
        *self.color.write() = color;
        self.touch();
    }

    pub fn set_width(&self, width: f32) {
        *self.width.write() = width;
        self.touch();
    }

    pub fn touch(&self) {
        self.revision.fetch_add(1, Ordering::AcqRel);
    }
}

impl SurfaceRenderable for SurfacePolyline {
    fn sectors(&self, _view: &ViewState) -> Vec<Sector> {
        Sector::bounding(&self.locations.read())
            .into_iter()
            .collect()
    }

    fn state_key(&self, _view: &ViewState) -> StateToken {
        StateToken::new(self.id, self.revision())
    }

    fn render_into(&self, dc: &mut TileDrawContext<'_>) -> Result<(), RenderError> {
        let locations = self.locations.read().clone();
        if locations.len() < 2 {
            return Ok(());
        }

        let mut builder = PathBuilder::new();
        for (i, location) in locations.iter().enumerate() {
            let (x, y) = dc.project(*location);
            if i == 0 {
                builder.move_to(x, y);
            } else {
                builder.line_to(x, y);
            }
        }
        // Nothing to stroke when every location projects to the same point.
        let Some(path) = builder.finish() else {
            return Ok(());
        };

        let mut paint = Paint::default();
        paint.set_color(*self.color.read());
        paint.anti_alias = true;
        let stroke = Stroke {
            width: *self.width.read(),
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };

        dc.pixmap_mut()
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Globe;
    use crate::tiling::{CacheNamespace, TileKey};
    use crate::view::Viewport;
    use tiny_skia::Pixmap;

    fn view() -> ViewState {
        ViewState::looking_down(
            Globe::WGS84,
            LatLon::from_degrees(0.0, 0.0),
            1_000_000.0,
            45.0,
            Viewport::new(64, 64),
        )
        .unwrap()
    }

    #[test]
    fn test_sectors_bound_locations() {
        let line = SurfacePolyline::new(vec![
            LatLon::from_degrees(10.0, 20.0),
            LatLon::from_degrees(-5.0, 30.0),
            LatLon::from_degrees(2.0, 25.0),
        ]);
        assert_eq!(
            line.sectors(&view()),
            vec![Sector::from_degrees(-5.0, 10.0, 20.0, 30.0)]
        );
        assert!(SurfacePolyline::new(Vec::new()).sectors(&view()).is_empty());
    }

    #[test]
    fn test_strokes_across_tile() {
        let v = view();
        let mut pixmap = Pixmap::new(64, 64).unwrap();
        let line = SurfacePolyline::new(vec![
            LatLon::from_degrees(18.0, -10.0),
            LatLon::from_degrees(18.0, 50.0),
        ])
        .with_width(4.0);

        let mut dc = TileDrawContext::new(
            &v,
            TileKey::new(0, 2, 5, CacheNamespace(1)),
            Sector::from_degrees(0.0, 36.0, 0.0, 36.0),
            &mut pixmap,
        );
        line.render_into(&mut dc).unwrap();

        assert!(pixmap.pixel(32, 32).unwrap().alpha() > 0);
        assert_eq!(pixmap.pixel(32, 5).unwrap().alpha(), 0);
    }

    #[test]
    fn test_single_point_draws_nothing() {
        let v = view();
        let mut pixmap = Pixmap::new(16, 16).unwrap();
        let line = SurfacePolyline::new(vec![LatLon::from_degrees(1.0, 1.0)]);
        let mut dc = TileDrawContext::new(
            &v,
            TileKey::new(0, 2, 5, CacheNamespace(1)),
            Sector::from_degrees(0.0, 36.0, 0.0, 36.0),
            &mut pixmap,
        );
        line.render_into(&mut dc).unwrap();
        assert!(pixmap.pixels().iter().all(|p| p.alpha() == 0));
    }
}
