use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tiny_skia::{Color, Paint, Rect, Transform};

use crate::geo::{LatLon, Sector};
use crate::render::{RenderError, TileDrawContext};
use crate::renderable::{StateToken, SurfaceRenderable};
use crate::view::ViewState;

use super::{next_shape_id, DEFAULT_SHAPE_COLOR};

/// A filled geographic rectangle, optionally split into several sectors.
///
/// A quad that crosses the antimeridian is expressed as two sectors, one on
/// each side.
pub struct SurfaceQuad {
    id: u64,
    revision: AtomicU64,
    sectors: RwLock<Vec<Sector>>,
    color: RwLock<Color>,
}

impl SurfaceQuad {
    pub fn new(sector: Sector) -> Self {
        Self::spanning(vec![sector])
    }

    pub fn spanning(sectors: Vec<Sector>) -> Self {
        Self {
            id: next_shape_id(),
            revision: AtomicU64::new(0),
            sectors: RwLock::new(sectors),
            color: RwLock::new(DEFAULT_SHAPE_COLOR),
        }
    }

    pub fn with_color(self, color: Color) -> Self {
        *self.color.write() = color;
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    pub fn color(&self) -> Color {
        *self.color.read()
    }

    pub fn set_color(&self, color: Color) {
        *self.color.write() = color;
        self.touch();
    }

    pub fn set_sectors(&self, sectors: Vec<Sector>) {
        *self.sectors.write() = sectors;
        self.touch();
    }

    /// Mark the quad as changed so every tile it covers is redrawn.
    pub fn touch(&self) {
        self.revision.fetch_add(1, Ordering::AcqRel);
    }
}

impl SurfaceRenderable for SurfaceQuad {
    fn sectors(&self, _view: &ViewState) -> Vec<Sector> {
        self.sectors.read().clone()
    }

    fn state_key(&self, _view: &ViewState) -> StateToken {
        StateToken::new(self.id, self.revision())
    }

    fn render_into(&self, dc: &mut TileDrawContext<'_>) -> Result<(), RenderError> {
        let mut paint = Paint::default();
        paint.set_color(self.color());
        paint.anti_alias = false;

        let tile_sector = dc.sector();
        let sectors = self.sectors.read().clone();
        for sector in sectors {
            let Some(clipped) = sector.intersection(&tile_sector) else {
                continue;
            };
            let (left, top) = dc.project(LatLon::from_degrees(clipped.max_lat, clipped.min_lon));
            let (right, bottom) =
                dc.project(LatLon::from_degrees(clipped.min_lat, clipped.max_lon));
            // Degenerate where the quad only touches the tile edge.
            if right <= left || bottom <= top {
                continue;
            }
            let Some(rect) = Rect::from_ltrb(left, top, right, bottom) else {
                continue;
            };
            dc.pixmap_mut()
                .fill_rect(rect, &paint, Transform::identity(), None);
        }
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
    fn test_ids_are_unique_and_revision_bumps() {
        let a = SurfaceQuad::new(Sector::from_degrees(0.0, 1.0, 0.0, 1.0));
        let b = SurfaceQuad::new(Sector::from_degrees(0.0, 1.0, 0.0, 1.0));
        assert_ne!(a.id(), b.id());

        let v = view();
        let before = a.state_key(&v);
        a.set_color(Color::BLACK);
        assert_ne!(a.state_key(&v), before);
        assert_eq!(a.revision(), 1);
    }

    #[test]
    fn test_renders_only_covered_pixels() {
        let v = view();
        let mut pixmap = Pixmap::new(64, 64).unwrap();
        let tile_sector = Sector::from_degrees(0.0, 36.0, 0.0, 36.0);
        // Western half of the tile.
        let quad = SurfaceQuad::new(Sector::from_degrees(-10.0, 50.0, -10.0, 18.0))
            .with_color(Color::from_rgba8(255, 0, 0, 255));

        let mut dc = TileDrawContext::new(
            &v,
            TileKey::new(0, 2, 5, CacheNamespace(1)),
            tile_sector,
            &mut pixmap,
        );
        quad.render_into(&mut dc).unwrap();

        let west = pixmap.pixel(10, 32).unwrap();
        let east = pixmap.pixel(50, 32).unwrap();
        assert_eq!((west.red(), west.alpha()), (255, 255));
        assert_eq!(east.alpha(), 0);
    }

    #[test]
    fn test_disjoint_sector_draws_nothing() {
        let v = view();
        let mut pixmap = Pixmap::new(16, 16).unwrap();
        let quad = SurfaceQuad::new(Sector::from_degrees(50.0, 60.0, 50.0, 60.0));
        let mut dc = TileDrawContext::new(
            &v,
            TileKey::new(0, 2, 5, CacheNamespace(1)),
            Sector::from_degrees(0.0, 36.0, 0.0, 36.0),
            &mut pixmap,
        );
        quad.render_into(&mut dc).unwrap();
        assert!(pixmap.pixels().iter().all(|p| p.alpha() == 0));
    }
}
