use tiny_skia::Pixmap;

use crate::geo::{LatLon, Sector};
use crate::tiling::TileKey;
use crate::view::ViewState;

/// Drawing state handed to a renderable while it draws into one tile.
///
/// The tile's sector is mapped orthographically onto the bound pixmap with
/// north at row 0 and west at column 0. Projection happens in `f64` so that
/// deep tiles keep sub-pixel precision; build paths from [`project`] output
/// rather than from raw degrees.
///
/// [`project`]: TileDrawContext::project
pub struct TileDrawContext<'a> {
    view: &'a ViewState,
    tile: TileKey,
    sector: Sector,
    pixmap: &'a mut Pixmap,
}

impl<'a> TileDrawContext<'a> {
    pub fn new(view: &'a ViewState, tile: TileKey, sector: Sector, pixmap: &'a mut Pixmap) -> Self {
        Self {
            view,
            tile,
            sector,
            pixmap,
        }
    }

    pub fn view(&self) -> &ViewState {
        self.view
    }

    pub fn tile_key(&self) -> TileKey {
        self.tile
    }

    /// Geographic bounds of the tile being drawn.
    pub fn sector(&self) -> Sector {
        self.sector
    }

    /// Width and height of the draw region in pixels.
    pub fn viewport(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    /// Pixels per degree along longitude and latitude.
    pub fn scale(&self) -> (f64, f64) {
        (
            self.pixmap.width() as f64 / self.sector.delta_lon(),
            self.pixmap.height() as f64 / self.sector.delta_lat(),
        )
    }

    /// Pixel coordinates of a location in the tile.
    pub fn project(&self, location: LatLon) -> (f32, f32) {
        let (sx, sy) = self.scale();
        let x = (location.lon - self.sector.min_lon) * sx;
        let y = (self.sector.max_lat - location.lat) * sy;
        (x as f32, y as f32)
    }

    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        self.pixmap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Globe;
    use crate::tiling::CacheNamespace;
    use crate::view::Viewport;

    #[test]
    fn test_project_corners() {
        let view = ViewState::looking_down(
            Globe::WGS84,
            LatLon::from_degrees(0.0, 0.0),
            1_000_000.0,
            45.0,
            Viewport::new(256, 256),
        )
        .unwrap();
        let mut pixmap = Pixmap::new(256, 256).unwrap();
        let sector = Sector::from_degrees(0.0, 36.0, -36.0, 0.0);
        let dc = TileDrawContext::new(&view, TileKey::new(0, 2, 4, CacheNamespace(1)), sector, &mut pixmap);

        assert_eq!(dc.project(LatLon::from_degrees(36.0, -36.0)), (0.0, 0.0));
        assert_eq!(dc.project(LatLon::from_degrees(0.0, 0.0)), (256.0, 256.0));
        assert_eq!(dc.project(LatLon::from_degrees(18.0, -18.0)), (128.0, 128.0));
        assert_eq!(dc.viewport(), (256, 256));
    }
}
