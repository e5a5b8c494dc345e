//! Pooled tile entries and their state keys.

use std::fmt;
use std::sync::Arc;

use moka::sync::Cache;
use parking_lot::Mutex;

use crate::geo::{mid_angle, BoundingSphere, Globe, Sector};
use crate::renderable::{StateToken, SurfaceRenderable};
use crate::tiling::TileKey;
use crate::view::ViewState;

/// Default maximum number of pooled tile entries.
pub const DEFAULT_TILE_POOL_CAPACITY: u64 = 20_000;

/// A tile entry shared between the pool and the current frame.
pub type SharedTile = Arc<Mutex<SurfaceObjectTile>>;

/// Snapshot of everything that determines a tile's pixels.
///
/// Empty for a tile with no objects. Two keys are equal exactly when the tile
/// and every object's [`StateToken`], in draw order, are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TileStateKey {
    contents: Option<(TileKey, Vec<StateToken>)>,
}

impl TileStateKey {
    pub fn empty() -> Self {
        Self { contents: None }
    }

    pub fn new(tile: TileKey, tokens: Vec<StateToken>) -> Self {
        Self {
            contents: Some((tile, tokens)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_none()
    }

    pub fn tile(&self) -> Option<TileKey> {
        self.contents.as_ref().map(|(tile, _)| *tile)
    }

    pub fn tokens(&self) -> &[StateToken] {
        self.contents
            .as_ref()
            .map(|(_, tokens)| tokens.as_slice())
            .unwrap_or(&[])
    }

    /// Approximate memory held by the key.
    pub fn size_in_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + std::mem::size_of_val(self.tokens())
    }
}

/// A quadtree tile with the objects intersecting it this frame.
///
/// The object list and object sector are per-frame scratch state cleared after
/// every build. The last state key and cached extent persist while the entry
/// stays pooled. The tile's texture lives in the texture cache under
/// [`key`](Self::key).
pub struct SurfaceObjectTile {
    key: TileKey,
    sector: Sector,
    objects: Vec<Arc<dyn SurfaceRenderable>>,
    object_sector: Option<Sector>,
    last_update_state_key: Option<TileStateKey>,
    extent: Option<(Globe, BoundingSphere)>,
}

impl SurfaceObjectTile {
    pub fn new(key: TileKey, sector: Sector) -> Self {
        Self {
            key,
            sector,
            objects: Vec::new(),
            object_sector: None,
            last_update_state_key: None,
            extent: None,
        }
    }

    pub fn key(&self) -> TileKey {
        self.key
    }

    pub fn sector(&self) -> Sector {
        self.sector
    }

    pub fn level_number(&self) -> u32 {
        self.key.level
    }

    pub fn row(&self) -> i32 {
        self.key.row
    }

    pub fn column(&self) -> i32 {
        self.key.column
    }

    pub fn has_objects(&self) -> bool {
        !self.objects.is_empty()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn objects(&self) -> &[Arc<dyn SurfaceRenderable>] {
        &self.objects
    }

    /// Union of the sectors through which the current objects were added.
    pub fn object_sector(&self) -> Option<Sector> {
        self.object_sector
    }

    pub fn add_surface_object(&mut self, object: Arc<dyn SurfaceRenderable>, sector: Sector) {
        self.objects.push(object);
        self.extend_object_sector(sector);
    }

    pub fn add_all_surface_objects(&mut self, objects: &[Arc<dyn SurfaceRenderable>], sector: Sector) {
        self.objects.extend(objects.iter().cloned());
        self.extend_object_sector(sector);
    }

    fn extend_object_sector(&mut self, sector: Sector) {
        self.object_sector = Some(match self.object_sector {
            Some(current) => current.union(&sector),
            None => sector,
        });
    }

    pub fn clear_objects(&mut self) {
        self.objects.clear();
        self.object_sector = None;
    }

    /// State key of the current contents.
    pub fn state_key(&self, view: &ViewState) -> TileStateKey {
        if self.objects.is_empty() {
            return TileStateKey::empty();
        }
        let tokens = self.objects.iter().map(|o| o.state_key(view)).collect();
        TileStateKey::new(self.key, tokens)
    }

    pub fn last_update_state_key(&self) -> Option<&TileStateKey> {
        self.last_update_state_key.as_ref()
    }

    pub fn set_last_update_state_key(&mut self, key: TileStateKey) {
        self.last_update_state_key = Some(key);
    }

    /// Bounding sphere of the tile on `globe`, cached until the globe changes.
    pub fn extent(&mut self, globe: &Globe) -> BoundingSphere {
        if let Some((cached_globe, sphere)) = &self.extent {
            if cached_globe == globe {
                return *sphere;
            }
        }
        let sphere = self.sector.compute_bounding_sphere(globe);
        self.extent = Some((*globe, sphere));
        sphere
    }

    /// Child keys and sectors in SW, SE, NW, NE order.
    ///
    /// Children share the parent's mid angles, so together they cover the
    /// parent exactly.
    pub fn sub_tiles(&self) -> [(TileKey, Sector); 4] {
        let s = self.sector;
        let mid_lat = mid_angle(s.min_lat, s.max_lat);
        let mid_lon = mid_angle(s.min_lon, s.max_lon);
        let [sw, se, nw, ne] = self.key.children();
        [
            (sw, Sector::from_degrees(s.min_lat, mid_lat, s.min_lon, mid_lon)),
            (se, Sector::from_degrees(s.min_lat, mid_lat, mid_lon, s.max_lon)),
            (nw, Sector::from_degrees(mid_lat, s.max_lat, s.min_lon, mid_lon)),
            (ne, Sector::from_degrees(mid_lat, s.max_lat, mid_lon, s.max_lon)),
        ]
    }

    /// Approximate memory held by the entry, excluding its texture.
    pub fn size_in_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.objects.capacity() * std::mem::size_of::<Arc<dyn SurfaceRenderable>>()
            + self
                .last_update_state_key
                .as_ref()
                .map_or(0, TileStateKey::size_in_bytes)
    }
}

impl fmt::Debug for SurfaceObjectTile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceObjectTile")
            .field("key", &self.key)
            .field("sector", &self.sector)
            .field("objects", &self.objects.len())
            .field("object_sector", &self.object_sector)
            .finish()
    }
}

/// LRU pool of tile entries bounded by entry count.
pub struct TilePool {
    cache: Cache<TileKey, SharedTile>,
}

impl TilePool {
    pub fn new(capacity: u64) -> Self {
        Self {
            cache: Cache::new(capacity),
        }
    }

    pub fn get(&self, key: &TileKey) -> Option<SharedTile> {
        self.cache.get(key)
    }

    /// The pooled entry for `key`, creating it with `sector` if absent.
    pub fn get_or_create(&self, key: TileKey, sector: Sector) -> SharedTile {
        self.cache
            .get_with(key, || Arc::new(Mutex::new(SurfaceObjectTile::new(key, sector))))
    }

    pub fn contains(&self, key: &TileKey) -> bool {
        self.cache.contains_key(key)
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    pub fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks();
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks();
    }
}

impl Default for TilePool {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_POOL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{RenderError, TileDrawContext};
    use crate::tiling::CacheNamespace;
    use crate::view::Viewport;
    use crate::geo::LatLon;

    struct Token(u64, u64);

    impl SurfaceRenderable for Token {
        fn sectors(&self, _view: &ViewState) -> Vec<Sector> {
            vec![Sector::from_degrees(0.0, 1.0, 0.0, 1.0)]
        }

        fn state_key(&self, _view: &ViewState) -> StateToken {
            StateToken::new(self.0, self.1)
        }

        fn render_into(&self, _dc: &mut TileDrawContext<'_>) -> Result<(), RenderError> {
            Ok(())
        }
    }

    fn view() -> ViewState {
        ViewState::looking_down(
            Globe::WGS84,
            LatLon::default(),
            1_000_000.0,
            45.0,
            Viewport::new(512, 512),
        )
        .unwrap()
    }

    fn tile() -> SurfaceObjectTile {
        SurfaceObjectTile::new(
            TileKey::new(0, 2, 5, CacheNamespace(1)),
            Sector::from_degrees(-18.0, 18.0, 0.0, 36.0),
        )
    }

    #[test]
    fn test_empty_tile_has_empty_state_key() {
        assert!(tile().state_key(&view()).is_empty());
    }

    #[test]
    fn test_state_key_tracks_object_tokens() {
        let view = view();
        let mut t = tile();
        let sector = Sector::from_degrees(0.0, 1.0, 0.0, 1.0);
        t.add_surface_object(Arc::new(Token(1, 1)), sector);
        t.add_surface_object(Arc::new(Token(2, 1)), sector);
        let before = t.state_key(&view);

        t.clear_objects();
        t.add_surface_object(Arc::new(Token(1, 1)), sector);
        t.add_surface_object(Arc::new(Token(2, 2)), sector);
        let after = t.state_key(&view);

        assert_ne!(before, after);
        assert_eq!(before.tokens().len(), 2);
        assert_eq!(before.tile(), Some(t.key()));
    }

    #[test]
    fn test_state_key_depends_on_order() {
        let view = view();
        let sector = Sector::from_degrees(0.0, 1.0, 0.0, 1.0);
        let a: Arc<dyn SurfaceRenderable> = Arc::new(Token(1, 1));
        let b: Arc<dyn SurfaceRenderable> = Arc::new(Token(2, 1));

        let mut t = tile();
        t.add_all_surface_objects(&[Arc::clone(&a), Arc::clone(&b)], sector);
        let ab = t.state_key(&view);
        t.clear_objects();
        t.add_all_surface_objects(&[b, a], sector);
        let ba = t.state_key(&view);

        assert_ne!(ab, ba);
    }

    #[test]
    fn test_object_sector_is_union() {
        let mut t = tile();
        t.add_surface_object(Arc::new(Token(1, 1)), Sector::from_degrees(0.0, 1.0, 0.0, 1.0));
        t.add_surface_object(Arc::new(Token(2, 1)), Sector::from_degrees(5.0, 6.0, 3.0, 4.0));
        assert_eq!(t.object_sector(), Some(Sector::from_degrees(0.0, 6.0, 0.0, 4.0)));

        t.clear_objects();
        assert!(t.object_sector().is_none());
        assert!(!t.has_objects());
    }

    #[test]
    fn test_sub_tiles() {
        let t = tile();
        let subs = t.sub_tiles();
        assert_eq!(subs[0].0, TileKey::new(1, 4, 10, CacheNamespace(1)));
        assert_eq!(subs[0].1, Sector::from_degrees(-18.0, 0.0, 0.0, 18.0));
        assert_eq!(subs[1].1, Sector::from_degrees(-18.0, 0.0, 18.0, 36.0));
        assert_eq!(subs[2].1, Sector::from_degrees(0.0, 18.0, 0.0, 18.0));
        assert_eq!(subs[3].0, TileKey::new(1, 5, 11, CacheNamespace(1)));
        assert_eq!(subs[3].1, Sector::from_degrees(0.0, 18.0, 18.0, 36.0));
    }

    #[test]
    fn test_extent_cached_per_globe() {
        let mut t = tile();
        let a = t.extent(&Globe::WGS84);
        let b = t.extent(&Globe::WGS84);
        assert_eq!(a, b);
        let c = t.extent(&Globe::spherical(1_000.0));
        assert!(c.radius < a.radius);
    }

    #[test]
    fn test_pool_reuses_entries() {
        let pool = TilePool::new(100);
        let key = TileKey::new(0, 0, 0, CacheNamespace(1));
        let a = pool.get_or_create(key, Sector::from_degrees(-90.0, -54.0, -180.0, -144.0));
        let b = pool.get_or_create(key, Sector::FULL_SPHERE);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(pool.contains(&key));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Children tile the parent with no gaps or overlaps.
            #[test]
            fn prop_sub_tiles_partition_parent(
                level in 0u32..16,
                row_frac in 0.0_f64..1.0,
                col_frac in 0.0_f64..1.0,
            ) {
                let delta = 36.0 / (1u64 << level) as f64;
                let rows = (180.0 / delta) as i32;
                let cols = (360.0 / delta) as i32;
                let row = ((rows as f64 * row_frac) as i32).min(rows - 1);
                let col = ((cols as f64 * col_frac) as i32).min(cols - 1);
                let min_lat = -90.0 + row as f64 * delta;
                let min_lon = -180.0 + col as f64 * delta;
                let parent = SurfaceObjectTile::new(
                    TileKey::new(level, row, col, CacheNamespace(1)),
                    Sector::from_degrees(min_lat, min_lat + delta, min_lon, min_lon + delta),
                );
                let p = parent.sector();
                let subs = parent.sub_tiles();

                let area: f64 = subs.iter().map(|(_, s)| s.delta_lat() * s.delta_lon()).sum();
                prop_assert!((area - p.delta_lat() * p.delta_lon()).abs() < 1e-9 * delta * delta);

                for (_, s) in &subs {
                    prop_assert!(p.contains(s));
                }
                // Shared edges are bit-identical.
                prop_assert_eq!(subs[0].1.max_lon, subs[1].1.min_lon);
                prop_assert_eq!(subs[0].1.max_lat, subs[2].1.min_lat);
                prop_assert_eq!(subs[3].1.min_lat, subs[1].1.max_lat);
                prop_assert_eq!(subs[3].1.min_lon, subs[2].1.max_lon);
            }
        }
    }
}
