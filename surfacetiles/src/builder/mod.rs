//! The surface object tile builder.
//!
//! [`SurfaceObjectTileBuilder`] composites a changing set of
//! [`SurfaceRenderable`]s into textured tiles laid over a geographic quadtree.
//! Each frame it:
//!
//! 1. Assembles the tiles that the renderables touch, culled against the view
//!    and refined until they meet the level of detail criteria.
//! 2. Redraws only the tiles whose state key changed since they were last
//!    drawn.
//! 3. Publishes the resulting [`SurfaceTile`]s (and, when picking,
//!    [`PickCandidate`]s) until the next build for the same view.
//!
//! Results are kept per tile size and globe offset, so a 2D globe drawn
//! several times side by side keeps one set of tiles per copy.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use surfacetiles::builder::SurfaceObjectTileBuilder;
//! use surfacetiles::config::TileBuilderConfig;
//! use surfacetiles::geo::{Globe, LatLon, Sector};
//! use surfacetiles::renderable::SurfaceRenderable;
//! use surfacetiles::shapes::SurfaceQuad;
//! use surfacetiles::tiling::TilingRegistry;
//! use surfacetiles::view::{ViewState, Viewport};
//!
//! let registry = Arc::new(TilingRegistry::with_defaults());
//! let mut builder = SurfaceObjectTileBuilder::new(registry, TileBuilderConfig::default());
//!
//! let view = ViewState::looking_down(
//!     Globe::WGS84,
//!     LatLon::from_degrees(45.0, 7.0),
//!     2_000_000.0,
//!     45.0,
//!     Viewport::new(800, 600),
//! )
//! .unwrap();
//!
//! let quad: Arc<dyn SurfaceRenderable> =
//!     Arc::new(SurfaceQuad::new(Sector::from_degrees(44.0, 46.0, 6.0, 8.0)));
//! builder.build_tiles(&view, [quad]);
//!
//! assert!(builder.tile_count(&view) > 0);
//! ```

mod assembler;
mod lod;
mod tile;

pub use assembler::{AssembledTiles, AssemblyContext, TileAssembler};
pub use lod::{LevelOfDetailPolicy, DEFAULT_SPLIT_SCALE, POLAR_LATITUDE, POLAR_SPLIT_DAMPING};
pub use tile::{SharedTile, SurfaceObjectTile, TilePool, TileStateKey, DEFAULT_TILE_POOL_CAPACITY};

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::TileBuilderConfig;
use crate::geo::{BoundingSphere, Sector};
use crate::render::{TileRenderer, TileUpdateContext};
use crate::renderable::SurfaceRenderable;
use crate::telemetry::BuildMetrics;
use crate::texture::{TextureFactory, TextureFormat, TextureParams, TileTexture};
use crate::tiling::{CacheNamespace, LevelSet, TileDimension, TileKey, TilingError, TilingRegistry};
use crate::view::ViewState;

/// A tile produced by the last build, ready to be drawn on the globe.
#[derive(Debug, Clone)]
pub struct SurfaceTile {
    key: TileKey,
    sector: Sector,
    texture: Option<Arc<TileTexture>>,
    extent: BoundingSphere,
}

impl SurfaceTile {
    pub fn key(&self) -> TileKey {
        self.key
    }

    pub fn level_number(&self) -> u32 {
        self.key.level
    }

    pub fn sector(&self) -> Sector {
        self.sector
    }

    /// The tile's texture; `None` if it could not be allocated this frame.
    pub fn texture(&self) -> Option<&Arc<TileTexture>> {
        self.texture.as_ref()
    }

    pub fn extent(&self) -> BoundingSphere {
        self.extent
    }
}

/// A tile that may contain the picked object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickCandidate {
    pub tile: TileKey,
    pub tile_sector: Sector,
    /// Union of the sectors of the objects drawn into the tile.
    pub object_sector: Sector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct TileInfoKey {
    tile_width: u32,
    tile_height: u32,
    globe_offset: i32,
}

struct TileInfo {
    level_set: Arc<LevelSet>,
    namespace: CacheNamespace,
    tiles: Vec<SurfaceTile>,
    pick_candidates: Vec<PickCandidate>,
}

/// Largest power of two not greater than `n`, or 0 for 0.
fn power_of_two_floor(n: u32) -> u32 {
    if n == 0 {
        0
    } else {
        1 << (31 - n.leading_zeros())
    }
}

/// Builds and caches textured surface tiles for a set of renderables.
pub struct SurfaceObjectTileBuilder {
    registry: Arc<TilingRegistry>,
    config: TileBuilderConfig,
    assembler: TileAssembler,
    renderer: TileRenderer,
    current_objects: Vec<Arc<dyn SurfaceRenderable>>,
    tile_infos: HashMap<TileInfoKey, TileInfo>,
    metrics: Arc<BuildMetrics>,
}

impl SurfaceObjectTileBuilder {
    pub fn new(registry: Arc<TilingRegistry>, config: TileBuilderConfig) -> Self {
        Self {
            registry,
            assembler: TileAssembler::new(LevelOfDetailPolicy::new(config.split_scale)),
            config,
            renderer: TileRenderer::default(),
            current_objects: Vec::new(),
            tile_infos: HashMap::new(),
            metrics: Arc::new(BuildMetrics::new()),
        }
    }

    /// Use `factory` to allocate tile textures.
    pub fn with_texture_factory(mut self, factory: Arc<dyn TextureFactory>) -> Self {
        self.renderer.set_texture_factory(factory);
        self
    }

    /// Report into shared metrics instead of the builder's own.
    pub fn with_metrics(mut self, metrics: Arc<BuildMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Assemble, update and publish the tiles for `renderables` in `view`.
    ///
    /// Replaces the results previously published for the view's tile size and
    /// globe offset. Returns early with no tiles if the viewport has no area or
    /// there are no renderables.
    pub fn build_tiles<I>(&mut self, view: &ViewState, renderables: I)
    where
        I: IntoIterator<Item = Arc<dyn SurfaceRenderable>>,
    {
        let dimension = self.compute_tile_dimension(view);
        let info_key = TileInfoKey {
            tile_width: dimension.width,
            tile_height: dimension.height,
            globe_offset: view.globe_offset,
        };

        if let Some(info) = self.tile_infos.get_mut(&info_key) {
            info.tiles.clear();
            info.pick_candidates.clear();
        }
        self.current_objects.clear();

        if dimension.width == 0 || dimension.height == 0 {
            debug!("Viewport has no area, skipping surface tiles");
            self.metrics.frame_skipped();
            return;
        }

        self.current_objects.extend(renderables);
        if self.current_objects.is_empty() {
            self.metrics.frame_skipped();
            return;
        }

        let (level_set, namespace) = match self.tile_info(info_key, dimension) {
            Ok(info) => info,
            Err(e) => {
                warn!(dimension = %dimension, error = %e, "Cannot build surface tiles");
                self.current_objects.clear();
                self.metrics.frame_skipped();
                return;
            }
        };

        let registry = Arc::clone(&self.registry);
        let assembled = self.assembler.assemble(
            &AssemblyContext {
                view,
                level_set: &level_set,
                namespace,
                pool: registry.tile_pool(),
            },
            &self.current_objects,
        );

        let update = TileUpdateContext {
            view,
            texture_cache: registry.texture_cache(),
            texture_params: self.texture_params(dimension),
            force_tile_updates: self.config.force_tile_updates,
            metrics: &self.metrics,
        };
        self.renderer.update_tiles(&update, &assembled.tiles);

        let tiles: Vec<SurfaceTile> = assembled
            .tiles
            .iter()
            .map(|shared| {
                let mut tile = shared.lock();
                let key = tile.key();
                let surface_tile = SurfaceTile {
                    key,
                    sector: tile.sector(),
                    texture: registry.texture_cache().get(&key),
                    extent: tile.extent(&view.globe),
                };
                tile.clear_objects();
                surface_tile
            })
            .collect();

        self.current_objects.clear();
        self.metrics.frame_built(tiles.len());
        debug!(
            tiles = tiles.len(),
            namespace = %namespace,
            globe_offset = view.globe_offset,
            "Built surface tiles"
        );

        if let Some(info) = self.tile_infos.get_mut(&info_key) {
            info.tiles = tiles;
            info.pick_candidates = assembled.pick_candidates;
        }
    }

    fn tile_info(
        &mut self,
        key: TileInfoKey,
        dimension: TileDimension,
    ) -> Result<(Arc<LevelSet>, CacheNamespace), TilingError> {
        if let Some(info) = self.tile_infos.get(&key) {
            return Ok((Arc::clone(&info.level_set), info.namespace));
        }

        let level_set = self.registry.level_set(dimension)?;
        let namespace = self.registry.allocate_namespace();
        debug!(
            dimension = %dimension,
            globe_offset = key.globe_offset,
            namespace = %namespace,
            "Created tile info"
        );
        self.tile_infos.insert(
            key,
            TileInfo {
                level_set: Arc::clone(&level_set),
                namespace,
                tiles: Vec::new(),
                pick_candidates: Vec::new(),
            },
        );
        Ok((level_set, namespace))
    }

    fn info_for(&self, view: &ViewState) -> Option<&TileInfo> {
        let dimension = self.compute_tile_dimension(view);
        self.tile_infos.get(&TileInfoKey {
            tile_width: dimension.width,
            tile_height: dimension.height,
            globe_offset: view.globe_offset,
        })
    }

    fn info_for_mut(&mut self, view: &ViewState) -> Option<&mut TileInfo> {
        let dimension = self.compute_tile_dimension(view);
        self.tile_infos.get_mut(&TileInfoKey {
            tile_width: dimension.width,
            tile_height: dimension.height,
            globe_offset: view.globe_offset,
        })
    }

    /// Tiles from the most recent build for this view.
    pub fn tiles(&self, view: &ViewState) -> &[SurfaceTile] {
        self.info_for(view)
            .map(|info| info.tiles.as_slice())
            .unwrap_or(&[])
    }

    pub fn tile_count(&self, view: &ViewState) -> usize {
        self.tiles(view).len()
    }

    /// Pick candidates from the most recent picking build for this view.
    pub fn pick_candidates(&self, view: &ViewState) -> &[PickCandidate] {
        self.info_for(view)
            .map(|info| info.pick_candidates.as_slice())
            .unwrap_or(&[])
    }

    pub fn clear_tiles(&mut self, view: &ViewState) {
        if let Some(info) = self.info_for_mut(view) {
            info.tiles.clear();
        }
    }

    pub fn clear_pick_candidates(&mut self, view: &ViewState) {
        if let Some(info) = self.info_for_mut(view) {
            info.pick_candidates.clear();
        }
    }

    /// Namespace of the tiles built for this view, once a build has happened.
    pub fn namespace(&self, view: &ViewState) -> Option<CacheNamespace> {
        self.info_for(view).map(|info| info.namespace)
    }

    /// Square power-of-two tile size used for `view`.
    ///
    /// The configured size is clamped to the viewport so tiles can be drawn
    /// through a viewport-sized framebuffer. Zero when the viewport has no area.
    pub fn compute_tile_dimension(&self, view: &ViewState) -> TileDimension {
        let requested = self.config.tile_width.max(self.config.tile_height);
        let size = requested
            .min(view.viewport.width)
            .min(view.viewport.height);
        TileDimension::square(power_of_two_floor(size))
    }

    fn texture_params(&self, dimension: TileDimension) -> TextureParams {
        TextureParams {
            width: dimension.width,
            height: dimension.height,
            format: self.config.texture_format,
            linear_filter: self.config.use_linear_filter,
            mipmaps: self.config.use_mipmaps,
        }
    }

    pub fn config(&self) -> &TileBuilderConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<TilingRegistry> {
        &self.registry
    }

    pub fn metrics(&self) -> &Arc<BuildMetrics> {
        &self.metrics
    }

    /// Requested tile size, before clamping to the viewport.
    pub fn tile_dimension(&self) -> TileDimension {
        TileDimension::new(self.config.tile_width, self.config.tile_height)
    }

    pub fn set_tile_dimension(&mut self, width: u32, height: u32) {
        self.config.tile_width = width;
        self.config.tile_height = height;
    }

    pub fn texture_format(&self) -> TextureFormat {
        self.config.texture_format
    }

    /// Applies to textures created after the call.
    pub fn set_texture_format(&mut self, format: TextureFormat) {
        self.config.texture_format = format;
    }

    pub fn use_linear_filter(&self) -> bool {
        self.config.use_linear_filter
    }

    pub fn set_use_linear_filter(&mut self, use_linear_filter: bool) {
        self.config.use_linear_filter = use_linear_filter;
    }

    pub fn use_mipmaps(&self) -> bool {
        self.config.use_mipmaps
    }

    pub fn set_use_mipmaps(&mut self, use_mipmaps: bool) {
        self.config.use_mipmaps = use_mipmaps;
    }

    pub fn force_tile_updates(&self) -> bool {
        self.config.force_tile_updates
    }

    pub fn set_force_tile_updates(&mut self, force_tile_updates: bool) {
        self.config.force_tile_updates = force_tile_updates;
    }

    pub fn split_scale(&self) -> f64 {
        self.config.split_scale
    }

    pub fn set_split_scale(&mut self, split_scale: f64) {
        self.config.split_scale = split_scale;
        self.assembler.lod_mut().set_split_scale(split_scale);
    }
}
