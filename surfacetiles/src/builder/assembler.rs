//! Assembly of the tiles needed to draw a set of surface objects.
//!
//! Objects are first indexed into the level-zero tiles their sectors touch.
//! Each level-zero tile then descends the quadtree: tiles outside the visible
//! sector or the frustum are dropped, children inherit only the parent's
//! objects that touch them, and descent stops at tiles that meet the level of
//! detail criteria.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{trace, warn};

use crate::renderable::SurfaceRenderable;
use crate::tiling::{CacheNamespace, LevelSet, TileKey};
use crate::view::ViewState;

use super::lod::LevelOfDetailPolicy;
use super::tile::{SharedTile, SurfaceObjectTile, TilePool};
use super::PickCandidate;

/// Inputs for one assembly pass.
pub struct AssemblyContext<'a> {
    pub view: &'a ViewState,
    pub level_set: &'a LevelSet,
    pub namespace: CacheNamespace,
    pub pool: &'a TilePool,
}

/// Tiles selected for drawing, in assembly order.
#[derive(Default)]
pub struct AssembledTiles {
    pub tiles: Vec<SharedTile>,
    /// Filled only when the view is picking.
    pub pick_candidates: Vec<PickCandidate>,
}

/// Selects the tiles covering a set of surface objects.
#[derive(Debug, Clone, Default)]
pub struct TileAssembler {
    lod: LevelOfDetailPolicy,
}

impl TileAssembler {
    pub fn new(lod: LevelOfDetailPolicy) -> Self {
        Self { lod }
    }

    pub fn lod(&self) -> &LevelOfDetailPolicy {
        &self.lod
    }

    pub fn lod_mut(&mut self) -> &mut LevelOfDetailPolicy {
        &mut self.lod
    }

    /// Assemble the tiles needed to draw `renderables` in the context's view.
    ///
    /// Every tile touched but not returned has its object list cleared before
    /// this returns. Returned tiles keep theirs until the caller clears them.
    pub fn assemble(
        &self,
        ctx: &AssemblyContext<'_>,
        renderables: &[Arc<dyn SurfaceRenderable>],
    ) -> AssembledTiles {
        let mut out = AssembledTiles::default();
        for tile in self.index_top_level(ctx, renderables) {
            self.add_tile_or_descendants(ctx, None, tile, &mut out);
        }
        trace!(
            namespace = %ctx.namespace,
            tiles = out.tiles.len(),
            "Assembled surface tiles"
        );
        out
    }

    /// Level-zero tiles touched by any renderable, each holding the
    /// renderables that touch it.
    fn index_top_level(
        &self,
        ctx: &AssemblyContext<'_>,
        renderables: &[Arc<dyn SurfaceRenderable>],
    ) -> Vec<SharedTile> {
        let level_number = ctx.level_set.first_level().level_number();

        let mut top_level = Vec::new();
        let mut top_level_keys = HashSet::new();
        let mut intersecting = HashSet::new();

        for object in renderables {
            intersecting.clear();

            for sector in object.sectors(ctx.view) {
                let range = match ctx.level_set.tile_range(&sector, level_number) {
                    Ok(range) => range,
                    Err(e) => {
                        warn!(sector = %sector, error = %e, "Skipping surface object sector");
                        continue;
                    }
                };

                for (row, column) in range.iter() {
                    let key = TileKey::new(level_number, row, column, ctx.namespace);
                    // An object spanning several sectors is added to a tile once.
                    if !intersecting.insert(key) {
                        continue;
                    }

                    let tile_sector = match ctx.level_set.tile_sector(level_number, row, column) {
                        Ok(tile_sector) => tile_sector,
                        Err(e) => {
                            warn!(tile = %key, error = %e, "Skipping top level tile");
                            continue;
                        }
                    };

                    let tile = ctx.pool.get_or_create(key, tile_sector);
                    tile.lock().add_surface_object(Arc::clone(object), sector);
                    if top_level_keys.insert(key) {
                        top_level.push(tile);
                    }
                }
            }
        }

        top_level
    }

    fn add_tile_or_descendants(
        &self,
        ctx: &AssemblyContext<'_>,
        parent: Option<&SurfaceObjectTile>,
        tile: SharedTile,
        out: &mut AssembledTiles,
    ) {
        let mut guard = tile.lock();

        if !intersects_visible_sector(ctx.view, &guard) || !intersects_frustum(ctx.view, &mut guard)
        {
            guard.clear_objects();
            return;
        }

        if let Some(parent) = parent {
            add_intersecting_objects(ctx.view, parent, &mut guard);
        }

        if !guard.has_objects() {
            return;
        }

        let sector = guard.sector();
        if self
            .lod
            .meets_render_criteria(ctx.view, ctx.level_set, guard.level_number(), &sector)
        {
            if ctx.view.is_picking() {
                out.pick_candidates.push(PickCandidate {
                    tile: guard.key(),
                    tile_sector: sector,
                    object_sector: guard.object_sector().unwrap_or(sector),
                });
            }
            drop(guard);
            out.tiles.push(tile);
            return;
        }

        for (key, sub_sector) in guard.sub_tiles() {
            let child = ctx.pool.get_or_create(key, sub_sector);
            self.add_tile_or_descendants(ctx, Some(&*guard), child, out);
        }

        guard.clear_objects();
    }
}

fn intersects_visible_sector(view: &ViewState, tile: &SurfaceObjectTile) -> bool {
    view.visible_sector
        .is_some_and(|visible| visible.intersects(&tile.sector()))
}

fn intersects_frustum(view: &ViewState, tile: &mut SurfaceObjectTile) -> bool {
    let extent = tile.extent(&view.globe);
    if view.is_picking() {
        view.pick_frustums.iter().any(|f| f.intersects(&extent))
    } else {
        view.frustum.intersects(&extent)
    }
}

/// Add the parent's objects that touch `tile`.
fn add_intersecting_objects(view: &ViewState, parent: &SurfaceObjectTile, tile: &mut SurfaceObjectTile) {
    let Some(object_sector) = parent.object_sector() else {
        return;
    };
    if !parent.has_objects() {
        return;
    }

    let tile_sector = tile.sector();
    if !tile_sector.intersects(&object_sector) {
        return;
    }

    if tile_sector.contains(&object_sector) {
        tile.add_all_surface_objects(parent.objects(), object_sector);
        return;
    }

    for object in parent.objects() {
        if let Some(sector) = object
            .sectors(view)
            .into_iter()
            .find(|s| tile_sector.intersects(s))
        {
            tile.add_surface_object(Arc::clone(object), sector);
        }
    }
}
