//! Redraws stale tiles into their cached textures.

use std::sync::Arc;

use tiny_skia::Color;
use tracing::{debug, warn};

use crate::builder::{SharedTile, SurfaceObjectTile};
use crate::telemetry::BuildMetrics;
use crate::texture::{RasterTextureFactory, TextureFactory, TextureParams, TileTextureCache};
use crate::view::ViewState;

use super::{RenderError, RenderToTexture, TileDrawContext};

/// Inputs shared by every tile updated in one pass.
pub struct TileUpdateContext<'a> {
    pub view: &'a ViewState,
    pub texture_cache: &'a TileTextureCache,
    pub texture_params: TextureParams,
    pub force_tile_updates: bool,
    pub metrics: &'a BuildMetrics,
}

/// Draws tile contents into textures, skipping tiles whose state key is unchanged.
pub struct TileRenderer {
    rtt: RenderToTexture,
    factory: Arc<dyn TextureFactory>,
}

impl TileRenderer {
    pub fn new(factory: Arc<dyn TextureFactory>) -> Self {
        Self {
            rtt: RenderToTexture::new(),
            factory,
        }
    }

    pub fn set_texture_factory(&mut self, factory: Arc<dyn TextureFactory>) {
        self.factory = factory;
    }

    /// Update the textures of `tiles`.
    ///
    /// All stale tiles share one render pass. Failures affect only the tile
    /// they occur in.
    pub fn update_tiles(&mut self, ctx: &TileUpdateContext<'_>, tiles: &[SharedTile]) {
        if tiles.is_empty() {
            return;
        }

        let params = ctx.texture_params;
        self.rtt
            .set_direct_rendering_enabled(params.format.supports_direct_rendering());
        if let Err(e) = self.rtt.begin_rendering(params.width, params.height) {
            warn!(error = %e, "Failed to begin tile render pass");
            return;
        }

        for tile in tiles {
            let mut tile = tile.lock();
            self.update_tile(ctx, &mut tile);
        }

        self.rtt.end_rendering();
    }

    fn update_tile(&mut self, ctx: &TileUpdateContext<'_>, tile: &mut SurfaceObjectTile) {
        let key = tile.key();
        let existing = ctx.texture_cache.get(&key);

        if !ctx.force_tile_updates {
            let state_key = tile.state_key(ctx.view);
            if existing.is_some() && tile.last_update_state_key() == Some(&state_key) {
                return;
            }
            // Recorded before drawing, so a tile that fails below is not retried
            // until its contents change.
            tile.set_last_update_state_key(state_key);
        }

        let texture = match existing {
            Some(texture) => texture,
            None => match self.factory.create_texture(&ctx.texture_params) {
                Ok(texture) => {
                    let texture = Arc::new(texture);
                    ctx.texture_cache.put(key, Arc::clone(&texture));
                    ctx.metrics.texture_created();
                    texture
                }
                Err(e) => {
                    warn!(tile = %key, error = %e, "Failed to create tile texture");
                    ctx.metrics.texture_allocation_failed();
                    return;
                }
            },
        };

        self.rtt.set_color_target(Some(texture));
        self.rtt.clear(Color::TRANSPARENT);

        let view = ctx.view;
        let sector = tile.sector();
        let metrics = ctx.metrics;
        let result = self.rtt.draw(|pixmap| -> Result<(), RenderError> {
            let mut dc = TileDrawContext::new(view, key, sector, pixmap);
            for object in tile.objects() {
                metrics.draw_call();
                object.render_into(&mut dc)?;
            }
            Ok(())
        });

        match result.and_then(|drawn| drawn) {
            Ok(()) => {
                ctx.metrics.tile_updated();
                debug!(tile = %key, objects = tile.object_count(), "Updated tile");
            }
            Err(e) => {
                warn!(tile = %key, error = %e, "Failed to render tile");
                ctx.metrics.render_failed();
            }
        }

        self.rtt.set_color_target(None);
    }
}

impl Default for TileRenderer {
    fn default() -> Self {
        Self::new(Arc::new(RasterTextureFactory::default()))
    }
}
