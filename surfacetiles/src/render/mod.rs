//! Rendering surface objects into tile textures.
//!
//! - [`RenderToTexture`] binds tile textures as draw targets
//! - [`TileDrawContext`] is what a renderable sees while drawing one tile
//! - [`TileRenderer`] redraws the tiles whose contents changed

mod draw_context;
mod renderer;
mod rtt;

pub use draw_context::TileDrawContext;
pub use renderer::{TileRenderer, TileUpdateContext};
pub use rtt::RenderToTexture;

use thiserror::Error;

use crate::texture::TextureError;

/// Errors raised while drawing tiles.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    /// A renderable failed to draw itself.
    #[error("Renderable failed: {0}")]
    Renderable(String),

    /// Drawing was attempted with no texture bound.
    #[error("No color target bound")]
    NoColorTarget,

    /// Drawing was attempted outside `begin_rendering`/`end_rendering`.
    #[error("Render pass not started")]
    NotRendering,

    /// The scratch framebuffer could not be allocated.
    #[error("Failed to allocate {width}×{height} framebuffer")]
    Framebuffer { width: u32, height: u32 },

    #[error("Texture error: {0}")]
    Texture(#[from] TextureError),
}

impl RenderError {
    /// Convenience constructor for renderable implementations.
    pub fn renderable(message: impl Into<String>) -> Self {
        RenderError::Renderable(message.into())
    }
}
