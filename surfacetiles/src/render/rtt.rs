//! Offscreen render target that draws into tile textures.
//!
//! In direct mode drawing goes straight into the bound texture's base level.
//! Otherwise drawing goes into a scratch framebuffer the size of the draw
//! region, which is copied into the texture when the target is flushed.
//! Either way, flushing finishes the texture: its pixels are normalized to
//! the texture format and the mip chain is rebuilt.

use std::sync::Arc;

use tiny_skia::{Color, Pixmap};
use tracing::trace;

use crate::texture::TileTexture;

use super::RenderError;

/// Render-to-texture state for one pass over a set of tiles.
pub struct RenderToTexture {
    direct_rendering_enabled: bool,
    draw_region: Option<(u32, u32)>,
    color_target: Option<Arc<TileTexture>>,
    framebuffer: Option<Pixmap>,
}

impl RenderToTexture {
    pub fn new() -> Self {
        Self {
            direct_rendering_enabled: true,
            draw_region: None,
            color_target: None,
            framebuffer: None,
        }
    }

    pub fn is_direct_rendering_enabled(&self) -> bool {
        self.direct_rendering_enabled
    }

    /// Takes effect at the next `begin_rendering`.
    pub fn set_direct_rendering_enabled(&mut self, enabled: bool) {
        self.direct_rendering_enabled = enabled;
    }

    pub fn is_rendering(&self) -> bool {
        self.draw_region.is_some()
    }

    /// Start a pass drawing `width × height` pixel regions.
    pub fn begin_rendering(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if self.direct_rendering_enabled {
            self.framebuffer = None;
        } else {
            let reusable = self
                .framebuffer
                .as_ref()
                .is_some_and(|fb| fb.width() == width && fb.height() == height);
            if !reusable {
                self.framebuffer = Some(
                    Pixmap::new(width, height)
                        .ok_or(RenderError::Framebuffer { width, height })?,
                );
            }
        }

        trace!(width, height, direct = self.direct_rendering_enabled, "Begin rendering");
        self.draw_region = Some((width, height));
        Ok(())
    }

    /// Bind `texture` as the draw target, flushing the previous target.
    pub fn set_color_target(&mut self, texture: Option<Arc<TileTexture>>) {
        let unchanged = match (&self.color_target, &texture) {
            (Some(current), Some(next)) => Arc::ptr_eq(current, next),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }

        self.flush();
        self.color_target = texture;
    }

    pub fn color_target(&self) -> Option<&Arc<TileTexture>> {
        self.color_target.as_ref()
    }

    /// Fill the draw region of the bound target with `color`.
    pub fn clear(&mut self, color: Color) {
        let Some(target) = &self.color_target else {
            return;
        };

        if self.direct_rendering_enabled {
            target.with_base_level_mut(|pixmap| pixmap.fill(color));
        } else if let Some(framebuffer) = self.framebuffer.as_mut() {
            framebuffer.fill(color);
        }
    }

    /// Run `f` against the pixmap currently being drawn into.
    pub fn draw<R>(&mut self, f: impl FnOnce(&mut Pixmap) -> R) -> Result<R, RenderError> {
        let target = self.color_target.as_ref().ok_or(RenderError::NoColorTarget)?;

        if self.direct_rendering_enabled {
            Ok(target.with_base_level_mut(f))
        } else {
            let framebuffer = self.framebuffer.as_mut().ok_or(RenderError::NotRendering)?;
            Ok(f(framebuffer))
        }
    }

    /// Finish drawing into the bound target.
    pub fn flush(&mut self) {
        let Some(target) = &self.color_target else {
            return;
        };

        if !self.direct_rendering_enabled {
            if let Some(framebuffer) = &self.framebuffer {
                target.copy_from(framebuffer);
            }
        }
        target.finish_update();
    }

    /// End the pass, flushing and unbinding the current target.
    pub fn end_rendering(&mut self) {
        self.flush();
        self.color_target = None;
        self.draw_region = None;
        trace!("End rendering");
    }
}

impl Default for RenderToTexture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::{TextureFormat, TextureParams};

    fn texture(format: TextureFormat) -> Arc<TileTexture> {
        Arc::new(
            TileTexture::new(TextureParams {
                width: 8,
                height: 8,
                format,
                linear_filter: true,
                mipmaps: true,
            })
            .unwrap(),
        )
    }

    fn fill_red(rtt: &mut RenderToTexture) {
        rtt.draw(|pixmap| pixmap.fill(Color::from_rgba8(255, 0, 0, 255)))
            .unwrap();
    }

    #[test]
    fn test_direct_mode_draws_into_texture() {
        let target = texture(TextureFormat::Rgba8);
        let mut rtt = RenderToTexture::new();
        rtt.begin_rendering(8, 8).unwrap();
        rtt.set_color_target(Some(Arc::clone(&target)));
        rtt.clear(Color::TRANSPARENT);
        fill_red(&mut rtt);

        // Visible before flushing: drawing went straight into the base level.
        assert_eq!(target.pixel(0, 4, 4).unwrap().red(), 255);

        rtt.end_rendering();
        assert!(!rtt.is_rendering());
        assert_eq!(target.pixel(3, 0, 0).unwrap().red(), 255);
    }

    #[test]
    fn test_copy_mode_copies_on_flush() {
        let target = texture(TextureFormat::Rgba8);
        let mut rtt = RenderToTexture::new();
        rtt.set_direct_rendering_enabled(false);
        rtt.begin_rendering(8, 8).unwrap();
        rtt.set_color_target(Some(Arc::clone(&target)));
        rtt.clear(Color::TRANSPARENT);
        fill_red(&mut rtt);

        assert_eq!(target.pixel(0, 4, 4).unwrap().alpha(), 0);

        rtt.set_color_target(None);
        assert_eq!(target.pixel(0, 4, 4).unwrap().red(), 255);
        rtt.end_rendering();
    }

    #[test]
    fn test_switching_targets_flushes_previous() {
        let first = texture(TextureFormat::Rgba8);
        let second = texture(TextureFormat::Rgba8);
        let mut rtt = RenderToTexture::new();
        rtt.set_direct_rendering_enabled(false);
        rtt.begin_rendering(8, 8).unwrap();

        rtt.set_color_target(Some(Arc::clone(&first)));
        rtt.clear(Color::TRANSPARENT);
        fill_red(&mut rtt);

        rtt.set_color_target(Some(Arc::clone(&second)));
        rtt.clear(Color::TRANSPARENT);
        rtt.end_rendering();

        assert_eq!(first.pixel(0, 1, 1).unwrap().red(), 255);
        assert_eq!(second.pixel(0, 1, 1).unwrap().alpha(), 0);
    }

    #[test]
    fn test_draw_without_target_fails() {
        let mut rtt = RenderToTexture::new();
        rtt.begin_rendering(8, 8).unwrap();
        assert!(matches!(rtt.draw(|_| ()), Err(RenderError::NoColorTarget)));
    }

    #[test]
    fn test_copy_mode_normalizes_format() {
        let target = texture(TextureFormat::Alpha8);
        let mut rtt = RenderToTexture::new();
        rtt.set_direct_rendering_enabled(false);
        rtt.begin_rendering(8, 8).unwrap();
        rtt.set_color_target(Some(Arc::clone(&target)));
        fill_red(&mut rtt);
        rtt.end_rendering();

        let pixel = target.pixel(0, 2, 2).unwrap();
        assert_eq!(pixel.red(), 0);
        assert_eq!(pixel.alpha(), 255);
    }
}
