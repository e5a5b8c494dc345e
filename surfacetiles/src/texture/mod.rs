//! Tile textures and their factory.
//!
//! Textures are CPU raster surfaces (premultiplied RGBA [`tiny_skia::Pixmap`]s)
//! with an optional mip chain. The pixel format only describes what the
//! texture can *store*: channels a format lacks are normalized away when the
//! render target is flushed, and the memory estimate used by the texture
//! cache is computed from the format's bytes per pixel.
//!
//! Textures are created through the [`TextureFactory`] trait so that callers
//! can substitute their own allocation policy.

mod cache;
mod error;

pub use cache::{TextureCacheStats, TileTextureCache, DEFAULT_TEXTURE_CACHE_BYTES};
pub use error::TextureError;

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tiny_skia::{
    ColorU8, FilterQuality, Pixmap, PixmapPaint, PremultipliedColorU8, Transform,
};

/// Default maximum texture width or height accepted by [`RasterTextureFactory`].
pub const DEFAULT_MAX_TEXTURE_DIMENSION: u32 = 4096;

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

/// Pixel storage format of a tile texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    /// 8-bit RGBA.
    #[default]
    Rgba8,
    /// 8-bit RGB, opaque.
    Rgb8,
    /// Unsized RGBA.
    Rgba,
    /// Unsized RGB, opaque.
    Rgb,
    /// Single 8-bit luminance channel, opaque.
    Luminance8,
    /// 8-bit luminance plus alpha.
    LuminanceAlpha8,
    /// Alpha only.
    Alpha8,
}

impl TextureFormat {
    /// Whether tiles in this format can be drawn directly into the texture.
    ///
    /// Other formats are drawn into a scratch framebuffer and copied.
    pub fn supports_direct_rendering(&self) -> bool {
        matches!(
            self,
            TextureFormat::Rgba8 | TextureFormat::Rgb8 | TextureFormat::Rgba | TextureFormat::Rgb
        )
    }

    pub fn bytes_per_pixel(&self) -> u64 {
        match self {
            TextureFormat::Rgba8 | TextureFormat::Rgba => 4,
            TextureFormat::Rgb8 | TextureFormat::Rgb => 3,
            TextureFormat::LuminanceAlpha8 => 2,
            TextureFormat::Luminance8 | TextureFormat::Alpha8 => 1,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TextureFormat::Rgba8 => "rgba8",
            TextureFormat::Rgb8 => "rgb8",
            TextureFormat::Rgba => "rgba",
            TextureFormat::Rgb => "rgb",
            TextureFormat::Luminance8 => "luminance8",
            TextureFormat::LuminanceAlpha8 => "luminance_alpha8",
            TextureFormat::Alpha8 => "alpha8",
        }
    }

    /// Map a color to what this format can hold.
    fn store(&self, color: ColorU8) -> ColorU8 {
        let luma = || {
            (0.299 * color.red() as f32 + 0.587 * color.green() as f32 + 0.114 * color.blue() as f32)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        match self {
            TextureFormat::Rgba8 | TextureFormat::Rgba => color,
            TextureFormat::Rgb8 | TextureFormat::Rgb => {
                ColorU8::from_rgba(color.red(), color.green(), color.blue(), 255)
            }
            TextureFormat::Luminance8 => {
                let l = luma();
                ColorU8::from_rgba(l, l, l, 255)
            }
            TextureFormat::LuminanceAlpha8 => {
                let l = luma();
                ColorU8::from_rgba(l, l, l, color.alpha())
            }
            TextureFormat::Alpha8 => ColorU8::from_rgba(0, 0, 0, color.alpha()),
        }
    }

    /// Normalize every pixel to the channels this format stores.
    pub(crate) fn normalize(&self, pixmap: &mut Pixmap) {
        if matches!(self, TextureFormat::Rgba8 | TextureFormat::Rgba) {
            return;
        }
        for pixel in pixmap.pixels_mut() {
            *pixel = self.store(pixel.demultiply()).premultiply();
        }
    }
}

impl fmt::Display for TextureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TextureFormat {
    type Err = TextureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rgba8" => Ok(TextureFormat::Rgba8),
            "rgb8" => Ok(TextureFormat::Rgb8),
            "rgba" => Ok(TextureFormat::Rgba),
            "rgb" => Ok(TextureFormat::Rgb),
            "luminance8" => Ok(TextureFormat::Luminance8),
            "luminance_alpha8" => Ok(TextureFormat::LuminanceAlpha8),
            "alpha8" => Ok(TextureFormat::Alpha8),
            other => Err(TextureError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Texture sampling filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFilter {
    Nearest,
    Linear,
    LinearMipmapLinear,
}

/// Everything needed to allocate a tile texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureParams {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub linear_filter: bool,
    pub mipmaps: bool,
}

/// Number of mip levels in a full chain down to 1×1.
fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// A raster tile texture with an optional mip chain.
pub struct TileTexture {
    id: u64,
    params: TextureParams,
    levels: RwLock<Vec<Pixmap>>,
}

impl TileTexture {
    /// Allocate a transparent texture.
    pub fn new(params: TextureParams) -> Result<Self, TextureError> {
        if params.width == 0 || params.height == 0 {
            return Err(TextureError::InvalidDimensions {
                width: params.width,
                height: params.height,
            });
        }

        let count = if params.mipmaps {
            mip_level_count(params.width, params.height)
        } else {
            1
        };

        let mut levels = Vec::with_capacity(count as usize);
        let (mut w, mut h) = (params.width, params.height);
        for _ in 0..count {
            let pixmap = Pixmap::new(w, h).ok_or_else(|| TextureError::AllocationFailed {
                width: w,
                height: h,
                reason: "pixmap allocation failed".to_string(),
            })?;
            levels.push(pixmap);
            w = (w / 2).max(1);
            h = (h / 2).max(1);
        }

        Ok(Self {
            id: NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed),
            params,
            levels: RwLock::new(levels),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn params(&self) -> &TextureParams {
        &self.params
    }

    pub fn width(&self) -> u32 {
        self.params.width
    }

    pub fn height(&self) -> u32 {
        self.params.height
    }

    pub fn format(&self) -> TextureFormat {
        self.params.format
    }

    pub fn has_mipmaps(&self) -> bool {
        self.params.mipmaps
    }

    pub fn mip_level_count(&self) -> usize {
        self.levels.read().len()
    }

    pub fn min_filter(&self) -> TextureFilter {
        match (self.params.linear_filter, self.params.mipmaps) {
            (true, true) => TextureFilter::LinearMipmapLinear,
            (true, false) => TextureFilter::Linear,
            (false, _) => TextureFilter::Nearest,
        }
    }

    pub fn mag_filter(&self) -> TextureFilter {
        if self.params.linear_filter {
            TextureFilter::Linear
        } else {
            TextureFilter::Nearest
        }
    }

    /// Estimated size in bytes of the texture in its declared format.
    ///
    /// A full mip chain adds roughly one third to the base level.
    pub fn estimated_memory_size(&self) -> u64 {
        let base =
            self.params.width as u64 * self.params.height as u64 * self.params.format.bytes_per_pixel();
        if self.params.mipmaps {
            base * 4 / 3
        } else {
            base
        }
    }

    /// Run `f` with mutable access to the base level.
    pub(crate) fn with_base_level_mut<R>(&self, f: impl FnOnce(&mut Pixmap) -> R) -> R {
        let mut levels = self.levels.write();
        f(&mut levels[0])
    }

    /// Replace the base level's pixels with `source`.
    ///
    /// Sizes that differ are scaled to fit.
    pub(crate) fn copy_from(&self, source: &Pixmap) {
        self.with_base_level_mut(|base| {
            if base.width() == source.width() && base.height() == source.height() {
                base.data_mut().copy_from_slice(source.data());
            } else {
                base.fill(tiny_skia::Color::TRANSPARENT);
                let transform = Transform::from_scale(
                    base.width() as f32 / source.width() as f32,
                    base.height() as f32 / source.height() as f32,
                );
                base.draw_pixmap(0, 0, source.as_ref(), &copy_paint(), transform, None);
            }
        });
    }

    /// Finish a render pass: normalize the base level to the texture format
    /// and rebuild the mip chain from it.
    pub(crate) fn finish_update(&self) {
        let mut levels = self.levels.write();
        self.params.format.normalize(&mut levels[0]);

        for i in 1..levels.len() {
            let (finer, coarser) = levels.split_at_mut(i);
            let source = &finer[i - 1];
            let target = &mut coarser[0];
            target.fill(tiny_skia::Color::TRANSPARENT);
            let transform = Transform::from_scale(
                target.width() as f32 / source.width() as f32,
                target.height() as f32 / source.height() as f32,
            );
            target.draw_pixmap(0, 0, source.as_ref(), &copy_paint(), transform, None);
        }
    }

    /// Premultiplied pixel at `(x, y)` of mip level `level`.
    pub fn pixel(&self, level: usize, x: u32, y: u32) -> Option<PremultipliedColorU8> {
        self.levels.read().get(level)?.pixel(x, y)
    }

    /// Copy of the base level as a straight-alpha RGBA image.
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        let levels = self.levels.read();
        let base = &levels[0];
        image::RgbaImage::from_fn(base.width(), base.height(), |x, y| {
            base.pixel(x, y)
                .map(|p| {
                    let c = p.demultiply();
                    image::Rgba([c.red(), c.green(), c.blue(), c.alpha()])
                })
                .unwrap_or(image::Rgba([0, 0, 0, 0]))
        })
    }
}

impl fmt::Debug for TileTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileTexture")
            .field("id", &self.id)
            .field("params", &self.params)
            .finish()
    }
}

fn copy_paint() -> PixmapPaint {
    PixmapPaint {
        quality: FilterQuality::Bilinear,
        blend_mode: tiny_skia::BlendMode::Source,
        ..PixmapPaint::default()
    }
}

/// Creates tile textures.
pub trait TextureFactory: Send + Sync {
    fn create_texture(&self, params: &TextureParams) -> Result<TileTexture, TextureError>;
}

/// Default factory allocating raster textures up to a maximum dimension.
#[derive(Debug, Clone)]
pub struct RasterTextureFactory {
    max_dimension: u32,
}

impl RasterTextureFactory {
    pub fn new(max_dimension: u32) -> Self {
        Self { max_dimension }
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }
}

impl Default for RasterTextureFactory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TEXTURE_DIMENSION)
    }
}

impl TextureFactory for RasterTextureFactory {
    fn create_texture(&self, params: &TextureParams) -> Result<TileTexture, TextureError> {
        let dimension = params.width.max(params.height);
        if dimension > self.max_dimension {
            return Err(TextureError::TooLarge {
                dimension,
                max: self.max_dimension,
            });
        }
        TileTexture::new(*params)
    }
}
