//! Build tiles for a synthetic scene.
//!
//! Places a ring of quads joined by a polyline around the camera target and
//! builds a number of frames, touching some shapes between frames so that
//! incremental redraws can be observed.

use std::f64::consts::TAU;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use image::ImageFormat;
use surfacetiles::builder::SurfaceObjectTileBuilder;
use surfacetiles::config::ConfigFile;
use surfacetiles::geo::{Globe, LatLon, Sector};
use surfacetiles::renderable::SurfaceRenderable;
use surfacetiles::shapes::{SurfacePolyline, SurfaceQuad};
use surfacetiles::tiling::TilingRegistry;
use surfacetiles::view::{ViewState, Viewport};
use tiny_skia::Color;
use tracing::{debug, info};

use crate::error::CliError;

const METERS_PER_DEGREE: f64 = 111_320.0;

const PALETTE: [(u8, u8, u8); 6] = [
    (230, 57, 70),
    (42, 157, 143),
    (233, 196, 106),
    (69, 123, 157),
    (244, 162, 97),
    (131, 56, 236),
];

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Camera target latitude in degrees
    #[arg(long, default_value_t = 45.0, allow_hyphen_values = true)]
    pub lat: f64,

    /// Camera target longitude in degrees
    #[arg(long, default_value_t = 7.0, allow_hyphen_values = true)]
    pub lon: f64,

    /// Camera altitude above the target in meters
    #[arg(long, default_value_t = 2_000_000.0)]
    pub altitude: f64,

    /// Vertical field of view in degrees
    #[arg(long, default_value_t = 45.0)]
    pub fov: f64,

    /// Viewport width in pixels
    #[arg(long, default_value_t = 1024)]
    pub width: u32,

    /// Viewport height in pixels
    #[arg(long, default_value_t = 768)]
    pub height: u32,

    /// Tile size in pixels (defaults to the configured size)
    #[arg(long)]
    pub tile_size: Option<u32>,

    /// Number of quads placed around the target
    #[arg(long, default_value_t = 8)]
    pub shapes: usize,

    /// Number of frames to build
    #[arg(long, default_value_t = 3)]
    pub frames: u32,

    /// Shapes changed before each frame after the first
    #[arg(long, default_value_t = 1)]
    pub touch: usize,

    /// Write the final tile textures as PNG files to this directory
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Configuration file (defaults to the user configuration)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl BuildArgs {
    fn validate(&self) -> Result<(), CliError> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(CliError::InvalidArgument(format!(
                "latitude {} must be between -90 and 90",
                self.lat
            )));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(CliError::InvalidArgument(format!(
                "longitude {} must be between -180 and 180",
                self.lon
            )));
        }
        if self.altitude.is_nan() || self.altitude <= 0.0 {
            return Err(CliError::InvalidArgument(format!(
                "altitude {} must be positive",
                self.altitude
            )));
        }
        if self.fov <= 0.0 || self.fov >= 180.0 {
            return Err(CliError::InvalidArgument(format!(
                "field of view {} must be between 0 and 180",
                self.fov
            )));
        }
        if self.frames == 0 {
            return Err(CliError::InvalidArgument("frames must be at least 1".into()));
        }
        Ok(())
    }
}

/// Run the build command.
pub fn run(args: BuildArgs) -> Result<(), CliError> {
    args.validate()?;

    let config = match &args.config {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };

    let mut tiles_config = config.tiles;
    if let Some(size) = args.tile_size {
        tiles_config = tiles_config.with_tile_dimension(size, size);
    }

    let registry = Arc::new(TilingRegistry::new(
        config.tiling.level_set_params(),
        &config.cache,
    )?);
    let mut builder = SurfaceObjectTileBuilder::new(Arc::clone(&registry), tiles_config);

    let target = LatLon::from_degrees(args.lat, args.lon);
    let view = ViewState::looking_down(
        Globe::WGS84,
        target,
        args.altitude,
        args.fov,
        Viewport::new(args.width, args.height),
    )
    .ok_or_else(|| CliError::InvalidArgument("cannot build a camera for this view".into()))?;

    let scene = Scene::around(target, args.altitude, args.shapes);
    let renderables = scene.renderables();
    info!(
        target = %target,
        altitude = args.altitude,
        shapes = renderables.len(),
        "Building surface tiles"
    );

    println!("Surface tiles around {} at {:.0} m", target, args.altitude);
    println!("Tile size: {}", builder.compute_tile_dimension(&view));
    println!();

    for frame in 0..args.frames {
        if frame > 0 {
            scene.touch(args.touch);
        }

        let before = builder.metrics().snapshot();
        builder.build_tiles(&view, renderables.iter().cloned());
        let stats = builder.metrics().snapshot().since(&before);

        println!(
            "Frame {}: {} tiles, {} redrawn, {} draw calls, {} new textures",
            frame + 1,
            builder.tile_count(&view),
            stats.tiles_updated,
            stats.draw_calls,
            stats.textures_created
        );
    }

    let totals = builder.metrics().snapshot();
    let cache = registry.texture_cache().stats();
    println!();
    println!("Totals: {}", totals);
    println!(
        "Texture cache: {} textures, {:.1} MiB, hit rate {:.1}%",
        cache.entry_count,
        cache.size_bytes as f64 / (1024.0 * 1024.0),
        cache.hit_rate() * 100.0
    );

    if let Some(dir) = &args.output {
        let written = write_tiles(&builder, &view, dir)?;
        println!("Wrote {} tile images to {}", written, dir.display());
    }

    Ok(())
}

fn write_tiles(
    builder: &SurfaceObjectTileBuilder,
    view: &ViewState,
    dir: &Path,
) -> Result<usize, CliError> {
    fs::create_dir_all(dir)?;

    let mut written = 0;
    for tile in builder.tiles(view) {
        let Some(texture) = tile.texture() else {
            continue;
        };
        let key = tile.key();
        let path = dir.join(format!("{}_{}_{}.png", key.level, key.row, key.column));
        texture
            .to_rgba_image()
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|e| CliError::Output(format!("{}: {}", path.display(), e)))?;
        debug!(tile = %key, path = %path.display(), "Wrote tile image");
        written += 1;
    }
    Ok(written)
}

/// Synthetic shapes placed around a target.
struct Scene {
    quads: Vec<Arc<SurfaceQuad>>,
    outline: Arc<SurfacePolyline>,
}

impl Scene {
    fn around(target: LatLon, altitude: f64, count: usize) -> Self {
        // Roughly a quarter of the ground visible from this altitude.
        let spread = (altitude / METERS_PER_DEGREE * 0.25).clamp(0.05, 20.0);
        let half_size = spread / 6.0;

        let mut centers = Vec::with_capacity(count);
        let mut quads = Vec::with_capacity(count);
        for i in 0..count {
            let angle = TAU * i as f64 / count.max(1) as f64;
            let center = LatLon::from_degrees(
                (target.lat + spread * angle.sin()).clamp(-89.0, 89.0),
                wrap_longitude(target.lon + spread * angle.cos()),
            );
            let (r, g, b) = PALETTE[i % PALETTE.len()];
            quads.push(Arc::new(
                SurfaceQuad::spanning(quad_sectors(center, half_size))
                    .with_color(Color::from_rgba8(r, g, b, 200)),
            ));
            centers.push(center);
        }
        if let Some(first) = centers.first().copied() {
            centers.push(first);
        }

        let outline = Arc::new(
            SurfacePolyline::new(centers)
                .with_color(Color::from_rgba8(255, 255, 255, 255))
                .with_width(3.0),
        );
        Self { quads, outline }
    }

    fn renderables(&self) -> Vec<Arc<dyn SurfaceRenderable>> {
        let mut out: Vec<Arc<dyn SurfaceRenderable>> = self
            .quads
            .iter()
            .map(|q| Arc::clone(q) as Arc<dyn SurfaceRenderable>)
            .collect();
        out.push(Arc::clone(&self.outline) as Arc<dyn SurfaceRenderable>);
        out
    }

    fn touch(&self, count: usize) {
        for quad in self.quads.iter().take(count) {
            quad.touch();
        }
    }
}

fn wrap_longitude(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0
    } else if lon < -180.0 {
        lon + 360.0
    } else {
        lon
    }
}

/// Sectors of a square centered on `center`, split at the antimeridian.
fn quad_sectors(center: LatLon, half_size: f64) -> Vec<Sector> {
    let min_lat = (center.lat - half_size).max(-90.0);
    let max_lat = (center.lat + half_size).min(90.0);
    let west = center.lon - half_size;
    let east = center.lon + half_size;

    if west < -180.0 {
        vec![
            Sector::from_degrees(min_lat, max_lat, -180.0, east),
            Sector::from_degrees(min_lat, max_lat, west + 360.0, 180.0),
        ]
    } else if east > 180.0 {
        vec![
            Sector::from_degrees(min_lat, max_lat, west, 180.0),
            Sector::from_degrees(min_lat, max_lat, -180.0, east - 360.0),
        ]
    } else {
        vec![Sector::from_degrees(min_lat, max_lat, west, east)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surfacetiles::config::TileBuilderConfig;

    #[test]
    fn test_quad_sectors_split_at_antimeridian() {
        let sectors = quad_sectors(LatLon::from_degrees(0.0, 179.5), 1.0);
        assert_eq!(
            sectors,
            vec![
                Sector::from_degrees(-1.0, 1.0, 178.5, 180.0),
                Sector::from_degrees(-1.0, 1.0, -180.0, -179.5),
            ]
        );
        assert_eq!(quad_sectors(LatLon::from_degrees(10.0, 20.0), 1.0).len(), 1);
    }

    #[test]
    fn test_scene_has_quads_and_outline() {
        let scene = Scene::around(LatLon::from_degrees(45.0, 7.0), 1_000_000.0, 5);
        assert_eq!(scene.renderables().len(), 6);
        assert_eq!(scene.outline.locations().len(), 6);
    }

    #[test]
    fn test_touch_bumps_revisions() {
        let scene = Scene::around(LatLon::from_degrees(0.0, 0.0), 500_000.0, 3);
        scene.touch(2);
        let revisions: Vec<u64> = scene.quads.iter().map(|q| q.revision()).collect();
        assert_eq!(revisions, vec![1, 1, 0]);
    }

    #[test]
    fn test_validate_rejects_bad_camera() {
        let args = BuildArgs {
            lat: 95.0,
            lon: 0.0,
            altitude: 1000.0,
            fov: 45.0,
            width: 10,
            height: 10,
            tile_size: None,
            shapes: 1,
            frames: 1,
            touch: 0,
            output: None,
            config: None,
        };
        assert!(matches!(args.validate(), Err(CliError::InvalidArgument(_))));
    }

    #[test]
    fn test_write_tiles_creates_pngs() {
        let registry = Arc::new(TilingRegistry::with_defaults());
        let config = TileBuilderConfig::default().with_tile_dimension(64, 64);
        let mut builder = SurfaceObjectTileBuilder::new(registry, config);
        let view = ViewState::looking_down(
            Globe::WGS84,
            LatLon::from_degrees(45.0, 7.0),
            20_000_000.0,
            45.0,
            Viewport::new(256, 256),
        )
        .unwrap();
        let scene = Scene::around(LatLon::from_degrees(45.0, 7.0), 1_000_000.0, 2);
        builder.build_tiles(&view, scene.renderables());

        let dir = tempfile::TempDir::new().unwrap();
        let written = write_tiles(&builder, &view, dir.path()).unwrap();
        assert_eq!(written, builder.tile_count(&view));
        assert!(written > 0);
    }
}
