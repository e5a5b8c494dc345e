//! SurfaceTiles - Surface object tile building for virtual globes
//!
//! This library composites 2D shapes that lie on the surface of a globe into
//! textured tiles on a geographic quadtree. Tiles are refined only where the
//! view needs the detail, culled against the view, and redrawn only when the
//! shapes drawn into them change.
//!
//! The main entry point is [`builder::SurfaceObjectTileBuilder`]. Builders
//! share level sets and caches through a [`tiling::TilingRegistry`].

pub mod builder;
pub mod config;
pub mod geo;
pub mod render;
pub mod renderable;
pub mod shapes;
pub mod telemetry;
pub mod texture;
pub mod tiling;
pub mod view;

pub use builder::{PickCandidate, SurfaceObjectTileBuilder, SurfaceTile};
pub use renderable::{StateToken, SurfaceRenderable};
pub use tiling::TilingRegistry;
pub use view::ViewState;
