//! Basic surface shapes.
//!
//! These are small but complete [`SurfaceRenderable`](crate::renderable::SurfaceRenderable)
//! implementations used by the command line tool and the tests. Each shape
//! carries a process-unique id and a revision that is bumped by every
//! attribute change, which together form its state key.

mod polyline;
mod quad;

pub use polyline::SurfacePolyline;
pub use quad::SurfaceQuad;

use std::sync::atomic::{AtomicU64, Ordering};

use tiny_skia::Color;

/// Default fill and stroke colour.
pub const DEFAULT_SHAPE_COLOR: Color = Color::WHITE;

static NEXT_SHAPE_ID: AtomicU64 = AtomicU64::new(1);

fn next_shape_id() -> u64 {
    NEXT_SHAPE_ID.fetch_add(1, Ordering::Relaxed)
}
