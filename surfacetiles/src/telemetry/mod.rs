//! Tile build telemetry.
//!
//! Lock-free atomic counters updated by the tile builder and renderer, with a
//! point-in-time snapshot for display.
//!
//! # Architecture
//!
//! ```text
//! Builder / Renderer ─────► BuildMetrics ─────► BuildSnapshot ─────► Views
//!                           (atomic counters)   (point-in-time copy)  (CLI, etc.)
//! ```
//!
//! # Example
//!
//! ```
//! use surfacetiles::telemetry::BuildMetrics;
//!
//! let metrics = BuildMetrics::new();
//! metrics.frame_built(12);
//! metrics.tile_updated();
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.frames_built, 1);
//! assert_eq!(snapshot.tiles_assembled, 12);
//! ```

mod metrics;
mod snapshot;

pub use metrics::BuildMetrics;
pub use snapshot::BuildSnapshot;
