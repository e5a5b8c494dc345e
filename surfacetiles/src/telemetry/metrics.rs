use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use super::BuildSnapshot;

/// Counters for tile building.
///
/// All updates use relaxed atomics; a snapshot is a consistent-enough view
/// for reporting, not a synchronization point.
#[derive(Debug)]
pub struct BuildMetrics {
    started_at: Instant,
    frames_built: AtomicU64,
    frames_skipped: AtomicU64,
    tiles_assembled: AtomicU64,
    tiles_updated: AtomicU64,
    draw_calls: AtomicU64,
    render_failures: AtomicU64,
    textures_created: AtomicU64,
    texture_allocation_failures: AtomicU64,
}

impl BuildMetrics {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            frames_built: AtomicU64::new(0),
            frames_skipped: AtomicU64::new(0),
            tiles_assembled: AtomicU64::new(0),
            tiles_updated: AtomicU64::new(0),
            draw_calls: AtomicU64::new(0),
            render_failures: AtomicU64::new(0),
            textures_created: AtomicU64::new(0),
            texture_allocation_failures: AtomicU64::new(0),
        }
    }

    /// A frame produced `tiles` tiles.
    pub fn frame_built(&self, tiles: usize) {
        self.frames_built.fetch_add(1, Ordering::Relaxed);
        self.tiles_assembled
            .fetch_add(tiles as u64, Ordering::Relaxed);
    }

    /// A frame returned early without assembling tiles.
    pub fn frame_skipped(&self) {
        self.frames_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn tile_updated(&self) {
        self.tiles_updated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn draw_call(&self) {
        self.draw_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn render_failed(&self) {
        self.render_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn texture_created(&self) {
        self.textures_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn texture_allocation_failed(&self) {
        self.texture_allocation_failures
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> BuildSnapshot {
        BuildSnapshot {
            frames_built: self.frames_built.load(Ordering::Relaxed),
            frames_skipped: self.frames_skipped.load(Ordering::Relaxed),
            tiles_assembled: self.tiles_assembled.load(Ordering::Relaxed),
            tiles_updated: self.tiles_updated.load(Ordering::Relaxed),
            draw_calls: self.draw_calls.load(Ordering::Relaxed),
            render_failures: self.render_failures.load(Ordering::Relaxed),
            textures_created: self.textures_created.load(Ordering::Relaxed),
            texture_allocation_failures: self.texture_allocation_failures.load(Ordering::Relaxed),
            elapsed: self.started_at.elapsed(),
        }
    }
}

impl Default for BuildMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = BuildMetrics::new();
        metrics.frame_built(3);
        metrics.frame_built(2);
        metrics.frame_skipped();
        metrics.tile_updated();
        metrics.draw_call();
        metrics.draw_call();
        metrics.render_failed();
        metrics.texture_created();
        metrics.texture_allocation_failed();

        let s = metrics.snapshot();
        assert_eq!(s.frames_built, 2);
        assert_eq!(s.frames_skipped, 1);
        assert_eq!(s.tiles_assembled, 5);
        assert_eq!(s.tiles_updated, 1);
        assert_eq!(s.draw_calls, 2);
        assert_eq!(s.render_failures, 1);
        assert_eq!(s.textures_created, 1);
        assert_eq!(s.texture_allocation_failures, 1);
    }
}
