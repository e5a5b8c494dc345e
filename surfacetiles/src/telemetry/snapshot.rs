use std::fmt;
use std::time::Duration;

/// Point-in-time copy of [`BuildMetrics`](super::BuildMetrics).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildSnapshot {
    pub frames_built: u64,
    pub frames_skipped: u64,
    pub tiles_assembled: u64,
    pub tiles_updated: u64,
    pub draw_calls: u64,
    pub render_failures: u64,
    pub textures_created: u64,
    pub texture_allocation_failures: u64,
    pub elapsed: Duration,
}

impl BuildSnapshot {
    /// Average tiles per built frame.
    pub fn tiles_per_frame(&self) -> f64 {
        if self.frames_built == 0 {
            0.0
        } else {
            self.tiles_assembled as f64 / self.frames_built as f64
        }
    }

    /// Fraction of assembled tiles that were redrawn.
    pub fn update_ratio(&self) -> f64 {
        if self.tiles_assembled == 0 {
            0.0
        } else {
            self.tiles_updated as f64 / self.tiles_assembled as f64
        }
    }

    /// Counter differences since an earlier snapshot.
    pub fn since(&self, earlier: &BuildSnapshot) -> BuildSnapshot {
        BuildSnapshot {
            frames_built: self.frames_built.saturating_sub(earlier.frames_built),
            frames_skipped: self.frames_skipped.saturating_sub(earlier.frames_skipped),
            tiles_assembled: self.tiles_assembled.saturating_sub(earlier.tiles_assembled),
            tiles_updated: self.tiles_updated.saturating_sub(earlier.tiles_updated),
            draw_calls: self.draw_calls.saturating_sub(earlier.draw_calls),
            render_failures: self.render_failures.saturating_sub(earlier.render_failures),
            textures_created: self.textures_created.saturating_sub(earlier.textures_created),
            texture_allocation_failures: self
                .texture_allocation_failures
                .saturating_sub(earlier.texture_allocation_failures),
            elapsed: self.elapsed.saturating_sub(earlier.elapsed),
        }
    }
}

impl fmt::Display for BuildSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frames={} skipped={} tiles={} updated={} draws={} failures={} textures={}",
            self.frames_built,
            self.frames_skipped,
            self.tiles_assembled,
            self.tiles_updated,
            self.draw_calls,
            self.render_failures + self.texture_allocation_failures,
            self.textures_created
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratios() {
        let s = BuildSnapshot {
            frames_built: 2,
            tiles_assembled: 10,
            tiles_updated: 5,
            ..Default::default()
        };
        assert_eq!(s.tiles_per_frame(), 5.0);
        assert_eq!(s.update_ratio(), 0.5);
        assert_eq!(BuildSnapshot::default().tiles_per_frame(), 0.0);
    }

    #[test]
    fn test_since() {
        let earlier = BuildSnapshot {
            frames_built: 1,
            draw_calls: 4,
            ..Default::default()
        };
        let later = BuildSnapshot {
            frames_built: 3,
            draw_calls: 10,
            ..Default::default()
        };
        let delta = later.since(&earlier);
        assert_eq!(delta.frames_built, 2);
        assert_eq!(delta.draw_calls, 6);
    }
}
