//! The contract between the tile builder and the shapes it composites.

use crate::geo::Sector;
use crate::render::{RenderError, TileDrawContext};
use crate::view::ViewState;

/// Identity and version of a renderable's appearance for one view.
///
/// Two tokens compare equal exactly when the renderable would draw the same
/// pixels. Implementations typically bump `revision` whenever a shape
/// attribute changes and use `context` for view-dependent inputs such as a
/// level of detail or the globe offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateToken {
    pub object_id: u64,
    pub revision: u64,
    pub context: u64,
}

impl StateToken {
    pub const fn new(object_id: u64, revision: u64) -> Self {
        Self {
            object_id,
            revision,
            context: 0,
        }
    }

    pub const fn with_context(mut self, context: u64) -> Self {
        self.context = context;
        self
    }
}

/// A shape that draws onto the globe surface.
///
/// The tile builder calls these operations from a single thread during
/// `build_tiles`; implementations need `Send + Sync` only so that tiles
/// referencing them can live in the shared registry.
pub trait SurfaceRenderable: Send + Sync {
    /// Sectors bounding the shape for this view.
    ///
    /// A shape crossing the antimeridian returns one sector on each side.
    fn sectors(&self, view: &ViewState) -> Vec<Sector>;

    /// Token identifying what the shape would currently draw.
    fn state_key(&self, view: &ViewState) -> StateToken;

    /// Draw the shape into the tile bound to `dc`.
    fn render_into(&self, dc: &mut TileDrawContext<'_>) -> Result<(), RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_equality_is_structural() {
        let a = StateToken::new(7, 1).with_context(3);
        let b = StateToken::new(7, 1).with_context(3);
        let c = StateToken::new(7, 2).with_context(3);
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}
