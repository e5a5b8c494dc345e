use std::fmt;

/// Identifies the tile namespace owned by one builder/tile-size pair.
///
/// Two builders that share a level set still write textures under different
/// namespaces, so they never observe each other's tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheNamespace(pub u64);

impl fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ns{}", self.0)
    }
}

/// Pixel dimensions of the tiles in a level set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileDimension {
    pub width: u32,
    pub height: u32,
}

impl TileDimension {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn square(size: u32) -> Self {
        Self::new(size, size)
    }
}

impl fmt::Display for TileDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Cache key of a tile: its quadtree address plus the owning namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    pub level: u32,
    pub row: i32,
    pub column: i32,
    pub namespace: CacheNamespace,
}

impl TileKey {
    pub const fn new(level: u32, row: i32, column: i32, namespace: CacheNamespace) -> Self {
        Self {
            level,
            row,
            column,
            namespace,
        }
    }

    /// Keys of the four children in SW, SE, NW, NE order.
    pub fn children(&self) -> [TileKey; 4] {
        let level = self.level + 1;
        let row = 2 * self.row;
        let column = 2 * self.column;
        [
            TileKey::new(level, row, column, self.namespace),
            TileKey::new(level, row, column + 1, self.namespace),
            TileKey::new(level, row + 1, column, self.namespace),
            TileKey::new(level, row + 1, column + 1, self.namespace),
        ]
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}@{}",
            self.level, self.row, self.column, self.namespace
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_order() {
        let key = TileKey::new(3, 5, 7, CacheNamespace(1));
        let children = key.children();
        assert_eq!(children[0], TileKey::new(4, 10, 14, CacheNamespace(1)));
        assert_eq!(children[1], TileKey::new(4, 10, 15, CacheNamespace(1)));
        assert_eq!(children[2], TileKey::new(4, 11, 14, CacheNamespace(1)));
        assert_eq!(children[3], TileKey::new(4, 11, 15, CacheNamespace(1)));
    }

    #[test]
    fn test_namespace_distinguishes_keys() {
        let a = TileKey::new(0, 0, 0, CacheNamespace(1));
        let b = TileKey::new(0, 0, 0, CacheNamespace(2));
        assert_ne!(a, b);
    }

    #[test]
    fn test_display() {
        let key = TileKey::new(2, 3, 4, CacheNamespace(9));
        assert_eq!(key.to_string(), "2/3/4@ns9");
    }
}
