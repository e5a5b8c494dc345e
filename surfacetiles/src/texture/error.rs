//! Error types for tile texture allocation.

use thiserror::Error;

/// Errors that can occur while creating a tile texture.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextureError {
    /// Width or height is zero.
    #[error("Invalid texture dimensions {width}×{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Dimension exceeds the factory's maximum texture size.
    #[error("Texture dimension {dimension} exceeds maximum {max}")]
    TooLarge { dimension: u32, max: u32 },

    /// The backing storage could not be allocated.
    #[error("Failed to allocate {width}×{height} texture: {reason}")]
    AllocationFailed {
        width: u32,
        height: u32,
        reason: String,
    },

    /// Unrecognized texture format name.
    #[error("Unsupported texture format: {0}")]
    UnsupportedFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TextureError::InvalidDimensions {
            width: 0,
            height: 512,
        };
        assert_eq!(err.to_string(), "Invalid texture dimensions 0×512");

        let err = TextureError::TooLarge {
            dimension: 8192,
            max: 4096,
        };
        assert!(err.to_string().contains("8192"));
    }
}
