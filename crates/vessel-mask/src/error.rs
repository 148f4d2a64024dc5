//! Mask Error Types

use thiserror::Error;

/// Errors during mask validation and conversion
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MaskError {
    /// Mask has zero rows or zero columns
    #[error("mask is empty ({height}x{width})")]
    Empty { height: usize, width: usize },

    /// Mask contains a NaN or infinite value
    #[error("non-finite value at ({row}, {col})")]
    NonFinite { row: usize, col: usize },

    /// Value outside every supported encoding
    #[error("value {value} at ({row}, {col}) is outside the supported range [0, {max}]")]
    OutOfRange {
        row: usize,
        col: usize,
        value: f32,
        max: f32,
    },

    /// Dimensions not representable by the u32-indexed pixel backend
    #[error("mask dimensions {width}x{height} exceed the pixel backend limit")]
    TooLarge { width: usize, height: usize },
}
