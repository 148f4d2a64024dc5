//! Diagnostics Error Types

use thiserror::Error;

/// Errors during mask diagnostics
#[derive(Debug, Error)]
pub enum DiagnosticsError {
    /// Unrecognized rendering mode
    #[error("unknown render mode '{mode}'; choose from: raw, binary, stretched, adaptive")]
    UnknownMode { mode: String },

    /// Mask cannot be converted for rendering
    #[error("mask error: {0}")]
    Mask(#[from] vessel_mask::MaskError),

    /// PNG encoding failed
    #[error("png encoding failed: {0}")]
    Encoding(#[from] image::ImageError),
}
