//! Vessel Mask Core Types
//!
//! Validated probability masks from the upstream segmentation model,
//! binary masks derived from them, and the shared error type.

mod error;
mod mask;

pub use error::MaskError;
pub use mask::{BinaryMask, MaskEncoding, ProbabilityMask, PRESCALED_MAX};
