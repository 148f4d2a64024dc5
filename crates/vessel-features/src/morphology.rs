//! Best-effort morphological mask cleanup

use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, open};
use tracing::warn;
use vessel_mask::{BinaryMask, MaskError};

/// Close-then-open pass with a radius-1 cross kernel
///
/// Closing fills small holes inside vessels, opening removes isolated
/// speckle. The L1 radius-1 element is the 3x3 elliptical kernel.
pub fn clean(mask: &BinaryMask) -> Result<BinaryMask, MaskError> {
    let image = mask.to_gray_image()?;
    let closed = close(&image, Norm::L1, 1);
    let opened = open(&closed, Norm::L1, 1);
    Ok(BinaryMask::from_gray_image(&opened))
}

/// Run cleanup, passing the uncleaned mask through when the backend
/// cannot represent it
///
/// Cleanup is a refinement, never a hard dependency of the pipeline.
pub fn clean_or_passthrough(mask: BinaryMask) -> BinaryMask {
    match clean(&mask) {
        Ok(cleaned) => cleaned,
        Err(err) => {
            warn!(error = %err, "mask cleanup failed, continuing with uncleaned mask");
            mask
        }
    }
}
