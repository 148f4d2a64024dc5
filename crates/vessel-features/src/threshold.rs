//! Binary threshold selection

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vessel_mask::{BinaryMask, MaskEncoding, ProbabilityMask};

/// Raw cut for pre-scaled grids
const PRESCALED_CUT: f32 = 127.0;

/// Probability cut for continuous grids
///
/// A 0.5 cut systematically loses vessels when the upstream model's
/// confidence ceiling stays below 0.5; 0.3 keeps weak-but-real vessel
/// signal while still suppressing background.
const CONTINUOUS_CUT: f32 = 0.3;

/// Policy for converting probabilities to a binary mask
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdPolicy {
    /// Fixed cut: raw > 127 for pre-scaled grids, > 0.3 for continuous
    #[default]
    Fixed,

    /// Statistics-driven cut for continuous grids:
    /// clamp(mean + 0.3 * stddev, 0.1, 0.5). Pre-scaled grids keep the
    /// raw 127 cut.
    Adaptive,
}

/// Convert a probability mask to a binary vessel mask
pub fn binarize(mask: &ProbabilityMask, policy: ThresholdPolicy) -> BinaryMask {
    let cut = match (mask.encoding(), policy) {
        (MaskEncoding::PreScaled, _) => PRESCALED_CUT,
        (MaskEncoding::Continuous, ThresholdPolicy::Fixed) => CONTINUOUS_CUT,
        (MaskEncoding::Continuous, ThresholdPolicy::Adaptive) => adaptive_cut(mask.data()),
    };
    debug!(encoding = mask.encoding().as_str(), cut, "binarizing mask");
    BinaryMask::new(mask.data().mapv(|v| u8::from(v > cut)))
}

/// Adaptive cut for low-confidence continuous grids
///
/// The 0.5 ceiling keeps the adaptive cut at least as permissive as
/// the legacy hard threshold.
fn adaptive_cut(data: &Array2<f32>) -> f32 {
    let n = data.len() as f64;
    let mean = data.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
    let variance = data
        .iter()
        .map(|&v| {
            let d = f64::from(v) - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    ((mean + 0.3 * variance.sqrt()) as f32).clamp(0.1, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from(values: Array2<f32>) -> ProbabilityMask {
        ProbabilityMask::from_array(values).expect("valid test mask")
    }

    #[test]
    fn test_low_confidence_mask_keeps_vessels() {
        // Maximum value 0.45: a hard 0.5 cut would zero this mask out
        // entirely; the 0.3 cut must keep the vessel pixels.
        let mut data = Array2::<f32>::zeros((32, 32));
        for col in 0..32 {
            data[[16, col]] = 0.45;
        }
        let mask = mask_from(data);
        let binary = binarize(&mask, ThresholdPolicy::Fixed);
        assert_eq!(binary.count_ones(), 32);
    }

    #[test]
    fn test_prescaled_cut_at_127() {
        let mut data = Array2::<f32>::zeros((4, 4));
        data[[0, 0]] = 255.0;
        data[[0, 1]] = 127.0;
        data[[0, 2]] = 128.0;
        let mask = mask_from(data);
        assert_eq!(mask.encoding(), MaskEncoding::PreScaled);

        let binary = binarize(&mask, ThresholdPolicy::Fixed);
        assert_eq!(binary.data()[[0, 0]], 1);
        assert_eq!(binary.data()[[0, 1]], 0);
        assert_eq!(binary.data()[[0, 2]], 1);
    }

    #[test]
    fn test_encoding_scale_invariance() {
        // The same relative pattern in [0,1] and in [0,255] must
        // produce the same binary mask.
        let mut continuous = Array2::<f32>::zeros((8, 8));
        continuous[[2, 2]] = 0.9;
        continuous[[3, 3]] = 0.6;
        continuous[[4, 4]] = 0.1;
        let scaled = continuous.mapv(|v| v * 255.0);

        let a = binarize(&mask_from(continuous), ThresholdPolicy::Fixed);
        let b = binarize(&mask_from(scaled), ThresholdPolicy::Fixed);
        assert_eq!(a, b);
    }

    #[test]
    fn test_adaptive_cut_stays_clamped() {
        let flat = Array2::<f32>::zeros((8, 8));
        assert_eq!(adaptive_cut(&flat), 0.1);

        let bright = Array2::<f32>::ones((8, 8));
        assert_eq!(adaptive_cut(&bright), 0.5);
    }

    #[test]
    fn test_adaptive_policy_keeps_weak_vessels() {
        let mut data = Array2::<f32>::zeros((32, 32));
        for col in 0..32 {
            data[[16, col]] = 0.45;
        }
        let mask = mask_from(data);
        let binary = binarize(&mask, ThresholdPolicy::Adaptive);
        assert!(binary.count_ones() > 0);
    }
}
