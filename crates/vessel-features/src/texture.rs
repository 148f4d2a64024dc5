//! Local-window texture variance

use ndarray::Array2;
use vessel_mask::BinaryMask;

/// Side of the uniform averaging window
const WINDOW_SIZE: usize = 15;

/// Mean local variance of the mask under a 15x15 averaging kernel
///
/// Local variance is mean-of-squares minus squared mean per window.
/// Windows are clipped at the image border and normalized by their
/// in-bounds tap count, so a constant mask has exactly zero variance.
pub fn compute(mask: &BinaryMask) -> f64 {
    local_variance_mean(mask.data(), WINDOW_SIZE)
}

fn local_variance_mean(data: &Array2<u8>, window: usize) -> f64 {
    let (height, width) = data.dim();
    if height == 0 || width == 0 {
        return 0.0;
    }
    let radius = window / 2;

    // Summed-area tables for the mask and its square. For a {0,1} grid
    // they coincide, but both are kept so the estimator stays correct
    // for any rescaled input.
    let mut integral = Array2::<f64>::zeros((height + 1, width + 1));
    let mut integral_sq = Array2::<f64>::zeros((height + 1, width + 1));
    for row in 0..height {
        for col in 0..width {
            let value = f64::from(data[[row, col]]);
            integral[[row + 1, col + 1]] = value + integral[[row, col + 1]]
                + integral[[row + 1, col]]
                - integral[[row, col]];
            integral_sq[[row + 1, col + 1]] = value * value + integral_sq[[row, col + 1]]
                + integral_sq[[row + 1, col]]
                - integral_sq[[row, col]];
        }
    }

    let window_sum = |table: &Array2<f64>, r0: usize, r1: usize, c0: usize, c1: usize| {
        table[[r1, c1]] - table[[r0, c1]] - table[[r1, c0]] + table[[r0, c0]]
    };

    let mut total_variance = 0.0;
    for row in 0..height {
        for col in 0..width {
            let r0 = row.saturating_sub(radius);
            let r1 = (row + radius + 1).min(height);
            let c0 = col.saturating_sub(radius);
            let c1 = (col + radius + 1).min(width);
            let taps = ((r1 - r0) * (c1 - c0)) as f64;

            let local_mean = window_sum(&integral, r0, r1, c0, c1) / taps;
            let local_mean_sq = window_sum(&integral_sq, r0, r1, c0, c1) / taps;
            total_variance += (local_mean_sq - local_mean * local_mean).max(0.0);
        }
    }
    total_variance / (height * width) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_constant_masks_have_zero_variance() {
        assert_eq!(compute(&BinaryMask::new(Array2::<u8>::zeros((32, 32)))), 0.0);
        assert_eq!(compute(&BinaryMask::new(Array2::<u8>::ones((32, 32)))), 0.0);
    }

    #[test]
    fn test_checkerboard_has_positive_variance() {
        let data = Array2::from_shape_fn((32, 32), |(row, col)| ((row + col) % 2) as u8);
        let variance = compute(&BinaryMask::new(data));
        assert!(variance > 0.2);
        // A balanced binary window has variance at most 0.25.
        assert!(variance <= 0.25 + 1e-9);
    }

    #[test]
    fn test_sparse_mask_has_low_variance() {
        let mut data = Array2::<u8>::zeros((64, 64));
        data[[32, 32]] = 1;
        let variance = compute(&BinaryMask::new(data));
        assert!(variance > 0.0);
        assert!(variance < 0.01);
    }
}
