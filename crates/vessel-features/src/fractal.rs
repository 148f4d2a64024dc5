//! Box-counting fractal dimension

use ndarray::{s, Array2};
use vessel_mask::BinaryMask;

/// Box sizes in increasing order
const BOX_SIZES: [usize; 5] = [4, 8, 16, 32, 64];

/// Minimum number of (size, count) pairs for a meaningful fit
const MIN_SERIES_LEN: usize = 3;

/// Estimate the box-counting fractal dimension of the mask
///
/// Tiles the mask with non-overlapping boxes (edge-partial boxes
/// included) and fits ln(count) against ln(size); the dimension is the
/// negated slope. Short or degenerate series default to 0.0.
pub fn compute(mask: &BinaryMask) -> f64 {
    let data = mask.data();

    let mut log_sizes = Vec::new();
    let mut log_counts = Vec::new();
    for &size in &BOX_SIZES {
        let count = box_count(data, size);
        if count == 0 {
            // Larger boxes can only cover fewer occupied cells.
            break;
        }
        log_sizes.push((size as f64).ln());
        log_counts.push((count as f64).ln());
    }

    if log_counts.len() < MIN_SERIES_LEN {
        return 0.0;
    }

    let dimension = -slope(&log_sizes, &log_counts);
    if dimension.is_finite() {
        dimension
    } else {
        0.0
    }
}

/// Count boxes of the given size containing at least one vessel pixel
fn box_count(data: &Array2<u8>, size: usize) -> usize {
    let (height, width) = data.dim();
    let mut count = 0;
    let mut row = 0;
    while row < height {
        let row_end = (row + size).min(height);
        let mut col = 0;
        while col < width {
            let col_end = (col + size).min(width);
            if data
                .slice(s![row..row_end, col..col_end])
                .iter()
                .any(|&v| v != 0)
            {
                count += 1;
            }
            col += size;
        }
        row += size;
    }
    count
}

/// Least-squares slope of ys against xs
fn slope(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        numerator += (x - mean_x) * (y - mean_y);
        denominator += (x - mean_x) * (x - mean_x);
    }
    numerator / denominator
}
