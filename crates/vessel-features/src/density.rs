//! Density and spatial-uniformity features

use ndarray::{s, Array2};
use vessel_mask::BinaryMask;

const EPSILON: f64 = 1e-8;

/// Density features over the cleaned binary mask
#[derive(Debug, Clone, Copy, Default)]
pub struct DensityFeatures {
    pub vessel_density: f64,
    pub peripheral_density: f64,
    pub density_gradient: f64,
    pub spatial_uniformity: f64,
}

/// Compute overall, central/peripheral, and quadrant densities
pub fn compute(mask: &BinaryMask) -> DensityFeatures {
    let data = mask.data();
    let (height, width) = data.dim();

    let vessel_density = mask.vessel_ratio();

    // Central region: within min(H,W)/3 of the image center.
    let center_row = (height / 2) as f64;
    let center_col = (width / 2) as f64;
    let radius = (height.min(width) / 3) as f64;

    let mut central_sum = 0.0;
    let mut central_count = 0usize;
    let mut peripheral_sum = 0.0;
    let mut peripheral_count = 0usize;
    for ((row, col), &value) in data.indexed_iter() {
        let dr = row as f64 - center_row;
        let dc = col as f64 - center_col;
        if (dr * dr + dc * dc).sqrt() <= radius {
            central_sum += f64::from(value);
            central_count += 1;
        } else {
            peripheral_sum += f64::from(value);
            peripheral_count += 1;
        }
    }

    let peripheral_density = if peripheral_count > 0 {
        peripheral_sum / peripheral_count as f64
    } else {
        0.0
    };
    let central_density = if central_count > 0 {
        central_sum / central_count as f64
    } else {
        0.0
    };
    let density_gradient = if central_density > 0.0 {
        peripheral_density / central_density
    } else {
        0.0
    };

    // Quadrant split at the midpoint row/column.
    let row_mid = height / 2;
    let col_mid = width / 2;
    let quadrants = [
        region_mean(data, 0, row_mid, 0, col_mid),
        region_mean(data, 0, row_mid, col_mid, width),
        region_mean(data, row_mid, height, 0, col_mid),
        region_mean(data, row_mid, height, col_mid, width),
    ];
    let quadrant_mean = quadrants.iter().sum::<f64>() / 4.0;
    let spatial_uniformity = if quadrant_mean > 0.0 {
        let variance = quadrants
            .iter()
            .map(|q| (q - quadrant_mean).powi(2))
            .sum::<f64>()
            / 4.0;
        1.0 - variance.sqrt() / (quadrant_mean + EPSILON)
    } else {
        0.0
    };

    DensityFeatures {
        vessel_density,
        peripheral_density,
        density_gradient,
        spatial_uniformity,
    }
}

fn region_mean(data: &Array2<u8>, row0: usize, row1: usize, col0: usize, col1: usize) -> f64 {
    let view = data.slice(s![row0..row1, col0..col1]);
    if view.is_empty() {
        return 0.0;
    }
    view.iter().map(|&v| f64::from(v)).sum::<f64>() / view.len() as f64
}
