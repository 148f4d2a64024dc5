//! Distance-transform vessel caliber estimation

use imageproc::distance_transform::euclidean_squared_distance_transform;
use vessel_mask::BinaryMask;

use crate::skeleton::Skeleton;

const EPSILON: f64 = 1e-8;

/// Vessel width statistics sampled along the skeleton
#[derive(Debug, Clone, Copy, Default)]
pub struct CaliberFeatures {
    pub avg_vessel_width: f64,
    pub vessel_width_std: f64,
    pub width_cv: f64,
}

/// Estimate vessel widths from the distance transform of the mask
///
/// The transform runs on the inverted mask so each vessel pixel gets
/// its distance to the nearest background pixel; sampling that radius
/// at skeleton pixels and doubling it estimates the local diameter.
pub fn compute(mask: &BinaryMask, skeleton: &Skeleton) -> CaliberFeatures {
    let (height, width) = mask.data().dim();

    let inverted = BinaryMask::new(mask.data().mapv(|v| u8::from(v == 0)));
    let Ok(image) = inverted.to_gray_image() else {
        return CaliberFeatures::default();
    };
    let distances = euclidean_squared_distance_transform(&image);

    // A mask with no background pixels has unbounded distances; the
    // image diagonal caps every sample at a finite width.
    let max_radius = ((width * width + height * height) as f64).sqrt();

    let mut widths = Vec::new();
    for ((row, col), &value) in skeleton.data().indexed_iter() {
        if value == 0 {
            continue;
        }
        let squared = distances.get_pixel(col as u32, row as u32).0[0];
        let sample = 2.0 * squared.sqrt();
        widths.push(if sample.is_finite() {
            sample.min(2.0 * max_radius)
        } else {
            2.0 * max_radius
        });
    }

    if widths.is_empty() {
        return CaliberFeatures::default();
    }

    let n = widths.len() as f64;
    let avg_vessel_width = widths.iter().sum::<f64>() / n;
    let variance = widths
        .iter()
        .map(|w| (w - avg_vessel_width).powi(2))
        .sum::<f64>()
        / n;
    let vessel_width_std = variance.sqrt();

    CaliberFeatures {
        avg_vessel_width,
        vessel_width_std,
        width_cv: vessel_width_std / (avg_vessel_width + EPSILON),
    }
}
