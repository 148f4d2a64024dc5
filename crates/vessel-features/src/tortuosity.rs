//! Per-segment principal-axis tortuosity

use crate::skeleton::Skeleton;

/// Labels beyond this bound are not processed
const MAX_SEGMENTS: u32 = 30;

/// Minimum pixels for a measurable segment
const MIN_SEGMENT_PIXELS: usize = 20;

/// Minimum coordinate samples for a covariance estimate
const MIN_COORD_SAMPLES: usize = 3;

/// Chords at or below this length are too short or curled to measure
const MIN_CHORD_LENGTH: f64 = 10.0;

const SINGULAR_EPS: f64 = 1e-12;

/// Tortuosity features over retained skeleton segments
#[derive(Debug, Clone, Copy, Default)]
pub struct TortuosityFeatures {
    pub avg_tortuosity: f64,
    pub max_tortuosity: f64,
}

/// Measure arc-to-chord excess per skeleton segment
pub fn compute(skeleton: &Skeleton) -> TortuosityFeatures {
    let (labels, count) = skeleton.label_components();

    let mut tortuosities = Vec::new();
    for label in 1..=count.min(MAX_SEGMENTS) {
        let coords: Vec<(f64, f64)> = labels
            .indexed_iter()
            .filter(|&(_, &l)| l == label)
            .map(|((row, col), _)| (col as f64, row as f64))
            .collect();
        if let Some(tortuosity) = segment_tortuosity(&coords) {
            tortuosities.push(tortuosity);
        }
    }

    if tortuosities.is_empty() {
        return TortuosityFeatures::default();
    }
    TortuosityFeatures {
        avg_tortuosity: tortuosities.iter().sum::<f64>() / tortuosities.len() as f64,
        max_tortuosity: tortuosities.iter().cloned().fold(f64::MIN, f64::max),
    }
}

/// Arc-to-chord excess for one segment's pixel coordinates
///
/// Returns `None` for segments too small, too short, or numerically
/// singular to measure; a skipped segment never fails the analysis.
fn segment_tortuosity(coords: &[(f64, f64)]) -> Option<f64> {
    if coords.len() < MIN_SEGMENT_PIXELS || coords.len() < MIN_COORD_SAMPLES {
        return None;
    }

    let n = coords.len() as f64;
    let mean_x = coords.iter().map(|c| c.0).sum::<f64>() / n;
    let mean_y = coords.iter().map(|c| c.1).sum::<f64>() / n;

    // 2x2 covariance of the centered coordinates (n-1 denominator).
    let mut cxx = 0.0;
    let mut cxy = 0.0;
    let mut cyy = 0.0;
    for &(x, y) in coords {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cxx += dx * dx;
        cxy += dx * dy;
        cyy += dy * dy;
    }
    let denom = n - 1.0;
    cxx /= denom;
    cxy /= denom;
    cyy /= denom;

    let (axis_x, axis_y) = principal_axis(cxx, cxy, cyy)?;

    let mut min_projection = f64::INFINITY;
    let mut max_projection = f64::NEG_INFINITY;
    for &(x, y) in coords {
        let projection = (x - mean_x) * axis_x + (y - mean_y) * axis_y;
        min_projection = min_projection.min(projection);
        max_projection = max_projection.max(projection);
    }

    let chord_length = max_projection - min_projection;
    if chord_length <= MIN_CHORD_LENGTH {
        return None;
    }

    // Arc length is never shorter than the chord; negative excess is
    // measurement noise and zeroed.
    Some((n / chord_length - 1.0).max(0.0))
}

/// Unit eigenvector of the largest eigenvalue of [[cxx, cxy], [cxy, cyy]]
fn principal_axis(cxx: f64, cxy: f64, cyy: f64) -> Option<(f64, f64)> {
    let trace_half = (cxx + cyy) / 2.0;
    let diff_half = (cxx - cyy) / 2.0;
    let discriminant = (diff_half * diff_half + cxy * cxy).sqrt();
    let lambda = trace_half + discriminant;
    if !lambda.is_finite() || lambda <= SINGULAR_EPS {
        return None;
    }

    let (vx, vy) = if cxy.abs() > SINGULAR_EPS {
        (lambda - cyy, cxy)
    } else if cxx >= cyy {
        (1.0, 0.0)
    } else {
        (0.0, 1.0)
    };
    let norm = (vx * vx + vy * vy).sqrt();
    if norm <= SINGULAR_EPS {
        return None;
    }
    Some((vx / norm, vy / norm))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use vessel_mask::BinaryMask;

    fn skeleton_from(data: Array2<u8>) -> Skeleton {
        Skeleton::thin(&BinaryMask::new(data))
    }

    #[test]
    fn test_straight_line_has_near_zero_tortuosity() {
        let mut data = Array2::<u8>::zeros((9, 40));
        for col in 0..40 {
            data[[4, col]] = 1;
        }
        let features = compute(&skeleton_from(data));
        // 40 pixels over a 39-pixel chord.
        assert!(features.avg_tortuosity < 0.05);
        assert!(features.max_tortuosity < 0.05);
    }

    #[test]
    fn test_diagonal_line_clamps_to_zero() {
        // A 45-degree line has a chord longer than its pixel count;
        // the negative excess must clamp to zero.
        let mut data = Array2::<u8>::zeros((40, 40));
        for i in 0..40 {
            data[[i, i]] = 1;
        }
        let features = compute(&skeleton_from(data));
        assert_eq!(features.avg_tortuosity, 0.0);
        assert_eq!(features.max_tortuosity, 0.0);
    }

    #[test]
    fn test_bent_segment_is_more_tortuous_than_straight() {
        let mut data = Array2::<u8>::zeros((40, 40));
        // L-shaped path: 25 pixels right, then 25 down.
        for col in 5..30 {
            data[[5, col]] = 1;
        }
        for row in 5..30 {
            data[[row, 29]] = 1;
        }
        let bent = compute(&skeleton_from(data));
        assert!(bent.avg_tortuosity > 0.0);
        assert!(bent.max_tortuosity >= bent.avg_tortuosity);
    }

    #[test]
    fn test_short_segments_are_skipped() {
        // 8 pixels: below the 20-pixel floor.
        let mut data = Array2::<u8>::zeros((9, 12));
        for col in 2..10 {
            data[[4, col]] = 1;
        }
        let features = compute(&skeleton_from(data));
        assert_eq!(features.avg_tortuosity, 0.0);
        assert_eq!(features.max_tortuosity, 0.0);
    }

    #[test]
    fn test_empty_skeleton_defaults() {
        let features = compute(&skeleton_from(Array2::<u8>::zeros((10, 10))));
        assert_eq!(features.avg_tortuosity, 0.0);
        assert_eq!(features.max_tortuosity, 0.0);
    }

    #[test]
    fn test_singular_covariance_is_skipped() {
        // 25 coincident samples: zero covariance, no principal axis.
        let coords = vec![(3.0, 4.0); 25];
        assert_eq!(segment_tortuosity(&coords), None);
    }
}
