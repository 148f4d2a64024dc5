//! Skeleton extraction and branching topology

use image::Luma;
use imageproc::region_labelling::{connected_components, Connectivity};
use ndarray::Array2;
use vessel_mask::BinaryMask;

const EPSILON: f64 = 1e-8;

/// Skeleton densities below this are treated as empty
const DENSITY_FLOOR: f64 = 1e-8;

/// One-pixel-wide topological centerline of a binary mask
#[derive(Debug, Clone)]
pub struct Skeleton {
    data: Array2<u8>,
}

impl Skeleton {
    /// Thin a binary mask with the Zhang-Suen algorithm
    ///
    /// Thinning is total: an all-zero mask yields an all-zero skeleton,
    /// which drives every downstream default.
    pub fn thin(mask: &BinaryMask) -> Self {
        let mut grid = mask.data().clone();
        let (height, width) = grid.dim();
        if height < 3 || width < 3 {
            return Self { data: grid };
        }

        let mut to_clear: Vec<(usize, usize)> = Vec::new();
        loop {
            let mut changed = false;
            for pass in 0..2 {
                to_clear.clear();
                for row in 1..height - 1 {
                    for col in 1..width - 1 {
                        if grid[[row, col]] != 0 && should_clear(&grid, row, col, pass) {
                            to_clear.push((row, col));
                        }
                    }
                }
                if !to_clear.is_empty() {
                    changed = true;
                    for &(row, col) in &to_clear {
                        grid[[row, col]] = 0;
                    }
                }
            }
            if !changed {
                break;
            }
        }
        Self { data: grid }
    }

    /// Underlying {0,1} grid
    pub fn data(&self) -> &Array2<u8> {
        &self.data
    }

    /// Number of skeleton pixels
    pub fn count_ones(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Mean value of the skeleton grid
    pub fn density(&self) -> f64 {
        let total = self.data.len();
        if total == 0 {
            return 0.0;
        }
        self.count_ones() as f64 / total as f64
    }

    /// Label 8-connected skeleton components
    ///
    /// Returns the label grid (0 = background, 1..=count = components)
    /// and the component count. A grid the pixel backend cannot
    /// represent labels as empty.
    pub fn label_components(&self) -> (Array2<u32>, u32) {
        let binary = BinaryMask::new(self.data.clone());
        let Ok(image) = binary.to_gray_image() else {
            return (Array2::zeros(self.data.dim()), 0);
        };

        let labelled = connected_components(&image, Connectivity::Eight, Luma([0u8]));
        let mut labels = Array2::zeros(self.data.dim());
        let mut count = 0u32;
        for (col, row, pixel) in labelled.enumerate_pixels() {
            let label = pixel.0[0];
            labels[[row as usize, col as usize]] = label;
            count = count.max(label);
        }
        (labels, count)
    }

    /// Count branch points (>=3 skeleton neighbors) and endpoints
    /// (exactly 1 skeleton neighbor)
    pub fn branch_and_end_points(&self) -> (usize, usize) {
        let (height, width) = self.data.dim();
        let mut branch_points = 0;
        let mut endpoints = 0;
        for ((row, col), &value) in self.data.indexed_iter() {
            if value == 0 {
                continue;
            }
            let mut neighbors = 0u32;
            for dr in -1isize..=1 {
                for dc in -1isize..=1 {
                    if dr == 0 && dc == 0 {
                        continue;
                    }
                    let r = row as isize + dr;
                    let c = col as isize + dc;
                    if r < 0 || c < 0 || r >= height as isize || c >= width as isize {
                        continue;
                    }
                    if self.data[[r as usize, c as usize]] != 0 {
                        neighbors += 1;
                    }
                }
            }
            if neighbors >= 3 {
                branch_points += 1;
            } else if neighbors == 1 {
                endpoints += 1;
            }
        }
        (branch_points, endpoints)
    }
}

/// Zhang-Suen deletion test for one sub-iteration
fn should_clear(grid: &Array2<u8>, row: usize, col: usize, pass: usize) -> bool {
    let p = |dr: isize, dc: isize| {
        u32::from(grid[[(row as isize + dr) as usize, (col as isize + dc) as usize]] != 0)
    };
    // Clockwise ring starting north: P2..P9.
    let ring = [
        p(-1, 0),
        p(-1, 1),
        p(0, 1),
        p(1, 1),
        p(1, 0),
        p(1, -1),
        p(0, -1),
        p(-1, -1),
    ];

    let set: u32 = ring.iter().sum();
    if !(2..=6).contains(&set) {
        return false;
    }

    let transitions = (0..8)
        .filter(|&i| ring[i] == 0 && ring[(i + 1) % 8] != 0)
        .count();
    if transitions != 1 {
        return false;
    }

    let (p2, p4, p6, p8) = (ring[0], ring[2], ring[4], ring[6]);
    if pass == 0 {
        p2 * p4 * p6 == 0 && p4 * p6 * p8 == 0
    } else {
        p2 * p4 * p8 == 0 && p2 * p6 * p8 == 0
    }
}

/// Topology features derived from the skeleton
#[derive(Debug, Clone, Copy, Default)]
pub struct TopologyFeatures {
    pub avg_vessel_thickness: f64,
    pub num_vessel_segments: f64,
    pub branching_density: f64,
    pub connectivity_index: f64,
}

/// Derive thickness, segment count, and branching features
pub fn topology(skeleton: &Skeleton, vessel_density: f64) -> TopologyFeatures {
    let skeleton_density = skeleton.density();
    // Total vessel area over total centerline length approximates the
    // average vessel width.
    let avg_vessel_thickness = if skeleton_density > DENSITY_FLOOR {
        vessel_density / skeleton_density
    } else {
        0.0
    };

    let (_, segments) = skeleton.label_components();
    let (branch_points, endpoints) = skeleton.branch_and_end_points();
    let skeleton_pixels = skeleton.count_ones() as f64;

    TopologyFeatures {
        avg_vessel_thickness,
        num_vessel_segments: f64::from(segments),
        branching_density: branch_points as f64 / (skeleton_pixels + EPSILON),
        connectivity_index: branch_points as f64 / (endpoints as f64 + EPSILON),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn horizontal_line(height: usize, width: usize, row: usize) -> BinaryMask {
        let mut data = Array2::<u8>::zeros((height, width));
        for col in 0..width {
            data[[row, col]] = 1;
        }
        BinaryMask::new(data)
    }

    #[test]
    fn test_thinning_reduces_thick_bar_to_line() {
        let mut data = Array2::<u8>::zeros((16, 24));
        for row in 6..11 {
            for col in 2..22 {
                data[[row, col]] = 1;
            }
        }
        let mask = BinaryMask::new(data);
        let skeleton = Skeleton::thin(&mask);

        assert!(skeleton.count_ones() > 0);
        assert!(skeleton.count_ones() < mask.count_ones() / 2);
        // A thinned bar keeps at most one pixel per column in its middle.
        for col in 5..19 {
            let column_pixels: u32 = (0..16).map(|row| u32::from(skeleton.data()[[row, col]])).sum();
            assert!(column_pixels <= 1, "column {col} has {column_pixels} pixels");
        }
    }

    #[test]
    fn test_thin_line_is_already_a_skeleton() {
        let mask = horizontal_line(9, 20, 4);
        let skeleton = Skeleton::thin(&mask);
        assert_eq!(skeleton.count_ones(), 20);
    }

    #[test]
    fn test_all_zero_mask_has_empty_skeleton() {
        let skeleton = Skeleton::thin(&BinaryMask::new(Array2::<u8>::zeros((10, 10))));
        assert_eq!(skeleton.count_ones(), 0);
        assert_eq!(skeleton.density(), 0.0);
        let (_, segments) = skeleton.label_components();
        assert_eq!(segments, 0);
    }

    #[test]
    fn test_two_disjoint_lines_label_two_segments() {
        let mut data = Array2::<u8>::zeros((20, 20));
        for col in 0..20 {
            data[[3, col]] = 1;
            data[[15, col]] = 1;
        }
        let skeleton = Skeleton::thin(&BinaryMask::new(data));
        let (_, segments) = skeleton.label_components();
        assert_eq!(segments, 2);
    }

    #[test]
    fn test_cross_has_branch_point_and_four_endpoints() {
        let mut data = Array2::<u8>::zeros((11, 11));
        for i in 0..11 {
            data[[5, i]] = 1;
            data[[i, 5]] = 1;
        }
        let skeleton = Skeleton { data };
        let (branch_points, endpoints) = skeleton.branch_and_end_points();
        // The junction pixel and its four arm neighbors all see >=3
        // skeleton neighbors.
        assert!(branch_points >= 1);
        assert_eq!(endpoints, 4);
    }

    #[test]
    fn test_topology_defaults_for_empty_skeleton() {
        let skeleton = Skeleton::thin(&BinaryMask::new(Array2::<u8>::zeros((10, 10))));
        let features = topology(&skeleton, 0.0);
        assert_eq!(features.avg_vessel_thickness, 0.0);
        assert_eq!(features.num_vessel_segments, 0.0);
        assert_eq!(features.branching_density, 0.0);
        assert_eq!(features.connectivity_index, 0.0);
    }

    #[test]
    fn test_topology_of_single_line() {
        let mask = horizontal_line(9, 20, 4);
        let skeleton = Skeleton::thin(&mask);
        let features = topology(&skeleton, mask.vessel_ratio());
        assert_eq!(features.num_vessel_segments, 1.0);
        assert_eq!(features.branching_density, 0.0);
        assert_eq!(features.connectivity_index, 0.0);
        assert!(features.avg_vessel_thickness > 0.0);
    }
}
