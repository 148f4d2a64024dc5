//! Feature Vector Assembly

use serde::{Deserialize, Serialize};
use tracing::debug;
use vessel_mask::ProbabilityMask;

use crate::skeleton::{self, Skeleton};
use crate::threshold::{self, ThresholdPolicy};
use crate::{caliber, density, fractal, morphology, texture, tortuosity};

/// Number of features in the clinical vector
pub const FEATURE_DIMENSION: usize = 15;

/// Feature names in vector order
pub const FEATURE_NAMES: [&str; FEATURE_DIMENSION] = [
    "vessel_density",
    "peripheral_density",
    "density_gradient",
    "avg_vessel_thickness",
    "num_vessel_segments",
    "spatial_uniformity",
    "avg_tortuosity",
    "max_tortuosity",
    "avg_vessel_width",
    "vessel_width_std",
    "width_cv",
    "fractal_dimension",
    "branching_density",
    "connectivity_index",
    "texture_variance",
];

/// Clinical vessel features for the risk-fusion classifier
///
/// Every value is finite; degenerate inputs map to 0.0, never NaN/Inf.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicalFeatures {
    /// Fraction of mask pixels classified as vessel
    pub vessel_density: f64,
    /// Mean mask value outside the central disc
    pub peripheral_density: f64,
    /// Peripheral over central density ratio
    pub density_gradient: f64,
    /// Vessel area over skeleton length
    pub avg_vessel_thickness: f64,
    /// Connected skeleton components
    pub num_vessel_segments: f64,
    /// 1 minus relative spread of the quadrant densities
    pub spatial_uniformity: f64,
    /// Mean arc-to-chord excess over retained segments
    pub avg_tortuosity: f64,
    /// Largest arc-to-chord excess over retained segments
    pub max_tortuosity: f64,
    /// Mean vessel diameter sampled along the skeleton
    pub avg_vessel_width: f64,
    /// Diameter standard deviation
    pub vessel_width_std: f64,
    /// Diameter coefficient of variation
    pub width_cv: f64,
    /// Box-counting fractal dimension
    pub fractal_dimension: f64,
    /// Branch points per skeleton pixel
    pub branching_density: f64,
    /// Branch points per endpoint
    pub connectivity_index: f64,
    /// Mean 15x15 local variance of the mask
    pub texture_variance: f64,
}

impl ClinicalFeatures {
    /// Fixed-order numeric vector
    pub fn to_vector(&self) -> [f64; FEATURE_DIMENSION] {
        [
            self.vessel_density,
            self.peripheral_density,
            self.density_gradient,
            self.avg_vessel_thickness,
            self.num_vessel_segments,
            self.spatial_uniformity,
            self.avg_tortuosity,
            self.max_tortuosity,
            self.avg_vessel_width,
            self.vessel_width_std,
            self.width_cv,
            self.fractal_dimension,
            self.branching_density,
            self.connectivity_index,
            self.texture_variance,
        ]
    }

    /// Name/value pairs in vector order
    pub fn named(&self) -> Vec<(&'static str, f64)> {
        FEATURE_NAMES.iter().copied().zip(self.to_vector()).collect()
    }

    /// Whether every feature is finite
    pub fn is_finite(&self) -> bool {
        self.to_vector().iter().all(|v| v.is_finite())
    }
}

/// Extractor configuration
#[derive(Debug, Clone, Default)]
pub struct ExtractorConfig {
    /// Policy for converting probabilities to a binary mask
    pub threshold: ThresholdPolicy,
}

/// Extracts the clinical feature vector from a probability mask
///
/// Pure and reentrant: holds no mutable state, performs no I/O, and is
/// safe to call concurrently on independent masks. All intermediate
/// grids live and die inside one `extract` call.
#[derive(Debug, Clone, Default)]
pub struct VesselFeatureExtractor {
    config: ExtractorConfig,
}

impl VesselFeatureExtractor {
    /// Create an extractor with the given configuration
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Run the full pipeline on one validated mask
    pub fn extract(&self, mask: &ProbabilityMask) -> ClinicalFeatures {
        let binary = threshold::binarize(mask, self.config.threshold);
        let cleaned = morphology::clean_or_passthrough(binary);

        let density = density::compute(&cleaned);
        let skeleton = Skeleton::thin(&cleaned);
        let topology = skeleton::topology(&skeleton, density.vessel_density);
        let tortuosity = tortuosity::compute(&skeleton);
        let caliber = caliber::compute(&cleaned, &skeleton);
        let fractal_dimension = fractal::compute(&cleaned);
        let texture_variance = texture::compute(&cleaned);

        debug!(
            vessel_density = density.vessel_density,
            num_vessel_segments = topology.num_vessel_segments,
            "extracted clinical vessel features"
        );

        ClinicalFeatures {
            vessel_density: density.vessel_density,
            peripheral_density: density.peripheral_density,
            density_gradient: density.density_gradient,
            avg_vessel_thickness: topology.avg_vessel_thickness,
            num_vessel_segments: topology.num_vessel_segments,
            spatial_uniformity: density.spatial_uniformity,
            avg_tortuosity: tortuosity.avg_tortuosity,
            max_tortuosity: tortuosity.max_tortuosity,
            avg_vessel_width: caliber.avg_vessel_width,
            vessel_width_std: caliber.vessel_width_std,
            width_cv: caliber.width_cv,
            fractal_dimension,
            branching_density: topology.branching_density,
            connectivity_index: topology.connectivity_index,
            texture_variance,
        }
    }
}
