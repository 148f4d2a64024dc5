//! Clinical Vessel Feature Extraction
//!
//! Converts a retinal-vessel probability mask into the fixed 15-element
//! clinical feature vector consumed by the downstream risk-fusion
//! classifier. Every degenerate input (empty mask, zero variance,
//! disconnected skeleton) degrades to a defined 0.0 default rather than
//! propagating NaN/Inf into the fusion model.

mod caliber;
mod density;
mod features;
mod fractal;
mod morphology;
mod skeleton;
mod texture;
mod threshold;
mod tortuosity;

pub use features::{
    ClinicalFeatures, ExtractorConfig, VesselFeatureExtractor, FEATURE_DIMENSION, FEATURE_NAMES,
};
pub use threshold::ThresholdPolicy;
