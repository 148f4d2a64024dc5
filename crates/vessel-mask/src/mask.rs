//! Probability and binary vessel masks

use image::GrayImage;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::MaskError;

/// Largest raw value accepted by the pre-scaled encoding
pub const PRESCALED_MAX: f32 = 1000.0;

/// How the upstream segmentation model encoded its output grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaskEncoding {
    /// Probabilities in [0, 1]
    Continuous,

    /// Already binary-ish values scaled up to 255 or 1000
    PreScaled,
}

impl MaskEncoding {
    /// Resolve the encoding from the largest value in the grid
    pub fn detect(max_value: f32) -> Self {
        if max_value > 1.5 {
            MaskEncoding::PreScaled
        } else {
            MaskEncoding::Continuous
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MaskEncoding::Continuous => "continuous",
            MaskEncoding::PreScaled => "pre_scaled",
        }
    }
}

/// Validated probability mask produced by the upstream segmentation model
///
/// The encoding is resolved once at construction; no pipeline stage
/// re-inspects raw values to guess how the grid was scaled.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityMask {
    data: Array2<f32>,
    encoding: MaskEncoding,
}

impl ProbabilityMask {
    /// Validate a raw grid and resolve its encoding
    pub fn from_array(data: Array2<f32>) -> Result<Self, MaskError> {
        let (height, width) = data.dim();
        if height == 0 || width == 0 {
            return Err(MaskError::Empty { height, width });
        }

        let mut max_value = f32::MIN;
        for ((row, col), &value) in data.indexed_iter() {
            if !value.is_finite() {
                return Err(MaskError::NonFinite { row, col });
            }
            if !(0.0..=PRESCALED_MAX).contains(&value) {
                return Err(MaskError::OutOfRange {
                    row,
                    col,
                    value,
                    max: PRESCALED_MAX,
                });
            }
            if value > max_value {
                max_value = value;
            }
        }

        Ok(Self {
            encoding: MaskEncoding::detect(max_value),
            data,
        })
    }

    /// Mask height (rows)
    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    /// Mask width (columns)
    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    /// Encoding resolved at construction
    pub fn encoding(&self) -> MaskEncoding {
        self.encoding
    }

    /// Raw probability grid
    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }
}

/// Binary vessel mask derived from a probability mask
///
/// Owned by a single extraction call and discarded afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMask {
    data: Array2<u8>,
}

impl BinaryMask {
    /// Wrap a grid, normalizing every nonzero value to 1
    pub fn new(data: Array2<u8>) -> Self {
        Self {
            data: data.mapv(|v| u8::from(v != 0)),
        }
    }

    /// Mask height (rows)
    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    /// Mask width (columns)
    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    /// Underlying {0,1} grid
    pub fn data(&self) -> &Array2<u8> {
        &self.data
    }

    /// Number of vessel pixels
    pub fn count_ones(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Fraction of pixels classified as vessel
    pub fn vessel_ratio(&self) -> f64 {
        let total = self.data.len();
        if total == 0 {
            return 0.0;
        }
        self.count_ones() as f64 / total as f64
    }

    /// Convert to a grayscale image for the pixel-processing backends
    ///
    /// Vessel pixels become 255 so the backends see a standard binary
    /// image. Fails if the dimensions do not fit the u32-indexed
    /// image buffer.
    pub fn to_gray_image(&self) -> Result<GrayImage, MaskError> {
        let (height, width) = self.data.dim();
        if width > u32::MAX as usize || height > u32::MAX as usize {
            return Err(MaskError::TooLarge { width, height });
        }

        let pixels: Vec<u8> = self
            .data
            .iter()
            .map(|&v| if v != 0 { 255 } else { 0 })
            .collect();
        GrayImage::from_raw(width as u32, height as u32, pixels)
            .ok_or(MaskError::TooLarge { width, height })
    }

    /// Rebuild from a grayscale image produced by a backend
    pub fn from_gray_image(image: &GrayImage) -> Self {
        let (width, height) = image.dimensions();
        let pixels: Vec<u8> = image.pixels().map(|p| u8::from(p.0[0] != 0)).collect();
        let data = Array2::from_shape_vec((height as usize, width as usize), pixels)
            .expect("pixel buffer matches image dimensions");
        Self { data }
    }
}
