//! Mask rendering for visual debugging

use std::io::Cursor;
use std::str::FromStr;

use base64::{engine::general_purpose, Engine as _};
use image::{GrayImage, ImageFormat};
use serde::{Deserialize, Serialize};
use tracing::debug;
use vessel_mask::{MaskError, ProbabilityMask};

use crate::error::DiagnosticsError;

/// Accepted rendering mode names
pub const RENDER_MODES: [&str; 4] = ["raw", "binary", "stretched", "adaptive"];

/// Rendering modes for the 8-bit mask preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Linear scale of [0,1] to 0-255
    Raw,

    /// Hard threshold at 0.5
    Binary,

    /// Min-max contrast stretch
    Stretched,

    /// Threshold at clamp(mean + stddev, 0.1, 0.9)
    Adaptive,
}

impl RenderMode {
    /// Mode name as accepted by `from_str`
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::Raw => "raw",
            RenderMode::Binary => "binary",
            RenderMode::Stretched => "stretched",
            RenderMode::Adaptive => "adaptive",
        }
    }
}

impl FromStr for RenderMode {
    type Err = DiagnosticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(RenderMode::Raw),
            "binary" => Ok(RenderMode::Binary),
            "stretched" => Ok(RenderMode::Stretched),
            "adaptive" => Ok(RenderMode::Adaptive),
            other => Err(DiagnosticsError::UnknownMode {
                mode: other.to_string(),
            }),
        }
    }
}

/// Render a probability mask to an 8-bit grayscale preview
pub fn render(mask: &ProbabilityMask, mode: RenderMode) -> Result<GrayImage, DiagnosticsError> {
    let data = mask.data();
    let (height, width) = data.dim();
    if width > u32::MAX as usize || height > u32::MAX as usize {
        return Err(MaskError::TooLarge { width, height }.into());
    }

    let to_u8 = |v: f64| v.clamp(0.0, 255.0) as u8;
    let pixels: Vec<u8> = match mode {
        RenderMode::Raw => data.iter().map(|&v| to_u8(f64::from(v) * 255.0)).collect(),
        RenderMode::Binary => data
            .iter()
            .map(|&v| if v > 0.5 { 255 } else { 0 })
            .collect(),
        RenderMode::Stretched => {
            let min = data.iter().cloned().fold(f32::INFINITY, f32::min);
            let max = data.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            if min < max {
                let range = f64::from(max - min);
                data.iter()
                    .map(|&v| to_u8(f64::from(v - min) / range * 255.0))
                    .collect()
            } else {
                // Flat mask: nothing to stretch, fall back to linear scaling.
                data.iter().map(|&v| to_u8(f64::from(v) * 255.0)).collect()
            }
        }
        RenderMode::Adaptive => {
            let cut = adaptive_display_cut(data.iter().map(|&v| f64::from(v)));
            data.iter()
                .map(|&v| if f64::from(v) > cut { 255 } else { 0 })
                .collect()
        }
    };

    debug!(mode = mode.as_str(), width, height, "rendered mask preview");
    GrayImage::from_raw(width as u32, height as u32, pixels)
        .ok_or_else(|| MaskError::TooLarge { width, height }.into())
}

/// Statistics-based display threshold: clamp(mean + stddev, 0.1, 0.9)
fn adaptive_display_cut(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let n = values.clone().count() as f64;
    let mean = values.clone().sum::<f64>() / n;
    let variance = values.map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean + variance.sqrt()).clamp(0.1, 0.9)
}

/// Encode a rendered preview as a PNG data URI for transport
pub fn to_png_data_uri(image: &GrayImage) -> Result<String, DiagnosticsError> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    let payload = general_purpose::STANDARD.encode(buffer.into_inner());
    Ok(format!("data:image/png;base64,{payload}"))
}
