//! Mask statistics and quality heuristics

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;
use vessel_mask::ProbabilityMask;

/// Statistical summary of a probability mask
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaskReport {
    pub width: usize,
    pub height: usize,
    /// Element type label of the grid
    pub dtype: &'static str,
    /// Encoding resolved at mask construction
    pub encoding: &'static str,
    pub min_value: f64,
    pub max_value: f64,
    pub mean_value: f64,
    pub median_value: f64,
    pub std_value: f64,
    pub percent_nonzero: f64,
    pub percent_above_0_1: f64,
    pub percent_above_0_3: f64,
    pub percent_above_0_5: f64,
}

/// Advisory quality flags raised by the heuristics; never fatal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityFlag {
    /// Max below 0.1: upstream model outputs are too low
    OutputsTooLow,

    /// Under 0.1% of pixels above 0.5: almost no vessels detected
    AlmostNoVessels,

    /// Mean below 0.05: mask is mostly background
    MostlyBackground,

    /// Mean above 0.95: mask is possibly inverted
    PossiblyInverted,

    /// Stddev below 0.01: no variation, possibly untrained upstream model
    NoVariation,
}

impl QualityFlag {
    /// Operator-facing description
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityFlag::OutputsTooLow => "max value below 0.1: model outputs too low",
            QualityFlag::AlmostNoVessels => {
                "<0.1% of pixels above 0.5: almost no vessels detected"
            }
            QualityFlag::MostlyBackground => "mean below 0.05: mask mostly background",
            QualityFlag::PossiblyInverted => "mean above 0.95: mask possibly inverted",
            QualityFlag::NoVariation => {
                "stddev below 0.01: no variation, possibly untrained upstream model"
            }
        }
    }
}

/// Compute the statistical summary for a probability mask
pub fn analyze(mask: &ProbabilityMask) -> MaskReport {
    let data = mask.data();
    let total = data.len() as f64;

    let mut min_value = f64::INFINITY;
    let mut max_value = f64::NEG_INFINITY;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    let mut nonzero = 0usize;
    let mut above_0_1 = 0usize;
    let mut above_0_3 = 0usize;
    let mut above_0_5 = 0usize;
    for &raw in data.iter() {
        let value = f64::from(raw);
        min_value = min_value.min(value);
        max_value = max_value.max(value);
        sum += value;
        sum_sq += value * value;
        if value != 0.0 {
            nonzero += 1;
        }
        if value > 0.1 {
            above_0_1 += 1;
        }
        if value > 0.3 {
            above_0_3 += 1;
        }
        if value > 0.5 {
            above_0_5 += 1;
        }
    }

    let mean_value = sum / total;
    let std_value = (sum_sq / total - mean_value * mean_value).max(0.0).sqrt();

    let mut sorted: Vec<f32> = data.iter().copied().collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    let median_value = if sorted.len() % 2 == 0 {
        f64::from(sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        f64::from(sorted[mid])
    };

    debug!(
        width = mask.width(),
        height = mask.height(),
        mean_value,
        "analyzed probability mask"
    );

    MaskReport {
        width: mask.width(),
        height: mask.height(),
        dtype: "f32",
        encoding: mask.encoding().as_str(),
        min_value,
        max_value,
        mean_value,
        median_value,
        std_value,
        percent_nonzero: 100.0 * nonzero as f64 / total,
        percent_above_0_1: 100.0 * above_0_1 as f64 / total,
        percent_above_0_3: 100.0 * above_0_3 as f64 / total,
        percent_above_0_5: 100.0 * above_0_5 as f64 / total,
    }
}

impl MaskReport {
    /// Evaluate the advisory quality heuristics
    pub fn quality_flags(&self) -> Vec<QualityFlag> {
        let mut flags = Vec::new();
        if self.max_value < 0.1 {
            flags.push(QualityFlag::OutputsTooLow);
        }
        if self.percent_above_0_5 < 0.1 {
            flags.push(QualityFlag::AlmostNoVessels);
        }
        if self.mean_value < 0.05 {
            flags.push(QualityFlag::MostlyBackground);
        }
        if self.mean_value > 0.95 {
            flags.push(QualityFlag::PossiblyInverted);
        }
        if self.std_value < 0.01 {
            flags.push(QualityFlag::NoVariation);
        }
        flags
    }
}

impl fmt::Display for MaskReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "mask {}x{} ({}, {})", self.width, self.height, self.dtype, self.encoding)?;
        writeln!(
            f,
            "  min {:.6}  max {:.6}  mean {:.6}  median {:.6}  std {:.6}",
            self.min_value, self.max_value, self.mean_value, self.median_value, self.std_value
        )?;
        writeln!(
            f,
            "  nonzero {:.2}%  >0.1 {:.2}%  >0.3 {:.2}%  >0.5 {:.2}%",
            self.percent_nonzero,
            self.percent_above_0_1,
            self.percent_above_0_3,
            self.percent_above_0_5
        )?;
        let flags = self.quality_flags();
        if flags.is_empty() {
            write!(f, "  no quality issues detected")?;
        } else {
            for flag in flags {
                writeln!(f, "  warning: {}", flag.as_str())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn mask_from(data: Array2<f32>) -> ProbabilityMask {
        ProbabilityMask::from_array(data).expect("valid test mask")
    }

    #[test]
    fn test_report_statistics() {
        let mut data = Array2::<f32>::zeros((2, 4));
        data[[0, 0]] = 0.2;
        data[[0, 1]] = 0.4;
        data[[1, 0]] = 0.6;
        data[[1, 1]] = 0.8;
        let report = analyze(&mask_from(data));

        assert_eq!(report.width, 4);
        assert_eq!(report.height, 2);
        assert_eq!(report.min_value, 0.0);
        assert!((report.max_value - 0.8).abs() < 1e-6);
        assert!((report.mean_value - 0.25).abs() < 1e-6);
        // Eight values, middle pair is (0.0, 0.2).
        assert!((report.median_value - 0.1).abs() < 1e-6);
        assert!((report.percent_nonzero - 50.0).abs() < 1e-9);
        assert!((report.percent_above_0_5 - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_flags_for_dark_flat_mask() {
        let report = analyze(&mask_from(Array2::<f32>::zeros((8, 8))));
        let flags = report.quality_flags();
        assert!(flags.contains(&QualityFlag::OutputsTooLow));
        assert!(flags.contains(&QualityFlag::AlmostNoVessels));
        assert!(flags.contains(&QualityFlag::MostlyBackground));
        assert!(flags.contains(&QualityFlag::NoVariation));
        assert!(!flags.contains(&QualityFlag::PossiblyInverted));
    }

    #[test]
    fn test_inverted_mask_is_flagged() {
        let report = analyze(&mask_from(Array2::<f32>::ones((8, 8))));
        let flags = report.quality_flags();
        assert!(flags.contains(&QualityFlag::PossiblyInverted));
        assert!(flags.contains(&QualityFlag::NoVariation));
    }

    #[test]
    fn test_healthy_mask_has_no_flags() {
        // Roughly 15% vessel coverage at high confidence.
        let mut data = Array2::<f32>::from_elem((20, 20), 0.08);
        for row in 0..20 {
            for col in 0..3 {
                data[[row, col]] = 0.9;
            }
        }
        let report = analyze(&mask_from(data));
        assert!(report.quality_flags().is_empty());
    }

    #[test]
    fn test_report_serializes() {
        let report = analyze(&mask_from(Array2::<f32>::zeros((4, 4))));
        let json = serde_json::to_string(&report).expect("serialize");
        assert!(json.contains("\"percent_nonzero\""));
    }

    #[test]
    fn test_display_mentions_flags() {
        let report = analyze(&mask_from(Array2::<f32>::zeros((4, 4))));
        let text = report.to_string();
        assert!(text.contains("4x4"));
        assert!(text.contains("warning:"));
    }
}
