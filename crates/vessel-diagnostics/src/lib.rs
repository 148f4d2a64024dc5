//! Vessel Mask Diagnostics
//!
//! Operator tooling for inspecting segmentation mask quality: a
//! statistical summary with heuristic quality flags, and rendering of
//! the probability grid for visual debugging. Peer of the extraction
//! pipeline, never in its data path.

mod error;
mod render;
mod report;

pub use error::DiagnosticsError;
pub use render::{render, to_png_data_uri, RenderMode, RENDER_MODES};
pub use report::{analyze, MaskReport, QualityFlag};
