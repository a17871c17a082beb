//! Iris metrics and ocular deviation tracking from 2D landmarks.
//!
//! Feed one frame of iris and face-mesh landmarks at a time into an
//! [`IrisPipeline`]. Each frame yields per-eye iris size and depth, a
//! deviation report once a baseline exists, and a flat list of
//! [`RenderAnnotation`]s for an overlay renderer.

pub mod deviation;
pub mod diagnostics;
pub mod filter;
pub mod geometry;
pub mod landmarks;
pub mod pipeline;
pub mod render;

pub use deviation::{
    Deltas, DeviationDetector, DeviationReport, WarningCounters, DELTA_ADJUST_MM,
    DEVIATION_THRESHOLD_MM,
};
pub use filter::{FilterChannel, SMOOTHING_WEIGHT};
pub use geometry::{ImageSize, IrisMeasurement, REFERENCE_IRIS_MM};
pub use landmarks::{Landmark, LandmarkError};
pub use pipeline::{FrameInput, FrameOutput, IrisPipeline, PipelineConfig, PipelineError};
pub use render::{Color, RenderAnnotation, RenderOptions, TextAnchor};
