//! Per-frame iris pipeline.
//!
//! [`IrisPipeline`] owns every piece of state that persists across frames.
//! One instance serves one stream; frames must be fed in timestamp order.
//! Instances share nothing, so independent streams can run on separate
//! threads without coordination.
//!
//! A frame is validated in full before any state is touched. A rejected
//! frame produces an error and leaves filters, baseline and counters exactly
//! as they were, so the next frame proceeds normally.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::deviation::{DeviationDetector, DeviationReport};
use crate::diagnostics::{depth_lines, deviation_lines};
use crate::geometry::{ImageSize, IrisMeasurement};
use crate::landmarks::{extract_face_corners, partition_iris, Landmark, LandmarkError};
use crate::render::{
    corner_annotations, iris_annotations, text_annotations, RenderAnnotation, RenderOptions,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error(transparent)]
    Landmarks(#[from] LandmarkError),
    #[error("image size missing")]
    MissingImageSize,
    #[error("invalid image size {width}x{height}")]
    InvalidImageSize { width: u32, height: u32 },
}

/// Options fixed for the lifetime of a stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub render: RenderOptions,
    /// Camera focal length in pixels. Enables the pipeline's own depth estimate.
    pub focal_length_px: Option<f32>,
}

/// One frame's inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameInput {
    pub timestamp: i64,
    /// Exactly ten iris landmarks, five per eye.
    pub iris: Vec<Landmark>,
    /// Face mesh landmarks. Without them only the iris overlay is produced.
    #[serde(default)]
    pub face: Option<Vec<Landmark>>,
    #[serde(default)]
    pub image_size: Option<ImageSize>,
    /// Externally computed left iris depth in millimeters.
    #[serde(default)]
    pub left_depth_mm: Option<f32>,
    /// Externally computed right iris depth in millimeters.
    #[serde(default)]
    pub right_depth_mm: Option<f32>,
}

/// One frame's results, tagged with the input timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameOutput {
    pub timestamp: i64,
    pub left: IrisMeasurement,
    pub right: IrisMeasurement,
    /// Present when face landmarks were supplied and the iris size was usable.
    pub deviation: Option<DeviationReport>,
    pub annotations: Vec<RenderAnnotation>,
}

#[derive(Debug, Clone, Default)]
pub struct IrisPipeline {
    config: PipelineConfig,
    detector: DeviationDetector,
    frames_processed: u64,
}

impl IrisPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            detector: DeviationDetector::new(),
            frames_processed: 0,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn detector(&self) -> &DeviationDetector {
        &self.detector
    }

    /// Frames that completed successfully.
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Process one frame.
    pub fn process(&mut self, frame: &FrameInput) -> Result<FrameOutput, PipelineError> {
        let iris = partition_iris(&frame.iris)?;
        let image = frame.image_size.ok_or(PipelineError::MissingImageSize)?;
        if !image.is_valid() {
            return Err(PipelineError::InvalidImageSize {
                width: image.width,
                height: image.height,
            });
        }
        let corners = frame
            .face
            .as_deref()
            .map(extract_face_corners)
            .transpose()?;

        let focal_length_px = self.config.focal_length_px;
        let left = IrisMeasurement::measure(&iris.left, image, focal_length_px);
        let right = IrisMeasurement::measure(&iris.right, image, focal_length_px);

        let render = &self.config.render;
        let mut annotations = iris_annotations(&iris.left, left.diameter_px, image, render);
        annotations.extend(iris_annotations(
            &iris.right,
            right.diameter_px,
            image,
            render,
        ));

        // Externally supplied depth wins, even when it is infinite.
        let mut lines = depth_lines(
            frame.left_depth_mm.or(left.depth_mm),
            frame.right_depth_mm.or(right.depth_mm),
        );

        let deviation = match corners {
            Some(corners) => {
                annotations.extend(corner_annotations(&corners, render));
                let report = self.detector.observe(&left, &right, &corners, image);
                if let Some(report) = &report {
                    lines.extend(deviation_lines(report));
                }
                report
            }
            None => {
                tracing::debug!(
                    timestamp = frame.timestamp,
                    "no face landmarks; deviation skipped"
                );
                None
            }
        };

        annotations.extend(text_annotations(&lines, image, render));
        self.frames_processed += 1;

        tracing::debug!(
            timestamp = frame.timestamp,
            left_iris_px = left.diameter_px,
            right_iris_px = right.diameter_px,
            annotations = annotations.len(),
            "frame processed"
        );

        Ok(FrameOutput {
            timestamp: frame.timestamp,
            left,
            right,
            deviation,
            annotations,
        })
    }
}
