//! Drawable annotations for an external renderer.
//!
//! Nothing here computes measurements. The assembler lays out shapes from
//! values the rest of the pipeline already produced: one oval plus its
//! landmarks per iris, the four eye corners, and a block of text lines.

use serde::{Deserialize, Serialize};

use crate::geometry::ImageSize;
use crate::landmarks::{EyeLandmarks, FaceCorners, Landmark};

/// Text line height as a multiple of the font height.
pub const FONT_HEIGHT_SCALE: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Where the text block is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAnchor {
    #[default]
    TopLeft,
    BottomLeft,
}

/// Per-stream drawing options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub oval_color: Color,
    pub oval_thickness: f32,
    pub landmark_color: Color,
    pub landmark_thickness: f32,
    pub text_color: Color,
    pub text_thickness: f32,
    pub font_height_px: f32,
    pub font_face: i32,
    pub horizontal_offset_px: i32,
    pub vertical_offset_px: i32,
    pub anchor: TextAnchor,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            oval_color: Color::rgb(0, 0, 255),
            oval_thickness: 2.0,
            landmark_color: Color::rgb(0, 255, 0),
            landmark_thickness: 2.0,
            text_color: Color::rgb(255, 0, 0),
            text_thickness: 2.0,
            font_height_px: 50.0,
            font_face: 0,
            horizontal_offset_px: 200,
            vertical_offset_px: 200,
            anchor: TextAnchor::TopLeft,
        }
    }
}

/// Rectangle in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderAnnotation {
    Oval {
        rect: Rect,
        normalized: bool,
        color: Color,
        thickness: f32,
    },
    Point {
        x: f32,
        y: f32,
        normalized: bool,
        color: Color,
        thickness: f32,
    },
    Text {
        text: String,
        left_px: f32,
        baseline_px: f32,
        font_height_px: f32,
        font_face: i32,
        color: Color,
        thickness: f32,
    },
}

impl RenderAnnotation {
    fn point(lm: Landmark, options: &RenderOptions) -> Self {
        Self::Point {
            x: lm.x,
            y: lm.y,
            normalized: true,
            color: options.landmark_color,
            thickness: options.landmark_thickness,
        }
    }
}

/// Oval around the iris followed by its five landmarks.
pub fn iris_annotations(
    eye: &EyeLandmarks,
    diameter_px: f32,
    image: ImageSize,
    options: &RenderOptions,
) -> Vec<RenderAnnotation> {
    let radius = diameter_px / 2.0;
    let half_w = radius / image.width as f32;
    let half_h = radius / image.height as f32;
    let c = eye.center;

    let mut out = Vec::with_capacity(6);
    out.push(RenderAnnotation::Oval {
        rect: Rect {
            left: c.x - half_w,
            top: c.y - half_h,
            right: c.x + half_w,
            bottom: c.y + half_h,
        },
        normalized: true,
        color: options.oval_color,
        thickness: options.oval_thickness,
    });
    out.extend(
        eye.points()
            .into_iter()
            .map(|lm| RenderAnnotation::point(lm, options)),
    );
    out
}

/// The four eye corners as points.
pub fn corner_annotations(corners: &FaceCorners, options: &RenderOptions) -> Vec<RenderAnnotation> {
    corners
        .points()
        .into_iter()
        .map(|lm| RenderAnnotation::point(lm, options))
        .collect()
}

/// One text annotation per line, stacked top to bottom from the anchor.
pub fn text_annotations(
    lines: &[String],
    image: ImageSize,
    options: &RenderOptions,
) -> Vec<RenderAnnotation> {
    let line_height = (options.font_height_px * FONT_HEIGHT_SCALE).ceil();
    let mut first_baseline = options.vertical_offset_px as f32;
    match options.anchor {
        TextAnchor::TopLeft => first_baseline += line_height,
        TextAnchor::BottomLeft => {
            first_baseline += image.height as f32 - line_height * lines.len() as f32
        }
    }

    lines
        .iter()
        .enumerate()
        .map(|(i, line)| RenderAnnotation::Text {
            text: line.clone(),
            left_px: options.horizontal_offset_px as f32,
            baseline_px: first_baseline + i as f32 * line_height,
            font_height_px: options.font_height_px,
            font_face: options.font_face,
            color: options.text_color,
            thickness: options.text_thickness,
        })
        .collect()
}
