//! Iris geometry in pixel and metric space.
//!
//! Landmarks are normalized, so every distance here is scaled by the image
//! dimensions first. Metric values come from a single anatomical constant:
//! the horizontal visible iris diameter is close to 11.8 mm across adults,
//! which lets a pixel measurement of the iris stand in as a ruler.

use serde::{Deserialize, Serialize};

use crate::landmarks::{EyeLandmarks, Landmark};

/// Average human iris diameter in millimeters.
pub const REFERENCE_IRIS_MM: f32 = 11.8;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    fn to_pixels(self, lm: Landmark) -> (f32, f32) {
        (lm.x * self.width as f32, lm.y * self.height as f32)
    }
}

/// Per-eye iris measurement for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IrisMeasurement {
    /// Iris diameter in pixels.
    pub diameter_px: f32,
    pub center: Landmark,
    /// Distance from the camera, when a focal length is known.
    pub depth_mm: Option<f32>,
}

impl IrisMeasurement {
    pub fn measure(eye: &EyeLandmarks, image: ImageSize, focal_length_px: Option<f32>) -> Self {
        let diameter_px = iris_diameter(eye, image);
        let depth_mm = focal_length_px.map(|f| depth_mm(eye.center, f, diameter_px, image));
        Self {
            diameter_px,
            center: eye.center,
            depth_mm,
        }
    }
}

/// Distance between two scaled points along x, along y, and in the plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AxisDistance {
    pub x: f32,
    pub y: f32,
    pub euclidean: f32,
}

fn hypot(dx: f32, dy: f32) -> f32 {
    (dx * dx + dy * dy).sqrt()
}

/// Euclidean distance in pixels between two normalized landmarks.
pub fn pixel_distance(a: Landmark, b: Landmark, image: ImageSize) -> f32 {
    let (ax, ay) = image.to_pixels(a);
    let (bx, by) = image.to_pixels(b);
    hypot(ax - bx, ay - by)
}

/// Iris diameter in pixels: mean of the vertical and horizontal chords.
pub fn iris_diameter(eye: &EyeLandmarks, image: ImageSize) -> f32 {
    let vertical = pixel_distance(eye.top, eye.bottom, image);
    let horizontal = pixel_distance(eye.left, eye.right, image);
    (vertical + horizontal) / 2.0
}

/// Camera-to-iris distance in millimeters under a pinhole camera model.
///
/// The ray from the optical center to the iris has length
/// `sqrt(f² + r²)` in pixels, where `r` is the iris center's offset from the
/// image center. Similar triangles with the reference iris size give the
/// metric distance.
///
/// Accuracy is bounded by the model, not by arithmetic: individual irises
/// deviate from [`REFERENCE_IRIS_MM`] by roughly ±0.5 mm, and lens distortion
/// is ignored. A zero `iris_size_px` yields infinity.
pub fn depth_mm(center: Landmark, focal_length_px: f32, iris_size_px: f32, image: ImageSize) -> f32 {
    let origin = (image.width as f32 / 2.0, image.height as f32 / 2.0);
    let (cx, cy) = image.to_pixels(center);
    let offset = hypot(origin.0 - cx, origin.1 - cy);
    let ray = hypot(focal_length_px, offset);
    REFERENCE_IRIS_MM * ray / iris_size_px
}

/// Axis-separated distance between two landmarks, with each axis multiplied
/// by its own scale (image dimension times any unit conversion).
pub fn axis_distance(a: Landmark, b: Landmark, scale_x: f32, scale_y: f32) -> AxisDistance {
    let x = (a.x - b.x).abs() * scale_x;
    let y = (a.y - b.y).abs() * scale_y;
    AxisDistance {
        x,
        y,
        euclidean: hypot(x, y),
    }
}
