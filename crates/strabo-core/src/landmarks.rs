//! Landmark partitioning.
//!
//! The iris landmark model emits 10 normalized points per frame, 5 per eye, in
//! its own order. The face mesh emits 468 points. This module pulls the pieces
//! the deviation pipeline needs out of both lists by fixed index:
//!
//! - each eye's iris as `[center, top, bottom, left, right]`
//! - the outer and inner eye corner of each eye from the face mesh
//!
//! Both mappings are tied to the upstream landmark numbering. A list that is
//! too short is rejected, never padded.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of iris landmarks per eye.
pub const LANDMARKS_PER_EYE: usize = 5;

/// Number of iris landmarks expected per frame (both eyes).
pub const IRIS_LANDMARK_COUNT: usize = LANDMARKS_PER_EYE * 2;

/// Source indices of the first (left) eye, ordered center, top, bottom, left, right.
pub const LEFT_IRIS_INDICES: [usize; LANDMARKS_PER_EYE] = [0, 2, 4, 3, 1];

/// Source indices of the second (right) eye, ordered center, top, bottom, left, right.
pub const RIGHT_IRIS_INDICES: [usize; LANDMARKS_PER_EYE] = [5, 7, 9, 6, 8];

/// Face mesh indices of the eye corners.
pub mod face_indices {
    pub const RIGHT_EYE_OUTER: usize = 263;
    pub const RIGHT_EYE_INNER: usize = 362;
    pub const LEFT_EYE_INNER: usize = 133;
    pub const LEFT_EYE_OUTER: usize = 33;

    /// Largest index read from the face mesh.
    pub const MAX_INDEX: usize = RIGHT_EYE_INNER;
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LandmarkError {
    #[error("wrong number of iris landmarks: expected {expected}, got {got}")]
    IrisCount { expected: usize, got: usize },
    #[error("face landmark list too short: need at least {required} points, got {got}")]
    FaceTooShort { required: usize, got: usize },
}

/// A 2D landmark normalized to the image dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One eye's iris landmarks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeLandmarks {
    pub center: Landmark,
    pub top: Landmark,
    pub bottom: Landmark,
    pub left: Landmark,
    pub right: Landmark,
}

impl EyeLandmarks {
    fn gather(landmarks: &[Landmark], indices: &[usize; LANDMARKS_PER_EYE]) -> Self {
        Self {
            center: landmarks[indices[0]],
            top: landmarks[indices[1]],
            bottom: landmarks[indices[2]],
            left: landmarks[indices[3]],
            right: landmarks[indices[4]],
        }
    }

    /// Points in `[center, top, bottom, left, right]` order.
    pub fn points(&self) -> [Landmark; LANDMARKS_PER_EYE] {
        [self.center, self.top, self.bottom, self.left, self.right]
    }
}

/// Both eyes' iris landmarks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrisPair {
    pub left: EyeLandmarks,
    pub right: EyeLandmarks,
}

/// Outer and inner corner of one eye.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeCorners {
    pub outer: Landmark,
    pub inner: Landmark,
}

/// Eye corners of both eyes, taken from the face mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceCorners {
    pub right: EyeCorners,
    pub left: EyeCorners,
}

impl FaceCorners {
    /// Points in drawing order: right outer, right inner, left inner, left outer.
    pub fn points(&self) -> [Landmark; 4] {
        [
            self.right.outer,
            self.right.inner,
            self.left.inner,
            self.left.outer,
        ]
    }
}

/// Split a 10-point iris landmark list into left and right eyes.
pub fn partition_iris(landmarks: &[Landmark]) -> Result<IrisPair, LandmarkError> {
    if landmarks.len() != IRIS_LANDMARK_COUNT {
        return Err(LandmarkError::IrisCount {
            expected: IRIS_LANDMARK_COUNT,
            got: landmarks.len(),
        });
    }

    Ok(IrisPair {
        left: EyeLandmarks::gather(landmarks, &LEFT_IRIS_INDICES),
        right: EyeLandmarks::gather(landmarks, &RIGHT_IRIS_INDICES),
    })
}

/// Read the four eye corners out of a face mesh landmark list.
pub fn extract_face_corners(landmarks: &[Landmark]) -> Result<FaceCorners, LandmarkError> {
    let required = face_indices::MAX_INDEX + 1;
    if landmarks.len() < required {
        return Err(LandmarkError::FaceTooShort {
            required,
            got: landmarks.len(),
        });
    }

    Ok(FaceCorners {
        right: EyeCorners {
            outer: landmarks[face_indices::RIGHT_EYE_OUTER],
            inner: landmarks[face_indices::RIGHT_EYE_INNER],
        },
        left: EyeCorners {
            outer: landmarks[face_indices::LEFT_EYE_OUTER],
            inner: landmarks[face_indices::LEFT_EYE_INNER],
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Landmarks whose x coordinate encodes their source index.
    fn indexed(n: usize) -> Vec<Landmark> {
        (0..n).map(|i| Landmark::new(i as f32, 0.5)).collect()
    }

    #[test]
    fn test_partition_uses_fixed_index_tables() {
        let lms = indexed(IRIS_LANDMARK_COUNT);
        let pair = partition_iris(&lms).unwrap();

        let left: Vec<f32> = pair.left.points().iter().map(|p| p.x).collect();
        let right: Vec<f32> = pair.right.points().iter().map(|p| p.x).collect();
        assert_eq!(left, vec![0.0, 2.0, 4.0, 3.0, 1.0]);
        assert_eq!(right, vec![5.0, 7.0, 9.0, 6.0, 8.0]);
    }

    #[test]
    fn test_partition_center_is_first() {
        let lms = indexed(IRIS_LANDMARK_COUNT);
        let pair = partition_iris(&lms).unwrap();
        assert_eq!(pair.left.points()[0], lms[LEFT_IRIS_INDICES[0]]);
        assert_eq!(pair.right.points()[0], lms[RIGHT_IRIS_INDICES[0]]);
    }

    #[test]
    fn test_index_tables_cover_every_landmark_once() {
        let mut all: Vec<usize> = LEFT_IRIS_INDICES
            .iter()
            .chain(RIGHT_IRIS_INDICES.iter())
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..IRIS_LANDMARK_COUNT).collect::<Vec<_>>());
    }

    #[test]
    fn test_partition_rejects_wrong_count() {
        for n in [0, 5, 9, 11, 478] {
            let err = partition_iris(&indexed(n)).unwrap_err();
            assert_eq!(
                err,
                LandmarkError::IrisCount {
                    expected: 10,
                    got: n
                }
            );
        }
    }

    #[test]
    fn test_face_corners_by_index() {
        let lms = indexed(468);
        let corners = extract_face_corners(&lms).unwrap();
        assert_eq!(corners.right.outer.x, 263.0);
        assert_eq!(corners.right.inner.x, 362.0);
        assert_eq!(corners.left.inner.x, 133.0);
        assert_eq!(corners.left.outer.x, 33.0);

        let order: Vec<f32> = corners.points().iter().map(|p| p.x).collect();
        assert_eq!(order, vec![263.0, 362.0, 133.0, 33.0]);
    }

    #[test]
    fn test_face_corners_minimum_length() {
        assert!(extract_face_corners(&indexed(363)).is_ok());
        let err = extract_face_corners(&indexed(362)).unwrap_err();
        assert_eq!(
            err,
            LandmarkError::FaceTooShort {
                required: 363,
                got: 362
            }
        );
    }
}
