//! Ocular deviation detection from eye-corner geometry.
//!
//! For each eye three segments are tracked, each along x, along y and in the
//! plane:
//!
//! - **span**: outer corner to inner corner
//! - **outer**: outer corner to iris center
//! - **inner**: inner corner to iris center
//!
//! Head translation moves the corners and the iris together and leaves the
//! outer/inner split unchanged. Eye rotation moves the iris relative to the
//! corners, growing one side and shrinking the other. The detector compares
//! that split against a baseline captured on the first usable frame and
//! counts frames where the difference exceeds [`DEVIATION_THRESHOLD_MM`].
//!
//! All distances are converted to millimeters using the smoothed iris size as
//! a ruler, so thresholds hold regardless of subject distance or resolution.
//!
//! # Limitations
//!
//! - The baseline is frozen once and never refreshed. A subject whose pose on
//!   the first frame is already atypical skews every later delta.
//! - Counters never decay; they measure how many frames crossed the threshold
//!   over the whole stream, not how recently.
//! - A zero distance is not a measurement. If a segment axis is exactly zero
//!   on the freeze frame (a corner level with the iris center, say), its
//!   baseline slot stays `None` and the matching delta is unavailable for the
//!   life of the detector, even once later frames measure it.

use serde::Serialize;

use crate::filter::{AxisChannels, AxisValues, FilterChannel};
use crate::geometry::{axis_distance, AxisDistance, ImageSize, IrisMeasurement, REFERENCE_IRIS_MM};
use crate::landmarks::{EyeCorners, FaceCorners, Landmark};

/// Gain applied to the inner/outer difference to approximate the iris
/// displacement in millimeters.
pub const DELTA_ADJUST_MM: f32 = 4.0;

/// Delta above which a frame counts as a deviation warning.
pub const DEVIATION_THRESHOLD_MM: f32 = 6.0;

/// The three corner segments of one eye.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Segments<T> {
    pub span: T,
    pub outer: T,
    pub inner: T,
}

impl Segments<AxisDistance> {
    /// Raw segment distances for one eye, scaled per axis.
    pub fn measure(corners: &EyeCorners, center: Landmark, scale_x: f32, scale_y: f32) -> Self {
        Self {
            span: axis_distance(corners.outer, corners.inner, scale_x, scale_y),
            outer: axis_distance(corners.outer, center, scale_x, scale_y),
            inner: axis_distance(corners.inner, center, scale_x, scale_y),
        }
    }
}

impl Segments<AxisChannels> {
    fn update(&mut self, raw: &Segments<AxisDistance>) -> Segments<AxisValues> {
        Segments {
            span: self.span.update(raw.span),
            outer: self.outer.update(raw.outer),
            inner: self.inner.update(raw.inner),
        }
    }

    fn values(&self) -> Segments<AxisValues> {
        Segments {
            span: self.span.values(),
            outer: self.outer.values(),
            inner: self.inner.values(),
        }
    }
}

/// Values of every smoothed channel at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ChannelValues {
    /// Aggregate iris size in pixels.
    pub iris_px: Option<f32>,
    /// Left eye segments in millimeters.
    pub left: Segments<AxisValues>,
    /// Right eye segments in millimeters.
    pub right: Segments<AxisValues>,
}

/// Per-side and aggregate deltas from the baseline, in millimeters.
///
/// A `None` component is unavailable: either no baseline exists yet or one
/// of its inputs has never been measured. It is never a stale value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Deltas {
    pub left: AxisValues,
    pub right: AxisValues,
    /// Left minus right.
    pub aggregate: AxisValues,
}

fn side_delta(
    inner: Option<f32>,
    inner_base: Option<f32>,
    outer: Option<f32>,
    outer_base: Option<f32>,
) -> Option<f32> {
    Some(((inner? - inner_base?) - (outer? - outer_base?)) * DELTA_ADJUST_MM / 2.0)
}

fn side_deltas(current: &Segments<AxisValues>, base: &Segments<AxisValues>) -> AxisValues {
    AxisValues {
        x: side_delta(current.inner.x, base.inner.x, current.outer.x, base.outer.x),
        y: side_delta(current.inner.y, base.inner.y, current.outer.y, base.outer.y),
        euclidean: side_delta(
            current.inner.euclidean,
            base.inner.euclidean,
            current.outer.euclidean,
            base.outer.euclidean,
        ),
    }
}

fn difference(a: Option<f32>, b: Option<f32>) -> Option<f32> {
    Some(a? - b?)
}

impl Deltas {
    /// All components unavailable.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Deltas of `current` against a frozen `baseline`.
    pub fn between(current: &ChannelValues, baseline: &ChannelValues) -> Self {
        let left = side_deltas(&current.left, &baseline.left);
        let right = side_deltas(&current.right, &baseline.right);
        let aggregate = AxisValues {
            x: difference(left.x, right.x),
            y: difference(left.y, right.y),
            euclidean: difference(left.euclidean, right.euclidean),
        };
        Self {
            left,
            right,
            aggregate,
        }
    }
}

/// Frames in which each component exceeded the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AxisCounts {
    pub x: u64,
    pub y: u64,
    pub euclidean: u64,
}

impl AxisCounts {
    fn record(&mut self, delta: &AxisValues, threshold: f32) -> u32 {
        let mut crossed = 0;
        for (count, value) in [
            (&mut self.x, delta.x),
            (&mut self.y, delta.y),
            (&mut self.euclidean, delta.euclidean),
        ] {
            if value.is_some_and(|v| v > threshold) {
                *count += 1;
                crossed += 1;
            }
        }
        crossed
    }

    pub fn total(&self) -> u64 {
        self.x + self.y + self.euclidean
    }
}

/// Monotonic warning counters, one per delta component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WarningCounters {
    pub left: AxisCounts,
    pub right: AxisCounts,
    pub aggregate: AxisCounts,
}

impl WarningCounters {
    /// Count this frame's crossings. Returns how many counters moved.
    fn record(&mut self, deltas: &Deltas) -> u32 {
        self.left.record(&deltas.left, DEVIATION_THRESHOLD_MM)
            + self.right.record(&deltas.right, DEVIATION_THRESHOLD_MM)
            + self.aggregate.record(&deltas.aggregate, DEVIATION_THRESHOLD_MM)
    }

    pub fn total(&self) -> u64 {
        self.left.total() + self.right.total() + self.aggregate.total()
    }
}

/// Outcome of one detector step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeviationReport {
    /// Millimeters per pixel derived from the smoothed iris size.
    pub mm_per_px: f32,
    /// This frame's left iris diameter in millimeters.
    pub left_iris_mm: f32,
    /// This frame's right iris diameter in millimeters.
    pub right_iris_mm: f32,
    /// Smoothed aggregate iris size in millimeters.
    pub iris_mm: f32,
    pub smoothed: ChannelValues,
    pub deltas: Deltas,
    pub counters: WarningCounters,
    /// True only on the frame where the baseline was captured.
    pub baseline_frozen: bool,
}

/// Stateful deviation detector. One instance per tracked subject.
#[derive(Debug, Clone, Default)]
pub struct DeviationDetector {
    iris: FilterChannel,
    left: Segments<AxisChannels>,
    right: Segments<AxisChannels>,
    baseline: Option<ChannelValues>,
    counters: WarningCounters,
}

impl DeviationDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frozen baseline, once captured.
    pub fn baseline(&self) -> Option<&ChannelValues> {
        self.baseline.as_ref()
    }

    pub fn counters(&self) -> &WarningCounters {
        &self.counters
    }

    /// Current smoothed values of every channel.
    pub fn values(&self) -> ChannelValues {
        ChannelValues {
            iris_px: self.iris.value(),
            left: self.left.values(),
            right: self.right.values(),
        }
    }

    fn spans_initialized(&self) -> bool {
        self.left.span.euclidean.is_initialized() && self.right.span.euclidean.is_initialized()
    }

    /// Advance the detector by one frame.
    ///
    /// Returns `None` without touching any state when neither eye yields a
    /// usable iris size, since nothing can be converted to millimeters.
    pub fn observe(
        &mut self,
        left: &IrisMeasurement,
        right: &IrisMeasurement,
        corners: &FaceCorners,
        image: ImageSize,
    ) -> Option<DeviationReport> {
        let raw_iris_px = left.diameter_px.max(right.diameter_px);
        if !(raw_iris_px > 0.0 && raw_iris_px.is_finite()) {
            tracing::debug!(raw_iris_px, "deviation: no usable iris size, skipping");
            return None;
        }

        let iris_px = self.iris.update(raw_iris_px)?;
        let mm_per_px = REFERENCE_IRIS_MM / iris_px;
        let scale_x = image.width as f32 * mm_per_px;
        let scale_y = image.height as f32 * mm_per_px;

        let left_raw = Segments::<AxisDistance>::measure(&corners.left, left.center, scale_x, scale_y);
        let right_raw = Segments::<AxisDistance>::measure(&corners.right, right.center, scale_x, scale_y);
        let left_values = self.left.update(&left_raw);
        let right_values = self.right.update(&right_raw);

        let smoothed = ChannelValues {
            iris_px: Some(iris_px),
            left: left_values,
            right: right_values,
        };

        let mut baseline_frozen = false;
        if self.baseline.is_none() && self.spans_initialized() {
            self.baseline = Some(smoothed);
            baseline_frozen = true;
            tracing::info!(iris_px, mm_per_px, "deviation baseline frozen");
        }

        let deltas = match &self.baseline {
            Some(baseline) => Deltas::between(&smoothed, baseline),
            None => Deltas::unavailable(),
        };

        let crossed = self.counters.record(&deltas);
        if crossed > 0 {
            tracing::warn!(
                crossed,
                left_x = ?deltas.left.x,
                right_x = ?deltas.right.x,
                aggregate_x = ?deltas.aggregate.x,
                total = self.counters.total(),
                "deviation threshold exceeded"
            );
        }

        Some(DeviationReport {
            mm_per_px,
            left_iris_mm: left.diameter_px * mm_per_px,
            right_iris_mm: right.diameter_px * mm_per_px,
            iris_mm: iris_px * mm_per_px,
            smoothed,
            deltas,
            counters: self.counters,
            baseline_frozen,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGE: ImageSize = ImageSize::new(640, 480);

    fn iris_at(x: f32, y: f32) -> IrisMeasurement {
        IrisMeasurement {
            diameter_px: 22.4,
            center: Landmark::new(x, y),
            depth_mm: None,
        }
    }

    fn corners() -> FaceCorners {
        FaceCorners {
            right: EyeCorners {
                outer: Landmark::new(0.78, 0.49),
                inner: Landmark::new(0.62, 0.51),
            },
            left: EyeCorners {
                outer: Landmark::new(0.22, 0.49),
                inner: Landmark::new(0.38, 0.51),
            },
        }
    }

    fn values(x: f32, y: f32, euclidean: f32) -> AxisValues {
        AxisValues {
            x: Some(x),
            y: Some(y),
            euclidean: Some(euclidean),
        }
    }

    #[test]
    fn test_no_deltas_before_baseline() {
        let det = DeviationDetector::new();
        assert!(det.baseline().is_none());
        assert_eq!(Deltas::unavailable().left.x, None);
        assert_eq!(Deltas::unavailable().aggregate.euclidean, None);
    }

    #[test]
    fn test_first_frame_freezes_baseline() {
        let mut det = DeviationDetector::new();
        let report = det
            .observe(&iris_at(0.3, 0.5), &iris_at(0.7, 0.5), &corners(), IMAGE)
            .unwrap();
        assert!(report.baseline_frozen);
        assert_eq!(det.baseline(), Some(&report.smoothed));
        // Baseline compared against itself.
        assert_eq!(report.deltas.left.x, Some(0.0));
        assert_eq!(report.deltas.aggregate.euclidean, Some(0.0));
    }

    #[test]
    fn test_zero_distance_at_freeze_leaves_delta_unavailable() {
        let mut level = corners();
        level.left.outer = Landmark::new(0.22, 0.5);

        let mut det = DeviationDetector::new();
        let first = det
            .observe(&iris_at(0.3, 0.5), &iris_at(0.7, 0.5), &level, IMAGE)
            .unwrap();
        assert!(first.baseline_frozen);
        assert_eq!(det.baseline().unwrap().left.outer.y, None);

        for _ in 0..5 {
            let report = det
                .observe(&iris_at(0.3, 0.52), &iris_at(0.7, 0.5), &level, IMAGE)
                .unwrap();
            assert!(report.smoothed.left.outer.y.is_some());
            assert_eq!(report.deltas.left.y, None);
            assert_eq!(report.deltas.aggregate.y, None);
            assert!(report.deltas.left.x.is_some());
        }
        assert_eq!(det.baseline().unwrap().left.outer.y, None);
    }

    #[test]
    fn test_baseline_never_overwritten() {
        let mut det = DeviationDetector::new();
        det.observe(&iris_at(0.3, 0.5), &iris_at(0.7, 0.5), &corners(), IMAGE);
        let frozen = *det.baseline().unwrap();

        for i in 1..20 {
            let shift = i as f32 * 0.001;
            let report = det
                .observe(
                    &iris_at(0.3 + shift, 0.5),
                    &iris_at(0.7 + shift, 0.5),
                    &corners(),
                    IMAGE,
                )
                .unwrap();
            assert!(!report.baseline_frozen);
            assert_ne!(report.smoothed.left.inner.x, frozen.left.inner.x);
        }
        assert_eq!(det.baseline(), Some(&frozen));
    }

    #[test]
    fn test_invalid_iris_size_leaves_state_untouched() {
        let mut det = DeviationDetector::new();
        let mut zero = iris_at(0.3, 0.5);
        zero.diameter_px = 0.0;
        assert!(det.observe(&zero, &zero, &corners(), IMAGE).is_none());
        assert!(det.baseline().is_none());
        assert_eq!(det.values(), ChannelValues::default());
    }

    #[test]
    fn test_aggregate_uses_larger_iris() {
        let mut det = DeviationDetector::new();
        let mut small = iris_at(0.3, 0.5);
        small.diameter_px = 10.0;
        let report = det
            .observe(&small, &iris_at(0.7, 0.5), &corners(), IMAGE)
            .unwrap();
        assert_eq!(report.smoothed.iris_px, Some(22.4));
        assert!((report.iris_mm - REFERENCE_IRIS_MM).abs() < 1e-4);
        assert!((report.left_iris_mm - 10.0 * REFERENCE_IRIS_MM / 22.4).abs() < 1e-4);
    }

    #[test]
    fn test_delta_formula() {
        let base = Segments {
            span: values(10.0, 1.0, 10.05),
            outer: values(5.0, 0.5, 5.02),
            inner: values(5.0, 0.5, 5.02),
        };
        let moved = Segments {
            span: base.span,
            outer: values(4.0, 0.5, 4.03),
            inner: values(6.0, 0.5, 6.02),
        };
        let baseline = ChannelValues {
            iris_px: Some(20.0),
            left: base,
            right: base,
        };
        let current = ChannelValues {
            iris_px: Some(20.0),
            left: moved,
            right: base,
        };

        let deltas = Deltas::between(&current, &baseline);
        // ((6 - 5) - (4 - 5)) * 4 / 2 = 4
        assert!((deltas.left.x.unwrap() - 4.0).abs() < 1e-5);
        assert_eq!(deltas.left.y, Some(0.0));
        assert_eq!(deltas.right.x, Some(0.0));
        assert!((deltas.aggregate.x.unwrap() - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_missing_channel_makes_delta_unavailable() {
        let mut base = Segments {
            span: values(10.0, 1.0, 10.05),
            outer: values(5.0, 0.5, 5.02),
            inner: values(5.0, 0.5, 5.02),
        };
        base.inner.y = None;
        let snapshot = ChannelValues {
            iris_px: Some(20.0),
            left: base,
            right: base,
        };
        let deltas = Deltas::between(&snapshot, &snapshot);
        assert_eq!(deltas.left.x, Some(0.0));
        assert_eq!(deltas.left.y, None);
        assert_eq!(deltas.aggregate.y, None);
    }

    #[test]
    fn test_counters_increment_by_one_per_frame() {
        let mut counts = AxisCounts::default();
        let huge = values(600.0, 6.5, -100.0);
        assert_eq!(counts.record(&huge, DEVIATION_THRESHOLD_MM), 2);
        assert_eq!(counts.x, 1);
        assert_eq!(counts.y, 1);
        assert_eq!(counts.euclidean, 0);

        // Exactly at the threshold does not count.
        counts.record(&values(6.0, 0.0, 0.0), DEVIATION_THRESHOLD_MM);
        assert_eq!(counts.x, 1);

        counts.record(&AxisValues::default(), DEVIATION_THRESHOLD_MM);
        assert_eq!(counts.total(), 2);
    }

    #[test]
    fn test_sustained_abduction_raises_warnings() {
        let mut det = DeviationDetector::new();
        det.observe(&iris_at(0.3, 0.5), &iris_at(0.7, 0.5), &corners(), IMAGE);

        // Left iris drifts toward its outer corner; right eye holds still.
        let mut previous = 0;
        let mut warned_frames = 0;
        for _ in 0..40 {
            let report = det
                .observe(&iris_at(0.29, 0.5), &iris_at(0.7, 0.5), &corners(), IMAGE)
                .unwrap();
            let left_x = report.deltas.left.x.unwrap();
            let count = report.counters.left.x;
            if left_x > DEVIATION_THRESHOLD_MM {
                assert_eq!(count, previous + 1);
                warned_frames += 1;
            } else {
                assert_eq!(count, previous);
            }
            previous = count;
        }

        assert!(warned_frames > 0);
        assert_eq!(det.counters().left.x, warned_frames);
        assert_eq!(det.counters().right.x, 0);
    }
}
