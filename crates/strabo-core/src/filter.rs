//! Exponential moving average over per-frame measurements.
//!
//! Landmark positions jitter by a pixel or two from frame to frame. Each
//! tracked scalar runs through a first-order IIR low-pass filter:
//!
//! ```text
//! value = value * (1 - α) + raw * α
//! ```
//!
//! The first valid sample is taken as-is (cold start), so the filter is
//! never pulled toward an arbitrary initial value.

use serde::Serialize;

use crate::geometry::AxisDistance;

/// Weight of the newest sample.
pub const SMOOTHING_WEIGHT: f32 = 0.1;

/// One smoothed scalar. `None` until the first valid sample arrives.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FilterChannel {
    value: Option<f32>,
}

impl FilterChannel {
    pub const fn new() -> Self {
        Self { value: None }
    }

    /// Current smoothed value, if any valid sample has been seen.
    pub fn value(&self) -> Option<f32> {
        self.value.filter(|v| v.is_finite())
    }

    pub fn is_initialized(&self) -> bool {
        self.value().is_some()
    }

    /// Feed one raw sample using [`SMOOTHING_WEIGHT`].
    pub fn update(&mut self, raw: f32) -> Option<f32> {
        self.update_with_weight(raw, SMOOTHING_WEIGHT)
    }

    /// Feed one raw sample with an explicit weight.
    ///
    /// Non-positive and non-finite samples are not measurements; the channel
    /// is left untouched and its previous value is returned.
    pub fn update_with_weight(&mut self, raw: f32, weight: f32) -> Option<f32> {
        if !(raw > 0.0 && raw.is_finite()) {
            return self.value();
        }

        let next = match self.value() {
            Some(prev) => prev * (1.0 - weight) + raw * weight,
            None => raw,
        };
        self.value = Some(next);
        Some(next)
    }
}

/// Smoothed x, y and euclidean components of one distance.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisChannels {
    pub x: FilterChannel,
    pub y: FilterChannel,
    pub euclidean: FilterChannel,
}

/// Snapshot of [`AxisChannels`]; absent components have not been initialized.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AxisValues {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub euclidean: Option<f32>,
}

impl AxisChannels {
    pub fn update(&mut self, raw: AxisDistance) -> AxisValues {
        AxisValues {
            x: self.x.update(raw.x),
            y: self.y.update(raw.y),
            euclidean: self.euclidean.update(raw.euclidean),
        }
    }

    pub fn values(&self) -> AxisValues {
        AxisValues {
            x: self.x.value(),
            y: self.y.value(),
            euclidean: self.euclidean.value(),
        }
    }
}
