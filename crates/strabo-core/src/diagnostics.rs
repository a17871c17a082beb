//! Text lines shown next to the iris overlay.

use crate::deviation::{
    AxisCounts, DeviationReport, Segments, DELTA_ADJUST_MM, DEVIATION_THRESHOLD_MM,
};
use crate::filter::AxisValues;
use crate::geometry::REFERENCE_IRIS_MM;

fn mm(value: Option<f32>) -> String {
    match value {
        Some(v) => format!("{v:5.1}"),
        None => "  n/a".to_string(),
    }
}

fn axis_line(label: &str, v: &AxisValues) -> String {
    format!(
        "{label} : d{}, x{}, y{} mm",
        mm(v.euclidean),
        mm(v.x),
        mm(v.y)
    )
}

fn count_line(label: &str, c: &AxisCounts) -> String {
    format!("{label} : d {}, x {}, y {}", c.euclidean, c.x, c.y)
}

/// Depth lines for each eye with a finite depth, in centimeters.
pub fn depth_lines(left_mm: Option<f32>, right_mm: Option<f32>) -> Vec<String> {
    [("Left", left_mm), ("Right", right_mm)]
        .into_iter()
        .filter_map(|(label, depth)| {
            let depth = depth.filter(|d| d.is_finite())?;
            Some(format!("{label} : {} cm", (depth / 10.0).round()))
        })
        .collect()
}

fn eye_lines(
    side: &str,
    iris_mm: f32,
    segments: &Segments<AxisValues>,
    delta: &AxisValues,
    counts: &AxisCounts,
) -> [String; 6] {
    [
        format!("{side} iris size : {} mm", mm(Some(iris_mm))),
        axis_line(&format!("{side} span"), &segments.span),
        axis_line(&format!("{side} outer"), &segments.outer),
        axis_line(&format!("{side} inner"), &segments.inner),
        axis_line(&format!("{side} delta"), delta),
        count_line(&format!("{side} count"), counts),
    ]
}

/// Measurement, delta and counter lines for one detector step.
pub fn deviation_lines(report: &DeviationReport) -> Vec<String> {
    let mut lines = Vec::with_capacity(16);
    lines.extend(eye_lines(
        "left",
        report.left_iris_mm,
        &report.smoothed.left,
        &report.deltas.left,
        &report.counters.left,
    ));
    lines.extend(eye_lines(
        "right",
        report.right_iris_mm,
        &report.smoothed.right,
        &report.deltas.right,
        &report.counters.right,
    ));
    lines.push(format!("iris : {} mm", mm(Some(report.iris_mm))));
    lines.push(axis_line("delta", &report.deltas.aggregate));
    lines.push(count_line("count", &report.counters.aggregate));
    lines.push(format!(
        "const : iris {}, calc {}, delta {} mm",
        mm(Some(REFERENCE_IRIS_MM)),
        mm(Some(DELTA_ADJUST_MM)),
        mm(Some(DEVIATION_THRESHOLD_MM))
    ));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deviation::{ChannelValues, Deltas, WarningCounters};

    #[test]
    fn test_depth_lines_round_to_centimeters() {
        assert_eq!(
            depth_lines(Some(271.9), Some(455.0)),
            vec!["Left : 27 cm".to_string(), "Right : 46 cm".to_string()]
        );
    }

    #[test]
    fn test_depth_lines_skip_missing_and_infinite() {
        assert_eq!(
            depth_lines(None, Some(f32::INFINITY)),
            Vec::<String>::new()
        );
        assert_eq!(depth_lines(Some(f32::INFINITY), Some(300.0)), vec!["Right : 30 cm"]);
    }

    #[test]
    fn test_deviation_lines_layout() {
        let report = DeviationReport {
            mm_per_px: 0.5,
            left_iris_mm: 11.5,
            right_iris_mm: 11.8,
            iris_mm: 11.8,
            smoothed: ChannelValues::default(),
            deltas: Deltas::unavailable(),
            counters: WarningCounters::default(),
            baseline_frozen: false,
        };
        let lines = deviation_lines(&report);
        assert_eq!(lines.len(), 16);
        assert_eq!(lines[0], "left iris size :  11.5 mm");
        assert_eq!(lines[4], "left delta : d  n/a, x  n/a, y  n/a mm");
        assert_eq!(lines[5], "left count : d 0, x 0, y 0");
        assert_eq!(lines[6], "right iris size :  11.8 mm");
        assert_eq!(lines[12], "iris :  11.8 mm");
        assert_eq!(lines[15], "const : iris  11.8, calc   4.0, delta   6.0 mm");
    }

    #[test]
    fn test_axis_line_formats_values() {
        let v = AxisValues {
            x: Some(3.0),
            y: Some(-0.24),
            euclidean: Some(12.345),
        };
        assert_eq!(axis_line("delta", &v), "delta : d 12.3, x  3.0, y -0.2 mm");
    }
}
