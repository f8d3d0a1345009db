//! Geometry helpers for axis-aligned boxes.

/// Area of an axis-aligned box, zero for inverted corners.
pub(crate) fn box_area(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    (x2 - x1).max(0.0) * (y2 - y1).max(0.0)
}

/// Length of the overlap between `[a0, a1]` and `[b0, b1]`.
pub(crate) fn overlap_1d(a0: f32, a1: f32, b0: f32, b1: f32) -> f32 {
    (a1.min(b1) - a0.max(b0)).max(0.0)
}

/// Returns true when every value is finite.
pub(crate) fn all_finite(values: &[f32]) -> bool {
    values.iter().all(|v| v.is_finite())
}
