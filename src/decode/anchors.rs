//! Per-head anchor tables.

use crate::util::{AnchorDetError, AnchorDetResult};

/// Stride and anchor sizes of one detection head.
#[derive(Clone, Debug, PartialEq)]
pub struct AnchorSpec {
    stride: f32,
    anchors: Vec<(f32, f32)>,
}

impl AnchorSpec {
    /// Creates an anchor table; stride and anchor sizes must be positive.
    pub fn new(stride: f32, anchors: Vec<(f32, f32)>) -> AnchorDetResult<Self> {
        if !(stride.is_finite() && stride > 0.0) {
            return Err(AnchorDetError::InvalidConfig {
                reason: "anchor stride must be positive",
            });
        }
        if anchors.is_empty() {
            return Err(AnchorDetError::InvalidConfig {
                reason: "anchor table must not be empty",
            });
        }
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if !anchors.iter().all(|&(w, h)| valid(w) && valid(h)) {
            return Err(AnchorDetError::InvalidConfig {
                reason: "anchor sizes must be positive",
            });
        }
        Ok(Self { stride, anchors })
    }

    /// Returns the downsampling factor of the head.
    pub fn stride(&self) -> f32 {
        self.stride
    }

    /// Returns the `(width, height)` anchor per slot.
    pub fn anchors(&self) -> &[(f32, f32)] {
        &self.anchors
    }

    /// Returns the number of anchor slots.
    pub fn num_anchors(&self) -> usize {
        self.anchors.len()
    }

    /// Anchor tables of YOLOv5 P3-P5 models, ordered by ascending grid
    /// height (stride 32, 16, 8) to match head ordering.
    pub fn yolov5_default() -> Vec<AnchorSpec> {
        vec![
            AnchorSpec {
                stride: 32.0,
                anchors: vec![(116.0, 90.0), (156.0, 198.0), (373.0, 326.0)],
            },
            AnchorSpec {
                stride: 16.0,
                anchors: vec![(30.0, 61.0), (62.0, 45.0), (59.0, 119.0)],
            },
            AnchorSpec {
                stride: 8.0,
                anchors: vec![(10.0, 13.0), (16.0, 30.0), (33.0, 23.0)],
            },
        ]
    }
}
