//! Final detection records in source-image coordinates.
//!
//! A detector produces one of three output kinds, carried by
//! [`DetectorOutput`]: plain boxes, boxes with keypoints (pose heads), or
//! keypoint sets without boxes (landmark models).

/// A 2D keypoint with its confidence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub score: f32,
}

/// A detected object in image coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub score: f32,
    pub class_id: usize,
    /// Width of the image the coordinates refer to.
    pub image_width: usize,
    /// Height of the image the coordinates refer to.
    pub image_height: usize,
    /// Ordered auxiliary points; empty for plain box detectors.
    pub keypoints: Vec<Keypoint>,
}

impl Detection {
    /// Returns the box width.
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    /// Returns the box height.
    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Clips the box and keypoints to `[0, image_width] x [0, image_height]`.
    pub fn clamp_to_image(mut self) -> Self {
        let max_x = self.image_width as f32;
        let max_y = self.image_height as f32;
        self.x1 = self.x1.clamp(0.0, max_x);
        self.y1 = self.y1.clamp(0.0, max_y);
        self.x2 = self.x2.clamp(0.0, max_x);
        self.y2 = self.y2.clamp(0.0, max_y);
        for kp in &mut self.keypoints {
            kp.x = kp.x.clamp(0.0, max_x);
            kp.y = kp.y.clamp(0.0, max_y);
        }
        self
    }

    /// Re-expresses the detection in a view of a different size, e.g. a
    /// preview window showing the same image stretched.
    pub fn rescale_to_view(mut self, view_width: usize, view_height: usize) -> Self {
        if self.image_width == 0 || self.image_height == 0 {
            return self;
        }
        let sx = view_width as f32 / self.image_width as f32;
        let sy = view_height as f32 / self.image_height as f32;
        self.x1 *= sx;
        self.x2 *= sx;
        self.y1 *= sy;
        self.y2 *= sy;
        for kp in &mut self.keypoints {
            kp.x *= sx;
            kp.y *= sy;
        }
        self.image_width = view_width;
        self.image_height = view_height;
        self
    }
}

/// Keypoints of one instance without an enclosing box.
#[derive(Clone, Debug, PartialEq)]
pub struct KeypointSet {
    pub score: f32,
    pub image_width: usize,
    pub image_height: usize,
    pub keypoints: Vec<Keypoint>,
}

/// Detector output, tagged by kind.
#[derive(Clone, Debug, PartialEq)]
pub enum DetectorOutput {
    /// Boxes with class and score.
    Boxes(Vec<Detection>),
    /// Boxes carrying per-instance keypoints.
    BoxesWithKeypoints(Vec<Detection>),
    /// Keypoints only.
    Keypoints(Vec<KeypointSet>),
}

impl DetectorOutput {
    /// Returns the number of detected instances.
    pub fn len(&self) -> usize {
        match self {
            DetectorOutput::Boxes(items) | DetectorOutput::BoxesWithKeypoints(items) => {
                items.len()
            }
            DetectorOutput::Keypoints(items) => items.len(),
        }
    }

    /// Returns true when nothing was detected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns box detections, or `None` for keypoint-only output.
    pub fn detections(&self) -> Option<&[Detection]> {
        match self {
            DetectorOutput::Boxes(items) | DetectorOutput::BoxesWithKeypoints(items) => {
                Some(items)
            }
            DetectorOutput::Keypoints(_) => None,
        }
    }
}
