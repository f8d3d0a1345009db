//! Inverse letterbox mapping for detections and keypoints.

use crate::detection::{Detection, DetectorOutput, Keypoint, KeypointSet};
use crate::transform::Letterbox;

impl Letterbox {
    /// Maps a network-input point back into source-image coordinates.
    ///
    /// Exact inverse of [`Letterbox::map_point`].
    pub fn unmap_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.padding.left as f32) / self.scale,
            (y - self.padding.top as f32) / self.scale,
        )
    }
}

/// Types whose coordinates can be moved from network-input space back to the
/// source image.
pub trait Unmap: Sized {
    /// Returns `self` re-expressed in source-image coordinates.
    fn unmap(self, letterbox: &Letterbox) -> Self;
}

impl Unmap for Keypoint {
    fn unmap(self, letterbox: &Letterbox) -> Self {
        let (x, y) = letterbox.unmap_point(self.x, self.y);
        Keypoint { x, y, ..self }
    }
}

impl Unmap for Detection {
    fn unmap(mut self, letterbox: &Letterbox) -> Self {
        let (x1, y1) = letterbox.unmap_point(self.x1, self.y1);
        let (x2, y2) = letterbox.unmap_point(self.x2, self.y2);
        let (image_width, image_height) = letterbox.src_size();
        self.x1 = x1;
        self.y1 = y1;
        self.x2 = x2;
        self.y2 = y2;
        self.image_width = image_width;
        self.image_height = image_height;
        self.keypoints = unmap_all(self.keypoints, letterbox);
        self
    }
}

impl Unmap for KeypointSet {
    fn unmap(mut self, letterbox: &Letterbox) -> Self {
        let (image_width, image_height) = letterbox.src_size();
        self.image_width = image_width;
        self.image_height = image_height;
        self.keypoints = unmap_all(self.keypoints, letterbox);
        self
    }
}

impl Unmap for DetectorOutput {
    fn unmap(self, letterbox: &Letterbox) -> Self {
        match self {
            DetectorOutput::Boxes(items) => DetectorOutput::Boxes(unmap_all(items, letterbox)),
            DetectorOutput::BoxesWithKeypoints(items) => {
                DetectorOutput::BoxesWithKeypoints(unmap_all(items, letterbox))
            }
            DetectorOutput::Keypoints(items) => {
                DetectorOutput::Keypoints(unmap_all(items, letterbox))
            }
        }
    }
}

fn unmap_all<T: Unmap>(items: Vec<T>, letterbox: &Letterbox) -> Vec<T> {
    items.into_iter().map(|item| item.unmap(letterbox)).collect()
}
