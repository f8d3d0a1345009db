//! Candidate boxes between decode and final output.
//!
//! Includes confidence filtering and non-maximum suppression.

pub mod filter;
pub mod nms;

use crate::detection::{Detection, Keypoint};
use std::cmp::Ordering;

/// Decoded box in network-input pixel space.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    /// Best class score times objectness.
    pub score: f32,
    pub class_id: usize,
    /// Keypoints decoded alongside the box, in network-input space.
    pub keypoints: Vec<Keypoint>,
}

impl Candidate {
    /// Converts the candidate into a detection over an image of the given size.
    pub fn into_detection(self, image_width: usize, image_height: usize) -> Detection {
        Detection {
            x1: self.x1,
            y1: self.y1,
            x2: self.x2,
            y2: self.y2,
            score: self.score,
            class_id: self.class_id,
            image_width,
            image_height,
            keypoints: self.keypoints,
        }
    }
}

fn score_cmp_desc(a: &Candidate, b: &Candidate) -> Ordering {
    b.score.total_cmp(&a.score)
}

/// Sorts candidates by descending score; equal scores keep their order.
pub(crate) fn sort_candidates_desc(candidates: &mut [Candidate]) {
    candidates.sort_by(score_cmp_desc);
}
