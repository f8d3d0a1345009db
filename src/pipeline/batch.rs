//! Rayon-parallel post-processing of independent frames (feature-gated).
//!
//! Each frame is a separate pipeline call; the shared [`Pipeline`] is only
//! read, so results match calling [`Pipeline::postprocess`] sequentially.
//! A frame whose letterbox does not fit the pipeline fails the whole batch.

use crate::pipeline::{FrameDetections, Pipeline};
use crate::tensor::TensorView;
use crate::transform::Letterbox;
use crate::util::AnchorDetResult;
use rayon::prelude::*;

/// Raw heads of one frame together with its letterbox mapping.
#[derive(Clone, Debug)]
pub struct Frame<'a> {
    pub heads: Vec<TensorView<'a>>,
    pub letterbox: Letterbox,
}

/// Post-processes frames in parallel, preserving input order.
pub fn postprocess_frames_par(
    pipeline: &Pipeline,
    frames: &[Frame<'_>],
) -> AnchorDetResult<Vec<FrameDetections>> {
    frames
        .par_iter()
        .map(|frame| pipeline.postprocess(&frame.heads, &frame.letterbox))
        .collect()
}
