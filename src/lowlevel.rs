//! Low-level building blocks for custom post-processing pipelines.
//!
//! These expose the individual stages behind [`Pipeline`](crate::Pipeline)
//! for callers that run their own ordering, e.g. decode on one thread and NMS
//! on another, or unmap keypoints produced by a separate landmark model.

pub use crate::candidate::nms::iou;
pub use crate::image::resize::resize_bilinear_u8;
pub use crate::transform::{letterbox_u8, normalize_nchw, NormalizeParams};
