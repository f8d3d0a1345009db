//! anchordet turns raw anchor-grid detector outputs into image-space
//! detections.
//!
//! The crate covers the work around an inference engine: letterboxing a
//! frame to the network input size, decoding per-head NHWC output tensors
//! with their anchor tables, confidence filtering, non-maximum suppression
//! and mapping the survivors back to the source image. It does not run
//! inference. Parallel frame batches are available via the `rayon` feature.

pub mod candidate;
pub mod decode;
pub mod detection;
pub mod image;
pub mod lowlevel;
pub mod pipeline;
pub mod tensor;
mod trace;
pub mod transform;
pub mod util;

#[cfg(feature = "image-io")]
pub use image::io;

pub use candidate::filter::{ScoreFilter, ScoreMode};
pub use candidate::nms::{NmsEngine, NmsMethod};
pub use candidate::Candidate;
pub use decode::{AnchorDecoder, AnchorSpec, DecodeConfig, Decoded, SkippedHead};
pub use detection::{Detection, DetectorOutput, Keypoint, KeypointSet};
pub use image::{ImageView, OwnedImage};
pub use pipeline::{FrameDetections, Pipeline, PipelineConfig};
pub use tensor::{OwnedTensor, TensorView};
pub use transform::{Letterbox, LetterboxedImage, Padding, Unmap};
pub use util::{AnchorDetError, AnchorDetResult};
