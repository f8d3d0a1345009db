//! End-to-end post-processing pipeline.
//!
//! A [`Pipeline`] is built once from a [`PipelineConfig`] and then called per
//! frame: [`Pipeline::preprocess`] letterboxes the frame for the inference
//! engine, [`Pipeline::postprocess`] turns the engine's raw head tensors into
//! detections in source-image coordinates. The pipeline holds no per-frame
//! state, so one instance can serve concurrent callers.

#[cfg(feature = "rayon")]
mod batch;

#[cfg(feature = "rayon")]
pub use batch::{postprocess_frames_par, Frame};

use crate::candidate::filter::{ScoreFilter, ScoreMode};
use crate::candidate::nms::{NmsEngine, NmsMethod};
use crate::decode::{AnchorDecoder, AnchorSpec, DecodeConfig, SkippedHead};
use crate::detection::DetectorOutput;
use crate::image::ImageView;
use crate::tensor::TensorView;
use crate::trace::{trace_event, trace_span};
use crate::transform::{letterbox_u8, Letterbox, LetterboxedImage, Unmap};
use crate::util::{AnchorDetError, AnchorDetResult};

/// Construction-time configuration of a [`Pipeline`].
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Network input width in pixels.
    pub input_width: usize,
    /// Network input height in pixels.
    pub input_height: usize,
    /// Number of class scores per anchor slot.
    pub num_classes: usize,
    /// Number of keypoint triples per anchor slot (0 for plain detectors).
    pub num_keypoints: usize,
    /// Minimum confidence, in `[0, 1]`.
    pub confidence_threshold: f32,
    /// Value compared against `confidence_threshold`.
    pub score_mode: ScoreMode,
    /// IoU above which NMS suppresses, in `[0, 1]`.
    pub nms_iou_threshold: f32,
    /// Suppress across classes instead of within each class.
    pub class_agnostic_nms: bool,
    /// Suppression strategy.
    pub nms_method: NmsMethod,
    /// Optional cap on the number of returned detections.
    pub max_detections: Option<usize>,
    /// Fill value for letterbox padding.
    pub pad_value: u8,
    /// Anchor tables, ordered by ascending head grid height.
    pub anchor_specs: Vec<AnchorSpec>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_width: 640,
            input_height: 640,
            num_classes: 80,
            num_keypoints: 0,
            confidence_threshold: 0.25,
            score_mode: ScoreMode::Objectness,
            nms_iou_threshold: 0.45,
            class_agnostic_nms: false,
            nms_method: NmsMethod::Hard,
            max_detections: None,
            pad_value: 0,
            anchor_specs: AnchorSpec::yolov5_default(),
        }
    }
}

/// Detections of one frame plus the heads that had to be skipped.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameDetections {
    pub output: DetectorOutput,
    pub skipped_heads: Vec<SkippedHead>,
}

/// Letterbox, decode, NMS and unmapping with fixed configuration.
#[derive(Clone, Debug)]
pub struct Pipeline {
    input_width: usize,
    input_height: usize,
    pad_value: u8,
    max_detections: Option<usize>,
    decoder: AnchorDecoder,
    nms: NmsEngine,
}

impl Pipeline {
    /// Validates `cfg` and builds the pipeline.
    pub fn new(cfg: PipelineConfig) -> AnchorDetResult<Self> {
        if cfg.input_width == 0 || cfg.input_height == 0 {
            return Err(AnchorDetError::InvalidDimensions {
                width: cfg.input_width,
                height: cfg.input_height,
            });
        }
        if cfg.max_detections == Some(0) {
            return Err(AnchorDetError::InvalidConfig {
                reason: "max_detections must be at least 1",
            });
        }
        let filter = ScoreFilter::new(cfg.confidence_threshold, cfg.score_mode)?;
        let decoder = AnchorDecoder::new(
            cfg.anchor_specs,
            DecodeConfig {
                num_classes: cfg.num_classes,
                num_keypoints: cfg.num_keypoints,
            },
            filter,
        )?;
        let nms = NmsEngine::new(cfg.nms_iou_threshold, cfg.class_agnostic_nms)?
            .with_method(cfg.nms_method)?;
        Ok(Self {
            input_width: cfg.input_width,
            input_height: cfg.input_height,
            pad_value: cfg.pad_value,
            max_detections: cfg.max_detections,
            decoder,
            nms,
        })
    }

    /// Returns the network input size `(width, height)`.
    pub fn input_size(&self) -> (usize, usize) {
        (self.input_width, self.input_height)
    }

    /// Returns the decoder stage.
    pub fn decoder(&self) -> &AnchorDecoder {
        &self.decoder
    }

    /// Returns the NMS stage.
    pub fn nms(&self) -> &NmsEngine {
        &self.nms
    }

    /// Computes the letterbox mapping for a source image size without
    /// touching pixels.
    pub fn letterbox_for(&self, width: usize, height: usize) -> AnchorDetResult<Letterbox> {
        Letterbox::compute(width, height, self.input_width, self.input_height)
    }

    /// Letterboxes a frame to the network input size.
    pub fn preprocess(&self, image: ImageView<'_, u8>) -> AnchorDetResult<LetterboxedImage> {
        letterbox_u8(image, self.input_width, self.input_height, self.pad_value)
    }

    /// Decodes batch item 0 of `heads` and maps the detections back through
    /// `letterbox`.
    pub fn postprocess(
        &self,
        heads: &[TensorView<'_>],
        letterbox: &Letterbox,
    ) -> AnchorDetResult<FrameDetections> {
        self.postprocess_item(heads, 0, letterbox)
    }

    /// Decodes batch item `batch` of `heads` and maps the detections back
    /// through `letterbox`.
    ///
    /// `letterbox` must target this pipeline's input size; a mapping built
    /// for another network shape is rejected with
    /// [`AnchorDetError::InvalidGeometry`].
    pub fn postprocess_item(
        &self,
        heads: &[TensorView<'_>],
        batch: usize,
        letterbox: &Letterbox,
    ) -> AnchorDetResult<FrameDetections> {
        let (dst_width, dst_height) = letterbox.dst_size();
        if (dst_width, dst_height) != self.input_size() {
            let (src_width, src_height) = letterbox.src_size();
            return Err(AnchorDetError::InvalidGeometry {
                src_width,
                src_height,
                dst_width,
                dst_height,
            });
        }
        let _span = trace_span!("postprocess", heads = heads.len(), batch = batch).entered();

        let decoded = self.decoder.decode(heads, batch);
        let mut kept = self.nms.suppress(decoded.candidates);
        if let Some(max) = self.max_detections {
            kept.truncate(max);
        }

        let detections: Vec<_> = kept
            .into_iter()
            .map(|c| c.into_detection(dst_width, dst_height))
            .collect();
        let output = if self.decoder.config().num_keypoints > 0 {
            DetectorOutput::BoxesWithKeypoints(detections)
        } else {
            DetectorOutput::Boxes(detections)
        };
        let output = output.unmap(letterbox);

        trace_event!("detections", count = output.len());
        Ok(FrameDetections {
            output,
            skipped_heads: decoded.skipped_heads,
        })
    }
}
