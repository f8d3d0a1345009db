//! Anchor-grid decoding of raw detection heads.
//!
//! Each head is an NHWC tensor whose channels pack `num_anchors` slots of
//! `detect_dim = 5 + num_classes + 3 * num_keypoints` values:
//! `(x, y, w, h, objectness, class scores.., keypoint triples..)`.
//!
//! Heads are matched to anchor tables by ascending grid height, so the
//! coarsest head takes the first table. Within a head, slot `i` is attributed
//! to anchor `i % num_anchors`, column `(i / num_anchors) % width` and row
//! `(i / num_anchors / width) % height`; that flattening order is part of the
//! tensor contract.

mod anchors;

pub use anchors::AnchorSpec;

use crate::candidate::filter::ScoreFilter;
use crate::candidate::Candidate;
use crate::detection::Keypoint;
use crate::tensor::TensorView;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::math::all_finite;
use crate::util::{AnchorDetError, AnchorDetResult};

/// Number of box values preceding the class scores in a slot.
const BOX_DIM: usize = 5;

/// Layout of the per-slot values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeConfig {
    /// Number of class scores per slot.
    pub num_classes: usize,
    /// Number of `(x, y, score)` keypoint triples per slot.
    pub num_keypoints: usize,
}

impl DecodeConfig {
    /// Returns the number of values per anchor slot.
    pub fn detect_dim(&self) -> usize {
        BOX_DIM + self.num_classes + 3 * self.num_keypoints
    }
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            num_classes: 80,
            num_keypoints: 0,
        }
    }
}

/// A head left out of the decode, with the reason.
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedHead {
    /// Index of the head in the caller's input order.
    pub head: usize,
    pub reason: AnchorDetError,
}

/// Result of decoding all heads of one batch item.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Decoded {
    /// Candidates in decode order.
    pub candidates: Vec<Candidate>,
    pub skipped_heads: Vec<SkippedHead>,
}

/// Converts raw head tensors into scored candidates.
#[derive(Clone, Debug)]
pub struct AnchorDecoder {
    specs: Vec<AnchorSpec>,
    cfg: DecodeConfig,
    filter: ScoreFilter,
}

impl AnchorDecoder {
    /// Creates a decoder for heads described by `specs`, ordered by
    /// ascending grid height.
    pub fn new(
        specs: Vec<AnchorSpec>,
        cfg: DecodeConfig,
        filter: ScoreFilter,
    ) -> AnchorDetResult<Self> {
        if specs.is_empty() {
            return Err(AnchorDetError::InvalidConfig {
                reason: "at least one anchor spec is required",
            });
        }
        if cfg.num_classes == 0 {
            return Err(AnchorDetError::InvalidConfig {
                reason: "num_classes must be at least 1",
            });
        }
        Ok(Self { specs, cfg, filter })
    }

    /// Returns the anchor tables.
    pub fn specs(&self) -> &[AnchorSpec] {
        &self.specs
    }

    /// Returns the slot layout.
    pub fn config(&self) -> DecodeConfig {
        self.cfg
    }

    /// Returns the confidence policy.
    pub fn filter(&self) -> ScoreFilter {
        self.filter
    }

    /// Decodes batch item `batch` of every head.
    ///
    /// Heads that cannot be decoded are skipped and reported; the remaining
    /// heads still contribute candidates.
    pub fn decode(&self, heads: &[TensorView<'_>], batch: usize) -> Decoded {
        let _span = trace_span!("decode", heads = heads.len(), batch = batch).entered();

        let mut order: Vec<usize> = (0..heads.len()).collect();
        order.sort_by_key(|&idx| heads[idx].height());

        let mut decoded = Decoded::default();
        for (rank, &head_idx) in order.iter().enumerate() {
            let result = match self.specs.get(rank) {
                Some(spec) => self.decode_head(
                    head_idx,
                    heads[head_idx],
                    spec,
                    batch,
                    &mut decoded.candidates,
                ),
                None => Err(AnchorDetError::IndexOutOfBounds {
                    index: rank,
                    len: self.specs.len(),
                    context: "anchor spec",
                }),
            };
            if let Err(reason) = result {
                trace_warn!(
                    "skipping detection head",
                    head = head_idx,
                    channels = heads[head_idx].channels(),
                    reason = reason.to_string().as_str(),
                );
                decoded.skipped_heads.push(SkippedHead {
                    head: head_idx,
                    reason,
                });
            }
        }

        trace_event!(
            "decode_candidates",
            count = decoded.candidates.len(),
            skipped = decoded.skipped_heads.len()
        );
        decoded
    }

    fn decode_head(
        &self,
        head_idx: usize,
        head: TensorView<'_>,
        spec: &AnchorSpec,
        batch: usize,
        out: &mut Vec<Candidate>,
    ) -> AnchorDetResult<()> {
        let num_anchor = spec.num_anchors();
        let detect_dim = self.cfg.detect_dim();
        let expected = num_anchor * detect_dim;
        if head.channels() != expected {
            return Err(AnchorDetError::MalformedHead {
                head: head_idx,
                channels: head.channels(),
                expected,
            });
        }
        let item = head.item(batch).ok_or(AnchorDetError::IndexOutOfBounds {
            index: batch,
            len: head.batch(),
            context: "batch",
        })?;

        let grid = Grid {
            width: head.width(),
            height: head.height(),
            num_anchor,
        };
        let count = grid.height * grid.width * num_anchor;
        for i in 0..count {
            let start = i * detect_dim;
            let slot = item
                .get(start..start + detect_dim)
                .ok_or(AnchorDetError::BufferTooSmall {
                    needed: start + detect_dim,
                    got: item.len(),
                })?;
            if let Some(candidate) = self.decode_slot(slot, i, grid, spec) {
                out.push(candidate);
            }
        }
        Ok(())
    }

    fn decode_slot(
        &self,
        slot: &[f32],
        index: usize,
        grid: Grid,
        spec: &AnchorSpec,
    ) -> Option<Candidate> {
        let objectness = slot[4];
        if !self.filter.accepts_objectness(objectness) {
            return None;
        }

        let (col, row, anchor) = grid.cell(index);
        let stride = spec.stride();
        let (anchor_w, anchor_h) = *spec.anchors().get(anchor)?;

        let cx = (slot[0] * 2.0 - 0.5 + col as f32) * stride;
        let cy = (slot[1] * 2.0 - 0.5 + row as f32) * stride;
        let w = (slot[2] * 2.0).powi(2) * anchor_w;
        let h = (slot[3] * 2.0).powi(2) * anchor_h;

        let class_scores = &slot[BOX_DIM..BOX_DIM + self.cfg.num_classes];
        let (class_id, max_score) = argmax(class_scores)?;
        let score = max_score * objectness;
        if !score.is_finite() || !self.filter.accepts_confidence(score) {
            return None;
        }

        let corners = [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0];
        if !all_finite(&corners) {
            return None;
        }

        let kpt_base = BOX_DIM + self.cfg.num_classes;
        let keypoints = (0..self.cfg.num_keypoints)
            .map(|k| {
                let base = kpt_base + 3 * k;
                Keypoint {
                    x: (slot[base] * 2.0 - 0.5 + col as f32) * stride,
                    y: (slot[base + 1] * 2.0 - 0.5 + row as f32) * stride,
                    score: slot[base + 2],
                }
            })
            .collect();

        Some(Candidate {
            x1: corners[0],
            y1: corners[1],
            x2: corners[2],
            y2: corners[3],
            score: score.clamp(0.0, 1.0),
            class_id,
            keypoints,
        })
    }
}

#[derive(Clone, Copy, Debug)]
struct Grid {
    width: usize,
    height: usize,
    num_anchor: usize,
}

impl Grid {
    /// Returns `(col, row, anchor)` for linear slot index `i`.
    #[inline]
    fn cell(&self, i: usize) -> (usize, usize, usize) {
        let col = (i / self.num_anchor) % self.width;
        let row = (i / self.num_anchor / self.width) % self.height;
        (col, row, i % self.num_anchor)
    }
}

/// Index and value of the first maximum; `None` for an empty slice.
fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    let (&first, rest) = values.split_first()?;
    let mut best_idx = 0usize;
    let mut best = first;
    for (idx, &value) in rest.iter().enumerate() {
        if value > best {
            best = value;
            best_idx = idx + 1;
        }
    }
    Some((best_idx, best))
}

#[cfg(test)]
mod tests {
    use super::{argmax, Grid};

    #[test]
    fn argmax_prefers_first_maximum() {
        assert_eq!(argmax(&[0.1, 0.7, 0.7, 0.2]), Some((1, 0.7)));
        assert_eq!(argmax(&[0.3]), Some((0, 0.3)));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn grid_cell_follows_anchor_minor_order() {
        let grid = Grid {
            width: 3,
            height: 2,
            num_anchor: 2,
        };
        assert_eq!(grid.cell(0), (0, 0, 0));
        assert_eq!(grid.cell(1), (0, 0, 1));
        assert_eq!(grid.cell(2), (1, 0, 0));
        assert_eq!(grid.cell(7), (0, 1, 1));
        assert_eq!(grid.cell(11), (2, 1, 1));
    }
}
