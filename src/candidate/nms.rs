//! Non-maximum suppression over decoded candidates.
//!
//! Candidates are ordered by descending score (stable, so equal scores keep
//! their decode order) and selected greedily. Hard NMS removes every
//! remaining candidate whose IoU with a selected one exceeds the threshold;
//! soft NMS decays its score instead. In class-aware mode only candidates of
//! the same class interact.

use crate::candidate::{sort_candidates_desc, Candidate};
use crate::trace::{trace_event, trace_span};
use crate::util::math::{box_area, overlap_1d};
use crate::util::{AnchorDetError, AnchorDetResult};

/// Intersection over union of two axis-aligned boxes.
///
/// Returns zero for disjoint boxes and for a zero union.
pub fn iou(a: &Candidate, b: &Candidate) -> f32 {
    let inter = overlap_1d(a.x1, a.x2, b.x1, b.x2) * overlap_1d(a.y1, a.y2, b.y1, b.y2);
    if inter <= 0.0 {
        return 0.0;
    }
    let union = box_area(a.x1, a.y1, a.x2, a.y2) + box_area(b.x1, b.y1, b.x2, b.y2) - inter;
    if union <= 0.0 {
        return 0.0;
    }
    inter / union
}

/// Suppression strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum NmsMethod {
    /// Remove overlapping candidates.
    #[default]
    Hard,
    /// Decay overlapping scores by `exp(-iou^2 / sigma)` and drop those that
    /// fall below `score_threshold`.
    Soft { sigma: f32, score_threshold: f32 },
}

/// Greedy score-ordered suppression engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NmsEngine {
    iou_threshold: f32,
    class_agnostic: bool,
    method: NmsMethod,
}

impl NmsEngine {
    /// Creates a hard NMS engine; `iou_threshold` must lie in `[0, 1]`.
    pub fn new(iou_threshold: f32, class_agnostic: bool) -> AnchorDetResult<Self> {
        if !(0.0..=1.0).contains(&iou_threshold) {
            return Err(AnchorDetError::InvalidConfig {
                reason: "nms iou threshold must be within [0, 1]",
            });
        }
        Ok(Self {
            iou_threshold,
            class_agnostic,
            method: NmsMethod::Hard,
        })
    }

    /// Replaces the suppression strategy.
    pub fn with_method(mut self, method: NmsMethod) -> AnchorDetResult<Self> {
        if let NmsMethod::Soft {
            sigma,
            score_threshold,
        } = method
        {
            if !(sigma.is_finite() && sigma > 0.0) {
                return Err(AnchorDetError::InvalidConfig {
                    reason: "soft nms sigma must be positive",
                });
            }
            if !(0.0..=1.0).contains(&score_threshold) {
                return Err(AnchorDetError::InvalidConfig {
                    reason: "soft nms score threshold must be within [0, 1]",
                });
            }
        }
        self.method = method;
        Ok(self)
    }

    /// Returns the IoU threshold.
    pub fn iou_threshold(&self) -> f32 {
        self.iou_threshold
    }

    /// Returns true when suppression ignores class ids.
    pub fn class_agnostic(&self) -> bool {
        self.class_agnostic
    }

    /// Returns the suppression strategy.
    pub fn method(&self) -> NmsMethod {
        self.method
    }

    fn interacts(&self, a: &Candidate, b: &Candidate) -> bool {
        self.class_agnostic || a.class_id == b.class_id
    }

    /// Suppresses overlapping candidates; survivors come back in selection
    /// order (descending score).
    pub fn suppress(&self, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        let _span = trace_span!("nms", candidates = candidates.len()).entered();
        sort_candidates_desc(&mut candidates);
        let kept = match self.method {
            NmsMethod::Hard => self.suppress_hard(candidates),
            NmsMethod::Soft {
                sigma,
                score_threshold,
            } => self.suppress_soft(candidates, sigma, score_threshold),
        };
        trace_event!("nms_kept", count = kept.len());
        kept
    }

    fn suppress_hard(&self, candidates: Vec<Candidate>) -> Vec<Candidate> {
        let mut kept: Vec<Candidate> = Vec::new();

        'outer: for candidate in candidates {
            for kept_candidate in kept.iter() {
                if self.interacts(&candidate, kept_candidate)
                    && iou(&candidate, kept_candidate) > self.iou_threshold
                {
                    continue 'outer;
                }
            }
            kept.push(candidate);
        }

        kept
    }

    fn suppress_soft(
        &self,
        mut remaining: Vec<Candidate>,
        sigma: f32,
        score_threshold: f32,
    ) -> Vec<Candidate> {
        let mut kept = Vec::new();

        while !remaining.is_empty() {
            // First maximum wins so equal scores keep their decode order.
            let mut best_idx = 0usize;
            for (idx, candidate) in remaining.iter().enumerate().skip(1) {
                if candidate.score > remaining[best_idx].score {
                    best_idx = idx;
                }
            }
            let best = remaining.remove(best_idx);

            for candidate in remaining.iter_mut() {
                if !self.interacts(candidate, &best) {
                    continue;
                }
                let overlap = iou(candidate, &best);
                if overlap > self.iou_threshold {
                    candidate.score *= (-(overlap * overlap) / sigma).exp();
                }
            }
            remaining.retain(|c| c.score >= score_threshold);
            kept.push(best);
        }

        kept
    }
}

impl Default for NmsEngine {
    fn default() -> Self {
        Self {
            iou_threshold: 0.45,
            class_agnostic: false,
            method: NmsMethod::Hard,
        }
    }
}
