//! Confidence thresholding for decoded candidates.

use crate::candidate::Candidate;
use crate::util::{AnchorDetError, AnchorDetResult};

/// Which value the confidence threshold is compared against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScoreMode {
    /// Compare raw objectness; rejects a slot before its class scores are read.
    #[default]
    Objectness,
    /// Compare the final score (best class score times objectness).
    Confidence,
}

/// Confidence threshold policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoreFilter {
    threshold: f32,
    mode: ScoreMode,
}

impl ScoreFilter {
    /// Creates a filter; `threshold` must lie in `[0, 1]`.
    pub fn new(threshold: f32, mode: ScoreMode) -> AnchorDetResult<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(AnchorDetError::InvalidConfig {
                reason: "confidence threshold must be within [0, 1]",
            });
        }
        Ok(Self { threshold, mode })
    }

    /// Returns the threshold.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Returns the comparison mode.
    pub fn mode(&self) -> ScoreMode {
        self.mode
    }

    /// Returns false when a slot can be rejected from its objectness alone.
    #[inline]
    pub fn accepts_objectness(&self, objectness: f32) -> bool {
        match self.mode {
            ScoreMode::Objectness => objectness >= self.threshold,
            ScoreMode::Confidence => true,
        }
    }

    /// Returns false when a decoded final score falls below the threshold.
    #[inline]
    pub fn accepts_confidence(&self, score: f32) -> bool {
        match self.mode {
            ScoreMode::Objectness => true,
            ScoreMode::Confidence => score >= self.threshold,
        }
    }

    /// Drops candidates whose final score is below the threshold.
    ///
    /// In objectness mode the check already happened during decode and this
    /// keeps every candidate.
    pub fn retain(&self, candidates: &mut Vec<Candidate>) {
        candidates.retain(|c| self.accepts_confidence(c.score));
    }
}

impl Default for ScoreFilter {
    fn default() -> Self {
        Self {
            threshold: 0.25,
            mode: ScoreMode::Objectness,
        }
    }
}
