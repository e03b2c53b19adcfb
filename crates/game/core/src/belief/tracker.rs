use std::sync::Arc;

use super::{BeliefError, BeliefState, ConfidenceScore, FrameEvidence, normalize_with_floor};
use crate::config::MatchConfig;
use crate::distribution::Target;
use crate::frame::FrameCandidate;
use crate::state::Cell;

/// What the enemy learned from the previous turn's shot.
///
/// Only produced when the enemy repositioned last turn and the ally then
/// fired, so the shot's target confirms or refutes each frame's reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShotFeedback {
    pub fired_at: Cell,
}

/// Summary of one belief update, for events and logs.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BeliefUpdate {
    pub weights: Vec<(FrameCandidate, f64)>,
    /// Every candidate scored zero confidence; prior weights were kept.
    pub evidence_collapsed: bool,
    /// Frames were nudged by last turn's shot.
    pub nudged: bool,
}

/// Applies one turn of evidence to a [`BeliefState`].
#[derive(Clone, Debug)]
pub struct BeliefTracker {
    scorer: Arc<dyn ConfidenceScore>,
    confirmation_factor: f64,
    disconfirmation_factor: f64,
    floor: f64,
}

impl BeliefTracker {
    pub fn from_config(config: &MatchConfig) -> Self {
        Self {
            scorer: config.confidence.scorer(),
            confirmation_factor: config.confirmation_factor,
            disconfirmation_factor: config.disconfirmation_factor,
            floor: config.belief_floor,
        }
    }

    /// Updates `belief` with this turn's per-candidate interpretations.
    ///
    /// 1. Each weight is multiplied by the confidence of its candidate's
    ///    interpretation, then renormalized. If every confidence is zero the
    ///    prior weights are kept.
    /// 2. With `feedback`, named frames whose previous reading pointed at the
    ///    fired cell are multiplied by the confirmation factor and the rest by
    ///    the disconfirmation factor. The residual is never nudged.
    /// 3. Weights are renormalized with the floor applied.
    pub fn update(
        &self,
        belief: &mut BeliefState,
        evidence: &[FrameEvidence],
        feedback: Option<ShotFeedback>,
    ) -> Result<BeliefUpdate, BeliefError> {
        let aligned = align_evidence(belief, evidence)?;

        let consistency: Vec<Option<bool>> = belief
            .frames()
            .iter()
            .map(|frame| {
                let fired_at = feedback?.fired_at;
                if frame.candidate.is_residual() {
                    return None;
                }
                let previous = frame.last_distribution.as_ref()?;
                Some(previous.most_likely() == Target::Cell(fired_at))
            })
            .collect();

        let prior: Vec<f64> = belief.frames().iter().map(|frame| frame.weight).collect();
        let scaled: Vec<f64> = prior
            .iter()
            .zip(&aligned)
            .map(|(weight, evidence)| {
                weight * self.scorer.confidence(&evidence.distribution).clamp(0.0, 1.0)
            })
            .collect();
        let total: f64 = scaled.iter().sum();
        let evidence_collapsed = !total.is_finite() || total <= f64::EPSILON;

        let mut weights = if evidence_collapsed {
            prior
        } else {
            scaled.iter().map(|weight| weight / total).collect()
        };

        let mut nudged = false;
        for (weight, consistent) in weights.iter_mut().zip(&consistency) {
            match consistent {
                Some(true) => *weight *= self.confirmation_factor,
                Some(false) => *weight *= self.disconfirmation_factor,
                None => continue,
            }
            nudged = true;
        }

        normalize_with_floor(&mut weights, self.floor);

        let frames = belief.frames_mut().iter_mut().zip(weights).zip(aligned);
        for ((frame, weight), evidence) in frames {
            frame.weight = weight;
            frame.last_distribution = Some(evidence.distribution.clone());
        }

        Ok(BeliefUpdate {
            weights: belief.weights(),
            evidence_collapsed,
            nudged,
        })
    }
}

/// Orders `evidence` to match the candidate order of `belief`.
fn align_evidence<'a>(
    belief: &BeliefState,
    evidence: &'a [FrameEvidence],
) -> Result<Vec<&'a FrameEvidence>, BeliefError> {
    if let Some(extra) = evidence.iter().enumerate().find_map(|(index, item)| {
        let known = belief.weight(&item.candidate).is_some();
        let repeated = evidence[..index]
            .iter()
            .any(|earlier| earlier.candidate == item.candidate);
        (!known || repeated).then_some(&item.candidate)
    }) {
        return Err(BeliefError::UnexpectedEvidence(extra.clone()));
    }

    belief
        .frames()
        .iter()
        .map(|frame| {
            evidence
                .iter()
                .find(|item| item.candidate == frame.candidate)
                .ok_or_else(|| BeliefError::MissingEvidence(frame.candidate.clone()))
        })
        .collect()
}
