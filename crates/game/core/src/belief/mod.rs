//! The enemy's probabilistic model of which lore frame the player is using.
//!
//! [`BeliefState`] is the data; [`BeliefTracker`] is the only thing allowed
//! to change it, once per turn.

mod confidence;
mod tracker;

pub use confidence::{ConfidenceKind, ConfidenceScore, EntropyConfidence, PeakConfidence};
pub use tracker::{BeliefTracker, BeliefUpdate, ShotFeedback};

use crate::config::MatchConfig;
use crate::distribution::ActionDistribution;
use crate::error::{ErrorSeverity, GameError};
use crate::frame::FrameCandidate;

/// Weight and latest interpretation for one candidate frame.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameBelief {
    pub candidate: FrameCandidate,
    pub weight: f64,
    /// Interpretation of the most recent turn under this frame.
    pub last_distribution: Option<ActionDistribution>,
}

/// Interpretation of the current turn's messages under one candidate frame.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameEvidence {
    pub candidate: FrameCandidate,
    pub distribution: ActionDistribution,
    /// True when the distribution is a neutral fallback, not a real reading.
    pub degraded: bool,
}

impl FrameEvidence {
    pub fn new(candidate: FrameCandidate, distribution: ActionDistribution) -> Self {
        Self {
            candidate,
            distribution,
            degraded: false,
        }
    }

    pub fn degraded(candidate: FrameCandidate, distribution: ActionDistribution) -> Self {
        Self {
            candidate,
            distribution,
            degraded: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BeliefError {
    #[error("no interpretation supplied for candidate {0}")]
    MissingEvidence(FrameCandidate),

    #[error("interpretation supplied for unknown or repeated candidate {0}")]
    UnexpectedEvidence(FrameCandidate),
}

impl GameError for BeliefError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Internal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingEvidence(_) => "BELIEF_MISSING_EVIDENCE",
            Self::UnexpectedEvidence(_) => "BELIEF_UNEXPECTED_EVIDENCE",
        }
    }
}

/// Probability distribution over candidate frames, residual included.
///
/// Weights always sum to 1 and each stays within `[floor, 1 - floor]`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BeliefState {
    frames: Vec<FrameBelief>,
}

impl BeliefState {
    /// Named priors share `1 - residual_weight` in proportion to their
    /// configured weights; the residual candidate comes last.
    pub fn from_config(config: &MatchConfig) -> Self {
        let named_total: f64 = config.candidate_frames.iter().map(|prior| prior.weight).sum();
        let named_mass = 1.0 - config.residual_weight;

        let mut weights: Vec<f64> = config
            .candidate_frames
            .iter()
            .map(|prior| prior.weight / named_total * named_mass)
            .collect();
        weights.push(config.residual_weight);
        normalize_with_floor(&mut weights, config.belief_floor);

        let candidates = config
            .candidate_frames
            .iter()
            .map(|prior| FrameCandidate::Named(prior.frame.clone()))
            .chain(std::iter::once(FrameCandidate::Residual));
        let frames = candidates
            .zip(weights)
            .map(|(candidate, weight)| FrameBelief {
                candidate,
                weight,
                last_distribution: None,
            })
            .collect();
        Self { frames }
    }

    pub fn frames(&self) -> &[FrameBelief] {
        &self.frames
    }

    pub(crate) fn frames_mut(&mut self) -> &mut [FrameBelief] {
        &mut self.frames
    }

    pub fn candidates(&self) -> Vec<FrameCandidate> {
        self.frames
            .iter()
            .map(|frame| frame.candidate.clone())
            .collect()
    }

    pub fn weight(&self, candidate: &FrameCandidate) -> Option<f64> {
        self.frames
            .iter()
            .find(|frame| &frame.candidate == candidate)
            .map(|frame| frame.weight)
    }

    pub fn weights(&self) -> Vec<(FrameCandidate, f64)> {
        self.frames
            .iter()
            .map(|frame| (frame.candidate.clone(), frame.weight))
            .collect()
    }

    pub fn total_weight(&self) -> f64 {
        self.frames.iter().map(|frame| frame.weight).sum()
    }

    /// Heaviest candidate. Ties go to the earliest in configuration order.
    pub fn leading(&self) -> Option<&FrameBelief> {
        self.frames.iter().fold(None, |best, frame| match best {
            Some(current) if current.weight >= frame.weight => Some(current),
            _ => Some(frame),
        })
    }
}

/// Rescales `weights` to sum to 1 while keeping each at or above `floor`.
///
/// Weights that would fall below the floor are pinned to it and the rest
/// share the remaining mass proportionally. When nothing falls below the
/// floor this is a plain normalization.
pub(crate) fn normalize_with_floor(weights: &mut [f64], floor: f64) {
    let mut pinned = vec![false; weights.len()];
    loop {
        let pinned_count = pinned.iter().filter(|&&is_pinned| is_pinned).count();
        let free_count = weights.len() - pinned_count;
        if free_count == 0 {
            break;
        }
        let free_mass = 1.0 - floor * pinned_count as f64;
        let free_total: f64 = weights
            .iter()
            .zip(&pinned)
            .filter(|(_, is_pinned)| !**is_pinned)
            .map(|(weight, _)| *weight)
            .sum();

        for (weight, is_pinned) in weights.iter_mut().zip(&pinned) {
            if *is_pinned {
                continue;
            }
            *weight = if free_total > 0.0 {
                *weight / free_total * free_mass
            } else {
                free_mass / free_count as f64
            };
        }

        let mut changed = false;
        for (weight, is_pinned) in weights.iter_mut().zip(pinned.iter_mut()) {
            if !*is_pinned && *weight < floor {
                *weight = floor;
                *is_pinned = true;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CandidatePrior;

    #[test]
    fn priors_reserve_residual_mass() {
        let config = MatchConfig {
            candidate_frames: vec![CandidatePrior::new("A", 3.0), CandidatePrior::new("B", 1.0)],
            residual_weight: 0.2,
            ..MatchConfig::default()
        };
        let belief = BeliefState::from_config(&config);

        assert!((belief.total_weight() - 1.0).abs() < 1e-9);
        assert!((belief.weight(&FrameCandidate::Named("A".into())).unwrap() - 0.6).abs() < 1e-9);
        assert!((belief.weight(&FrameCandidate::Named("B".into())).unwrap() - 0.2).abs() < 1e-9);
        assert!((belief.weight(&FrameCandidate::Residual).unwrap() - 0.2).abs() < 1e-9);
        assert_eq!(
            belief.leading().map(|frame| frame.candidate.clone()),
            Some(FrameCandidate::Named("A".into()))
        );
    }

    #[test]
    fn floor_pins_small_weights() {
        let mut weights = vec![0.98, 0.019, 0.001];
        normalize_with_floor(&mut weights, 0.05);

        assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(weights.iter().all(|&w| w >= 0.05 - 1e-12));
        assert!(weights.iter().all(|&w| w <= 0.95 + 1e-12));
    }

    #[test]
    fn floor_leaves_in_range_weights_alone() {
        let mut weights = vec![0.5, 0.3, 0.2];
        normalize_with_floor(&mut weights, 0.01);
        for (actual, expected) in weights.iter().zip([0.5, 0.3, 0.2]) {
            assert!((actual - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn zero_mass_spreads_evenly() {
        let mut weights = vec![0.0, 0.0];
        normalize_with_floor(&mut weights, 0.01);
        assert_eq!(weights, vec![0.5, 0.5]);
    }
}
