use super::Policy;
use crate::config::MatchConfig;
use crate::distribution::ActionDistribution;
use crate::state::Cell;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AllyDecision {
    Fire(Cell),
    Hold,
}

impl AllyDecision {
    pub fn target(&self) -> Option<Cell> {
        match self {
            Self::Fire(cell) => Some(*cell),
            Self::Hold => None,
        }
    }
}

/// Fires at the most likely cell when it is likely enough, otherwise holds.
///
/// The ally never sees the board. The same distribution always yields the
/// same decision; ties between cells go to the lowest row-major index.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThresholdAllyPolicy {
    pub fire_threshold: f64,
    pub hold_bias: f64,
}

impl ThresholdAllyPolicy {
    pub fn new(fire_threshold: f64, hold_bias: f64) -> Self {
        Self {
            fire_threshold,
            hold_bias,
        }
    }

    pub fn from_config(config: &MatchConfig) -> Self {
        Self::new(config.fire_threshold, config.hold_bias)
    }
}

impl Policy<ActionDistribution> for ThresholdAllyPolicy {
    type Action = AllyDecision;

    fn decide(&self, distribution: &ActionDistribution) -> AllyDecision {
        let (cell, weight) = distribution.peak_cell();
        let beats_hold = weight >= distribution.hold_weight() + self.hold_bias;
        if weight >= self.fire_threshold && beats_hold {
            AllyDecision::Fire(cell)
        } else {
            AllyDecision::Hold
        }
    }
}
