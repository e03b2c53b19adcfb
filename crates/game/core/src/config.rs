//! Tunable parameters for a match.
//!
//! Every threshold the policies and the belief tracker consult lives here, so
//! a single validated value fully determines how both sides behave.

use std::time::Duration;

use crate::belief::ConfidenceKind;
use crate::error::{ErrorSeverity, GameError};
use crate::frame::LoreFrame;

/// Prior weight for one named candidate frame.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CandidatePrior {
    pub frame: LoreFrame,
    pub weight: f64,
}

impl CandidatePrior {
    pub fn new(frame: impl Into<LoreFrame>, weight: f64) -> Self {
        Self {
            frame: frame.into(),
            weight,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchConfig {
    /// Minimum probability the ally needs on a cell before firing.
    pub fire_threshold: f64,
    /// Margin the top cell must hold over Hold, and the Hold mass of
    /// neutral fallback distributions.
    pub hold_bias: f64,
    /// Threat score above which the enemy repositions a ship.
    pub evasion_threshold: f64,
    /// Threat score above which the enemy baits with a hostage.
    pub bait_threshold: f64,
    /// Turn after which the match ends without a decisive outcome.
    pub turn_limit: u32,
    /// Named frames the enemy considers, with prior weights.
    pub candidate_frames: Vec<CandidatePrior>,
    /// Prior weight reserved for "some other frame".
    pub residual_weight: f64,
    /// Deadline for a single interpretation call.
    pub adapter_timeout: Duration,
    /// How many of the hottest cells the enemy flees from when evading.
    pub threat_top_k: usize,
    /// Multiplier for frames whose prediction matched last turn's shot.
    pub confirmation_factor: f64,
    /// Multiplier for frames whose prediction missed last turn's shot.
    pub disconfirmation_factor: f64,
    /// No candidate weight ever drops below this floor.
    pub belief_floor: f64,
    /// How the enemy scores the sharpness of an interpretation.
    pub confidence: ConfidenceKind,
    pub max_moves_per_turn: u8,
    /// Optional Chebyshev limit on how far a single reposition may travel.
    pub reposition_range: Option<u8>,
    /// One-turn jamming charges available to the enemy.
    pub chaff_charges: u8,
}

impl MatchConfig {
    pub const DEFAULT_FIRE_THRESHOLD: f64 = 0.6;
    pub const DEFAULT_HOLD_BIAS: f64 = 0.1;
    pub const DEFAULT_EVASION_THRESHOLD: f64 = 0.35;
    pub const DEFAULT_BAIT_THRESHOLD: f64 = 0.6;
    pub const DEFAULT_TURN_LIMIT: u32 = 20;
    pub const DEFAULT_RESIDUAL_WEIGHT: f64 = 0.2;
    pub const DEFAULT_ADAPTER_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_THREAT_TOP_K: usize = 3;
    pub const DEFAULT_CONFIRMATION_FACTOR: f64 = 1.5;
    pub const DEFAULT_DISCONFIRMATION_FACTOR: f64 = 0.67;
    pub const DEFAULT_BELIEF_FLOOR: f64 = 0.01;

    pub const DEFAULT_FRAMES: [&'static str; 4] = [
        "The plays of William Shakespeare",
        "Greek mythology",
        "Star Wars",
        "The Lord of the Rings",
    ];

    pub fn new() -> Self {
        Self {
            fire_threshold: Self::DEFAULT_FIRE_THRESHOLD,
            hold_bias: Self::DEFAULT_HOLD_BIAS,
            evasion_threshold: Self::DEFAULT_EVASION_THRESHOLD,
            bait_threshold: Self::DEFAULT_BAIT_THRESHOLD,
            turn_limit: Self::DEFAULT_TURN_LIMIT,
            candidate_frames: Self::DEFAULT_FRAMES
                .iter()
                .map(|label| CandidatePrior::new(*label, 1.0))
                .collect(),
            residual_weight: Self::DEFAULT_RESIDUAL_WEIGHT,
            adapter_timeout: Self::DEFAULT_ADAPTER_TIMEOUT,
            threat_top_k: Self::DEFAULT_THREAT_TOP_K,
            confirmation_factor: Self::DEFAULT_CONFIRMATION_FACTOR,
            disconfirmation_factor: Self::DEFAULT_DISCONFIRMATION_FACTOR,
            belief_floor: Self::DEFAULT_BELIEF_FLOOR,
            confidence: ConfidenceKind::Entropy,
            max_moves_per_turn: 1,
            reposition_range: None,
            chaff_charges: 0,
        }
    }

    /// Replaces the candidate list with equally weighted frames.
    pub fn with_candidate_frames<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<LoreFrame>,
    {
        self.candidate_frames = labels
            .into_iter()
            .map(|label| CandidatePrior::new(label, 1.0))
            .collect();
        self
    }

    pub fn with_turn_limit(mut self, turn_limit: u32) -> Self {
        self.turn_limit = turn_limit;
        self
    }

    pub fn with_chaff_charges(mut self, charges: u8) -> Self {
        self.chaff_charges = charges;
        self
    }

    /// Number of belief candidates, residual included.
    pub fn candidate_count(&self) -> usize {
        self.candidate_frames.len() + 1
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = [
            ("fire_threshold", self.fire_threshold),
            ("hold_bias", self.hold_bias),
            ("evasion_threshold", self.evasion_threshold),
            ("bait_threshold", self.bait_threshold),
            ("belief_floor", self.belief_floor),
        ];
        for (name, value) in unit {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { name, value });
            }
        }

        if self.evasion_threshold > self.bait_threshold {
            return Err(ConfigError::ThresholdOrdering {
                evasion: self.evasion_threshold,
                bait: self.bait_threshold,
            });
        }

        if self.candidate_frames.is_empty() {
            return Err(ConfigError::EmptyCandidateFrames);
        }
        for (index, prior) in self.candidate_frames.iter().enumerate() {
            if !prior.weight.is_finite() || prior.weight <= 0.0 {
                return Err(ConfigError::InvalidPriorWeight {
                    frame: prior.frame.label().to_string(),
                    weight: prior.weight,
                });
            }
            if self.candidate_frames[..index]
                .iter()
                .any(|earlier| earlier.frame == prior.frame)
            {
                return Err(ConfigError::DuplicateCandidateFrame(
                    prior.frame.label().to_string(),
                ));
            }
        }

        if !self.residual_weight.is_finite()
            || self.residual_weight <= 0.0
            || self.residual_weight >= 1.0
        {
            return Err(ConfigError::ResidualWeightOutOfRange(self.residual_weight));
        }

        if self.belief_floor <= 0.0 {
            return Err(ConfigError::FloorNotPositive(self.belief_floor));
        }
        if self.belief_floor * self.candidate_count() as f64 >= 1.0 {
            return Err(ConfigError::FloorTooLarge {
                floor: self.belief_floor,
                candidates: self.candidate_count(),
            });
        }

        if !self.confirmation_factor.is_finite() || self.confirmation_factor < 1.0 {
            return Err(ConfigError::FactorOutOfRange {
                name: "confirmation_factor",
                value: self.confirmation_factor,
            });
        }
        if !self.disconfirmation_factor.is_finite()
            || self.disconfirmation_factor <= 0.0
            || self.disconfirmation_factor > 1.0
        {
            return Err(ConfigError::FactorOutOfRange {
                name: "disconfirmation_factor",
                value: self.disconfirmation_factor,
            });
        }

        if self.turn_limit == 0 {
            return Err(ConfigError::ZeroTurnLimit);
        }
        if self.adapter_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.threat_top_k == 0 {
            return Err(ConfigError::ZeroTopK);
        }
        if self.max_moves_per_turn != 1 {
            return Err(ConfigError::MoveBudget(self.max_moves_per_turn));
        }
        Ok(())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be within [0, 1] (got {value})")]
    ThresholdOutOfRange { name: &'static str, value: f64 },

    #[error("evasion threshold {evasion} must not exceed bait threshold {bait}")]
    ThresholdOrdering { evasion: f64, bait: f64 },

    #[error("at least one candidate frame is required")]
    EmptyCandidateFrames,

    #[error("candidate frame {0:?} is listed more than once")]
    DuplicateCandidateFrame(String),

    #[error("prior weight for {frame:?} must be positive (got {weight})")]
    InvalidPriorWeight { frame: String, weight: f64 },

    #[error("residual weight must be within (0, 1) (got {0})")]
    ResidualWeightOutOfRange(f64),

    #[error("belief floor must be positive (got {0})")]
    FloorNotPositive(f64),

    #[error("belief floor {floor} leaves no mass for {candidates} candidates")]
    FloorTooLarge { floor: f64, candidates: usize },

    #[error("{name} is out of range (got {value})")]
    FactorOutOfRange { name: &'static str, value: f64 },

    #[error("turn limit must be at least 1")]
    ZeroTurnLimit,

    #[error("adapter timeout must be non-zero")]
    ZeroTimeout,

    #[error("threat top-k must be at least 1")]
    ZeroTopK,

    #[error("the enemy may make exactly one move per turn (got {0})")]
    MoveBudget(u8),
}

impl GameError for ConfigError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ThresholdOutOfRange { .. } => "CONFIG_THRESHOLD_OUT_OF_RANGE",
            Self::ThresholdOrdering { .. } => "CONFIG_THRESHOLD_ORDERING",
            Self::EmptyCandidateFrames => "CONFIG_EMPTY_CANDIDATE_FRAMES",
            Self::DuplicateCandidateFrame(_) => "CONFIG_DUPLICATE_CANDIDATE_FRAME",
            Self::InvalidPriorWeight { .. } => "CONFIG_INVALID_PRIOR_WEIGHT",
            Self::ResidualWeightOutOfRange(_) => "CONFIG_RESIDUAL_WEIGHT_OUT_OF_RANGE",
            Self::FloorNotPositive(_) => "CONFIG_FLOOR_NOT_POSITIVE",
            Self::FloorTooLarge { .. } => "CONFIG_FLOOR_TOO_LARGE",
            Self::FactorOutOfRange { .. } => "CONFIG_FACTOR_OUT_OF_RANGE",
            Self::ZeroTurnLimit => "CONFIG_ZERO_TURN_LIMIT",
            Self::ZeroTimeout => "CONFIG_ZERO_TIMEOUT",
            Self::ZeroTopK => "CONFIG_ZERO_TOP_K",
            Self::MoveBudget(_) => "CONFIG_MOVE_BUDGET",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        MatchConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let config = MatchConfig {
            fire_threshold: 1.5,
            ..MatchConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ThresholdOutOfRange {
                name: "fire_threshold",
                value: 1.5
            })
        );
    }

    #[test]
    fn rejects_duplicate_frames_case_insensitively() {
        let config = MatchConfig::default().with_candidate_frames(["Star Wars", "star wars"]);
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateCandidateFrame("star wars".into()))
        );
    }

    #[test]
    fn rejects_empty_candidates_and_zero_limit() {
        let empty = MatchConfig::default().with_candidate_frames(Vec::<&str>::new());
        assert_eq!(empty.validate(), Err(ConfigError::EmptyCandidateFrames));

        let zero = MatchConfig::default().with_turn_limit(0);
        assert_eq!(zero.validate(), Err(ConfigError::ZeroTurnLimit));
    }

    #[test]
    fn rejects_floor_that_cannot_fit_every_candidate() {
        let config = MatchConfig {
            belief_floor: 0.25,
            ..MatchConfig::default().with_candidate_frames(["A", "B", "C"])
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::FloorTooLarge { candidates: 4, .. })
        ));
    }

    #[test]
    fn rejects_zero_floor() {
        let config = MatchConfig {
            belief_floor: 0.0,
            ..MatchConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::FloorNotPositive(0.0)));

        let nan = MatchConfig {
            belief_floor: f64::NAN,
            ..MatchConfig::default()
        };
        assert!(matches!(
            nan.validate(),
            Err(ConfigError::ThresholdOutOfRange {
                name: "belief_floor",
                ..
            })
        ));
    }

    #[test]
    fn rejects_multi_move_budget() {
        let config = MatchConfig {
            max_moves_per_turn: 2,
            ..MatchConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MoveBudget(2)));
    }
}
