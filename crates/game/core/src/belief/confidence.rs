use std::fmt;
use std::sync::Arc;

use crate::distribution::ActionDistribution;

/// Scores how decisively an interpretation resolves an instruction.
///
/// Returns a multiplier in `[0, 1]`: 1 means the instruction is unambiguous
/// under the frame, 0 means the frame explains nothing.
pub trait ConfidenceScore: Send + Sync + fmt::Debug {
    fn confidence(&self, distribution: &ActionDistribution) -> f64;
}

/// `1 - H(d) / H_max`: sharp distributions score high, flat ones near 0.
#[derive(Clone, Copy, Debug, Default)]
pub struct EntropyConfidence;

impl ConfidenceScore for EntropyConfidence {
    fn confidence(&self, distribution: &ActionDistribution) -> f64 {
        (1.0 - distribution.normalized_entropy()).clamp(0.0, 1.0)
    }
}

/// Scores by the mass of the single most likely outcome.
#[derive(Clone, Copy, Debug, Default)]
pub struct PeakConfidence;

impl ConfidenceScore for PeakConfidence {
    fn confidence(&self, distribution: &ActionDistribution) -> f64 {
        let (_, peak) = distribution.peak_cell();
        peak.max(distribution.hold_weight()).clamp(0.0, 1.0)
    }
}

/// Serializable selector for the built-in [`ConfidenceScore`]s.
///
/// Stored in [`MatchConfig`](crate::config::MatchConfig) so a turn log
/// names the scorer its belief updates were computed with.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConfidenceKind {
    #[default]
    Entropy,
    Peak,
}

impl ConfidenceKind {
    pub fn scorer(self) -> Arc<dyn ConfidenceScore> {
        match self {
            Self::Entropy => Arc::new(EntropyConfidence),
            Self::Peak => Arc::new(PeakConfidence),
        }
    }
}
