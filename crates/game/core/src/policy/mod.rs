//! Decision policies for both sides of the channel.
//!
//! A policy is a pure function from an observation to an action. The ally
//! observes only an [`ActionDistribution`](crate::ActionDistribution); the
//! enemy observes its belief, the board and its remaining resources. Both are
//! implementations of the same [`Policy`] trait so either side can be swapped
//! for a scripted double in tests.

mod ally;
mod enemy;
mod scripted;

pub use ally::{AllyDecision, ThresholdAllyPolicy};
pub use enemy::{EnemyAction, EnemyObservation, ThreatMap, ThresholdEnemyPolicy};
pub use scripted::{ScriptedAllyPolicy, ScriptedEnemyPolicy};

/// Deterministic mapping from an observation to an action.
pub trait Policy<I: ?Sized>: Send + Sync {
    type Action;

    fn decide(&self, observation: &I) -> Self::Action;

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
