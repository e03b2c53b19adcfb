//! Deterministic rules for Fire At Will.
//!
//! `fireatwill-core` defines the board, the public channel, the enemy's
//! belief over lore frames, both sides' decision policies and the turn state
//! machine. It performs no I/O: interpretation of free text is supplied by
//! the caller as [`ActionDistribution`]s, and all state mutation flows through
//! [`engine::MatchEngine`].
pub mod belief;
pub mod config;
pub mod distribution;
pub mod engine;
pub mod error;
pub mod frame;
pub mod outcome;
pub mod policy;
pub mod rng;
pub mod state;
pub mod view;

pub use belief::{
    BeliefError, BeliefState, BeliefTracker, BeliefUpdate, ConfidenceKind, ConfidenceScore,
    EntropyConfidence,
    FrameBelief, FrameEvidence, PeakConfidence, ShotFeedback,
};
pub use config::{CandidatePrior, ConfigError, MatchConfig};
pub use distribution::{ActionDistribution, DistributionError, Target};
pub use engine::{EngineError, MatchEngine, MatchGenesis, TurnRecord, replay};
pub use error::{ErrorSeverity, GameError};
pub use frame::{FrameCandidate, LoreFrame};
pub use outcome::{MatchOutcome, ShotResult};
pub use policy::{
    AllyDecision, EnemyAction, EnemyObservation, Policy, ScriptedAllyPolicy, ScriptedEnemyPolicy,
    ThreatMap, ThresholdAllyPolicy, ThresholdEnemyPolicy,
};
pub use state::{
    AllyView, Board, BoardError, Cell, CellContent, ChannelError, ChannelLog, Entity, EntityId,
    EntityKind, MatchState, Message, PlayerView, Sender, TurnIndex, TurnPhase, TurnState,
};
pub use view::{BoardProjection, CellView, Visibility};
