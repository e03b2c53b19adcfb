//! Async orchestration for Fire At Will matches.
//!
//! This crate connects the deterministic rules in `fireatwill-core` to the
//! outside world: interpretation oracles that may be slow or fail, event
//! subscribers, and turn-log persistence.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the match orchestrator and its builder
//! - [`api`] exposes errors, events and the abort handle
//! - [`oracle`] wraps interpretation oracles with timeout and fallback
//! - [`repository`] persists and replays turn logs
pub mod api;
pub mod oracle;
pub mod repository;
pub mod runtime;

pub use api::{AbortHandle, MatchEvent, OracleCall, Result, RuntimeError, StateDump};
pub use oracle::{
    FailingOracle, Interpretation, InterpretationAdapter, InterpretationOracle,
    LiteralCoordinateOracle, OracleError, OracleRequest, ScriptedOracle, StalledOracle,
    TurnInterpretations,
};
pub use repository::{
    FileRepository, FileTurnLog, InMemoryTurnLog, LogEntry, ReplayedMatch, RepositoryError,
    TurnLog, load_log, replay_log,
};
pub use runtime::{AllyPolicy, EnemyPolicy, MatchRuntime, MatchRuntimeBuilder, TurnInput};
