//! Deterministic oracles for tests and offline play.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use fireatwill_core::{ActionDistribution, LoreFrame, TurnIndex};

use super::{InterpretationOracle, OracleError, OracleRequest};

#[derive(Clone, Debug)]
enum Scripted {
    Answer(ActionDistribution),
    Fail,
}

/// Answers from a lookup table keyed by frame, optionally per turn.
///
/// A turn-specific entry wins over a frame entry. Anything unscripted gets
/// the default, or a uniform distribution when no default is set. The
/// frame-agnostic key (`None`) is set with [`ScriptedOracle::with_residual`].
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    by_frame: HashMap<Option<LoreFrame>, Scripted>,
    by_turn: HashMap<(TurnIndex, Option<LoreFrame>), Scripted>,
    default: Option<ActionDistribution>,
    calls: AtomicUsize,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, distribution: ActionDistribution) -> Self {
        self.default = Some(distribution);
        self
    }

    pub fn with_frame(mut self, frame: impl Into<LoreFrame>, distribution: ActionDistribution) -> Self {
        self.by_frame
            .insert(Some(frame.into()), Scripted::Answer(distribution));
        self
    }

    pub fn with_residual(mut self, distribution: ActionDistribution) -> Self {
        self.by_frame.insert(None, Scripted::Answer(distribution));
        self
    }

    pub fn with_failure(mut self, frame: impl Into<LoreFrame>) -> Self {
        self.by_frame.insert(Some(frame.into()), Scripted::Fail);
        self
    }

    pub fn on_turn(
        mut self,
        turn: TurnIndex,
        frame: Option<&str>,
        distribution: ActionDistribution,
    ) -> Self {
        self.by_turn.insert(
            (turn, frame.map(LoreFrame::from)),
            Scripted::Answer(distribution),
        );
        self
    }

    /// Number of interpret calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InterpretationOracle for ScriptedOracle {
    async fn interpret(
        &self,
        request: &OracleRequest,
    ) -> Result<ActionDistribution, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let scripted = self
            .by_turn
            .get(&(request.turn, request.frame.clone()))
            .or_else(|| self.by_frame.get(&request.frame));
        match scripted {
            Some(Scripted::Answer(distribution)) => Ok(distribution.clone()),
            Some(Scripted::Fail) => Err(OracleError::Unavailable(format!(
                "scripted failure for {}",
                request
                    .frame
                    .as_ref()
                    .map_or("<residual>", LoreFrame::label)
            ))),
            None => Ok(self
                .default
                .clone()
                .unwrap_or_else(|| ActionDistribution::uniform(request.rows, request.cols))),
        }
    }
}

/// Never answers. Exercises the adapter timeout.
#[derive(Clone, Copy, Debug, Default)]
pub struct StalledOracle;

#[async_trait]
impl InterpretationOracle for StalledOracle {
    async fn interpret(&self, _: &OracleRequest) -> Result<ActionDistribution, OracleError> {
        std::future::pending().await
    }
}

/// Always fails with the same reason.
#[derive(Clone, Debug)]
pub struct FailingOracle {
    reason: String,
}

impl FailingOracle {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl InterpretationOracle for FailingOracle {
    async fn interpret(&self, _: &OracleRequest) -> Result<ActionDistribution, OracleError> {
        Err(OracleError::Unavailable(self.reason.clone()))
    }
}
