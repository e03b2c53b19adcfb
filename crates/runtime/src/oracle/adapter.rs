//! Timeout, validation and fallback around an [`InterpretationOracle`].

use std::sync::Arc;
use std::time::Duration;

use fireatwill_core::{
    ActionDistribution, FrameCandidate, FrameEvidence, LoreFrame, MatchConfig,
};
use tokio::task::JoinHandle;

use super::{InterpretationOracle, OracleError, OracleRequest};

/// Result of one adapter call. Always carries a usable distribution.
#[derive(Clone, Debug, PartialEq)]
pub struct Interpretation {
    pub distribution: ActionDistribution,
    /// Why the fallback was used, if it was.
    pub degraded: Option<OracleError>,
}

impl Interpretation {
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

/// Every interpretation a turn needs, joined.
#[derive(Clone, Debug)]
pub struct TurnInterpretations {
    /// One entry per belief candidate, in belief order.
    pub candidates: Vec<(FrameCandidate, Interpretation)>,
    /// The interpretation under the player's declared frame.
    pub ally: Interpretation,
}

impl TurnInterpretations {
    pub fn evidence(&self) -> Vec<FrameEvidence> {
        self.candidates
            .iter()
            .map(|(candidate, interpretation)| {
                let distribution = interpretation.distribution.clone();
                if interpretation.is_degraded() {
                    FrameEvidence::degraded(candidate.clone(), distribution)
                } else {
                    FrameEvidence::new(candidate.clone(), distribution)
                }
            })
            .collect()
    }

    pub fn degraded(&self) -> impl Iterator<Item = (Option<&FrameCandidate>, &OracleError)> {
        self.candidates
            .iter()
            .filter_map(|(candidate, interpretation)| {
                interpretation.degraded.as_ref().map(|error| (Some(candidate), error))
            })
            .chain(self.ally.degraded.as_ref().map(|error| (None, error)))
    }
}

/// Wraps an oracle so that no call can stall or corrupt a turn.
#[derive(Clone)]
pub struct InterpretationAdapter {
    oracle: Arc<dyn InterpretationOracle>,
    timeout: Duration,
    hold_bias: f64,
}

impl std::fmt::Debug for InterpretationAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterpretationAdapter")
            .field("timeout", &self.timeout)
            .field("hold_bias", &self.hold_bias)
            .finish_non_exhaustive()
    }
}

impl InterpretationAdapter {
    pub fn new(oracle: Arc<dyn InterpretationOracle>, timeout: Duration, hold_bias: f64) -> Self {
        Self {
            oracle,
            timeout,
            hold_bias,
        }
    }

    pub fn from_config(oracle: Arc<dyn InterpretationOracle>, config: &MatchConfig) -> Self {
        Self::new(oracle, config.adapter_timeout, config.hold_bias)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Uniform over cells with extra weight on Hold.
    pub fn fallback(&self, rows: u8, cols: u8) -> ActionDistribution {
        ActionDistribution::neutral(rows, cols, self.hold_bias)
    }

    /// Calls the oracle once, bounded by the configured timeout.
    pub async fn interpret(&self, request: &OracleRequest) -> Interpretation {
        let result = match tokio::time::timeout(self.timeout, self.oracle.interpret(request)).await
        {
            Ok(result) => result,
            Err(_) => Err(OracleError::Timeout(self.timeout)),
        };

        match result.and_then(|distribution| validate(request, distribution)) {
            Ok(distribution) => Interpretation {
                distribution,
                degraded: None,
            },
            Err(error) => self.degrade(request, error),
        }
    }

    fn degrade(&self, request: &OracleRequest, error: OracleError) -> Interpretation {
        tracing::warn!(
            turn = request.turn,
            frame = request.frame.as_ref().map(LoreFrame::label),
            %error,
            "interpretation degraded, using neutral fallback"
        );
        Interpretation {
            distribution: self.fallback(request.rows, request.cols),
            degraded: Some(error),
        }
    }

    /// Issues every interpretation of a turn concurrently and joins them.
    ///
    /// Named candidates are asked under their own frame, the residual
    /// frame-agnostically, and the ally under `ally_frame`.
    pub async fn interpret_turn(
        &self,
        request: &OracleRequest,
        candidates: &[FrameCandidate],
        ally_frame: Option<&LoreFrame>,
    ) -> TurnInterpretations {
        let candidate_tasks: Vec<_> = candidates
            .iter()
            .map(|candidate| {
                let request = request.for_frame(candidate.frame().cloned());
                (candidate.clone(), self.spawn(request))
            })
            .collect();
        let ally_request = request.for_frame(ally_frame.cloned());
        let ally_task = self.spawn(ally_request.clone());

        let mut joined = Vec::with_capacity(candidate_tasks.len());
        for (candidate, task) in candidate_tasks {
            let candidate_request = request.for_frame(candidate.frame().cloned());
            let interpretation = self.join(&candidate_request, task).await;
            joined.push((candidate, interpretation));
        }
        let ally = self.join(&ally_request, ally_task).await;

        tracing::debug!(
            turn = request.turn,
            calls = joined.len() + 1,
            "interpretations joined"
        );
        TurnInterpretations {
            candidates: joined,
            ally,
        }
    }

    fn spawn(&self, request: OracleRequest) -> JoinHandle<Interpretation> {
        let adapter = self.clone();
        tokio::spawn(async move { adapter.interpret(&request).await })
    }

    async fn join(
        &self,
        request: &OracleRequest,
        task: JoinHandle<Interpretation>,
    ) -> Interpretation {
        match task.await {
            Ok(interpretation) => interpretation,
            Err(error) => self.degrade(
                request,
                OracleError::Unavailable(format!("interpretation task failed: {error}")),
            ),
        }
    }
}

fn validate(
    request: &OracleRequest,
    distribution: ActionDistribution,
) -> Result<ActionDistribution, OracleError> {
    if !distribution.matches_shape(request.rows, request.cols) {
        return Err(OracleError::Malformed(format!(
            "expected a {}x{} distribution, got {}x{}",
            request.rows,
            request.cols,
            distribution.rows(),
            distribution.cols()
        )));
    }
    distribution
        .renormalized()
        .map_err(|error| OracleError::Malformed(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{FailingOracle, ScriptedOracle, StalledOracle};
    use fireatwill_core::{Cell, Message, Sender};

    fn request() -> OracleRequest {
        OracleRequest {
            turn: 0,
            history: Arc::from(vec![Message {
                turn: 0,
                sender: Sender::Player,
                text: "Fire at the oracle's seat".to_string(),
                sequence: 0,
            }]),
            frame: None,
            rows: 4,
            cols: 4,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_oracle_times_out_to_neutral() {
        let adapter =
            InterpretationAdapter::new(Arc::new(StalledOracle), Duration::from_secs(2), 0.1);

        let interpretation = adapter.interpret(&request()).await;

        assert_eq!(
            interpretation.degraded,
            Some(OracleError::Timeout(Duration::from_secs(2)))
        );
        assert_eq!(interpretation.distribution, ActionDistribution::neutral(4, 4, 0.1));
    }

    #[tokio::test]
    async fn wrong_shape_is_malformed() {
        let oracle = ScriptedOracle::new().with_default(ActionDistribution::uniform(8, 8));
        let adapter = InterpretationAdapter::new(Arc::new(oracle), Duration::from_secs(1), 0.1);

        let interpretation = adapter.interpret(&request()).await;
        assert!(matches!(
            interpretation.degraded,
            Some(OracleError::Malformed(_))
        ));
        assert!(interpretation.distribution.matches_shape(4, 4));
    }

    #[tokio::test]
    async fn failures_degrade_only_their_own_call() {
        let sharp =
            ActionDistribution::from_sparse(4, 4, &[(Cell::new(3, 2), 0.8)], 0.2).unwrap();
        let oracle = ScriptedOracle::new()
            .with_frame("Greek mythology", sharp.clone())
            .with_failure("Norse sagas");
        let adapter = InterpretationAdapter::new(Arc::new(oracle), Duration::from_secs(1), 0.1);

        let candidates = vec![
            FrameCandidate::Named("Greek mythology".into()),
            FrameCandidate::Named("Norse sagas".into()),
            FrameCandidate::Residual,
        ];
        let ally_frame = LoreFrame::new("Greek mythology");
        let joined = adapter
            .interpret_turn(&request(), &candidates, Some(&ally_frame))
            .await;

        assert_eq!(joined.candidates.len(), 3);
        assert_eq!(joined.candidates[0].0, candidates[0]);
        assert_eq!(joined.candidates[0].1.distribution, sharp);
        assert!(joined.candidates[1].1.is_degraded());
        assert_eq!(joined.ally.distribution, sharp);
        assert_eq!(joined.degraded().count(), 1);

        let evidence = joined.evidence();
        assert!(!evidence[0].degraded);
        assert!(evidence[1].degraded);
    }

    #[tokio::test]
    async fn unavailable_oracle_reports_its_reason() {
        let adapter = InterpretationAdapter::new(
            Arc::new(FailingOracle::new("connection refused")),
            Duration::from_secs(1),
            0.25,
        );
        let interpretation = adapter.interpret(&request()).await;
        assert_eq!(
            interpretation.degraded,
            Some(OracleError::Unavailable("connection refused".to_string()))
        );
        assert!((interpretation.distribution.hold_weight() - (0.75 / 17.0 + 0.25)).abs() < 1e-12);
    }
}
