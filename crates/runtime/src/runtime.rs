//! Match orchestrator.
//!
//! [`MatchRuntime`] drives one match turn by turn: it fans the turn's
//! interpretation calls out through the adapter, runs the engine phases on a
//! working copy of the state, and commits that copy, persists the record and
//! publishes the turn's events only once the turn resolved cleanly.

use std::sync::Arc;

use fireatwill_core::{
    ActionDistribution, AllyDecision, BeliefTracker, Board, EnemyAction, EnemyObservation,
    EngineError, ErrorSeverity, GameError, LoreFrame, MatchConfig, MatchEngine, MatchGenesis,
    MatchOutcome, MatchState, Policy, ThresholdAllyPolicy, ThresholdEnemyPolicy, TurnIndex,
    TurnRecord,
};
use tokio::sync::broadcast;

use crate::api::{AbortHandle, MatchEvent, OracleCall, Result, RuntimeError, StateDump};
use crate::oracle::{InterpretationAdapter, InterpretationOracle, OracleRequest};
use crate::repository::{LogEntry, TurnLog};

/// The ally's decision rule.
pub type AllyPolicy = dyn Policy<ActionDistribution, Action = AllyDecision>;

/// The enemy's decision rule.
pub type EnemyPolicy = dyn for<'a> Policy<EnemyObservation<'a>, Action = EnemyAction>;

const DEFAULT_EVENT_BUFFER: usize = 64;

/// The player's input for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnInput {
    pub instruction: String,
    /// Enemy traffic injected onto the channel after the instruction.
    pub injected: Option<String>,
}

impl TurnInput {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            injected: None,
        }
    }

    pub fn with_injection(mut self, text: impl Into<String>) -> Self {
        self.injected = Some(text.into());
        self
    }
}

pub struct MatchRuntime {
    state: MatchState,
    adapter: InterpretationAdapter,
    tracker: BeliefTracker,
    ally: Box<AllyPolicy>,
    enemy: Box<EnemyPolicy>,
    events: broadcast::Sender<MatchEvent>,
    abort: AbortHandle,
    log: Option<Box<dyn TurnLog>>,
    /// Turn whose invariant violation halted the match.
    halted: Option<TurnIndex>,
}

impl MatchRuntime {
    pub fn builder() -> MatchRuntimeBuilder {
        MatchRuntimeBuilder::new()
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn history(&self) -> &[TurnRecord] {
        self.state.history()
    }

    pub fn outcome(&self) -> MatchOutcome {
        self.state.outcome()
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn turn_log(&self) -> Option<&dyn TurnLog> {
        self.log.as_deref()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<MatchEvent> {
        self.events.subscribe()
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Ends the match now. Only valid between turns.
    pub fn abort(&mut self) -> Result<MatchOutcome> {
        let turn = self.state.turn().index;
        let outcome = MatchEngine::new(&mut self.state)
            .abort()
            .map_err(|source| RuntimeError::Rejected { turn, source })?;
        tracing::info!(turn, "match aborted");
        self.publish(MatchEvent::MatchAborted { turn });
        Ok(outcome)
    }

    /// Plays one full turn.
    ///
    /// On any error the committed state is left exactly as it was after the
    /// previous turn.
    pub async fn play_turn(&mut self, input: TurnInput) -> Result<TurnRecord> {
        if let Some(turn) = self.halted {
            return Err(RuntimeError::Halted { turn });
        }
        if self.state.is_terminal() {
            return Err(RuntimeError::MatchFinished {
                outcome: self.state.outcome(),
            });
        }
        if self.abort.is_requested() {
            let turn = self.state.turn().index;
            self.abort()?;
            return Err(RuntimeError::MatchAborted { turn });
        }

        let turn = self.state.turn().index;
        let mut working = self.state.clone();
        let mut events = Vec::new();

        let result = self.run_turn(&mut working, &input, &mut events).await;
        let record = match result {
            Ok(record) => record,
            Err(source) => return Err(self.fail_turn(turn, source, &working)),
        };

        if let Some(log) = self.log.as_mut() {
            log.append(&LogEntry::Turn(record.clone()))?;
            log.flush()?;
        }
        self.state = working;
        events.into_iter().for_each(|event| self.publish(event));

        if record.outcome.is_terminal() {
            tracing::info!(turn, outcome = %record.outcome, shot = ?record.shot, "match ended");
            self.publish(MatchEvent::MatchEnded {
                turn,
                outcome: record.outcome,
            });
        }
        Ok(record)
    }

    async fn run_turn(
        &self,
        working: &mut MatchState,
        input: &TurnInput,
        events: &mut Vec<MatchEvent>,
    ) -> std::result::Result<TurnRecord, EngineError> {
        let mut engine = MatchEngine::new(working);
        let turn = engine.post_instructions(&input.instruction, input.injected.as_deref())?;
        tracing::debug!(turn, phase = %engine.phase(), "instructions posted");
        events.push(MatchEvent::TurnStarted {
            turn,
            messages: engine.state().channel().for_turn(turn).cloned().collect(),
        });

        let board = engine.state().board();
        let request = OracleRequest {
            turn,
            history: Arc::from(engine.state().channel().messages()),
            frame: None,
            rows: board.rows(),
            cols: board.cols(),
        };
        let candidates = engine.candidates();
        let declared = engine.state().declared_frame().cloned();
        let interpretations = self
            .adapter
            .interpret_turn(&request, &candidates, declared.as_ref())
            .await;
        for (candidate, error) in interpretations.degraded() {
            events.push(MatchEvent::OracleDegraded {
                turn,
                call: candidate.map_or(OracleCall::Ally, |c| OracleCall::Candidate(c.clone())),
                reason: error.to_string(),
            });
        }

        let update = engine.update_belief(&self.tracker, interpretations.evidence())?;
        tracing::debug!(
            turn,
            phase = %engine.phase(),
            nudged = update.nudged,
            collapsed = update.evidence_collapsed,
            "belief updated"
        );
        events.push(MatchEvent::BeliefUpdated { turn, update });

        let action = self.enemy.decide(&engine.enemy_observation());
        engine.apply_enemy_action(action)?;
        tracing::debug!(turn, phase = %engine.phase(), ?action, "enemy acted");
        events.push(MatchEvent::EnemyActed { turn, action });

        let ally = interpretations.ally;
        let degraded = ally.is_degraded();
        let observed = engine.ally_input(ally.distribution);
        let decision = self.ally.decide(&observed);
        engine.record_ally_decision(observed, degraded, decision)?;
        tracing::debug!(turn, phase = %engine.phase(), ?decision, degraded, "ally decided");
        events.push(MatchEvent::AllyDecided {
            turn,
            decision,
            degraded,
        });

        let record = engine.resolve()?;
        tracing::debug!(
            turn,
            phase = %engine.phase(),
            shot = ?record.shot,
            outcome = %record.outcome,
            "turn resolved"
        );
        events.push(MatchEvent::TurnResolved {
            record: Box::new(record.clone()),
        });
        Ok(record)
    }

    fn fail_turn(
        &mut self,
        turn: TurnIndex,
        source: EngineError,
        working: &MatchState,
    ) -> RuntimeError {
        match source.severity() {
            ErrorSeverity::Recoverable | ErrorSeverity::Validation => {
                tracing::debug!(turn, error = %source, "turn rejected");
                RuntimeError::Rejected { turn, source }
            }
            ErrorSeverity::Internal | ErrorSeverity::Fatal => {
                let dump = StateDump::capture(turn, &source, &self.state, working);
                tracing::error!(
                    turn,
                    code = source.error_code(),
                    error = %source,
                    committed = %dump.committed,
                    working = %dump.working,
                    "invariant violated, match halted"
                );
                self.halted = Some(turn);
                RuntimeError::InvariantViolation {
                    turn,
                    source,
                    dump: Box::new(dump),
                }
            }
        }
    }

    fn publish(&self, event: MatchEvent) {
        // Events are best-effort; no subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Builder for [`MatchRuntime`].
///
/// Only the oracle and the board are required. Policies default to the
/// threshold policies derived from the configuration.
pub struct MatchRuntimeBuilder {
    config: MatchConfig,
    board: Option<Board>,
    frame: Option<LoreFrame>,
    oracle: Option<Arc<dyn InterpretationOracle>>,
    ally: Option<Box<AllyPolicy>>,
    enemy: Option<Box<EnemyPolicy>>,
    log: Option<Box<dyn TurnLog>>,
    event_buffer: usize,
}

impl MatchRuntimeBuilder {
    fn new() -> Self {
        Self {
            config: MatchConfig::default(),
            board: None,
            frame: None,
            oracle: None,
            ally: None,
            enemy: None,
            log: None,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }

    pub fn config(mut self, config: MatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn board(mut self, board: Board) -> Self {
        self.board = Some(board);
        self
    }

    /// The player's private lore frame, fixed for the whole match.
    pub fn declared_frame(mut self, frame: impl Into<LoreFrame>) -> Self {
        self.frame = Some(frame.into());
        self
    }

    pub fn oracle(mut self, oracle: impl InterpretationOracle + 'static) -> Self {
        self.oracle = Some(Arc::new(oracle));
        self
    }

    pub fn shared_oracle(mut self, oracle: Arc<dyn InterpretationOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn ally_policy<P>(mut self, policy: P) -> Self
    where
        P: Policy<ActionDistribution, Action = AllyDecision> + 'static,
    {
        self.ally = Some(Box::new(policy));
        self
    }

    pub fn enemy_policy<P>(mut self, policy: P) -> Self
    where
        P: for<'a> Policy<EnemyObservation<'a>, Action = EnemyAction> + 'static,
    {
        self.enemy = Some(Box::new(policy));
        self
    }

    /// Persists the genesis and every committed turn.
    pub fn turn_log(mut self, log: impl TurnLog + 'static) -> Self {
        self.log = Some(Box::new(log));
        self
    }

    pub fn event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity.max(1);
        self
    }

    pub fn build(self) -> Result<MatchRuntime> {
        self.config.validate()?;
        let oracle = self.oracle.ok_or(RuntimeError::MissingOracle)?;
        let board = self.board.ok_or(RuntimeError::MissingBoard)?;
        board.check_invariants()?;

        let genesis = MatchGenesis {
            config: self.config.clone(),
            board: board.clone(),
        };
        let state = MatchState::new(self.config.clone(), board, self.frame)?;

        let tracker = BeliefTracker::from_config(&self.config);
        let ally = self.ally.unwrap_or_else(|| {
            Box::new(ThresholdAllyPolicy::from_config(&self.config)) as Box<AllyPolicy>
        });
        let enemy = self.enemy.unwrap_or_else(|| {
            Box::new(ThresholdEnemyPolicy::from_config(&self.config)) as Box<EnemyPolicy>
        });

        let mut log = self.log;
        if let Some(log) = log.as_mut() {
            log.append(&LogEntry::genesis(genesis))?;
            log.flush()?;
        }

        let (events, _) = broadcast::channel(self.event_buffer);
        tracing::info!(
            rows = state.board().rows(),
            cols = state.board().cols(),
            ships = state.board().ships_remaining(),
            hostages = state.board().hostages_remaining(),
            candidates = self.config.candidate_count(),
            ally = ally.name(),
            enemy = enemy.name(),
            "match ready"
        );

        Ok(MatchRuntime {
            state,
            adapter: InterpretationAdapter::from_config(oracle, &self.config),
            tracker,
            ally,
            enemy,
            events,
            abort: AbortHandle::new(),
            log,
            halted: None,
        })
    }
}
