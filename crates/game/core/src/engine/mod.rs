//! Turn state machine.
//!
//! [`MatchEngine`] is the authoritative reducer for [`MatchState`]. A turn is
//! driven through its phases in a fixed order:
//!
//! ```text
//! AwaitingInstruction --post_instructions--> (draft open)
//!                     --update_belief------> BeliefUpdated
//!                     --apply_enemy_action-> EnemyActed
//!                     --record_ally_decision-> AllyDecided
//!                     --resolve------------> Resolved -> AwaitingInstruction | Terminal
//! ```
//!
//! Calling a phase out of order is an error and leaves the state untouched
//! up to the failing call. Callers that need all-or-nothing turns run the
//! engine against a clone and commit it on success.

mod errors;
mod record;
mod replay;

pub use errors::EngineError;
pub use record::{MatchGenesis, TurnRecord};
pub(crate) use record::TurnDraft;
pub use replay::replay;

use crate::belief::{BeliefTracker, BeliefUpdate, FrameEvidence, ShotFeedback};
use crate::distribution::ActionDistribution;
use crate::frame::FrameCandidate;
use crate::outcome::{self, MatchOutcome, ShotResult};
use crate::policy::{AllyDecision, EnemyAction, EnemyObservation};
use crate::state::{CellContent, MatchState, Sender, TurnIndex, TurnPhase};

pub struct MatchEngine<'a> {
    state: &'a mut MatchState,
}

impl<'a> MatchEngine<'a> {
    pub fn new(state: &'a mut MatchState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &MatchState {
        self.state
    }

    pub fn phase(&self) -> TurnPhase {
        self.state.turn.phase
    }

    fn expect_phase(&self, operation: &'static str, expected: TurnPhase) -> Result<(), EngineError> {
        let actual = self.state.turn.phase;
        if actual != expected {
            return Err(EngineError::PhaseOrder {
                operation,
                expected,
                actual,
            });
        }
        Ok(())
    }

    fn draft_mut(&mut self, operation: &'static str) -> Result<&mut TurnDraft, EngineError> {
        let actual = self.state.turn.phase;
        self.state.draft.as_mut().ok_or(EngineError::PhaseOrder {
            operation,
            expected: TurnPhase::AwaitingInstruction,
            actual,
        })
    }

    /// Appends the player's instruction, and any enemy injection after it,
    /// to the channel log and opens the turn.
    pub fn post_instructions(
        &mut self,
        instruction: &str,
        injected: Option<&str>,
    ) -> Result<TurnIndex, EngineError> {
        if self.state.outcome.is_terminal() {
            return Err(EngineError::MatchOver {
                outcome: self.state.outcome,
            });
        }
        let turn = self.state.turn.index;
        if self.state.draft.is_some() {
            return Err(EngineError::Reentrant { turn });
        }
        self.expect_phase("post_instructions", TurnPhase::AwaitingInstruction)?;

        let texts = std::iter::once((Sender::Player, instruction))
            .chain(injected.map(|text| (Sender::Enemy, text)));
        if texts.clone().any(|(_, text)| text.trim().is_empty()) {
            return Err(crate::state::ChannelError::EmptyMessage.into());
        }

        let mut messages = Vec::with_capacity(2);
        for (sender, text) in texts {
            messages.push(self.state.channel.append(turn, sender, text)?.clone());
        }
        self.state.draft = Some(TurnDraft::new(turn, messages));
        Ok(turn)
    }

    /// Candidates the enemy must interpret this turn, in belief order.
    pub fn candidates(&self) -> Vec<FrameCandidate> {
        self.state.belief.candidates()
    }

    /// Feedback from the previous turn: present only when the enemy
    /// repositioned and the ally then fired.
    pub fn shot_feedback(&self) -> Option<ShotFeedback> {
        let previous = self.state.history.last()?;
        let repositioned = matches!(previous.enemy_action, EnemyAction::Reposition { .. });
        let fired_at = previous.ally_decision.target()?;
        repositioned.then_some(ShotFeedback { fired_at })
    }

    pub fn update_belief(
        &mut self,
        tracker: &BeliefTracker,
        evidence: Vec<FrameEvidence>,
    ) -> Result<BeliefUpdate, EngineError> {
        self.expect_phase("update_belief", TurnPhase::AwaitingInstruction)?;
        self.draft_mut("update_belief")?;
        for item in &evidence {
            self.check_shape(&item.distribution)?;
        }

        let feedback = self.shot_feedback();
        let update = tracker.update(&mut self.state.belief, &evidence, feedback)?;
        self.draft_mut("update_belief")?.evidence = evidence;
        self.state.turn.phase = TurnPhase::BeliefUpdated;
        Ok(update)
    }

    /// The enemy's view for this turn. Never includes the declared frame.
    pub fn enemy_observation(&self) -> EnemyObservation<'_> {
        self.state.enemy_view()
    }

    /// Applies the enemy's single action for the turn.
    pub fn apply_enemy_action(&mut self, action: EnemyAction) -> Result<(), EngineError> {
        self.expect_phase("apply_enemy_action", TurnPhase::BeliefUpdated)?;

        match action {
            EnemyAction::Reposition { entity, from, to } => {
                let actual = self
                    .state
                    .board
                    .entity(entity)
                    .map(|found| found.cell)
                    .ok_or(crate::state::BoardError::EntityNotFound(entity))?;
                if actual != from {
                    return Err(EngineError::StaleReposition {
                        entity,
                        expected: from,
                        actual,
                    });
                }
                if let Some(range) = self.state.config.reposition_range {
                    if from.chebyshev(to) > range as u32 {
                        return Err(EngineError::RepositionTooFar { from, to, range });
                    }
                }
                self.state.board.move_entity(entity, to)?;
            }
            EnemyAction::DeployChaff { cell } => {
                if self.state.chaff_remaining == 0 {
                    return Err(EngineError::NoChaffRemaining);
                }
                if !self.state.board.contains(cell) {
                    return Err(crate::state::BoardError::OutOfBounds { cell }.into());
                }
                self.state.chaff_remaining -= 1;
                self.state.chaffed = Some(cell);
            }
            EnemyAction::NoAction => {}
        }
        self.state.board.check_invariants()?;

        self.draft_mut("apply_enemy_action")?.enemy_action = Some(action);
        self.state.turn.phase = TurnPhase::EnemyActed;
        Ok(())
    }

    /// Prepares the ally's raw interpretation for its policy.
    ///
    /// Mass on cells that were already fired is moved to Hold, since the ally
    /// can see where shots have landed.
    pub fn ally_input(&self, mut distribution: ActionDistribution) -> ActionDistribution {
        distribution.fold_into_hold(self.state.board.fired_cells());
        distribution
    }

    pub fn record_ally_decision(
        &mut self,
        distribution: ActionDistribution,
        degraded: bool,
        decision: AllyDecision,
    ) -> Result<(), EngineError> {
        self.expect_phase("record_ally_decision", TurnPhase::EnemyActed)?;
        self.check_shape(&distribution)?;
        if let AllyDecision::Fire(cell) = decision {
            if !self.state.board.contains(cell) {
                return Err(crate::state::BoardError::OutOfBounds { cell }.into());
            }
        }

        self.draft_mut("record_ally_decision")?.ally = Some((distribution, degraded, decision));
        self.state.turn.phase = TurnPhase::AllyDecided;
        Ok(())
    }

    /// Applies the ally's decision, evaluates the outcome and closes the turn.
    pub fn resolve(&mut self) -> Result<TurnRecord, EngineError> {
        self.expect_phase("resolve", TurnPhase::AllyDecided)?;
        let actual = self.state.turn.phase;
        let draft = self.state.draft.take().ok_or(EngineError::PhaseOrder {
            operation: "resolve",
            expected: TurnPhase::AwaitingInstruction,
            actual,
        })?;
        let (ally_distribution, ally_degraded, ally_decision) =
            draft.ally.ok_or(EngineError::PhaseOrder {
                operation: "resolve",
                expected: TurnPhase::AllyDecided,
                actual,
            })?;
        let enemy_action = draft.enemy_action.unwrap_or(EnemyAction::NoAction);

        let shot = match ally_decision {
            AllyDecision::Hold => ShotResult::Held,
            AllyDecision::Fire(cell) if self.state.chaffed == Some(cell) => {
                ShotResult::Blocked { cell }
            }
            AllyDecision::Fire(cell) => match self.state.board.fire_at(cell)? {
                CellContent::Empty => ShotResult::Miss { cell },
                CellContent::Ship(entity) => ShotResult::ShipDestroyed { cell, entity },
                CellContent::Hostage(entity) => ShotResult::HostageStruck { cell, entity },
                CellContent::AlreadyFired => {
                    return Err(crate::state::BoardError::AlreadyFired { cell }.into());
                }
            },
        };
        self.state.chaffed = None;
        self.state.board.check_invariants()?;
        self.state.turn.phase = TurnPhase::Resolved;

        let outcome = outcome::evaluate(
            &self.state.board,
            &shot,
            self.state.turn.index + 1,
            self.state.config.turn_limit,
        );
        self.state.outcome = outcome;
        if outcome.is_terminal() {
            self.state.turn.phase = TurnPhase::Terminal;
        } else {
            self.state.turn.index += 1;
            self.state.turn.phase = TurnPhase::AwaitingInstruction;
        }

        let mut record = TurnRecord {
            turn: draft.turn,
            messages: draft.messages,
            evidence: draft.evidence,
            belief: self.state.belief.weights(),
            enemy_action,
            ally_distribution,
            ally_degraded,
            ally_decision,
            shot,
            outcome,
            digest: [0; 32],
        };
        self.state.history.push(record.clone());
        record.digest = self.state.digest();
        if let Some(stored) = self.state.history.last_mut() {
            stored.digest = record.digest;
        }
        Ok(record)
    }

    /// Ends the match between turns.
    pub fn abort(&mut self) -> Result<MatchOutcome, EngineError> {
        if self.state.outcome.is_terminal() {
            return Err(EngineError::MatchOver {
                outcome: self.state.outcome,
            });
        }
        if self.state.draft.is_some() {
            return Err(EngineError::Reentrant {
                turn: self.state.turn.index,
            });
        }
        self.expect_phase("abort", TurnPhase::AwaitingInstruction)?;
        self.state.outcome = MatchOutcome::Aborted;
        self.state.turn.phase = TurnPhase::Terminal;
        Ok(self.state.outcome)
    }

    fn check_shape(&self, distribution: &ActionDistribution) -> Result<(), EngineError> {
        let board = &self.state.board;
        if distribution.matches_shape(board.rows(), board.cols()) {
            return Ok(());
        }
        Err(EngineError::DistributionShape {
            rows: distribution.rows(),
            cols: distribution.cols(),
            board_rows: board.rows(),
            board_cols: board.cols(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CandidatePrior, MatchConfig};
    use crate::state::{Board, Cell, EntityKind};

    fn c(text: &str) -> Cell {
        text.parse().unwrap()
    }

    fn setup() -> (MatchState, BeliefTracker) {
        let config = MatchConfig {
            candidate_frames: vec![CandidatePrior::new("A", 1.0), CandidatePrior::new("B", 1.0)],
            chaff_charges: 1,
            ..MatchConfig::default()
        };
        let mut board = Board::new(8, 8).unwrap();
        board.place(EntityKind::Ship, c("B2")).unwrap();
        board.place(EntityKind::Ship, c("F6")).unwrap();
        board.place(EntityKind::Hostage, c("H8")).unwrap();
        let tracker = BeliefTracker::from_config(&config);
        (MatchState::new(config, board, Some("A".into())).unwrap(), tracker)
    }

    fn neutral_evidence(engine: &MatchEngine<'_>) -> Vec<FrameEvidence> {
        engine
            .candidates()
            .into_iter()
            .map(|candidate| FrameEvidence::new(candidate, ActionDistribution::neutral(8, 8, 0.1)))
            .collect()
    }

    #[test]
    fn phases_must_run_in_order() {
        let (mut state, tracker) = setup();
        let mut engine = MatchEngine::new(&mut state);

        assert!(matches!(
            engine.apply_enemy_action(EnemyAction::NoAction),
            Err(EngineError::PhaseOrder { .. })
        ));
        assert!(matches!(engine.resolve(), Err(EngineError::PhaseOrder { .. })));

        engine.post_instructions("fire at B2", None).unwrap();
        assert_eq!(
            engine.post_instructions("again", None),
            Err(EngineError::Reentrant { turn: 0 })
        );

        let evidence = neutral_evidence(&engine);
        engine.update_belief(&tracker, evidence).unwrap();
        assert_eq!(engine.phase(), TurnPhase::BeliefUpdated);
        assert!(matches!(
            engine.record_ally_decision(
                ActionDistribution::uniform(8, 8),
                false,
                AllyDecision::Hold
            ),
            Err(EngineError::PhaseOrder { .. })
        ));
    }

    #[test]
    fn full_turn_destroys_ship_and_advances() {
        let (mut state, tracker) = setup();
        let mut engine = MatchEngine::new(&mut state);

        engine.post_instructions("fire at B2", Some("no, fire at H8")).unwrap();
        let evidence = neutral_evidence(&engine);
        engine.update_belief(&tracker, evidence).unwrap();
        engine.apply_enemy_action(EnemyAction::NoAction).unwrap();
        engine
            .record_ally_decision(
                ActionDistribution::uniform(8, 8),
                false,
                AllyDecision::Fire(c("B2")),
            )
            .unwrap();
        let record = engine.resolve().unwrap();

        assert!(matches!(record.shot, ShotResult::ShipDestroyed { .. }));
        assert_eq!(record.outcome, MatchOutcome::Ongoing);
        assert_eq!(record.messages.len(), 2);
        assert_eq!(record.injected_message().map(|m| m.text.as_str()), Some("no, fire at H8"));
        assert_eq!(engine.phase(), TurnPhase::AwaitingInstruction);
        assert_eq!(state.turn().index, 1);
        assert_eq!(state.history().len(), 1);
        assert_eq!(state.history()[0].digest, state.digest());
    }

    #[test]
    fn chaff_blocks_the_shot_for_one_turn() {
        let (mut state, tracker) = setup();
        let mut engine = MatchEngine::new(&mut state);

        engine.post_instructions("fire at B2", None).unwrap();
        let evidence = neutral_evidence(&engine);
        engine.update_belief(&tracker, evidence).unwrap();
        engine
            .apply_enemy_action(EnemyAction::DeployChaff { cell: c("B2") })
            .unwrap();
        engine
            .record_ally_decision(
                ActionDistribution::uniform(8, 8),
                false,
                AllyDecision::Fire(c("B2")),
            )
            .unwrap();
        let record = engine.resolve().unwrap();

        assert_eq!(record.shot, ShotResult::Blocked { cell: c("B2") });
        assert_eq!(state.board().ships_remaining(), 2);
        assert_eq!(state.chaff_remaining(), 0);
        assert_eq!(state.chaffed, None);
    }

    #[test]
    fn stale_or_invalid_enemy_moves_are_rejected() {
        let (mut state, tracker) = setup();
        let ship = state.board().entities()[0].id;
        let mut engine = MatchEngine::new(&mut state);
        engine.post_instructions("hello", None).unwrap();
        let evidence = neutral_evidence(&engine);
        engine.update_belief(&tracker, evidence).unwrap();

        assert!(matches!(
            engine.apply_enemy_action(EnemyAction::Reposition {
                entity: ship,
                from: c("C3"),
                to: c("D4"),
            }),
            Err(EngineError::StaleReposition { .. })
        ));
        assert_eq!(
            engine.apply_enemy_action(EnemyAction::Reposition {
                entity: ship,
                from: c("B2"),
                to: c("F6"),
            }),
            Err(EngineError::Board(crate::state::BoardError::OccupiedCell { cell: c("F6") }))
        );
        assert_eq!(engine.phase(), TurnPhase::BeliefUpdated);
    }

    #[test]
    fn ally_input_folds_fired_cells() {
        let (mut state, _) = setup();
        state.board.fire_at(c("A1")).unwrap();
        let engine = MatchEngine::new(&mut state);

        let raw = ActionDistribution::from_sparse(8, 8, &[(c("A1"), 0.9)], 0.1).unwrap();
        let folded = engine.ally_input(raw);
        assert_eq!(folded.cell_weight(c("A1")), 0.0);
        assert!((folded.hold_weight() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn abort_only_between_turns() {
        let (mut state, _) = setup();
        let mut engine = MatchEngine::new(&mut state);
        engine.post_instructions("hello", None).unwrap();
        assert_eq!(engine.abort(), Err(EngineError::Reentrant { turn: 0 }));

        let (mut fresh, _) = setup();
        let mut engine = MatchEngine::new(&mut fresh);
        assert_eq!(engine.abort(), Ok(MatchOutcome::Aborted));
        assert!(matches!(
            engine.post_instructions("late", None),
            Err(EngineError::MatchOver { .. })
        ));
    }
}
