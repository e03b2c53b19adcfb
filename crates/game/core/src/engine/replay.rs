use super::{EngineError, MatchEngine, MatchGenesis, TurnRecord};
use crate::belief::BeliefTracker;
use crate::state::MatchState;

/// Rebuilds a match from its genesis and turn records.
///
/// Each turn is re-run through the engine using the archived oracle output,
/// then checked against the recorded shot, outcome and state digest. The
/// belief tracker, confidence scorer included, is rebuilt from the genesis
/// config. The declared frame is not needed and is not restored.
pub fn replay(genesis: &MatchGenesis, records: &[TurnRecord]) -> Result<MatchState, EngineError> {
    let tracker = BeliefTracker::from_config(&genesis.config);
    let mut state = MatchState::new(genesis.config.clone(), genesis.board.clone(), None)?;

    for record in records {
        let divergence = EngineError::ReplayDivergence { turn: record.turn };
        let mut engine = MatchEngine::new(&mut state);

        let instruction = record.player_message().ok_or(divergence.clone())?;
        let injected = record.injected_message().map(|message| message.text.as_str());
        let turn = engine.post_instructions(&instruction.text, injected)?;
        if turn != record.turn {
            return Err(divergence);
        }

        engine.update_belief(&tracker, record.evidence.clone())?;
        engine.apply_enemy_action(record.enemy_action)?;
        engine.record_ally_decision(
            record.ally_distribution.clone(),
            record.ally_degraded,
            record.ally_decision,
        )?;
        let replayed = engine.resolve()?;

        if replayed.shot != record.shot
            || replayed.outcome != record.outcome
            || replayed.digest != record.digest
        {
            return Err(divergence);
        }
    }
    Ok(state)
}
