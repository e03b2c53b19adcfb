use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use super::{AllyDecision, EnemyAction, EnemyObservation, Policy};
use crate::distribution::ActionDistribution;

/// Replays a fixed list of ally decisions, then holds forever.
#[derive(Debug, Default)]
pub struct ScriptedAllyPolicy {
    script: Mutex<VecDeque<AllyDecision>>,
}

impl ScriptedAllyPolicy {
    pub fn new(decisions: impl IntoIterator<Item = AllyDecision>) -> Self {
        Self {
            script: Mutex::new(decisions.into_iter().collect()),
        }
    }
}

impl Policy<ActionDistribution> for ScriptedAllyPolicy {
    type Action = AllyDecision;

    fn decide(&self, _: &ActionDistribution) -> AllyDecision {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(AllyDecision::Hold)
    }
}

/// Replays a fixed list of enemy actions, then stays idle.
#[derive(Debug, Default)]
pub struct ScriptedEnemyPolicy {
    script: Mutex<VecDeque<EnemyAction>>,
}

impl ScriptedEnemyPolicy {
    pub fn new(actions: impl IntoIterator<Item = EnemyAction>) -> Self {
        Self {
            script: Mutex::new(actions.into_iter().collect()),
        }
    }
}

impl<'a> Policy<EnemyObservation<'a>> for ScriptedEnemyPolicy {
    type Action = EnemyAction;

    fn decide(&self, _: &EnemyObservation<'a>) -> EnemyAction {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(EnemyAction::NoAction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Cell;

    #[test]
    fn ally_script_runs_out_into_hold() {
        let policy = ScriptedAllyPolicy::new([AllyDecision::Fire(Cell::new(0, 1))]);
        let dist = ActionDistribution::uniform(2, 2);
        assert_eq!(policy.decide(&dist), AllyDecision::Fire(Cell::new(0, 1)));
        assert_eq!(policy.decide(&dist), AllyDecision::Hold);
    }
}
