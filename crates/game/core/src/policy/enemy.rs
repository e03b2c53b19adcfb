use super::Policy;
use crate::belief::BeliefState;
use crate::config::MatchConfig;
use crate::state::{Board, Cell, CellContent, Entity, EntityId};

/// The enemy's single action for a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EnemyAction {
    /// Move one intact ship or hostage to an empty cell.
    Reposition {
        entity: EntityId,
        from: Cell,
        to: Cell,
    },
    /// Jam a cell for this turn: a shot landing there is blocked.
    DeployChaff { cell: Cell },
    NoAction,
}

/// Everything the enemy may look at when deciding. Never includes the
/// player's declared frame.
#[derive(Clone, Copy, Debug)]
pub struct EnemyObservation<'a> {
    pub belief: &'a BeliefState,
    pub board: &'a Board,
    pub chaff_remaining: u8,
}

/// Expected probability that each cell is targeted, marginalized over the
/// enemy's belief: `threat(c) = sum over frames of weight * mass(c)`.
#[derive(Clone, Debug, PartialEq)]
pub struct ThreatMap {
    cols: u8,
    scores: Vec<f64>,
}

impl ThreatMap {
    pub fn from_belief(belief: &BeliefState, rows: u8, cols: u8) -> Self {
        let mut scores = vec![0.0; rows as usize * cols as usize];
        for frame in belief.frames() {
            let Some(distribution) = frame.last_distribution.as_ref() else {
                continue;
            };
            if !distribution.matches_shape(rows, cols) {
                continue;
            }
            for (score, mass) in scores.iter_mut().zip(distribution.cell_weights()) {
                *score += frame.weight * mass;
            }
        }
        Self { cols, scores }
    }

    pub fn score(&self, cell: Cell) -> f64 {
        self.scores
            .get(cell.index(self.cols))
            .copied()
            .unwrap_or(0.0)
    }

    /// Cells ordered hottest first; ties by lowest row-major index.
    pub fn ranked(&self) -> Vec<(Cell, f64)> {
        let mut ranked: Vec<(Cell, f64)> = self
            .scores
            .iter()
            .enumerate()
            .map(|(index, &score)| (Cell::from_index(index, self.cols), score))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    pub fn hottest(&self) -> Option<(Cell, f64)> {
        self.ranked().into_iter().next()
    }
}

/// Threshold rule over the threat map.
///
/// In priority order:
/// 1. Bait: if the hottest cell is above `bait_threshold` and empty, move
///    the nearest hostage into it.
/// 2. Evade: if it is above `evasion_threshold`, either jam the hottest cell
///    with chaff (when a ship is on it and charges remain) or move the ship
///    nearest the hottest cell to the reachable cell farthest from the top-k
///    threatened cells. The ship only moves if that increases its distance
///    from the threatened set.
/// 3. Otherwise do nothing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThresholdEnemyPolicy {
    pub evasion_threshold: f64,
    pub bait_threshold: f64,
    pub top_k: usize,
    pub reposition_range: Option<u8>,
}

impl ThresholdEnemyPolicy {
    pub fn from_config(config: &MatchConfig) -> Self {
        Self {
            evasion_threshold: config.evasion_threshold,
            bait_threshold: config.bait_threshold,
            top_k: config.threat_top_k,
            reposition_range: config.reposition_range,
        }
    }

    fn in_range(&self, from: Cell, to: Cell) -> bool {
        self.reposition_range
            .is_none_or(|range| from.chebyshev(to) <= range as u32)
    }

    fn bait(&self, board: &Board, hot: Cell) -> Option<EnemyAction> {
        if board.content(hot) != Some(CellContent::Empty) {
            return None;
        }
        let candidates = board
            .live_hostages()
            .filter(|hostage| self.in_range(hostage.cell, hot));
        let hostage = nearest(candidates, hot)?;
        Some(EnemyAction::Reposition {
            entity: hostage.id,
            from: hostage.cell,
            to: hot,
        })
    }

    fn evade(&self, board: &Board, threats: &ThreatMap, hot: Cell) -> Option<EnemyAction> {
        let threatened: Vec<Cell> = threats
            .ranked()
            .into_iter()
            .take(self.top_k)
            .filter(|(_, score)| *score > self.evasion_threshold)
            .map(|(cell, _)| cell)
            .collect();
        let ship = nearest(board.live_ships(), hot)?;

        let clearance = |cell: Cell| {
            threatened
                .iter()
                .map(|threat| threat.manhattan(cell))
                .min()
                .unwrap_or(u32::MAX)
        };
        let current = clearance(ship.cell);

        let best = board
            .empty_cells()
            .filter(|&cell| self.in_range(ship.cell, cell))
            .map(|cell| (cell, clearance(cell), threats.score(cell)))
            .max_by(|a, b| {
                a.1.cmp(&b.1)
                    .then_with(|| b.2.total_cmp(&a.2))
                    .then_with(|| b.0.cmp(&a.0))
            })?;
        (best.1 > current).then_some(EnemyAction::Reposition {
            entity: ship.id,
            from: ship.cell,
            to: best.0,
        })
    }
}

/// Entity closest to `target` by Manhattan distance; ties by lowest id.
fn nearest<'a>(entities: impl Iterator<Item = &'a Entity>, target: Cell) -> Option<&'a Entity> {
    entities.min_by(|a, b| {
        a.cell
            .manhattan(target)
            .cmp(&b.cell.manhattan(target))
            .then_with(|| a.id.cmp(&b.id))
    })
}

impl<'a> Policy<EnemyObservation<'a>> for ThresholdEnemyPolicy {
    type Action = EnemyAction;

    fn decide(&self, observation: &EnemyObservation<'a>) -> EnemyAction {
        let board = observation.board;
        let threats = ThreatMap::from_belief(observation.belief, board.rows(), board.cols());
        let Some((hot, score)) = threats.hottest() else {
            return EnemyAction::NoAction;
        };

        if score > self.bait_threshold {
            if let Some(action) = self.bait(board, hot) {
                return action;
            }
        }

        if score > self.evasion_threshold {
            let ship_on_hot = matches!(board.content(hot), Some(CellContent::Ship(_)));
            if ship_on_hot && observation.chaff_remaining > 0 {
                return EnemyAction::DeployChaff { cell: hot };
            }
            if let Some(action) = self.evade(board, &threats, hot) {
                return action;
            }
        }

        EnemyAction::NoAction
    }
}
