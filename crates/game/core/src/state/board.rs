//! Authoritative grid of cells and the enemy assets placed on it.
//!
//! The board keeps two views of the same facts: a row-major cell array for
//! O(1) lookups and an entity roster for iteration. Every mutation updates both
//! and the pair is checked by [`Board::check_invariants`].

use super::types::{Cell, Entity, EntityId, EntityKind};
use crate::error::{ErrorSeverity, GameError};
use crate::rng::{PcgRng, compute_seed};

/// Maximum number of columns addressable with single-letter notation.
pub const MAX_COLS: u8 = 26;

/// Content of a single board cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellContent {
    Empty,
    Ship(EntityId),
    Hostage(EntityId),
    /// Terminal state for a cell. Nothing may be placed or moved here again.
    AlreadyFired,
}

impl CellContent {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn is_fired(&self) -> bool {
        matches!(self, Self::AlreadyFired)
    }

    pub fn occupant(&self) -> Option<EntityId> {
        match self {
            Self::Ship(id) | Self::Hostage(id) => Some(*id),
            Self::Empty | Self::AlreadyFired => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoardError {
    #[error("board dimensions {rows}x{cols} are invalid (1..=255 rows, 1..=26 columns)")]
    InvalidDimensions { rows: u8, cols: u8 },

    #[error("cell {cell} is outside the board")]
    OutOfBounds { cell: Cell },

    #[error("cell {cell} is not empty")]
    OccupiedCell { cell: Cell },

    #[error("cell {cell} was already fired upon")]
    AlreadyFired { cell: Cell },

    #[error("entity {0} is not on this board")]
    EntityNotFound(EntityId),

    #[error("entity {0} has been destroyed")]
    EntityDestroyed(EntityId),

    #[error("occupancy desync: entity {entity} expected at {cell}")]
    OccupancyDesync { entity: EntityId, cell: Cell },

    #[error("cannot place {requested} entities on a board with {available} free cells")]
    InsufficientSpace { requested: usize, available: usize },
}

impl GameError for BoardError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::OccupiedCell { .. } | Self::OutOfBounds { .. } => ErrorSeverity::Recoverable,
            Self::InvalidDimensions { .. }
            | Self::InsufficientSpace { .. }
            | Self::EntityNotFound(_)
            | Self::EntityDestroyed(_) => ErrorSeverity::Validation,
            Self::AlreadyFired { .. } => ErrorSeverity::Internal,
            Self::OccupancyDesync { .. } => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDimensions { .. } => "BOARD_INVALID_DIMENSIONS",
            Self::OutOfBounds { .. } => "BOARD_OUT_OF_BOUNDS",
            Self::OccupiedCell { .. } => "BOARD_OCCUPIED_CELL",
            Self::AlreadyFired { .. } => "BOARD_ALREADY_FIRED",
            Self::EntityNotFound(_) => "BOARD_ENTITY_NOT_FOUND",
            Self::EntityDestroyed(_) => "BOARD_ENTITY_DESTROYED",
            Self::OccupancyDesync { .. } => "BOARD_OCCUPANCY_DESYNC",
            Self::InsufficientSpace { .. } => "BOARD_INSUFFICIENT_SPACE",
        }
    }
}

/// Discrete grid holding ships and hostages.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Board {
    rows: u8,
    cols: u8,
    cells: Vec<CellContent>,
    entities: Vec<Entity>,
    next_entity_id: u32,
}

impl Board {
    pub const DEFAULT_ROWS: u8 = 8;
    pub const DEFAULT_COLS: u8 = 8;
    pub const DEFAULT_SHIPS: usize = 5;
    pub const DEFAULT_HOSTAGES: usize = 3;

    pub fn new(rows: u8, cols: u8) -> Result<Self, BoardError> {
        if rows == 0 || cols == 0 || cols > MAX_COLS {
            return Err(BoardError::InvalidDimensions { rows, cols });
        }
        Ok(Self {
            rows,
            cols,
            cells: vec![CellContent::Empty; rows as usize * cols as usize],
            entities: Vec::new(),
            next_entity_id: 0,
        })
    }

    /// Places `ships` then `hostages` on distinct empty cells chosen from
    /// `seed`. The same arguments always produce the same board.
    pub fn random_setup(
        rows: u8,
        cols: u8,
        ships: usize,
        hostages: usize,
        seed: u64,
    ) -> Result<Self, BoardError> {
        let mut board = Self::new(rows, cols)?;
        let requested = ships + hostages;
        if requested > board.cell_count() {
            return Err(BoardError::InsufficientSpace {
                requested,
                available: board.cell_count(),
            });
        }

        let rng = PcgRng;
        let plan = std::iter::repeat_n(EntityKind::Ship, ships)
            .chain(std::iter::repeat_n(EntityKind::Hostage, hostages));
        for (draw, kind) in plan.enumerate() {
            let context = match kind {
                EntityKind::Ship => 0,
                EntityKind::Hostage => 1,
            };
            let start = rng.below(compute_seed(seed, draw as u64, context), board.cell_count());
            let cell = board
                .probe_empty(start)
                .ok_or(BoardError::InsufficientSpace {
                    requested,
                    available: draw,
                })?;
            board.place(kind, cell)?;
        }
        Ok(board)
    }

    /// First empty cell at or after `start` in row-major order, wrapping.
    fn probe_empty(&self, start: usize) -> Option<Cell> {
        let len = self.cell_count();
        (0..len)
            .map(|offset| (start + offset) % len)
            .find(|&index| self.cells[index].is_empty())
            .map(|index| Cell::from_index(index, self.cols))
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn cols(&self) -> u8 {
        self.cols
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }

    fn index_of(&self, cell: Cell) -> Result<usize, BoardError> {
        if self.contains(cell) {
            Ok(cell.index(self.cols))
        } else {
            Err(BoardError::OutOfBounds { cell })
        }
    }

    pub fn content(&self, cell: Cell) -> Option<CellContent> {
        self.contains(cell)
            .then(|| self.cells[cell.index(self.cols)])
    }

    /// All cells with their content in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (Cell, CellContent)> + '_ {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .map(move |(index, content)| (Cell::from_index(index, cols), *content))
    }

    pub fn empty_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells()
            .filter(|(_, content)| content.is_empty())
            .map(|(cell, _)| cell)
    }

    pub fn fired_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells()
            .filter(|(_, content)| content.is_fired())
            .map(|(cell, _)| cell)
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn live_ships(&self) -> impl Iterator<Item = &Entity> {
        self.entities
            .iter()
            .filter(|entity| entity.intact && entity.is_ship())
    }

    pub fn live_hostages(&self) -> impl Iterator<Item = &Entity> {
        self.entities
            .iter()
            .filter(|entity| entity.intact && entity.is_hostage())
    }

    pub fn ships_remaining(&self) -> usize {
        self.live_ships().count()
    }

    pub fn hostages_remaining(&self) -> usize {
        self.live_hostages().count()
    }

    /// Places a new entity on an empty cell and returns its id.
    pub fn place(&mut self, kind: EntityKind, cell: Cell) -> Result<EntityId, BoardError> {
        let index = self.index_of(cell)?;
        if !self.cells[index].is_empty() {
            return Err(BoardError::OccupiedCell { cell });
        }

        let id = EntityId(self.next_entity_id);
        self.next_entity_id += 1;
        self.cells[index] = match kind {
            EntityKind::Ship => CellContent::Ship(id),
            EntityKind::Hostage => CellContent::Hostage(id),
        };
        self.entities.push(Entity::new(id, kind, cell));
        Ok(id)
    }

    /// Moves an intact entity to an empty cell and returns its origin.
    ///
    /// Fails with `OccupiedCell` when the destination holds anything,
    /// including a fired crater.
    pub fn move_entity(&mut self, id: EntityId, dest: Cell) -> Result<Cell, BoardError> {
        let dest_index = self.index_of(dest)?;
        let position = self
            .entities
            .iter()
            .position(|entity| entity.id == id)
            .ok_or(BoardError::EntityNotFound(id))?;
        let entity = self.entities[position];
        if !entity.intact {
            return Err(BoardError::EntityDestroyed(id));
        }
        if !self.cells[dest_index].is_empty() {
            return Err(BoardError::OccupiedCell { cell: dest });
        }

        let origin = entity.cell;
        let origin_index = self.index_of(origin)?;
        if self.cells[origin_index].occupant() != Some(id) {
            return Err(BoardError::OccupancyDesync {
                entity: id,
                cell: origin,
            });
        }

        self.cells[dest_index] = self.cells[origin_index];
        self.cells[origin_index] = CellContent::Empty;
        self.entities[position].cell = dest;
        Ok(origin)
    }

    /// Fires at `cell`, returning what was there before the shot.
    ///
    /// The cell becomes `AlreadyFired` and any occupant is marked destroyed.
    pub fn fire_at(&mut self, cell: Cell) -> Result<CellContent, BoardError> {
        let index = self.index_of(cell)?;
        let prior = self.cells[index];
        if prior.is_fired() {
            return Err(BoardError::AlreadyFired { cell });
        }

        if let Some(id) = prior.occupant() {
            let entity = self
                .entities
                .iter_mut()
                .find(|entity| entity.id == id)
                .ok_or(BoardError::OccupancyDesync { entity: id, cell })?;
            entity.intact = false;
        }
        self.cells[index] = CellContent::AlreadyFired;
        Ok(prior)
    }

    /// Verifies that the cell array and the entity roster agree.
    pub fn check_invariants(&self) -> Result<(), BoardError> {
        for entity in &self.entities {
            let index = self.index_of(entity.cell)?;
            let content = self.cells[index];
            if entity.intact && content.occupant() != Some(entity.id) {
                return Err(BoardError::OccupancyDesync {
                    entity: entity.id,
                    cell: entity.cell,
                });
            }
        }

        for (cell, content) in self.cells() {
            let Some(id) = content.occupant() else {
                continue;
            };
            let entity = self.entity(id).ok_or(BoardError::EntityNotFound(id))?;
            let kind_matches = matches!(
                (content, entity.kind),
                (CellContent::Ship(_), EntityKind::Ship)
                    | (CellContent::Hostage(_), EntityKind::Hostage)
            );
            if !entity.intact || entity.cell != cell || !kind_matches {
                return Err(BoardError::OccupancyDesync { entity: id, cell });
            }
        }
        Ok(())
    }
}
