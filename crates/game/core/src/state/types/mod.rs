pub mod common;
pub mod entities;
pub mod turn;

pub use common::{Cell, CellParseError, EntityId, TurnIndex};
pub use entities::{Entity, EntityKind};
pub use turn::{TurnPhase, TurnState};
