use super::{Cell, EntityId};

/// What an enemy asset is. Ships are targets; hostages must never be hit.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntityKind {
    Ship,
    Hostage,
}

/// A ship or hostage placed on the board.
///
/// `intact` flips to false when a shot lands on the entity. Destroyed entities
/// stay in the roster for bookkeeping but no longer occupy any cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub cell: Cell,
    pub intact: bool,
}

impl Entity {
    pub fn new(id: EntityId, kind: EntityKind, cell: Cell) -> Self {
        Self {
            id,
            kind,
            cell,
            intact: true,
        }
    }

    pub fn is_ship(&self) -> bool {
        self.kind == EntityKind::Ship
    }

    pub fn is_hostage(&self) -> bool {
        self.kind == EntityKind::Hostage
    }
}
