//! Visibility-scoped projections of the board.
//!
//! The player sees everything; the ally and any spectator see only where
//! shots have landed. Both projections are derived from the same [`Board`],
//! never stored separately.

use std::fmt;

use crate::state::{Board, Cell, CellContent};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Visibility {
    /// Full board, ships and hostages included.
    Player,
    /// Fired cells only.
    Ally,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellView {
    Empty,
    Ship,
    Hostage,
    Fired,
    Unknown,
}

impl CellView {
    pub fn symbol(self) -> char {
        match self {
            Self::Ship => 'S',
            Self::Hostage => 'H',
            Self::Fired => 'X',
            Self::Empty | Self::Unknown => '·',
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoardProjection {
    pub visibility: Visibility,
    rows: u8,
    cols: u8,
    cells: Vec<CellView>,
}

impl BoardProjection {
    pub fn of(board: &Board, visibility: Visibility) -> Self {
        let cells = board
            .cells()
            .map(|(_, content)| match (visibility, content) {
                (_, CellContent::AlreadyFired) => CellView::Fired,
                (Visibility::Ally, _) => CellView::Unknown,
                (Visibility::Player, CellContent::Empty) => CellView::Empty,
                (Visibility::Player, CellContent::Ship(_)) => CellView::Ship,
                (Visibility::Player, CellContent::Hostage(_)) => CellView::Hostage,
            })
            .collect();
        Self {
            visibility,
            rows: board.rows(),
            cols: board.cols(),
            cells,
        }
    }

    pub fn get(&self, cell: Cell) -> Option<CellView> {
        (cell.row < self.rows && cell.col < self.cols).then(|| self.cells[cell.index(self.cols)])
    }

    /// Grid followed by a legend of the symbols in use.
    pub fn render_with_legend(&self) -> String {
        let legend = match self.visibility {
            Visibility::Player => "S = ship, H = hostage, X = fired, · = empty",
            Visibility::Ally => "X = fired, · = unknown",
        };
        format!("{self}\n{legend}\n")
    }
}

impl fmt::Display for BoardProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "   ")?;
        for col in 0..self.cols {
            write!(f, " {}", Cell::new(0, col).column_letter())?;
        }
        writeln!(f)?;

        for row in 0..self.rows {
            write!(f, "{:>3}", row as u32 + 1)?;
            for col in 0..self.cols {
                write!(f, " {}", self.cells[Cell::new(row, col).index(self.cols)].symbol())?;
            }
            if row + 1 < self.rows {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EntityKind;

    fn c(text: &str) -> Cell {
        text.parse().unwrap()
    }

    fn sample() -> Board {
        let mut board = Board::new(3, 3).unwrap();
        board.place(EntityKind::Ship, c("A1")).unwrap();
        board.place(EntityKind::Hostage, c("C3")).unwrap();
        board.fire_at(c("B2")).unwrap();
        board
    }

    #[test]
    fn ally_sees_only_fired_cells() {
        let ally = BoardProjection::of(&sample(), Visibility::Ally);
        assert_eq!(ally.get(c("A1")), Some(CellView::Unknown));
        assert_eq!(ally.get(c("B2")), Some(CellView::Fired));
        assert_eq!(ally.get(c("C3")), Some(CellView::Unknown));
    }

    #[test]
    fn player_render_shows_everything() {
        let player = BoardProjection::of(&sample(), Visibility::Player);
        let rendered = player.to_string();
        assert_eq!(rendered, "    A B C\n  1 S · ·\n  2 · X ·\n  3 · · H");
        assert!(player.render_with_legend().contains("H = hostage"));
    }
}
