use std::fmt;
use std::str::FromStr;

/// Zero-based turn counter. Turn 0 is the first instruction of the match.
pub type TurnIndex = u32;

/// Unique identifier for a ship or hostage tracked on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Discrete board coordinate.
///
/// Rows are numbered from the top, columns are lettered from the left, so
/// `A1` is the upper-left corner. The textual form is the column letter
/// followed by the 1-based row (`C4` is column C, row 4).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    pub row: u8,
    pub col: u8,
}

impl Cell {
    pub const ORIGIN: Self = Self { row: 0, col: 0 };

    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// Row-major index of this cell on a board with `cols` columns.
    #[inline]
    pub const fn index(self, cols: u8) -> usize {
        self.row as usize * cols as usize + self.col as usize
    }

    /// Inverse of [`Cell::index`].
    #[inline]
    pub const fn from_index(index: usize, cols: u8) -> Self {
        let cols = cols as usize;
        Self {
            row: (index / cols) as u8,
            col: (index % cols) as u8,
        }
    }

    pub fn manhattan(self, other: Cell) -> u32 {
        self.row.abs_diff(other.row) as u32 + self.col.abs_diff(other.col) as u32
    }

    /// King-move distance, used for reposition range limits.
    pub fn chebyshev(self, other: Cell) -> u32 {
        self.row.abs_diff(other.row).max(self.col.abs_diff(other.col)) as u32
    }

    /// Column letter used in coordinate notation.
    pub fn column_letter(self) -> char {
        (b'A' + self.col) as char
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column_letter(), self.row as u32 + 1)
    }
}

/// Errors raised while parsing coordinate notation such as `"B6"`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CellParseError {
    #[error("coordinate must be at least 2 characters, like 'A1'")]
    TooShort,

    #[error("column must be a letter A-Z (got {0:?})")]
    InvalidColumn(char),

    #[error("row must be a number after the column letter (got {0:?})")]
    InvalidRow(String),

    #[error("row number must be 1 or greater")]
    RowZero,
}

impl FromStr for Cell {
    type Err = CellParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase();
        let mut chars = normalized.chars();

        let column = chars.next().ok_or(CellParseError::TooShort)?;
        let rest = chars.as_str();
        if rest.is_empty() {
            return Err(CellParseError::TooShort);
        }
        if !column.is_ascii_uppercase() {
            return Err(CellParseError::InvalidColumn(column));
        }

        let row_number: u16 = rest
            .parse()
            .map_err(|_| CellParseError::InvalidRow(rest.to_string()))?;
        if row_number == 0 {
            return Err(CellParseError::RowZero);
        }
        let row = u8::try_from(row_number - 1)
            .map_err(|_| CellParseError::InvalidRow(rest.to_string()))?;

        Ok(Self {
            row,
            col: column as u8 - b'A',
        })
    }
}
