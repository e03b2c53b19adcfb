//! Probability distributions over fire targets.
//!
//! An [`ActionDistribution`] assigns a weight to every board cell plus a
//! distinguished Hold outcome. Constructors always return a normalized value;
//! anything that reaches the engine sums to 1 within [`TOLERANCE`].

use crate::error::{ErrorSeverity, GameError};
use crate::state::Cell;

/// Allowed deviation of a distribution's total mass from 1.
pub const TOLERANCE: f64 = 1e-6;

/// Where the ally could shoot this turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Target {
    Cell(Cell),
    Hold,
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DistributionError {
    #[error("expected {expected} cell weights, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("weight at index {index} is negative")]
    NegativeWeight { index: usize },

    #[error("weight at index {index} is not finite")]
    NonFinite { index: usize },

    #[error("cell {cell} is outside a {rows}x{cols} board")]
    OutOfBounds { cell: Cell, rows: u8, cols: u8 },

    #[error("distribution has no probability mass")]
    ZeroMass,
}

impl GameError for DistributionError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ShapeMismatch { .. } => "DISTRIBUTION_SHAPE_MISMATCH",
            Self::NegativeWeight { .. } => "DISTRIBUTION_NEGATIVE_WEIGHT",
            Self::NonFinite { .. } => "DISTRIBUTION_NON_FINITE",
            Self::OutOfBounds { .. } => "DISTRIBUTION_OUT_OF_BOUNDS",
            Self::ZeroMass => "DISTRIBUTION_ZERO_MASS",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionDistribution {
    rows: u8,
    cols: u8,
    /// Row-major cell weights.
    cells: Vec<f64>,
    hold: f64,
}

impl ActionDistribution {
    /// Builds a distribution from raw weights, rescaling them to unit mass.
    pub fn from_weights(
        rows: u8,
        cols: u8,
        cells: Vec<f64>,
        hold: f64,
    ) -> Result<Self, DistributionError> {
        let expected = rows as usize * cols as usize;
        if cells.len() != expected {
            return Err(DistributionError::ShapeMismatch {
                expected,
                actual: cells.len(),
            });
        }
        Self {
            rows,
            cols,
            cells,
            hold,
        }
        .renormalized()
    }

    /// Builds a distribution from a sparse list of cell weights.
    ///
    /// Cells not listed get zero weight. Repeated cells accumulate.
    pub fn from_sparse(
        rows: u8,
        cols: u8,
        entries: &[(Cell, f64)],
        hold: f64,
    ) -> Result<Self, DistributionError> {
        let mut cells = vec![0.0; rows as usize * cols as usize];
        for &(cell, weight) in entries {
            if cell.row >= rows || cell.col >= cols {
                return Err(DistributionError::OutOfBounds { cell, rows, cols });
            }
            cells[cell.index(cols)] += weight;
        }
        Self::from_weights(rows, cols, cells, hold)
    }

    /// Neutral fallback used when an interpretation is unavailable.
    ///
    /// Hold receives `hold_bias` on top of a uniform share; the remaining mass
    /// is spread evenly across every cell.
    pub fn neutral(rows: u8, cols: u8, hold_bias: f64) -> Self {
        let cell_count = rows as usize * cols as usize;
        let outcomes = (cell_count + 1) as f64;
        let bias = hold_bias.clamp(0.0, 1.0);
        let cell_weight = (1.0 - bias) / outcomes;
        let hold = cell_weight + bias;
        Self {
            rows,
            cols,
            cells: vec![cell_weight; cell_count],
            hold,
        }
    }

    /// Equal weight on every cell and on Hold.
    pub fn uniform(rows: u8, cols: u8) -> Self {
        Self::neutral(rows, cols, 0.0)
    }

    /// All mass on Hold.
    pub fn hold_only(rows: u8, cols: u8) -> Self {
        Self {
            rows,
            cols,
            cells: vec![0.0; rows as usize * cols as usize],
            hold: 1.0,
        }
    }

    /// Validates the weights and rescales them if they drift from unit mass.
    ///
    /// Used on distributions that crossed a trust boundary (oracle output,
    /// deserialized logs).
    pub fn renormalized(mut self) -> Result<Self, DistributionError> {
        let expected = self.rows as usize * self.cols as usize;
        if self.cells.len() != expected {
            return Err(DistributionError::ShapeMismatch {
                expected,
                actual: self.cells.len(),
            });
        }
        for (index, weight) in self.cells.iter().chain(std::iter::once(&self.hold)).enumerate() {
            if !weight.is_finite() {
                return Err(DistributionError::NonFinite { index });
            }
            if *weight < 0.0 {
                return Err(DistributionError::NegativeWeight { index });
            }
        }

        let mass = self.mass();
        if mass <= 0.0 {
            return Err(DistributionError::ZeroMass);
        }
        if (mass - 1.0).abs() > TOLERANCE {
            self.cells.iter_mut().for_each(|weight| *weight /= mass);
            self.hold /= mass;
        }
        Ok(self)
    }

    /// Moves the weight of `cells` onto Hold.
    ///
    /// Shooting a cell that was already fired is equivalent to not shooting,
    /// so the ally's distribution is folded this way before it decides.
    pub fn fold_into_hold(&mut self, cells: impl IntoIterator<Item = Cell>) {
        for cell in cells {
            if cell.row < self.rows && cell.col < self.cols {
                let index = cell.index(self.cols);
                self.hold += self.cells[index];
                self.cells[index] = 0.0;
            }
        }
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn cols(&self) -> u8 {
        self.cols
    }

    pub fn matches_shape(&self, rows: u8, cols: u8) -> bool {
        self.rows == rows && self.cols == cols
    }

    pub fn cell_weights(&self) -> &[f64] {
        &self.cells
    }

    pub fn cell_weight(&self, cell: Cell) -> f64 {
        if cell.row < self.rows && cell.col < self.cols {
            self.cells[cell.index(self.cols)]
        } else {
            0.0
        }
    }

    pub fn hold_weight(&self) -> f64 {
        self.hold
    }

    pub fn weight(&self, target: Target) -> f64 {
        match target {
            Target::Cell(cell) => self.cell_weight(cell),
            Target::Hold => self.hold,
        }
    }

    /// Total mass across cells and Hold.
    pub fn mass(&self) -> f64 {
        self.cells.iter().sum::<f64>() + self.hold
    }

    /// Highest-weight cell. Ties go to the lowest row-major index.
    pub fn peak_cell(&self) -> (Cell, f64) {
        let mut best = (0, self.cells.first().copied().unwrap_or(0.0));
        for (index, &weight) in self.cells.iter().enumerate().skip(1) {
            if weight > best.1 {
                best = (index, weight);
            }
        }
        (Cell::from_index(best.0, self.cols), best.1)
    }

    /// The single most likely outcome. Hold wins only when strictly heavier
    /// than the peak cell.
    pub fn most_likely(&self) -> Target {
        let (cell, weight) = self.peak_cell();
        if self.hold > weight {
            Target::Hold
        } else {
            Target::Cell(cell)
        }
    }

    /// Shannon entropy in nats over the `cells + 1` outcomes.
    pub fn entropy(&self) -> f64 {
        self.cells
            .iter()
            .chain(std::iter::once(&self.hold))
            .filter(|&&p| p > 0.0)
            .map(|&p| -p * p.ln())
            .sum()
    }

    /// Entropy of the uniform distribution over the same outcomes.
    pub fn max_entropy(&self) -> f64 {
        ((self.cells.len() + 1) as f64).ln()
    }

    /// Entropy scaled into `[0, 1]`.
    pub fn normalized_entropy(&self) -> f64 {
        let max = self.max_entropy();
        if max <= 0.0 {
            return 0.0;
        }
        (self.entropy() / max).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(text: &str) -> Cell {
        text.parse().unwrap()
    }

    #[test]
    fn constructors_normalize() {
        let dist = ActionDistribution::from_sparse(4, 4, &[(c("C4"), 3.0)], 1.0).unwrap();
        assert!((dist.mass() - 1.0).abs() < TOLERANCE);
        assert!((dist.cell_weight(c("C4")) - 0.75).abs() < TOLERANCE);
        assert!((dist.hold_weight() - 0.25).abs() < TOLERANCE);
    }

    #[test]
    fn rejects_invalid_weights() {
        assert_eq!(
            ActionDistribution::from_weights(1, 2, vec![0.5], 0.5),
            Err(DistributionError::ShapeMismatch {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            ActionDistribution::from_weights(1, 2, vec![-0.1, 0.5], 0.6),
            Err(DistributionError::NegativeWeight { index: 0 })
        );
        assert_eq!(
            ActionDistribution::from_weights(1, 2, vec![f64::NAN, 0.5], 0.5),
            Err(DistributionError::NonFinite { index: 0 })
        );
        assert_eq!(
            ActionDistribution::from_weights(1, 2, vec![0.0, 0.0], 0.0),
            Err(DistributionError::ZeroMass)
        );
    }

    #[test]
    fn neutral_biases_hold() {
        let dist = ActionDistribution::neutral(8, 8, 0.1);
        assert!((dist.mass() - 1.0).abs() < TOLERANCE);
        assert!(dist.hold_weight() > dist.peak_cell().1);
        assert_eq!(dist.most_likely(), Target::Hold);
    }

    #[test]
    fn peak_breaks_ties_by_lowest_index() {
        let dist = ActionDistribution::uniform(3, 3);
        assert_eq!(dist.peak_cell().0, c("A1"));
        assert_eq!(dist.most_likely(), Target::Cell(c("A1")));

        let tied = ActionDistribution::from_sparse(3, 3, &[(c("C2"), 0.4), (c("B3"), 0.4)], 0.2)
            .unwrap();
        assert_eq!(tied.peak_cell().0, c("C2"));
    }

    #[test]
    fn entropy_bounds() {
        let uniform = ActionDistribution::uniform(2, 2);
        assert!((uniform.normalized_entropy() - 1.0).abs() < 1e-9);

        let certain = ActionDistribution::from_sparse(2, 2, &[(c("A1"), 1.0)], 0.0).unwrap();
        assert_eq!(certain.normalized_entropy(), 0.0);
    }

    #[test]
    fn folding_moves_mass_to_hold() {
        let mut dist =
            ActionDistribution::from_sparse(4, 4, &[(c("B2"), 0.7), (c("D4"), 0.1)], 0.2).unwrap();
        dist.fold_into_hold([c("B2")]);
        assert_eq!(dist.cell_weight(c("B2")), 0.0);
        assert!((dist.hold_weight() - 0.9).abs() < TOLERANCE);
        assert!((dist.mass() - 1.0).abs() < TOLERANCE);
    }
}
