use async_trait::async_trait;
use fireatwill_core::{ActionDistribution, Cell};

use super::{InterpretationOracle, OracleError, OracleRequest};

/// Reads explicit coordinates ("fire at C4") out of the latest message.
///
/// The frame is ignored, so every candidate agrees with the ally whenever a
/// coordinate is spelled out. Without a coordinate the answer leans to Hold.
#[derive(Clone, Copy, Debug)]
pub struct LiteralCoordinateOracle {
    /// Mass shared by the coordinates found.
    pub confidence: f64,
    /// Hold mass when no coordinate is found.
    pub idle_hold: f64,
}

impl Default for LiteralCoordinateOracle {
    fn default() -> Self {
        Self {
            confidence: 0.9,
            idle_hold: 0.8,
        }
    }
}

impl LiteralCoordinateOracle {
    /// Every in-bounds coordinate token in `text`, in order, without repeats.
    pub fn coordinates(text: &str, rows: u8, cols: u8) -> Vec<Cell> {
        let mut found = Vec::new();
        for token in text.split(|c: char| !c.is_ascii_alphanumeric()) {
            let mut chars = token.chars();
            let looks_like_cell = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
                && (2..=3).contains(&token.len())
                && chars.all(|c| c.is_ascii_digit());
            if !looks_like_cell {
                continue;
            }
            if let Ok(cell) = token.parse::<Cell>() {
                if cell.row < rows && cell.col < cols && !found.contains(&cell) {
                    found.push(cell);
                }
            }
        }
        found
    }
}

#[async_trait]
impl InterpretationOracle for LiteralCoordinateOracle {
    async fn interpret(
        &self,
        request: &OracleRequest,
    ) -> Result<ActionDistribution, OracleError> {
        let (rows, cols) = (request.rows, request.cols);
        let latest = request
            .latest()
            .ok_or_else(|| OracleError::Malformed("empty channel history".to_string()))?;

        let cells = Self::coordinates(&latest.text, rows, cols);
        let result = if cells.is_empty() {
            let share = (1.0 - self.idle_hold) / (rows as f64 * cols as f64);
            ActionDistribution::from_weights(
                rows,
                cols,
                vec![share; rows as usize * cols as usize],
                self.idle_hold,
            )
        } else {
            let share = self.confidence / cells.len() as f64;
            let entries: Vec<_> = cells.into_iter().map(|cell| (cell, share)).collect();
            ActionDistribution::from_sparse(rows, cols, &entries, 1.0 - self.confidence)
        };
        result.map_err(|error| OracleError::Malformed(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use fireatwill_core::{Message, Sender, Target};

    fn request(text: &str) -> OracleRequest {
        OracleRequest {
            turn: 0,
            history: Arc::from(vec![Message {
                turn: 0,
                sender: Sender::Player,
                text: text.to_string(),
                sequence: 0,
            }]),
            frame: Some("Greek mythology".into()),
            rows: 8,
            cols: 8,
        }
    }

    #[test]
    fn finds_coordinates_in_prose() {
        let cells = LiteralCoordinateOracle::coordinates("Fire at c4, then B12 or Z9, again C4!", 8, 8);
        assert_eq!(cells, vec!["C4".parse().unwrap()]);
        assert!(LiteralCoordinateOracle::coordinates("Aim at the Acropolis", 8, 8).is_empty());
    }

    #[tokio::test]
    async fn explicit_coordinate_is_confident() {
        let oracle = LiteralCoordinateOracle::default();
        let distribution = oracle.interpret(&request("fire at C4")).await.unwrap();
        let c4: Cell = "C4".parse().unwrap();
        assert_eq!(distribution.most_likely(), Target::Cell(c4));
        assert!((distribution.cell_weight(c4) - 0.9).abs() < 1e-9);
    }

    #[tokio::test]
    async fn prose_without_coordinates_leans_to_hold() {
        let oracle = LiteralCoordinateOracle::default();
        let distribution = oracle
            .interpret(&request("strike where the wine-dark sea meets the shore"))
            .await
            .unwrap();
        assert_eq!(distribution.most_likely(), Target::Hold);
        assert!((distribution.hold_weight() - 0.8).abs() < 1e-9);
    }
}
