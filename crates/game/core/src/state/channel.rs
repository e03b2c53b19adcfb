//! Append-only record of every message that crossed the public channel.
//!
//! Both the ally and the enemy read the same log, in the same order. Nothing
//! is ever rewritten or removed.

use super::types::TurnIndex;
use crate::error::{ErrorSeverity, GameError};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sender {
    Player,
    /// Injected or spoofed traffic from the enemy side.
    Enemy,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    pub turn: TurnIndex,
    pub sender: Sender,
    pub text: String,
    /// Position in the log, starting at 0.
    pub sequence: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelError {
    #[error("message text is empty")]
    EmptyMessage,

    #[error("message for turn {turn} arrived after turn {latest} was logged")]
    TurnRegression { turn: TurnIndex, latest: TurnIndex },
}

impl GameError for ChannelError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::EmptyMessage => ErrorSeverity::Validation,
            Self::TurnRegression { .. } => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyMessage => "CHANNEL_EMPTY_MESSAGE",
            Self::TurnRegression { .. } => "CHANNEL_TURN_REGRESSION",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelLog {
    messages: Vec<Message>,
}

impl ChannelLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(
        &mut self,
        turn: TurnIndex,
        sender: Sender,
        text: impl Into<String>,
    ) -> Result<&Message, ChannelError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ChannelError::EmptyMessage);
        }
        let latest = self.messages.last().map_or(0, |message| message.turn);
        if turn < latest {
            return Err(ChannelError::TurnRegression { turn, latest });
        }

        let sequence = self.messages.len() as u64;
        self.messages.push(Message {
            turn,
            sender,
            text,
            sequence,
        });
        Ok(&self.messages[self.messages.len() - 1])
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn for_turn(&self, turn: TurnIndex) -> impl Iterator<Item = &Message> {
        self.messages
            .iter()
            .filter(move |message| message.turn == turn)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigns_sequence_in_arrival_order() {
        let mut log = ChannelLog::new();
        log.append(0, Sender::Player, "Where Juliet stood").unwrap();
        log.append(0, Sender::Enemy, "Fire at A1").unwrap();
        log.append(1, Sender::Player, "Hold fire").unwrap();

        let sequences: Vec<_> = log.messages().iter().map(|m| m.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
        assert_eq!(log.for_turn(0).count(), 2);
        assert_eq!(log.last().map(|m| m.sender), Some(Sender::Player));
    }

    #[test]
    fn rejects_empty_and_out_of_order_messages() {
        let mut log = ChannelLog::new();
        assert_eq!(
            log.append(0, Sender::Player, "   ").unwrap_err(),
            ChannelError::EmptyMessage
        );

        log.append(2, Sender::Player, "later").unwrap();
        assert_eq!(
            log.append(1, Sender::Player, "earlier").unwrap_err(),
            ChannelError::TurnRegression { turn: 1, latest: 2 }
        );
        assert_eq!(log.len(), 1);
    }
}
